//! Session token storage
//!
//! The token issued at login is kept in a file next to the config and
//! handed to the API client explicitly. Nothing reads it from ambient
//! state.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// The signed-in user's session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    /// Where the token is persisted, `None` for in-memory sessions
    path: Option<PathBuf>,
}

impl Session {
    /// An in-memory session, never written to disk
    pub fn ephemeral(token: Option<String>) -> Self {
        Self { token, path: None }
    }

    /// Load the session stored at `path`, empty if there is none
    pub fn load(path: PathBuf) -> Result<Self> {
        let token = match fs::read_to_string(&path) {
            Ok(contents) => {
                let token = contents.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            token,
            path: Some(path),
        })
    }

    /// Default token location inside the app directory
    pub fn default_path() -> Option<PathBuf> {
        crate::config::Config::app_dir().map(|dir| dir.join("token"))
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Store a new token, persisting it when the session has a path
    pub fn login(&mut self, token: &str) -> Result<()> {
        let token = token.trim().to_string();
        if let Some(path) = &self.path {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(path, &token)?;
        }
        self.token = Some(token);
        tracing::info!("session token stored");
        Ok(())
    }

    /// Forget the token in memory and on disk
    pub fn logout(&mut self) -> Result<()> {
        self.token = None;
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!("session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tbread-session-{}-{}", name, std::process::id()))
            .join("token")
    }

    #[test]
    fn test_login_persists_and_logout_clears() {
        let path = temp_path("roundtrip");
        let mut session = Session::load(path.clone()).unwrap();
        assert!(!session.is_signed_in());

        session.login("  abc.def  \n").unwrap();
        assert_eq!(session.token(), Some("abc.def"));

        let reloaded = Session::load(path.clone()).unwrap();
        assert_eq!(reloaded.token(), Some("abc.def"));

        session.logout().unwrap();
        assert!(!session.is_signed_in());
        assert!(!path.exists());
        assert!(!Session::load(path.clone()).unwrap().is_signed_in());

        // Logging out twice is fine
        session.logout().unwrap();
        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_blank_file_means_signed_out() {
        let path = temp_path("blank");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "\n").unwrap();
        assert!(!Session::load(path.clone()).unwrap().is_signed_in());
        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_ephemeral_session_never_touches_disk() {
        let mut session = Session::ephemeral(None);
        session.login("tok").unwrap();
        assert_eq!(session.token(), Some("tok"));
        assert_eq!(session.path(), None);
    }
}
