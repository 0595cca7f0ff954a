//! Configuration file support
//!
//! Loads settings from ~/.textbook-reader/config.toml (or
//! %USERPROFILE%\.textbook-reader\config.toml on Windows).
//!
//! Every key is optional; missing keys keep their defaults.
//!
//! Example:
//! ```text
//! # textbook-reader configuration
//! api-url = "http://localhost:5000"
//! line-numbers = true
//! copy-feedback-ms = 2000
//! code-language = "JavaScript"
//! tab-width = 4
//! wrap-width = 0
//!
//! [keys]
//! next-topic = "l"
//! prev-topic = "h"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReaderError, Result};

/// Directory holding config, session token and log file
const APP_DIR: &str = ".textbook-reader";

/// Default backend location
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Configuration settings
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Backend base URL, no trailing slash
    pub api_url: String,
    /// Whether code panels show line numbers
    pub show_line_numbers: bool,
    /// How long the "copied" indicator stays on
    pub copy_feedback: Duration,
    /// Language used to highlight code blocks
    pub code_language: String,
    /// Tab width for code panels
    pub tab_width: usize,
    /// Wrap width for prose, 0 = terminal width
    pub wrap_width: usize,
    /// Log file for the interactive reader
    pub log_file: Option<PathBuf>,
    /// Key binding overrides, action name -> key
    pub keys: BTreeMap<String, String>,
}

/// On-disk shape of the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct ConfigFile {
    api_url: Option<String>,
    line_numbers: Option<bool>,
    copy_feedback_ms: Option<u64>,
    code_language: Option<String>,
    tab_width: Option<usize>,
    wrap_width: Option<usize>,
    log_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    keys: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            show_line_numbers: true,
            copy_feedback: crate::copy::DEFAULT_FEEDBACK,
            code_language: "JavaScript".to_string(),
            tab_width: 4,
            wrap_width: 0,
            log_file: None,
            keys: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Directory for all reader files
    pub fn app_dir() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(APP_DIR))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(APP_DIR))
        }
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::app_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the default location
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Config::default();
        match fs::read_to_string(path) {
            Ok(contents) => {
                let file = Self::parse(&contents)?;
                config.apply(&file);
                tracing::debug!(path = %path.display(), "loaded config");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(config)
    }

    fn parse(contents: &str) -> Result<ConfigFile> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply settings from a parsed file, clamping out-of-range values
    fn apply(&mut self, file: &ConfigFile) {
        if let Some(url) = &file.api_url {
            self.set_api_url(url);
        }

        if let Some(value) = file.line_numbers {
            self.show_line_numbers = value;
        }

        if let Some(ms) = file.copy_feedback_ms {
            self.copy_feedback = Duration::from_millis(ms.clamp(100, 10_000));
        }

        if let Some(lang) = &file.code_language {
            self.code_language = lang.clone();
        }

        if let Some(n) = file.tab_width {
            self.tab_width = n.clamp(1, 16);
        }

        if let Some(n) = file.wrap_width {
            self.wrap_width = if n == 0 { 0 } else { n.max(20) };
        }

        if let Some(path) = &file.log_file {
            self.log_file = Some(path.clone());
        }

        for (action, key) in &file.keys {
            self.keys.insert(action.to_lowercase(), key.clone());
        }
    }

    /// Set the backend URL, dropping any trailing slash
    pub fn set_api_url(&mut self, url: &str) {
        self.api_url = url.trim_end_matches('/').to_string();
    }

    /// Log file for the interactive reader (default: in the app dir)
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .or_else(|| Self::app_dir().map(|dir| dir.join("reader.log")))
    }

    fn to_file(&self) -> ConfigFile {
        ConfigFile {
            api_url: Some(self.api_url.clone()),
            line_numbers: Some(self.show_line_numbers),
            copy_feedback_ms: Some(self.copy_feedback.as_millis() as u64),
            code_language: Some(self.code_language.clone()),
            tab_width: Some(self.tab_width),
            wrap_width: Some(self.wrap_width),
            log_file: self.log_file.clone(),
            keys: self.keys.clone(),
        }
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.to_file())
            .map_err(|e| ReaderError::Message(format!("cannot serialize config: {e}")))
    }

    /// Save current configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()
            .ok_or_else(|| ReaderError::Message("cannot locate home directory".to_string()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let contents = format!(
            "# textbook-reader configuration\n# Generated automatically\n\n{}",
            self.to_toml()?
        );
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let contents = r#"
# Comment
api-url = "https://example.org/"
line-numbers = false
copy-feedback-ms = 1500
code-language = "python"
tab-width = 2

[keys]
Next-Topic = "l"
        "#;

        let file = Config::parse(contents).unwrap();
        let mut config = Config::default();
        config.apply(&file);

        assert_eq!(config.api_url, "https://example.org");
        assert!(!config.show_line_numbers);
        assert_eq!(config.copy_feedback, Duration::from_millis(1500));
        assert_eq!(config.code_language, "python");
        assert_eq!(config.tab_width, 2);
        assert_eq!(config.keys.get("next-topic"), Some(&"l".to_string()));
    }

    #[test]
    fn test_values_are_clamped() {
        let file = Config::parse("copy-feedback-ms = 5\ntab-width = 99\nwrap-width = 3").unwrap();
        let mut config = Config::default();
        config.apply(&file);
        assert_eq!(config.copy_feedback, Duration::from_millis(100));
        assert_eq!(config.tab_width, 16);
        assert_eq!(config.wrap_width, 20);
    }

    #[test]
    fn test_empty_file_keeps_defaults() {
        let file = Config::parse("").unwrap();
        let mut config = Config::default();
        config.apply(&file);
        assert_eq!(config, Config::default());
        assert_eq!(config.copy_feedback, Duration::from_millis(2000));
    }

    #[test]
    fn test_malformed_file_is_error() {
        assert!(matches!(
            Config::parse("line-numbers = maybe"),
            Err(ReaderError::Config(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = std::env::temp_dir().join(format!("tbread-config-{}", std::process::id()));
        let path = dir.join("config.toml");

        let mut config = Config::default();
        config.set_api_url("http://api.test:8080/");
        config.tab_width = 8;
        config.keys.insert("copy".to_string(), "y".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("tbread-definitely-missing.toml");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}
