//! Error types for the textbook reader

use thiserror::Error;

/// Result type alias for reader operations
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Reader error types
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("Not signed in (run `tbread login --token <TOKEN>`)")]
    NotSignedIn,

    #[error("You do not have access to category management")]
    NotAdmin,

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("{0}")]
    Message(String),
}

impl ReaderError {
    /// Whether this error came from the server rejecting the request
    pub fn is_status(&self, code: u16) -> bool {
        matches!(self, ReaderError::Status { status, .. } if *status == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = ReaderError::Status {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "Server returned 404: not found");
        assert!(err.is_status(404));
        assert!(!err.is_status(500));
    }

    #[test]
    fn test_invalid_rating_display() {
        assert_eq!(
            ReaderError::InvalidRating(7).to_string(),
            "Rating must be between 1 and 5, got 7"
        );
    }
}
