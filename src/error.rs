//! Error types for the generator.
//!
//! Every fallible step of a run returns [`GeneratorError`]. Failures below the
//! field level (bad base64, empty titles) never reach this type; they are
//! absorbed where they happen.

use std::path::PathBuf;

/// Top-level error for a generation run.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Missing credential or invalid configuration. Raised before any network call.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The completion call itself failed (transport, HTTP status, empty body).
    #[error("service error: {message}")]
    Service { message: String },

    /// The model output could not be turned into a full batch of articles.
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    /// The state file exists but does not hold a valid state record.
    #[error("invalid state file {path:?}: {source}")]
    State {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GeneratorError>;

impl GeneratorError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service {
            message: msg.into(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let e = GeneratorError::malformed("expected 10 articles, got 9");
        assert_eq!(
            e.to_string(),
            "malformed response: expected 10 articles, got 9"
        );

        let e = GeneratorError::configuration("GEMINI_API_KEY is not set");
        assert!(e.to_string().starts_with("configuration error"));
    }

    #[test]
    fn test_io_error_keeps_path() {
        let e = GeneratorError::io(
            "/tmp/x/state.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(e.to_string().contains("/tmp/x/state.json"));
    }
}
