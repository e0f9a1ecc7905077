use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the climate statistics crates.
#[derive(Error, Debug)]
pub enum ClimateError {
    /// A source file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The delimited source could not be decoded (I/O failure mid-stream,
    /// invalid UTF-8, malformed record).
    #[error("Failed to read delimited source: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed or produced.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A date string did not match any recognised format.
    #[error("Invalid date format: {0}")]
    DateParse(String),

    /// Ingestion was cancelled by the caller before it completed.
    #[error("Ingestion cancelled")]
    Cancelled,

    /// A query parameter is outside its accepted range.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClimateError {
    /// Shorthand for [`ClimateError::InvalidParameter`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ClimateError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the climate crates.
pub type Result<T> = std::result::Result<T, ClimateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ClimateError::FileRead {
            path: PathBuf::from("/data/observations.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/observations.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_date_parse() {
        let err = ClimateError::DateParse("not-a-date".to_string());
        assert_eq!(err.to_string(), "Invalid date format: not-a-date");
    }

    #[test]
    fn test_error_display_cancelled() {
        assert_eq!(ClimateError::Cancelled.to_string(), "Ingestion cancelled");
    }

    #[test]
    fn test_error_display_invalid_parameter() {
        let err = ClimateError::invalid("months", "must be between 1 and 12, got 13");
        assert_eq!(
            err.to_string(),
            "Invalid parameter months: must be between 1 and 12, got 13"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = ClimateError::Config("CSV_PATH not set".to_string());
        assert_eq!(err.to_string(), "Configuration error: CSV_PATH not set");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ClimateError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: ClimateError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
