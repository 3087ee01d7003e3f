use std::path::PathBuf;

use thiserror::Error;

/// Main application error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status error: {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout: {url} after {timeout_seconds} seconds")]
    Timeout { url: String, timeout_seconds: u64 },

    #[error("Vocabulary dataset error: {0}")]
    Vocabulary(#[from] VocabularyLoadError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },
}

/// Structural rejection of a classification notation.
///
/// Always recoverable: the field engine converts these into findings and
/// keeps validating the rest of the record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("notation is empty")]
    Empty,

    #[error("disallowed character '{character}' at position {position}")]
    DisallowedCharacter { position: usize, character: char },

    #[error("unbalanced parenthetical qualifier")]
    UnbalancedQualifier,

    #[error("malformed notation: {0}")]
    Malformed(#[from] MalformedNotationError),
}

/// Parser-internal failure: the grouping rules could not consume the input.
///
/// The validator's precondition checks make this rare; it is converted to a
/// [`FormatError`] before leaving the notation layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedNotationError {
    #[error("empty input")]
    EmptyInput,

    #[error("unconsumed trailing input at position {position}")]
    TrailingInput { position: usize },
}

/// Fatal dataset problem at startup. Membership checks would be meaningless
/// with a partial vocabulary, so loading is all-or-nothing.
#[derive(Error, Debug)]
pub enum VocabularyLoadError {
    #[error("vocabulary dataset not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read vocabulary dataset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("vocabulary dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("vocabulary section missing from dataset: {section}")]
    MissingSection { section: &'static str },
}

/// Configuration-specific error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("Invalid configuration value: {field} = {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Environment variable error: {0}")]
    Environment(String),
}

impl From<ConfigError> for ValidateError {
    fn from(err: ConfigError) -> Self {
        ValidateError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidateError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = FormatError::DisallowedCharacter {
            position: 3,
            character: '@',
        };
        assert!(err.to_string().contains("'@'"));
        assert!(err.to_string().contains("position 3"));

        assert_eq!(FormatError::Empty.to_string(), "notation is empty");
        assert!(
            FormatError::UnbalancedQualifier
                .to_string()
                .contains("unbalanced")
        );
    }

    #[test]
    fn test_malformed_converts_to_format_error() {
        let parse_err = MalformedNotationError::TrailingInput { position: 7 };
        let format_err: FormatError = parse_err.into();
        match format_err {
            FormatError::Malformed(MalformedNotationError::TrailingInput { position }) => {
                assert_eq!(position, 7)
            }
            other => panic!("Expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_vocabulary_load_error_display() {
        let missing = VocabularyLoadError::MissingSection { section: "Epoche" };
        assert!(missing.to_string().contains("Epoche"));

        let not_found = VocabularyLoadError::NotFound {
            path: PathBuf::from("/nonexistent/vocabularies.json"),
        };
        assert!(not_found.to_string().contains("vocabularies.json"));
    }

    #[test]
    fn test_config_error_conversion() {
        let config_error = ConfigError::InvalidValue {
            field: "timeout".to_string(),
            value: "-1".to_string(),
            reason: "must be positive".to_string(),
        };
        let err: ValidateError = config_error.into();
        match err {
            ValidateError::Config(msg) => assert!(msg.contains("timeout")),
            _ => panic!("Expected ValidateError::Config"),
        }
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;

        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err = ValidateError::Io(io_error);
        assert!(err.source().is_some());
        assert_eq!(err.source().unwrap().to_string(), "File not found");
    }
}
