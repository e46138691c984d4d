//! Configuration error types.

use thiserror::Error;

/// Result type alias for configuration loading and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or validating a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("[[{section}]] - {field} can't be empty")]
    MissingField {
        section: &'static str,
        field: &'static str,
    },

    #[error("duplicated {category} name: {name}")]
    DuplicateName {
        category: &'static str,
        name: String,
    },

    #[error("[[{section}]] {name}: invalid duration {value:?}")]
    InvalidDuration {
        section: &'static str,
        name: String,
        value: String,
    },

    #[error("[[{section}]] {name}: {reason}")]
    Invalid {
        section: &'static str,
        name: String,
        reason: String,
    },
}
