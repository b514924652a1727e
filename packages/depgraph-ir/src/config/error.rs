//! Errors raised while loading or validating an `AnalysisConfig`

use thiserror::Error;

/// Analysis configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Value validation error
    #[error("Invalid value for field '{field}': {value}. {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },

    /// YAML document without a schema version
    #[error("Analysis config has no 'version' field (expected 'version: 1')")]
    MissingVersion,

    /// Unsupported version
    #[error("Unsupported analysis config version {found} (supported: {supported:?})")]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    /// Reading the config file failed
    #[error("Cannot read analysis config: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed YAML or unknown field
    #[error("Invalid analysis config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Create an invalid-value error with a hint
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            hint: hint.into(),
        }
    }
}
