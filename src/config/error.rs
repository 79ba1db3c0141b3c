//! Configuration errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Configuration file not found; searched: {searched:?}")]
    ConfigFileNotFound { searched: Vec<PathBuf> },

    #[error("Failed to read configuration file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Invalid YAML in {path}: {reason}")]
    InvalidYaml { path: String, reason: String },

    #[error("Failed to assemble configuration: {0}")]
    Assembly(#[from] config::ConfigError),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required field {field} in {context}")]
    MissingRequiredField { field: String, context: String },
}

impl ConfigurationError {
    pub fn config_file_not_found(searched: Vec<PathBuf>) -> Self {
        Self::ConfigFileNotFound { searched }
    }

    pub fn invalid_yaml(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidYaml {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_required_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
            context: context.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
