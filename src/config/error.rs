//! Errors raised while locating, parsing or validating the data-access
//! configuration.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("No storefront-db configuration file found (looked in {searched_paths:?})")]
    ConfigFileNotFound { searched_paths: Vec<PathBuf> },

    #[error("Could not read '{file_path}'")]
    FileReadError {
        file_path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{file_path}' is not valid configuration YAML: {reason}")]
    InvalidYaml { file_path: String, reason: String },

    /// A field holds a value the data-access layer cannot run with
    #[error("{field} = '{value}' rejected: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("database.url references ${{{variable}}}: {reason}")]
    EnvironmentVariableError { variable: String, reason: String },
}

impl ConfigurationError {
    pub fn config_file_not_found(searched_paths: Vec<PathBuf>) -> Self {
        Self::ConfigFileNotFound { searched_paths }
    }

    pub fn file_read_error(file_path: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileReadError {
            file_path: file_path.into(),
            source,
        }
    }

    pub fn invalid_yaml(file_path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidYaml {
            file_path: file_path.into(),
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

    pub fn environment_variable_error(
        variable: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::EnvironmentVariableError {
            variable: variable.into(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;
