//! Error types shared across the workspace.

use thiserror::Error;

/// Errors raised while loading or validating the broker's configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: Box<config::ConfigError>,
    },

    #[error("config field '{field}' is invalid: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("failed to compile template '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: Box<tera::Error>,
    },
}

/// Errors raised by the model registry while decoding a submitted payload.
///
/// This is the crate's stand-in for the external parameter-model service;
/// the HTTP surface maps every variant onto a `validation_failure` response.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("unknown model '{name}' version {version}")]
    UnknownModel { name: String, version: u32 },

    #[error("missing required parameter '{name}'")]
    MissingParameter { name: String },

    #[error("parameter '{name}' has an invalid value: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("request payload is not a JSON object")]
    NotAnObject,
}
