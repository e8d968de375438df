//! Configuration validation errors.

use thiserror::Error;

/// Errors raised while validating a [`super::builder_config::GraphBuilderConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An unrecognized verbosity string was deserialized from a host
    /// application's config file.
    #[error("unknown tracing verbosity '{0}'; expected one of: quiet, normal, verbose")]
    UnknownVerbosity(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
