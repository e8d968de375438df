//! Ambient configuration for embedding this crate's Builder/Analyzer in a
//! host application's own config layer.

pub mod builder_config;
pub mod error;

pub use builder_config::{GraphBuilderConfig, TracingVerbosity};
pub use error::{ConfigError, ConfigResult};
