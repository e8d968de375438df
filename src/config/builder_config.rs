//! Host-embeddable configuration for the Builder and Analyzer.

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// How much `tracing` instrumentation the Builder emits at construction
/// time. Purely diagnostic: never affects `ExpressionGraph`'s observable
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingVerbosity {
    Quiet,
    Normal,
    Verbose,
}

impl TracingVerbosity {
    pub fn as_level(self) -> tracing::Level {
        match self {
            TracingVerbosity::Quiet => tracing::Level::WARN,
            TracingVerbosity::Normal => tracing::Level::INFO,
            TracingVerbosity::Verbose => tracing::Level::DEBUG,
        }
    }

    fn parse(s: &str) -> ConfigResult<Self> {
        match s {
            "quiet" => Ok(TracingVerbosity::Quiet),
            "normal" => Ok(TracingVerbosity::Normal),
            "verbose" => Ok(TracingVerbosity::Verbose),
            other => Err(ConfigError::UnknownVerbosity(other.to_string())),
        }
    }
}

/// Knobs a host application may embed in its own config file to control
/// how its `ExpressionGraph`s are built.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GraphBuilderConfig {
    /// Mirrors `ExpressionGraph::set_unique_constants`: when `true`, two
    /// `CONSTANT` nodes with the same value are never hash-consed into one
    /// node (§ C5's `unique_constants` switch).
    pub unique_constants: bool,
    pub tracing_verbosity: TracingVerbosity,
}

impl Default for GraphBuilderConfig {
    fn default() -> Self {
        Self {
            unique_constants: false,
            tracing_verbosity: TracingVerbosity::Normal,
        }
    }
}

impl GraphBuilderConfig {
    /// Parses a verbosity string from a host's raw config value (e.g. an
    /// untyped YAML/JSON field) rather than relying on `serde` alone, so a
    /// bad value is reported as a `ConfigError` instead of a deserialize
    /// failure with no field context.
    pub fn with_tracing_verbosity_str(mut self, s: &str) -> ConfigResult<Self> {
        self.tracing_verbosity = TracingVerbosity::parse(s)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unique_constants_off_and_normal_verbosity() {
        let cfg = GraphBuilderConfig::default();
        assert!(!cfg.unique_constants);
        assert_eq!(cfg.tracing_verbosity, TracingVerbosity::Normal);
    }

    #[test]
    fn unknown_verbosity_string_is_a_config_error() {
        let result = GraphBuilderConfig::default().with_tracing_verbosity_str("loud");
        assert!(matches!(result, Err(ConfigError::UnknownVerbosity(_))));
    }
}
