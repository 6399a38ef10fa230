//! Error types for engine configuration

use thiserror::Error;

/// Errors raised while building an engine configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid confidence threshold '{0}': expected a number between 0 and 1")]
    InvalidThreshold(String),

    #[error("Unknown highlight mode '{0}': expected 'literal' or 'positional'")]
    UnknownHighlightMode(String),

    #[error("Unknown strategy '{0}': expected 'keyword' or 'question'")]
    UnknownStrategy(String),
}
