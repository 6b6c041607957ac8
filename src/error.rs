//! Error types for engine construction.

use std::fmt;

/// Result type for fallible engine operations.
pub type WafResult<T> = Result<T, WafError>;

/// Errors raised while configuring or constructing an engine.
///
/// Inspection itself never fails: denials are ordinary decisions returned
/// as values. These errors are confined to startup.
#[derive(Debug)]
pub enum WafError {
    /// A rule pattern failed to compile.
    InvalidPattern(String),

    /// Engine configuration failed validation.
    InvalidConfig(String),
}

impl fmt::Display for WafError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern(msg) => write!(f, "invalid rule pattern: {msg}"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for WafError {}

impl WafError {
    /// Check if the error indicates a configuration problem rather than a
    /// bad rule.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}
