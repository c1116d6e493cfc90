//! Error types for the tabular RL core

use thiserror::Error;

/// Core error type for tabular RL operations
#[derive(Error, Debug)]
pub enum RLError {
    /// Malformed environment (bad tensor, out-of-range start or goal)
    #[error("Environment error: {0}")]
    Environment(String),

    /// Agent configuration outside its documented range
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Action index outside the action space
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// State index outside the state space
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length along the offending axis
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for RL operations
pub type Result<T> = std::result::Result<T, RLError>;
