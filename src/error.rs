//! Error types for observed trees.

use crate::types::{Key, NodeKind};
use thiserror::Error;

/// Boxed error raised by an observer callback.
pub type CallbackFault = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for tree operations.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Missing key: {0}")]
    MissingKey(Key),

    #[error("Key {key} is not valid for a {kind} node")]
    InvalidKey { key: Key, kind: NodeKind },

    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Value is not container-shaped")]
    NotContainer,

    #[error("Re-entrant mutation depth {depth} exceeds limit {limit}")]
    ReentrancyLimitExceeded { depth: usize, limit: usize },

    #[error("Callback failed: {0}")]
    Callback(#[source] CallbackFault),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl TreeError {
    /// Wrap an arbitrary observer fault.
    pub fn callback(err: impl Into<CallbackFault>) -> Self {
        TreeError::Callback(err.into())
    }
}

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
