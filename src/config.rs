//! Configuration for observed trees.
//!
//! # Example
//!
//! ```
//! use nestwatch::TreeConfig;
//!
//! let config = TreeConfig::default();
//! assert_eq!(config.max_reentrancy_depth, 32);
//!
//! let config: TreeConfig = serde_json::from_str(r#"{"max_reentrancy_depth": 4}"#).unwrap();
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{Result, TreeError};
use serde::Deserialize;

/// Limits shared by every node built from the same factory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeConfig {
    /// Maximum nesting of mutations, counting the outermost one. A mutation
    /// made from a callback at this depth fails with
    /// `ReentrancyLimitExceeded` (default: 32).
    #[serde(default = "default_max_reentrancy_depth")]
    pub max_reentrancy_depth: usize,
}

fn default_max_reentrancy_depth() -> usize {
    32
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_reentrancy_depth: default_max_reentrancy_depth(),
        }
    }
}

impl TreeConfig {
    /// Reject configurations that would make every notification fail.
    pub fn validate(&self) -> Result<()> {
        if self.max_reentrancy_depth == 0 {
            return Err(TreeError::InvalidConfig(
                "max_reentrancy_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
