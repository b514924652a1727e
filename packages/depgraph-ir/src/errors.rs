//! Error types for depgraph-ir
//!
//! Provides unified error handling across the crate.
//!
//! Two families matter to callers:
//! - **Invariant violations**: malformed input or API misuse (duplicate
//!   builds, double computation, unresolved entry). The enclosing build is
//!   abandoned; there is no partial recovery.
//! - **Unsupported features**: explicit "not implemented" answers, distinct
//!   from a genuine empty result.
//!
//! Missing data (a value that was never built) is not an error: lookups
//! return `None` or an empty collection.

use crate::config::ConfigError;
use crate::shared::models::{FunctionId, Value};
use thiserror::Error;

/// Main error type for depgraph-ir operations
#[derive(Debug, Error)]
pub enum DepGraphError {
    /// A value was mapped to a node twice by the same builder
    #[error("Building a node that we already have: {value}")]
    DuplicateNode { value: Value },

    /// A function was built into the same graph twice
    #[error("Function '{name}' is already built into this graph")]
    DuplicateSubgraph { function: FunctionId, name: String },

    /// Control dependence for a function was computed twice
    #[error("Control dependence for '{name}' is already computed")]
    AlreadyComputed { function: FunctionId, name: String },

    /// The requested entry function does not exist in the module
    #[error("Module does not contain the entry function '{name}'")]
    EntryNotFound { name: String },

    /// The entry function exists but its graph was never built
    #[error("Did not build the entry function '{name}'")]
    EntryNotBuilt { name: String },

    /// The points-to oracle has no results for a function yet
    #[error("Points-to results for '{name}' are not computed")]
    PointsToNotReady { function: FunctionId, name: String },

    /// Ids that do not resolve in the module
    #[error("Invalid program: {0}")]
    InvalidProgram(String),

    /// Explicitly unsupported operation
    #[error("Not implemented: {0}")]
    Unsupported(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Module or graph (de)serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DepGraphError {
    /// Create an unsupported-operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        DepGraphError::Unsupported(msg.into())
    }

    /// Create an invalid-program error
    pub fn invalid_program(msg: impl Into<String>) -> Self {
        DepGraphError::InvalidProgram(msg.into())
    }

    /// Malformed input or API misuse
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            DepGraphError::DuplicateNode { .. }
                | DepGraphError::DuplicateSubgraph { .. }
                | DepGraphError::AlreadyComputed { .. }
                | DepGraphError::EntryNotFound { .. }
                | DepGraphError::EntryNotBuilt { .. }
                | DepGraphError::PointsToNotReady { .. }
                | DepGraphError::InvalidProgram(_)
        )
    }

    /// Explicit "not implemented" signal
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DepGraphError::Unsupported(_))
    }
}

/// Result type alias for depgraph operations
pub type Result<T> = std::result::Result<T, DepGraphError>;
