//! Shared module - Common types and utilities
//!
//! Types shared across all features: the program model every builder reads.

pub mod models;

// Re-exports for convenience
pub use models::*;
