//! Configuration System
//!
//! Per-flavor configuration (control dependence, read-write graph, SDG)
//! with a versioned YAML schema.
//!
//! # Examples
//!
//! ```rust
//! use depgraph_ir::config::{AnalysisConfig, CdGranularity, CdaConfig};
//!
//! // Programmatic
//! let cda = CdaConfig::default().granularity(CdGranularity::Instruction);
//! assert!(cda.node_per_instruction());
//!
//! // YAML
//! let config = AnalysisConfig::from_yaml_str("version: 1\n").unwrap();
//! assert_eq!(config.sdg.entry_function, "main");
//! ```

pub mod analysis_config;
pub mod error;

// Re-exports
pub use analysis_config::{AnalysisConfig, CdGranularity, CdaConfig, RwgConfig, SdgConfig};
pub use error::{ConfigError, ConfigResult};
