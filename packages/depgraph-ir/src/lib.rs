/*
 * depgraph-ir - Program Dependence Graphs
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Program model (Module, Function, BasicBlock, Instruction, Value)
 * - features/    : Vertical slices (graph_builder → control_dependence,
 *                  read_write_graph → system_dependence)
 * - config/      : Per-flavor configuration, versioned YAML
 * - errors       : DepGraphError
 *
 * Everything is built in one synchronous pass; graphs are immutable once
 * handed to the caller.
 */

#![allow(clippy::upper_case_acronyms)] // CDGraph, RWNode, DGNode naming
#![allow(clippy::new_without_default)] // Default impl not always needed

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Program model shared by every builder
pub mod shared;

/// Feature modules (graph flavors)
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{AnalysisConfig, CdGranularity, CdaConfig, ConfigError, RwgConfig, SdgConfig};
pub use errors::{DepGraphError, Result};

pub use features::control_dependence::{
    CDGraph, ControlDependence, ControlDependenceAnalysis, ControlDependenceInfo,
    ControlDependenceRelation,
};
pub use features::graph_builder::{GraphBuilder, GraphFlavor, NodeExpansion};
pub use features::read_write_graph::{
    DefSite, Offset, PointsToOracle, PointsToSet, ReadWriteGraph, ReadWriteGraphBuilder, StaticPointsTo,
};
pub use features::system_dependence::{SdgBuilder, SystemDependenceGraph};
