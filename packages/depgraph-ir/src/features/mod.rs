//! Feature modules - Each feature follows Hexagonal Architecture
//!
//! Each feature contains:
//! - domain/     - Graph data structures
//! - ports/      - Interface definitions (traits)
//! - application/ - Use cases
//! - infrastructure/ - Builders and algorithms
//!
//! Build order: `graph_builder` is the shared driver; the three flavors
//! implement its `GraphFlavor` trait.

// Generic graph construction (driver + GraphFlavor trait)
pub mod graph_builder;

// Control dependence (CDGraph + decisive order dependence, lazy)
pub mod control_dependence;

// Memory read/write graph (points-to oracle consumer)
pub mod read_write_graph;

// Interprocedural system dependence graph
pub mod system_dependence;
