//! Generic Graph Builder
//!
//! Reusable scaffolding shared by every graph flavor (control dependence,
//! read-write, system dependence):
//!
//! - `ports`: the [`GraphFlavor`] capability trait a flavor implements
//!   (node / block / subgraph construction plus optional hooks)
//! - `infrastructure`: the fixed driver [`GraphBuilder`] walking the program
//!   model in program order
//! - `domain`: [`NodeExpansion`] (one-to-many node expansion) and
//!   [`NodeMap`] (value → representative node)
//!
//! Building is two-phase: every function's intraprocedural graph first, then
//! one interprocedural pass adding call edges. Callees therefore never need
//! to be built before their callers.

pub mod domain;
pub mod infrastructure;
pub mod ports;

// Re-exports
pub use domain::{NodeExpansion, NodeMap};
pub use infrastructure::GraphBuilder;
pub use ports::{BuildContext, GraphFlavor};
