//! Control Dependence
//!
//! Per-function control dependence over a minimal CFG (`CDGraph`), computed
//! lazily with the decisive (order) dependence algorithm.
//!
//! Architecture:
//! - domain: CDGraph, ControlDependenceRelation
//! - ports: ControlDependence query trait
//! - infrastructure: CDGraphBuilder (GraphFlavor), DecisiveOrderDependence
//! - application: ControlDependenceAnalysis (cache + queries)

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{ControlDependenceAnalysis, ControlDependenceInfo};
pub use domain::{CDGraph, CDNode, CDNodeRef, ControlDependenceRelation};
pub use infrastructure::{CDGraphBuilder, DecisiveOrderDependence};
pub use ports::ControlDependence;
