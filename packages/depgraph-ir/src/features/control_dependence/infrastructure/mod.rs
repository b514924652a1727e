//! Control dependence infrastructure
//!
//! - `cd_graph_builder`: CDGraph construction (GraphFlavor)
//! - `decisive_order`: decisive (order) dependence on a finished CDGraph

pub mod cd_graph_builder;
pub mod decisive_order;

pub use cd_graph_builder::CDGraphBuilder;
pub use decisive_order::DecisiveOrderDependence;
