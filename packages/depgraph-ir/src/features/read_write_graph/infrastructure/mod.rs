//! Read-write graph infrastructure
//!
//! - `rwg_builder`: ReadWriteGraphBuilder (GraphFlavor)
//! - `static_points_to`: in-memory points-to table

pub mod rwg_builder;
pub mod static_points_to;

pub use rwg_builder::ReadWriteGraphBuilder;
pub use static_points_to::StaticPointsTo;
