//! Read-Write (Data Dependence) Graph
//!
//! Memory-relevant instructions become `RWNode`s recording which memory
//! they define, overwrite and use. Pointer targets come from an external
//! points-to oracle ([`PointsToOracle`]); the builder never runs one.
//!
//! Architecture:
//! - domain: DefSite, Offset, ReadWriteGraph and its nodes/subgraphs
//! - ports: PointsToOracle
//! - infrastructure: ReadWriteGraphBuilder (GraphFlavor), StaticPointsTo

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{
    AllocationFunction, DefSite, MemoryTarget, Offset, PointsToSet, PointsToTarget, RWBBlock,
    RWBBlockRef, RWNode, RWNodeId, RWNodeKind, RWSubgraph, RWSubgraphId, ReadWriteGraph,
};
pub use infrastructure::{ReadWriteGraphBuilder, StaticPointsTo};
pub use ports::PointsToOracle;
