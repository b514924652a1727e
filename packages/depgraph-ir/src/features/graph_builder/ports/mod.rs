//! Graph Builder Ports - Interface Layer
//!
//! The capability trait every graph flavor implements. The driver in
//! `infrastructure` owns the traversal; flavors only say how a node, a
//! block and a subgraph are made.

use crate::errors::Result;
use crate::features::graph_builder::domain::{NodeExpansion, NodeMap};
use crate::shared::models::{BasicBlock, BlockId, Function, Instruction, Module, Value};
use std::fmt::Debug;
use std::hash::Hash;

/// What a flavor sees while creating a node
pub struct BuildContext<'a, S, N> {
    pub module: &'a Module,
    pub function: &'a Function,
    pub subgraph: S,
    /// Nodes built so far (operand resolution)
    pub nodes: &'a NodeMap<N>,
}

/// Graph construction capability
///
/// # Required
/// - `create_subgraph`, `create_bblock`, `create_node`: the three
///   construction steps
/// - `append`: place a created node into its block
///
/// # Hooks (default: no-op)
/// - `create_parameters`: formal parameter nodes, mapped by the driver
/// - `finish_subgraph`: intraprocedural edges once all blocks exist
/// - `build_call_edges`: interprocedural pass after every function is built
/// - `discard_subgraph`: drop partial state of a function whose build failed
pub trait GraphFlavor {
    /// Node handle (stable for the lifetime of the graph)
    type Node: Copy + Eq + Hash + Debug;
    /// Block handle
    type Block: Copy + Debug;
    /// Subgraph handle
    type Subgraph: Copy + Debug;

    fn create_subgraph(&mut self, function: &Function) -> Result<Self::Subgraph>;

    fn create_bblock(&mut self, block: &BasicBlock, subgraph: Self::Subgraph) -> Result<Self::Block>;

    /// `Ok(None)` when the instruction has no node in this flavor
    fn create_node(
        &mut self,
        ctx: &BuildContext<'_, Self::Subgraph, Self::Node>,
        inst: &Instruction,
    ) -> Result<Option<NodeExpansion<Self::Node>>>;

    fn append(&mut self, block: Self::Block, node: Self::Node);

    fn create_parameters(
        &mut self,
        _function: &Function,
        _subgraph: Self::Subgraph,
    ) -> Result<Vec<(Value, Self::Node)>> {
        Ok(Vec::new())
    }

    fn finish_subgraph(
        &mut self,
        _function: &Function,
        _subgraph: Self::Subgraph,
        _blocks: &[(BlockId, Self::Block)],
    ) -> Result<()> {
        Ok(())
    }

    fn build_call_edges(&mut self, _module: &Module, _nodes: &NodeMap<Self::Node>) -> Result<()> {
        Ok(())
    }

    fn discard_subgraph(&mut self, _function: &Function) {}
}
