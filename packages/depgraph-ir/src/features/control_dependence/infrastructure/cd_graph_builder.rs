// CDGraph Builder - GraphFlavor for control dependence
//
// Block granularity:        one node per basic block (created with the block)
// Instruction granularity:  one node per instruction, chained in program
//                           order; the last node of a block links to the
//                           first node of every successor block. Blocks
//                           without instructions get a placeholder node.

use petgraph::graph::NodeIndex;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::errors::{DepGraphError, Result};
use crate::features::control_dependence::domain::{CDGraph, CDNodeRef};
use crate::features::graph_builder::domain::NodeExpansion;
use crate::features::graph_builder::ports::{BuildContext, GraphFlavor};
use crate::shared::models::{BasicBlock, BlockId, Function, FunctionId, Instruction, Value};

/// Builds one [`CDGraph`] per function
#[derive(Debug, Default)]
pub struct CDGraphBuilder {
    node_per_instruction: bool,
    graphs: FxHashMap<FunctionId, CDGraph>,
    /// Block granularity only
    block_nodes: FxHashMap<BlockId, CDNodeRef>,
    /// Instruction granularity only: nodes of each block in program order
    block_sequences: FxHashMap<BlockId, Vec<NodeIndex>>,
}

impl CDGraphBuilder {
    pub fn new(node_per_instruction: bool) -> Self {
        Self {
            node_per_instruction,
            ..Self::default()
        }
    }

    pub fn node_per_instruction(&self) -> bool {
        self.node_per_instruction
    }

    pub fn graph(&self, function: FunctionId) -> Option<&CDGraph> {
        self.graphs.get(&function)
    }

    /// Move the finished graph of `function` out of the builder
    pub fn take_graph(&mut self, function: FunctionId) -> Option<CDGraph> {
        self.graphs.remove(&function)
    }

    /// Node standing for `block` (block granularity)
    pub fn node_for_block(&self, block: BlockId) -> Option<CDNodeRef> {
        self.block_nodes.get(&block).copied()
    }

    fn graph_mut(&mut self, function: FunctionId) -> Result<&mut CDGraph> {
        self.graphs
            .get_mut(&function)
            .ok_or_else(|| DepGraphError::invalid_program(format!("no CDGraph for {:?}", function)))
    }

    fn link_blocks(&mut self, function: &Function) -> Result<()> {
        let mut edges = Vec::new();
        for block in &function.blocks {
            let from = self.block_node(block.id)?;
            for succ in block.successors() {
                edges.push((from, self.block_node(local(function, succ)?)?));
            }
        }

        let graph = self.graph_mut(function.id)?;
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        Ok(())
    }

    fn link_instructions(&mut self, function: &Function) -> Result<()> {
        // placeholder nodes for empty blocks
        for block in &function.blocks {
            let empty = self
                .block_sequences
                .get(&block.id)
                .map_or(true, |seq| seq.is_empty());
            if empty {
                let node = self.graph_mut(function.id)?.add_node(Value::Block(block.id));
                self.block_sequences.entry(block.id).or_default().push(node);
            }
        }

        let mut edges = Vec::new();
        for block in &function.blocks {
            let seq = self.sequence(block.id)?;
            edges.extend(seq.windows(2).map(|w| (w[0], w[1])));
            let Some(&last) = seq.last() else {
                continue;
            };
            for succ in block.successors() {
                if let Some(&first) = self.sequence(local(function, succ)?)?.first() {
                    edges.push((last, first));
                }
            }
        }

        let graph = self.graph_mut(function.id)?;
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        Ok(())
    }

    fn block_node(&self, block: BlockId) -> Result<NodeIndex> {
        self.block_nodes
            .get(&block)
            .map(|r| r.node)
            .ok_or_else(|| DepGraphError::invalid_program(format!("unknown successor block {:?}", block)))
    }

    fn sequence(&self, block: BlockId) -> Result<&[NodeIndex]> {
        self.block_sequences
            .get(&block)
            .map(Vec::as_slice)
            .ok_or_else(|| DepGraphError::invalid_program(format!("unknown successor block {:?}", block)))
    }
}

/// Successors must stay inside the function
fn local(function: &Function, succ: BlockId) -> Result<BlockId> {
    if succ.function != function.id {
        return Err(DepGraphError::invalid_program(format!(
            "'{}' branches to {:?} outside the function",
            function.name, succ
        )));
    }
    Ok(succ)
}

impl GraphFlavor for CDGraphBuilder {
    type Node = CDNodeRef;
    type Block = BlockId;
    type Subgraph = FunctionId;

    fn create_subgraph(&mut self, function: &Function) -> Result<FunctionId> {
        if self.graphs.contains_key(&function.id) {
            return Err(DepGraphError::DuplicateSubgraph {
                function: function.id,
                name: function.name.clone(),
            });
        }
        self.graphs
            .insert(function.id, CDGraph::new(function.id, function.name.clone()));
        Ok(function.id)
    }

    fn create_bblock(&mut self, block: &BasicBlock, subgraph: FunctionId) -> Result<BlockId> {
        if self.node_per_instruction {
            self.block_sequences.insert(block.id, Vec::new());
        } else {
            let node = self.graph_mut(subgraph)?.add_node(Value::Block(block.id));
            self.block_nodes.insert(
                block.id,
                CDNodeRef {
                    function: subgraph,
                    node,
                },
            );
        }
        Ok(block.id)
    }

    fn create_node(
        &mut self,
        ctx: &BuildContext<'_, FunctionId, CDNodeRef>,
        inst: &Instruction,
    ) -> Result<Option<NodeExpansion<CDNodeRef>>> {
        if !self.node_per_instruction {
            return Ok(None);
        }
        let node = self.graph_mut(ctx.subgraph)?.add_node(inst.value());
        Ok(Some(NodeExpansion::single(CDNodeRef {
            function: ctx.subgraph,
            node,
        })))
    }

    fn append(&mut self, block: BlockId, node: CDNodeRef) {
        if let Some(seq) = self.block_sequences.get_mut(&block) {
            seq.push(node.node);
        }
    }

    fn finish_subgraph(
        &mut self,
        function: &Function,
        _subgraph: FunctionId,
        _blocks: &[(BlockId, BlockId)],
    ) -> Result<()> {
        if self.node_per_instruction {
            self.link_instructions(function)?;
        } else {
            self.link_blocks(function)?;
        }

        if let Some(graph) = self.graph(function.id) {
            trace!(
                "CDGraph '{}': {} nodes, {} edges",
                graph.name(),
                graph.node_count(),
                graph.edge_count()
            );
        }
        Ok(())
    }

    fn discard_subgraph(&mut self, function: &Function) {
        self.graphs.remove(&function.id);
        for block in &function.blocks {
            self.block_nodes.remove(&block.id);
            self.block_sequences.remove(&block.id);
        }
    }
}
