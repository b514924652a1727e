//! Control dependence domain models
//!
//! - [`CDGraph`]: minimal control-flow graph of one function (one node per
//!   block or per instruction)
//! - [`ControlDependenceRelation`]: forward (decision → dependents) and
//!   reverse (dependent → decisions) maps, always exact inverses

use crate::shared::models::{FunctionId, Value};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// CDGraph node: the block or instruction it stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CDNode {
    pub origin: Value,
}

/// Module-wide handle of a CDGraph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CDNodeRef {
    pub function: FunctionId,
    pub node: NodeIndex,
}

/// Minimal control-flow graph of one function
#[derive(Debug, Clone)]
pub struct CDGraph {
    function: FunctionId,
    name: String,
    graph: DiGraph<CDNode, ()>,
}

impl CDGraph {
    pub fn new(function: FunctionId, name: impl Into<String>) -> Self {
        Self {
            function,
            name: name.into(),
            graph: DiGraph::new(),
        }
    }

    pub fn function(&self) -> FunctionId {
        self.function
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_node(&mut self, origin: Value) -> NodeIndex {
        self.graph.add_node(CDNode { origin })
    }

    /// Add a control-flow edge; parallel edges collapse into one
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        self.graph.update_edge(from, to, ());
    }

    pub fn node(&self, node: NodeIndex) -> Option<&CDNode> {
        self.graph.node_weight(node)
    }

    /// Source value the node stands for
    pub fn origin(&self, node: NodeIndex) -> Option<Value> {
        self.node(node).map(|n| n.origin)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn successors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(node, Direction::Outgoing)
    }

    pub fn predecessors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(node, Direction::Incoming)
    }

    /// A node with at least two distinct successors
    pub fn is_decision(&self, node: NodeIndex) -> bool {
        self.successors(node).nth(1).is_some()
    }

    pub fn has_decisions(&self) -> bool {
        self.nodes().any(|n| self.is_decision(n))
    }

    /// Graphviz rendering for diagnostics
    pub fn to_dot(&self) -> String {
        format!(
            "{:?}",
            Dot::with_config(&self.graph, &[Config::EdgeNoLabel])
        )
    }
}

/// Control dependence as a binary relation.
///
/// The underlying relation is ternary (decision, co-dependent targets,
/// branch direction); it is flattened into independent (decision,
/// dependent) pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlDependenceRelation {
    forward: FxHashMap<NodeIndex, BTreeSet<NodeIndex>>,
    reverse: FxHashMap<NodeIndex, BTreeSet<NodeIndex>>,
}

impl ControlDependenceRelation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` is control dependent on `decision`.
    /// Returns false if the pair was already present.
    pub fn add(&mut self, decision: NodeIndex, dependent: NodeIndex) -> bool {
        let added = self.forward.entry(decision).or_default().insert(dependent);
        self.reverse.entry(dependent).or_default().insert(decision);
        added
    }

    pub fn contains(&self, decision: NodeIndex, dependent: NodeIndex) -> bool {
        self.forward
            .get(&decision)
            .is_some_and(|deps| deps.contains(&dependent))
    }

    /// Nodes whose execution `decision` decides (forward edges)
    pub fn dependents(&self, decision: NodeIndex) -> Option<&BTreeSet<NodeIndex>> {
        self.forward.get(&decision)
    }

    /// Decisions `dependent` depends on (reverse edges)
    pub fn dependencies(&self, dependent: NodeIndex) -> Option<&BTreeSet<NodeIndex>> {
        self.reverse.get(&dependent)
    }

    pub fn forward(&self) -> &FxHashMap<NodeIndex, BTreeSet<NodeIndex>> {
        &self.forward
    }

    pub fn reverse(&self) -> &FxHashMap<NodeIndex, BTreeSet<NodeIndex>> {
        &self.reverse
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Number of (decision, dependent) pairs
    pub fn len(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    /// All pairs, sorted
    pub fn pairs(&self) -> Vec<(NodeIndex, NodeIndex)> {
        let mut pairs: Vec<_> = self
            .forward
            .iter()
            .flat_map(|(p, deps)| deps.iter().map(move |d| (*p, *d)))
            .collect();
        pairs.sort();
        pairs
    }
}
