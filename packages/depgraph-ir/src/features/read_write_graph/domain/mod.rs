//! Read-write graph domain models
//!
//! Memory access descriptors (`DefSite`) and the arena-backed
//! `ReadWriteGraph`: nodes, per-function subgraphs and their blocks.

use crate::errors::Result;
use crate::shared::models::{BlockId, FunctionId, Value};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Memory descriptors
// ============================================================================

/// Kind of a dynamic allocation function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationFunction {
    Malloc,
    Calloc,
    Alloca,
    Realloc,
}

/// Byte offset or length; `Offset::UNKNOWN` when not statically known
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Offset(pub u64);

impl Offset {
    pub const UNKNOWN: Offset = Offset(u64::MAX);
    pub const ZERO: Offset = Offset(0);

    #[inline]
    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

impl From<Option<u64>> for Offset {
    fn from(v: Option<u64>) -> Self {
        v.map_or(Offset::UNKNOWN, Offset)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "?")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Memory object a pointer may refer to, as reported by the points-to oracle
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum MemoryTarget {
    /// Allocation site (alloca/allocation call instruction) or global
    Object(Value),
    Function(FunctionId),
    Null,
    Unknown,
}

/// Memory region touched by an access: (target, offset, length)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DefSite {
    pub target: MemoryTarget,
    pub offset: Offset,
    pub len: Offset,
}

impl DefSite {
    /// An unknown offset or length widens to "offset 0, unbounded"
    pub fn new(target: MemoryTarget, offset: Offset, len: Offset) -> Self {
        if offset.is_unknown() || len.is_unknown() {
            Self {
                target,
                offset: Offset::ZERO,
                len: Offset::UNKNOWN,
            }
        } else {
            Self { target, offset, len }
        }
    }

    /// Any memory at all
    pub fn unknown() -> Self {
        Self::new(MemoryTarget::Unknown, Offset::ZERO, Offset::UNKNOWN)
    }

    pub fn is_unknown_memory(&self) -> bool {
        self.target == MemoryTarget::Unknown
    }

    /// Whether two accesses may touch the same byte
    pub fn may_overlap(&self, other: &DefSite) -> bool {
        if self.is_unknown_memory() || other.is_unknown_memory() {
            return true;
        }
        if self.target != other.target {
            return false;
        }
        if self.len.is_unknown() || other.len.is_unknown() {
            return true;
        }
        self.offset.0 < other.offset.0.saturating_add(other.len.0)
            && other.offset.0 < self.offset.0.saturating_add(self.len.0)
    }
}

/// One (target, offset) pair of a points-to set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsToTarget {
    pub target: MemoryTarget,
    pub offset: Offset,
}

/// Oracle answer for one pointer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsToSet {
    pub targets: Vec<PointsToTarget>,
}

impl PointsToSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, target: MemoryTarget, offset: Offset) -> Self {
        self.targets.push(PointsToTarget { target, offset });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Function targets (indirect call resolution)
    pub fn functions(&self) -> impl Iterator<Item = FunctionId> + '_ {
        self.targets.iter().filter_map(|t| match t.target {
            MemoryTarget::Function(f) => Some(f),
            _ => None,
        })
    }
}

// ============================================================================
// Graph
// ============================================================================

/// Node index into `ReadWriteGraph::nodes`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RWNodeId(pub u32);

/// Subgraph index into `ReadWriteGraph::subgraphs`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RWSubgraphId(pub u32);

/// Block handle: owning subgraph + position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RWBBlockRef {
    pub subgraph: RWSubgraphId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RWNodeKind {
    /// Static allocation
    Alloc,
    /// Call to a dynamic allocation function
    DynAlloc(AllocationFunction),
    Store,
    Load,
    Return,
    Call,
    /// Memory effect of an undefined call on one pointer argument
    CallEffect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RWNode {
    pub id: RWNodeId,
    pub kind: RWNodeKind,
    pub subgraph: RWSubgraphId,
    /// Instruction the node was created for
    pub origin: Value,
    /// May-defined memory
    pub defs: Vec<DefSite>,
    /// Must-defined memory (strong update)
    pub overwrites: Vec<DefSite>,
    pub uses: Vec<DefSite>,
    /// Called subgraphs (call nodes)
    pub callees: Vec<RWSubgraphId>,
    /// Allocated bytes (allocation nodes), `None` when unknown
    pub size: Option<u64>,
}

impl RWNode {
    pub fn is_call(&self) -> bool {
        self.kind == RWNodeKind::Call
    }

    pub fn is_alloc(&self) -> bool {
        matches!(self.kind, RWNodeKind::Alloc | RWNodeKind::DynAlloc(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RWBBlock {
    pub origin: Option<BlockId>,
    pub nodes: Vec<RWNodeId>,
    /// Indices of successor blocks in the same subgraph
    pub successors: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RWSubgraph {
    pub id: RWSubgraphId,
    pub function: FunctionId,
    pub name: String,
    pub blocks: Vec<RWBBlock>,
    /// Index of the entry block
    pub entry: Option<usize>,
    pub returns: Vec<RWNodeId>,
    /// Call nodes calling this subgraph
    pub callers: Vec<RWNodeId>,
}

/// Memory read/write graph of a whole module
#[derive(Debug, Default, Serialize)]
pub struct ReadWriteGraph {
    nodes: Vec<RWNode>,
    subgraphs: Vec<RWSubgraph>,
    #[serde(skip)]
    fun_map: FxHashMap<FunctionId, RWSubgraphId>,
    #[serde(skip)]
    node_map: FxHashMap<Value, RWNodeId>,
}

impl ReadWriteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON dump for diagnostics
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub(crate) fn create_node(&mut self, kind: RWNodeKind, subgraph: RWSubgraphId, origin: Value) -> RWNodeId {
        let id = RWNodeId(self.nodes.len() as u32);
        self.nodes.push(RWNode {
            id,
            kind,
            subgraph,
            origin,
            defs: Vec::new(),
            overwrites: Vec::new(),
            uses: Vec::new(),
            callees: Vec::new(),
            size: None,
        });
        id
    }

    pub(crate) fn create_subgraph(&mut self, function: FunctionId, name: &str) -> RWSubgraphId {
        let id = RWSubgraphId(self.subgraphs.len() as u32);
        self.subgraphs.push(RWSubgraph {
            id,
            function,
            name: name.to_string(),
            blocks: Vec::new(),
            entry: None,
            returns: Vec::new(),
            callers: Vec::new(),
        });
        self.fun_map.insert(function, id);
        id
    }

    pub(crate) fn node_mut(&mut self, id: RWNodeId) -> Option<&mut RWNode> {
        self.nodes.get_mut(id.0 as usize)
    }

    pub(crate) fn subgraph_mut(&mut self, id: RWSubgraphId) -> Option<&mut RWSubgraph> {
        self.subgraphs.get_mut(id.0 as usize)
    }

    pub(crate) fn set_node_map(&mut self, node_map: FxHashMap<Value, RWNodeId>) {
        self.node_map = node_map;
    }

    pub fn node(&self, id: RWNodeId) -> Option<&RWNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn nodes(&self) -> &[RWNode] {
        &self.nodes
    }

    pub fn subgraph(&self, id: RWSubgraphId) -> Option<&RWSubgraph> {
        self.subgraphs.get(id.0 as usize)
    }

    pub fn subgraphs(&self) -> &[RWSubgraph] {
        &self.subgraphs
    }

    /// Subgraph built for `function`
    pub fn subgraph_of(&self, function: FunctionId) -> Option<&RWSubgraph> {
        self.fun_map.get(&function).and_then(|id| self.subgraph(*id))
    }

    /// Representative node of `value`, `None` if it has no node
    pub fn get_node(&self, value: &Value) -> Option<&RWNode> {
        self.node_map.get(value).and_then(|id| self.node(*id))
    }

    /// Nodes of one block, in order
    pub fn block_nodes(&self, block: RWBBlockRef) -> impl Iterator<Item = &RWNode> + '_ {
        self.subgraph(block.subgraph)
            .and_then(|s| s.blocks.get(block.index))
            .into_iter()
            .flat_map(|b| b.nodes.iter())
            .filter_map(|id| self.node(*id))
    }
}
