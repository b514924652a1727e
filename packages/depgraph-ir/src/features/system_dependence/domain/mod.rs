//! System dependence graph domain models
//!
//! One `DependenceGraph` per defined function, owned by the
//! `SystemDependenceGraph`. Nodes live in per-graph arenas and are addressed
//! module-wide by [`DGNodeRef`].

use crate::errors::{DepGraphError, Result};
use crate::shared::models::{BlockId, FunctionId, Module, Value};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Index into `SystemDependenceGraph::graphs`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DGId(pub u32);

/// Index into `DependenceGraph::nodes`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DGNodeId(pub u32);

/// Module-wide node handle
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DGNodeRef {
    pub graph: DGId,
    pub node: DGNodeId,
}

/// Block handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DGBBlockRef {
    pub graph: DGId,
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DGCall {
    /// Called dependence graphs
    pub callees: Vec<DGId>,
    /// Actual parameter nodes, in argument order
    pub parameters: Vec<DGNodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DGNodeKind {
    Instruction,
    Call(DGCall),
    FormalParameter { index: u32 },
    /// Variadic marker of a formal parameter list
    VarArg,
    ActualParameter { call: DGNodeId, index: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DGNode {
    pub id: DGNodeId,
    pub kind: DGNodeKind,
    /// Source value (instruction, argument or call argument)
    pub origin: Option<Value>,
}

impl DGNode {
    pub fn as_call(&self) -> Option<&DGCall> {
        match &self.kind {
            DGNodeKind::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        self.as_call().is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DGBBlock {
    pub origin: Option<BlockId>,
    pub nodes: Vec<DGNodeId>,
    /// Indices of successor blocks in the same graph
    pub successors: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DGFormalParameters {
    /// One per declared parameter, in order
    pub params: Vec<DGNodeId>,
    pub var_arg: Option<DGNodeId>,
}

/// Dependence graph of one function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependenceGraph {
    id: DGId,
    name: String,
    function: FunctionId,
    nodes: Vec<DGNode>,
    blocks: Vec<DGBBlock>,
    parameters: DGFormalParameters,
    /// Call nodes (in any graph) calling this one
    callers: Vec<DGNodeRef>,
    /// Set once the function body has been built
    built: bool,
}

impl DependenceGraph {
    fn new(id: DGId, function: FunctionId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            function,
            nodes: Vec::new(),
            blocks: Vec::new(),
            parameters: DGFormalParameters::default(),
            callers: Vec::new(),
            built: false,
        }
    }

    pub fn id(&self) -> DGId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function(&self) -> FunctionId {
        self.function
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn node(&self, id: DGNodeId) -> Option<&DGNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn nodes(&self) -> &[DGNode] {
        &self.nodes
    }

    pub fn blocks(&self) -> &[DGBBlock] {
        &self.blocks
    }

    pub fn parameters(&self) -> &DGFormalParameters {
        &self.parameters
    }

    pub fn callers(&self) -> &[DGNodeRef] {
        &self.callers
    }

    pub fn call_nodes(&self) -> impl Iterator<Item = (&DGNode, &DGCall)> + '_ {
        self.nodes
            .iter()
            .filter_map(|n| n.as_call().map(|call| (n, call)))
    }

    pub(crate) fn create_node(&mut self, kind: DGNodeKind, origin: Option<Value>) -> DGNodeId {
        let id = DGNodeId(self.nodes.len() as u32);
        self.nodes.push(DGNode { id, kind, origin });
        id
    }

    pub(crate) fn node_mut(&mut self, id: DGNodeId) -> Option<&mut DGNode> {
        self.nodes.get_mut(id.0 as usize)
    }

    pub(crate) fn create_bblock(&mut self, origin: BlockId) -> usize {
        self.blocks.push(DGBBlock {
            origin: Some(origin),
            ..DGBBlock::default()
        });
        self.blocks.len() - 1
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [DGBBlock] {
        &mut self.blocks
    }

    pub(crate) fn parameters_mut(&mut self) -> &mut DGFormalParameters {
        &mut self.parameters
    }

    pub(crate) fn add_caller(&mut self, caller: DGNodeRef) {
        if !self.callers.contains(&caller) {
            self.callers.push(caller);
        }
    }

    pub(crate) fn set_built(&mut self) {
        self.built = true;
    }
}

/// Interprocedural dependence graph of a module
#[derive(Debug, Default, Serialize)]
pub struct SystemDependenceGraph {
    graphs: Vec<DependenceGraph>,
    entry: Option<DGId>,
    #[serde(skip)]
    fun_map: FxHashMap<FunctionId, DGId>,
    #[serde(skip)]
    node_map: FxHashMap<Value, DGNodeRef>,
}

impl SystemDependenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON dump for diagnostics
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Dependence graph of `function`, if one was created
    pub fn get_dg(&self, function: FunctionId) -> Option<&DependenceGraph> {
        self.fun_map.get(&function).and_then(|id| self.graph(*id))
    }

    pub fn graph(&self, id: DGId) -> Option<&DependenceGraph> {
        self.graphs.get(id.0 as usize)
    }

    pub fn graphs(&self) -> &[DependenceGraph] {
        &self.graphs
    }

    pub fn node(&self, node: DGNodeRef) -> Option<&DGNode> {
        self.graph(node.graph).and_then(|g| g.node(node.node))
    }

    /// Handle of the node built for `value`
    pub fn node_ref(&self, value: &Value) -> Option<DGNodeRef> {
        self.node_map.get(value).copied()
    }

    /// Node built for `value`, `None` if it has none
    pub fn get_node(&self, value: &Value) -> Option<&DGNode> {
        self.node_ref(value).and_then(|r| self.node(r))
    }

    pub fn entry(&self) -> Option<&DependenceGraph> {
        self.entry.and_then(|id| self.graph(id))
    }

    /// Designate the graph of function `name` as the program entry
    pub fn set_entry_function(&mut self, module: &Module, name: &str) -> Result<()> {
        let function = module
            .function_by_name(name)
            .ok_or_else(|| DepGraphError::EntryNotFound {
                name: name.to_string(),
            })?;

        let id = self
            .fun_map
            .get(&function.id)
            .copied()
            .filter(|id| self.graph(*id).is_some_and(DependenceGraph::is_built))
            .ok_or_else(|| DepGraphError::EntryNotBuilt {
                name: name.to_string(),
            })?;

        debug!("Entry function set to '{}'", name);
        self.entry = Some(id);
        Ok(())
    }

    /// Memoized get-or-create keyed by function identity
    pub(crate) fn get_or_create_dg(&mut self, function: FunctionId, name: &str) -> DGId {
        if let Some(id) = self.fun_map.get(&function) {
            return *id;
        }
        let id = DGId(self.graphs.len() as u32);
        self.graphs.push(DependenceGraph::new(id, function, name));
        self.fun_map.insert(function, id);
        id
    }

    pub(crate) fn graph_mut(&mut self, id: DGId) -> Option<&mut DependenceGraph> {
        self.graphs.get_mut(id.0 as usize)
    }

    pub(crate) fn set_node_map(&mut self, node_map: FxHashMap<Value, DGNodeRef>) {
        self.node_map = node_map;
    }
}
