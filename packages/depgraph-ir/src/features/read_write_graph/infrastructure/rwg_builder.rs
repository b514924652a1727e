// Read-Write Graph Builder - GraphFlavor for memory accesses
//
// Node creation per instruction:
//   alloca                       → Alloc
//   call to allocation function  → DynAlloc (realloc also uses the old memory)
//   store / load                 → Store (defs | overwrites) / Load (uses)
//   ret                          → Return (recorded in the subgraph)
//   call to defined function     → Call (callee linked in build_call_edges)
//   call to undefined function   → Call + one CallEffect per pointer argument
//   anything else                → no node
//
// Pointers are resolved through the points-to oracle (`map_pointers`).

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::config::RwgConfig;
use crate::errors::{DepGraphError, Result};
use crate::features::graph_builder::domain::{NodeExpansion, NodeMap};
use crate::features::graph_builder::ports::{BuildContext, GraphFlavor};
use crate::features::graph_builder::GraphBuilder;
use crate::features::read_write_graph::domain::{
    AllocationFunction, DefSite, MemoryTarget, Offset, RWBBlock, RWBBlockRef, RWNode, RWNodeId,
    RWNodeKind, RWSubgraphId, ReadWriteGraph,
};
use crate::features::read_write_graph::ports::PointsToOracle;
use crate::shared::models::{
    BasicBlock, BlockId, Callee, Function, FunctionId, Instruction, InstructionKind, Module, Value,
};

type Ctx<'c> = BuildContext<'c, RWSubgraphId, RWNodeId>;

/// Builds a [`ReadWriteGraph`] for every defined function of a module
pub struct ReadWriteGraphBuilder<'a, P: PointsToOracle + ?Sized> {
    module: &'a Module,
    oracle: &'a P,
    config: RwgConfig,
    graph: ReadWriteGraph,
    block_index: FxHashMap<BlockId, RWBBlockRef>,
    /// Call nodes waiting for the interprocedural pass
    pending_calls: Vec<(RWNodeId, FunctionId)>,
}

impl<'a, P: PointsToOracle + ?Sized> ReadWriteGraphBuilder<'a, P> {
    pub fn new(module: &'a Module, oracle: &'a P, config: RwgConfig) -> Self {
        Self {
            module,
            oracle,
            config,
            graph: ReadWriteGraph::new(),
            block_index: FxHashMap::default(),
            pending_calls: Vec::new(),
        }
    }

    /// Build every defined function and hand the graph over
    pub fn build(self) -> Result<ReadWriteGraph> {
        self.config.validate()?;
        let module = self.module;
        let mut driver = GraphBuilder::new(self);
        driver.build_module(module)?;

        let (flavor, nodes) = driver.into_parts();
        let mut graph = flavor.graph;
        graph.set_node_map(nodes.iter().map(|(v, n)| (*v, *n)).collect());
        debug!(
            "Read-write graph for '{}': {} subgraphs, {} nodes",
            module.name,
            graph.subgraphs().len(),
            graph.nodes().len()
        );
        Ok(graph)
    }

    /// One DefSite per memory target `pointer` may refer to.
    ///
    /// No points-to information yields a single unknown-memory DefSite;
    /// function and null targets are dropped.
    pub fn map_pointers(&self, at: &Instruction, pointer: &Value, size: Option<u64>) -> Vec<DefSite> {
        let Some(pts) = self.oracle.resolve(pointer) else {
            warn!("No points-to information for {} at {}", pointer, at.value());
            return vec![DefSite::unknown()];
        };
        if pts.is_empty() {
            warn!("Empty points-to set for {} at {}", pointer, at.value());
            return Vec::new();
        }

        let len = Offset::from(size);
        let mut sites: Vec<DefSite> = Vec::with_capacity(pts.len());
        for pt in &pts.targets {
            let site = match pt.target {
                MemoryTarget::Function(_) | MemoryTarget::Null => continue,
                MemoryTarget::Unknown => DefSite::unknown(),
                target @ MemoryTarget::Object(_) => DefSite::new(target, pt.offset, len),
            };
            if !sites.contains(&site) {
                sites.push(site);
            }
        }
        sites
    }

    fn node(&mut self, kind: RWNodeKind, ctx: &Ctx<'_>, inst: &Instruction) -> RWNodeId {
        self.graph.create_node(kind, ctx.subgraph, inst.value())
    }

    fn with_node<F>(&mut self, id: RWNodeId, f: F)
    where
        F: FnOnce(&mut RWNode),
    {
        if let Some(node) = self.graph.node_mut(id) {
            f(node);
        }
    }

    /// Single precise stack or global object
    fn is_strong_update(&self, sites: &[DefSite]) -> bool {
        let [site] = sites else {
            return false;
        };
        if site.len.is_unknown() {
            return false;
        }
        match site.target {
            MemoryTarget::Object(Value::Global(_)) => true,
            MemoryTarget::Object(Value::Inst(id)) => matches!(
                self.module.instruction(id).map(|i| &i.kind),
                Some(InstructionKind::Alloca { .. })
            ),
            _ => false,
        }
    }

    fn create_store(&mut self, ctx: &Ctx<'_>, inst: &Instruction, pointer: &Value, size: Option<u64>) -> RWNodeId {
        let sites = self.map_pointers(inst, pointer, size);
        let strong = self.config.strong_updates && self.is_strong_update(&sites);
        let id = self.node(RWNodeKind::Store, ctx, inst);
        self.with_node(id, |n| {
            if strong {
                n.overwrites = sites;
            } else {
                n.defs = sites;
            }
        });
        id
    }

    fn create_load(&mut self, ctx: &Ctx<'_>, inst: &Instruction, pointer: &Value, size: Option<u64>) -> RWNodeId {
        let sites = self.map_pointers(inst, pointer, size);
        let id = self.node(RWNodeKind::Load, ctx, inst);
        self.with_node(id, |n| n.uses = sites);
        id
    }

    fn create_alloc(&mut self, ctx: &Ctx<'_>, inst: &Instruction, size: Option<u64>) -> RWNodeId {
        let id = self.node(RWNodeKind::Alloc, ctx, inst);
        self.with_node(id, |n| n.size = size);
        id
    }

    fn create_dyn_alloc(
        &mut self,
        ctx: &Ctx<'_>,
        inst: &Instruction,
        kind: AllocationFunction,
        args: &[Value],
    ) -> RWNodeId {
        let constant = |i: usize| {
            args.get(i)
                .and_then(Value::as_constant)
                .and_then(|c| u64::try_from(c).ok())
        };
        let size = match kind {
            AllocationFunction::Malloc | AllocationFunction::Alloca => constant(0),
            AllocationFunction::Calloc => constant(0).zip(constant(1)).and_then(|(n, s)| n.checked_mul(s)),
            AllocationFunction::Realloc => constant(1),
        };

        if kind == AllocationFunction::Realloc {
            return self.create_realloc(ctx, inst, args, size);
        }

        let id = self.node(RWNodeKind::DynAlloc(kind), ctx, inst);
        self.with_node(id, |n| n.size = size);
        id
    }

    /// Reads the old memory, defines the new object
    fn create_realloc(&mut self, ctx: &Ctx<'_>, inst: &Instruction, args: &[Value], size: Option<u64>) -> RWNodeId {
        let uses = match args.first() {
            Some(old) => self.map_pointers(inst, old, None),
            None => Vec::new(),
        };
        let def = DefSite::new(MemoryTarget::Object(inst.value()), Offset::ZERO, Offset::from(size));
        let id = self.node(RWNodeKind::DynAlloc(AllocationFunction::Realloc), ctx, inst);
        self.with_node(id, |n| {
            n.size = size;
            n.uses = uses;
            n.defs = vec![def];
        });
        id
    }

    fn create_return(&mut self, ctx: &Ctx<'_>, inst: &Instruction) -> RWNodeId {
        let id = self.node(RWNodeKind::Return, ctx, inst);
        if let Some(subgraph) = self.graph.subgraph_mut(ctx.subgraph) {
            subgraph.returns.push(id);
        }
        id
    }

    fn create_call(
        &mut self,
        ctx: &Ctx<'_>,
        inst: &Instruction,
        callee: &Callee,
        args: &[Value],
    ) -> Result<NodeExpansion<RWNodeId>> {
        let module = self.module;
        let targets: Vec<&Function> = match callee {
            Callee::Direct(fid) => {
                let function = module.function(*fid).ok_or_else(|| {
                    DepGraphError::invalid_program(format!("call to unknown function {:?}", fid))
                })?;
                if function.is_declaration() {
                    if let Some(kind) = self.config.allocation_kind(&function.name) {
                        return Ok(NodeExpansion::single(self.create_dyn_alloc(ctx, inst, kind, args)));
                    }
                }
                vec![function]
            }
            Callee::Indirect(pointer) => {
                let Some(pts) = self.oracle.resolve(pointer) else {
                    warn!("No points-to information for called value {} at {}", pointer, inst.value());
                    return Ok(self.create_undefined_call(ctx, inst, args));
                };
                pts.functions().filter_map(|f| module.function(f)).collect()
            }
        };

        let defined: Vec<FunctionId> = targets
            .iter()
            .filter(|f| !f.is_declaration())
            .map(|f| f.id)
            .collect();
        if defined.is_empty() {
            return Ok(self.create_undefined_call(ctx, inst, args));
        }

        let id = self.node(RWNodeKind::Call, ctx, inst);
        for f in defined {
            self.pending_calls.push((id, f));
        }
        Ok(NodeExpansion::single(id))
    }

    /// Call node plus one effect node per argument known to be a pointer
    fn create_undefined_call(&mut self, ctx: &Ctx<'_>, inst: &Instruction, args: &[Value]) -> NodeExpansion<RWNodeId> {
        let call = self.node(RWNodeKind::Call, ctx, inst);

        let mut effects = Vec::new();
        for arg in args {
            if arg.is_constant_like() {
                continue;
            }
            let Some(pts) = self.oracle.resolve(arg) else {
                continue;
            };
            if pts.is_empty() {
                continue;
            }
            let sites = self.map_pointers(inst, arg, None);
            if sites.is_empty() {
                continue;
            }
            let effect = self.node(RWNodeKind::CallEffect, ctx, inst);
            self.with_node(effect, |n| {
                n.uses = sites.clone();
                n.defs = sites;
            });
            effects.push(effect);
        }

        trace!("Undefined call {} with {} memory effects", inst.value(), effects.len());
        NodeExpansion::with_effects(call, effects)
    }
}

impl<'a, P: PointsToOracle + ?Sized> GraphFlavor for ReadWriteGraphBuilder<'a, P> {
    type Node = RWNodeId;
    type Block = RWBBlockRef;
    type Subgraph = RWSubgraphId;

    fn create_subgraph(&mut self, function: &Function) -> Result<RWSubgraphId> {
        if !self.oracle.is_computed(function.id) {
            return Err(DepGraphError::PointsToNotReady {
                function: function.id,
                name: function.name.clone(),
            });
        }
        if self.graph.subgraph_of(function.id).is_some() {
            return Err(DepGraphError::DuplicateSubgraph {
                function: function.id,
                name: function.name.clone(),
            });
        }
        Ok(self.graph.create_subgraph(function.id, &function.name))
    }

    fn create_bblock(&mut self, block: &BasicBlock, subgraph: RWSubgraphId) -> Result<RWBBlockRef> {
        let sg = self
            .graph
            .subgraph_mut(subgraph)
            .ok_or_else(|| DepGraphError::invalid_program(format!("unknown subgraph {:?}", subgraph)))?;
        sg.blocks.push(RWBBlock {
            origin: Some(block.id),
            ..RWBBlock::default()
        });
        let handle = RWBBlockRef {
            subgraph,
            index: sg.blocks.len() - 1,
        };
        self.block_index.insert(block.id, handle);
        Ok(handle)
    }

    fn create_node(&mut self, ctx: &Ctx<'_>, inst: &Instruction) -> Result<Option<NodeExpansion<RWNodeId>>> {
        let expansion = match &inst.kind {
            InstructionKind::Alloca { size } => NodeExpansion::single(self.create_alloc(ctx, inst, *size)),
            InstructionKind::Store { pointer, size, .. } => {
                NodeExpansion::single(self.create_store(ctx, inst, pointer, *size))
            }
            InstructionKind::Load { pointer, size } => {
                NodeExpansion::single(self.create_load(ctx, inst, pointer, *size))
            }
            InstructionKind::Ret { .. } => NodeExpansion::single(self.create_return(ctx, inst)),
            InstructionKind::Call { callee, args } => self.create_call(ctx, inst, callee, args)?,
            _ => return Ok(None),
        };
        Ok(Some(expansion))
    }

    fn append(&mut self, block: RWBBlockRef, node: RWNodeId) {
        if let Some(b) = self
            .graph
            .subgraph_mut(block.subgraph)
            .and_then(|sg| sg.blocks.get_mut(block.index))
        {
            b.nodes.push(node);
        }
    }

    fn finish_subgraph(
        &mut self,
        function: &Function,
        subgraph: RWSubgraphId,
        blocks: &[(BlockId, RWBBlockRef)],
    ) -> Result<()> {
        let mut successors = Vec::with_capacity(blocks.len());
        for block in &function.blocks {
            let succs = block
                .successors()
                .into_iter()
                .map(|s| {
                    self.block_index.get(&s).map(|r| r.index).ok_or_else(|| {
                        DepGraphError::invalid_program(format!("unknown successor block {:?}", s))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            successors.push(succs);
        }

        let sg = self
            .graph
            .subgraph_mut(subgraph)
            .ok_or_else(|| DepGraphError::invalid_program(format!("unknown subgraph {:?}", subgraph)))?;
        for (block, succs) in sg.blocks.iter_mut().zip(successors) {
            block.successors = succs;
        }
        sg.entry = blocks.first().map(|(_, b)| b.index);
        Ok(())
    }

    fn build_call_edges(&mut self, _module: &Module, _nodes: &NodeMap<RWNodeId>) -> Result<()> {
        for (call, callee) in std::mem::take(&mut self.pending_calls) {
            let sg = self.graph.subgraph_of(callee).map(|s| s.id).ok_or_else(|| {
                DepGraphError::invalid_program(format!("callee {:?} was not built", callee))
            })?;

            self.with_node(call, |n| {
                if !n.callees.contains(&sg) {
                    n.callees.push(sg);
                }
            });
            if let Some(subgraph) = self.graph.subgraph_mut(sg) {
                if !subgraph.callers.contains(&call) {
                    subgraph.callers.push(call);
                }
            }
            trace!("Linked call {:?} to '{}'", call, self.graph.subgraph(sg).map_or("", |s| s.name.as_str()));
        }
        Ok(())
    }
}
