// SDG Builder - GraphFlavor for the system dependence graph
//
// Per defined function: formal parameters (variadic marker first), one node
// per instruction, call instructions become call nodes with one actual
// parameter per argument. Callee graphs come from the memoized
// get-or-create, so callees referenced before being built (forward calls,
// recursion) resolve to the same graph. After every function is built, the
// interprocedural pass records callers and the entry function is designated.

use rustc_hash::FxHashMap;
use tracing::{debug, info, trace};

use crate::config::SdgConfig;
use crate::errors::{DepGraphError, Result};
use crate::features::graph_builder::domain::{NodeExpansion, NodeMap};
use crate::features::graph_builder::ports::{BuildContext, GraphFlavor};
use crate::features::graph_builder::GraphBuilder;
use crate::features::read_write_graph::ports::PointsToOracle;
use crate::features::system_dependence::domain::{
    DGBBlockRef, DGCall, DGId, DGNodeId, DGNodeKind, DGNodeRef, DependenceGraph, SystemDependenceGraph,
};
use crate::shared::models::{
    BasicBlock, BlockId, Callee, Function, Instruction, InstructionKind, Module, Value,
};

/// Builds a [`SystemDependenceGraph`] for a whole module
pub struct SdgBuilder<'a> {
    module: &'a Module,
    config: SdgConfig,
    oracle: Option<&'a dyn PointsToOracle>,
    sdg: SystemDependenceGraph,
    block_index: FxHashMap<BlockId, usize>,
}

impl<'a> SdgBuilder<'a> {
    pub fn new(module: &'a Module, config: SdgConfig) -> Self {
        Self {
            module,
            config,
            oracle: None,
            sdg: SystemDependenceGraph::new(),
            block_index: FxHashMap::default(),
        }
    }

    /// Points-to oracle used to resolve indirect calls
    pub fn with_points_to(mut self, oracle: &'a dyn PointsToOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Build every defined function, link callers, designate the entry
    pub fn build(self) -> Result<SystemDependenceGraph> {
        self.config.validate()?;
        info!("Building SDG for '{}'", self.module.name);
        let module = self.module;
        let entry = self.config.entry_function.clone();

        let mut driver = GraphBuilder::new(self);
        driver.build_module(module)?;

        let (flavor, nodes) = driver.into_parts();
        let mut sdg = flavor.sdg;
        sdg.set_node_map(nodes.iter().map(|(v, n)| (*v, *n)).collect());
        sdg.set_entry_function(module, &entry)?;

        info!("Building SDG finished: {} dependence graphs", sdg.graphs().len());
        Ok(sdg)
    }

    fn get_or_create_dg(&mut self, function: &Function) -> DGId {
        self.sdg.get_or_create_dg(function.id, &function.name)
    }

    fn dg_mut(&mut self, id: DGId) -> Result<&mut DependenceGraph> {
        self.sdg
            .graph_mut(id)
            .ok_or_else(|| DepGraphError::invalid_program(format!("unknown dependence graph {:?}", id)))
    }

    /// Defined functions the call may reach; empty means "plain instruction"
    fn resolve_callees(&mut self, inst: &Instruction, callee: &Callee) -> Result<Vec<DGId>> {
        let module = self.module;
        let targets: Vec<&Function> = match callee {
            Callee::Direct(fid) => {
                let function = module.function(*fid).ok_or_else(|| {
                    DepGraphError::invalid_program(format!("call to unknown function {:?}", fid))
                })?;
                vec![function]
            }
            Callee::Indirect(pointer) => {
                let oracle = match self.oracle {
                    Some(oracle) if self.config.resolve_indirect_calls => oracle,
                    _ => {
                        return Err(DepGraphError::unsupported(format!(
                            "indirect call {} (function pointers)",
                            inst.value()
                        )))
                    }
                };
                oracle
                    .resolve(pointer)
                    .map(|pts| pts.functions().filter_map(|f| module.function(f)).collect())
                    .unwrap_or_default()
            }
        };

        Ok(targets
            .into_iter()
            .filter(|f| !f.is_declaration())
            .map(|f| self.get_or_create_dg(f))
            .collect())
    }

    fn build_call_node(
        &mut self,
        graph: DGId,
        inst: &Instruction,
        callees: Vec<DGId>,
        args: &[Value],
    ) -> Result<DGNodeId> {
        let dg = self.dg_mut(graph)?;
        let call = dg.create_node(
            DGNodeKind::Call(DGCall {
                callees,
                parameters: Vec::new(),
            }),
            Some(inst.value()),
        );

        let actuals: Vec<DGNodeId> = args
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                dg.create_node(
                    DGNodeKind::ActualParameter {
                        call,
                        index: i as u32,
                    },
                    Some(*arg),
                )
            })
            .collect();

        if let Some(DGNodeKind::Call(c)) = dg.node_mut(call).map(|n| &mut n.kind) {
            c.parameters = actuals;
        }
        Ok(call)
    }
}

impl<'a> GraphFlavor for SdgBuilder<'a> {
    type Node = DGNodeRef;
    type Block = DGBBlockRef;
    type Subgraph = DGId;

    fn create_subgraph(&mut self, function: &Function) -> Result<DGId> {
        let id = self.get_or_create_dg(function);
        if self.dg_mut(id)?.is_built() {
            return Err(DepGraphError::DuplicateSubgraph {
                function: function.id,
                name: function.name.clone(),
            });
        }
        debug!("Building '{}'", function.name);
        Ok(id)
    }

    fn create_parameters(&mut self, function: &Function, subgraph: DGId) -> Result<Vec<(Value, DGNodeRef)>> {
        trace!("Building parameters for '{}'", function.name);
        let dg = self.dg_mut(subgraph)?;

        if function.is_var_arg {
            let var_arg = dg.create_node(DGNodeKind::VarArg, None);
            dg.parameters_mut().var_arg = Some(var_arg);
        }

        let mut mapping = Vec::with_capacity(function.params.len());
        for index in 0..function.params.len() as u32 {
            let value = function.argument(index);
            let node = dg.create_node(DGNodeKind::FormalParameter { index }, Some(value));
            dg.parameters_mut().params.push(node);
            mapping.push((
                value,
                DGNodeRef {
                    graph: subgraph,
                    node,
                },
            ));
        }
        Ok(mapping)
    }

    fn create_bblock(&mut self, block: &BasicBlock, subgraph: DGId) -> Result<DGBBlockRef> {
        let index = self.dg_mut(subgraph)?.create_bblock(block.id);
        self.block_index.insert(block.id, index);
        Ok(DGBBlockRef {
            graph: subgraph,
            index,
        })
    }

    fn create_node(
        &mut self,
        ctx: &BuildContext<'_, DGId, DGNodeRef>,
        inst: &Instruction,
    ) -> Result<Option<NodeExpansion<DGNodeRef>>> {
        let node = match &inst.kind {
            InstructionKind::Call { callee, args } => {
                let callees = self.resolve_callees(inst, callee)?;
                if callees.is_empty() {
                    trace!("Call {} has no defined callee", inst.value());
                    self.dg_mut(ctx.subgraph)?
                        .create_node(DGNodeKind::Instruction, Some(inst.value()))
                } else {
                    self.build_call_node(ctx.subgraph, inst, callees, args)?
                }
            }
            _ => self
                .dg_mut(ctx.subgraph)?
                .create_node(DGNodeKind::Instruction, Some(inst.value())),
        };

        Ok(Some(NodeExpansion::single(DGNodeRef {
            graph: ctx.subgraph,
            node,
        })))
    }

    fn append(&mut self, block: DGBBlockRef, node: DGNodeRef) {
        if let Some(b) = self
            .sdg
            .graph_mut(block.graph)
            .and_then(|g| g.blocks_mut().get_mut(block.index))
        {
            b.nodes.push(node.node);
        }
    }

    fn finish_subgraph(&mut self, function: &Function, subgraph: DGId, _blocks: &[(BlockId, DGBBlockRef)]) -> Result<()> {
        let successors = function
            .blocks
            .iter()
            .map(|b| {
                b.successors()
                    .into_iter()
                    .map(|s| {
                        self.block_index.get(&s).copied().ok_or_else(|| {
                            DepGraphError::invalid_program(format!("unknown successor block {:?}", s))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let dg = self.dg_mut(subgraph)?;
        for (block, succs) in dg.blocks_mut().iter_mut().zip(successors) {
            block.successors = succs;
        }
        dg.set_built();
        debug!("Building '{}' finished", function.name);
        Ok(())
    }

    fn build_call_edges(&mut self, _module: &Module, _nodes: &NodeMap<DGNodeRef>) -> Result<()> {
        let edges: Vec<(DGId, DGNodeRef)> = self
            .sdg
            .graphs()
            .iter()
            .flat_map(|g| {
                g.call_nodes().flat_map(move |(node, call)| {
                    call.callees.iter().map(move |callee| {
                        (
                            *callee,
                            DGNodeRef {
                                graph: g.id(),
                                node: node.id,
                            },
                        )
                    })
                })
            })
            .collect();

        debug!("Linking {} call edges", edges.len());
        for (callee, caller) in edges {
            self.dg_mut(callee)?.add_caller(caller);
        }
        Ok(())
    }
}
