//! Control Dependence Application Layer
//!
//! `ControlDependenceAnalysis` is the analysis context: it owns the CDGraph
//! builder and the per-function cache. The first query touching a function
//! computes the whole function; results are never invalidated.
//!
//! ```
//! use depgraph_ir::config::CdaConfig;
//! use depgraph_ir::features::control_dependence::{ControlDependence, ControlDependenceAnalysis};
//! use depgraph_ir::shared::models::{InstructionKind, ModuleBuilder, Value};
//!
//! let mut mb = ModuleBuilder::new("demo");
//! let f = mb.add_function("f", 1, false);
//! let (b0, b1, b2) = (mb.add_block(f), mb.add_block(f), mb.add_block(f));
//! let cond = mb.argument(f, 0);
//! mb.push(b0, InstructionKind::CondBr { condition: cond, if_true: b1, if_false: b2 });
//! mb.push(b1, InstructionKind::Br { target: b2 });
//! mb.push(b2, InstructionKind::Ret { value: None });
//! let module = mb.build();
//!
//! let mut cda = ControlDependenceAnalysis::new(&module, CdaConfig::default());
//! assert_eq!(cda.block_dependencies(b1).unwrap(), vec![Value::Block(b0)]);
//! assert!(cda.block_dependencies(b2).unwrap().is_empty());
//! ```

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::debug;

use petgraph::graph::NodeIndex;

use crate::config::CdaConfig;
use crate::errors::{DepGraphError, Result};
use crate::features::control_dependence::domain::{CDGraph, CDNodeRef, ControlDependenceRelation};
use crate::features::control_dependence::infrastructure::{CDGraphBuilder, DecisiveOrderDependence};
use crate::features::control_dependence::ports::ControlDependence;
use crate::features::graph_builder::GraphBuilder;
use crate::shared::models::{BlockId, FunctionId, InstId, Module, Value};

/// Cached result for one function: its graph and both relation maps
#[derive(Debug, Clone)]
pub struct ControlDependenceInfo {
    graph: CDGraph,
    relation: ControlDependenceRelation,
}

impl ControlDependenceInfo {
    pub fn graph(&self) -> &CDGraph {
        &self.graph
    }

    pub fn relation(&self) -> &ControlDependenceRelation {
        &self.relation
    }

    /// Values whose execution `decision` decides
    pub fn dependents_of(&self, decision: &Value) -> Vec<Value> {
        self.lookup(decision, ControlDependenceRelation::dependents)
    }

    /// Decision values `dependent` depends on
    pub fn dependencies_of(&self, dependent: &Value) -> Vec<Value> {
        self.lookup(dependent, ControlDependenceRelation::dependencies)
    }

    fn lookup(
        &self,
        value: &Value,
        side: fn(&ControlDependenceRelation, NodeIndex) -> Option<&BTreeSet<NodeIndex>>,
    ) -> Vec<Value> {
        let Some(node) = self.graph.nodes().find(|n| self.graph.origin(*n) == Some(*value)) else {
            return Vec::new();
        };
        self.values(side(&self.relation, node))
    }

    fn values(&self, nodes: Option<&BTreeSet<NodeIndex>>) -> Vec<Value> {
        let Some(nodes) = nodes else {
            return Vec::new();
        };
        nodes
            .iter()
            .filter_map(|n| self.graph.origin(*n))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Lazy, cached control-dependence analysis of one module
pub struct ControlDependenceAnalysis<'m> {
    module: &'m Module,
    config: CdaConfig,
    builder: GraphBuilder<CDGraphBuilder>,
    infos: FxHashMap<FunctionId, ControlDependenceInfo>,
}

impl<'m> ControlDependenceAnalysis<'m> {
    pub fn new(module: &'m Module, config: CdaConfig) -> Self {
        Self {
            module,
            builder: GraphBuilder::new(CDGraphBuilder::new(config.node_per_instruction())),
            config,
            infos: FxHashMap::default(),
        }
    }

    pub fn config(&self) -> &CdaConfig {
        &self.config
    }

    pub fn module(&self) -> &'m Module {
        self.module
    }

    pub fn is_computed(&self, function: FunctionId) -> bool {
        self.infos.contains_key(&function)
    }

    /// Graph and relation maps of a computed function
    pub fn function_info(&self, function: FunctionId) -> Option<&ControlDependenceInfo> {
        self.infos.get(&function)
    }

    /// Compute on first use. `Ok(None)` for declarations and unknown ids.
    fn ensure_computed(&mut self, function: FunctionId) -> Result<Option<&ControlDependenceInfo>> {
        if !self.infos.contains_key(&function) {
            match self.module.function(function) {
                Some(f) if !f.is_declaration() => self.compute_on_demand(function)?,
                _ => return Ok(None),
            }
        }
        Ok(self.infos.get(&function))
    }

    fn dependencies_at(&self, node: CDNodeRef) -> Vec<Value> {
        self.infos
            .get(&node.function)
            .map(|info| info.values(info.relation.dependencies(node.node)))
            .unwrap_or_default()
    }

    fn compute_on_demand(&mut self, function: FunctionId) -> Result<()> {
        let module = self.module;
        let fun = module
            .function(function)
            .ok_or_else(|| DepGraphError::invalid_program(format!("unknown function {:?}", function)))?;

        if self.infos.contains_key(&function) {
            return Err(DepGraphError::AlreadyComputed {
                function,
                name: fun.name.clone(),
            });
        }

        debug!("Triggering on-demand control dependence computation for '{}'", fun.name);
        self.builder.build_subgraph(module, fun)?;
        let graph = self
            .builder
            .flavor_mut()
            .take_graph(function)
            .ok_or_else(|| DepGraphError::invalid_program(format!("no CDGraph built for '{}'", fun.name)))?;

        let relation = DecisiveOrderDependence::new()
            .with_order_dependence(self.config.order_dependence)
            .compute(&graph);
        debug!(
            "Control dependence for '{}' done: {} pairs",
            fun.name,
            relation.len()
        );

        self.infos.insert(function, ControlDependenceInfo { graph, relation });
        Ok(())
    }
}

impl<'m> ControlDependence for ControlDependenceAnalysis<'m> {
    fn instruction_dependencies(&mut self, inst: InstId) -> Result<Vec<Value>> {
        if !self.config.node_per_instruction() {
            return Ok(Vec::new());
        }
        if self.ensure_computed(inst.function())?.is_none() {
            return Ok(Vec::new());
        }
        let Some(node) = self.builder.get_node(&Value::Inst(inst)) else {
            return Ok(Vec::new());
        };
        Ok(self.dependencies_at(node))
    }

    fn instruction_dependents(&mut self, _inst: InstId) -> Result<Vec<Value>> {
        Ok(Vec::new())
    }

    fn block_dependencies(&mut self, block: BlockId) -> Result<Vec<Value>> {
        if self.config.node_per_instruction() {
            return Ok(Vec::new());
        }
        if self.ensure_computed(block.function)?.is_none() {
            return Ok(Vec::new());
        }
        let Some(node) = self.builder.flavor().node_for_block(block) else {
            return Ok(Vec::new());
        };
        Ok(self.dependencies_at(node))
    }

    fn block_dependents(&mut self, _block: BlockId) -> Result<Vec<Value>> {
        Err(DepGraphError::unsupported(
            "reverse block control dependence; use function_info() instead",
        ))
    }

    fn compute(&mut self, function: Option<FunctionId>) -> Result<()> {
        match function {
            Some(f) => {
                self.ensure_computed(f)?;
            }
            None => {
                let pending: Vec<FunctionId> = self
                    .module
                    .definitions()
                    .map(|f| f.id)
                    .filter(|id| !self.infos.contains_key(id))
                    .collect();
                for f in pending {
                    self.compute_on_demand(f)?;
                }
            }
        }
        Ok(())
    }

    fn graph(&self, function: FunctionId) -> Option<&CDGraph> {
        self.infos.get(&function).map(ControlDependenceInfo::graph)
    }
}
