// Graph Builder - Generic Driver
//
// Walks the program model in program order and lets a GraphFlavor create
// the nodes, blocks and subgraphs:
//
//   for each function:            create_subgraph, create_parameters
//     for each basic block:       create_bblock
//       for each instruction:     create_node → append → map representative
//     finish_subgraph
//   build_call_edges              (once, after every function)

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::errors::{DepGraphError, Result};
use crate::features::graph_builder::domain::NodeMap;
use crate::features::graph_builder::ports::{BuildContext, GraphFlavor};
use crate::shared::models::{BasicBlock, Function, FunctionId, Module, Value};

/// Fixed construction driver shared by all graph flavors
pub struct GraphBuilder<F: GraphFlavor> {
    flavor: F,
    nodes: NodeMap<F::Node>,
    built: FxHashSet<FunctionId>,
}

impl<F: GraphFlavor> GraphBuilder<F> {
    pub fn new(flavor: F) -> Self {
        Self {
            flavor,
            nodes: NodeMap::new(),
            built: FxHashSet::default(),
        }
    }

    pub fn flavor(&self) -> &F {
        &self.flavor
    }

    pub fn flavor_mut(&mut self) -> &mut F {
        &mut self.flavor
    }

    pub fn nodes(&self) -> &NodeMap<F::Node> {
        &self.nodes
    }

    /// Representative node of `value`, `None` if never built
    #[inline]
    pub fn get_node(&self, value: &Value) -> Option<F::Node> {
        self.nodes.get(value)
    }

    pub fn is_built(&self, function: FunctionId) -> bool {
        self.built.contains(&function)
    }

    /// Build every defined function, then add call edges
    pub fn build_module(&mut self, module: &Module) -> Result<()> {
        debug!("Building graph for module '{}'", module.name);

        for function in &module.functions {
            if function.is_declaration() {
                trace!("Skipping declaration '{}'", function.name);
                continue;
            }
            self.build_subgraph(module, function)?;
        }

        debug!("Building call edges");
        self.flavor.build_call_edges(module, &self.nodes)?;
        debug!("Building call edges done");
        Ok(())
    }

    /// Build the intraprocedural graph of a single function.
    ///
    /// On failure nothing of the function is kept: its mappings are removed,
    /// the flavor discards the partial subgraph and it is not marked built.
    pub fn build_subgraph(&mut self, module: &Module, function: &Function) -> Result<F::Subgraph> {
        if self.built.contains(&function.id) {
            return Err(DepGraphError::DuplicateSubgraph {
                function: function.id,
                name: function.name.clone(),
            });
        }

        let mut mapped = Vec::new();
        match self.populate_subgraph(module, function, &mut mapped) {
            Ok(subgraph) => {
                self.built.insert(function.id);
                Ok(subgraph)
            }
            Err(err) => {
                debug!("Building the subgraph for '{}' failed: {}", function.name, err);
                for value in &mapped {
                    self.nodes.remove(value);
                }
                self.flavor.discard_subgraph(function);
                Err(err)
            }
        }
    }

    fn populate_subgraph(
        &mut self,
        module: &Module,
        function: &Function,
        mapped: &mut Vec<Value>,
    ) -> Result<F::Subgraph> {
        debug!("Building the subgraph for '{}'", function.name);
        let subgraph = self.flavor.create_subgraph(function)?;

        for (value, node) in self.flavor.create_parameters(function, subgraph)? {
            self.nodes.insert(value, node)?;
            mapped.push(value);
        }

        let mut blocks = Vec::with_capacity(function.blocks.len());
        for block in &function.blocks {
            let bblock = self.build_bblock(module, function, subgraph, block, mapped)?;
            blocks.push((block.id, bblock));
        }

        trace!("Building CFG of '{}'", function.name);
        self.flavor.finish_subgraph(function, subgraph, &blocks)?;

        debug!("Building the subgraph for '{}' done", function.name);
        Ok(subgraph)
    }

    fn build_bblock(
        &mut self,
        module: &Module,
        function: &Function,
        subgraph: F::Subgraph,
        block: &BasicBlock,
        mapped: &mut Vec<Value>,
    ) -> Result<F::Block> {
        let bblock = self.flavor.create_bblock(block, subgraph)?;

        for inst in &block.instructions {
            let value = inst.value();
            if self.nodes.contains(&value) {
                return Err(DepGraphError::DuplicateNode { value });
            }

            let ctx = BuildContext {
                module,
                function,
                subgraph,
                nodes: &self.nodes,
            };
            let Some(expansion) = self.flavor.create_node(&ctx, inst)? else {
                trace!("No node for {}", value);
                continue;
            };

            for node in expansion.nodes() {
                self.flavor.append(bblock, *node);
            }
            self.nodes.insert(value, expansion.representative())?;
            mapped.push(value);
        }

        Ok(bblock)
    }

    /// Hand the flavor and the value mapping over to the caller
    pub fn into_parts(self) -> (F, NodeMap<F::Node>) {
        (self.flavor, self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::graph_builder::domain::NodeExpansion;
    use crate::shared::models::{BlockId, Callee, Instruction, InstructionKind, ModuleBuilder};

    /// Records the construction order; call instructions expand to two nodes
    #[derive(Default)]
    struct RecordingFlavor {
        next_node: u32,
        blocks: Vec<Vec<u32>>,
        subgraphs: Vec<FunctionId>,
        finished: Vec<(FunctionId, usize)>,
        call_edges_built: usize,
        params: bool,
    }

    impl GraphFlavor for RecordingFlavor {
        type Node = u32;
        type Block = usize;
        type Subgraph = usize;

        fn create_subgraph(&mut self, function: &Function) -> Result<usize> {
            self.subgraphs.push(function.id);
            Ok(self.subgraphs.len() - 1)
        }

        fn create_bblock(&mut self, _block: &BasicBlock, _subgraph: usize) -> Result<usize> {
            self.blocks.push(Vec::new());
            Ok(self.blocks.len() - 1)
        }

        fn create_node(
            &mut self,
            _ctx: &BuildContext<'_, usize, u32>,
            inst: &Instruction,
        ) -> Result<Option<NodeExpansion<u32>>> {
            let mut fresh = || {
                self.next_node += 1;
                self.next_node
            };
            Ok(match inst.kind {
                InstructionKind::Op { .. } => None,
                InstructionKind::Call { .. } => {
                    let rep = fresh();
                    let effect = fresh();
                    Some(NodeExpansion::with_effects(rep, [effect]))
                }
                _ => Some(NodeExpansion::single(fresh())),
            })
        }

        fn append(&mut self, block: usize, node: u32) {
            self.blocks[block].push(node);
        }

        fn create_parameters(&mut self, function: &Function, _subgraph: usize) -> Result<Vec<(Value, u32)>> {
            if !self.params {
                return Ok(Vec::new());
            }
            Ok((0..function.params.len() as u32)
                .map(|i| (function.argument(i), 1000 + i))
                .collect())
        }

        fn finish_subgraph(&mut self, function: &Function, _subgraph: usize, blocks: &[(BlockId, usize)]) -> Result<()> {
            self.finished.push((function.id, blocks.len()));
            Ok(())
        }

        fn build_call_edges(&mut self, _module: &Module, _nodes: &NodeMap<u32>) -> Result<()> {
            self.call_edges_built += 1;
            Ok(())
        }
    }

    fn sample_module() -> Module {
        let mut mb = ModuleBuilder::new("m");
        let main = mb.add_function("main", 1, false);
        mb.add_function("ext", 0, false);
        let helper = mb.add_function("helper", 0, false);
        let b0 = mb.add_block(main);
        let b1 = mb.add_block(main);
        mb.push(b0, InstructionKind::Alloca { size: Some(4) });
        mb.push(
            b0,
            InstructionKind::Call {
                callee: Callee::Direct(helper),
                args: vec![],
            },
        );
        mb.push(b0, InstructionKind::Br { target: b1 });
        mb.push(b1, InstructionKind::Op { operands: vec![] });
        mb.push(b1, InstructionKind::Ret { value: None });
        let h0 = mb.add_block(helper);
        mb.push(h0, InstructionKind::Ret { value: None });
        mb.build()
    }

    #[test]
    fn test_program_order_and_expansion() {
        let module = sample_module();
        let mut builder = GraphBuilder::new(RecordingFlavor::default());
        builder.build_module(&module).unwrap();

        let flavor = builder.flavor();
        // declarations are skipped
        assert_eq!(flavor.subgraphs, vec![FunctionId(0), FunctionId(2)]);
        // alloca, call (+ effect), br | ret | ret
        assert_eq!(flavor.blocks, vec![vec![1, 2, 3, 4], vec![5], vec![6]]);
        assert_eq!(flavor.finished, vec![(FunctionId(0), 2), (FunctionId(2), 1)]);
        assert_eq!(flavor.call_edges_built, 1);
    }

    #[test]
    fn test_representative_is_mapped() {
        let module = sample_module();
        let mut builder = GraphBuilder::new(RecordingFlavor::default());
        builder.build_module(&module).unwrap();

        let main = &module.functions[0];
        let call = main.blocks[0].instructions[1].value();
        let op = main.blocks[1].instructions[0].value();
        assert_eq!(builder.get_node(&call), Some(2));
        // no node created → no mapping, not an error
        assert_eq!(builder.get_node(&op), None);
        assert_eq!(builder.get_node(&Value::Constant(3)), None);
    }

    #[test]
    fn test_parameters_are_mapped() {
        let module = sample_module();
        let mut builder = GraphBuilder::new(RecordingFlavor {
            params: true,
            ..RecordingFlavor::default()
        });
        builder.build_module(&module).unwrap();
        let arg = module.functions[0].argument(0);
        assert_eq!(builder.get_node(&arg), Some(1000));
    }

    #[test]
    fn test_rebuilding_a_function_fails() {
        let module = sample_module();
        let mut builder = GraphBuilder::new(RecordingFlavor::default());
        let main = &module.functions[0];
        builder.build_subgraph(&module, main).unwrap();
        assert!(builder.is_built(main.id));

        let err = builder.build_subgraph(&module, main).unwrap_err();
        assert!(matches!(err, DepGraphError::DuplicateSubgraph { .. }));
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_failed_build_leaves_nothing_behind() {
        struct FailingFinish {
            inner: RecordingFlavor,
            fail: bool,
            discarded: Vec<FunctionId>,
        }
        impl GraphFlavor for FailingFinish {
            type Node = u32;
            type Block = usize;
            type Subgraph = usize;
            fn create_subgraph(&mut self, f: &Function) -> Result<usize> {
                self.inner.create_subgraph(f)
            }
            fn create_bblock(&mut self, b: &BasicBlock, s: usize) -> Result<usize> {
                self.inner.create_bblock(b, s)
            }
            fn create_node(
                &mut self,
                ctx: &BuildContext<'_, usize, u32>,
                inst: &Instruction,
            ) -> Result<Option<NodeExpansion<u32>>> {
                self.inner.create_node(ctx, inst)
            }
            fn append(&mut self, b: usize, n: u32) {
                self.inner.append(b, n)
            }
            fn create_parameters(&mut self, f: &Function, s: usize) -> Result<Vec<(Value, u32)>> {
                self.inner.create_parameters(f, s)
            }
            fn finish_subgraph(&mut self, _f: &Function, _s: usize, _b: &[(BlockId, usize)]) -> Result<()> {
                if self.fail {
                    return Err(DepGraphError::invalid_program("broken edge"));
                }
                Ok(())
            }
            fn discard_subgraph(&mut self, f: &Function) {
                self.discarded.push(f.id);
            }
        }

        let module = sample_module();
        let main = &module.functions[0];
        let mut builder = GraphBuilder::new(FailingFinish {
            inner: RecordingFlavor {
                params: true,
                ..RecordingFlavor::default()
            },
            fail: true,
            discarded: Vec::new(),
        });

        let err = builder.build_subgraph(&module, main).unwrap_err();
        assert!(matches!(err, DepGraphError::InvalidProgram(_)));
        assert!(!builder.is_built(main.id));
        assert!(builder.nodes().is_empty());
        assert_eq!(builder.flavor().discarded, vec![main.id]);

        // same failure again, not a duplicate build
        let err = builder.build_subgraph(&module, main).unwrap_err();
        assert!(matches!(err, DepGraphError::InvalidProgram(_)));

        builder.flavor_mut().fail = false;
        builder.build_subgraph(&module, main).unwrap();
        assert!(builder.is_built(main.id));
        assert_eq!(builder.get_node(&main.argument(0)), Some(1000));
    }

    #[test]
    fn test_duplicate_value_fails() {
        // a flavor mapping a parameter onto an instruction value collides
        // with the driver's own mapping of that instruction
        struct Colliding(RecordingFlavor);
        impl GraphFlavor for Colliding {
            type Node = u32;
            type Block = usize;
            type Subgraph = usize;
            fn create_subgraph(&mut self, f: &Function) -> Result<usize> {
                self.0.create_subgraph(f)
            }
            fn create_bblock(&mut self, b: &BasicBlock, s: usize) -> Result<usize> {
                self.0.create_bblock(b, s)
            }
            fn create_node(
                &mut self,
                ctx: &BuildContext<'_, usize, u32>,
                inst: &Instruction,
            ) -> Result<Option<NodeExpansion<u32>>> {
                self.0.create_node(ctx, inst)
            }
            fn append(&mut self, b: usize, n: u32) {
                self.0.append(b, n)
            }
            fn create_parameters(&mut self, f: &Function, _s: usize) -> Result<Vec<(Value, u32)>> {
                Ok(vec![(f.blocks[0].instructions[0].value(), 99)])
            }
        }

        let module = sample_module();
        let mut builder = GraphBuilder::new(Colliding(RecordingFlavor::default()));
        let err = builder.build_module(&module).unwrap_err();
        assert!(matches!(err, DepGraphError::DuplicateNode { .. }));
    }
}
