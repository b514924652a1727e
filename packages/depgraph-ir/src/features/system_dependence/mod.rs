//! System Dependence Graph
//!
//! Per-function dependence graphs with formal/actual parameter nodes and
//! call nodes, assembled into one interprocedural graph with a designated
//! entry function.
//!
//! ```
//! use depgraph_ir::config::SdgConfig;
//! use depgraph_ir::features::system_dependence::SdgBuilder;
//! use depgraph_ir::shared::models::{Callee, InstructionKind, ModuleBuilder};
//!
//! let mut mb = ModuleBuilder::new("demo");
//! let main = mb.add_function("main", 0, false);
//! let helper = mb.add_function("helper", 1, false);
//! let entry = mb.add_block(main);
//! let call = mb.push(entry, InstructionKind::Call {
//!     callee: Callee::Direct(helper),
//!     args: vec![depgraph_ir::shared::models::Value::Constant(7)],
//! });
//! mb.push(entry, InstructionKind::Ret { value: None });
//! let body = mb.add_block(helper);
//! mb.push(body, InstructionKind::Ret { value: None });
//! let module = mb.build();
//!
//! let sdg = SdgBuilder::new(&module, SdgConfig::default()).build().unwrap();
//! assert_eq!(sdg.entry().unwrap().name(), "main");
//! assert_eq!(sdg.get_node(&call).unwrap().as_call().unwrap().parameters.len(), 1);
//! ```
//!
//! Architecture:
//! - domain: SystemDependenceGraph, DependenceGraph, DGNode
//! - infrastructure: SdgBuilder (GraphFlavor)

pub mod domain;
pub mod infrastructure;

pub use domain::{
    DGBBlock, DGBBlockRef, DGCall, DGFormalParameters, DGId, DGNode, DGNodeId, DGNodeKind, DGNodeRef,
    DependenceGraph, SystemDependenceGraph,
};
pub use infrastructure::SdgBuilder;
