//! Shared models
//!
//! The program model consumed by every graph builder.

pub mod program;

pub use program::{
    BasicBlock, BlockId, Callee, Function, FunctionId, Global, GlobalId, InstId, Instruction,
    InstructionKind, Module, ModuleBuilder, Parameter, Value,
};
