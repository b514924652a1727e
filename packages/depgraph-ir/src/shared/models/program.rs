/*
 * Program Model
 *
 * In-memory view of a procedural program:
 * - Module → Functions → BasicBlocks → Instructions
 * - Values (instructions, arguments, globals, functions, blocks, constants)
 * - Call sites (direct / indirect) and argument lists
 *
 * The builders only ever borrow a Module immutably. Every annotation they
 * produce (value → node) lives in their own side tables.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Function identifier (index into `Module::functions`)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FunctionId(pub u32);

/// Global variable identifier (index into `Module::globals`)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GlobalId(pub u32);

/// Basic block identifier, self-describing (owning function + position)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockId {
    pub function: FunctionId,
    pub index: u32,
}

/// Instruction identifier, self-describing (owning block + position)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct InstId {
    pub block: BlockId,
    pub index: u32,
}

impl InstId {
    #[inline]
    pub fn function(&self) -> FunctionId {
        self.block.function
    }
}

/// A program value.
///
/// Identity-carrying variants (`Inst`, `Argument`, `Global`, `Function`,
/// `Block`) are the keys of every value → node mapping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Value {
    Inst(InstId),
    Argument { function: FunctionId, index: u32 },
    Global(GlobalId),
    Function(FunctionId),
    Block(BlockId),
    Constant(i64),
    Null,
    Undef,
}

impl Value {
    /// Constant integer payload, if any
    pub fn as_constant(&self) -> Option<i64> {
        match self {
            Value::Constant(c) => Some(*c),
            _ => None,
        }
    }

    /// Values that can never be a pointer into tracked memory
    pub fn is_constant_like(&self) -> bool {
        matches!(self, Value::Constant(_) | Value::Null | Value::Undef)
    }

    /// Function the value belongs to (instructions, arguments, blocks)
    pub fn parent_function(&self) -> Option<FunctionId> {
        match self {
            Value::Inst(inst) => Some(inst.function()),
            Value::Argument { function, .. } => Some(*function),
            Value::Block(block) => Some(block.function),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Inst(i) => write!(
                f,
                "%f{}.b{}.i{}",
                i.block.function.0, i.block.index, i.index
            ),
            Value::Argument { function, index } => write!(f, "%f{}.arg{}", function.0, index),
            Value::Global(g) => write!(f, "@g{}", g.0),
            Value::Function(fun) => write!(f, "@f{}", fun.0),
            Value::Block(b) => write!(f, "f{}.b{}", b.function.0, b.index),
            Value::Constant(c) => write!(f, "{}", c),
            Value::Null => write!(f, "null"),
            Value::Undef => write!(f, "undef"),
        }
    }
}

/// Target of a call instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Callee {
    /// Statically known function
    Direct(FunctionId),
    /// Called through a function pointer
    Indirect(Value),
}

/// Instruction kinds relevant to dependence analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// Static (stack) allocation
    Alloca { size: Option<u64> },
    Load { pointer: Value, size: Option<u64> },
    Store { value: Value, pointer: Value, size: Option<u64> },
    Call { callee: Callee, args: Vec<Value> },
    Br { target: BlockId },
    CondBr { condition: Value, if_true: BlockId, if_false: BlockId },
    Switch { condition: Value, default: BlockId, cases: Vec<BlockId> },
    Ret { value: Option<Value> },
    Unreachable,
    /// Anything else (arithmetic, casts, address computation, ...)
    Op { operands: Vec<Value> },
}

impl InstructionKind {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstructionKind::Br { .. }
                | InstructionKind::CondBr { .. }
                | InstructionKind::Switch { .. }
                | InstructionKind::Ret { .. }
                | InstructionKind::Unreachable
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: InstId,
    pub kind: InstructionKind,
}

impl Instruction {
    #[inline]
    pub fn value(&self) -> Value {
        Value::Inst(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|i| i.kind.is_terminator())
    }

    /// Distinct successor blocks in terminator order
    pub fn successors(&self) -> Vec<BlockId> {
        let mut succs = Vec::new();
        let Some(term) = self.terminator() else {
            return succs;
        };

        let mut push = |b: BlockId| {
            if !succs.contains(&b) {
                succs.push(b);
            }
        };

        match &term.kind {
            InstructionKind::Br { target } => push(*target),
            InstructionKind::CondBr {
                if_true, if_false, ..
            } => {
                push(*if_true);
                push(*if_false);
            }
            InstructionKind::Switch { default, cases, .. } => {
                push(*default);
                for case in cases {
                    push(*case);
                }
            }
            _ => {}
        }

        succs
    }
}

/// Formal parameter declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub id: FunctionId,
    pub name: String,
    pub params: Vec<Parameter>,
    pub is_var_arg: bool,
    /// Empty for declarations (externally defined functions)
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    #[inline]
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        if id.function != self.id {
            return None;
        }
        self.blocks.get(id.index as usize)
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|b| b.instructions.iter())
    }

    pub fn argument(&self, index: u32) -> Value {
        Value::Argument {
            function: self.id,
            index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Global {
    pub id: GlobalId,
    pub name: String,
    pub size: Option<u64>,
}

/// A whole program unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub globals: Vec<Global>,
}

impl Module {
    /// Load a module serialized with [`Module::to_json`]
    pub fn from_json(json: &str) -> crate::errors::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.0 as usize)
    }

    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.function(id.function)?.block(id)
    }

    pub fn instruction(&self, id: InstId) -> Option<&Instruction> {
        self.block(id.block)?.instructions.get(id.index as usize)
    }

    pub fn global(&self, id: GlobalId) -> Option<&Global> {
        self.globals.get(id.0 as usize)
    }

    /// Functions with a body, in module order
    pub fn definitions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter().filter(|f| !f.is_declaration())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Module Builder
// ═══════════════════════════════════════════════════════════════════════════

/// Incremental construction of a [`Module`].
///
/// Ids are handed out as functions, blocks and instructions are added, so
/// forward references (calls to functions declared later, branches to
/// blocks created later) only need the id.
///
/// ```
/// use depgraph_ir::shared::models::{InstructionKind, ModuleBuilder};
///
/// let mut mb = ModuleBuilder::new("demo");
/// let main = mb.add_function("main", 0, false);
/// let entry = mb.add_block(main);
/// mb.push(entry, InstructionKind::Ret { value: None });
/// let module = mb.build();
/// assert_eq!(module.definitions().count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            module: Module {
                name: name.into(),
                ..Module::default()
            },
        }
    }

    /// Add a function with `params` unnamed parameters (`arg0`, `arg1`, ...).
    /// The function stays a declaration until a block is added.
    pub fn add_function(&mut self, name: impl Into<String>, params: u32, is_var_arg: bool) -> FunctionId {
        let id = FunctionId(self.module.functions.len() as u32);
        self.module.functions.push(Function {
            id,
            name: name.into(),
            params: (0..params)
                .map(|i| Parameter {
                    name: format!("arg{}", i),
                })
                .collect(),
            is_var_arg,
            blocks: Vec::new(),
        });
        id
    }

    pub fn add_global(&mut self, name: impl Into<String>, size: Option<u64>) -> Value {
        let id = GlobalId(self.module.globals.len() as u32);
        self.module.globals.push(Global {
            id,
            name: name.into(),
            size,
        });
        Value::Global(id)
    }

    /// Append an empty block to `function`.
    ///
    /// # Panics
    /// If `function` was not created by this builder.
    pub fn add_block(&mut self, function: FunctionId) -> BlockId {
        let fun = &mut self.module.functions[function.0 as usize];
        let id = BlockId {
            function,
            index: fun.blocks.len() as u32,
        };
        fun.blocks.push(BasicBlock {
            id,
            instructions: Vec::new(),
        });
        id
    }

    /// Append an instruction to `block` and return its value.
    ///
    /// # Panics
    /// If `block` was not created by this builder.
    pub fn push(&mut self, block: BlockId, kind: InstructionKind) -> Value {
        let bb = &mut self.module.functions[block.function.0 as usize].blocks[block.index as usize];
        let id = InstId {
            block,
            index: bb.instructions.len() as u32,
        };
        bb.instructions.push(Instruction { id, kind });
        Value::Inst(id)
    }

    pub fn argument(&self, function: FunctionId, index: u32) -> Value {
        Value::Argument { function, index }
    }

    pub fn build(self) -> Module {
        self.module
    }
}
