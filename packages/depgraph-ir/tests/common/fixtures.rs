//! Program fixtures
//!
//! Small modules built with `ModuleBuilder`, each returning the ids the
//! tests assert on.

use depgraph_ir::shared::models::{
    BlockId, Callee, FunctionId, InstructionKind, Module, ModuleBuilder, Value,
};

/// `f(c)`: b0 condbr b1|b2; b1 -> b3; b2 -> b3; b3 ret
pub struct Diamond {
    pub module: Module,
    pub function: FunctionId,
    pub blocks: [BlockId; 4],
    /// Terminator of each block, in block order
    pub terminators: [Value; 4],
}

pub fn diamond() -> Diamond {
    let mut mb = ModuleBuilder::new("diamond");
    let f = mb.add_function("f", 1, false);
    let blocks: [BlockId; 4] = std::array::from_fn(|_| mb.add_block(f));
    let [b0, b1, b2, b3] = blocks;
    let cond = mb.argument(f, 0);

    let t0 = mb.push(
        b0,
        InstructionKind::CondBr {
            condition: cond,
            if_true: b1,
            if_false: b2,
        },
    );
    let t1 = mb.push(b1, InstructionKind::Br { target: b3 });
    let t2 = mb.push(b2, InstructionKind::Br { target: b3 });
    let t3 = mb.push(b3, InstructionKind::Ret { value: None });

    Diamond {
        module: mb.build(),
        function: f,
        blocks,
        terminators: [t0, t1, t2, t3],
    }
}

/// `f`: b0 -> b1 -> b2, no decisions
pub fn straight_line() -> (Module, FunctionId, [BlockId; 3]) {
    let mut mb = ModuleBuilder::new("straight");
    let f = mb.add_function("f", 0, false);
    let blocks: [BlockId; 3] = std::array::from_fn(|_| mb.add_block(f));
    mb.push(blocks[0], InstructionKind::Op { operands: vec![] });
    mb.push(blocks[0], InstructionKind::Br { target: blocks[1] });
    mb.push(blocks[1], InstructionKind::Br { target: blocks[2] });
    mb.push(blocks[2], InstructionKind::Ret { value: None });
    (mb.build(), f, blocks)
}

/// `f(c)`: b0 -> b1; b1 condbr b2|b3; b2 -> b1; b3 ret
pub fn while_loop() -> (Module, FunctionId, [BlockId; 4]) {
    let mut mb = ModuleBuilder::new("loop");
    let f = mb.add_function("f", 1, false);
    let blocks: [BlockId; 4] = std::array::from_fn(|_| mb.add_block(f));
    let [b0, b1, b2, b3] = blocks;
    let cond = mb.argument(f, 0);
    mb.push(b0, InstructionKind::Br { target: b1 });
    mb.push(
        b1,
        InstructionKind::CondBr {
            condition: cond,
            if_true: b2,
            if_false: b3,
        },
    );
    mb.push(b2, InstructionKind::Op { operands: vec![cond] });
    mb.push(b2, InstructionKind::Br { target: b1 });
    mb.push(b3, InstructionKind::Ret { value: None });
    (mb.build(), f, blocks)
}

/// `main ↔ helper` mutual recursion
pub struct MutualRecursion {
    pub module: Module,
    pub main: FunctionId,
    pub helper: FunctionId,
    pub main_call: Value,
    pub helper_call: Value,
}

pub fn mutual_recursion() -> MutualRecursion {
    let mut mb = ModuleBuilder::new("recursion");
    let main = mb.add_function("main", 0, false);
    let helper = mb.add_function("helper", 1, false);

    let m0 = mb.add_block(main);
    let main_call = mb.push(
        m0,
        InstructionKind::Call {
            callee: Callee::Direct(helper),
            args: vec![Value::Constant(1)],
        },
    );
    mb.push(m0, InstructionKind::Ret { value: None });

    let h0 = mb.add_block(helper);
    let helper_call = mb.push(
        h0,
        InstructionKind::Call {
            callee: Callee::Direct(main),
            args: vec![],
        },
    );
    mb.push(h0, InstructionKind::Ret { value: None });

    MutualRecursion {
        module: mb.build(),
        main,
        helper,
        main_call,
        helper_call,
    }
}

/// `main`: two allocas, then a store and a load through a pointer that may
/// refer to either
pub struct TwoTargetStore {
    pub module: Module,
    pub main: FunctionId,
    pub a: Value,
    pub b: Value,
    /// Pointer operand of the store and load
    pub pointer: Value,
    pub store: Value,
    pub load: Value,
}

pub fn two_target_store() -> TwoTargetStore {
    let mut mb = ModuleBuilder::new("store");
    let main = mb.add_function("main", 0, false);
    let b0 = mb.add_block(main);
    let a = mb.push(b0, InstructionKind::Alloca { size: Some(16) });
    let b = mb.push(b0, InstructionKind::Alloca { size: Some(8) });
    let pointer = mb.push(b0, InstructionKind::Op { operands: vec![a, b] });
    let store = mb.push(
        b0,
        InstructionKind::Store {
            value: Value::Constant(7),
            pointer,
            size: Some(4),
        },
    );
    let load = mb.push(b0, InstructionKind::Load { pointer, size: Some(4) });
    mb.push(b0, InstructionKind::Ret { value: None });

    TwoTargetStore {
        module: mb.build(),
        main,
        a,
        b,
        pointer,
        store,
        load,
    }
}
