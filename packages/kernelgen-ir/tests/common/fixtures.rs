//! Structured programs used across the integration tests

use kernelgen_ir::{CodeFunction, IrArena, NodeId};

/// Structured function before lowering
pub struct Program {
    pub arena: IrArena,
    pub arguments: Vec<NodeId>,
    pub root: NodeId,
}

impl Program {
    pub fn into_function(self, name: &str) -> CodeFunction {
        CodeFunction::new(name, self.arena, self.arguments, self.root)
    }
}

/// `if (x > y) { x = 2; } else { y = 3; } y = x;` with inputs x, y
pub fn fixture_if_else() -> Program {
    let mut arena = IrArena::new();
    let x = arena.input("x");
    let y = arena.input("y");
    let cond = arena.gt(x, y);
    let two = arena.constant(2);
    let three = arena.constant(3);
    let then = arena.assign(x, two);
    let otherwise = arena.assign(y, three);
    let branch = arena.condition(cond, then, Some(otherwise));
    let use_x = arena.assign(y, x);
    let root = arena.statement(vec![branch, use_x]);
    Program {
        arena,
        arguments: vec![x, y],
        root,
    }
}

/// `s = 0; for (i = 0; i < n; i++) s = s + i; return s;` with input n
pub fn fixture_sum_loop() -> Program {
    let mut arena = IrArena::new();
    let n = arena.input("n");
    let s = arena.local("s");
    let i = arena.local("i");
    let zero = arena.constant(0);
    let one = arena.constant(1);

    let init_s = arena.assign(s, zero);
    let init_i = arena.assign(i, zero);
    let cond = arena.lt(i, n);
    let acc = arena.add(s, i);
    let update_s = arena.assign(s, acc);
    let inc = arena.add(i, one);
    let update_i = arena.assign(i, inc);
    let body = arena.statement(vec![update_s, update_i]);
    let lp = arena.loop_(init_i, cond, body);
    let ret = arena.ret(Some(s));
    let root = arena.statement(vec![init_s, lp, ret]);
    Program {
        arena,
        arguments: vec![n],
        root,
    }
}

/// `x = a; x = x + 1; return x;` with input a
pub fn fixture_straight_line() -> Program {
    let mut arena = IrArena::new();
    let a = arena.input("a");
    let x = arena.local("x");
    let one = arena.constant(1);
    let first = arena.assign(x, a);
    let sum = arena.add(x, one);
    let second = arena.assign(x, sum);
    let ret = arena.ret(Some(x));
    let root = arena.statement(vec![first, second, ret]);
    Program {
        arena,
        arguments: vec![a],
        root,
    }
}

/// Loop whose body holds an if without else:
/// `m = 0; for (i = 0; i < n; i = i + 1) { if (i > m) { m = i; } } return m;`
pub fn fixture_loop_with_branch() -> Program {
    let mut arena = IrArena::new();
    let n = arena.input("n");
    let m = arena.local("m");
    let i = arena.local("i");
    let zero = arena.constant(0);
    let one = arena.constant(1);

    let init_m = arena.assign(m, zero);
    let init_i = arena.assign(i, zero);
    let cond = arena.lt(i, n);
    let bigger = arena.gt(i, m);
    let take = arena.assign(m, i);
    let branch = arena.condition(bigger, take, None);
    let inc = arena.add(i, one);
    let step = arena.assign(i, inc);
    let body = arena.statement(vec![branch, step]);
    let lp = arena.loop_(init_i, cond, body);
    let ret = arena.ret(Some(m));
    let root = arena.statement(vec![init_m, lp, ret]);
    Program {
        arena,
        arguments: vec![n],
        root,
    }
}
