//! Builders for generated structured programs
//!
//! Programs use two inputs (`a`, `b`) and three locals (`x`, `y`, `z`). The
//! locals are zeroed first, so every use has a reaching definition.

use super::fixtures::Program;
use kernelgen_ir::{IrArena, NodeId};

pub const INPUT_NAMES: [&str; 2] = ["a", "b"];
pub const LOCAL_NAMES: [&str; 3] = ["x", "y", "z"];

#[derive(Debug, Clone)]
pub enum Operand {
    /// Index into inputs followed by locals (wrapped)
    Var(usize),
    Const(i64),
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `local = lhs + rhs`
    Assign(usize, Operand, Operand),
    /// `if (lhs < rhs) { .. } else { .. }`
    If(Operand, Operand, Vec<Stmt>, Option<Vec<Stmt>>),
    /// `for (local = 0; local < a; local = local + 1) { .. }`
    Loop(usize, Vec<Stmt>),
    Return(Operand),
}

struct ProgramBuilder {
    arena: IrArena,
    inputs: Vec<NodeId>,
    locals: Vec<NodeId>,
}

impl ProgramBuilder {
    fn new() -> Self {
        let mut arena = IrArena::new();
        let inputs = INPUT_NAMES.iter().map(|n| arena.input(*n)).collect();
        let locals = LOCAL_NAMES.iter().map(|n| arena.local(*n)).collect();
        Self {
            arena,
            inputs,
            locals,
        }
    }

    fn variable(&self, index: usize) -> NodeId {
        let index = index % (self.inputs.len() + self.locals.len());
        if index < self.inputs.len() {
            self.inputs[index]
        } else {
            self.locals[index - self.inputs.len()]
        }
    }

    fn local(&self, index: usize) -> NodeId {
        self.locals[index % self.locals.len()]
    }

    fn operand(&mut self, operand: &Operand) -> NodeId {
        match operand {
            Operand::Var(index) => self.variable(*index),
            Operand::Const(value) => self.arena.constant(*value),
        }
    }

    fn block(&mut self, stmts: &[Stmt]) -> NodeId {
        let children = stmts.iter().map(|s| self.stmt(s)).collect();
        self.arena.statement(children)
    }

    fn stmt(&mut self, stmt: &Stmt) -> NodeId {
        match stmt {
            Stmt::Assign(target, lhs, rhs) => {
                let target = self.local(*target);
                let lhs = self.operand(lhs);
                let rhs = self.operand(rhs);
                let sum = self.arena.add(lhs, rhs);
                self.arena.assign(target, sum)
            }
            Stmt::If(lhs, rhs, then, otherwise) => {
                let lhs = self.operand(lhs);
                let rhs = self.operand(rhs);
                let cond = self.arena.lt(lhs, rhs);
                let then = self.block(then);
                let otherwise = otherwise.as_ref().map(|o| self.block(o));
                self.arena.condition(cond, then, otherwise)
            }
            Stmt::Loop(counter, body) => {
                let counter = self.local(*counter);
                let zero = self.arena.constant(0);
                let one = self.arena.constant(1);
                let init = self.arena.assign(counter, zero);
                let bound = self.inputs[0];
                let cond = self.arena.lt(counter, bound);
                let mut children: Vec<NodeId> = body.iter().map(|s| self.stmt(s)).collect();
                let inc = self.arena.add(counter, one);
                children.push(self.arena.assign(counter, inc));
                let body = self.arena.statement(children);
                self.arena.loop_(init, cond, body)
            }
            Stmt::Return(value) => {
                let value = self.operand(value);
                self.arena.ret(Some(value))
            }
        }
    }
}

/// Arena program for `stmts`, prefixed with `x = 0; y = 0; z = 0;`
pub fn build_program(stmts: &[Stmt]) -> Program {
    let mut builder = ProgramBuilder::new();
    let mut children = Vec::new();
    for local in builder.locals.clone() {
        let zero = builder.arena.constant(0);
        children.push(builder.arena.assign(local, zero));
    }
    children.extend(stmts.iter().map(|s| builder.stmt(s)));
    let root = builder.arena.statement(children);
    Program {
        arena: builder.arena,
        arguments: builder.inputs,
        root,
    }
}
