//! Shared models: the arena-backed IR every pass reads and rewrites

mod arena;
mod ids;
mod node;

pub use arena::IrArena;
pub use ids::{BlockId, NodeId};
pub use node::{Comparison, ConstValue, Node, OpCode, PhiOperand, Precision, VariableKind};
