mod basic_block;
pub mod cfg;

pub use basic_block::{BasicBlock, BasicBlockList, FunctionBody};
pub use cfg::{CFGEdge, CFGEdgeKind};
