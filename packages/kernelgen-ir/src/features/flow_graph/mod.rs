//! Flow graph feature
//!
//! - domain/: basic blocks, block lists, CFG edges
//! - infrastructure/: lowering of structured IR, textual rendering
//! - application/: the `gen_basic_block` pass

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::GenerateBasicBlockPass;
pub use domain::{BasicBlock, BasicBlockList, CFGEdge, CFGEdgeKind, FunctionBody};
pub use infrastructure::{generate_basic_blocks, render_block_list};
