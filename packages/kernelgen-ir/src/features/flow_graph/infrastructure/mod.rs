//! Flow Graph infrastructure

pub mod display;
pub mod lowering;

pub use display::{render_block_list, render_expr, render_instruction};
pub use lowering::generate_basic_blocks;
