//! Flow graph passes

mod generate_basic_blocks;

pub use generate_basic_blocks::GenerateBasicBlockPass;
