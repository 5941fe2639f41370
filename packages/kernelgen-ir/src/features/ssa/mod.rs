//! SSA feature
//!
//! - infrastructure/: node assignment, dominance, phi placement, renaming,
//!   verification
//! - application/: the `ssa_translation` pass

pub mod application;
pub mod infrastructure;

pub use application::{translate_to_ssa, SsaTranslationPass, SsaTranslationStats};
pub use infrastructure::{BasicBlockGraph, SSAError, SSAResult};
