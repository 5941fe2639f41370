//! SSA passes

mod ssa_translate;

pub use ssa_translate::{translate_to_ssa, SsaTranslationPass, SsaTranslationStats};
