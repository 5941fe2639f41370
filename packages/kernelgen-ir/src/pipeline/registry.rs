//! Pass registry: tag → pass factory

use super::pass::FunctionPass;
use crate::errors::{CodegenError, Result};
use crate::features::flow_graph::application::GenerateBasicBlockPass;
use crate::features::ssa::application::SsaTranslationPass;
use rustc_hash::FxHashMap;

/// Tags of the passes every default registry knows
pub const BUILTIN_PASS_TAGS: &[&str] = &["gen_basic_block", "ssa_translation"];

pub type PassFactory = Box<dyn Fn() -> Box<dyn FunctionPass> + Send + Sync>;

pub struct PassRegistry {
    factories: FxHashMap<String, PassFactory>,
    /// Registration order, for listings
    order: Vec<String>,
}

impl PassRegistry {
    /// Registry without any pass
    pub fn empty() -> Self {
        Self {
            factories: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Registry with the builtin passes
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("gen_basic_block", || Box::new(GenerateBasicBlockPass));
        registry.register("ssa_translation", || Box::new(SsaTranslationPass));
        registry
    }

    /// Register (or replace) the factory for `tag`
    pub fn register<F>(&mut self, tag: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn FunctionPass> + Send + Sync + 'static,
    {
        let tag = tag.into();
        if !self.factories.contains_key(&tag) {
            self.order.push(tag.clone());
        }
        self.factories.insert(tag, Box::new(factory));
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    pub fn tags(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn create(&self, tag: &str) -> Result<Box<dyn FunctionPass>> {
        self.factories
            .get(tag)
            .map(|factory| factory())
            .ok_or_else(|| CodegenError::UnknownPass(tag.to_string()))
    }
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
