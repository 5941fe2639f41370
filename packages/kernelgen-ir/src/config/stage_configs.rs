//! Stage-specific configuration types
//!
//! One struct per pipeline stage, each with serde defaults and a
//! `Validatable` implementation.

use super::error::{ConfigError, ConfigResult};
use super::validation::{check_range, Validatable};
use crate::pipeline::registry::BUILTIN_PASS_TAGS;
use serde::{Deserialize, Serialize};

// ============================================================================
// CFG lowering
// ============================================================================

/// Structured IR → basic-block lowering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoweringConfig {
    /// Tag of the function entry block
    pub entry_tag: String,

    /// Append `Return(None)` to a body that falls off its end
    pub implicit_return: bool,
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self {
            entry_tag: "main".to_string(),
            implicit_return: true,
        }
    }
}

impl LoweringConfig {
    pub fn entry_tag(mut self, tag: impl Into<String>) -> Self {
        self.entry_tag = tag.into();
        self
    }

    pub fn implicit_return(mut self, enabled: bool) -> Self {
        self.implicit_return = enabled;
        self
    }
}

impl Validatable for LoweringConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.entry_tag.trim().is_empty() {
            return Err(ConfigError::Validation(
                "lowering.entry_tag must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "LoweringConfig"
    }
}

// ============================================================================
// Dominance
// ============================================================================

/// Immediate-dominator algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominanceAlgorithm {
    /// Dominator-set fixpoint followed by the quadratic idom scan
    #[default]
    Iterative,
    /// Cooper/Harvey/Kennedy via `petgraph::algo::dominators::simple_fast`
    SimpleFast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DominanceConfig {
    pub algorithm: DominanceAlgorithm,

    /// Upper bound on dominator-set fixpoint sweeps (1..=1_000_000)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_max_iterations() -> usize {
    10_000
}

impl Default for DominanceConfig {
    fn default() -> Self {
        Self {
            algorithm: DominanceAlgorithm::default(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl DominanceConfig {
    pub fn algorithm(mut self, algorithm: DominanceAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }
}

impl Validatable for DominanceConfig {
    fn validate(&self) -> ConfigResult<()> {
        check_range(
            "max_iterations",
            self.max_iterations,
            1,
            1_000_000,
            "The dominance fixpoint needs at least one sweep",
        )
    }

    fn config_name(&self) -> &'static str {
        "DominanceConfig"
    }
}

// ============================================================================
// SSA translation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsaConfig {
    /// Inserted between a variable name and its version index (`x_3`)
    pub version_separator: String,

    /// Run the CFG and SSA verifiers after translation
    pub verify: bool,
}

impl Default for SsaConfig {
    fn default() -> Self {
        Self {
            version_separator: "_".to_string(),
            verify: true,
        }
    }
}

impl SsaConfig {
    pub fn version_separator(mut self, separator: impl Into<String>) -> Self {
        self.version_separator = separator.into();
        self
    }

    pub fn verify(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }
}

impl Validatable for SsaConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.version_separator.is_empty() {
            return Err(ConfigError::Validation(
                "ssa.version_separator must not be empty".to_string(),
            ));
        }
        if self.version_separator.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "ssa.version_separator must not contain whitespace, got {:?}",
                self.version_separator
            )));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "SsaConfig"
    }
}

// ============================================================================
// Pass schedule
// ============================================================================

/// Pass tags per scheduler slot, executed slot by slot in this order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub start: Vec<String>,
    pub typing: Vec<String>,
    pub optimization: Vec<String>,
    pub just_before_codegen: Vec<String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            start: Vec::new(),
            typing: Vec::new(),
            optimization: Vec::new(),
            just_before_codegen: vec![
                "gen_basic_block".to_string(),
                "ssa_translation".to_string(),
            ],
        }
    }
}

impl ScheduleConfig {
    /// Empty schedule
    pub fn empty() -> Self {
        Self {
            start: Vec::new(),
            typing: Vec::new(),
            optimization: Vec::new(),
            just_before_codegen: Vec::new(),
        }
    }

    /// (slot name, tags) in execution order
    pub fn slots(&self) -> [(&'static str, &[String]); 4] {
        [
            ("start", self.start.as_slice()),
            ("typing", self.typing.as_slice()),
            ("optimization", self.optimization.as_slice()),
            ("just_before_codegen", self.just_before_codegen.as_slice()),
        ]
    }

    /// Check every tag against `known` and reject duplicates within a slot
    pub fn validate_against(&self, known: &[&str]) -> ConfigResult<()> {
        for (slot, tags) in self.slots() {
            for (index, tag) in tags.iter().enumerate() {
                if !known.contains(&tag.as_str()) {
                    return Err(ConfigError::unknown_pass_with_suggestion(
                        tag.as_str(),
                        slot,
                        known,
                    ));
                }
                if tags[..index].contains(tag) {
                    return Err(ConfigError::DuplicatePass {
                        tag: tag.clone(),
                        slot: slot.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Validatable for ScheduleConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.validate_against(BUILTIN_PASS_TAGS)
    }

    fn config_name(&self) -> &'static str {
        "ScheduleConfig"
    }
}
