//! Pipeline configuration
//!
//! Aggregates the stage configs and is the single value threaded through
//! the pass framework. Built in code with the closure builders or loaded
//! from YAML; either way only a [`ValidatedConfig`] reaches the passes.

use super::error::{ConfigError, ConfigResult};
use super::stage_configs::{DominanceConfig, LoweringConfig, ScheduleConfig, SsaConfig};
use super::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub lowering: LoweringConfig,
    pub dominance: DominanceConfig,
    pub ssa: SsaConfig,
    pub schedule: ScheduleConfig,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lowering<F>(mut self, f: F) -> Self
    where
        F: FnOnce(LoweringConfig) -> LoweringConfig,
    {
        self.lowering = f(self.lowering);
        self
    }

    pub fn dominance<F>(mut self, f: F) -> Self
    where
        F: FnOnce(DominanceConfig) -> DominanceConfig,
    {
        self.dominance = f(self.dominance);
        self
    }

    pub fn ssa<F>(mut self, f: F) -> Self
    where
        F: FnOnce(SsaConfig) -> SsaConfig,
    {
        self.ssa = f(self.ssa);
        self
    }

    pub fn schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = schedule;
        self
    }

    /// Validate every section, then the cross-section rules
    pub fn build(self) -> ConfigResult<ValidatedConfig> {
        self.validate()?;
        Ok(ValidatedConfig(self))
    }

    /// Parse a YAML document (missing sections take their defaults)
    pub fn from_yaml_str(content: &str) -> ConfigResult<ValidatedConfig> {
        let config: PipelineConfig = serde_yaml::from_str(content)?;
        config.build()
    }

    /// Load from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<ValidatedConfig> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Export to YAML
    pub fn to_yaml(&self) -> ConfigResult<String> {
        serde_yaml::to_string(self).map_err(ConfigError::Yaml)
    }

    fn cross_validate(&self) -> ConfigResult<()> {
        let schedule: Vec<&str> = self
            .schedule
            .slots()
            .iter()
            .flat_map(|(_, tags)| tags.iter().map(String::as_str))
            .collect();

        let gen = schedule.iter().position(|tag| *tag == "gen_basic_block");
        let ssa = schedule.iter().position(|tag| *tag == "ssa_translation");
        match (gen, ssa) {
            (Some(gen), Some(ssa)) if ssa < gen => Err(ConfigError::Validation(
                "ssa_translation is scheduled before gen_basic_block".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl Validatable for PipelineConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.lowering.validate()?;
        self.dominance.validate()?;
        self.ssa.validate()?;
        self.schedule.validate()?;
        self.cross_validate()
    }

    fn config_name(&self) -> &'static str {
        "PipelineConfig"
    }
}

/// A [`PipelineConfig`] that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig(PipelineConfig);

impl ValidatedConfig {
    pub fn into_inner(self) -> PipelineConfig {
        self.0
    }

    pub fn as_inner(&self) -> &PipelineConfig {
        &self.0
    }

    pub fn lowering(&self) -> &LoweringConfig {
        &self.0.lowering
    }

    pub fn dominance(&self) -> &DominanceConfig {
        &self.0.dominance
    }

    pub fn ssa(&self) -> &SsaConfig {
        &self.0.ssa
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        &self.0.schedule
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        self.0.to_yaml()
    }
}

impl Default for ValidatedConfig {
    fn default() -> Self {
        Self(PipelineConfig::default())
    }
}
