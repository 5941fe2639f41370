//! Pipeline configuration
//!
//! Two ways to configure the lowering / SSA pipeline:
//! - Builder: start from the defaults and override a stage with a closure
//! - YAML: complete control, missing sections take their defaults
//!
//! # Examples
//!
//! ```rust,ignore
//! use kernelgen_ir::config::{DominanceAlgorithm, PipelineConfig};
//!
//! let config = PipelineConfig::new()
//!     .dominance(|c| c.algorithm(DominanceAlgorithm::SimpleFast))
//!     .build()?;
//!
//! let config = PipelineConfig::from_yaml_file("kernelgen.yaml")?;
//! ```

pub mod error;
pub mod pipeline_config;
pub mod stage_configs;
pub mod validation;

// Re-exports
pub use error::{ConfigError, ConfigResult};
pub use pipeline_config::{PipelineConfig, ValidatedConfig};
pub use stage_configs::{
    DominanceAlgorithm, DominanceConfig, LoweringConfig, ScheduleConfig, SsaConfig,
};
pub use validation::{Validatable, ValidatableCollection};
