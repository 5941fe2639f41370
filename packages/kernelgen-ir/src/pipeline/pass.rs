//! Function pass trait
//!
//! A pass transforms one [`CodeFunction`] at a time. The scheduler calls
//! [`FunctionPass::execute_on_fct_group`], which by default visits the group
//! in order and stops at the first failure.

use super::function::{CodeFunction, FunctionGroup};
use crate::config::ValidatedConfig;
use crate::errors::Result;
use tracing::info;

/// Read-only state shared by every pass run over one group
#[derive(Debug, Clone, Copy)]
pub struct GroupContext<'a> {
    config: &'a ValidatedConfig,
}

impl<'a> GroupContext<'a> {
    pub fn new(config: &'a ValidatedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a ValidatedConfig {
        self.config
    }
}

pub trait FunctionPass: Send + Sync {
    /// Tag used in schedules and error reports
    fn pass_tag(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Transform `function` in place. On error the function must be left as
    /// it was: passes work on copies and commit at the end.
    fn execute_on_function(&self, function: &mut CodeFunction, ctx: &GroupContext<'_>)
        -> Result<()>;

    fn execute_on_fct_group(&self, group: &mut FunctionGroup, ctx: &GroupContext<'_>) -> Result<()> {
        for function in group.functions_mut() {
            info!(
                pass = self.pass_tag(),
                function = %function.name,
                "executing pass"
            );
            self.execute_on_function(function, ctx)
                .map_err(|e| e.in_pass(self.pass_tag(), function.name.clone()))?;
        }
        Ok(())
    }
}
