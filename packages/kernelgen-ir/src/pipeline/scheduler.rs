//! Pass scheduler
//!
//! Passes live in four ordered slots. `execute_all` runs every slot in order
//! over a function group; each pass sees the whole group before the next
//! pass starts.

use super::function::FunctionGroup;
use super::pass::{FunctionPass, GroupContext};
use super::registry::PassRegistry;
use crate::config::ValidatedConfig;
use crate::errors::Result;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassSlot {
    Start,
    Typing,
    Optimization,
    JustBeforeCodeGen,
}

impl PassSlot {
    /// All slots in execution order
    pub const ALL: [PassSlot; 4] = [
        PassSlot::Start,
        PassSlot::Typing,
        PassSlot::Optimization,
        PassSlot::JustBeforeCodeGen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PassSlot::Start => "start",
            PassSlot::Typing => "typing",
            PassSlot::Optimization => "optimization",
            PassSlot::JustBeforeCodeGen => "just_before_codegen",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PassSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default)]
pub struct PassScheduler {
    slots: [Vec<Box<dyn FunctionPass>>; 4],
}

impl PassScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate the configured schedule from `registry`
    pub fn from_config(config: &ValidatedConfig, registry: &PassRegistry) -> Result<Self> {
        let mut scheduler = Self::new();
        for (slot, (_, tags)) in PassSlot::ALL.iter().zip(config.schedule().slots()) {
            for tag in tags {
                scheduler.add_pass(*slot, registry.create(tag)?);
            }
        }
        Ok(scheduler)
    }

    pub fn add_pass(&mut self, slot: PassSlot, pass: Box<dyn FunctionPass>) {
        debug!(slot = %slot, pass = pass.pass_tag(), "pass scheduled");
        self.slots[slot.index()].push(pass);
    }

    /// Tags scheduled in `slot`, in order
    pub fn pass_tags(&self, slot: PassSlot) -> Vec<&'static str> {
        self.slots[slot.index()]
            .iter()
            .map(|pass| pass.pass_tag())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }

    pub fn execute_slot(
        &self,
        slot: PassSlot,
        group: &mut FunctionGroup,
        config: &ValidatedConfig,
    ) -> Result<()> {
        let ctx = GroupContext::new(config);
        for pass in &self.slots[slot.index()] {
            info!(
                slot = %slot,
                pass = pass.pass_tag(),
                description = pass.description(),
                functions = group.len(),
                "running pass"
            );
            pass.execute_on_fct_group(group, &ctx)?;
        }
        Ok(())
    }

    pub fn execute_all(&self, group: &mut FunctionGroup, config: &ValidatedConfig) -> Result<()> {
        for slot in PassSlot::ALL {
            self.execute_slot(slot, group, config)?;
        }
        Ok(())
    }
}

/// Run the configured schedule with the default registry over `group`
pub fn transform_function_group(group: &mut FunctionGroup, config: &ValidatedConfig) -> Result<()> {
    let registry = PassRegistry::with_defaults();
    PassScheduler::from_config(config, &registry)?.execute_all(group, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineConfig, ScheduleConfig};
    use crate::errors::CodegenError;
    use crate::pipeline::function::CodeFunction;
    use crate::shared::models::IrArena;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingPass(Arc<AtomicUsize>);

    impl FunctionPass for CountingPass {
        fn pass_tag(&self) -> &'static str {
            "count"
        }

        fn description(&self) -> &'static str {
            "count functions"
        }

        fn execute_on_function(
            &self,
            _function: &mut crate::pipeline::function::CodeFunction,
            _ctx: &GroupContext<'_>,
        ) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn group_of(names: &[&str]) -> FunctionGroup {
        names
            .iter()
            .map(|name| {
                let mut arena = IrArena::new();
                let ret = arena.ret(None);
                CodeFunction::new(*name, arena, Vec::new(), ret)
            })
            .collect()
    }

    #[test]
    fn test_default_schedule() {
        let config = ValidatedConfig::default();
        let scheduler = PassScheduler::from_config(&config, &PassRegistry::with_defaults()).unwrap();
        assert_eq!(
            scheduler.pass_tags(PassSlot::JustBeforeCodeGen),
            vec!["gen_basic_block", "ssa_translation"]
        );
        assert!(scheduler.pass_tags(PassSlot::Start).is_empty());
    }

    #[test]
    fn test_pass_sees_every_function() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = PassScheduler::new();
        scheduler.add_pass(PassSlot::Start, Box::new(CountingPass(counter.clone())));
        scheduler.add_pass(PassSlot::Optimization, Box::new(CountingPass(counter.clone())));

        let mut group = group_of(&["a", "b", "c"]);
        scheduler
            .execute_all(&mut group, &ValidatedConfig::default())
            .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_slot_order_is_enforced() {
        let mut group = group_of(&["f"]);
        let config = PipelineConfig::new()
            .schedule(ScheduleConfig {
                start: vec!["ssa_translation".to_string()],
                ..ScheduleConfig::empty()
            })
            .build()
            .unwrap();

        let err = transform_function_group(&mut group, &config).unwrap_err();
        match err {
            CodegenError::PassFailed { pass, function, .. } => {
                assert_eq!(pass, "ssa_translation");
                assert_eq!(function, "f");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(group.functions()[0].is_structured());
    }

    #[test]
    fn test_transform_default_schedule() {
        let mut group = group_of(&["f", "g"]);
        transform_function_group(&mut group, &ValidatedConfig::default()).unwrap();
        assert!(group.functions().iter().all(|f| !f.is_structured()));
    }
}
