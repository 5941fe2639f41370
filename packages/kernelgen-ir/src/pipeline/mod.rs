//! Pass pipeline
//!
//! - [`function`]: `CodeFunction`, `FunctionScheme`, `FunctionGroup`
//! - [`pass`]: the `FunctionPass` trait
//! - [`registry`]: tag → pass factory
//! - [`scheduler`]: ordered slots, `execute_all`

pub mod function;
pub mod pass;
pub mod registry;
pub mod scheduler;

pub use function::{CodeFunction, FunctionGroup, FunctionScheme};
pub use pass::{FunctionPass, GroupContext};
pub use registry::{PassFactory, PassRegistry, BUILTIN_PASS_TAGS};
pub use scheduler::{transform_function_group, PassScheduler, PassSlot};
