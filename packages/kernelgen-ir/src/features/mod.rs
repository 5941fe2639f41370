//! Feature modules
//!
//! Each feature contains:
//! - domain/         - Data structures (no pass logic)
//! - infrastructure/ - Algorithms
//! - application/    - Passes exposed to the scheduler

pub mod flow_graph;
pub mod ssa;
