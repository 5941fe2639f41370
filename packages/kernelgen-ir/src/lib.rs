/*
 * kernelgen IR - structured IR → basic blocks → SSA
 *
 * Feature-First Architecture:
 * - shared/      : Arena-backed IR nodes and handles
 * - features/    : Vertical slices (flow_graph → ssa)
 * - pipeline/    : Functions, passes, registry, scheduler
 * - config/      : Pipeline configuration (builder + YAML)
 *
 * Single-threaded and synchronous; every analysis is bound to one graph
 * snapshot and rebuilt after structural edits.
 */

// Crate-level lint configuration
#![allow(clippy::upper_case_acronyms)] // SSA, CFG naming
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed

/// Shared models (IR arena, node kinds, handles)
pub mod shared;

/// Feature modules (lowering, SSA construction)
pub mod features;

/// Pass pipeline
pub mod pipeline;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{PipelineConfig, ValidatedConfig};
pub use errors::{CodegenError, Result};
pub use features::flow_graph::{
    generate_basic_blocks, render_block_list, BasicBlock, BasicBlockList, CFGEdge, CFGEdgeKind,
    FunctionBody,
};
pub use features::ssa::{translate_to_ssa, BasicBlockGraph, SSAError, SSAResult};
pub use pipeline::{
    transform_function_group, CodeFunction, FunctionGroup, FunctionPass, FunctionScheme,
    PassRegistry, PassScheduler, PassSlot,
};
pub use shared::models::{BlockId, IrArena, Node, NodeId};
