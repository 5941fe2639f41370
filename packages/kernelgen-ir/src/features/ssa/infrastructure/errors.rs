/*
 * SSA Error Types
 *
 * Errors raised while analysing a basic-block graph and rewriting it
 * into SSA form:
 * - CFG shape errors
 * - Definition / use resolution errors
 * - Phi node errors
 */

use std::fmt;

/// SSA Error Type
#[derive(Debug, Clone, PartialEq)]
pub enum SSAError {
    /// Function body without any block
    EmptyInput { message: String },

    /// Block handle not owned by the graph
    BlockNotFound { block_id: String },

    /// Invalid CFG structure (e.g., branch to a foreign block)
    InvalidCFG { reason: String },

    /// Variable used with no reaching definition (use before def)
    UndefinedVariable { variable: String, block_id: String },

    /// Variable referenced by a definition has no recorded definition site
    MissingDefinition { variable: String },

    /// Non-variable node reachable from a block but absent from the block map
    NodeNotAssigned { node: String },

    /// Same SSA name defined twice after renaming
    DuplicateDefinition { variable: String, block_id: String },

    /// Phi node construction error
    PhiNodeError { variable: String, reason: String },

    /// Iterative dominance fixpoint did not settle
    DominanceNotConverged { iterations: usize },

    /// Internal error (broken invariant)
    Internal { message: String },
}

impl fmt::Display for SSAError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SSAError::EmptyInput { message } => {
                write!(f, "Empty input: {}", message)
            }
            SSAError::BlockNotFound { block_id } => {
                write!(f, "Block not found: '{}'", block_id)
            }
            SSAError::InvalidCFG { reason } => {
                write!(f, "Invalid CFG: {}", reason)
            }
            SSAError::UndefinedVariable { variable, block_id } => {
                write!(
                    f,
                    "Undefined variable '{}' in block '{}'",
                    variable, block_id
                )
            }
            SSAError::MissingDefinition { variable } => {
                write!(f, "No definition site recorded for variable '{}'", variable)
            }
            SSAError::NodeNotAssigned { node } => {
                write!(f, "Node {} is not assigned to any basic block", node)
            }
            SSAError::DuplicateDefinition { variable, block_id } => {
                write!(
                    f,
                    "Variable '{}' defined more than once (again in block '{}')",
                    variable, block_id
                )
            }
            SSAError::PhiNodeError { variable, reason } => {
                write!(f, "Phi node error for '{}': {}", variable, reason)
            }
            SSAError::DominanceNotConverged { iterations } => {
                write!(
                    f,
                    "Dominator sets did not converge after {} iterations",
                    iterations
                )
            }
            SSAError::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for SSAError {}

/// Result type for SSA operations
pub type SSAResult<T> = Result<T, SSAError>;
