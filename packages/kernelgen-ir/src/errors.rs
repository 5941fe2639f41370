//! Error types for kernelgen-ir
//!
//! Provides unified error handling across the crate.

use crate::config::ConfigError;
use crate::features::ssa::infrastructure::errors::SSAError;
use thiserror::Error;

/// Main error type for kernelgen-ir operations
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Dominance / SSA construction error
    #[error("SSA error: {0}")]
    Ssa(#[from] SSAError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Structured IR that cannot be lowered to basic blocks
    #[error("Lowering error: {0}")]
    Lowering(String),

    /// Pass applied to a function in the wrong representation
    #[error("Pass '{pass}' expects function '{function}' in {expected} form")]
    UnexpectedScheme {
        pass: String,
        function: String,
        expected: &'static str,
    },

    /// No pass registered under this tag
    #[error("Unknown pass '{0}'")]
    UnknownPass(String),

    /// A pass failed on one function; the function was left unchanged
    #[error("Pass '{pass}' failed on function '{function}': {source}")]
    PassFailed {
        pass: String,
        function: String,
        #[source]
        source: Box<CodegenError>,
    },
}

impl CodegenError {
    /// Create a lowering error
    pub fn lowering(msg: impl Into<String>) -> Self {
        CodegenError::Lowering(msg.into())
    }

    /// Wrap `self` with the pass and function it came from
    pub fn in_pass(self, pass: impl Into<String>, function: impl Into<String>) -> Self {
        CodegenError::PassFailed {
            pass: pass.into(),
            function: function.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, unwrapping pass-failure layers
    pub fn root_cause(&self) -> &CodegenError {
        match self {
            CodegenError::PassFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type alias for kernelgen operations
pub type Result<T> = std::result::Result<T, CodegenError>;
