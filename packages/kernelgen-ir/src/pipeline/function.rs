//! Functions and function groups handed to the pass scheduler

use crate::features::flow_graph::domain::{BasicBlockList, FunctionBody};
use crate::shared::models::{IrArena, NodeId};
use serde::{Deserialize, Serialize};

/// Current representation of a function body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum FunctionScheme {
    /// Structured tree rooted at a node of the function arena
    Structured { root: NodeId },
    /// Basic-block list (after `gen_basic_block`, SSA after `ssa_translation`)
    BasicBlocks { blocks: BasicBlockList },
}

impl FunctionScheme {
    pub fn form_name(&self) -> &'static str {
        match self {
            FunctionScheme::Structured { .. } => "structured",
            FunctionScheme::BasicBlocks { .. } => "basic-block",
        }
    }
}

/// A function: its node arena, input variables and current scheme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeFunction {
    pub name: String,
    pub arena: IrArena,
    pub arguments: Vec<NodeId>,
    pub scheme: FunctionScheme,
}

impl CodeFunction {
    pub fn new(name: impl Into<String>, arena: IrArena, arguments: Vec<NodeId>, root: NodeId) -> Self {
        Self {
            name: name.into(),
            arena,
            arguments,
            scheme: FunctionScheme::Structured { root },
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self.scheme, FunctionScheme::Structured { .. })
    }

    pub fn blocks(&self) -> Option<&BasicBlockList> {
        match &self.scheme {
            FunctionScheme::BasicBlocks { blocks } => Some(blocks),
            FunctionScheme::Structured { .. } => None,
        }
    }

    /// Copy of the arena and block list, `None` while still structured
    pub fn body(&self) -> Option<FunctionBody> {
        self.blocks()
            .map(|blocks| FunctionBody::new(self.arena.clone(), blocks.clone()))
    }

    /// Replace arena and scheme with a lowered / transformed body
    pub fn commit(&mut self, body: FunctionBody) {
        self.arena = body.arena;
        self.scheme = FunctionScheme::BasicBlocks {
            blocks: body.blocks,
        };
    }
}

/// Ordered set of functions processed together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionGroup {
    functions: Vec<CodeFunction>,
}

impl FunctionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, function: CodeFunction) {
        self.functions.push(function);
    }

    pub fn with_function(mut self, function: CodeFunction) -> Self {
        self.add_function(function);
        self
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn functions(&self) -> &[CodeFunction] {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut [CodeFunction] {
        &mut self.functions
    }

    pub fn function(&self, name: &str) -> Option<&CodeFunction> {
        self.functions.iter().find(|f| f.name == name)
    }
}

impl FromIterator<CodeFunction> for FunctionGroup {
    fn from_iter<I: IntoIterator<Item = CodeFunction>>(iter: I) -> Self {
        Self {
            functions: iter.into_iter().collect(),
        }
    }
}
