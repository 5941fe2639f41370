//! Control Flow Graph edges

use crate::shared::models::BlockId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CFGEdgeKind {
    Unconditional,
    TrueBranch,
    FalseBranch,
}

/// Directed (source → target) edge derived from a block terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CFGEdge {
    pub source: BlockId,
    pub target: BlockId,
    pub kind: CFGEdgeKind,
}

impl CFGEdge {
    pub fn new(source: BlockId, target: BlockId, kind: CFGEdgeKind) -> Self {
        Self {
            source,
            target,
            kind,
        }
    }

    /// Edge whose target precedes or equals its source in layout order
    pub fn is_back_edge(&self, layout: &[BlockId]) -> bool {
        let position = |id: BlockId| layout.iter().position(|b| *b == id);
        match (position(self.source), position(self.target)) {
            (Some(source), Some(target)) => target <= source,
            _ => false,
        }
    }
}
