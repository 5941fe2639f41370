//! Basic blocks and the per-function block list
//!
//! A block is an ordered sequence of instruction handles into the
//! function's [`IrArena`]. Blocks are created by lowering, filled
//! incrementally, then sealed into the owning [`BasicBlockList`] in the
//! order they are closed; that sealed order is the function layout.

use crate::shared::models::{BlockId, IrArena, Node, NodeId};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    tag: String,
    instructions: Vec<NodeId>,
    /// Set once a `Return` is appended; the block accepts nothing after it
    #[serde(rename = "final")]
    is_final: bool,
}

impl BasicBlock {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            instructions: Vec::new(),
            is_final: false,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn instructions(&self) -> &[NodeId] {
        &self.instructions
    }

    pub(crate) fn instructions_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn mark_final(&mut self) {
        self.is_final = true;
    }

    pub fn last(&self) -> Option<NodeId> {
        self.instructions.last().copied()
    }

    /// Last instruction if it is a branch or a return
    pub fn terminator(&self, arena: &IrArena) -> Option<NodeId> {
        self.last().filter(|id| arena.node(*id).is_terminator())
    }

    /// Successor blocks in terminator order, without repeats
    pub fn successors(&self, arena: &IrArena) -> Vec<BlockId> {
        let mut successors = Vec::new();
        if let Some(terminator) = self.terminator(arena) {
            for target in arena.node(terminator).branch_targets() {
                if !successors.contains(&target) {
                    successors.push(target);
                }
            }
        }
        successors
    }

    /// False once the block is final or already ends with a terminator
    pub fn accepts_instructions(&self, arena: &IrArena) -> bool {
        !self.is_final && self.terminator(arena).is_none()
    }

    /// Append `node`; returns false (and drops the node) if the block no
    /// longer accepts instructions. Appending a `Return` makes the block final.
    pub fn push(&mut self, arena: &IrArena, node: NodeId) -> bool {
        if !self.accepts_instructions(arena) {
            debug!(
                block = %self.tag,
                node = %arena.describe(node),
                "instruction dropped after block terminator"
            );
            return false;
        }
        self.instructions.push(node);
        if matches!(arena.node(node), Node::Return { .. }) {
            self.is_final = true;
        }
        true
    }

    /// Number of leading phi instructions
    pub fn phi_count(&self, arena: &IrArena) -> usize {
        self.instructions
            .iter()
            .take_while(|id| arena.node(**id).is_phi())
            .count()
    }

    pub fn phis(&self, arena: &IrArena) -> Vec<NodeId> {
        self.instructions[..self.phi_count(arena)].to_vec()
    }

    /// Insert a phi at the head of the block, after the phis already there
    pub fn insert_phi(&mut self, arena: &IrArena, phi: NodeId) {
        let position = self.phi_count(arena);
        self.instructions.insert(position, phi);
    }
}

/// Blocks of one function body plus its entry block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlockList {
    tag: String,
    blocks: Vec<BasicBlock>,
    sealed: Vec<BlockId>,
    entry: BlockId,
}

impl BasicBlockList {
    /// New list whose (not yet sealed) entry block is tagged `entry_tag`
    pub fn new(tag: impl Into<String>, entry_tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            blocks: vec![BasicBlock::new(entry_tag)],
            sealed: Vec::new(),
            entry: BlockId::new(0),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    /// Allocate an open block; it joins the layout only once sealed
    pub fn create_block(&mut self, tag: impl Into<String>) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        self.blocks.push(BasicBlock::new(tag));
        id
    }

    /// Append `id` to the sealed layout. Sealing twice is a no-op.
    pub fn seal(&mut self, id: BlockId) -> bool {
        if self.is_sealed(id) || id.index() >= self.blocks.len() {
            return false;
        }
        self.sealed.push(id);
        true
    }

    /// Create and immediately seal a block
    pub fn add_block(&mut self, tag: impl Into<String>) -> BlockId {
        let id = self.create_block(tag);
        self.sealed.push(id);
        id
    }

    pub fn is_sealed(&self, id: BlockId) -> bool {
        self.sealed.contains(&id)
    }

    /// Number of sealed blocks
    pub fn len(&self) -> usize {
        self.sealed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sealed.is_empty()
    }

    /// Sealed blocks in layout order
    pub fn ids(&self) -> &[BlockId] {
        &self.sealed
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &BasicBlock)> {
        self.sealed.iter().map(move |id| (*id, &self.blocks[id.index()]))
    }

    pub fn get(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    /// Panics on a handle minted by another list
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.index()]
    }

    pub fn append(&mut self, arena: &IrArena, id: BlockId, node: NodeId) -> bool {
        self.block_mut(id).push(arena, node)
    }

    /// Block tag, or `bbN` for a foreign handle
    pub fn block_tag(&self, id: BlockId) -> String {
        self.get(id)
            .map(|block| block.tag().to_string())
            .unwrap_or_else(|| id.to_string())
    }
}

/// A function body in basic-block form: the block list and the arena
/// every instruction handle points into
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionBody {
    pub arena: IrArena,
    pub blocks: BasicBlockList,
}

impl FunctionBody {
    pub fn new(arena: IrArena, blocks: BasicBlockList) -> Self {
        Self { arena, blocks }
    }

    /// JSON snapshot for downstream code generation
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
