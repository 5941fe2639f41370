/*
 * Structured IR → Basic Blocks
 *
 * Recursive lowering of Statement / ConditionBlock / Loop / Return trees into
 * a BasicBlockList. The lowering context keeps a stack of open blocks; the
 * top of the stack receives every appended instruction.
 *
 * Block shapes:
 *   conditional: entry --cbranch--> if_k / (else_k | join_k), branch ends --> join_k
 *   loop:        pre-header --> header --cbranch--> body / exit, body end --> header
 */

use crate::config::LoweringConfig;
use crate::errors::{CodegenError, Result};
use crate::features::flow_graph::domain::BasicBlockList;
use crate::shared::models::{BlockId, IrArena, Node, NodeId};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Lower the structured tree rooted at `root` into a new block list.
///
/// Branch and return nodes are allocated in `arena`. The first sealed block
/// is the entry block, tagged `config.entry_tag`.
pub fn generate_basic_blocks(
    arena: &mut IrArena,
    root: NodeId,
    tag: &str,
    config: &LoweringConfig,
) -> Result<BasicBlockList> {
    let mut ctx = LoweringContext::new(arena, tag, config);
    ctx.lower(root)?;
    ctx.finish()
}

struct LoweringContext<'a> {
    arena: &'a mut IrArena,
    config: &'a LoweringConfig,
    blocks: BasicBlockList,
    /// Open blocks, last element current
    stack: Vec<BlockId>,
    /// Suffix of the next block tag
    next_index: usize,
    /// Blocks some branch points at
    targeted: FxHashSet<BlockId>,
}

impl<'a> LoweringContext<'a> {
    fn new(arena: &'a mut IrArena, tag: &str, config: &'a LoweringConfig) -> Self {
        let blocks = BasicBlockList::new(tag, config.entry_tag.as_str());
        let entry = blocks.entry();
        Self {
            arena,
            config,
            blocks,
            stack: vec![entry],
            next_index: 1,
            targeted: FxHashSet::default(),
        }
    }

    fn current(&self) -> Result<BlockId> {
        self.stack
            .last()
            .copied()
            .ok_or_else(|| CodegenError::lowering("no open basic block"))
    }

    fn push_block(&mut self, prefix: &str) -> BlockId {
        let tag = format!("{}_{}", prefix, self.next_index);
        self.next_index += 1;
        let id = self.blocks.create_block(tag);
        self.stack.push(id);
        id
    }

    /// Close the current block, sealing it if non-empty or `force`d
    fn pop_block(&mut self, force: bool) -> Result<BlockId> {
        let id = self
            .stack
            .pop()
            .ok_or_else(|| CodegenError::lowering("block stack underflow"))?;
        if force || !self.blocks.block(id).is_empty() {
            self.blocks.seal(id);
        } else {
            debug!(block = %self.blocks.block_tag(id), "empty block discarded");
        }
        Ok(id)
    }

    fn append(&mut self, node: NodeId) -> Result<BlockId> {
        let current = self.current()?;
        self.blocks.append(self.arena, current, node);
        Ok(current)
    }

    /// Append a terminator to an already closed block
    fn attach(&mut self, block: BlockId, terminator: NodeId) {
        let targets = self.arena.node(terminator).branch_targets();
        if self.blocks.append(self.arena, block, terminator) {
            self.targeted.extend(targets);
        }
    }

    /// Lower `node` into the current block; returns the block the construct
    /// starts in.
    fn lower(&mut self, node: NodeId) -> Result<BlockId> {
        match self.arena.node(node).clone() {
            Node::Statement { children } => {
                let entry = self.current()?;
                for child in children {
                    self.lower(child)?;
                }
                Ok(entry)
            }
            Node::ConditionBlock {
                cond,
                if_branch,
                else_branch,
            } => self.lower_condition(cond, if_branch, else_branch),
            Node::Loop { init, cond, body } => self.lower_loop(init, cond, body),
            Node::Return { .. }
            | Node::Variable { .. }
            | Node::Constant { .. }
            | Node::Operation { .. }
            | Node::ReferenceAssign { .. } => self.append(node),
            other @ (Node::UnconditionalBranch { .. }
            | Node::ConditionalBranch { .. }
            | Node::Phi { .. }) => Err(CodegenError::lowering(format!(
                "{} {} cannot appear in structured IR",
                other.kind_name(),
                node
            ))),
        }
    }

    fn lower_condition(
        &mut self,
        cond: NodeId,
        if_branch: NodeId,
        else_branch: Option<NodeId>,
    ) -> Result<BlockId> {
        let entry = self.pop_block(true)?;

        let if_entry = self.push_block("if");
        self.lower(if_branch)?;
        let if_end = self.pop_block(true)?;

        let else_blocks = match else_branch {
            Some(else_branch) => {
                let else_entry = self.push_block("else");
                self.lower(else_branch)?;
                let else_end = self.pop_block(true)?;
                Some((else_entry, else_end))
            }
            None => None,
        };

        let join = self.push_block("join");
        let false_target = else_blocks.map_or(join, |(else_entry, _)| else_entry);

        let branch = self.arena.cond_branch(cond, if_entry, false_target);
        self.attach(entry, branch);
        let to_join = self.arena.branch(join);
        self.attach(if_end, to_join);
        if let Some((_, else_end)) = else_blocks {
            let to_join = self.arena.branch(join);
            self.attach(else_end, to_join);
        }

        debug!(
            entry = %self.blocks.block_tag(entry),
            join = %self.blocks.block_tag(join),
            has_else = else_branch.is_some(),
            "lowered conditional"
        );
        Ok(entry)
    }

    fn lower_loop(&mut self, init: NodeId, cond: NodeId, body: NodeId) -> Result<BlockId> {
        self.lower(init)?;
        let pre_header = self.pop_block(true)?;

        let header = self.push_block("loop_header");
        self.pop_block(true)?;

        let body_entry = self.push_block("loop_body");
        self.lower(body)?;
        let body_end = self.pop_block(true)?;
        let back_edge = self.arena.branch(header);
        self.attach(body_end, back_edge);

        let exit = self.push_block("loop_exit");
        let branch = self.arena.cond_branch(cond, body_entry, exit);
        self.attach(header, branch);
        let enter = self.arena.branch(header);
        self.attach(pre_header, enter);

        debug!(
            pre_header = %self.blocks.block_tag(pre_header),
            header = %self.blocks.block_tag(header),
            exit = %self.blocks.block_tag(exit),
            "lowered loop"
        );
        Ok(pre_header)
    }

    fn finish(mut self) -> Result<BasicBlockList> {
        let last = self.current()?;
        if self.config.implicit_return
            && self.blocks.block(last).accepts_instructions(self.arena)
        {
            let ret = self.arena.ret(None);
            self.blocks.append(self.arena, last, ret);
        }
        let force = last == self.blocks.entry() || self.targeted.contains(&last);
        self.pop_block(force)?;

        if !self.stack.is_empty() {
            return Err(CodegenError::lowering(format!(
                "{} block(s) left open after lowering",
                self.stack.len()
            )));
        }
        debug!(
            function = %self.blocks.tag(),
            blocks = self.blocks.len(),
            "basic block generation done"
        );
        Ok(self.blocks)
    }
}
