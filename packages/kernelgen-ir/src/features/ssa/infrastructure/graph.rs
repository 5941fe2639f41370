//! Basic block graph with memoized analyses
//!
//! Wraps one [`FunctionBody`] snapshot. Analyses (variables, definition
//! sites, CFG edges, dominators, dominator tree, frontier) are computed on
//! first use and never invalidated; a structural edit consumes the graph and
//! a new one must be built on the edited body.

use super::dominance::{
    build_dominator_tree, compute_cfg_edges, compute_dominance_frontier, compute_dominator_sets,
    compute_immediate_dominators, compute_immediate_dominators_fast, compute_predecessors,
    compute_reachable, DominanceFrontier, DominatorSets, DominatorTree, ImmediateDominators,
};
use super::errors::{SSAError, SSAResult};
use super::node_assignment::{assign_nodes_to_blocks, NodeBlockMap};
use crate::config::{DominanceAlgorithm, DominanceConfig};
use crate::features::flow_graph::domain::{BasicBlockList, CFGEdge, FunctionBody};
use crate::shared::models::{BlockId, IrArena, Node, NodeId, VariableKind};
use once_cell::unsync::OnceCell;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

pub struct BasicBlockGraph {
    body: FunctionBody,
    config: DominanceConfig,
    /// Established at construction: resolving shared nodes may copy them
    bb_map: NodeBlockMap,
    variables: OnceCell<Vec<NodeId>>,
    variable_defs: OnceCell<FxHashMap<NodeId, Vec<BlockId>>>,
    cfg_edges: OnceCell<Vec<CFGEdge>>,
    predecessors: OnceCell<FxHashMap<BlockId, Vec<BlockId>>>,
    reachable: OnceCell<FxHashSet<BlockId>>,
    dominators: OnceCell<DominatorSets>,
    immediate_dominators: OnceCell<ImmediateDominators>,
    dominator_tree: OnceCell<DominatorTree>,
    dominance_frontier: OnceCell<DominanceFrontier>,
}

impl BasicBlockGraph {
    /// Take ownership of `body`, check its shape and assign every node to
    /// exactly one block.
    pub fn new(mut body: FunctionBody, config: DominanceConfig) -> SSAResult<Self> {
        validate_shape(&body)?;
        let bb_map = assign_nodes_to_blocks(&mut body.arena, &mut body.blocks);
        Ok(Self {
            body,
            config,
            bb_map,
            variables: OnceCell::new(),
            variable_defs: OnceCell::new(),
            cfg_edges: OnceCell::new(),
            predecessors: OnceCell::new(),
            reachable: OnceCell::new(),
            dominators: OnceCell::new(),
            immediate_dominators: OnceCell::new(),
            dominator_tree: OnceCell::new(),
            dominance_frontier: OnceCell::new(),
        })
    }

    pub fn body(&self) -> &FunctionBody {
        &self.body
    }

    /// Give the body back, dropping every cached analysis
    pub fn into_body(self) -> FunctionBody {
        self.body
    }

    pub fn arena(&self) -> &IrArena {
        &self.body.arena
    }

    pub fn blocks(&self) -> &BasicBlockList {
        &self.body.blocks
    }

    pub fn entry(&self) -> BlockId {
        self.body.blocks.entry()
    }

    pub fn layout(&self) -> &[BlockId] {
        self.body.blocks.ids()
    }

    pub fn block_tag(&self, block: BlockId) -> String {
        self.body.blocks.block_tag(block)
    }

    // ------------------------------------------------------------------
    // Node / variable tables
    // ------------------------------------------------------------------

    pub fn bb_map(&self) -> &NodeBlockMap {
        &self.bb_map
    }

    /// Owning block of a non-variable node
    pub fn block_of(&self, node: NodeId) -> SSAResult<BlockId> {
        self.bb_map
            .get(&node)
            .copied()
            .ok_or_else(|| SSAError::NodeNotAssigned {
                node: self.arena().describe(node),
            })
    }

    /// Every variable referenced from an instruction, in handle order
    pub fn variables(&self) -> &[NodeId] {
        self.variables.get_or_init(|| {
            let arena = self.arena();
            let mut found: BTreeSet<NodeId> = BTreeSet::new();
            let mut seen: FxHashSet<NodeId> = FxHashSet::default();
            let mut stack: Vec<NodeId> = self
                .body
                .blocks
                .iter()
                .flat_map(|(_, block)| block.instructions().iter().copied())
                .collect();
            while let Some(node) = stack.pop() {
                if !seen.insert(node) {
                    continue;
                }
                match arena.node(node) {
                    Node::Variable { .. } => {
                        found.insert(node);
                    }
                    Node::Phi { variable, .. } => {
                        found.insert(*variable);
                    }
                    other => stack.extend(other.inputs()),
                }
            }
            found.into_iter().collect()
        })
    }

    /// Variable → blocks holding a definition, in layout order. Input
    /// variables are defined on entry.
    pub fn variable_defs(&self) -> &FxHashMap<NodeId, Vec<BlockId>> {
        self.variable_defs.get_or_init(|| {
            let arena = self.arena();
            let mut defs: FxHashMap<NodeId, Vec<BlockId>> = FxHashMap::default();
            let mut record = |variable: NodeId, block: BlockId| {
                let sites = defs.entry(variable).or_default();
                if !sites.contains(&block) {
                    sites.push(block);
                }
            };

            for variable in self.variables() {
                if matches!(
                    arena.node(*variable),
                    Node::Variable {
                        kind: VariableKind::Input,
                        ..
                    }
                ) {
                    record(*variable, self.entry());
                }
            }
            for (block_id, block) in self.body.blocks.iter() {
                for instruction in block.instructions() {
                    match arena.node(*instruction) {
                        Node::ReferenceAssign { target, .. } if arena.is_variable(*target) => {
                            record(*target, block_id)
                        }
                        Node::Phi { variable, .. } => record(*variable, block_id),
                        _ => {}
                    }
                }
            }
            defs
        })
    }

    /// Definition blocks of `variable`; a variable never defined is an error
    pub fn def_blocks(&self, variable: NodeId) -> SSAResult<&[BlockId]> {
        self.variable_defs()
            .get(&variable)
            .map(Vec::as_slice)
            .ok_or_else(|| SSAError::MissingDefinition {
                variable: self.arena().describe(variable),
            })
    }

    // ------------------------------------------------------------------
    // CFG
    // ------------------------------------------------------------------

    pub fn cfg_edges(&self) -> &[CFGEdge] {
        self.cfg_edges
            .get_or_init(|| compute_cfg_edges(&self.body.blocks, &self.body.arena))
    }

    /// Distinct predecessors of `block`, in edge order
    pub fn predecessors(&self, block: BlockId) -> &[BlockId] {
        self.predecessors
            .get_or_init(|| compute_predecessors(self.cfg_edges()))
            .get(&block)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn successors(&self, block: BlockId) -> Vec<BlockId> {
        self.body.blocks.block(block).successors(&self.body.arena)
    }

    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.reachable().contains(&block)
    }

    fn reachable(&self) -> &FxHashSet<BlockId> {
        self.reachable
            .get_or_init(|| compute_reachable(self.entry(), self.cfg_edges()))
    }

    // ------------------------------------------------------------------
    // Dominance
    // ------------------------------------------------------------------

    pub fn dominators(&self) -> SSAResult<&DominatorSets> {
        self.dominators.get_or_try_init(|| {
            let predecessors = self
                .predecessors
                .get_or_init(|| compute_predecessors(self.cfg_edges()));
            compute_dominator_sets(
                self.layout(),
                self.entry(),
                predecessors,
                self.reachable(),
                self.config.max_iterations,
            )
        })
    }

    /// `a` dominates `b` (reflexive)
    pub fn dominates(&self, a: BlockId, b: BlockId) -> SSAResult<bool> {
        Ok(self
            .dominators()?
            .get(&b)
            .map(|set| set.contains(&a))
            .unwrap_or(false))
    }

    pub fn immediate_dominators(&self) -> SSAResult<&ImmediateDominators> {
        self.immediate_dominators.get_or_try_init(|| -> SSAResult<_> {
            Ok(match self.config.algorithm {
                DominanceAlgorithm::Iterative => {
                    compute_immediate_dominators(self.layout(), self.dominators()?)
                }
                DominanceAlgorithm::SimpleFast => {
                    compute_immediate_dominators_fast(self.layout(), self.entry(), self.cfg_edges())
                }
            })
        })
    }

    pub fn dominator_tree(&self) -> SSAResult<&DominatorTree> {
        self.dominator_tree.get_or_try_init(|| -> SSAResult<_> {
            Ok(build_dominator_tree(
                self.layout(),
                self.entry(),
                self.immediate_dominators()?,
            ))
        })
    }

    pub fn dominance_frontier(&self) -> SSAResult<&DominanceFrontier> {
        self.dominance_frontier.get_or_try_init(|| -> SSAResult<_> {
            Ok(compute_dominance_frontier(
                self.layout(),
                self.cfg_edges(),
                self.immediate_dominators()?,
                self.dominators()?,
                self.reachable(),
            ))
        })
    }

    /// Frontier of `block`; a block without an entry has an empty frontier
    pub fn frontier_of(&self, block: BlockId) -> SSAResult<Vec<BlockId>> {
        Ok(self
            .dominance_frontier()?
            .get(&block)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }
}

/// Non-empty layout, sealed entry, branch targets owned by the list
fn validate_shape(body: &FunctionBody) -> SSAResult<()> {
    let blocks = &body.blocks;
    if blocks.is_empty() {
        return Err(SSAError::EmptyInput {
            message: format!("function '{}' has no basic block", blocks.tag()),
        });
    }
    if !blocks.is_sealed(blocks.entry()) {
        return Err(SSAError::InvalidCFG {
            reason: format!("entry block '{}' is not sealed", blocks.block_tag(blocks.entry())),
        });
    }
    for (id, block) in blocks.iter() {
        let Some(terminator) = block.terminator(&body.arena) else {
            continue;
        };
        for target in body.arena.node(terminator).branch_targets() {
            if !blocks.is_sealed(target) {
                return Err(SSAError::BlockNotFound {
                    block_id: format!("{} (branch target in '{}')", target, blocks.block_tag(id)),
                });
            }
        }
    }
    Ok(())
}
