//! Structural checks on basic-block and SSA form
//!
//! `verify_cfg` checks block shape only; `verify_ssa` additionally needs
//! dominance and therefore works on a [`BasicBlockGraph`].

use super::errors::{SSAError, SSAResult};
use super::graph::BasicBlockGraph;
use crate::features::flow_graph::domain::BasicBlockList;
use crate::shared::models::{BlockId, IrArena, Node, NodeId, VariableKind};
use rustc_hash::{FxHashMap, FxHashSet};

/// Every sealed block ends with exactly one terminator, phis only lead a
/// block, and every branch target is a sealed block of the list.
pub fn verify_cfg(blocks: &BasicBlockList, arena: &IrArena) -> SSAResult<()> {
    for (id, block) in blocks.iter() {
        let tag = block.tag();
        let instructions = block.instructions();
        let Some(last) = instructions.last() else {
            return Err(SSAError::InvalidCFG {
                reason: format!("block '{}' is empty", tag),
            });
        };
        if !arena.node(*last).is_terminator() {
            return Err(SSAError::InvalidCFG {
                reason: format!("block '{}' does not end with a terminator", tag),
            });
        }

        let phi_count = block.phi_count(arena);
        for (index, instruction) in instructions.iter().enumerate() {
            let node = arena.node(*instruction);
            if node.is_terminator() && index + 1 != instructions.len() {
                return Err(SSAError::InvalidCFG {
                    reason: format!("terminator in the middle of block '{}'", tag),
                });
            }
            if node.is_phi() && index >= phi_count {
                return Err(SSAError::PhiNodeError {
                    variable: arena.describe(*instruction),
                    reason: format!("phi after a non-phi instruction in '{}'", tag),
                });
            }
            if node.is_structured() {
                return Err(SSAError::InvalidCFG {
                    reason: format!("{} left in block '{}'", node.kind_name(), tag),
                });
            }
        }

        for target in arena.node(*last).branch_targets() {
            if !blocks.is_sealed(target) {
                return Err(SSAError::BlockNotFound {
                    block_id: format!("{} (branch target in '{}')", target, blocks.block_tag(id)),
                });
            }
        }
    }
    Ok(())
}

/// Single assignment, dominating definitions for every use, and complete
/// phis (one filled operand per reachable predecessor). Unreachable blocks
/// are not checked.
pub fn verify_ssa(graph: &BasicBlockGraph) -> SSAResult<()> {
    let arena = graph.arena();
    let blocks = graph.blocks();

    // definition → (block, instruction index)
    let mut definitions: FxHashMap<NodeId, (BlockId, usize)> = FxHashMap::default();
    for &block in graph.layout() {
        if !graph.is_reachable(block) {
            continue;
        }
        for (index, instruction) in blocks.block(block).instructions().iter().enumerate() {
            let target = match arena.node(*instruction) {
                Node::ReferenceAssign { target, .. } | Node::Phi { target, .. } => *target,
                _ => continue,
            };
            if definitions.insert(target, (block, index)).is_some() {
                return Err(SSAError::DuplicateDefinition {
                    variable: arena.describe(target),
                    block_id: graph.block_tag(block),
                });
            }
        }
    }

    let defined_before = |variable: NodeId, block: BlockId, index: usize| -> SSAResult<bool> {
        if is_input(arena, variable) {
            return Ok(true);
        }
        match definitions.get(&variable) {
            Some((def_block, def_index)) if *def_block == block => Ok(*def_index < index),
            Some((def_block, _)) => graph.dominates(*def_block, block),
            None => Ok(false),
        }
    };

    for &block in graph.layout() {
        if !graph.is_reachable(block) {
            continue;
        }
        let reachable_preds: FxHashSet<BlockId> = graph
            .predecessors(block)
            .iter()
            .copied()
            .filter(|pred| graph.is_reachable(*pred))
            .collect();

        for (index, instruction) in blocks.block(block).instructions().iter().enumerate() {
            let node = arena.node(*instruction);
            if let Node::Phi {
                target, operands, ..
            } = node
            {
                let filled: FxHashSet<BlockId> =
                    operands.iter().filter_map(|o| o.predecessor).collect();
                if operands.iter().any(|o| o.is_empty())
                    || filled != reachable_preds
                    || filled.len() != operands.len()
                {
                    return Err(SSAError::PhiNodeError {
                        variable: arena.describe(*target),
                        reason: format!(
                            "operands do not match the predecessors of '{}'",
                            graph.block_tag(block)
                        ),
                    });
                }
                for operand in operands {
                    if let (Some(value), Some(pred)) = (operand.value, operand.predecessor) {
                        let last = blocks.block(pred).len();
                        if !defined_before(value, pred, last)? {
                            return Err(SSAError::UndefinedVariable {
                                variable: arena.describe(value),
                                block_id: graph.block_tag(pred),
                            });
                        }
                    }
                }
                continue;
            }

            for variable in used_variables(arena, *instruction) {
                if !defined_before(variable, block, index)? {
                    return Err(SSAError::UndefinedVariable {
                        variable: arena.describe(variable),
                        block_id: graph.block_tag(block),
                    });
                }
            }
        }
    }
    Ok(())
}

fn is_input(arena: &IrArena, variable: NodeId) -> bool {
    matches!(
        arena.node(variable),
        Node::Variable {
            kind: VariableKind::Input,
            ..
        }
    )
}

/// Variables read by `instruction` (assignment targets excluded)
fn used_variables(arena: &IrArena, instruction: NodeId) -> Vec<NodeId> {
    let root = arena.node(instruction);
    let mut used = Vec::new();
    let mut seen = FxHashSet::default();
    let mut stack: Vec<NodeId> = root
        .inputs()
        .into_iter()
        .skip(root.defined_input_count())
        .collect();
    while let Some(node) = stack.pop() {
        if !seen.insert(node) {
            continue;
        }
        if arena.is_variable(node) {
            used.push(node);
        } else {
            stack.extend(arena.node(node).inputs());
        }
    }
    used
}
