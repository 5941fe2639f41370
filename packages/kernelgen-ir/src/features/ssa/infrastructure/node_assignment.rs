//! Node → basic block assignment
//!
//! Every non-variable node reachable from a block instruction must belong to
//! exactly one block. When a node already owned by block A is reached again
//! from block B, B gets its own copy: constants are cloned, other nodes are
//! deep-copied down to (not including) their variable leaves, and the
//! referencing slot is re-linked to the copy. Variables are shared storage
//! and are never mapped.

use crate::features::flow_graph::domain::BasicBlockList;
use crate::shared::models::{BlockId, IrArena, NodeId};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

/// Owning block of every non-variable node reachable from an instruction
pub type NodeBlockMap = FxHashMap<NodeId, BlockId>;

/// Where a node handle was found
#[derive(Debug, Clone, Copy)]
enum Slot {
    /// Index into the current block's instruction list
    Instruction(usize),
    /// Operand position (in `Node::inputs` order) of a parent node
    Operand(NodeId, usize),
}

pub fn assign_nodes_to_blocks(arena: &mut IrArena, blocks: &mut BasicBlockList) -> NodeBlockMap {
    let mut owner: NodeBlockMap = FxHashMap::default();
    let mut duplicated = 0usize;
    let layout = blocks.ids().to_vec();

    for block in layout {
        // conflicting node -> its copy for this block, so sharing inside the
        // block survives duplication
        let mut replacements: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        let mut worklist: Vec<(NodeId, Slot)> = blocks
            .block(block)
            .instructions()
            .iter()
            .enumerate()
            .rev()
            .map(|(index, id)| (*id, Slot::Instruction(index)))
            .collect();

        while let Some((node, slot)) = worklist.pop() {
            if arena.is_variable(node) {
                continue;
            }

            let node = match owner.get(&node) {
                None => node,
                Some(current) if *current == block => continue,
                Some(current) => {
                    if let Some(copy) = replacements.get(&node) {
                        relink(arena, blocks, block, slot, *copy);
                        continue;
                    }
                    let copy = if arena.node(node).is_constant() {
                        arena.duplicate(node)
                    } else {
                        arena.copy_up_to_variables(node)
                    };
                    trace!(
                        node = %arena.describe(node),
                        owner = %blocks.block_tag(*current),
                        block = %blocks.block_tag(block),
                        copy = %copy,
                        "node shared across blocks duplicated"
                    );
                    duplicated += 1;
                    replacements.insert(node, copy);
                    relink(arena, blocks, block, slot, copy);
                    copy
                }
            };

            owner.insert(node, block);
            let inputs = arena.node(node).inputs();
            for (position, input) in inputs.into_iter().enumerate().rev() {
                worklist.push((input, Slot::Operand(node, position)));
            }
        }
    }

    debug!(
        function = %blocks.tag(),
        assigned = owner.len(),
        duplicated,
        "nodes assigned to basic blocks"
    );
    owner
}

fn relink(
    arena: &mut IrArena,
    blocks: &mut BasicBlockList,
    block: BlockId,
    slot: Slot,
    copy: NodeId,
) {
    match slot {
        Slot::Instruction(index) => {
            if let Some(instruction) = blocks.block_mut(block).instructions_mut().get_mut(index) {
                *instruction = copy;
            }
        }
        Slot::Operand(parent, position) => {
            if let Some(input) = arena.node_mut(parent).inputs_mut().into_iter().nth(position) {
                *input = copy;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::Node;

    fn two_blocks() -> (BasicBlockList, BlockId, BlockId) {
        let mut list = BasicBlockList::new("f", "main");
        let entry = list.entry();
        list.seal(entry);
        let other = list.add_block("other");
        (list, entry, other)
    }

    #[test]
    fn test_shared_expression_is_copied_into_second_block() {
        let mut arena = IrArena::new();
        let (mut list, entry, other) = two_blocks();
        let x = arena.local("x");
        let y = arena.local("y");
        let a = arena.input("a");
        let one = arena.constant(1);
        let expr = arena.add(a, one);
        let def_x = arena.assign(x, expr);
        let def_y = arena.assign(y, expr);
        list.append(&arena, entry, def_x);
        list.append(&arena, other, def_y);

        let map = assign_nodes_to_blocks(&mut arena, &mut list);

        let Node::ReferenceAssign { value, .. } = arena.node(def_y).clone() else {
            panic!("expected assignment");
        };
        assert_ne!(value, expr, "second use must be re-linked to a copy");
        assert_eq!(map[&expr], entry);
        assert_eq!(map[&value], other);

        // the copy keeps the shared variable and owns its own constant
        let Node::Operation { inputs, .. } = arena.node(value).clone() else {
            panic!("expected operation");
        };
        assert_eq!(inputs[0], a);
        assert_ne!(inputs[1], one);
        assert_eq!(map[&inputs[1]], other);
    }

    #[test]
    fn test_variables_never_mapped() {
        let mut arena = IrArena::new();
        let (mut list, entry, other) = two_blocks();
        let x = arena.local("x");
        let one = arena.constant(1);
        let def = arena.assign(x, one);
        let ret = arena.ret(Some(x));
        list.append(&arena, entry, def);
        list.append(&arena, other, ret);

        let map = assign_nodes_to_blocks(&mut arena, &mut list);
        assert!(!map.contains_key(&x));
        assert_eq!(map[&def], entry);
        assert_eq!(map[&ret], other);
    }

    #[test]
    fn test_constant_cloned_not_deep_copied() {
        let mut arena = IrArena::new();
        let (mut list, entry, other) = two_blocks();
        let x = arena.local("x");
        let c = arena.constant(7);
        let d1 = arena.assign(x, c);
        let d2 = arena.assign(x, c);
        list.append(&arena, entry, d1);
        list.append(&arena, other, d2);

        let before = arena.len();
        assign_nodes_to_blocks(&mut arena, &mut list);
        assert_eq!(arena.len(), before + 1);
    }

    // EDGE CASE: two references from the same foreign block share one copy
    #[test]
    fn test_one_copy_per_block() {
        let mut arena = IrArena::new();
        let (mut list, entry, other) = two_blocks();
        let x = arena.local("x");
        let y = arena.local("y");
        let a = arena.input("a");
        let expr = arena.mul(a, a);
        let d0 = arena.assign(x, expr);
        let d1 = arena.assign(x, expr);
        let d2 = arena.assign(y, expr);
        list.append(&arena, entry, d0);
        list.append(&arena, other, d1);
        list.append(&arena, other, d2);

        assign_nodes_to_blocks(&mut arena, &mut list);

        let value_of = |arena: &IrArena, id| match arena.node(id) {
            Node::ReferenceAssign { value, .. } => *value,
            _ => unreachable!(),
        };
        let v1 = value_of(&arena, d1);
        let v2 = value_of(&arena, d2);
        assert_ne!(v1, expr);
        assert_eq!(v1, v2);
    }

    // EDGE CASE: an instruction appended to two blocks
    #[test]
    fn test_shared_instruction_replaced_in_block() {
        let mut arena = IrArena::new();
        let (mut list, entry, other) = two_blocks();
        let x = arena.local("x");
        let one = arena.constant(1);
        let def = arena.assign(x, one);
        list.append(&arena, entry, def);
        list.append(&arena, other, def);

        let map = assign_nodes_to_blocks(&mut arena, &mut list);
        let copy = list.block(other).instructions()[0];
        assert_ne!(copy, def);
        assert_eq!(map[&def], entry);
        assert_eq!(map[&copy], other);
    }

    #[test]
    fn test_idempotent_on_assigned_graph() {
        let mut arena = IrArena::new();
        let (mut list, entry, other) = two_blocks();
        let x = arena.local("x");
        let a = arena.input("a");
        let expr = arena.add(a, a);
        let d1 = arena.assign(x, expr);
        let d2 = arena.assign(x, expr);
        list.append(&arena, entry, d1);
        list.append(&arena, other, d2);

        let first = assign_nodes_to_blocks(&mut arena, &mut list);
        let len = arena.len();
        let second = assign_nodes_to_blocks(&mut arena, &mut list);
        assert_eq!(arena.len(), len);
        assert_eq!(first, second);
    }
}
