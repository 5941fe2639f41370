/*
 * Dominance Analysis
 *
 * Pure functions over a block layout and its CFG edges:
 * - CFG edges from terminators
 * - Dominator sets (iterative fixpoint)
 * - Immediate dominators (naive scan, or Cooper/Harvey/Kennedy via petgraph)
 * - Dominator tree
 * - Dominance frontier
 *
 * Blocks unreachable from the entry have no dominators beyond themselves,
 * no immediate dominator and no frontier; they are logged and left alone.
 */

use crate::features::flow_graph::domain::{BasicBlockList, CFGEdge, CFGEdgeKind};
use crate::features::ssa::infrastructure::errors::{SSAError, SSAResult};
use crate::shared::models::{BlockId, IrArena, Node};
use petgraph::algo::dominators::simple_fast;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use tracing::debug;

pub type DominatorSets = FxHashMap<BlockId, FxHashSet<BlockId>>;
pub type ImmediateDominators = FxHashMap<BlockId, BlockId>;
pub type DominanceFrontier = FxHashMap<BlockId, BTreeSet<BlockId>>;

/// Block → immediately dominated blocks, rooted at the entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DominatorTree {
    root: BlockId,
    children: FxHashMap<BlockId, Vec<BlockId>>,
}

impl DominatorTree {
    pub fn root(&self) -> BlockId {
        self.root
    }

    /// Children in layout order
    pub fn children(&self, block: BlockId) -> &[BlockId] {
        self.children.get(&block).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pre-order walk from the root (explicit stack)
    pub fn preorder(&self) -> Vec<BlockId> {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(block) = stack.pop() {
            order.push(block);
            stack.extend(self.children(block).iter().rev().copied());
        }
        order
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CFG edges
// ═══════════════════════════════════════════════════════════════════════════

/// One edge per unconditional branch, two per conditional branch. Blocks
/// without a branch terminator are sinks.
pub fn compute_cfg_edges(blocks: &BasicBlockList, arena: &IrArena) -> Vec<CFGEdge> {
    let mut edges = Vec::new();
    for (id, block) in blocks.iter() {
        let Some(terminator) = block.terminator(arena) else {
            continue;
        };
        match arena.node(terminator) {
            Node::UnconditionalBranch { target } => {
                edges.push(CFGEdge::new(id, *target, CFGEdgeKind::Unconditional));
            }
            Node::ConditionalBranch {
                if_true, if_false, ..
            } => {
                edges.push(CFGEdge::new(id, *if_true, CFGEdgeKind::TrueBranch));
                edges.push(CFGEdge::new(id, *if_false, CFGEdgeKind::FalseBranch));
            }
            _ => {}
        }
    }
    edges
}

/// Distinct predecessors per block, in edge order
pub fn compute_predecessors(edges: &[CFGEdge]) -> FxHashMap<BlockId, Vec<BlockId>> {
    let mut predecessors: FxHashMap<BlockId, Vec<BlockId>> = FxHashMap::default();
    for edge in edges {
        let entry = predecessors.entry(edge.target).or_default();
        if !entry.contains(&edge.source) {
            entry.push(edge.source);
        }
    }
    predecessors
}

pub fn compute_reachable(entry: BlockId, edges: &[CFGEdge]) -> FxHashSet<BlockId> {
    let mut successors: FxHashMap<BlockId, Vec<BlockId>> = FxHashMap::default();
    for edge in edges {
        successors.entry(edge.source).or_default().push(edge.target);
    }

    let mut reachable = FxHashSet::default();
    let mut stack = vec![entry];
    while let Some(block) = stack.pop() {
        if !reachable.insert(block) {
            continue;
        }
        if let Some(next) = successors.get(&block) {
            stack.extend(next.iter().copied());
        }
    }
    reachable
}

// ═══════════════════════════════════════════════════════════════════════════
// Dominator sets
// ═══════════════════════════════════════════════════════════════════════════

/// `dom(entry) = {entry}`, `dom(n) = {n} ∪ ⋂ dom(p)` over reachable
/// predecessors. Reachable blocks start from the full reachable set so loops
/// converge to the greatest fixpoint; unreachable blocks stay `{n}`.
pub fn compute_dominator_sets(
    layout: &[BlockId],
    entry: BlockId,
    predecessors: &FxHashMap<BlockId, Vec<BlockId>>,
    reachable: &FxHashSet<BlockId>,
    max_iterations: usize,
) -> SSAResult<DominatorSets> {
    let universe: FxHashSet<BlockId> = layout
        .iter()
        .copied()
        .filter(|b| reachable.contains(b))
        .collect();

    let mut dom: DominatorSets = FxHashMap::default();
    for &block in layout {
        let initial = if block == entry || !reachable.contains(&block) {
            if block != entry {
                debug!(block = %block, "unreachable block, dominated only by itself");
            }
            std::iter::once(block).collect()
        } else {
            universe.clone()
        };
        dom.insert(block, initial);
    }

    for iteration in 1..=max_iterations {
        let mut changed = false;
        for &block in layout {
            if block == entry || !reachable.contains(&block) {
                continue;
            }
            let mut new_set: Option<FxHashSet<BlockId>> = None;
            for pred in predecessors.get(&block).map(Vec::as_slice).unwrap_or(&[]) {
                if !reachable.contains(pred) {
                    continue;
                }
                let Some(pred_dom) = dom.get(pred) else {
                    continue;
                };
                new_set = Some(match new_set {
                    None => pred_dom.clone(),
                    Some(acc) => acc.intersection(pred_dom).copied().collect(),
                });
            }
            let mut new_set = new_set.unwrap_or_default();
            new_set.insert(block);

            if dom.get(&block) != Some(&new_set) {
                dom.insert(block, new_set);
                changed = true;
            }
        }
        if !changed {
            debug!(iterations = iteration, "dominator sets converged");
            return Ok(dom);
        }
    }

    Err(SSAError::DominanceNotConverged {
        iterations: max_iterations,
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Immediate dominators
// ═══════════════════════════════════════════════════════════════════════════

/// The strict dominator of `n` that dominates no other strict dominator of
/// `n`. Entry and unreachable blocks have none and are left out.
pub fn compute_immediate_dominators(
    layout: &[BlockId],
    dom: &DominatorSets,
) -> ImmediateDominators {
    let mut idom = FxHashMap::default();
    for &block in layout {
        let Some(dominators) = dom.get(&block) else {
            continue;
        };
        let strict: Vec<BlockId> = layout
            .iter()
            .copied()
            .filter(|d| *d != block && dominators.contains(d))
            .collect();

        let immediate = strict.iter().copied().find(|candidate| {
            strict.iter().all(|other| {
                other == candidate
                    || !dom
                        .get(other)
                        .map(|other_dom| other_dom.contains(candidate))
                        .unwrap_or(false)
            })
        });

        match immediate {
            Some(d) => {
                idom.insert(block, d);
            }
            None => debug!(block = %block, "no immediate dominator"),
        }
    }
    idom
}

/// Same map as [`compute_immediate_dominators`], computed with
/// `petgraph::algo::dominators::simple_fast` without materializing sets
pub fn compute_immediate_dominators_fast(
    layout: &[BlockId],
    entry: BlockId,
    edges: &[CFGEdge],
) -> ImmediateDominators {
    let mut graph: DiGraph<BlockId, ()> = DiGraph::with_capacity(layout.len(), edges.len());
    let index: FxHashMap<BlockId, NodeIndex> = layout
        .iter()
        .map(|block| (*block, graph.add_node(*block)))
        .collect();
    for edge in edges {
        if let (Some(source), Some(target)) = (index.get(&edge.source), index.get(&edge.target)) {
            graph.update_edge(*source, *target, ());
        }
    }

    let mut idom = FxHashMap::default();
    let Some(root) = index.get(&entry) else {
        return idom;
    };
    let dominators = simple_fast(&graph, *root);
    for &block in layout {
        match index
            .get(&block)
            .and_then(|node| dominators.immediate_dominator(*node))
        {
            Some(d) => {
                idom.insert(block, graph[d]);
            }
            None => debug!(block = %block, "no immediate dominator"),
        }
    }
    idom
}

// ═══════════════════════════════════════════════════════════════════════════
// Dominator tree and frontier
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_dominator_tree(
    layout: &[BlockId],
    entry: BlockId,
    idom: &ImmediateDominators,
) -> DominatorTree {
    let mut children: FxHashMap<BlockId, Vec<BlockId>> = FxHashMap::default();
    for &block in layout {
        if let Some(parent) = idom.get(&block) {
            children.entry(*parent).or_default().push(block);
        }
    }
    DominatorTree {
        root: entry,
        children,
    }
}

/// For every edge `x → dst`, climb from `x` along the idom chain while the
/// runner does not strictly dominate `dst`, adding `dst` to each frontier.
/// `dst` itself is passed through, so the target of a back edge from a
/// block it dominates lands in its own frontier.
pub fn compute_dominance_frontier(
    layout: &[BlockId],
    edges: &[CFGEdge],
    idom: &ImmediateDominators,
    dom: &DominatorSets,
    reachable: &FxHashSet<BlockId>,
) -> DominanceFrontier {
    let strictly_dominates = |a: BlockId, b: BlockId| {
        a != b && dom.get(&b).map(|set| set.contains(&a)).unwrap_or(false)
    };

    let mut frontier: DominanceFrontier = layout.iter().map(|b| (*b, BTreeSet::new())).collect();
    for edge in edges {
        if !reachable.contains(&edge.source) {
            debug!(
                source = %edge.source,
                target = %edge.target,
                "edge from unreachable block ignored"
            );
            continue;
        }
        let mut runner = Some(edge.source);
        while let Some(x) = runner {
            if strictly_dominates(x, edge.target) {
                break;
            }
            frontier.entry(x).or_default().insert(edge.target);
            runner = idom.get(&x).copied();
        }
    }
    frontier
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(i: usize) -> BlockId {
        BlockId::new(i)
    }

    fn set(ids: &[usize]) -> FxHashSet<BlockId> {
        ids.iter().map(|i| b(*i)).collect()
    }

    fn frontier(ids: &[usize]) -> BTreeSet<BlockId> {
        ids.iter().map(|i| b(*i)).collect()
    }

    fn edge(s: usize, t: usize) -> CFGEdge {
        CFGEdge::new(b(s), b(t), CFGEdgeKind::Unconditional)
    }

    /// 0 → 1, 0 → 2, 1 → 3, 2 → 3  (diamond)
    fn diamond() -> (Vec<BlockId>, Vec<CFGEdge>) {
        (
            (0..4).map(b).collect(),
            vec![edge(0, 1), edge(0, 2), edge(1, 3), edge(2, 3)],
        )
    }

    /// 0 → 1, 1 → 2, 2 → 1, 1 → 3  (while loop)
    fn while_loop() -> (Vec<BlockId>, Vec<CFGEdge>) {
        (
            (0..4).map(b).collect(),
            vec![edge(0, 1), edge(1, 2), edge(2, 1), edge(1, 3)],
        )
    }

    fn analyse(
        layout: &[BlockId],
        edges: &[CFGEdge],
    ) -> (DominatorSets, ImmediateDominators, DominanceFrontier) {
        let preds = compute_predecessors(edges);
        let reachable = compute_reachable(layout[0], edges);
        let dom = compute_dominator_sets(layout, layout[0], &preds, &reachable, 100).unwrap();
        let idom = compute_immediate_dominators(layout, &dom);
        let df = compute_dominance_frontier(layout, edges, &idom, &dom, &reachable);
        (dom, idom, df)
    }

    #[test]
    fn test_diamond_dominators() {
        let (layout, edges) = diamond();
        let (dom, idom, df) = analyse(&layout, &edges);

        assert_eq!(dom[&b(0)], set(&[0]));
        assert_eq!(dom[&b(3)], set(&[0, 3]));
        assert_eq!(idom.get(&b(0)), None);
        assert_eq!(idom[&b(1)], b(0));
        assert_eq!(idom[&b(3)], b(0));

        assert_eq!(df[&b(1)], frontier(&[3]));
        assert_eq!(df[&b(2)], frontier(&[3]));
        assert!(df[&b(0)].is_empty());
        assert!(df[&b(3)].is_empty());
    }

    #[test]
    fn test_loop_dominators_and_frontier() {
        let (layout, edges) = while_loop();
        let (dom, idom, df) = analyse(&layout, &edges);

        // universal initialisation: the body is dominated by the header
        assert_eq!(dom[&b(2)], set(&[0, 1, 2]));
        assert_eq!(idom[&b(2)], b(1));
        assert_eq!(idom[&b(3)], b(1));

        assert_eq!(df[&b(2)], frontier(&[1]));
        // the back edge 2 → 1 climbs through the header itself
        assert_eq!(df[&b(1)], frontier(&[1]));
        assert!(df[&b(0)].is_empty());
    }

    #[test]
    fn test_fast_idom_matches_naive() {
        for (layout, edges) in [diamond(), while_loop()] {
            let (_, naive, _) = analyse(&layout, &edges);
            let fast = compute_immediate_dominators_fast(&layout, layout[0], &edges);
            assert_eq!(naive, fast);
        }
    }

    // EDGE CASE: a block branching to itself is in its own frontier
    #[test]
    fn test_self_loop_frontier() {
        let layout: Vec<BlockId> = (0..3).map(b).collect();
        let edges = vec![edge(0, 1), edge(1, 1), edge(1, 2)];
        let (_, idom, df) = analyse(&layout, &edges);

        assert_eq!(idom[&b(1)], b(0));
        assert_eq!(df[&b(1)], frontier(&[1]));
        assert!(df[&b(0)].is_empty());
        assert!(df[&b(2)].is_empty());
    }

    // EDGE CASE: unreachable block keeps {self}, no idom, no frontier
    #[test]
    fn test_unreachable_block() {
        let layout: Vec<BlockId> = (0..3).map(b).collect();
        let edges = vec![edge(0, 1), edge(2, 1)];
        let (dom, idom, df) = analyse(&layout, &edges);

        assert_eq!(dom[&b(2)], set(&[2]));
        assert!(!idom.contains_key(&b(2)));
        assert!(df[&b(2)].is_empty());
        assert_eq!(idom[&b(1)], b(0));
        assert_eq!(dom[&b(1)], set(&[0, 1]));
    }

    #[test]
    fn test_iteration_cap() {
        let (layout, edges) = while_loop();
        let preds = compute_predecessors(&edges);
        let reachable = compute_reachable(b(0), &edges);
        // first sweep changes the sets, the cap stops before a quiet sweep
        let err = compute_dominator_sets(&layout, b(0), &preds, &reachable, 1);
        assert!(matches!(err, Err(SSAError::DominanceNotConverged { iterations: 1 })));
    }

    #[test]
    fn test_dominator_tree_preorder() {
        let (layout, edges) = while_loop();
        let (_, idom, _) = analyse(&layout, &edges);
        let tree = build_dominator_tree(&layout, b(0), &idom);
        assert_eq!(tree.children(b(1)), &[b(2), b(3)]);
        assert_eq!(tree.preorder(), vec![b(0), b(1), b(2), b(3)]);
        assert!(tree.children(b(3)).is_empty());
    }
}
