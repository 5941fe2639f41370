//! Custom assertions for CFG, dominance and SSA properties

use kernelgen_ir::features::ssa::infrastructure::{verify_cfg, verify_ssa};
use kernelgen_ir::{BasicBlockGraph, BlockId, FunctionBody, Node};
use std::collections::{BTreeSet, HashSet};

/// Every sealed block is terminated exactly once, targets exist
pub fn assert_cfg_well_formed(body: &FunctionBody) {
    if let Err(err) = verify_cfg(&body.blocks, &body.arena) {
        panic!(
            "CFG not well formed: {err}\n{}",
            kernelgen_ir::render_block_list(&body.blocks, &body.arena)
        );
    }
}

/// Single assignment, dominating definitions, complete phis
pub fn assert_ssa_valid(graph: &BasicBlockGraph) {
    if let Err(err) = verify_ssa(graph) {
        panic!(
            "not in SSA form: {err}\n{}",
            kernelgen_ir::render_block_list(graph.blocks(), graph.arena())
        );
    }
}

fn reachable(graph: &BasicBlockGraph) -> Vec<BlockId> {
    graph
        .layout()
        .iter()
        .copied()
        .filter(|b| graph.is_reachable(*b))
        .collect()
}

fn strictly_dominates(graph: &BasicBlockGraph, a: BlockId, b: BlockId) -> bool {
    a != b && graph.dominates(a, b).unwrap()
}

/// `dom(entry) = {entry}`, reflexivity, and the idom definition
pub fn assert_dominance_properties(graph: &BasicBlockGraph) {
    let entry = graph.entry();
    let dom = graph.dominators().unwrap();
    assert_eq!(dom[&entry].len(), 1);
    assert!(dom[&entry].contains(&entry));

    let idom = graph.immediate_dominators().unwrap();
    assert!(!idom.contains_key(&entry));

    let blocks = reachable(graph);
    for &n in &blocks {
        assert!(graph.dominates(n, n).unwrap(), "{n} must dominate itself");
        assert!(graph.dominates(entry, n).unwrap(), "entry must dominate {n}");
        if n == entry {
            continue;
        }
        let d = *idom
            .get(&n)
            .unwrap_or_else(|| panic!("reachable block {n} has no idom"));
        assert!(strictly_dominates(graph, d, n));
        for &other in &blocks {
            if strictly_dominates(graph, other, n) {
                assert!(
                    graph.dominates(other, d).unwrap(),
                    "{other} sdom {n} but does not dominate idom {d}"
                );
            }
        }
    }
}

/// `y ∈ DF(x)` iff `x` dominates a reachable predecessor of `y` and `x`
/// does not strictly dominate `y` (`x == y` included)
pub fn assert_frontier_definition(graph: &BasicBlockGraph) {
    let blocks = reachable(graph);
    for &x in &blocks {
        let expected: BTreeSet<BlockId> = blocks
            .iter()
            .copied()
            .filter(|&y| {
                !strictly_dominates(graph, x, y)
                    && graph
                        .predecessors(y)
                        .iter()
                        .any(|&p| graph.is_reachable(p) && graph.dominates(x, p).unwrap())
            })
            .collect();
        let actual: BTreeSet<BlockId> = graph.frontier_of(x).unwrap().into_iter().collect();
        assert_eq!(actual, expected, "DF({x})");
    }
}

/// No block merges the same variable with two phis
pub fn assert_one_phi_per_variable(body: &FunctionBody) {
    for (_, block) in body.blocks.iter() {
        let mut seen = HashSet::new();
        for phi in block.phis(&body.arena) {
            if let Node::Phi { variable, .. } = body.arena.node(phi) {
                assert!(
                    seen.insert(*variable),
                    "two phis for {} in {}",
                    body.arena.describe(*variable),
                    block.tag()
                );
            }
        }
    }
}
