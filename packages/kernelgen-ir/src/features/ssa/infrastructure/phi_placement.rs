/*
 * Phi Placement (iterated dominance frontier)
 *
 * Per variable v:
 * ```
 * worklist = DefBlocks(v); placed = {}
 * while x = worklist.pop():
 *     for y in DF(x):
 *         if y not in placed:
 *             insert phi(v) at head of y, one empty operand per predecessor
 *             placed += y
 *             if y not in DefBlocks(v): worklist.push(y)
 * ```
 *
 * All decisions are taken on the (immutable) graph first; the graph is then
 * consumed and the phis are written into the returned body.
 */

use super::errors::SSAResult;
use super::graph::BasicBlockGraph;
use crate::features::flow_graph::domain::FunctionBody;
use crate::shared::models::{BlockId, Node, NodeId, PhiOperand};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Phi Placement Statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhiPlacementStats {
    pub total_phi_nodes: usize,
    pub variables_with_phis: usize,
}

struct PhiSite {
    block: BlockId,
    variable: NodeId,
    operand_slots: usize,
}

pub fn place_phi_nodes(graph: BasicBlockGraph) -> SSAResult<(FunctionBody, PhiPlacementStats)> {
    let mut sites: Vec<PhiSite> = Vec::new();
    let mut stats = PhiPlacementStats::default();

    for &variable in graph.variables() {
        let def_blocks = graph.def_blocks(variable)?;
        let mut worklist: Vec<BlockId> = def_blocks.to_vec();
        let mut placed: FxHashSet<BlockId> = FxHashSet::default();

        while let Some(x) = worklist.pop() {
            for y in graph.frontier_of(x)? {
                if !placed.insert(y) {
                    continue;
                }
                let operand_slots = graph
                    .predecessors(y)
                    .iter()
                    .filter(|pred| graph.is_reachable(**pred))
                    .count();
                debug!(
                    variable = %graph.arena().describe(variable),
                    block = %graph.block_tag(y),
                    operand_slots,
                    "phi placed"
                );
                sites.push(PhiSite {
                    block: y,
                    variable,
                    operand_slots,
                });
                if !def_blocks.contains(&y) {
                    worklist.push(y);
                }
            }
        }

        if !placed.is_empty() {
            stats.variables_with_phis += 1;
        }
    }

    let mut body = graph.into_body();
    for site in sites {
        let phi = body.arena.push(Node::Phi {
            variable: site.variable,
            target: site.variable,
            operands: vec![PhiOperand::empty(); site.operand_slots],
        });
        body.blocks.block_mut(site.block).insert_phi(&body.arena, phi);
        stats.total_phi_nodes += 1;
    }

    debug!(
        function = %body.blocks.tag(),
        phis = stats.total_phi_nodes,
        variables = stats.variables_with_phis,
        "phi placement done"
    );
    Ok((body, stats))
}
