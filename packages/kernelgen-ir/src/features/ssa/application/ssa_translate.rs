use crate::config::{DominanceConfig, SsaConfig};
use crate::errors::{CodegenError, Result};
use crate::features::flow_graph::domain::FunctionBody;
use crate::features::ssa::infrastructure::{
    place_phi_nodes, rename_variables, verify_cfg, verify_ssa, BasicBlockGraph,
    PhiPlacementStats, RenameStats, SSAResult,
};
use crate::pipeline::function::CodeFunction;
use crate::pipeline::pass::{FunctionPass, GroupContext};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsaTranslationStats {
    pub placement: PhiPlacementStats,
    pub renaming: RenameStats,
}

/// Phi placement on one graph snapshot, renaming on a fresh one, then the
/// verifiers when `ssa.verify` is set.
pub fn translate_to_ssa(
    body: FunctionBody,
    dominance: &DominanceConfig,
    ssa: &SsaConfig,
) -> SSAResult<(FunctionBody, SsaTranslationStats)> {
    let graph = BasicBlockGraph::new(body, dominance.clone())?;
    let (body, placement) = place_phi_nodes(graph)?;

    let graph = BasicBlockGraph::new(body, dominance.clone())?;
    let (body, renaming) = rename_variables(graph, ssa)?;

    let body = if ssa.verify {
        verify_cfg(&body.blocks, &body.arena)?;
        let graph = BasicBlockGraph::new(body, dominance.clone())?;
        verify_ssa(&graph)?;
        graph.into_body()
    } else {
        body
    };

    Ok((body, SsaTranslationStats { placement, renaming }))
}

/// `ssa_translation`: basic-block list → SSA form
#[derive(Debug, Clone, Copy, Default)]
pub struct SsaTranslationPass;

impl FunctionPass for SsaTranslationPass {
    fn pass_tag(&self) -> &'static str {
        "ssa_translation"
    }

    fn description(&self) -> &'static str {
        "SSA translation"
    }

    fn execute_on_function(
        &self,
        function: &mut CodeFunction,
        ctx: &GroupContext<'_>,
    ) -> Result<()> {
        let Some(body) = function.body() else {
            return Err(CodegenError::UnexpectedScheme {
                pass: self.pass_tag().to_string(),
                function: function.name.clone(),
                expected: "basic-block",
            });
        };

        let config = ctx.config();
        let (body, stats) = translate_to_ssa(body, config.dominance(), config.ssa())?;
        debug!(
            function = %function.name,
            phis = stats.placement.total_phi_nodes,
            definitions = stats.renaming.definitions,
            uses = stats.renaming.uses,
            "SSA translation done"
        );
        function.commit(body);
        Ok(())
    }
}
