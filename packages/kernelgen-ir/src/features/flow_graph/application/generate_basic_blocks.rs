use crate::errors::{CodegenError, Result};
use crate::features::flow_graph::domain::FunctionBody;
use crate::features::flow_graph::infrastructure::generate_basic_blocks;
use crate::pipeline::function::{CodeFunction, FunctionScheme};
use crate::pipeline::pass::{FunctionPass, GroupContext};
use tracing::debug;

/// `gen_basic_block`: structured tree → basic-block list
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateBasicBlockPass;

impl FunctionPass for GenerateBasicBlockPass {
    fn pass_tag(&self) -> &'static str {
        "gen_basic_block"
    }

    fn description(&self) -> &'static str {
        "generate basic blocks"
    }

    fn execute_on_function(
        &self,
        function: &mut CodeFunction,
        ctx: &GroupContext<'_>,
    ) -> Result<()> {
        let root = match &function.scheme {
            FunctionScheme::Structured { root } => *root,
            FunctionScheme::BasicBlocks { .. } => {
                return Err(CodegenError::UnexpectedScheme {
                    pass: self.pass_tag().to_string(),
                    function: function.name.clone(),
                    expected: "structured",
                })
            }
        };

        let mut arena = function.arena.clone();
        let blocks = generate_basic_blocks(&mut arena, root, &function.name, ctx.config().lowering())?;
        debug!(
            function = %function.name,
            blocks = blocks.len(),
            "basic blocks generated"
        );
        function.commit(FunctionBody::new(arena, blocks));
        Ok(())
    }
}
