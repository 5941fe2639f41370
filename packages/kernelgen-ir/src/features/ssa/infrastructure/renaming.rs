/*
 * Variable Renaming
 *
 * Dominator-tree pre-order walk. Per block, in instruction order:
 * 1. every variable used by a non-phi instruction is resolved to its
 *    reaching definition and the operand slot rewritten;
 * 2. every definition (assignment target, phi result) gets a fresh
 *    version `name<sep>k`;
 * 3. each phi of each successor gets its next empty operand filled with
 *    (reaching definition, this block).
 *
 * Instead of restoring per-subtree stacks, every definition records the
 * definition it shadowed; resolution walks that chain until it meets a
 * definition whose block dominates the current block.
 *
 * Input variables are defined on entry: their version 0 is the input node
 * itself, renamed in place so function arguments stay consistent.
 */

use super::errors::{SSAError, SSAResult};
use super::graph::BasicBlockGraph;
use crate::config::SsaConfig;
use crate::features::flow_graph::domain::FunctionBody;
use crate::shared::models::{BlockId, IrArena, Node, NodeId, PhiOperand, VariableKind};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

/// Variable Renaming Statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameStats {
    pub definitions: usize,
    pub uses: usize,
    pub phi_operands: usize,
    pub undefined_phi_operands: usize,
}

pub fn rename_variables(
    graph: BasicBlockGraph,
    config: &SsaConfig,
) -> SSAResult<(FunctionBody, RenameStats)> {
    // everything the walk reads from the graph is collected up front: the
    // body is mutated in place afterwards
    let order = graph.dominator_tree()?.preorder();
    let dominators = graph.dominators()?.clone();
    let successors: FxHashMap<BlockId, Vec<BlockId>> = order
        .iter()
        .map(|block| (*block, graph.successors(*block)))
        .collect();
    let tags: FxHashMap<BlockId, String> = graph
        .layout()
        .iter()
        .map(|block| (*block, graph.block_tag(*block)))
        .collect();
    let variables = graph.variables().to_vec();
    let entry = graph.entry();

    let mut body = graph.into_body();
    let mut renamer = Renamer::new(&body.arena, &variables, config, dominators);
    renamer.define_inputs(&mut body.arena, &variables, entry);

    for block in order {
        let tag = tags.get(&block).cloned().unwrap_or_else(|| block.to_string());
        let instructions = body.blocks.block(block).instructions().to_vec();
        for instruction in instructions {
            renamer.rename_instruction(&mut body.arena, instruction, block, &tag)?;
        }
        for successor in successors.get(&block).map(Vec::as_slice).unwrap_or(&[]) {
            let phis = body.blocks.block(*successor).phis(&body.arena);
            for phi in phis {
                renamer.fill_phi_operand(&mut body.arena, phi, block, &tags)?;
            }
        }
    }

    debug!(
        function = %body.blocks.tag(),
        definitions = renamer.stats.definitions,
        uses = renamer.stats.uses,
        phi_operands = renamer.stats.phi_operands,
        "variable renaming done"
    );
    Ok((body, renamer.stats))
}

struct Renamer<'c> {
    config: &'c SsaConfig,
    dominators: FxHashMap<BlockId, FxHashSet<BlockId>>,
    /// Original variable name, captured before any rename
    base_names: FxHashMap<NodeId, String>,
    /// Next version index per original variable
    counters: FxHashMap<NodeId, usize>,
    /// Original variable → latest definition seen on the walk
    reaching_def: FxHashMap<NodeId, NodeId>,
    /// Definition → the definition it shadowed
    previous_def: FxHashMap<NodeId, NodeId>,
    def_block: FxHashMap<NodeId, BlockId>,
    /// Versions created by this walk, never treated as uses
    minted: FxHashSet<NodeId>,
    /// Expression nodes whose operands were already rewritten
    rewritten: FxHashSet<NodeId>,
    stats: RenameStats,
}

impl<'c> Renamer<'c> {
    fn new(
        arena: &IrArena,
        variables: &[NodeId],
        config: &'c SsaConfig,
        dominators: FxHashMap<BlockId, FxHashSet<BlockId>>,
    ) -> Self {
        let base_names = variables
            .iter()
            .filter_map(|v| arena.variable_name(*v).map(|name| (*v, name.to_string())))
            .collect();
        Self {
            config,
            dominators,
            base_names,
            counters: FxHashMap::default(),
            reaching_def: FxHashMap::default(),
            previous_def: FxHashMap::default(),
            def_block: FxHashMap::default(),
            minted: FxHashSet::default(),
            rewritten: FxHashSet::default(),
            stats: RenameStats::default(),
        }
    }

    fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        self.dominators
            .get(&b)
            .map(|set| set.contains(&a))
            .unwrap_or(false)
    }

    fn base_name(&self, arena: &IrArena, variable: NodeId) -> String {
        self.base_names
            .get(&variable)
            .cloned()
            .unwrap_or_else(|| arena.describe(variable))
    }

    fn next_name(&mut self, arena: &IrArena, variable: NodeId) -> String {
        let counter = self.counters.entry(variable).or_insert(0);
        let version = *counter;
        *counter += 1;
        format!(
            "{}{}{}",
            self.base_name(arena, variable),
            self.config.version_separator,
            version
        )
    }

    fn define_inputs(&mut self, arena: &mut IrArena, variables: &[NodeId], entry: BlockId) {
        for &variable in variables {
            let is_input = matches!(
                arena.node(variable),
                Node::Variable {
                    kind: VariableKind::Input,
                    ..
                }
            );
            if !is_input {
                continue;
            }
            let versioned = self.next_name(arena, variable);
            if let Node::Variable { name, .. } = arena.node_mut(variable) {
                *name = versioned;
            }
            self.reaching_def.insert(variable, variable);
            self.def_block.insert(variable, entry);
            self.stats.definitions += 1;
        }
    }

    /// Walk the shadowing chain of `variable` down to a definition whose
    /// block dominates `block`, and make it the reaching definition.
    fn resolve(&mut self, variable: NodeId, block: BlockId) -> Option<NodeId> {
        let mut candidate = self.reaching_def.get(&variable).copied();
        while let Some(def) = candidate {
            let def_block = self.def_block.get(&def).copied();
            if def_block.map(|b| self.dominates(b, block)).unwrap_or(false) {
                break;
            }
            candidate = self.previous_def.get(&def).copied();
        }
        match candidate {
            Some(def) => {
                self.reaching_def.insert(variable, def);
            }
            None => {
                self.reaching_def.remove(&variable);
            }
        }
        candidate
    }

    /// Fresh version of `variable` defined in `block`
    fn define(&mut self, arena: &mut IrArena, variable: NodeId, block: BlockId) -> NodeId {
        let shadowed = self.resolve(variable, block);
        let name = self.next_name(arena, variable);
        let precision = match arena.node(variable) {
            Node::Variable { precision, .. } => *precision,
            _ => None,
        };
        let version = arena.variable(name, VariableKind::Local, precision);

        if let Some(shadowed) = shadowed {
            self.previous_def.insert(version, shadowed);
        }
        self.reaching_def.insert(variable, version);
        self.def_block.insert(version, block);
        self.minted.insert(version);
        self.stats.definitions += 1;
        version
    }

    fn rename_instruction(
        &mut self,
        arena: &mut IrArena,
        instruction: NodeId,
        block: BlockId,
        tag: &str,
    ) -> SSAResult<()> {
        match arena.node(instruction).clone() {
            Node::Phi { variable, .. } => {
                let version = self.define(arena, variable, block);
                if let Node::Phi { target, .. } = arena.node_mut(instruction) {
                    *target = version;
                }
                trace!(block = tag, variable = %self.base_name(arena, variable), "phi defined");
            }
            Node::ReferenceAssign { target, .. } => {
                self.rename_uses(arena, instruction, 1, block, tag)?;
                if arena.is_variable(target) && !self.minted.contains(&target) {
                    let version = self.define(arena, target, block);
                    if let Node::ReferenceAssign { target, .. } = arena.node_mut(instruction) {
                        *target = version;
                    }
                }
            }
            _ => self.rename_uses(arena, instruction, 0, block, tag)?,
        }
        Ok(())
    }

    /// Rewrite every variable operand reachable from `root`, skipping the
    /// first `skip` operands of the root itself (definition slots).
    fn rename_uses(
        &mut self,
        arena: &mut IrArena,
        root: NodeId,
        skip: usize,
        block: BlockId,
        tag: &str,
    ) -> SSAResult<()> {
        let mut stack = vec![(root, skip)];
        while let Some((node, skip)) = stack.pop() {
            if !self.rewritten.insert(node) {
                continue;
            }
            let inputs = arena.node(node).inputs();
            for (position, input) in inputs.into_iter().enumerate().skip(skip) {
                if !arena.is_variable(input) {
                    stack.push((input, 0));
                    continue;
                }
                if self.minted.contains(&input) {
                    continue;
                }
                let def = self
                    .resolve(input, block)
                    .ok_or_else(|| SSAError::UndefinedVariable {
                        variable: self.base_name(arena, input),
                        block_id: tag.to_string(),
                    })?;
                if let Some(slot) = arena.node_mut(node).inputs_mut().into_iter().nth(position) {
                    *slot = def;
                }
                self.stats.uses += 1;
            }
        }
        Ok(())
    }

    fn fill_phi_operand(
        &mut self,
        arena: &mut IrArena,
        phi: NodeId,
        predecessor: BlockId,
        tags: &FxHashMap<BlockId, String>,
    ) -> SSAResult<()> {
        let Node::Phi { variable, .. } = arena.node(phi).clone() else {
            return Ok(());
        };
        let value = self.resolve(variable, predecessor);
        let name = self.base_name(arena, variable);

        let Node::Phi { operands, .. } = arena.node_mut(phi) else {
            return Ok(());
        };
        let slot = operands
            .iter_mut()
            .find(|operand| operand.is_empty())
            .ok_or_else(|| SSAError::PhiNodeError {
                variable: name.clone(),
                reason: format!(
                    "no free operand slot for predecessor '{}'",
                    tags.get(&predecessor).cloned().unwrap_or_default()
                ),
            })?;
        *slot = PhiOperand {
            value,
            predecessor: Some(predecessor),
        };

        self.stats.phi_operands += 1;
        if value.is_none() {
            self.stats.undefined_phi_operands += 1;
            debug!(
                variable = %name,
                predecessor = tags.get(&predecessor).map(String::as_str).unwrap_or_default(),
                "phi operand undefined along edge"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DominanceConfig, LoweringConfig};
    use crate::features::flow_graph::infrastructure::{generate_basic_blocks, render_block_list};
    use crate::features::ssa::infrastructure::phi_placement::place_phi_nodes;

    fn to_ssa(mut arena: IrArena, root: NodeId) -> SSAResult<FunctionBody> {
        let blocks =
            generate_basic_blocks(&mut arena, root, "f", &LoweringConfig::default()).unwrap();
        let graph =
            BasicBlockGraph::new(FunctionBody::new(arena, blocks), DominanceConfig::default())?;
        let (body, _) = place_phi_nodes(graph)?;
        let graph = BasicBlockGraph::new(body, DominanceConfig::default())?;
        let (body, _) = rename_variables(graph, &SsaConfig::default())?;
        Ok(body)
    }

    fn render(body: &FunctionBody) -> String {
        render_block_list(&body.blocks, &body.arena)
    }

    #[test]
    fn test_straight_line_versions() {
        let mut arena = IrArena::new();
        let x = arena.local("x");
        let a = arena.input("a");
        let one = arena.constant(1);
        let d0 = arena.assign(x, a);
        let sum = arena.add(x, one);
        let d1 = arena.assign(x, sum);
        let ret = arena.ret(Some(x));
        let root = arena.statement(vec![d0, d1, ret]);

        let body = to_ssa(arena, root).unwrap();
        assert_eq!(render(&body), "main:\n  x_0 = a_0\n  x_1 = x_0 + 1\n  return x_1\n");
    }

    #[test]
    fn test_custom_separator() {
        let mut arena = IrArena::new();
        let x = arena.local("x");
        let one = arena.constant(1);
        let d0 = arena.assign(x, one);
        let ret = arena.ret(Some(x));
        let root = arena.statement(vec![d0, ret]);

        let blocks =
            generate_basic_blocks(&mut arena, root, "f", &LoweringConfig::default()).unwrap();
        let graph = BasicBlockGraph::new(FunctionBody::new(arena, blocks), DominanceConfig::default())
            .unwrap();
        let (body, _) = place_phi_nodes(graph).unwrap();
        let graph = BasicBlockGraph::new(body, DominanceConfig::default()).unwrap();
        let config = SsaConfig::default().version_separator(".v");
        let (body, stats) = rename_variables(graph, &config).unwrap();

        assert_eq!(render(&body), "main:\n  x.v0 = 1\n  return x.v0\n");
        assert_eq!(stats.definitions, 1);
        assert_eq!(stats.uses, 1);
    }

    #[test]
    fn test_use_before_definition() {
        let mut arena = IrArena::new();
        let x = arena.local("x");
        let y = arena.local("y");
        let one = arena.constant(1);
        let early = arena.assign(y, x);
        let late = arena.assign(x, one);
        let root = arena.statement(vec![early, late]);

        let err = to_ssa(arena, root).unwrap_err();
        assert_eq!(
            err,
            SSAError::UndefinedVariable {
                variable: "x".to_string(),
                block_id: "main".to_string(),
            }
        );
    }

    // EDGE CASE: defined on one path only, the phi gets an undefined operand
    #[test]
    fn test_partially_defined_phi_operand() {
        let mut arena = IrArena::new();
        let c = arena.input("c");
        let t = arena.local("t");
        let zero = arena.constant(0);
        let one = arena.constant(1);
        let cond = arena.gt(c, zero);
        let then = arena.assign(t, one);
        let cb = arena.condition(cond, then, None);
        let root = arena.statement(vec![cb]);

        let body = to_ssa(arena, root).unwrap();
        let text = render(&body);
        assert!(text.contains("t_1 = phi(undef from main, t_0 from if_1)"), "{text}");
    }

    // EDGE CASE: a sub-expression shared by two instructions of one block is
    // rewritten once, with the definitions reaching its first use
    #[test]
    fn test_shared_expression_renamed_once() {
        let mut arena = IrArena::new();
        let a = arena.input("a");
        let x = arena.local("x");
        let y = arena.local("y");
        let two = arena.constant(2);
        let double = arena.mul(a, two);
        let d0 = arena.assign(x, double);
        let d1 = arena.assign(a, two);
        let d2 = arena.assign(y, double);
        let ret = arena.ret(Some(y));
        let root = arena.statement(vec![d0, d1, d2, ret]);

        let body = to_ssa(arena, root).unwrap();
        assert_eq!(
            render(&body),
            "main:\n  x_0 = a_0 * 2\n  a_1 = 2\n  y_0 = a_0 * 2\n  return y_0\n"
        );
    }
}
