/*
 * IR Arena
 *
 * Owns every node of one function. Nodes reference each other through
 * NodeId handles, so sharing (a variable read from several blocks, a
 * sub-expression used twice) is explicit and identity-based.
 */

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::ids::{BlockId, NodeId};
use super::node::{Comparison, ConstValue, Node, OpCode, Precision, VariableKind};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IrArena {
    nodes: Vec<Node>,
}

impl IrArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Panics on a handle from another arena; handles are only minted by `push`.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId::new(index), node))
    }

    pub fn is_variable(&self, id: NodeId) -> bool {
        self.node(id).is_variable()
    }

    /// Name of a variable node, `None` for any other kind
    pub fn variable_name(&self, id: NodeId) -> Option<&str> {
        match self.node(id) {
            Node::Variable { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Name used in diagnostics: the variable name or `kind%id`
    pub fn describe(&self, id: NodeId) -> String {
        match self.get(id) {
            Some(Node::Variable { name, .. }) => name.clone(),
            Some(node) => format!("{}{}", node.kind_name(), id),
            None => format!("<dangling {}>", id),
        }
    }

    /// Shallow copy: same operands, new identity
    pub fn duplicate(&mut self, id: NodeId) -> NodeId {
        let node = self.node(id).clone();
        self.push(node)
    }

    /// Deep copy of `root` and its operand graph, stopping at variables.
    ///
    /// Variables inside the copy stay shared with the original. Sharing
    /// inside the copied sub-graph is preserved (each node is copied once).
    pub fn copy_up_to_variables(&mut self, root: NodeId) -> NodeId {
        if self.is_variable(root) {
            return root;
        }

        let order = self.post_order_until_variables(root);
        let mut copies: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        for id in order {
            if self.is_variable(id) {
                copies.insert(id, id);
                continue;
            }
            let mut node = self.node(id).clone();
            for input in node.inputs_mut() {
                if let Some(copy) = copies.get(&*input) {
                    *input = *copy;
                }
            }
            let copy = self.push(node);
            copies.insert(id, copy);
        }
        copies.get(&root).copied().unwrap_or(root)
    }

    /// Operand-first ordering of the sub-graph rooted at `root`, each node
    /// listed once, not descending below variables.
    fn post_order_until_variables(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if !visited.insert(id) {
                continue;
            }
            stack.push((id, true));
            if self.is_variable(id) {
                continue;
            }
            for input in self.node(id).inputs().into_iter().rev() {
                if !visited.contains(&input) {
                    stack.push((input, false));
                }
            }
        }
        order
    }

    // ------------------------------------------------------------------
    // Builders
    // ------------------------------------------------------------------

    pub fn variable(
        &mut self,
        name: impl Into<String>,
        kind: VariableKind,
        precision: Option<Precision>,
    ) -> NodeId {
        self.push(Node::Variable {
            name: name.into(),
            kind,
            precision,
        })
    }

    pub fn input(&mut self, name: impl Into<String>) -> NodeId {
        self.variable(name, VariableKind::Input, None)
    }

    pub fn local(&mut self, name: impl Into<String>) -> NodeId {
        self.variable(name, VariableKind::Local, None)
    }

    pub fn constant(&mut self, value: i64) -> NodeId {
        self.push(Node::Constant {
            value: ConstValue::Int(value),
            precision: None,
        })
    }

    pub fn float_constant(&mut self, value: f64, precision: Precision) -> NodeId {
        self.push(Node::Constant {
            value: ConstValue::Float(value),
            precision: Some(precision),
        })
    }

    pub fn operation(&mut self, op: OpCode, inputs: Vec<NodeId>) -> NodeId {
        self.push(Node::Operation { op, inputs })
    }

    pub fn add(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.operation(OpCode::Add, vec![lhs, rhs])
    }

    pub fn sub(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.operation(OpCode::Sub, vec![lhs, rhs])
    }

    pub fn mul(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.operation(OpCode::Mul, vec![lhs, rhs])
    }

    pub fn compare(&mut self, cmp: Comparison, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.operation(OpCode::Compare(cmp), vec![lhs, rhs])
    }

    pub fn lt(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.compare(Comparison::Less, lhs, rhs)
    }

    pub fn gt(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.compare(Comparison::Greater, lhs, rhs)
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        self.push(Node::ReferenceAssign { target, value })
    }

    pub fn statement(&mut self, children: Vec<NodeId>) -> NodeId {
        self.push(Node::Statement { children })
    }

    pub fn condition(
        &mut self,
        cond: NodeId,
        if_branch: NodeId,
        else_branch: Option<NodeId>,
    ) -> NodeId {
        self.push(Node::ConditionBlock {
            cond,
            if_branch,
            else_branch,
        })
    }

    pub fn loop_(&mut self, init: NodeId, cond: NodeId, body: NodeId) -> NodeId {
        self.push(Node::Loop { init, cond, body })
    }

    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        self.push(Node::Return { value })
    }

    pub fn branch(&mut self, target: BlockId) -> NodeId {
        self.push(Node::UnconditionalBranch { target })
    }

    pub fn cond_branch(&mut self, cond: NodeId, if_true: BlockId, if_false: BlockId) -> NodeId {
        self.push(Node::ConditionalBranch {
            cond,
            if_true,
            if_false,
        })
    }
}
