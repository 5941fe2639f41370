//! IR node kinds
//!
//! The node set is closed: structured statements (consumed by lowering),
//! expression nodes (kept as-is inside basic blocks) and the control-flow
//! nodes produced by lowering and SSA construction.

use super::ids::{BlockId, NodeId};
use serde::{Deserialize, Serialize};

/// Numeric format attached to variables and constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Binary32,
    Binary64,
    Int32,
    Int64,
    Bool,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Binary32 => "binary32",
            Precision::Binary64 => "binary64",
            Precision::Int32 => "int32",
            Precision::Int64 => "int64",
            Precision::Bool => "bool",
        }
    }
}

/// Storage class of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Function argument, implicitly defined on function entry
    Input,
    /// Local storage, must be assigned before use
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
    NotEqual,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpCode {
    Add,
    Sub,
    Mul,
    Div,
    Negate,
    FusedMultiplyAdd,
    Compare(Comparison),
    LogicalAnd,
    LogicalOr,
    LogicalNot,
    Call(String),
}

impl OpCode {
    /// Infix symbol for binary operators, `None` for prefix/call forms
    pub fn infix_symbol(&self) -> Option<&'static str> {
        match self {
            OpCode::Add => Some("+"),
            OpCode::Sub => Some("-"),
            OpCode::Mul => Some("*"),
            OpCode::Div => Some("/"),
            OpCode::Compare(cmp) => Some(cmp.symbol()),
            OpCode::LogicalAnd => Some("&&"),
            OpCode::LogicalOr => Some("||"),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Mul => "mul",
            OpCode::Div => "div",
            OpCode::Negate => "neg",
            OpCode::FusedMultiplyAdd => "fma",
            OpCode::Compare(_) => "cmp",
            OpCode::LogicalAnd => "and",
            OpCode::LogicalOr => "or",
            OpCode::LogicalNot => "not",
            OpCode::Call(name) => name,
        }
    }
}

/// One incoming (value, predecessor) pair of a phi node.
///
/// Freshly placed phis carry empty operands (`predecessor == None`);
/// renaming fills one slot per incoming edge. A filled slot whose value is
/// `None` means the variable is undefined along that edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhiOperand {
    pub value: Option<NodeId>,
    pub predecessor: Option<BlockId>,
}

impl PhiOperand {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.predecessor.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Variable {
        name: String,
        kind: VariableKind,
        precision: Option<Precision>,
    },
    Constant {
        value: ConstValue,
        precision: Option<Precision>,
    },
    Operation {
        op: OpCode,
        inputs: Vec<NodeId>,
    },
    ReferenceAssign {
        target: NodeId,
        value: NodeId,
    },
    Statement {
        children: Vec<NodeId>,
    },
    ConditionBlock {
        cond: NodeId,
        if_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    Loop {
        init: NodeId,
        cond: NodeId,
        body: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    UnconditionalBranch {
        target: BlockId,
    },
    ConditionalBranch {
        cond: NodeId,
        if_true: BlockId,
        if_false: BlockId,
    },
    /// `variable` is the original (pre-SSA) variable merged by this phi,
    /// `target` the definition it produces (renamed in place).
    Phi {
        variable: NodeId,
        target: NodeId,
        operands: Vec<PhiOperand>,
    },
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Variable { .. } => "Variable",
            Node::Constant { .. } => "Constant",
            Node::Operation { .. } => "Operation",
            Node::ReferenceAssign { .. } => "ReferenceAssign",
            Node::Statement { .. } => "Statement",
            Node::ConditionBlock { .. } => "ConditionBlock",
            Node::Loop { .. } => "Loop",
            Node::Return { .. } => "Return",
            Node::UnconditionalBranch { .. } => "UnconditionalBranch",
            Node::ConditionalBranch { .. } => "ConditionalBranch",
            Node::Phi { .. } => "Phi",
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Node::Variable { .. })
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Node::Constant { .. })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Variable { .. } | Node::Constant { .. })
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, Node::Phi { .. })
    }

    /// Branches and returns: the only nodes allowed to end a basic block
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Node::UnconditionalBranch { .. } | Node::ConditionalBranch { .. } | Node::Return { .. }
        )
    }

    /// Structured control constructs, only valid before lowering
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            Node::Statement { .. } | Node::ConditionBlock { .. } | Node::Loop { .. }
        )
    }

    /// Block targets of a branch terminator (empty for anything else)
    pub fn branch_targets(&self) -> Vec<BlockId> {
        match self {
            Node::UnconditionalBranch { target } => vec![*target],
            Node::ConditionalBranch {
                if_true, if_false, ..
            } => vec![*if_true, *if_false],
            _ => Vec::new(),
        }
    }

    /// Node operands in a fixed order (blocks are not nodes and are not
    /// listed). For `ReferenceAssign` the target comes first; for `Phi` the
    /// target is followed by the filled operand values.
    pub fn inputs(&self) -> Vec<NodeId> {
        match self {
            Node::Variable { .. } | Node::Constant { .. } => Vec::new(),
            Node::Operation { inputs, .. } => inputs.clone(),
            Node::ReferenceAssign { target, value } => vec![*target, *value],
            Node::Statement { children } => children.clone(),
            Node::ConditionBlock {
                cond,
                if_branch,
                else_branch,
            } => {
                let mut inputs = vec![*cond, *if_branch];
                inputs.extend(else_branch.iter().copied());
                inputs
            }
            Node::Loop { init, cond, body } => vec![*init, *cond, *body],
            Node::Return { value } => value.iter().copied().collect(),
            Node::UnconditionalBranch { .. } => Vec::new(),
            Node::ConditionalBranch { cond, .. } => vec![*cond],
            Node::Phi {
                target, operands, ..
            } => {
                let mut inputs = vec![*target];
                inputs.extend(operands.iter().filter_map(|operand| operand.value));
                inputs
            }
        }
    }

    /// Mutable view of the operands, in the same order as [`Node::inputs`]
    pub fn inputs_mut(&mut self) -> Vec<&mut NodeId> {
        match self {
            Node::Variable { .. } | Node::Constant { .. } => Vec::new(),
            Node::Operation { inputs, .. } => inputs.iter_mut().collect(),
            Node::ReferenceAssign { target, value } => vec![target, value],
            Node::Statement { children } => children.iter_mut().collect(),
            Node::ConditionBlock {
                cond,
                if_branch,
                else_branch,
            } => {
                let mut inputs = vec![cond, if_branch];
                inputs.extend(else_branch.iter_mut());
                inputs
            }
            Node::Loop { init, cond, body } => vec![init, cond, body],
            Node::Return { value } => value.iter_mut().collect(),
            Node::UnconditionalBranch { .. } => Vec::new(),
            Node::ConditionalBranch { cond, .. } => vec![cond],
            Node::Phi {
                target, operands, ..
            } => {
                let mut inputs = vec![target];
                inputs.extend(operands.iter_mut().filter_map(|operand| operand.value.as_mut()));
                inputs
            }
        }
    }

    /// Number of leading operands that are definitions rather than uses
    pub fn defined_input_count(&self) -> usize {
        match self {
            Node::ReferenceAssign { .. } | Node::Phi { .. } => 1,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inputs_and_inputs_mut_agree() {
        let mut node = Node::Phi {
            variable: NodeId::new(0),
            target: NodeId::new(0),
            operands: vec![
                PhiOperand {
                    value: Some(NodeId::new(3)),
                    predecessor: Some(BlockId::new(1)),
                },
                PhiOperand::empty(),
            ],
        };

        let inputs = node.inputs();
        let inputs_mut: Vec<NodeId> = node.inputs_mut().into_iter().map(|id| *id).collect();
        assert_eq!(inputs, inputs_mut);
        assert_eq!(inputs, vec![NodeId::new(0), NodeId::new(3)]);
    }

    #[test]
    fn test_branch_targets() {
        let branch = Node::ConditionalBranch {
            cond: NodeId::new(0),
            if_true: BlockId::new(1),
            if_false: BlockId::new(2),
        };
        assert!(branch.is_terminator());
        assert_eq!(branch.branch_targets(), vec![BlockId::new(1), BlockId::new(2)]);
        assert!(Node::Return { value: None }.branch_targets().is_empty());
    }

    #[test]
    fn test_reference_assign_defines_first_input() {
        let assign = Node::ReferenceAssign {
            target: NodeId::new(1),
            value: NodeId::new(2),
        };
        assert_eq!(assign.defined_input_count(), 1);
        assert_eq!(assign.inputs()[0], NodeId::new(1));
    }
}
