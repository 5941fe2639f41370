//! Text rendering of basic-block lists for logs and tests
//!
//! ```text
//! join_3:
//!   x_2 = phi(x_1 from if_1, x_0 from else_2)
//!   return
//! ```

use crate::features::flow_graph::domain::BasicBlockList;
use crate::shared::models::{ConstValue, IrArena, Node, NodeId, PhiOperand};
use std::fmt::Write;

/// Render every sealed block, in layout order
pub fn render_block_list(blocks: &BasicBlockList, arena: &IrArena) -> String {
    let mut out = String::new();
    for (_, block) in blocks.iter() {
        let _ = writeln!(out, "{}:", block.tag());
        for instruction in block.instructions() {
            let _ = writeln!(out, "  {}", render_instruction(blocks, arena, *instruction));
        }
    }
    out
}

pub fn render_instruction(blocks: &BasicBlockList, arena: &IrArena, id: NodeId) -> String {
    match arena.node(id) {
        Node::ReferenceAssign { target, value } => {
            format!("{} = {}", render_expr(arena, *target), render_expr(arena, *value))
        }
        Node::Phi {
            target, operands, ..
        } => {
            let operands: Vec<String> = operands
                .iter()
                .map(|operand| render_phi_operand(blocks, arena, operand))
                .collect();
            format!("{} = phi({})", render_expr(arena, *target), operands.join(", "))
        }
        Node::Return { value: Some(value) } => format!("return {}", render_expr(arena, *value)),
        Node::Return { value: None } => "return".to_string(),
        Node::UnconditionalBranch { target } => format!("branch {}", blocks.block_tag(*target)),
        Node::ConditionalBranch {
            cond,
            if_true,
            if_false,
        } => format!(
            "cbranch {} ? {} : {}",
            render_expr(arena, *cond),
            blocks.block_tag(*if_true),
            blocks.block_tag(*if_false)
        ),
        _ => render_expr(arena, id),
    }
}

fn render_phi_operand(blocks: &BasicBlockList, arena: &IrArena, operand: &PhiOperand) -> String {
    match (operand.value, operand.predecessor) {
        (_, None) => "_".to_string(),
        (Some(value), Some(pred)) => {
            format!("{} from {}", render_expr(arena, value), blocks.block_tag(pred))
        }
        (None, Some(pred)) => format!("undef from {}", blocks.block_tag(pred)),
    }
}

/// Expression text; nested infix operations are parenthesized
pub fn render_expr(arena: &IrArena, id: NodeId) -> String {
    match arena.node(id) {
        Node::Variable { name, .. } => name.clone(),
        Node::Constant { value, .. } => match value {
            ConstValue::Int(v) => v.to_string(),
            ConstValue::Float(v) => v.to_string(),
            ConstValue::Bool(v) => v.to_string(),
        },
        Node::Operation { op, inputs } => match (op.infix_symbol(), inputs.as_slice()) {
            (Some(symbol), [lhs, rhs]) => format!(
                "{} {} {}",
                render_operand(arena, *lhs),
                symbol,
                render_operand(arena, *rhs)
            ),
            _ => {
                let args: Vec<String> = inputs.iter().map(|i| render_expr(arena, *i)).collect();
                format!("{}({})", op.name(), args.join(", "))
            }
        },
        other => format!("<{}{}>", other.kind_name(), id),
    }
}

fn render_operand(arena: &IrArena, id: NodeId) -> String {
    match arena.node(id) {
        Node::Operation { op, inputs } if op.infix_symbol().is_some() && inputs.len() == 2 => {
            format!("({})", render_expr(arena, id))
        }
        _ => render_expr(arena, id),
    }
}
