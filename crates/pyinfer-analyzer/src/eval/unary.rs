//! Unary operators.

use pyinfer_ast::{UnaryExpr, UnaryOp};
use pyinfer_core::{BuiltinTypeId, Constant, Member, PyType};

use super::{Evaluator, Result, calls};
use crate::scope::LookupOptions;

/// Evaluate a unary expression.
///
/// `not` is always a bool. Numeric negation of a literal folds; other numeric
/// operands keep their type. User classes dispatch to their dunder method.
pub fn evaluate_unary<'ast>(
    eval: &mut Evaluator<'ast, '_>,
    expr: &UnaryExpr<'ast>,
    options: LookupOptions,
) -> Result<Member> {
    let operand = eval.evaluate(&expr.operand, options)?;
    if expr.op == UnaryOp::Not {
        return Ok(eval.registry.instance(BuiltinTypeId::Bool));
    }
    if operand.is_unknown() {
        return Ok(Member::Unknown);
    }

    if let Some(folded) = fold(expr.op, operand.as_constant()) {
        return Ok(eval.registry.constant(folded));
    }

    let ty = operand.py_type();
    match ty.builtin_id() {
        Some(BuiltinTypeId::Bool) => Ok(eval.registry.instance(BuiltinTypeId::Int)),
        Some(id) if id.numeric_rank().is_some() => {
            if expr.op == UnaryOp::Invert && id != BuiltinTypeId::Int {
                return Ok(Member::Unknown);
            }
            Ok(eval.registry.instance(id))
        }
        _ => {
            let dunder = match expr.op {
                UnaryOp::Neg => "__neg__",
                UnaryOp::Pos => "__pos__",
                UnaryOp::Invert => "__invert__",
                UnaryOp::Not => return Ok(Member::Unknown),
            };
            let method = match &ty {
                PyType::Class(class) => class.get_member(dunder),
                _ => None,
            };
            match method.as_ref().and_then(Member::as_type).and_then(PyType::as_function) {
                Some(function) => {
                    let function = function.clone();
                    calls::call_function(eval, &function, Some(operand), Vec::new(), Vec::new(), expr.span)
                }
                None => Ok(Member::Unknown),
            }
        }
    }
}

fn fold(op: UnaryOp, constant: Option<&Constant>) -> Option<Constant> {
    match (op, constant?) {
        (UnaryOp::Neg, Constant::Int(v)) => v.checked_neg().map(Constant::Int),
        (UnaryOp::Neg, Constant::Float(v)) => Some(Constant::Float(-*v)),
        (UnaryOp::Pos, Constant::Int(v)) => Some(Constant::Int(*v)),
        (UnaryOp::Pos, Constant::Float(v)) => Some(Constant::Float(*v)),
        (UnaryOp::Invert, Constant::Int(v)) => Some(Constant::Int(!v)),
        _ => None,
    }
}
