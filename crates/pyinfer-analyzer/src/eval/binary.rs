//! Binary operators.
//!
//! Builtin operands follow the numeric tower (`bool < int < float < complex`)
//! and the `str`/`list`/`tuple` concatenation and repetition rules. User
//! classes dispatch to the left operand's dunder method. Anything else is
//! Unknown.

use pyinfer_ast::{BinaryExpr, BinaryOp};
use pyinfer_core::{BuiltinTypeId, Member, PyType};

use super::{Evaluator, Result, calls};
use crate::scope::LookupOptions;

/// Dunder method implementing an arithmetic or bitwise operator.
fn dunder(op: BinaryOp) -> Option<&'static str> {
    Some(match op {
        BinaryOp::Add => "__add__",
        BinaryOp::Sub => "__sub__",
        BinaryOp::Mul => "__mul__",
        BinaryOp::Div => "__truediv__",
        BinaryOp::FloorDiv => "__floordiv__",
        BinaryOp::Mod => "__mod__",
        BinaryOp::Pow => "__pow__",
        BinaryOp::BitAnd => "__and__",
        BinaryOp::BitOr => "__or__",
        BinaryOp::BitXor => "__xor__",
        BinaryOp::LShift => "__lshift__",
        BinaryOp::RShift => "__rshift__",
        _ => return None,
    })
}

/// Result of a binary operator on two builtin operand types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuiltinResult {
    Instance(BuiltinTypeId),
    /// The left operand's value, keeping its contents.
    Left,
    Right,
    /// The operand types can never be combined.
    Unsupported,
    Unknown,
}

fn is_bitwise(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::LShift | BinaryOp::RShift
    )
}

fn builtin_result(l: BuiltinTypeId, op: BinaryOp, r: BuiltinTypeId) -> BuiltinResult {
    use BuiltinTypeId::*;

    if let (Some(lr), Some(rr)) = (l.numeric_rank(), r.numeric_rank()) {
        let shift = matches!(op, BinaryOp::LShift | BinaryOp::RShift);
        let rank = lr.max(rr);
        return match rank {
            0 if is_bitwise(op) && !shift => BuiltinResult::Instance(Bool),
            _ if is_bitwise(op) && rank > 1 => BuiltinResult::Unsupported,
            0 | 1 if op == BinaryOp::Div => BuiltinResult::Instance(Float),
            0 | 1 => BuiltinResult::Instance(Int),
            2 => BuiltinResult::Instance(Float),
            _ => BuiltinResult::Instance(Complex),
        };
    }

    let int_like = |id: BuiltinTypeId| matches!(id, Int | Bool);
    match (l, op, r) {
        (Str, BinaryOp::Add, Str) | (Bytes, BinaryOp::Add, Bytes) => BuiltinResult::Instance(l),
        (Str | Bytes, BinaryOp::Mod, _) => BuiltinResult::Instance(l),
        (Str | Bytes, BinaryOp::Mul, n) if int_like(n) => BuiltinResult::Instance(l),
        (n, BinaryOp::Mul, Str | Bytes) if int_like(n) => BuiltinResult::Instance(r),
        (List, BinaryOp::Add, List) | (Tuple, BinaryOp::Add, Tuple) => BuiltinResult::Left,
        (List | Tuple, BinaryOp::Mul, n) if int_like(n) => BuiltinResult::Left,
        (n, BinaryOp::Mul, List | Tuple) if int_like(n) => BuiltinResult::Right,
        _ => {
            let textual = |id: BuiltinTypeId| matches!(id, Str | Bytes);
            let numeric = |id: BuiltinTypeId| id.numeric_rank().is_some();
            if (textual(l) && (numeric(r) || textual(r))) || (numeric(l) && textual(r)) {
                BuiltinResult::Unsupported
            } else {
                BuiltinResult::Unknown
            }
        }
    }
}

/// Whether `op` can never apply to operands of these evaluated values.
///
/// Only builtin operand types are judged; Unknown operands never are.
pub(crate) fn unsupported_operands(op: BinaryOp, left: &Member, right: &Member) -> bool {
    if op.is_logical() || op.is_comparison() || left.is_unknown() || right.is_unknown() {
        return false;
    }
    match (left.py_type().builtin_id(), right.py_type().builtin_id()) {
        (Some(l), Some(r)) => builtin_result(l, op, r) == BuiltinResult::Unsupported,
        _ => false,
    }
}

/// Evaluate a binary expression.
///
/// Incompatible operands evaluate to Unknown without a diagnostic; the
/// statement walker reports them.
pub fn evaluate_binary<'ast>(
    eval: &mut Evaluator<'ast, '_>,
    expr: &BinaryExpr<'ast>,
    options: LookupOptions,
) -> Result<Member> {
    let left = eval.evaluate(&expr.left, options)?;
    let right = eval.evaluate(&expr.right, options)?;

    if expr.op.is_logical() {
        return Ok(Member::union([left, right]));
    }
    if expr.op.is_comparison() {
        return Ok(eval.registry.instance(BuiltinTypeId::Bool));
    }
    if left.is_unknown() || right.is_unknown() {
        return Ok(Member::Unknown);
    }

    let (left_ty, right_ty) = (left.py_type(), right.py_type());
    match (left_ty.builtin_id(), right_ty.builtin_id()) {
        (Some(l), Some(r)) => Ok(match builtin_result(l, expr.op, r) {
            BuiltinResult::Instance(id) => eval.registry.instance(id),
            BuiltinResult::Left => left,
            BuiltinResult::Right => right,
            BuiltinResult::Unsupported | BuiltinResult::Unknown => Member::Unknown,
        }),
        _ => dispatch(eval, expr, left, right, &left_ty),
    }
}

/// Call the left operand's dunder method.
fn dispatch<'ast>(
    eval: &mut Evaluator<'ast, '_>,
    expr: &BinaryExpr<'ast>,
    left: Member,
    right: Member,
    left_ty: &PyType,
) -> Result<Member> {
    let (Some(name), Some(class)) = (dunder(expr.op), left_ty.as_class()) else {
        return Ok(Member::Unknown);
    };
    if !left.is_instance() {
        return Ok(Member::Unknown);
    }
    eval.ensure_constructed(class)?;
    let method = class.get_member(name);
    match method.as_ref().and_then(Member::as_type).and_then(PyType::as_function) {
        Some(function) => {
            let function = function.clone();
            calls::call_function(eval, &function, Some(left), vec![right], Vec::new(), expr.span)
        }
        None => Ok(Member::Unknown),
    }
}
