//! Literal constants.

use std::rc::Rc;

use ordered_float::OrderedFloat;
use pyinfer_ast::ConstantKind;
use pyinfer_core::Constant;

/// The value of a literal.
pub fn constant_value(kind: &ConstantKind<'_>) -> Constant {
    match kind {
        ConstantKind::Int(v) => Constant::Int(*v),
        ConstantKind::Float(v) => Constant::Float(OrderedFloat(*v)),
        ConstantKind::Str(s) => Constant::Str(Rc::from(*s)),
        ConstantKind::Bytes(b) => Constant::Bytes(Rc::from(*b)),
        ConstantKind::Bool(b) => Constant::Bool(*b),
        ConstantKind::None => Constant::None,
        ConstantKind::Ellipsis => Constant::Ellipsis,
    }
}
