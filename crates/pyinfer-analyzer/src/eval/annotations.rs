//! Type annotations.
//!
//! An annotation evaluates to a type; the value it describes is an instance
//! of that type, except for `Type[X]` which describes the type `X` itself.

use pyinfer_ast::{ConstantKind, Expr};
use pyinfer_core::{BuiltinTypeId, Constant, Member, PyType};

use super::{Evaluator, Result};
use crate::scope::LookupOptions;

impl<'ast> Evaluator<'ast, '_> {
    /// The type an annotation denotes. String annotations are forward
    /// references to a name; `None` denotes `NoneType`.
    pub fn evaluate_annotation(&mut self, expr: &Expr<'ast>) -> Result<PyType> {
        if let Expr::Constant(c) = expr {
            return Ok(match c.kind {
                ConstantKind::Str(name) => match self.lookup_name(name.trim(), LookupOptions::NORMAL) {
                    Some(Member::Type(ty)) => ty,
                    _ => PyType::Unknown,
                },
                ConstantKind::None => self.registry.builtin(BuiltinTypeId::NoneType),
                _ => PyType::Unknown,
            });
        }
        Ok(match self.evaluate(expr, LookupOptions::NORMAL)? {
            Member::Type(ty) => ty,
            other if matches!(other.as_constant(), Some(Constant::None)) => {
                self.registry.builtin(BuiltinTypeId::NoneType)
            }
            _ => PyType::Unknown,
        })
    }
}

/// The value described by an annotation type.
pub fn annotation_to_instance(ty: &PyType) -> Member {
    match ty {
        PyType::Class(class) => class.create_instance(),
        PyType::Param(_) => Member::instance_of(ty.clone()),
        _ => Member::Unknown,
    }
}
