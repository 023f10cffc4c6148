//! Ordered generic parameters of a class.

use pyinfer_core::{ClassRef, GenericParamRef, PyType};

use crate::Evaluator;

impl Evaluator<'_, '_> {
    /// The generic parameters of a template, in order.
    ///
    /// An explicit `Generic[...]` base fixes the order. Otherwise the open
    /// parameters of the bases come first, then the class's own, without
    /// duplicates.
    pub fn type_parameters(&self, class: &ClassRef) -> Vec<GenericParamRef> {
        if let Some(explicit) = class.explicit_params() {
            return explicit;
        }
        let mut out: Vec<GenericParamRef> = Vec::new();
        let mut push = |p: GenericParamRef| {
            if !out.iter().any(|q| q.type_hash() == p.type_hash()) {
                out.push(p);
            }
        };
        for base in class.bases() {
            if let PyType::Class(base) = base {
                base.parameters().into_iter().for_each(&mut push);
            }
        }
        class.parameters().into_iter().for_each(&mut push);
        out
    }
}
