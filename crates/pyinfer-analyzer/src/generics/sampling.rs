//! Structural sampling of constructor arguments.
//!
//! When an argument's value matches one of the template's generic bases
//! (`class Stack(List[T])` constructed from a list), the base's parameters
//! are bound from a representative element of the value. Only the first
//! element is sampled.

use pyinfer_core::{BuiltinTypeId, ClassRef, Member, ParamMap, PyType};

/// Whether a base and a value's class denote the same structure.
///
/// Builtin-derived classes match by builtin identity (so `typing.Mapping`
/// matches `dict`); anything else matches by type identity or template.
fn same_structure(base: &ClassRef, value: &ClassRef) -> bool {
    if let (Some(b), Some(v)) = (base.builtin_id(), value.builtin_id()) {
        return b == v;
    }
    let template = |c: &ClassRef| c.template().map_or(c.type_hash(), |t| t.type_hash());
    base.type_hash() == value.type_hash() || template(base) == template(value)
}

/// Bind the parameters of a matching generic base from `value`.
///
/// Returns whether a base matched. Concrete bases discovered this way are
/// pushed onto `new_bases`.
pub(super) fn sample_bases(
    template: &ClassRef,
    value: &Member,
    map: &mut ParamMap,
    new_bases: &mut Vec<PyType>,
) -> bool {
    let value_ty = value.py_type();
    let Some(value_class) = value_ty.as_class() else {
        return false;
    };

    let mut push_base = |ty: &PyType, new_bases: &mut Vec<PyType>| {
        if ty.type_hash() != template.type_hash() && !new_bases.contains(ty) {
            new_bases.push(ty.clone());
        }
    };

    for base in template.bases() {
        let PyType::Class(base) = base else {
            continue;
        };
        if !same_structure(&base, value_class) {
            continue;
        }
        push_base(&value_ty, new_bases);
        if !base.is_generic() {
            return true;
        }

        let params = base.parameters();
        let mut bind = |i: usize, sample: Option<Member>| {
            if let (Some(p), Some(sample)) = (params.get(i), sample)
                && !sample.is_unknown()
                && map.contains(p)
            {
                map.set(p, sample.py_type());
            }
        };

        match base.builtin_id() {
            Some(BuiltinTypeId::Dict) if params.len() == 2 => {
                if let Some(mapping) = value.as_mapping() {
                    bind(0, mapping.first_key().cloned());
                    bind(1, mapping.first_value().cloned());
                }
            }
            Some(BuiltinTypeId::Tuple) => {
                if let Some(collection) = value.as_collection() {
                    let n = collection.len().min(params.len());
                    for (i, item) in collection.contents.iter().take(n).enumerate() {
                        bind(i, Some(item.clone()));
                    }
                }
            }
            Some(_) if params.len() == 1 => {
                bind(0, value.iterate().map(|mut it| it.next_value()));
            }
            _ => {}
        }
        return true;
    }
    false
}
