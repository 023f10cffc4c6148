//! Parameter substitution.

use std::rc::Rc;

use pyinfer_core::{
    ClassRef, GenericParam, Instance, InstanceValue, Member, ParamMap, PyType, Span,
};

use crate::arguments::ArgumentSet;
use crate::eval::Result;
use crate::Evaluator;

/// What `param` resolves to in `map`, if it is bound to something other
/// than itself.
fn resolve(param: &GenericParam, map: &ParamMap) -> Option<PyType> {
    match map.get(param) {
        Some(PyType::Param(p)) if p.type_hash() == param.type_hash() => None,
        Some(ty) => Some(ty.clone()),
        None => None,
    }
}

impl Evaluator<'_, '_> {
    /// Replace generic parameters inside a member.
    ///
    /// Instances of a parameter become instances of what it resolves to;
    /// generic classes are specialized with their parameters replaced.
    /// Parameters the map leaves open are kept.
    pub fn substitute(&mut self, value: &Member, map: &ParamMap) -> Result<Member> {
        Ok(match value {
            Member::Unknown => Member::Unknown,
            Member::Union(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items.iter() {
                    out.push(self.substitute(item, map)?);
                }
                Member::union(out)
            }
            Member::Type(ty) => Member::of_type(self.substitute_type(ty, map)?),
            Member::Instance(instance) => match instance.ty() {
                PyType::Param(p) => match resolve(p, map) {
                    Some(PyType::Class(class)) => class.create_instance(),
                    Some(ty) => Member::instance_of(ty),
                    None => value.clone(),
                },
                PyType::Class(class) => {
                    let specialized = self.substitute_class(class, map)?;
                    let ty = PyType::Class(specialized.clone());
                    match instance.value() {
                        InstanceValue::Object if !Rc::ptr_eq(&specialized, class) => {
                            specialized.create_instance()
                        }
                        InstanceValue::Sequence(c) => {
                            let mut contents = Vec::with_capacity(c.contents.len());
                            for item in &c.contents {
                                contents.push(self.substitute(item, map)?);
                            }
                            Member::from_instance(Instance::sequence(ty, contents, c.exact))
                        }
                        InstanceValue::Mapping(m) => {
                            let mut entries = Vec::with_capacity(m.entries.len());
                            for (k, v) in &m.entries {
                                entries.push((self.substitute(k, map)?, self.substitute(v, map)?));
                            }
                            Member::from_instance(Instance::mapping(ty, entries, m.exact))
                        }
                        InstanceValue::Iterator(element) => {
                            let element = self.substitute(element, map)?;
                            Member::from_instance(Instance::iterator(ty, element))
                        }
                        _ => value.clone(),
                    }
                }
                _ => value.clone(),
            },
        })
    }

    fn substitute_type(&mut self, ty: &PyType, map: &ParamMap) -> Result<PyType> {
        Ok(match ty {
            PyType::Param(p) => resolve(p, map).unwrap_or_else(|| ty.clone()),
            PyType::Class(class) => PyType::Class(self.substitute_class(class, map)?),
            _ => ty.clone(),
        })
    }

    /// Specialize a generic class with its open parameters replaced through
    /// `map`. Classes with nothing to replace are returned unchanged.
    pub(crate) fn substitute_class(&mut self, class: &ClassRef, map: &ParamMap) -> Result<ClassRef> {
        if !class.is_generic() {
            return Ok(class.clone());
        }
        let template = class.template().unwrap_or_else(|| class.clone());
        let own = class.generic_params();
        let mut changed = false;
        let types: Vec<PyType> = self
            .type_parameters(&template)
            .into_iter()
            .map(|p| {
                let current = own.get(&p).cloned().unwrap_or(PyType::Param(p));
                match current.as_param().and_then(|q| resolve(q, map)) {
                    Some(ty) => {
                        changed = true;
                        ty
                    }
                    None => current,
                }
            })
            .collect();
        if !changed {
            return Ok(class.clone());
        }
        self.specialize(&template, &ArgumentSet::from_types(types, Span::default()))
    }
}

/// Parameters resolved by a method's receiver.
///
/// Collects the resolved parameters of the receiver's class and everything
/// in its resolution order. A literal collection of an unspecialized builtin
/// (`[1, 2]`) binds the class's open parameters from its first element.
pub fn receiver_params(receiver: &Member) -> ParamMap {
    let mut map = ParamMap::new();
    let class = match receiver {
        Member::Instance(instance) => instance.ty().as_class().cloned(),
        Member::Type(PyType::Class(class)) => Some(class.clone()),
        _ => None,
    };
    let Some(class) = class else {
        return map;
    };

    let mut merge = |params: ParamMap| {
        for (param, ty) in params.iter() {
            let open = ty.as_param().is_some_and(|p| p.type_hash() == param.type_hash());
            if !open && !map.contains(param) {
                map.set(param, ty.clone());
            }
        }
    };
    merge(class.generic_params());
    for base in class.mro() {
        merge(base.generic_params());
    }

    let open = class.parameters();
    let samples: Vec<Member> = match receiver.as_instance().map(Instance::value) {
        Some(InstanceValue::Sequence(c)) => c.first().cloned().into_iter().collect(),
        Some(InstanceValue::Mapping(m)) => match (m.first_key(), m.first_value()) {
            (Some(k), Some(v)) => vec![k.clone(), v.clone()],
            _ => Vec::new(),
        },
        Some(InstanceValue::Iterator(element)) => vec![element.clone()],
        _ => Vec::new(),
    };
    for (param, sample) in open.iter().zip(samples) {
        if !sample.is_unknown() && map.is_unresolved(param) {
            map.set(param, sample.py_type());
        }
    }
    map
}

/// Replace whatever still refers to an open parameter with Unknown.
pub fn erase_params(value: Member) -> Member {
    match value {
        Member::Type(PyType::Param(_)) => Member::Unknown,
        Member::Instance(ref instance) if instance.ty().as_param().is_some() => Member::Unknown,
        Member::Union(items) => Member::union(items.iter().cloned().map(erase_params)),
        other => other,
    }
}
