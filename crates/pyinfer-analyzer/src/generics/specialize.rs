//! The specialization algorithm.

use std::rc::Rc;

use pyinfer_core::{
    ClassRef, ClassType, GenericParamRef, Member, ParamMap, PyType, SpecializationKey, TypeHash,
};
use tracing::trace;

use super::sampling::sample_bases;
use crate::arguments::ArgumentSet;
use crate::eval::Result;
use crate::Evaluator;

/// Members every class carries that are never copied onto a specialization.
const STRUCTURAL_MEMBERS: [&str; 3] = ["__class__", "__bases__", "__base__"];

/// Marks a specialization as in progress on its template until dropped.
struct InProgress<'c> {
    template: &'c ClassRef,
}

impl<'c> InProgress<'c> {
    fn begin(template: &'c ClassRef, key: SpecializationKey, placeholder: ClassRef) -> Self {
        template.begin_specialization(key, placeholder);
        Self { template }
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.template.end_specialization();
    }
}

impl Evaluator<'_, '_> {
    /// Specialize a generic template with constructor-style arguments.
    ///
    /// Returns the template itself when no parameter could be resolved.
    /// Identical resolved parameters always yield the same class; a
    /// specialization requested while the same one is being built yields
    /// its unfinished placeholder.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn specialize(&mut self, template: &ClassRef, args: &ArgumentSet) -> Result<ClassRef> {
        if let Some(outer) = template.template() {
            return self.specialize(&outer, args);
        }
        self.ensure_constructed(template)?;

        let params = self.type_parameters(template);
        if params.is_empty() {
            return Ok(template.clone());
        }

        // ====================================================================
        // Resolve parameters
        // ====================================================================

        let mut map = ParamMap::identity(&params);
        let mut new_bases: Vec<PyType> = Vec::new();
        let mut consumed = vec![false; args.len()];

        for (i, arg) in args.iter().enumerate() {
            if let PyType::Param(p) = &arg.declared_type
                && map.contains(p)
            {
                let ty = arg.value.py_type();
                if !ty.is_unknown() {
                    map.set(p, ty);
                }
                consumed[i] = true;
            } else if arg.value.as_instance().is_some_and(|v| v.ty().as_param().is_none())
                && sample_bases(template, &arg.value, &mut map, &mut new_bases)
            {
                consumed[i] = true;
            }
        }

        let template_hash = template.type_hash();
        let mut remaining = args
            .iter()
            .enumerate()
            .filter(|(i, arg)| !consumed[*i] && arg.declared_type.type_hash() != template_hash)
            .map(|(_, arg)| arg);
        for param in &params {
            if !map.is_unresolved(param) {
                continue;
            }
            let Some(arg) = remaining.next() else {
                break;
            };
            let ty = arg.value.py_type();
            if !ty.is_unknown() {
                map.set(param, ty);
            }
        }

        resolve_chains(&mut map, &params);
        if params.iter().all(|p| map.is_unresolved(p)) {
            return Ok(template.clone());
        }

        // ====================================================================
        // Cache and reentrancy
        // ====================================================================

        let key = map.key();
        if let Some(cached) = template.cached_specialization(&key) {
            trace!(template = template.name(), class = %cached.display_name(), "specialization cache hit");
            return Ok(cached);
        }
        if let Some(placeholder) = template.in_progress(&key) {
            trace!(template = template.name(), "specialization already in progress");
            return Ok(placeholder);
        }

        let mut placeholder = ClassType::with_hash(
            template.name(),
            template.qualified_name(),
            TypeHash::from_specialization(template_hash, key.hashes()),
            template.builtin_id(),
        )
        .with_flags(template.flags());
        if let Some(node) = template.declaring_node() {
            placeholder = placeholder.with_node(node);
        }
        let class = Rc::new(placeholder);
        class.set_generic_params(map.clone());
        class.set_template(template);

        let guard = InProgress::begin(template, key.clone(), class.clone());

        // ====================================================================
        // Bases and members
        // ====================================================================

        let mut bases: Vec<PyType> = Vec::new();
        for base in template.bases() {
            match base {
                PyType::GenericMarker(_) => {}
                PyType::Class(c) if c.is_generic() => {
                    bases.push(PyType::Class(self.substitute_class(&c, &map)?));
                }
                other => bases.push(other),
            }
        }
        for discovered in new_bases {
            let represented = bases.iter().any(|b| {
                b.type_hash() == discovered.type_hash()
                    || (b.builtin_id().is_some() && b.builtin_id() == discovered.builtin_id())
            });
            if !represented {
                bases.push(discovered);
            }
        }
        class.set_bases(bases);

        let members: Vec<(String, Member)> = template
            .members()
            .iter()
            .filter(|(name, _)| !STRUCTURAL_MEMBERS.contains(name))
            .map(|(name, member)| (name.to_owned(), member))
            .collect();
        for (name, member) in members {
            let member = self.substitute(&member, &map)?;
            class.add_member(name, member, true);
        }

        drop(guard);
        trace!(class = %class.display_name(), "specialized");
        Ok(template.store_specialization(key, class))
    }
}

/// Follow parameters bound to other parameters of the same map
/// (`T -> U`, `U -> int`) to their final value.
fn resolve_chains(map: &mut ParamMap, params: &[GenericParamRef]) {
    for _ in 0..params.len() {
        let mut changed = false;
        for param in params {
            let Some(PyType::Param(target)) = map.get(param).cloned() else {
                continue;
            };
            if target.type_hash() == param.type_hash() || map.is_unresolved(&target) {
                continue;
            }
            if let Some(ty) = map.get(&target).cloned() {
                map.set(param, ty);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}
