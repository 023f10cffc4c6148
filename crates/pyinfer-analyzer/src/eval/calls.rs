//! Calls.
//!
//! Calling a class instantiates it (specializing generic user classes from
//! the constructor arguments), calling a function evaluates it on demand and
//! returns its return value with generic parameters substituted from the
//! receiver and the arguments.

use std::rc::Rc;

use pyinfer_ast::{ArgumentKind, CallExpr, Expr};
use pyinfer_core::{
    BuiltinTypeId, ClassFlags, ClassRef, FunctionRef, GenericParam, Instance, Member, PyType, Span,
};

use super::{Evaluator, Result};
use crate::arguments::ArgumentSet;
use crate::scope::LookupOptions;

/// Evaluate a call expression.
pub fn evaluate_call<'ast>(
    eval: &mut Evaluator<'ast, '_>,
    call: &CallExpr<'ast>,
    options: LookupOptions,
) -> Result<Member> {
    let (callee, receiver) = match &call.callee {
        Expr::Member(m) => {
            let target = eval.evaluate(&m.target, options)?;
            let callee = eval.get_attribute(&target, m.name.name)?;
            (callee, Some(target))
        }
        other => (eval.evaluate(other, options)?, None),
    };

    let mut positional = Vec::with_capacity(call.args.len());
    let mut keywords = Vec::new();
    for arg in call.args {
        let value = eval.evaluate(&arg.value, options)?;
        match (arg.kind, &arg.name) {
            (ArgumentKind::Star, _) => match value.as_collection() {
                Some(c) if c.is_exact() => positional.extend(c.contents.iter().cloned()),
                _ => {}
            },
            (ArgumentKind::DoubleStar, _) => {}
            (ArgumentKind::Positional, Some(name)) => keywords.push((name.name.to_string(), value)),
            (ArgumentKind::Positional, None) => positional.push(value),
        }
    }

    call_member(eval, &callee, receiver, positional, keywords, call.span)
}

/// Call an evaluated member.
///
/// `target` is the object the callee was looked up on, if any; whether it
/// binds as the receiver depends on the callee's kind.
pub fn call_member(
    eval: &mut Evaluator<'_, '_>,
    callee: &Member,
    target: Option<Member>,
    positional: Vec<Member>,
    keywords: Vec<(String, Member)>,
    span: Span,
) -> Result<Member> {
    match callee {
        Member::Unknown => Ok(Member::Unknown),
        Member::Union(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items.iter() {
                values.push(call_member(
                    eval,
                    item,
                    target.clone(),
                    positional.clone(),
                    keywords.clone(),
                    span,
                )?);
            }
            Ok(Member::union(values))
        }
        Member::Type(PyType::Class(class)) => instantiate(eval, class, positional, keywords, span),
        Member::Type(PyType::Function(function)) => {
            if eval.registry.is_type_var(function) {
                return Ok(type_var(&positional, &keywords));
            }
            let receiver = target.and_then(|t| bind_receiver(function, t));
            call_function(eval, function, receiver, positional, keywords, span)
        }
        Member::Type(_) => Ok(Member::Unknown),
        Member::Instance(instance) => {
            let call = match instance.ty() {
                PyType::Class(class) => {
                    eval.ensure_constructed(class)?;
                    class.get_member("__call__")
                }
                _ => None,
            };
            match call.as_ref().and_then(Member::as_type).and_then(PyType::as_function) {
                Some(function) => {
                    let function = function.clone();
                    call_function(eval, &function, Some(callee.clone()), positional, keywords, span)
                }
                None => Ok(Member::Unknown),
            }
        }
    }
}

/// What a method looked up on `target` receives as its first argument.
fn bind_receiver(function: &FunctionRef, target: Member) -> Option<Member> {
    if function.is_static() || !function.is_method() {
        return None;
    }
    match (&target, function.is_class_method()) {
        (Member::Instance(instance), true) => Some(Member::of_type(instance.ty().clone())),
        (Member::Instance(_), false) => Some(target),
        (Member::Type(_), true) => Some(target),
        _ => None,
    }
}

/// Call a function and substitute generic parameters in its return value.
///
/// A function still being evaluated (recursion) yields its current partial
/// return value.
pub fn call_function(
    eval: &mut Evaluator<'_, '_>,
    function: &FunctionRef,
    receiver: Option<Member>,
    positional: Vec<Member>,
    keywords: Vec<(String, Member)>,
    span: Span,
) -> Result<Member> {
    eval.evaluate_function(function)?;
    let Some(overload) = function.first_overload() else {
        return Ok(Member::Unknown);
    };

    let mut map = match &receiver {
        Some(receiver) => crate::generics::receiver_params(receiver),
        None => Default::default(),
    };
    let args = ArgumentSet::for_call(&overload.parameters(), receiver, positional, keywords, span);
    for arg in args.iter() {
        if let PyType::Param(p) = &arg.declared_type {
            let ty = arg.value.py_type();
            if !ty.is_unknown() && map.is_unresolved(p) {
                map.set(p, ty);
            }
        }
    }

    let value = overload.return_value();
    let value = if map.is_empty() {
        value
    } else {
        eval.substitute(&value, &map)?
    };
    Ok(crate::generics::erase_params(value))
}

/// Instantiate a class.
fn instantiate(
    eval: &mut Evaluator<'_, '_>,
    class: &ClassRef,
    positional: Vec<Member>,
    keywords: Vec<(String, Member)>,
    span: Span,
) -> Result<Member> {
    if class.has_flag(ClassFlags::BUILTIN) {
        return Ok(instantiate_builtin(eval, class, &positional));
    }

    eval.ensure_constructed(class)?;
    if !class.is_generic() {
        return Ok(class.create_instance());
    }

    let init = class
        .get_member("__init__")
        .and_then(|m| m.as_type().and_then(PyType::as_function).cloned())
        .and_then(|f| f.first_overload());
    let args = match init {
        // the receiver does not exist yet; it only carries the declared type
        Some(overload) => ArgumentSet::for_call(
            &overload.parameters(),
            Some(Member::Unknown),
            positional,
            keywords,
            span,
        ),
        None => ArgumentSet::positional(positional, span),
    };
    let specialized = eval.specialize(class, &args)?;
    Ok(specialized.create_instance())
}

/// `list(x)`, `type(x)`, `int()` and friends.
fn instantiate_builtin(eval: &Evaluator<'_, '_>, class: &ClassRef, positional: &[Member]) -> Member {
    match (class.builtin_id(), positional) {
        (Some(BuiltinTypeId::Type), [value]) => Member::of_type(value.py_type()),
        (Some(id @ (BuiltinTypeId::List | BuiltinTypeId::Tuple | BuiltinTypeId::Set)), [iterable]) => {
            match iterable.iterate().map(|mut it| it.next_value()) {
                Some(sample) if !sample.is_unknown() => Member::from_instance(Instance::sequence(
                    eval.registry.builtin(id),
                    vec![sample],
                    false,
                )),
                _ => class.create_instance(),
            }
        }
        _ => class.create_instance(),
    }
}

/// `TypeVar('T', *constraints, bound=...)`.
fn type_var(positional: &[Member], keywords: &[(String, Member)]) -> Member {
    let Some(name) = positional
        .first()
        .and_then(Member::as_constant)
        .and_then(|c| c.as_str())
    else {
        return Member::Unknown;
    };
    let constraints: Vec<PyType> = positional[1..]
        .iter()
        .filter_map(|m| m.as_type().cloned())
        .collect();
    let mut param = GenericParam::new(name).with_constraints(constraints);
    if let Some(bound) = keywords
        .iter()
        .find(|(k, _)| k == "bound")
        .and_then(|(_, v)| v.as_type())
    {
        param = param.with_bound(bound.clone());
    }
    Member::Type(PyType::Param(Rc::new(param)))
}
