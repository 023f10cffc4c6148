//! Collection literals, indexing and comprehensions.
//!
//! Literals are evaluated up to [`AnalysisOptions::max_collection_size`]
//! items; a literal with more items produces an inexact collection holding
//! the first ones. Comprehensions sample one representative element.
//!
//! [`AnalysisOptions::max_collection_size`]: crate::AnalysisOptions

use pyinfer_ast::{
    ComprehensionClause, ComprehensionExpr, ComprehensionKind, DictExpr, Expr, IndexExpr,
    SequenceExpr,
};
use pyinfer_core::{BuiltinTypeId, Constant, Instance, Lint, Member, PyType, Span};
use rustc_hash::FxHashMap;

use super::{Evaluator, Result, calls};
use crate::arguments::ArgumentSet;
use crate::scope::{LookupOptions, ScopeKind, VariableKind};

// ============================================================================
// Literals
// ============================================================================

/// `[...]`, `(...)` and `{...}` set literals.
pub fn evaluate_sequence<'ast>(
    eval: &mut Evaluator<'ast, '_>,
    seq: &SequenceExpr<'ast>,
    id: BuiltinTypeId,
    options: LookupOptions,
) -> Result<Member> {
    let max = eval.options.max_collection_size;
    let mut contents = Vec::with_capacity(seq.items.len().min(max));
    for item in seq.items.iter().take(max) {
        contents.push(eval.evaluate(item, options)?);
    }
    let exact = seq.items.len() <= max;
    let ty = eval.registry.builtin(id);
    Ok(Member::from_instance(Instance::sequence(ty, contents, exact)))
}

/// `{k: v, ...}` literals. Later entries with an equal constant key replace
/// earlier ones.
pub fn evaluate_dict<'ast>(
    eval: &mut Evaluator<'ast, '_>,
    dict: &DictExpr<'ast>,
    options: LookupOptions,
) -> Result<Member> {
    let max = eval.options.max_collection_size;
    let mut entries: Vec<(Member, Member)> = Vec::new();
    let mut by_key: FxHashMap<Constant, usize> = FxHashMap::default();
    for entry in dict.entries.iter().take(max) {
        let key = eval.evaluate(&entry.key, options)?;
        let value = eval.evaluate(&entry.value, options)?;
        if let Some(constant) = key.as_constant() {
            if let Some(&i) = by_key.get(constant) {
                entries[i].1 = value;
                continue;
            }
            by_key.insert(constant.clone(), entries.len());
        }
        entries.push((key, value));
    }
    let exact = dict.entries.len() <= max;
    let ty = eval.registry.builtin(BuiltinTypeId::Dict);
    Ok(Member::from_instance(Instance::mapping(ty, entries, exact)))
}

// ============================================================================
// Indexing
// ============================================================================

/// `target[index]`.
///
/// Resolution order: generic type indexing (`List[int]`, `Generic[T]`),
/// slices and tuples (the container itself), tracked sequence and mapping
/// contents, then the target's `__getitem__`.
pub fn evaluate_index<'ast>(
    eval: &mut Evaluator<'ast, '_>,
    expr: &IndexExpr<'ast>,
    options: LookupOptions,
) -> Result<Member> {
    let target = eval.evaluate(&expr.target, options)?;
    if target.is_unknown() {
        return Ok(Member::Unknown);
    }

    if let Member::Type(PyType::Class(class)) = &target {
        let items: &[Expr<'ast>] = match &expr.index {
            Expr::Tuple(t) => t.items,
            single => std::slice::from_ref(single),
        };
        if eval.registry.is_generic_marker(class) {
            let mut params = Vec::with_capacity(items.len());
            for item in items {
                if let Member::Type(PyType::Param(p)) = eval.evaluate(item, options)? {
                    params.push(p);
                }
            }
            return Ok(Member::Type(PyType::GenericMarker(params.into())));
        }
        if class.is_generic() {
            let mut types = Vec::with_capacity(items.len());
            for item in items {
                types.push(eval.evaluate_annotation(item)?);
            }
            let args = ArgumentSet::from_types(types, expr.span);
            let specialized = eval.specialize(class, &args)?;
            return Ok(Member::Type(PyType::Class(specialized)));
        }
    }

    if matches!(expr.index, Expr::Slice(_) | Expr::Tuple(_)) {
        return Ok(target);
    }

    let index = eval.evaluate(&expr.index, options)?;

    if let Some(collection) = target.as_collection()
        && target.py_type().builtin_id().is_some_and(BuiltinTypeId::is_sequence)
    {
        let int_like = index.is_unknown()
            || matches!(
                index.py_type().builtin_id(),
                Some(BuiltinTypeId::Int | BuiltinTypeId::Bool)
            );
        if !int_like {
            eval.report(
                Lint::BadIndexType {
                    type_name: index.py_type().name().into_owned(),
                },
                expr.index.span(),
            );
            return Ok(collection.first().cloned().unwrap_or_default());
        }
        return Ok(match index.as_constant().and_then(Constant::as_int) {
            Some(i) => match collection.get(i) {
                Some(m) => m.clone(),
                None if collection.is_exact() => Member::Unknown,
                None => collection.first().cloned().unwrap_or_default(),
            },
            None => collection.first().cloned().unwrap_or_default(),
        });
    }

    if let Some(mapping) = target.as_mapping() {
        let hit = index.as_constant().and_then(|key| mapping.get(key));
        return Ok(hit.or_else(|| mapping.first_value()).cloned().unwrap_or_default());
    }

    let getitem = match target.py_type() {
        PyType::Class(class) if target.is_instance() => {
            eval.ensure_constructed(&class)?;
            class.get_member("__getitem__")
        }
        _ => None,
    };
    match getitem.as_ref().and_then(Member::as_type).and_then(PyType::as_function) {
        Some(function) => {
            let function = function.clone();
            calls::call_function(eval, &function, Some(target), vec![index], Vec::new(), expr.span)
        }
        None => Ok(Member::Unknown),
    }
}

// ============================================================================
// Comprehensions
// ============================================================================

/// List, set and dict comprehensions and generator expressions.
///
/// A generator expression evaluates to its first iterable. The others open
/// a comprehension scope, bind each `for` target to one sample element and
/// return a collection holding one sample of the element expression.
pub fn evaluate_comprehension<'ast>(
    eval: &mut Evaluator<'ast, '_>,
    comp: &ComprehensionExpr<'ast>,
    options: LookupOptions,
) -> Result<Member> {
    let first_iterable = match comp.first_for() {
        Some((_, iter)) => eval.evaluate(iter, options)?,
        None => Member::Unknown,
    };
    if comp.kind == ComprehensionKind::Generator {
        return Ok(first_iterable);
    }

    let mut scope = eval.open_scope(comp.id, ScopeKind::Comprehension);
    let mut first_iterable = Some(first_iterable);
    for clause in comp.clauses {
        match clause {
            ComprehensionClause::For { target, iter, span } => {
                let iterable = match first_iterable.take() {
                    Some(value) => value,
                    None => scope.evaluate(iter, options)?,
                };
                scope.bind_iteration_target(target, &iterable, *span)?;
            }
            ComprehensionClause::If { test, .. } => {
                scope.evaluate(test, options)?;
            }
        }
    }

    let element = scope.evaluate(&comp.element, options)?;
    let registry = scope.registry;
    let instance = match comp.kind {
        ComprehensionKind::Dict => {
            let value = match &comp.value {
                Some(value) => scope.evaluate(value, options)?,
                None => Member::Unknown,
            };
            Instance::mapping(registry.builtin(BuiltinTypeId::Dict), vec![(element, value)], false)
        }
        ComprehensionKind::Set => {
            Instance::sequence(registry.builtin(BuiltinTypeId::Set), vec![element], false)
        }
        _ => Instance::sequence(registry.builtin(BuiltinTypeId::List), vec![element], false),
    };
    Ok(Member::from_instance(instance))
}

impl<'ast> Evaluator<'ast, '_> {
    /// Bind the target of a `for` clause or statement to one element of an
    /// iterable.
    ///
    /// A name takes the next element (Unknown if the iterable is not a
    /// recognized collection). A tuple over a mapping binds a sample key and
    /// value to its first two names; a tuple over anything else unpacks
    /// successive elements.
    pub fn bind_iteration_target(
        &mut self,
        target: &Expr<'ast>,
        iterable: &Member,
        span: Span,
    ) -> Result<()> {
        let element = iterable.iterate().map(|mut it| it.next_value()).unwrap_or_default();
        match target {
            Expr::Tuple(t) | Expr::List(t) => {
                if let Some(mapping) = iterable.as_mapping() {
                    let key = mapping.first_key().cloned().unwrap_or_default();
                    let value = mapping.first_value().cloned().unwrap_or_default();
                    let mut samples = [key, value].into_iter();
                    for item in t.items {
                        self.bind_name(item, samples.next().unwrap_or_default(), span)?;
                    }
                    Ok(())
                } else {
                    self.unpack(t.items, element, span)
                }
            }
            _ => self.bind_name(target, element, span),
        }
    }

    /// Bind each name of a tuple target to successive elements of `value`.
    pub(crate) fn unpack(&mut self, targets: &[Expr<'ast>], value: Member, span: Span) -> Result<()> {
        let mut elements = value.iterate();
        for target in targets {
            let element = elements.as_mut().map(|it| it.next_value()).unwrap_or_default();
            match target {
                Expr::Tuple(t) | Expr::List(t) => self.unpack(t.items, element, span)?,
                _ => self.bind_name(target, element, span)?,
            }
        }
        Ok(())
    }

    fn bind_name(&mut self, target: &Expr<'ast>, value: Member, span: Span) -> Result<()> {
        match target {
            Expr::Name(ident) => self.declare(ident.name, value, VariableKind::Local, None, span),
            _ => Ok(()),
        }
    }
}
