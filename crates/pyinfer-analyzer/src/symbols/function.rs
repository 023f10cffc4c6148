//! Function declaration and evaluation.
//!
//! [`Evaluator::declare_function`] creates the function entity for a `def`
//! and applies its decorators. Evaluation is deferred: the first call (or
//! the end of the module walk) runs a [`FunctionEvaluator`] for each of its
//! pending overloads, which binds parameters, determines the return value
//! and checks the calling convention of methods.

use std::rc::Rc;

use pyinfer_ast::{Expr, FunctionDef, Stmt};
use pyinfer_core::{
    AnalysisError, BuiltinTypeId, ClassFlags, ClassRef, FunctionFlags, FunctionRef, FunctionType,
    Instance, Lint, Member, Overload, OverloadRef, OverloadState, ParameterInfo, ParameterKind,
    PyType,
};
use tracing::debug;

use super::walker::Frame;
use super::FunctionEntry;
use crate::eval::annotations::annotation_to_instance;
use crate::eval::Result;
use crate::scope::{LookupOptions, ScopeId, ScopeKind, VariableKind};
use crate::Evaluator;

/// Decorator attributes that extend an existing property.
const PROPERTY_ACCESSORS: [&str; 3] = ["setter", "getter", "deleter"];

/// Whether a `def` is a `@x.setter`-style accessor of an existing property.
pub(super) fn is_property_accessor(def: &FunctionDef<'_>) -> bool {
    def.decorators.iter().any(|d| match d {
        Expr::Member(m) => PROPERTY_ACCESSORS.contains(&m.name.name),
        _ => false,
    })
}

/// The first `yield` among the top-level statements of a body.
fn top_level_yield<'ast>(body: &'ast [Stmt<'ast>]) -> Option<Option<&'ast Expr<'ast>>> {
    body.iter().find_map(|stmt| {
        let expr = match stmt {
            Stmt::Expr(s) => &s.expr,
            Stmt::Assign(s) => &s.value,
            Stmt::AnnAssign(s) => s.value.as_ref()?,
            _ => return None,
        };
        match expr {
            Expr::Yield(y) => Some(y.value),
            _ => None,
        }
    })
}

impl<'ast> Evaluator<'ast, '_> {
    // ==========================================================================
    // Declaration
    // ==========================================================================

    /// Create the function for a definition in the current scope.
    ///
    /// Memoized by the defining node. `class` is the class whose body holds
    /// the definition.
    pub fn declare_function(
        &mut self,
        def: &'ast FunctionDef<'ast>,
        class: Option<&ClassRef>,
    ) -> Result<FunctionRef> {
        if let Some(entry) = self.symbols.function(def.id) {
            return Ok(entry.function.clone());
        }

        let name = def.name.name;
        let qualified_name = format!("{}.{name}", self.qualifier());
        let mut function = FunctionType::new(name, qualified_name).with_node(def.id);
        if let Some(class) = class {
            function = function.with_declaring_class(class);
        }
        let function = Rc::new(function);
        function.add_overload(Overload::new(name, Some(def.id)));
        self.apply_decorators(&function, def.decorators)?;

        let scope = self.binder.current()?;
        self.symbols.insert(FunctionEntry {
            def,
            scope,
            function: function.clone(),
        });
        Ok(function)
    }

    fn apply_decorators(&mut self, function: &FunctionRef, decorators: &'ast [Expr<'ast>]) -> Result<()> {
        for decorator in decorators {
            if let Expr::Member(m) = decorator
                && PROPERTY_ACCESSORS.contains(&m.name.name)
            {
                function.insert_flags(FunctionFlags::PROPERTY);
                continue;
            }
            let callee = match decorator {
                Expr::Call(call) => &call.callee,
                other => other,
            };
            let value = self.evaluate(callee, LookupOptions::NORMAL)?;
            match value.as_type() {
                Some(PyType::Function(d)) => {
                    function.apply_decorator(d.name());
                }
                Some(_) => {}
                None => function.insert_flags(FunctionFlags::INVALID_DECORATORS),
            }
        }
        Ok(())
    }

    // ==========================================================================
    // Evaluation
    // ==========================================================================

    /// Evaluate every pending overload of a function.
    ///
    /// Functions without a defining node (registry functions) are already
    /// complete. Overloads being evaluated further up the stack are left
    /// alone, so recursion sees the partial return value.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn evaluate_function(&mut self, function: &FunctionRef) -> Result<()> {
        let Some(node) = function.node() else {
            return Ok(());
        };
        let overloads: Vec<OverloadRef> = function.overloads().to_vec();
        for overload in overloads {
            if overload.state() != OverloadState::Pending {
                continue;
            }
            let entry = self
                .symbols
                .function(node)
                .cloned()
                .ok_or(AnalysisError::UnknownDefinition { node })?;
            FunctionEvaluator::new(entry.def, entry.scope, overload).evaluate(self)?;
        }
        Ok(())
    }

    /// Make sure a user class has observed its constructor's `self.x`
    /// assignments. Specializations defer to their template.
    pub fn ensure_constructed(&mut self, class: &ClassRef) -> Result<()> {
        if class.has_flag(ClassFlags::BUILTIN) {
            return Ok(());
        }
        let template = class.template().unwrap_or_else(|| class.clone());
        let init = template
            .own_member("__init__")
            .and_then(|m| m.as_type().and_then(PyType::as_function).cloned());
        match init {
            Some(init) => self.evaluate_function(&init),
            None => Ok(()),
        }
    }
}

// ============================================================================
// FunctionEvaluator
// ============================================================================

/// Evaluates one overload of a function definition.
pub struct FunctionEvaluator<'ast> {
    def: &'ast FunctionDef<'ast>,
    /// Lexical parent of the function body.
    parent: ScopeId,
    overload: OverloadRef,
}

impl<'ast> FunctionEvaluator<'ast> {
    pub fn new(def: &'ast FunctionDef<'ast>, parent: ScopeId, overload: OverloadRef) -> Self {
        Self { def, parent, overload }
    }

    /// Bind parameters, determine the return value and check the calling
    /// convention.
    pub fn evaluate(self, eval: &mut Evaluator<'ast, '_>) -> Result<()> {
        self.overload.set_state(OverloadState::Evaluating);
        let function = self
            .overload
            .function()
            .ok_or_else(|| AnalysisError::MissingDeclaringMember {
                name: self.overload.name().to_string(),
            })?;
        let class = function.declaring_class();

        let mut scope = eval.open_scope_in(self.def.id, ScopeKind::Function, self.parent);
        let scope_id = scope.id();
        let eval = &mut *scope;

        let parameters = self.declare_parameters(eval, &function, class.as_ref())?;
        self.overload.set_parameters(parameters);
        self.declare_return(eval, &function)?;

        let walk = self.is_constructor(&function)
            || self.overload.declared_return().is_none()
            || eval.options.module_kind.is_user();
        if walk {
            let frame = Frame::function(self.overload.clone(), &function, self.def);
            eval.walk_block(self.def.body, &frame)?;
        }
        if self.overload.declared_return().is_none() && self.overload.inferred_return_count() == 0 {
            self.overload.add_return_value(eval.registry.none());
        }

        if let Some(class) = &class {
            self.check_calling_convention(eval, &function, class);
        }
        if eval.options.discards_locals() {
            eval.binder.clear_variables(scope_id);
        }

        self.overload.set_state(OverloadState::Evaluated);
        debug!(
            function = function.qualified_name(),
            returns = %self.overload.return_value(),
            "evaluated function"
        );
        Ok(())
    }

    fn is_constructor(&self, function: &FunctionType) -> bool {
        function.is_method() && matches!(self.def.name.name, "__init__" | "__new__")
    }

    /// Declare each parameter in the function scope and describe it.
    ///
    /// An annotation gives the value an instance of the annotated type,
    /// otherwise the default's value is used. The receiver of a method is
    /// an instance of the class (the class itself for class methods).
    fn declare_parameters(
        &self,
        eval: &mut Evaluator<'ast, '_>,
        function: &FunctionType,
        class: Option<&ClassRef>,
    ) -> Result<Vec<ParameterInfo>> {
        let mut parameters = Vec::with_capacity(self.def.params.len());
        for (i, param) in self.def.params.iter().enumerate() {
            let declared = match &param.annotation {
                Some(annotation) => eval.evaluate_annotation(annotation)?,
                None => PyType::Unknown,
            };
            let default = match &param.default {
                Some(default) => Some(eval.evaluate(default, LookupOptions::NORMAL)?),
                None => None,
            };

            let receiver = class.filter(|_| {
                i == 0 && !function.is_static() && param.kind == ParameterKind::Normal
            });
            let (declared, value) = match receiver {
                Some(class) if declared.is_unknown() => {
                    let ty = PyType::Class(class.clone());
                    let value = if function.is_class_method() {
                        Member::Type(ty.clone())
                    } else {
                        class.create_instance()
                    };
                    (ty, value)
                }
                _ => {
                    let value = if declared.is_unknown() {
                        default.clone().unwrap_or_default()
                    } else {
                        annotation_to_instance(&declared)
                    };
                    (declared, value)
                }
            };

            let value = match param.kind {
                ParameterKind::VarPositional => {
                    let sample = if value.is_unknown() { Vec::new() } else { vec![value] };
                    Member::from_instance(Instance::sequence(
                        eval.registry.builtin(BuiltinTypeId::Tuple),
                        sample,
                        false,
                    ))
                }
                ParameterKind::VarKeyword => {
                    let entries = if value.is_unknown() {
                        Vec::new()
                    } else {
                        vec![(eval.registry.instance(BuiltinTypeId::Str), value)]
                    };
                    Member::from_instance(Instance::mapping(
                        eval.registry.builtin(BuiltinTypeId::Dict),
                        entries,
                        false,
                    ))
                }
                _ => value,
            };
            eval.declare(param.name.name, value, VariableKind::Parameter, Some(self.def.id), param.name.span)?;

            let mut info = ParameterInfo::new(param.name.name).with_type(declared).with_kind(param.kind);
            if let Some(default) = default {
                info = info.with_default(default);
            }
            parameters.push(info);
        }
        Ok(parameters)
    }

    /// Set the declared return from the annotation, or from a top-level
    /// `yield` for generators.
    fn declare_return(&self, eval: &mut Evaluator<'ast, '_>, function: &FunctionType) -> Result<()> {
        if let Some(annotation) = &self.def.returns {
            let ty = eval.evaluate_annotation(annotation)?;
            self.overload.set_declared_return(annotation_to_instance(&ty));
            return Ok(());
        }
        if let Some(yielded) = top_level_yield(self.def.body) {
            function.insert_flags(FunctionFlags::GENERATOR);
            let element = match yielded {
                Some(value) => eval.evaluate(value, LookupOptions::NORMAL)?,
                None => eval.registry.none(),
            };
            self.overload.set_declared_return(Member::from_instance(Instance::iterator(
                eval.registry.builtin(BuiltinTypeId::Iterator),
                element,
            )));
        }
        Ok(())
    }

    /// Receiver naming of methods. Static methods, metaclass members,
    /// class properties and methods with unrecognized decorators are exempt.
    fn check_calling_convention(&self, eval: &mut Evaluator<'ast, '_>, function: &FunctionType, class: &ClassRef) {
        if function.is_static() || !function.has_valid_decorators() || class.is_metaclass() {
            return;
        }
        if function.is_property() && function.is_class_method() {
            return;
        }
        let name = function.name().to_string();
        let Some(first) = self.def.params.first() else {
            eval.report(Lint::NoMethodArgument { function: name }, self.def.name.span);
            return;
        };
        if first.kind == ParameterKind::VarPositional {
            return;
        }
        if function.is_class_method() {
            if first.name.name != "cls" {
                eval.report(Lint::NoClsArgument { function: name }, first.name.span);
            }
        } else if first.name.name != "self" {
            eval.report(Lint::NoSelfArgument { function: name }, first.name.span);
        }
    }
}

#[cfg(test)]
mod tests {
    use pyinfer_core::{Constant, Diagnostics, ModuleKind};

    use super::*;
    use crate::eval::test_support::Fixture;
    use crate::options::AnalysisOptions;

    fn codes(diagnostics: &Diagnostics) -> Vec<&'static str> {
        diagnostics.iter().map(|d| d.error_code).collect()
    }

    /// Declare a module-level `def` and return its function after evaluation.
    fn evaluate_def<'ast>(eval: &mut Evaluator<'ast, '_>, stmt: Stmt<'ast>) -> FunctionRef {
        let Stmt::FunctionDef(def) = stmt else {
            panic!("expected a function definition");
        };
        let function = eval.declare_function(def, None).unwrap();
        eval.evaluate_function(&function).unwrap();
        function
    }

    #[test]
    fn inferred_returns_are_united() {
        let mut fx = Fixture::new();
        let returns = fx.with_evaluator(|eval, b| {
            let def = b.def("f").param("x").body([
                b.if_(b.name("x"), [b.ret(Some(b.int(1)))], []),
                b.ret(Some(b.str("a"))),
            ]);
            let function = evaluate_def(eval, def);
            function.first_overload().unwrap().return_value()
        });
        let types: Vec<_> = returns.as_union().unwrap().iter().map(|m| m.py_type()).collect();
        assert!(types[0].is_builtin(BuiltinTypeId::Int));
        assert!(types[1].is_builtin(BuiltinTypeId::Str));
    }

    #[test]
    fn no_return_is_none() {
        let mut fx = Fixture::new();
        let returns = fx.with_evaluator(|eval, b| {
            let function = evaluate_def(eval, b.def("f").body([b.pass()]));
            function.first_overload().unwrap().return_value()
        });
        assert_eq!(returns.as_constant(), Some(&Constant::None));
    }

    #[test]
    fn annotated_return_is_instance() {
        let mut fx = Fixture::new();
        let returns = fx.with_evaluator(|eval, b| {
            let def = b.def("f").returns(b.name("int")).body([b.pass()]);
            evaluate_def(eval, def).first_overload().unwrap().return_value()
        });
        assert!(returns.is_instance());
        assert!(returns.py_type().is_builtin(BuiltinTypeId::Int));
    }

    #[test]
    fn generator_returns_iterator_of_yielded_value() {
        let mut fx = Fixture::new();
        let (returns, flags) = fx.with_evaluator(|eval, b| {
            let def = b.def("gen").body([b.expr_stmt(b.yield_(Some(b.int(1))))]);
            let function = evaluate_def(eval, def);
            (function.first_overload().unwrap().return_value(), function.flags())
        });
        assert!(flags.contains(FunctionFlags::GENERATOR));
        assert!(returns.py_type().is_builtin(BuiltinTypeId::Iterator));
        let element = returns.iterate().unwrap().next_value();
        assert!(element.py_type().is_builtin(BuiltinTypeId::Int));
    }

    #[test]
    fn parameters_take_annotation_then_default() {
        let mut fx = Fixture::new();
        let params = fx.with_evaluator(|eval, b| {
            let def = b
                .def("f")
                .param_typed("a", b.name("str"))
                .param_default("b", b.float(1.0))
                .param_kind("rest", ParameterKind::VarPositional)
                .body([b.pass()]);
            evaluate_def(eval, def).first_overload().unwrap().parameters()
        });
        assert_eq!(params.len(), 3);
        assert!(params[0].declared_type.is_builtin(BuiltinTypeId::Str));
        assert!(params[1].has_default);
        assert!(params[1].default_value.py_type().is_builtin(BuiltinTypeId::Float));
        assert_eq!(params[2].kind, ParameterKind::VarPositional);
    }

    #[test]
    fn library_functions_drop_locals() {
        let mut fx = Fixture::new();
        fx.options = AnalysisOptions::default().with_module_kind(ModuleKind::Library);
        let remaining = fx.with_evaluator(|eval, b| {
            let def = b.def("f").body([b.assign(b.name("x"), b.int(1)), b.ret(Some(b.name("x")))]);
            let Stmt::FunctionDef(d) = def else { unreachable!() };
            evaluate_def(eval, def);
            let scope = eval.scopes().scope_of(d.id).unwrap();
            eval.scopes().scope(scope).variables().len()
        });
        assert_eq!(remaining, 0);
    }

    #[test]
    fn unknown_decorator_skips_convention_checks() {
        let mut fx = Fixture::new();
        fx.with_evaluator(|eval, b| {
            let class = b
                .class("C")
                .body([b.def("m").decorator(b.name("mystery")).param("x").body([b.pass()])]);
            let Stmt::ClassDef(def) = class else { unreachable!() };
            let class = eval.declare_class(def).unwrap();
            let m = class.own_member("m").unwrap();
            let m = m.as_type().and_then(PyType::as_function).unwrap().clone();
            assert!(!m.has_valid_decorators());
            eval.evaluate_function(&m).unwrap();
        });
        assert!(fx.diagnostics.is_empty());
    }

    #[test]
    fn receiver_naming_is_checked() {
        let mut fx = Fixture::new();
        fx.with_evaluator(|eval, b| {
            let class = b.class("C").body([
                b.def("m").param("this").body([b.pass()]),
                b.def("c").decorator(b.name("classmethod")).param("klass").body([b.pass()]),
                b.def("s").decorator(b.name("staticmethod")).param("x").body([b.pass()]),
                b.def("n").body([b.pass()]),
            ]);
            let Stmt::ClassDef(def) = class else { unreachable!() };
            let class = eval.declare_class(def).unwrap();
            for name in ["m", "c", "s", "n"] {
                let member = class.own_member(name).unwrap();
                let function = member.as_type().and_then(PyType::as_function).unwrap().clone();
                eval.evaluate_function(&function).unwrap();
            }
        });
        assert_eq!(
            codes(&fx.diagnostics),
            ["no-self-argument", "no-cls-argument", "no-method-argument"]
        );
    }

    #[test]
    fn class_properties_skip_receiver_check() {
        let mut fx = Fixture::new();
        fx.with_evaluator(|eval, b| {
            let class = b.class("C").body([b
                .def("kind")
                .decorator(b.name("property"))
                .decorator(b.name("classmethod"))
                .param("klass")
                .body([b.pass()])]);
            let Stmt::ClassDef(def) = class else { unreachable!() };
            let class = eval.declare_class(def).unwrap();
            let member = class.own_member("kind").unwrap();
            let function = member.as_type().and_then(PyType::as_function).unwrap().clone();
            assert!(function.is_property() && function.is_class_method());
            eval.evaluate_function(&function).unwrap();
        });
        assert!(fx.diagnostics.is_empty());
    }

    #[test]
    fn library_constructors_are_always_walked() {
        let mut fx = Fixture::new();
        fx.options = AnalysisOptions::default().with_module_kind(ModuleKind::Library);
        let (created, skipped) = fx.with_evaluator(|eval, b| {
            let class = b.class("C").body([
                b.def("__new__")
                    .param("cls")
                    .returns(b.name("int"))
                    .body([b.global(&["created"]), b.assign(b.name("created"), b.int(1))]),
                b.def("other")
                    .param("self")
                    .returns(b.name("int"))
                    .body([b.global(&["skipped"]), b.assign(b.name("skipped"), b.int(1))]),
            ]);
            let Stmt::ClassDef(def) = class else { unreachable!() };
            let class = eval.declare_class(def).unwrap();
            for name in ["__new__", "other"] {
                let member = class.own_member(name).unwrap();
                let function = member.as_type().and_then(PyType::as_function).unwrap().clone();
                eval.evaluate_function(&function).unwrap();
            }
            (
                eval.lookup_name("created", LookupOptions::GLOBAL),
                eval.lookup_name("skipped", LookupOptions::GLOBAL),
            )
        });
        assert!(created.unwrap().py_type().is_builtin(BuiltinTypeId::Int));
        assert!(skipped.is_none());
        assert!(fx.diagnostics.is_empty());
    }

    #[test]
    fn recursion_sees_partial_return() {
        let mut fx = Fixture::new();
        let returns = fx.with_evaluator(|eval, b| {
            let def = b.def("f").body([b.ret(Some(b.call(b.name("f"), [])))]);
            let Stmt::FunctionDef(d) = def else { unreachable!() };
            let function = eval.declare_function(d, None).unwrap();
            eval.declare("f", Member::Type(PyType::Function(function.clone())), VariableKind::Local, None, d.span)
                .unwrap();
            eval.evaluate_function(&function).unwrap();
            function.first_overload().unwrap().state()
        });
        assert_eq!(returns, OverloadState::Evaluated);
    }
}
