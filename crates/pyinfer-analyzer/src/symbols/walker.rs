//! Statement walking.
//!
//! Walks module and function bodies in source order, declaring what they
//! bind and collecting `return` values into the overload being evaluated.
//! Nested definitions are declared here and evaluated separately.

use pyinfer_ast::{Expr, FunctionDef, Stmt};
use pyinfer_core::{ClassRef, FunctionType, Lint, Member, OverloadRef, ParameterKind, PyType, Span};

use crate::eval::annotations::annotation_to_instance;
use crate::eval::binary;
use crate::eval::Result;
use crate::scope::{LookupOptions, VariableKind};
use crate::Evaluator;

/// What the walked body belongs to.
#[derive(Debug, Clone, Default)]
pub struct Frame<'ast> {
    /// Overload collecting `return` values.
    overload: Option<OverloadRef>,
    /// Class whose members `self.x = ...` assignments refine.
    class: Option<ClassRef>,
    /// Name of the method receiver.
    receiver: Option<&'ast str>,
    is_init: bool,
}

impl<'ast> Frame<'ast> {
    pub fn module() -> Self {
        Self::default()
    }

    pub fn class(class: ClassRef) -> Self {
        Self {
            class: Some(class),
            ..Self::default()
        }
    }

    pub fn function(
        overload: OverloadRef,
        function: &FunctionType,
        def: &'ast FunctionDef<'ast>,
    ) -> Self {
        let class = function.declaring_class();
        let receiver = match &class {
            Some(_) if !function.is_static() => def
                .params
                .first()
                .filter(|p| p.kind == ParameterKind::Normal)
                .map(|p| p.name.name),
            _ => None,
        };
        Self {
            overload: Some(overload),
            is_init: class.is_some() && def.name.name == "__init__",
            class,
            receiver,
        }
    }
}

impl<'ast> Evaluator<'ast, '_> {
    pub fn walk_block(&mut self, body: &'ast [Stmt<'ast>], frame: &Frame<'ast>) -> Result<()> {
        for stmt in body {
            self.walk_statement(stmt, frame)?;
        }
        Ok(())
    }

    pub fn walk_statement(&mut self, stmt: &'ast Stmt<'ast>, frame: &Frame<'ast>) -> Result<()> {
        match stmt {
            Stmt::Expr(s) => {
                self.check_expression(&s.expr)?;
                self.evaluate(&s.expr, LookupOptions::NORMAL)?;
            }
            Stmt::Assign(s) => {
                self.check_expression(&s.value)?;
                let value = self.evaluate(&s.value, LookupOptions::NORMAL)?;
                for target in s.targets {
                    self.assign_target(target, value.clone(), frame, s.span)?;
                }
            }
            Stmt::AnnAssign(s) => {
                let declared = self.evaluate_annotation(&s.annotation)?;
                let value = match &s.value {
                    Some(value) => {
                        self.check_expression(value)?;
                        self.evaluate(value, LookupOptions::NORMAL)?
                    }
                    None => Member::Unknown,
                };
                let value = if value.is_unknown() {
                    annotation_to_instance(&declared)
                } else {
                    value
                };
                self.assign_target(&s.target, value, frame, s.span)?;
            }
            Stmt::Return(s) => {
                let value = match s.value {
                    Some(value) => {
                        self.check_expression(value)?;
                        self.evaluate(value, LookupOptions::NORMAL)?
                    }
                    None => self.registry.none(),
                };
                if let Some(overload) = &frame.overload {
                    if frame.is_init && !value.is_none() {
                        self.report(Lint::ReturnInInit, s.span);
                    }
                    overload.add_return_value(value);
                }
            }
            Stmt::FunctionDef(def) => {
                let function = self.declare_function(def, None)?;
                let value = Member::Type(PyType::Function(function));
                self.declare(def.name.name, value, VariableKind::Local, Some(def.id), def.name.span)?;
            }
            Stmt::ClassDef(def) => {
                self.declare_class(def)?;
            }
            Stmt::Global(s) => {
                for name in s.names {
                    self.binder.declare_global(name.name)?;
                }
            }
            Stmt::Nonlocal(s) => {
                for name in s.names {
                    self.binder.declare_nonlocal(name.name)?;
                }
            }
            Stmt::If(s) => {
                self.check_expression(&s.test)?;
                self.evaluate(&s.test, LookupOptions::NORMAL)?;
                self.walk_block(s.body, frame)?;
                self.walk_block(s.orelse, frame)?;
            }
            Stmt::For(s) => {
                self.check_expression(&s.iter)?;
                let iterable = self.evaluate(&s.iter, LookupOptions::NORMAL)?;
                self.bind_iteration_target(&s.target, &iterable, s.span)?;
                self.walk_block(s.body, frame)?;
                self.walk_block(s.orelse, frame)?;
            }
            Stmt::While(s) => {
                self.check_expression(&s.test)?;
                self.evaluate(&s.test, LookupOptions::NORMAL)?;
                self.walk_block(s.body, frame)?;
                self.walk_block(s.orelse, frame)?;
            }
            Stmt::Pass(_) => {}
        }
        Ok(())
    }

    /// Bind an assignment target.
    ///
    /// `self.x = value` in a method adds `x` to the class, or replaces a
    /// member that is still Unknown. Rebinding the receiver itself is
    /// ignored.
    fn assign_target(
        &mut self,
        target: &Expr<'ast>,
        value: Member,
        frame: &Frame<'ast>,
        span: Span,
    ) -> Result<()> {
        match target {
            Expr::Name(ident) => {
                if frame.receiver == Some(ident.name) {
                    return Ok(());
                }
                self.declare(ident.name, value, VariableKind::Local, None, ident.span)
            }
            Expr::Tuple(t) | Expr::List(t) => self.unpack(t.items, value, span),
            Expr::Member(m) => {
                if let (Some(receiver), Some(class)) = (frame.receiver, &frame.class)
                    && m.target.as_name() == Some(receiver)
                    && class.own_member(m.name.name).is_none_or(|existing| existing.is_unknown())
                {
                    class.add_member(m.name.name, value, true);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    // ==========================================================================
    // Expression checks
    // ==========================================================================

    /// Report names that resolve nowhere and binary operators whose builtin
    /// operand types never combine.
    ///
    /// Comprehensions bind their own targets, so only their first iterable
    /// is checked.
    pub(super) fn check_expression(&mut self, expr: &Expr<'ast>) -> Result<()> {
        match expr {
            Expr::Name(ident) => {
                if self.lookup_name(ident.name, LookupOptions::NORMAL).is_none() {
                    self.report(
                        Lint::UndefinedVariable {
                            name: ident.name.to_string(),
                        },
                        ident.span,
                    );
                }
            }
            Expr::Constant(_) => {}
            Expr::Member(m) => self.check_expression(&m.target)?,
            Expr::Index(i) => {
                self.check_expression(&i.target)?;
                self.check_expression(&i.index)?;
            }
            Expr::Slice(s) => {
                for part in [&s.lower, &s.upper, &s.step].into_iter().flatten() {
                    self.check_expression(part)?;
                }
            }
            Expr::Call(c) => {
                self.check_expression(&c.callee)?;
                for arg in c.args {
                    self.check_expression(&arg.value)?;
                }
            }
            Expr::List(s) | Expr::Tuple(s) | Expr::Set(s) => {
                for item in s.items {
                    self.check_expression(item)?;
                }
            }
            Expr::Dict(d) => {
                for entry in d.entries {
                    self.check_expression(&entry.key)?;
                    self.check_expression(&entry.value)?;
                }
            }
            Expr::Comprehension(c) => {
                if let Some((_, iter)) = c.first_for() {
                    self.check_expression(iter)?;
                }
            }
            Expr::Yield(y) => {
                if let Some(value) = y.value {
                    self.check_expression(value)?;
                }
            }
            Expr::Unary(u) => self.check_expression(&u.operand)?,
            Expr::Binary(b) => {
                self.check_expression(&b.left)?;
                self.check_expression(&b.right)?;
                let left = self.evaluate(&b.left, LookupOptions::NORMAL)?;
                let right = self.evaluate(&b.right, LookupOptions::NORMAL)?;
                if binary::unsupported_operands(b.op, &left, &right) {
                    self.report(
                        Lint::UnsupportedOperandType {
                            op: b.op.as_str().to_string(),
                            left: left.py_type().name().into_owned(),
                            right: right.py_type().name().into_owned(),
                        },
                        b.span,
                    );
                }
            }
        }
        Ok(())
    }
}
