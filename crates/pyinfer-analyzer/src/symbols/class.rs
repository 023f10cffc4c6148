//! Class declaration.
//!
//! A class body runs once, when the class is declared: methods are declared
//! (not evaluated), nested classes are declared, and assignments become
//! class members. The class is visible in its enclosing scope before its
//! body runs, so methods and annotations can refer to it.

use std::rc::Rc;

use pyinfer_ast::{ClassDef, Expr, Stmt};
use pyinfer_core::{BuiltinTypeId, ClassRef, ClassType, Member, ParamMap, PyType, Span};
use tracing::debug;

use super::function::is_property_accessor;
use super::walker::Frame;
use crate::eval::annotations::annotation_to_instance;
use crate::eval::Result;
use crate::scope::{LookupOptions, ScopeKind, VariableKind, CLASS_CELL};
use crate::Evaluator;

impl<'ast> Evaluator<'ast, '_> {
    /// Declare a class in the current scope and collect its members.
    ///
    /// Memoized by the defining node. Bases that do not evaluate to a class
    /// or a `Generic[...]` marker are dropped; a class without class bases
    /// derives from `object`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn declare_class(&mut self, def: &'ast ClassDef<'ast>) -> Result<ClassRef> {
        if let Some(class) = self.symbols.class(def.id) {
            return Ok(class.clone());
        }

        let name = def.name.name;
        let qualified_name = format!("{}.{name}", self.qualifier());
        let class = Rc::new(ClassType::new(name, qualified_name, None).with_node(def.id));
        self.symbols.insert_class(def.id, class.clone());

        let mut bases = Vec::with_capacity(def.bases.len() + 1);
        for base in def.bases {
            if let Member::Type(ty @ (PyType::Class(_) | PyType::GenericMarker(_))) =
                self.evaluate(base, LookupOptions::NORMAL)?
            {
                bases.push(ty);
            }
        }
        if !bases.iter().any(|b| matches!(b, PyType::Class(_))) {
            bases.push(self.registry.builtin(BuiltinTypeId::Object));
        }
        class.set_bases(bases);
        class.set_generic_params(ParamMap::identity(&self.type_parameters(&class)));

        let value = Member::Type(PyType::Class(class.clone()));
        self.declare(name, value.clone(), VariableKind::Local, Some(def.id), def.name.span)?;

        let mut scope = self.open_scope(def.id, ScopeKind::Class);
        scope.declare(CLASS_CELL, value, VariableKind::Local, Some(def.id), def.span)?;
        for stmt in def.body {
            scope.collect_member(stmt, &class)?;
        }
        drop(scope);

        debug!(
            class = class.qualified_name(),
            members = class.members().len(),
            generic = class.is_generic(),
            "declared class"
        );
        Ok(class)
    }

    fn collect_member(&mut self, stmt: &'ast Stmt<'ast>, class: &ClassRef) -> Result<()> {
        match stmt {
            Stmt::FunctionDef(def) => {
                let function = self.declare_function(def, Some(class))?;
                let member = Member::Type(PyType::Function(function));
                class.add_member(def.name.name, member.clone(), !is_property_accessor(def));
                self.declare(def.name.name, member, VariableKind::Local, Some(def.id), def.name.span)
            }
            Stmt::ClassDef(def) => {
                let nested = self.declare_class(def)?;
                class.add_member(def.name.name, Member::Type(PyType::Class(nested)), true);
                Ok(())
            }
            Stmt::Assign(assign) => {
                self.check_expression(&assign.value)?;
                let value = self.evaluate(&assign.value, LookupOptions::NORMAL)?;
                for target in assign.targets {
                    self.collect_attribute(target, value.clone(), class, assign.span)?;
                }
                Ok(())
            }
            Stmt::AnnAssign(assign) => {
                let declared = self.evaluate_annotation(&assign.annotation)?;
                let value = match &assign.value {
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
                self.collect_attribute(&assign.target, value, class, assign.span)
            }
            other => self.walk_statement(other, &Frame::class(class.clone())),
        }
    }

    /// A class-level assignment target. Unknown values never replace a
    /// member that is already there.
    fn collect_attribute(
        &mut self,
        target: &Expr<'ast>,
        value: Member,
        class: &ClassRef,
        span: Span,
    ) -> Result<()> {
        match target {
            Expr::Name(ident) => {
                class.add_member(ident.name, value.clone(), !value.is_unknown());
                self.declare(ident.name, value, VariableKind::Local, None, ident.span)
            }
            Expr::Tuple(t) | Expr::List(t) => {
                let mut elements = value.iterate();
                for item in t.items {
                    let element = elements.as_mut().map(|it| it.next_value()).unwrap_or_default();
                    self.collect_attribute(item, element, class, span)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
