//! Whole-module analysis.

use pyinfer_ast::Module;
use pyinfer_core::{BuiltinTypeId, Member, NodeId, Span};
use tracing::debug;

use super::walker::Frame;
use crate::eval::Result;
use crate::scope::{ScopeKind, Variable, VariableKind};
use crate::Evaluator;

/// Names every module defines implicitly.
const MODULE_ATTRIBUTES: [&str; 4] = ["__name__", "__file__", "__doc__", "__qualname__"];

impl<'ast> Evaluator<'ast, '_> {
    /// Analyze a module and return its global variables.
    ///
    /// The body is walked once; afterwards every collected function that
    /// was not already evaluated on demand is evaluated, including those
    /// discovered while evaluating others.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn analyze_module(&mut self, module: &'ast Module<'ast>) -> Result<Vec<Variable>> {
        debug!(module = %self.options.module_name, statements = module.body.len(), "analyzing module");
        let mut scope = self.open_scope(NodeId::MODULE, ScopeKind::Module);
        let module_scope = scope.id();

        let str_instance = scope.registry.instance(BuiltinTypeId::Str);
        for name in MODULE_ATTRIBUTES {
            scope.declare(name, str_instance.clone(), VariableKind::Global, None, Span::default())?;
        }

        scope.walk_block(module.body, &Frame::module())?;

        let mut index = 0;
        while let Some(function) = scope.symbols.function_at(index).map(|e| e.function.clone()) {
            scope.evaluate_function(&function)?;
            index += 1;
        }

        let globals: Vec<Variable> = scope
            .binder
            .scope(module_scope)
            .variables()
            .iter()
            .filter(|v| !MODULE_ATTRIBUTES.contains(&v.name.as_str()))
            .cloned()
            .collect();
        debug!(
            module = %scope.options.module_name,
            globals = globals.len(),
            functions = scope.symbols.len(),
            classes = scope.symbols.class_count(),
            "module analyzed"
        );
        Ok(globals)
    }
}
