//! Expression evaluation.
//!
//! The [`Evaluator`] computes a [`Member`] for any expression node. It never
//! mutates the AST; its only side effects are declarations in the open scope
//! (comprehension targets), lazily evaluated functions and specializations,
//! and `bad-index-type` diagnostics.
//!
//! # Example
//!
//! ```ignore
//! let mut evaluator = Evaluator::new(&registry, &options, &mut sink);
//! let _module = ScopeGuard::open(&mut evaluator, NodeId::MODULE, ScopeKind::Module, None);
//! let member = evaluator.evaluate(&expr, LookupOptions::NORMAL)?;
//! ```

pub mod annotations;
pub(crate) mod binary;
pub(crate) mod calls;
mod collections;
mod literals;
mod unary;

use pyinfer_ast::Expr;
use pyinfer_core::{AnalysisError, BuiltinTypeId, DiagnosticSink, Lint, Member, NodeId, PyType, Span};
use pyinfer_registry::TypeRegistry;

use crate::options::AnalysisOptions;
use crate::scope::{
    Binder, LookupOptions, ScopeGuard, ScopeId, ScopeKind, ScopeOwner, VariableKind,
};
use crate::symbols::SymbolTable;

pub(crate) type Result<T> = std::result::Result<T, AnalysisError>;

/// Evaluates expressions against a scope stack.
///
/// One evaluator analyzes one module: it owns the scope arena and the
/// module's AST-to-symbol map. Registry entities are shared read-only.
pub struct Evaluator<'ast, 'a> {
    pub(crate) registry: &'a TypeRegistry,
    pub(crate) options: &'a AnalysisOptions,
    pub(crate) binder: Binder,
    pub(crate) symbols: SymbolTable<'ast>,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'ast, 'a> Evaluator<'ast, 'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        options: &'a AnalysisOptions,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            registry,
            options,
            binder: Binder::new(),
            symbols: SymbolTable::new(),
            sink,
        }
    }

    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    pub fn options(&self) -> &'a AnalysisOptions {
        self.options
    }

    pub fn scopes(&self) -> &Binder {
        &self.binder
    }

    pub fn symbols(&self) -> &SymbolTable<'ast> {
        &self.symbols
    }

    // ==========================================================================
    // Scopes
    // ==========================================================================

    /// Open the scope of a node nested in the current scope.
    pub fn open_scope(&mut self, node: NodeId, kind: ScopeKind) -> ScopeGuard<'_, Self> {
        ScopeGuard::open(self, node, kind, None)
    }

    /// Open the scope of a node whose lexical parent is `parent`.
    pub fn open_scope_in(
        &mut self,
        node: NodeId,
        kind: ScopeKind,
        parent: ScopeId,
    ) -> ScopeGuard<'_, Self> {
        ScopeGuard::open(self, node, kind, Some(parent))
    }

    pub fn declare(
        &mut self,
        name: &str,
        value: Member,
        kind: VariableKind,
        node: Option<NodeId>,
        span: Span,
    ) -> Result<()> {
        self.binder.declare(name, value, kind, node, span)
    }

    /// Resolve a name through the open scopes, then the registry.
    ///
    /// `None` means the name is unknown; callers decide whether that is worth
    /// a diagnostic.
    pub fn lookup_name(&mut self, name: &str, options: LookupOptions) -> Option<Member> {
        if let Some((_, variable)) = self.binder.lookup(name, options) {
            return Some(variable.value);
        }
        if options.contains(LookupOptions::BUILTINS) {
            return self.registry.lookup(name);
        }
        None
    }

    /// Dotted prefix for definitions made in the current scope.
    ///
    /// The nearest enclosing class or function decides it; definitions
    /// local to a function get `f.<locals>`, like `__qualname__`.
    pub(crate) fn qualifier(&self) -> String {
        let mut next = self.binder.current().ok();
        while let Some(id) = next {
            let scope = self.binder.scope(id);
            match scope.kind {
                ScopeKind::Class => {
                    if let Some(class) = self.symbols.class(scope.node) {
                        return class.qualified_name().to_string();
                    }
                }
                ScopeKind::Function => {
                    if let Some(entry) = self.symbols.function(scope.node) {
                        return format!("{}.<locals>", entry.function.qualified_name());
                    }
                }
                ScopeKind::Module => break,
                ScopeKind::Comprehension => {}
            }
            next = scope.parent;
        }
        self.options.module_name.clone()
    }

    pub(crate) fn report(&mut self, lint: Lint, span: Span) {
        self.sink.report(&self.options.document, lint.at(span));
    }

    // ==========================================================================
    // Evaluation
    // ==========================================================================

    /// Evaluate an expression.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn evaluate(&mut self, expr: &Expr<'ast>, options: LookupOptions) -> Result<Member> {
        match expr {
            Expr::Constant(c) => Ok(self.registry.constant(literals::constant_value(&c.kind))),
            Expr::Name(ident) => Ok(self.lookup_name(ident.name, options).unwrap_or_default()),
            Expr::Member(m) => {
                let target = self.evaluate(&m.target, options)?;
                self.get_attribute(&target, m.name.name)
            }
            Expr::Index(index) => collections::evaluate_index(self, index, options),
            // a bare slice has no value of its own
            Expr::Slice(_) => Ok(Member::Unknown),
            Expr::Call(call) => calls::evaluate_call(self, call, options),
            Expr::List(seq) => {
                collections::evaluate_sequence(self, seq, BuiltinTypeId::List, options)
            }
            Expr::Tuple(seq) => {
                collections::evaluate_sequence(self, seq, BuiltinTypeId::Tuple, options)
            }
            Expr::Set(seq) => collections::evaluate_sequence(self, seq, BuiltinTypeId::Set, options),
            Expr::Dict(dict) => collections::evaluate_dict(self, dict, options),
            Expr::Comprehension(comp) => collections::evaluate_comprehension(self, comp, options),
            Expr::Yield(_) => Ok(Member::Unknown),
            Expr::Unary(expr) => unary::evaluate_unary(self, expr, options),
            Expr::Binary(expr) => binary::evaluate_binary(self, expr, options),
        }
    }

    /// Attribute access on an evaluated member.
    ///
    /// Properties evaluate to their return value; instances expose
    /// `__class__`. Unions distribute.
    pub fn get_attribute(&mut self, target: &Member, name: &str) -> Result<Member> {
        match target {
            Member::Unknown => Ok(Member::Unknown),
            Member::Union(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items.iter() {
                    values.push(self.get_attribute(item, name)?);
                }
                Ok(Member::union(values))
            }
            Member::Type(PyType::Class(class)) => {
                self.ensure_constructed(class)?;
                Ok(class.get_member(name).unwrap_or_default())
            }
            Member::Type(_) => Ok(Member::Unknown),
            Member::Instance(instance) => {
                let Some(class) = instance.ty().as_class() else {
                    return Ok(Member::Unknown);
                };
                if name == crate::scope::CLASS_CELL {
                    return Ok(Member::Type(PyType::Class(class.clone())));
                }
                self.ensure_constructed(class)?;
                let member = class.get_member(name).unwrap_or_default();
                match member.as_type().and_then(PyType::as_function) {
                    Some(function) if function.is_property() => {
                        let function = function.clone();
                        let receiver = Some(target.clone());
                        calls::call_function(self, &function, receiver, Vec::new(), Vec::new(), Span::default())
                    }
                    _ => Ok(member),
                }
            }
        }
    }
}

impl ScopeOwner for Evaluator<'_, '_> {
    fn binder(&mut self) -> &mut Binder {
        &mut self.binder
    }
}
