//! Lexical scope management.
//!
//! This module provides the [`Binder`], which owns every scope created while
//! analyzing one module and keeps a stack of the currently open ones. It handles:
//! - Declarations with refinement (a later Unknown never erases a known value)
//! - `global` / `nonlocal` redirection
//! - Lookup through lexical parents, hiding class locals from nested scopes
//!   except the `__class__` cell
//! - Free-variable and closure tracking
//!
//! Scopes are stored in an arena and linked to their lexical parent, which is
//! not necessarily the scope below them on the stack: a function body is
//! evaluated lazily, possibly while its caller's scope is open.

use std::ops::{Deref, DerefMut};

use bitflags::bitflags;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{trace, warn};

use pyinfer_core::{AnalysisError, Member, NodeId, Span};

/// Name of the class cell visible from methods.
pub const CLASS_CELL: &str = "__class__";

// ============================================================================
// Types
// ============================================================================

/// Index of a scope in the binder's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

/// What introduced a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
    Comprehension,
}

/// How a variable was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Local,
    Global,
    Nonlocal,
    Parameter,
}

bitflags! {
    /// Which scopes a lookup may consult.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LookupOptions: u8 {
        /// The innermost open scope.
        const LOCAL = 1 << 0;
        /// Enclosing function scopes (and the class cell).
        const NONLOCAL = 1 << 1;
        /// The module scope.
        const GLOBAL = 1 << 2;
        /// The type registry.
        const BUILTINS = 1 << 3;
        const NORMAL = Self::LOCAL.bits() | Self::NONLOCAL.bits() | Self::GLOBAL.bits() | Self::BUILTINS.bits();
    }
}

/// A named binding.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub value: Member,
    pub kind: VariableKind,
    pub node: Option<NodeId>,
    pub span: Span,
}

/// A lexical scope.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub node: NodeId,
    pub parent: Option<ScopeId>,
    variables: Vec<Variable>,
    index: FxHashMap<String, usize>,
    globals: FxHashSet<String>,
    nonlocals: FxHashSet<String>,
    free_variables: Vec<String>,
    is_closure: bool,
}

impl Scope {
    fn new(kind: ScopeKind, node: NodeId, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            node,
            parent,
            variables: Vec::new(),
            index: FxHashMap::default(),
            globals: FxHashSet::default(),
            nonlocals: FxHashSet::default(),
            free_variables: Vec::new(),
            is_closure: false,
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&i| &self.variables[i])
    }

    /// Variables in declaration order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Names resolved from enclosing function scopes.
    pub fn free_variables(&self) -> &[String] {
        &self.free_variables
    }

    pub fn is_closure(&self) -> bool {
        self.is_closure
    }

    fn insert(&mut self, variable: Variable) {
        match self.index.get(&variable.name) {
            Some(&i) => {
                let existing = &mut self.variables[i];
                if !variable.value.is_unknown() || existing.value.is_unknown() {
                    existing.value = variable.value;
                }
                existing.node = variable.node.or(existing.node);
            }
            None => {
                self.index.insert(variable.name.clone(), self.variables.len());
                self.variables.push(variable);
            }
        }
    }

    fn mark_free(&mut self, name: &str) {
        if !self.free_variables.iter().any(|n| n == name) {
            self.free_variables.push(name.to_string());
        }
        self.is_closure = true;
    }
}

// ============================================================================
// Binder
// ============================================================================

/// Scope arena plus the stack of open scopes.
#[derive(Debug, Default)]
pub struct Binder {
    scopes: Vec<Scope>,
    stack: Vec<ScopeId>,
    by_node: FxHashMap<NodeId, ScopeId>,
    module: Option<ScopeId>,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Scope Management
    // ==========================================================================

    /// Open the scope of a node and push it.
    ///
    /// A node that already has a scope reopens it. A new scope's lexical
    /// parent is `parent`, or the current scope when `None`.
    pub fn push(&mut self, node: NodeId, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = match self.by_node.get(&node) {
            Some(&id) => id,
            None => {
                let id = ScopeId(self.scopes.len());
                let parent = parent.or_else(|| self.stack.last().copied());
                self.scopes.push(Scope::new(kind, node, parent));
                self.by_node.insert(node, id);
                if kind == ScopeKind::Module && self.module.is_none() {
                    self.module = Some(id);
                }
                id
            }
        };
        self.stack.push(id);
        trace!(?node, ?kind, depth = self.stack.len(), "scope opened");
        id
    }

    /// Pop scopes until `depth` remain open.
    pub fn truncate(&mut self, depth: usize) {
        while self.stack.len() > depth {
            if let Some(id) = self.stack.pop() {
                trace!(node = ?self.scopes[id.0].node, depth = self.stack.len(), "scope closed");
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The innermost open scope.
    pub fn current(&self) -> Result<ScopeId, AnalysisError> {
        self.stack.last().copied().ok_or(AnalysisError::ScopeUnderflow)
    }

    pub fn module_scope(&self) -> Option<ScopeId> {
        self.module
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn scope_of(&self, node: NodeId) -> Option<ScopeId> {
        self.by_node.get(&node).copied()
    }

    /// Drop every variable of a scope.
    pub fn clear_variables(&mut self, id: ScopeId) {
        let scope = &mut self.scopes[id.0];
        scope.variables.clear();
        scope.index.clear();
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    /// Declare or refine a variable in the current scope, honoring `global`
    /// and `nonlocal` statements.
    pub fn declare(
        &mut self,
        name: &str,
        value: Member,
        kind: VariableKind,
        node: Option<NodeId>,
        span: Span,
    ) -> Result<(), AnalysisError> {
        let current = self.current()?;
        let (target, kind) = if self.scopes[current.0].globals.contains(name) {
            let module = self.module.unwrap_or_else(|| {
                warn!(name, "global declaration without a module scope");
                current
            });
            (module, VariableKind::Global)
        } else if self.scopes[current.0].nonlocals.contains(name) {
            let enclosing = self.enclosing_function(current, name).unwrap_or_else(|| {
                warn!(name, "nonlocal declaration outside a nested function");
                current
            });
            (enclosing, VariableKind::Nonlocal)
        } else {
            (current, kind)
        };
        self.scopes[target.0].insert(Variable {
            name: name.to_string(),
            value,
            kind,
            node,
            span,
        });
        Ok(())
    }

    /// `global name` in the current scope.
    pub fn declare_global(&mut self, name: &str) -> Result<(), AnalysisError> {
        let current = self.current()?;
        self.scopes[current.0].globals.insert(name.to_string());
        Ok(())
    }

    /// `nonlocal name` in the current scope.
    pub fn declare_nonlocal(&mut self, name: &str) -> Result<(), AnalysisError> {
        let current = self.current()?;
        self.scopes[current.0].nonlocals.insert(name.to_string());
        Ok(())
    }

    /// Nearest enclosing function scope declaring `name`, else the nearest one.
    fn enclosing_function(&self, from: ScopeId, name: &str) -> Option<ScopeId> {
        let mut nearest = None;
        let mut next = self.scopes[from.0].parent;
        while let Some(id) = next {
            let scope = &self.scopes[id.0];
            if scope.kind == ScopeKind::Function {
                if scope.variable(name).is_some() {
                    return Some(id);
                }
                nearest = nearest.or(Some(id));
            }
            next = scope.parent;
        }
        nearest
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Resolve a name from the current scope outward.
    ///
    /// Class scopes only expose their locals to code running directly in them;
    /// nested scopes see the `__class__` cell and nothing else. A hit in an
    /// enclosing function scope is recorded as a free variable of the current
    /// scope. `None` means "unknown" and is never an error by itself.
    pub fn lookup(&mut self, name: &str, options: LookupOptions) -> Option<(ScopeId, Variable)> {
        let current = *self.stack.last()?;
        let scope = &self.scopes[current.0];

        if scope.globals.contains(name) {
            if !options.contains(LookupOptions::GLOBAL) {
                return None;
            }
            let module = self.module?;
            return self.scopes[module.0].variable(name).map(|v| (module, v.clone()));
        }

        let local_allowed = options.contains(LookupOptions::LOCAL)
            || (scope.kind == ScopeKind::Module && options.contains(LookupOptions::GLOBAL));
        if local_allowed && !scope.nonlocals.contains(name) {
            if let Some(v) = scope.variable(name) {
                return Some((current, v.clone()));
            }
        }

        let mut next = scope.parent;
        while let Some(id) = next {
            let scope = &self.scopes[id.0];
            let visible = match scope.kind {
                ScopeKind::Module => options.contains(LookupOptions::GLOBAL),
                ScopeKind::Class => name == CLASS_CELL && options.contains(LookupOptions::NONLOCAL),
                ScopeKind::Function | ScopeKind::Comprehension => {
                    options.contains(LookupOptions::NONLOCAL)
                }
            };
            if visible && let Some(v) = scope.variable(name) {
                let found = (id, v.clone());
                if scope.kind == ScopeKind::Function {
                    self.scopes[current.0].mark_free(name);
                }
                return Some(found);
            }
            next = scope.parent;
        }
        None
    }
}

// ============================================================================
// ScopeGuard
// ============================================================================

/// Anything that owns a [`Binder`].
pub trait ScopeOwner {
    fn binder(&mut self) -> &mut Binder;
}

impl ScopeOwner for Binder {
    fn binder(&mut self) -> &mut Binder {
        self
    }
}

/// An open scope; closes it (and anything opened above it) when dropped.
///
/// Dereferences to the owner so evaluation continues through the guard.
pub struct ScopeGuard<'g, T: ScopeOwner + ?Sized> {
    owner: &'g mut T,
    depth: usize,
    id: ScopeId,
}

impl<'g, T: ScopeOwner + ?Sized> ScopeGuard<'g, T> {
    pub fn open(owner: &'g mut T, node: NodeId, kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        let binder = owner.binder();
        let depth = binder.depth();
        let id = binder.push(node, kind, parent);
        Self { owner, depth, id }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }
}

impl<T: ScopeOwner + ?Sized> Deref for ScopeGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.owner
    }
}

impl<T: ScopeOwner + ?Sized> DerefMut for ScopeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.owner
    }
}

impl<T: ScopeOwner + ?Sized> Drop for ScopeGuard<'_, T> {
    fn drop(&mut self) {
        self.owner.binder().truncate(self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyinfer_core::{BuiltinTypeId, ClassType, PyType};
    use std::rc::Rc;

    fn int() -> Member {
        Member::instance_of(PyType::Class(Rc::new(ClassType::builtin(BuiltinTypeId::Int))))
    }

    fn declare(binder: &mut Binder, name: &str, value: Member) {
        binder
            .declare(name, value, VariableKind::Local, None, Span::default())
            .unwrap();
    }

    #[test]
    fn guard_pops_on_drop() {
        let mut binder = Binder::new();
        binder.push(NodeId::MODULE, ScopeKind::Module, None);
        {
            let mut guard = ScopeGuard::open(&mut binder, NodeId(1), ScopeKind::Function, None);
            assert_eq!(guard.depth(), 2);
            let _inner = ScopeGuard::open(&mut *guard, NodeId(2), ScopeKind::Comprehension, None);
        }
        assert_eq!(binder.depth(), 1);
    }

    #[test]
    fn empty_stack_underflows() {
        let mut binder = Binder::new();
        let err = binder
            .declare("x", Member::Unknown, VariableKind::Local, None, Span::default())
            .unwrap_err();
        assert_eq!(err, AnalysisError::ScopeUnderflow);
    }

    #[test]
    fn unknown_does_not_erase_known_value() {
        let mut binder = Binder::new();
        binder.push(NodeId::MODULE, ScopeKind::Module, None);
        declare(&mut binder, "x", int());
        declare(&mut binder, "x", Member::Unknown);
        let (_, v) = binder.lookup("x", LookupOptions::NORMAL).unwrap();
        assert!(v.value.is_instance());
    }

    #[test]
    fn class_locals_hidden_from_nested_functions() {
        let mut binder = Binder::new();
        binder.push(NodeId::MODULE, ScopeKind::Module, None);
        binder.push(NodeId(1), ScopeKind::Class, None);
        declare(&mut binder, "x", int());
        declare(&mut binder, CLASS_CELL, int());
        assert!(binder.lookup("x", LookupOptions::NORMAL).is_some());

        binder.push(NodeId(2), ScopeKind::Function, None);
        assert!(binder.lookup("x", LookupOptions::NORMAL).is_none());
        assert!(binder.lookup(CLASS_CELL, LookupOptions::NORMAL).is_some());
    }

    #[test]
    fn enclosing_function_hit_marks_closure() {
        let mut binder = Binder::new();
        binder.push(NodeId::MODULE, ScopeKind::Module, None);
        binder.push(NodeId(1), ScopeKind::Function, None);
        declare(&mut binder, "x", int());
        let inner = binder.push(NodeId(2), ScopeKind::Function, None);

        assert!(binder.lookup("x", LookupOptions::NORMAL).is_some());
        assert!(binder.scope(inner).is_closure());
        assert_eq!(binder.scope(inner).free_variables(), ["x".to_string()]);
    }

    #[test]
    fn lookup_options_restrict_scopes() {
        let mut binder = Binder::new();
        binder.push(NodeId::MODULE, ScopeKind::Module, None);
        declare(&mut binder, "g", int());
        binder.push(NodeId(1), ScopeKind::Function, None);
        declare(&mut binder, "l", int());

        assert!(binder.lookup("g", LookupOptions::LOCAL).is_none());
        assert!(binder.lookup("g", LookupOptions::GLOBAL).is_some());
        assert!(binder.lookup("l", LookupOptions::GLOBAL).is_none());
    }

    #[test]
    fn global_statement_redirects_declaration() {
        let mut binder = Binder::new();
        let module = binder.push(NodeId::MODULE, ScopeKind::Module, None);
        let function = binder.push(NodeId(1), ScopeKind::Function, None);
        binder.declare_global("counter").unwrap();
        declare(&mut binder, "counter", int());

        assert!(binder.scope(function).variable("counter").is_none());
        let v = binder.scope(module).variable("counter").unwrap();
        assert_eq!(v.kind, VariableKind::Global);
    }

    #[test]
    fn nonlocal_statement_targets_enclosing_function() {
        let mut binder = Binder::new();
        binder.push(NodeId::MODULE, ScopeKind::Module, None);
        let outer = binder.push(NodeId(1), ScopeKind::Function, None);
        declare(&mut binder, "n", Member::Unknown);
        binder.push(NodeId(2), ScopeKind::Function, None);
        binder.declare_nonlocal("n").unwrap();
        declare(&mut binder, "n", int());

        let v = binder.scope(outer).variable("n").unwrap();
        assert!(v.value.is_instance());
    }

    #[test]
    fn reopening_a_node_reuses_its_scope() {
        let mut binder = Binder::new();
        binder.push(NodeId::MODULE, ScopeKind::Module, None);
        let first = binder.push(NodeId(1), ScopeKind::Function, None);
        binder.truncate(1);
        let second = binder.push(NodeId(1), ScopeKind::Function, None);
        assert_eq!(first, second);
    }
}
