//! Per-module symbols: declared functions and classes by defining node.
//!
//! Definitions are collected while walking and evaluated lazily, at most
//! once per node. The table lives as long as the evaluator that owns it;
//! nothing here is shared between modules.
//!
//! - [`function`]: declaring and evaluating functions
//! - [`class`]: declaring classes and collecting their members
//! - [`walker`]: statement walking for module and function bodies
//! - [`module`]: whole-module analysis

mod class;
mod function;
mod module;
mod walker;

use pyinfer_ast::FunctionDef;
use pyinfer_core::{ClassRef, FunctionRef, NodeId};
use rustc_hash::FxHashMap;

use crate::scope::ScopeId;

pub use walker::Frame;

/// A collected function definition.
#[derive(Debug, Clone)]
pub struct FunctionEntry<'ast> {
    pub def: &'ast FunctionDef<'ast>,
    /// Scope the definition appears in; the lexical parent of its body.
    pub scope: ScopeId,
    pub function: FunctionRef,
}

/// Definitions of one module keyed by their AST node.
#[derive(Debug, Default)]
pub struct SymbolTable<'ast> {
    functions: Vec<FunctionEntry<'ast>>,
    by_node: FxHashMap<NodeId, usize>,
    classes: FxHashMap<NodeId, ClassRef>,
}

impl<'ast> SymbolTable<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(&self, node: NodeId) -> Option<&FunctionEntry<'ast>> {
        self.by_node.get(&node).map(|&i| &self.functions[i])
    }

    /// Functions in declaration order.
    pub fn function_at(&self, index: usize) -> Option<&FunctionEntry<'ast>> {
        self.functions.get(index)
    }

    pub fn insert(&mut self, entry: FunctionEntry<'ast>) {
        self.by_node.insert(entry.def.id, self.functions.len());
        self.functions.push(entry);
    }

    pub fn class(&self, node: NodeId) -> Option<&ClassRef> {
        self.classes.get(&node)
    }

    pub fn insert_class(&mut self, node: NodeId, class: ClassRef) {
        self.classes.insert(node, class);
    }

    /// Number of collected functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}
