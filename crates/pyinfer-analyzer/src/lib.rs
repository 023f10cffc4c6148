//! Type inference over the AST of one module.
//!
//! The analyzer approximates the runtime types of expressions, functions
//! and classes without executing anything. It is built from four parts:
//!
//! - [`scope`]: the scope binder, with lexical lookup and `global` /
//!   `nonlocal` redirection
//! - [`eval`]: the expression evaluator
//! - [`generics`]: generic class specialization and parameter substitution
//! - [`symbols`]: lazily evaluated functions and classes, and the module walk
//!
//! User-code problems are reported to a [`DiagnosticSink`]; an `Err` from
//! any entry point is an internal failure.
//!
//! # Example
//!
//! ```ignore
//! let registry = TypeRegistry::new();
//! let options = AnalysisOptions::default();
//! let mut diagnostics = Diagnostics::new();
//! let mut evaluator = Evaluator::new(&registry, &options, &mut diagnostics);
//! let globals = evaluator.analyze_module(module)?;
//! ```
//!
//! [`DiagnosticSink`]: pyinfer_core::DiagnosticSink

pub mod arguments;
pub mod eval;
pub mod generics;
pub mod options;
pub mod scope;
pub mod symbols;

pub use arguments::{Argument, ArgumentSet};
pub use eval::annotations::annotation_to_instance;
pub use eval::Evaluator;
pub use generics::{erase_params, receiver_params};
pub use options::{AnalysisOptions, DEFAULT_MAX_COLLECTION_SIZE};
pub use scope::{
    Binder, LookupOptions, Scope, ScopeGuard, ScopeId, ScopeKind, ScopeOwner, Variable,
    VariableKind,
};
pub use symbols::{Frame, FunctionEntry, SymbolTable};
