//! Static type inference for a Python-like language.
//!
//! `pyinfer` approximates the runtime types of variables, expressions,
//! functions and classes in a module without executing it, for editor
//! features such as hover, completion and diagnostics.
//!
//! The parser is not part of this crate: callers hand in an AST built in a
//! [`bumpalo::Bump`] arena (see [`AstBuilder`]).
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use pyinfer::{Analyzer, AstBuilder, BuiltinTypeId};
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let module = b.module([
//!     b.def("f").body([b.ret(Some(b.str("hello")))]),
//!     b.assign(b.name("x"), b.call(b.name("f"), [])),
//! ]);
//!
//! let analysis = Analyzer::new().analyze(module).unwrap();
//! let x = analysis.value("x").unwrap();
//! assert!(x.py_type().is_builtin(BuiltinTypeId::Str));
//! assert!(analysis.diagnostics().is_empty());
//! ```

use thiserror::Error;
use tracing::debug;

pub use pyinfer_analyzer::{
    AnalysisOptions, Argument, ArgumentSet, Evaluator, LookupOptions, ScopeKind, Variable,
    VariableKind, DEFAULT_MAX_COLLECTION_SIZE,
};
pub use pyinfer_ast::{AstBuilder, Module};
pub use pyinfer_core::{
    AnalysisError, BuiltinTypeId, ClassRef, ClassType, Constant, DiagnosticEntry, DiagnosticSink,
    Diagnostics, DocumentId, FunctionRef, Instance, InstanceValue, Lint, Member, ModuleKind,
    NodeId, ParameterKind, Position, PyType, Severity, Span, TypeHash,
};
pub use pyinfer_registry::{RegistryError, TypeRegistry};

pub use pyinfer_analyzer as analyzer;
pub use pyinfer_ast as ast;
pub use pyinfer_core as core;
pub use pyinfer_registry as registry;

/// Errors from the [`Analyzer`] facade.
#[derive(Debug, Error)]
pub enum Error {
    #[error("registration failed: {0}")]
    Registration(#[from] RegistryError),

    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}

/// Analyzes modules against one registry.
///
/// The registry is shared read-only by every analysis; each call to
/// [`analyze`](Self::analyze) gets a fresh scope arena and symbol table.
#[derive(Debug, Default)]
pub struct Analyzer {
    registry: TypeRegistry,
    options: AnalysisOptions,
}

impl Analyzer {
    /// An analyzer with the builtin registry and default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: AnalysisOptions) -> Self {
        Self {
            registry: TypeRegistry::new(),
            options,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut AnalysisOptions {
        &mut self.options
    }

    /// Make `member` resolvable as `name` in every analyzed module.
    ///
    /// # Errors
    ///
    /// Fails if `name` is already registered.
    pub fn register_builtin(&mut self, name: impl Into<String>, member: Member) -> Result<(), Error> {
        self.registry.register(name, member)?;
        Ok(())
    }

    /// Analyze a module, collecting diagnostics.
    ///
    /// Problems in the analyzed code are diagnostics, not errors; an `Err`
    /// means the analyzer itself failed.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn analyze<'ast>(&self, module: &'ast Module<'ast>) -> Result<ModuleAnalysis, Error> {
        let mut diagnostics = Diagnostics::new();
        let globals = self.analyze_into(module, &mut diagnostics)?;
        debug!(
            globals = globals.len(),
            diagnostics = diagnostics.len(),
            "analysis finished"
        );
        Ok(ModuleAnalysis {
            globals,
            diagnostics,
        })
    }

    /// Analyze a module, reporting diagnostics to `sink`.
    pub fn analyze_into<'ast>(
        &self,
        module: &'ast Module<'ast>,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Vec<Variable>, Error> {
        let mut evaluator = Evaluator::new(&self.registry, &self.options, sink);
        Ok(evaluator.analyze_module(module)?)
    }
}

/// Result of analyzing one module.
#[derive(Debug)]
pub struct ModuleAnalysis {
    globals: Vec<Variable>,
    diagnostics: Diagnostics,
}

impl ModuleAnalysis {
    /// Module-level variables in declaration order.
    pub fn globals(&self) -> &[Variable] {
        &self.globals
    }

    pub fn global(&self, name: &str) -> Option<&Variable> {
        self.globals.iter().find(|v| v.name == name)
    }

    /// Inferred value of a module-level variable.
    pub fn value(&self, name: &str) -> Option<&Member> {
        self.global(name).map(|v| &v.value)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (Vec<Variable>, Diagnostics) {
        (self.globals, self.diagnostics)
    }
}
