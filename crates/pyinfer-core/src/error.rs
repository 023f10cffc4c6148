//! Error types for the analysis core.
//!
//! Two families are kept strictly apart:
//!
//! ```text
//! AnalysisError  - internal invariant violations (programmer errors); may abort a pass
//! Lint           - user-source conditions; always reported as diagnostics, never thrown
//! ```

use thiserror::Error;

use crate::{NodeId, Span};

// ============================================================================
// Internal errors
// ============================================================================

/// Internal invariant violations.
///
/// These never describe a problem with the analyzed source. Arbitrary, even
/// invalid, source must analyze without producing one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// An overload was evaluated without the function that declares it.
    #[error("overload '{name}' has no declaring function")]
    MissingDeclaringMember { name: String },

    /// A definition was requested for a node that was never collected.
    #[error("no definition collected for node {node:?}")]
    UnknownDefinition { node: NodeId },

    /// The scope stack was popped past the module scope.
    #[error("scope stack underflow")]
    ScopeUnderflow,

    /// A registry invariant was violated (e.g. a builtin type is missing).
    #[error("registry error: {0}")]
    Registry(String),
}

// ============================================================================
// User-source diagnostics
// ============================================================================

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

/// User-code conditions diagnosed by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Lint {
    /// Index value cannot index a sequence.
    #[error("Unsupported index type '{type_name}'")]
    BadIndexType { type_name: String },

    /// Instance method whose first parameter is not `self`.
    #[error("Instance method '{function}' should take a 'self' parameter")]
    NoSelfArgument { function: String },

    /// Class method whose first parameter is not `cls`.
    #[error("Class method '{function}' should take a 'cls' parameter")]
    NoClsArgument { function: String },

    /// Method declared without any parameter.
    #[error("Method '{function}' should take at least one parameter")]
    NoMethodArgument { function: String },

    /// `__init__` returning a value other than `None`.
    #[error("Explicit return in __init__")]
    ReturnInInit,

    /// Name that resolves in no scope.
    #[error("Undefined variable: '{name}'")]
    UndefinedVariable { name: String },

    /// Binary operator applied to incompatible operand types.
    #[error("Unsupported operand types for '{op}': '{left}' and '{right}'")]
    UnsupportedOperandType {
        op: String,
        left: String,
        right: String,
    },
}

impl Lint {
    /// Stable, non-localized identifier of the problem.
    pub fn code(&self) -> &'static str {
        match self {
            Lint::BadIndexType { .. } => "bad-index-type",
            Lint::NoSelfArgument { .. } => "no-self-argument",
            Lint::NoClsArgument { .. } => "no-cls-argument",
            Lint::NoMethodArgument { .. } => "no-method-argument",
            Lint::ReturnInInit => "return-in-init",
            Lint::UndefinedVariable { .. } => "undefined-variable",
            Lint::UnsupportedOperandType { .. } => "unsupported-operand-type",
        }
    }

    /// Default severity for this kind of problem.
    pub fn severity(&self) -> Severity {
        match self {
            Lint::BadIndexType { .. } | Lint::UnsupportedOperandType { .. } => Severity::Error,
            Lint::NoSelfArgument { .. }
            | Lint::NoClsArgument { .. }
            | Lint::NoMethodArgument { .. }
            | Lint::ReturnInInit
            | Lint::UndefinedVariable { .. } => Severity::Warning,
        }
    }

    /// Build a diagnostic entry for this problem at a span.
    pub fn at(self, span: Span) -> crate::DiagnosticEntry {
        crate::DiagnosticEntry {
            message: self.to_string(),
            span,
            error_code: self.code(),
            severity: self.severity(),
            source: crate::DiagnosticSource::Analysis,
        }
    }
}
