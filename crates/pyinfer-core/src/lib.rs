//! Core types for static type inference.
//!
//! This crate holds everything shared between the registry and the analyzer:
//!
//! - [`Span`], [`NodeId`] and [`DocumentId`] for locating things
//! - [`TypeHash`] for deterministic type identity
//! - the type model in [`types`]
//! - [`AnalysisError`] for internal failures and [`Lint`] for user-code problems
//! - [`DiagnosticSink`] and the in-memory [`Diagnostics`] collector

pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod span;
pub mod type_hash;
pub mod types;

pub use diagnostics::{DiagnosticEntry, DiagnosticSink, DiagnosticSource, Diagnostics};
pub use error::{AnalysisError, Lint, Severity};
pub use ids::{DocumentId, NodeId};
pub use span::{Position, Span};
pub use type_hash::TypeHash;
pub use types::{
    BuiltinTypeId, ClassFlags, ClassRef, ClassType, Collection, Constant, FunctionFlags,
    FunctionRef, FunctionType, GenericParam, GenericParamRef, Instance, InstanceValue, Mapping,
    Member, MemberIter, MemberTable, ModuleKind, Overload, OverloadRef, OverloadState, ParamMap,
    ParameterInfo, ParameterKind, PyType, ReentrancyGuard, SpecializationCache,
    SpecializationKey,
};
