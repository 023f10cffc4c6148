//! Type registry for builtin and `typing` names.
//!
//! The analyzer consults the [`TypeRegistry`] last when resolving a name. It
//! provides the builtin classes (with their structural identities), the
//! generic `typing` aliases, decorator names and a handful of builtin
//! functions with known return values.

mod builtins;
mod registry;

pub use registry::{RegistryError, TypeRegistry};
