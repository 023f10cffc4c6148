//! Stable identities for classes, functions and type variables.
//!
//! A [`TypeHash`] is derived from a qualified name, so re-analyzing the same
//! source yields the same identities. Specialized classes hash their template
//! together with the ordered argument hashes, which makes the hash usable as a
//! specialization cache key.
//!
//! ```
//! use pyinfer_core::TypeHash;
//!
//! let list = TypeHash::from_name("builtins.list");
//! let int = TypeHash::from_name("builtins.int");
//! assert_eq!(int, TypeHash::from_name("builtins.int"));
//! assert_ne!(list, TypeHash::from_specialization(list, &[int]));
//! ```

use std::fmt;
use xxhash_rust::xxh64::{Xxh64, xxh64};

/// Seeds keep names from different namespaces apart: a class `T` and a
/// type variable `T` never share an identity.
#[derive(Clone, Copy)]
#[repr(u64)]
enum Namespace {
    Class = 0x636c_6173_73,
    Function = 0x6675_6e63,
    TypeVar = 0x7476_6172,
    Specialization = 0x7370_6563,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Placeholder before a real identity is known.
    pub const EMPTY: TypeHash = TypeHash(0);
    pub const UNKNOWN: TypeHash = TypeHash(u64::MAX);

    fn in_namespace(ns: Namespace, name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), ns as u64))
    }

    /// Identity of a class from its qualified name.
    pub fn from_name(qualified_name: &str) -> Self {
        Self::in_namespace(Namespace::Class, qualified_name)
    }

    pub fn from_function(qualified_name: &str) -> Self {
        Self::in_namespace(Namespace::Function, qualified_name)
    }

    /// Type variables are keyed by their declared name only, so two
    /// `TypeVar('T')` calls denote one parameter.
    pub fn from_generic_param(name: &str) -> Self {
        Self::in_namespace(Namespace::TypeVar, name)
    }

    /// Identity of `template[args...]`. Argument order is significant.
    pub fn from_specialization(template: TypeHash, args: &[TypeHash]) -> Self {
        let mut hasher = Xxh64::new(Namespace::Specialization as u64);
        hasher.update(&template.0.to_le_bytes());
        hasher.update(&(args.len() as u64).to_le_bytes());
        for arg in args {
            hasher.update(&arg.0.to_le_bytes());
        }
        TypeHash(hasher.digest())
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:016x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
