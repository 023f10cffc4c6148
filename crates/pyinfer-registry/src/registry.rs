//! TypeRegistry - name lookup for builtin and typing entities.
//!
//! # Storage Model
//!
//! - **Builtin classes**: one [`ClassRef`] per [`BuiltinTypeId`], indexed by id
//! - **Names**: every name visible without import (`int`, `List`, `len`, ...)
//!   mapped to the [`Member`] it denotes
//!
//! The registry is built once and then only read. Its entities are reference
//! counted and not thread-safe; each analysis thread builds its own registry.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use pyinfer_core::{
    AnalysisError, BuiltinTypeId, ClassRef, Constant, FunctionRef, Instance, Member, PyType,
    TypeHash,
};

/// Errors raised while registering names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("name '{0}' is already registered")]
    DuplicateName(String),
}

impl From<RegistryError> for AnalysisError {
    fn from(err: RegistryError) -> Self {
        AnalysisError::Registry(err.to_string())
    }
}

/// Builtin and typing names.
pub struct TypeRegistry {
    /// Builtin classes indexed by `BuiltinTypeId as usize`.
    pub(crate) builtins: Vec<ClassRef>,
    pub(crate) names: FxHashMap<String, Member>,
    pub(crate) generic_marker: TypeHash,
    pub(crate) type_var: TypeHash,
}

impl TypeRegistry {
    /// Create a registry with every builtin registered.
    pub fn new() -> Self {
        let mut registry = Self {
            builtins: Vec::with_capacity(BuiltinTypeId::ALL.len()),
            names: FxHashMap::default(),
            generic_marker: TypeHash::EMPTY,
            type_var: TypeHash::EMPTY,
        };
        registry.register_builtins();
        registry
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// What a name denotes, if it is a builtin or typing name.
    pub fn lookup(&self, name: &str) -> Option<Member> {
        self.names.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// The class of a builtin type.
    pub fn builtin_class(&self, id: BuiltinTypeId) -> ClassRef {
        self.builtins[id as usize].clone()
    }

    /// A builtin type.
    pub fn builtin(&self, id: BuiltinTypeId) -> PyType {
        PyType::Class(self.builtin_class(id))
    }

    /// The Unknown sentinel.
    pub fn unknown(&self) -> PyType {
        PyType::Unknown
    }

    /// A plain instance of a builtin type.
    pub fn instance(&self, id: BuiltinTypeId) -> Member {
        self.builtin_class(id).create_instance()
    }

    /// An instance carrying a literal value.
    pub fn constant(&self, value: Constant) -> Member {
        let ty = self.builtin(value.builtin_id());
        Member::from_instance(Instance::constant(ty, value))
    }

    /// The `None` instance.
    pub fn none(&self) -> Member {
        self.constant(Constant::None)
    }

    /// Whether a class is the `Generic[...]` parameterization marker.
    pub fn is_generic_marker(&self, class: &ClassRef) -> bool {
        class.type_hash() == self.generic_marker
    }

    /// Whether a function is the `TypeVar` constructor.
    pub fn is_type_var(&self, function: &FunctionRef) -> bool {
        function.type_hash() == self.type_var
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register an additional name.
    pub fn register(&mut self, name: impl Into<String>, member: Member) -> Result<(), RegistryError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.names.insert(name, member);
        Ok(())
    }

    pub(crate) fn register_class(&mut self, name: &str, class: &ClassRef) {
        self.names
            .insert(name.to_string(), Member::Type(PyType::Class(Rc::clone(class))));
    }

    pub(crate) fn register_function(&mut self, function: &FunctionRef) {
        self.names.insert(
            function.name().to_string(),
            Member::Type(PyType::Function(Rc::clone(function))),
        );
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("builtins", &self.builtins.len())
            .field("names", &self.names.len())
            .finish()
    }
}
