//! Type model shared by the registry and the analyzer.
//!
//! - [`PyType`]: a type descriptor (class, generic parameter, function, ...)
//! - [`Member`]: the result of evaluation, either a type or an instance of one
//! - [`ClassType`]: classes, generic templates and their specializations
//! - [`FunctionType`] / [`Overload`]: callables and their signatures
//!
//! Entities are reference counted and use interior mutability: one module's
//! analysis is single threaded and owns every entity it creates.

mod class;
mod function;
mod generic;
mod member;
mod specialization;

pub use class::{ClassFlags, ClassRef, ClassType, MemberTable};
pub use function::{
    FunctionFlags, FunctionRef, FunctionType, Overload, OverloadRef, OverloadState, ParameterInfo,
    ParameterKind,
};
pub use generic::{GenericParam, GenericParamRef, ParamMap};
pub use member::{Collection, Constant, Instance, InstanceValue, Mapping, Member, MemberIter};
pub use specialization::{ReentrancyGuard, SpecializationCache, SpecializationKey};

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::TypeHash;

/// Identity of builtin types used for structural matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTypeId {
    Object,
    Type,
    NoneType,
    Bool,
    Int,
    Float,
    Complex,
    Str,
    Bytes,
    List,
    Tuple,
    Set,
    Dict,
    Function,
    Iterator,
    Generator,
    Ellipsis,
}

impl BuiltinTypeId {
    /// Every builtin identity, in declaration order.
    pub const ALL: [BuiltinTypeId; 17] = [
        BuiltinTypeId::Object,
        BuiltinTypeId::Type,
        BuiltinTypeId::NoneType,
        BuiltinTypeId::Bool,
        BuiltinTypeId::Int,
        BuiltinTypeId::Float,
        BuiltinTypeId::Complex,
        BuiltinTypeId::Str,
        BuiltinTypeId::Bytes,
        BuiltinTypeId::List,
        BuiltinTypeId::Tuple,
        BuiltinTypeId::Set,
        BuiltinTypeId::Dict,
        BuiltinTypeId::Function,
        BuiltinTypeId::Iterator,
        BuiltinTypeId::Generator,
        BuiltinTypeId::Ellipsis,
    ];

    /// The builtin class name.
    pub fn name(self) -> &'static str {
        match self {
            BuiltinTypeId::Object => "object",
            BuiltinTypeId::Type => "type",
            BuiltinTypeId::NoneType => "NoneType",
            BuiltinTypeId::Bool => "bool",
            BuiltinTypeId::Int => "int",
            BuiltinTypeId::Float => "float",
            BuiltinTypeId::Complex => "complex",
            BuiltinTypeId::Str => "str",
            BuiltinTypeId::Bytes => "bytes",
            BuiltinTypeId::List => "list",
            BuiltinTypeId::Tuple => "tuple",
            BuiltinTypeId::Set => "set",
            BuiltinTypeId::Dict => "dict",
            BuiltinTypeId::Function => "function",
            BuiltinTypeId::Iterator => "iterator",
            BuiltinTypeId::Generator => "generator",
            BuiltinTypeId::Ellipsis => "ellipsis",
        }
    }

    /// Numeric tower rank (`bool < int < float < complex`).
    pub fn numeric_rank(self) -> Option<u8> {
        match self {
            BuiltinTypeId::Bool => Some(0),
            BuiltinTypeId::Int => Some(1),
            BuiltinTypeId::Float => Some(2),
            BuiltinTypeId::Complex => Some(3),
            _ => None,
        }
    }

    /// Sequences that can be indexed by integer position.
    pub fn is_sequence(self) -> bool {
        matches!(self, BuiltinTypeId::List | BuiltinTypeId::Tuple)
    }

    /// Collections whose literal contents are tracked.
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            BuiltinTypeId::List | BuiltinTypeId::Tuple | BuiltinTypeId::Set | BuiltinTypeId::Dict
        )
    }
}

/// A type descriptor.
#[derive(Clone)]
pub enum PyType {
    /// The Unknown sentinel. Propagates through every dependent computation.
    Unknown,
    /// A class: builtin, user-defined, generic template or specialization.
    Class(ClassRef),
    /// A generic parameter (type variable).
    Param(GenericParamRef),
    /// A function or method.
    Function(FunctionRef),
    /// The explicit parameterization marker `Generic[T1, T2, ...]`.
    GenericMarker(Rc<[GenericParamRef]>),
}

impl PyType {
    pub fn is_unknown(&self) -> bool {
        matches!(self, PyType::Unknown)
    }

    /// Identity used for equality, cache keys and structural matching.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            PyType::Unknown => TypeHash::UNKNOWN,
            PyType::Class(c) => c.type_hash(),
            PyType::Param(p) => p.type_hash(),
            PyType::Function(f) => f.type_hash(),
            PyType::GenericMarker(params) => {
                let args: Vec<TypeHash> = params.iter().map(|p| p.type_hash()).collect();
                TypeHash::from_specialization(TypeHash::from_name("typing.Generic"), &args)
            }
        }
    }

    /// Builtin identity, if this is a builtin (or builtin-derived) type.
    pub fn builtin_id(&self) -> Option<BuiltinTypeId> {
        match self {
            PyType::Class(c) => c.builtin_id(),
            PyType::Function(_) => Some(BuiltinTypeId::Function),
            _ => None,
        }
    }

    pub fn is_builtin(&self, id: BuiltinTypeId) -> bool {
        self.builtin_id() == Some(id)
    }

    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            PyType::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionRef> {
        match self {
            PyType::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_param(&self) -> Option<&GenericParamRef> {
        match self {
            PyType::Param(p) => Some(p),
            _ => None,
        }
    }

    /// Whether this is a class template with unresolved generic parameters.
    pub fn is_generic(&self) -> bool {
        match self {
            PyType::Class(c) => c.is_generic(),
            PyType::Param(_) => true,
            _ => false,
        }
    }

    /// Display name, e.g. `int` or `Box[int]`.
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            PyType::Unknown => Cow::Borrowed("Unknown"),
            PyType::Class(c) => Cow::Owned(c.display_name()),
            PyType::Param(p) => Cow::Borrowed(p.name()),
            PyType::Function(f) => Cow::Borrowed(f.name()),
            PyType::GenericMarker(params) => {
                let names: Vec<&str> = params.iter().map(|p| p.name()).collect();
                Cow::Owned(format!("Generic[{}]", names.join(", ")))
            }
        }
    }
}

impl PartialEq for PyType {
    fn eq(&self, other: &Self) -> bool {
        self.type_hash() == other.type_hash()
    }
}

impl Eq for PyType {}

impl fmt::Debug for PyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PyType({})", self.name())
    }
}

impl fmt::Display for PyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Kind of module being analyzed; drives body-walk and memory policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModuleKind {
    /// User-authored source.
    #[default]
    User,
    /// Third-party or standard library source.
    Library,
    /// Type stub.
    Stub,
    /// Module with hand-written specializations.
    Specialized,
}

impl ModuleKind {
    pub fn is_user(self) -> bool {
        self == ModuleKind::User
    }
}
