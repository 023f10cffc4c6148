//! Functions, methods and their overloads.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use bitflags::bitflags;

use super::{ClassRef, ClassType, Member, PyType};
use crate::{NodeId, TypeHash};

pub type FunctionRef = Rc<FunctionType>;
pub type OverloadRef = Rc<Overload>;

/// Methods that are class methods without a decorator.
const IMPLICIT_CLASS_METHODS: &[&str] = &["__new__", "__init_subclass__", "__class_getitem__"];

bitflags! {
    /// Function modifiers, mostly set by decorators.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionFlags: u32 {
        const STATIC = 1 << 0;
        const CLASS_METHOD = 1 << 1;
        const ABSTRACT = 1 << 2;
        const OVERLOAD = 1 << 3;
        const PROPERTY = 1 << 4;
        /// Body contains `yield` at the top level.
        const GENERATOR = 1 << 5;
        /// Provided by the registry.
        const BUILTIN = 1 << 6;
        /// A decorator could not be resolved.
        const INVALID_DECORATORS = 1 << 7;
    }
}

// ============================================================================
// FunctionType
// ============================================================================

/// A function, method or property.
pub struct FunctionType {
    name: String,
    qualified_name: String,
    type_hash: TypeHash,
    node: Option<NodeId>,
    declaring_class: Weak<ClassType>,
    flags: Cell<FunctionFlags>,
    overloads: RefCell<Vec<OverloadRef>>,
}

impl FunctionType {
    pub fn new(name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        Self {
            name: name.into(),
            type_hash: TypeHash::from_function(&qualified_name),
            qualified_name,
            node: None,
            declaring_class: Weak::new(),
            flags: Cell::new(FunctionFlags::empty()),
            overloads: RefCell::new(Vec::new()),
        }
    }

    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    /// Attach to a class. Implicit class methods get their flag here.
    pub fn with_declaring_class(mut self, class: &ClassRef) -> Self {
        self.declaring_class = Rc::downgrade(class);
        if IMPLICIT_CLASS_METHODS.contains(&self.name.as_str()) {
            self.insert_flags(FunctionFlags::CLASS_METHOD);
        }
        self
    }

    pub fn with_flags(self, flags: FunctionFlags) -> Self {
        self.insert_flags(flags);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn declaring_class(&self) -> Option<ClassRef> {
        self.declaring_class.upgrade()
    }

    pub fn is_method(&self) -> bool {
        self.declaring_class.strong_count() > 0
    }

    pub fn flags(&self) -> FunctionFlags {
        self.flags.get()
    }

    pub fn insert_flags(&self, flags: FunctionFlags) {
        self.flags.set(self.flags.get() | flags);
    }

    pub fn is_static(&self) -> bool {
        self.flags().contains(FunctionFlags::STATIC)
    }

    pub fn is_class_method(&self) -> bool {
        self.flags().contains(FunctionFlags::CLASS_METHOD)
    }

    pub fn is_property(&self) -> bool {
        self.flags().contains(FunctionFlags::PROPERTY)
    }

    pub fn has_valid_decorators(&self) -> bool {
        !self.flags().contains(FunctionFlags::INVALID_DECORATORS)
    }

    /// Apply a decorator by name. Returns whether it was recognized.
    pub fn apply_decorator(&self, name: &str) -> bool {
        let flags = match name {
            "staticmethod" => FunctionFlags::STATIC,
            "classmethod" => FunctionFlags::CLASS_METHOD,
            "abstractmethod" => FunctionFlags::ABSTRACT,
            "abstractstaticmethod" => FunctionFlags::ABSTRACT | FunctionFlags::STATIC,
            "abstractclassmethod" => FunctionFlags::ABSTRACT | FunctionFlags::CLASS_METHOD,
            "abstractproperty" => FunctionFlags::ABSTRACT | FunctionFlags::PROPERTY,
            "property" => FunctionFlags::PROPERTY,
            "overload" => FunctionFlags::OVERLOAD,
            _ => return false,
        };
        self.insert_flags(flags);
        true
    }

    /// Register an overload and point it back at this function.
    pub fn add_overload(self: &Rc<Self>, overload: Overload) -> OverloadRef {
        *overload.function.borrow_mut() = Rc::downgrade(self);
        let overload = Rc::new(overload);
        self.overloads.borrow_mut().push(overload.clone());
        overload
    }

    pub fn overloads(&self) -> Ref<'_, [OverloadRef]> {
        Ref::map(self.overloads.borrow(), Vec::as_slice)
    }

    pub fn first_overload(&self) -> Option<OverloadRef> {
        self.overloads.borrow().first().cloned()
    }
}

impl fmt::Debug for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionType({})", self.qualified_name)
    }
}

// ============================================================================
// Overload
// ============================================================================

/// How a parameter accepts arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterKind {
    #[default]
    Normal,
    /// `*args`
    VarPositional,
    KeywordOnly,
    /// `**kwargs`
    VarKeyword,
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct ParameterInfo {
    pub name: String,
    /// Annotated type; Unknown when unannotated.
    pub declared_type: PyType,
    /// Value of the default expression; Unknown when absent.
    pub default_value: Member,
    pub has_default: bool,
    pub kind: ParameterKind,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: PyType::Unknown,
            default_value: Member::Unknown,
            has_default: false,
            kind: ParameterKind::Normal,
        }
    }

    pub fn with_type(mut self, ty: PyType) -> Self {
        self.declared_type = ty;
        self
    }

    pub fn with_default(mut self, value: Member) -> Self {
        self.default_value = value;
        self.has_default = true;
        self
    }

    pub fn with_kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Evaluation progress of an overload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverloadState {
    #[default]
    Pending,
    Evaluating,
    Evaluated,
}

/// One callable signature.
///
/// The declared return is a single value; inferred returns accumulate one
/// entry per `return` site and are reported as their union.
pub struct Overload {
    name: String,
    node: Option<NodeId>,
    function: RefCell<Weak<FunctionType>>,
    parameters: RefCell<Vec<ParameterInfo>>,
    declared_return: RefCell<Option<Member>>,
    inferred_returns: RefCell<Vec<Member>>,
    state: Cell<OverloadState>,
}

impl Overload {
    pub fn new(name: impl Into<String>, node: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            node,
            function: RefCell::new(Weak::new()),
            parameters: RefCell::new(Vec::new()),
            declared_return: RefCell::new(None),
            inferred_returns: RefCell::new(Vec::new()),
            state: Cell::new(OverloadState::Pending),
        }
    }

    /// Pre-evaluated signature; used for builtins.
    pub fn with_signature(self, parameters: Vec<ParameterInfo>, returns: Member) -> Self {
        *self.parameters.borrow_mut() = parameters;
        *self.declared_return.borrow_mut() = Some(returns);
        self.state.set(OverloadState::Evaluated);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// The function this overload belongs to.
    pub fn function(&self) -> Option<FunctionRef> {
        self.function.borrow().upgrade()
    }

    pub fn parameters(&self) -> Vec<ParameterInfo> {
        self.parameters.borrow().clone()
    }

    pub fn set_parameters(&self, parameters: Vec<ParameterInfo>) {
        *self.parameters.borrow_mut() = parameters;
    }

    pub fn declared_return(&self) -> Option<Member> {
        self.declared_return.borrow().clone()
    }

    pub fn set_declared_return(&self, value: Member) {
        *self.declared_return.borrow_mut() = Some(value);
    }

    /// Record the value of one `return` site.
    pub fn add_return_value(&self, value: Member) {
        self.inferred_returns.borrow_mut().push(value);
    }

    pub fn inferred_return_count(&self) -> usize {
        self.inferred_returns.borrow().len()
    }

    /// Declared return if any, else the union of every inferred return.
    pub fn return_value(&self) -> Member {
        if let Some(declared) = self.declared_return.borrow().as_ref() {
            return declared.clone();
        }
        let inferred = self.inferred_returns.borrow();
        if inferred.is_empty() {
            return Member::Unknown;
        }
        Member::union(inferred.iter().cloned())
    }

    pub fn state(&self) -> OverloadState {
        self.state.get()
    }

    pub fn set_state(&self, state: OverloadState) {
        self.state.set(state);
    }
}

impl fmt::Debug for Overload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overload")
            .field("name", &self.name)
            .field("parameters", &self.parameters.borrow())
            .field("state", &self.state.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BuiltinTypeId;

    fn builtin(id: BuiltinTypeId) -> PyType {
        PyType::Class(Rc::new(ClassType::builtin(id)))
    }

    #[test]
    fn decorators_set_flags() {
        let f = FunctionType::new("f", "m.f");
        assert!(f.apply_decorator("staticmethod"));
        assert!(f.is_static());
        assert!(f.apply_decorator("abstractclassmethod"));
        assert!(f.is_class_method());
        assert!(f.flags().contains(FunctionFlags::ABSTRACT));
        assert!(!f.apply_decorator("wraps"));
    }

    #[test]
    fn implicit_class_methods() {
        let class = Rc::new(ClassType::new("C", "m.C", None));
        let new = FunctionType::new("__new__", "m.C.__new__").with_declaring_class(&class);
        assert!(new.is_class_method());
        let init = FunctionType::new("__init__", "m.C.__init__").with_declaring_class(&class);
        assert!(!init.is_class_method());
        assert!(init.is_method());
    }

    #[test]
    fn overload_points_back_to_function() {
        let f = Rc::new(FunctionType::new("f", "m.f"));
        let o = f.add_overload(Overload::new("f", None));
        assert!(Rc::ptr_eq(&o.function().unwrap(), &f));
        assert_eq!(f.overloads().len(), 1);
    }

    #[test]
    fn inferred_returns_union() {
        let o = Overload::new("f", None);
        assert!(o.return_value().is_unknown());
        o.add_return_value(Member::instance_of(builtin(BuiltinTypeId::Int)));
        o.add_return_value(Member::instance_of(builtin(BuiltinTypeId::Str)));
        assert_eq!(o.return_value().as_union().map(<[Member]>::len), Some(2));
    }

    #[test]
    fn declared_return_wins() {
        let o = Overload::new("f", None);
        o.add_return_value(Member::instance_of(builtin(BuiltinTypeId::Str)));
        o.set_declared_return(Member::instance_of(builtin(BuiltinTypeId::Int)));
        assert!(o.return_value().py_type().is_builtin(BuiltinTypeId::Int));
    }
}
