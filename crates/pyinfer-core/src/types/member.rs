//! Evaluation results.
//!
//! A [`Member`] is either a type (what an annotation denotes) or an instance
//! of a type (what a call or a literal produces). Instances of collections
//! carry their evaluated contents so that indexing, iteration and generic
//! sampling can look inside them.

use std::fmt;
use std::rc::Rc;

use ordered_float::OrderedFloat;

use super::{BuiltinTypeId, PyType};
use crate::TypeHash;

// ============================================================================
// Member
// ============================================================================

/// The result of evaluating an expression.
#[derive(Clone, Default)]
pub enum Member {
    /// Could not be inferred.
    #[default]
    Unknown,
    /// A type: a class object, a function object, a generic parameter.
    Type(PyType),
    /// An instance of a type.
    Instance(Rc<Instance>),
    /// One of several members. Never contains `Unknown` or a nested union.
    Union(Rc<[Member]>),
}

impl Member {
    /// Plain instance of a type. Instances of Unknown collapse to Unknown.
    pub fn instance_of(ty: PyType) -> Self {
        if ty.is_unknown() {
            return Member::Unknown;
        }
        Member::Instance(Rc::new(Instance::new(ty)))
    }

    pub fn from_instance(instance: Instance) -> Self {
        if instance.ty.is_unknown() {
            return Member::Unknown;
        }
        Member::Instance(Rc::new(instance))
    }

    /// A type member. The Unknown type is the Unknown member.
    pub fn of_type(ty: PyType) -> Self {
        if ty.is_unknown() {
            return Member::Unknown;
        }
        Member::Type(ty)
    }

    /// Combine several members.
    ///
    /// Unknown absorbs everything, duplicates (by kind and type identity) keep
    /// their first occurrence and a single survivor is returned unwrapped.
    pub fn union(members: impl IntoIterator<Item = Member>) -> Self {
        let mut out: Vec<Member> = Vec::new();
        for member in members {
            let flattened: Vec<Member> = match member {
                Member::Unknown => return Member::Unknown,
                Member::Union(items) => items.iter().cloned().collect(),
                other => vec![other],
            };
            for m in flattened {
                let id = m.identity();
                if !out.iter().any(|o| o.identity() == id) {
                    out.push(m);
                }
            }
        }
        match out.len() {
            0 => Member::Unknown,
            1 => out.pop().unwrap_or_default(),
            _ => Member::Union(out.into()),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Member::Unknown)
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Member::Type(_))
    }

    pub fn is_instance(&self) -> bool {
        matches!(self, Member::Instance(_))
    }

    /// The type of this member: the type itself for types, the instance's type
    /// for instances, the common type for unions (Unknown if they disagree).
    pub fn py_type(&self) -> PyType {
        match self {
            Member::Unknown => PyType::Unknown,
            Member::Type(ty) => ty.clone(),
            Member::Instance(inst) => inst.ty.clone(),
            Member::Union(items) => {
                let mut types = items.iter().map(Member::py_type);
                let Some(first) = types.next() else {
                    return PyType::Unknown;
                };
                if types.all(|t| t == first) {
                    first
                } else {
                    PyType::Unknown
                }
            }
        }
    }

    /// Whether this is `None`: a `NoneType` instance, or a union of them.
    pub fn is_none(&self) -> bool {
        match self {
            Member::Instance(inst) => inst.ty.is_builtin(BuiltinTypeId::NoneType),
            Member::Union(items) => items.iter().all(Member::is_none),
            _ => false,
        }
    }

    pub fn as_type(&self) -> Option<&PyType> {
        match self {
            Member::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Member::Instance(inst) => Some(inst),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&[Member]> {
        match self {
            Member::Union(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self.as_instance()?.value() {
            InstanceValue::Constant(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self.as_instance()?.value() {
            InstanceValue::Sequence(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self.as_instance()?.value() {
            InstanceValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Iterator protocol over an instance.
    ///
    /// `None` when the member is not a recognized iterable; callers bind
    /// Unknown in that case.
    pub fn iterate(&self) -> Option<MemberIter> {
        match self.as_instance()?.value() {
            InstanceValue::Sequence(c) => Some(MemberIter::over(c.contents.clone())),
            InstanceValue::Mapping(m) => Some(MemberIter::over(m.keys().cloned().collect())),
            InstanceValue::Iterator(elem) => Some(MemberIter::repeat(elem.clone())),
            _ => None,
        }
    }

    fn identity(&self) -> (u8, TypeHash) {
        match self {
            Member::Unknown => (0, TypeHash::UNKNOWN),
            Member::Type(ty) => (1, ty.type_hash()),
            Member::Instance(inst) => (2, inst.ty.type_hash()),
            Member::Union(_) => (3, self.py_type().type_hash()),
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Unknown => f.write_str("Unknown"),
            Member::Type(ty) => write!(f, "Type({ty})"),
            Member::Instance(inst) => write!(f, "{inst:?}"),
            Member::Union(items) => f.debug_tuple("Union").field(items).finish(),
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Unknown => f.write_str("Unknown"),
            Member::Type(ty) => write!(f, "type[{ty}]"),
            Member::Instance(inst) => write!(f, "{}", inst.ty),
            Member::Union(items) => {
                f.write_str("Union[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// ============================================================================
// Instances
// ============================================================================

/// An instance of a type, optionally carrying a known value.
pub struct Instance {
    ty: PyType,
    value: InstanceValue,
}

impl Instance {
    pub fn new(ty: PyType) -> Self {
        Self {
            ty,
            value: InstanceValue::Object,
        }
    }

    pub fn with_value(mut self, value: InstanceValue) -> Self {
        self.value = value;
        self
    }

    pub fn constant(ty: PyType, value: Constant) -> Self {
        Self::new(ty).with_value(InstanceValue::Constant(value))
    }

    pub fn sequence(ty: PyType, contents: Vec<Member>, exact: bool) -> Self {
        Self::new(ty).with_value(InstanceValue::Sequence(Collection { contents, exact }))
    }

    pub fn mapping(ty: PyType, entries: Vec<(Member, Member)>, exact: bool) -> Self {
        Self::new(ty).with_value(InstanceValue::Mapping(Mapping { entries, exact }))
    }

    pub fn iterator(ty: PyType, element: Member) -> Self {
        Self::new(ty).with_value(InstanceValue::Iterator(element))
    }

    pub fn ty(&self) -> &PyType {
        &self.ty
    }

    pub fn value(&self) -> &InstanceValue {
        &self.value
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            InstanceValue::Object => write!(f, "Instance({})", self.ty),
            value => write!(f, "Instance({}, {value:?})", self.ty),
        }
    }
}

/// What is known about an instance's value.
#[derive(Debug)]
pub enum InstanceValue {
    /// Nothing beyond its type.
    Object,
    /// A literal constant.
    Constant(Constant),
    /// List, tuple or set contents.
    Sequence(Collection),
    /// Dict contents.
    Mapping(Mapping),
    /// An iterator or generator yielding the given element.
    Iterator(Member),
}

/// Evaluated contents of a sequence.
///
/// `exact` is false when the source literal had more items than were
/// evaluated, or when the contents are a representative sample.
#[derive(Debug, Clone)]
pub struct Collection {
    pub contents: Vec<Member>,
    pub exact: bool,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn is_exact(&self) -> bool {
        self.exact
    }

    pub fn first(&self) -> Option<&Member> {
        self.contents.first()
    }

    /// Element at a position. Negative positions count from the end.
    pub fn get(&self, index: i64) -> Option<&Member> {
        let len = i64::try_from(self.contents.len()).ok()?;
        let index = if index < 0 { index + len } else { index };
        if index < 0 || index >= len {
            return None;
        }
        self.contents.get(usize::try_from(index).ok()?)
    }
}

/// Evaluated contents of a dict.
#[derive(Debug, Clone)]
pub struct Mapping {
    pub entries: Vec<(Member, Member)>,
    pub exact: bool,
}

impl Mapping {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_exact(&self) -> bool {
        self.exact
    }

    pub fn keys(&self) -> impl Iterator<Item = &Member> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Member> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn first_key(&self) -> Option<&Member> {
        self.entries.first().map(|(k, _)| k)
    }

    pub fn first_value(&self) -> Option<&Member> {
        self.entries.first().map(|(_, v)| v)
    }

    /// Value stored under a constant key.
    pub fn get(&self, key: &Constant) -> Option<&Member> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_constant() == Some(key))
            .map(|(_, v)| v)
    }
}

/// Iterator protocol over an instance's known contents.
///
/// Yields the known elements in order, then either repeats the element of an
/// open-ended iterator or ends.
#[derive(Debug, Clone)]
pub struct MemberIter {
    items: Vec<Member>,
    pos: usize,
    repeat: Option<Member>,
}

impl MemberIter {
    fn over(items: Vec<Member>) -> Self {
        Self {
            items,
            pos: 0,
            repeat: None,
        }
    }

    fn repeat(element: Member) -> Self {
        Self {
            items: Vec::new(),
            pos: 0,
            repeat: Some(element),
        }
    }

    /// Next element, or Unknown once the known contents are exhausted.
    pub fn next_value(&mut self) -> Member {
        self.next().unwrap_or_default()
    }
}

impl Iterator for MemberIter {
    type Item = Member;

    fn next(&mut self) -> Option<Member> {
        if let Some(item) = self.items.get(self.pos) {
            self.pos += 1;
            return Some(item.clone());
        }
        self.repeat.clone()
    }
}

// ============================================================================
// Constants
// ============================================================================

/// A literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(Rc<str>),
    Bytes(Rc<[u8]>),
    Bool(bool),
    None,
    Ellipsis,
}

impl Constant {
    /// The builtin type of the literal.
    pub fn builtin_id(&self) -> BuiltinTypeId {
        match self {
            Constant::Int(_) => BuiltinTypeId::Int,
            Constant::Float(_) => BuiltinTypeId::Float,
            Constant::Str(_) => BuiltinTypeId::Str,
            Constant::Bytes(_) => BuiltinTypeId::Bytes,
            Constant::Bool(_) => BuiltinTypeId::Bool,
            Constant::None => BuiltinTypeId::NoneType,
            Constant::Ellipsis => BuiltinTypeId::Ellipsis,
        }
    }

    /// Integer-like value (`bool` counts).
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Constant::Int(v) => Some(*v),
            Constant::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Float(v) => write!(f, "{v}"),
            Constant::Str(s) => write!(f, "'{s}'"),
            Constant::Bytes(b) => write!(f, "b'{}'", String::from_utf8_lossy(b)),
            Constant::Bool(true) => f.write_str("True"),
            Constant::Bool(false) => f.write_str("False"),
            Constant::None => f.write_str("None"),
            Constant::Ellipsis => f.write_str("..."),
        }
    }
}
