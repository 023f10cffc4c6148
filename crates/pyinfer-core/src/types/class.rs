//! Class types.
//!
//! One [`ClassType`] describes a builtin class, a user class, a generic
//! template or a specialization of a template. A template owns its
//! specialization cache and reentrancy guard; a specialization points back to
//! its template weakly.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use super::{
    BuiltinTypeId, Constant, GenericParamRef, Instance, InstanceValue, Member, ParamMap, PyType,
    ReentrancyGuard, SpecializationCache, SpecializationKey,
};
use crate::{NodeId, TypeHash};

pub type ClassRef = Rc<ClassType>;

bitflags! {
    /// Class modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u32 {
        /// Provided by the registry rather than declared in source.
        const BUILTIN = 1 << 0;
        /// Instances are classes (`type` and its subclasses).
        const METACLASS = 1 << 1;
        /// Produced by specializing a generic template.
        const SPECIALIZED = 1 << 2;
        /// `Type[X]`: instances denote the type `X` itself.
        const TYPE_OF_TYPE = 1 << 3;
    }
}

// ============================================================================
// Member table
// ============================================================================

/// A stored member.
///
/// A plain instance of the owning class (`next: Node`) is held weakly, so a
/// class or specialization never keeps itself alive through its members.
#[derive(Clone)]
enum Slot {
    Value(Member),
    OwnInstance(Weak<ClassType>),
}

impl Slot {
    fn new(member: Member, owner: &ClassType) -> Self {
        if let Member::Instance(instance) = &member
            && matches!(instance.value(), InstanceValue::Object)
            && let PyType::Class(class) = instance.ty()
            && std::ptr::eq(Rc::as_ptr(class), owner)
        {
            return Slot::OwnInstance(Rc::downgrade(class));
        }
        Slot::Value(member)
    }

    fn member(&self) -> Member {
        match self {
            Slot::Value(member) => member.clone(),
            Slot::OwnInstance(class) => class
                .upgrade()
                .map(|c| Member::instance_of(PyType::Class(c)))
                .unwrap_or_default(),
        }
    }
}

/// Insertion-ordered member table.
#[derive(Default, Clone)]
pub struct MemberTable {
    entries: Vec<(String, Slot)>,
    index: FxHashMap<String, usize>,
}

impl MemberTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. An existing entry is replaced only when `overwrite` is
    /// set; returns whether the table changed.
    pub fn insert(&mut self, name: impl Into<String>, member: Member, overwrite: bool) -> bool {
        self.insert_slot(name.into(), Slot::Value(member), overwrite)
    }

    fn insert_slot(&mut self, name: String, slot: Slot, overwrite: bool) -> bool {
        match self.index.get(&name) {
            Some(&i) if overwrite => {
                self.entries[i].1 = slot;
                true
            }
            Some(_) => false,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, slot));
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Member> {
        self.index.get(name).map(|&i| self.entries[i].1.member())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Member)> {
        self.entries.iter().map(|(n, slot)| (n.as_str(), slot.member()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MemberTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ============================================================================
// ClassType
// ============================================================================

/// A class.
pub struct ClassType {
    name: String,
    qualified_name: String,
    type_hash: TypeHash,
    builtin_id: Option<BuiltinTypeId>,
    flags: Cell<ClassFlags>,
    declaring_node: Cell<Option<NodeId>>,

    bases: RefCell<Vec<PyType>>,
    mro: RefCell<Vec<ClassRef>>,
    members: RefCell<MemberTable>,

    generic_params: RefCell<ParamMap>,
    template: RefCell<Weak<ClassType>>,
    specializations: RefCell<SpecializationCache>,
    guard: RefCell<ReentrancyGuard>,
    resolving_generic: Cell<bool>,
}

impl ClassType {
    /// Create a class. The identity is derived from the qualified name.
    pub fn new(
        name: impl Into<String>,
        qualified_name: impl Into<String>,
        builtin_id: Option<BuiltinTypeId>,
    ) -> Self {
        let qualified_name = qualified_name.into();
        let type_hash = TypeHash::from_name(&qualified_name);
        Self::with_hash(name, qualified_name, type_hash, builtin_id)
    }

    /// Create a class with an explicit identity (used for specializations).
    pub fn with_hash(
        name: impl Into<String>,
        qualified_name: impl Into<String>,
        type_hash: TypeHash,
        builtin_id: Option<BuiltinTypeId>,
    ) -> Self {
        Self {
            name: name.into(),
            qualified_name: qualified_name.into(),
            type_hash,
            builtin_id,
            flags: Cell::new(ClassFlags::empty()),
            declaring_node: Cell::new(None),
            bases: RefCell::new(Vec::new()),
            mro: RefCell::new(Vec::new()),
            members: RefCell::new(MemberTable::new()),
            generic_params: RefCell::new(ParamMap::new()),
            template: RefCell::new(Weak::new()),
            specializations: RefCell::new(SpecializationCache::new()),
            guard: RefCell::new(ReentrancyGuard::new()),
            resolving_generic: Cell::new(false),
        }
    }

    /// A builtin class such as `int` or `list`.
    pub fn builtin(id: BuiltinTypeId) -> Self {
        let name = id.name();
        Self::new(name, format!("builtins.{name}"), Some(id)).with_flags(ClassFlags::BUILTIN)
    }

    // === Builder Methods ===

    pub fn with_flags(self, flags: ClassFlags) -> Self {
        self.flags.set(self.flags.get() | flags);
        self
    }

    pub fn with_node(self, node: NodeId) -> Self {
        self.declaring_node.set(Some(node));
        self
    }

    pub fn with_params(self, params: &[GenericParamRef]) -> Self {
        *self.generic_params.borrow_mut() = ParamMap::identity(params);
        self
    }

    // === Identity ===

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    pub fn builtin_id(&self) -> Option<BuiltinTypeId> {
        self.builtin_id
    }

    pub fn flags(&self) -> ClassFlags {
        self.flags.get()
    }

    pub fn has_flag(&self, flag: ClassFlags) -> bool {
        self.flags.get().contains(flag)
    }

    pub fn insert_flags(&self, flags: ClassFlags) {
        self.flags.set(self.flags.get() | flags);
    }

    pub fn declaring_node(&self) -> Option<NodeId> {
        self.declaring_node.get()
    }

    /// Display name including resolved parameters, e.g. `Box[int]`.
    pub fn display_name(&self) -> String {
        if self.template().is_none() {
            return self.name.clone();
        }
        let params = self.generic_params.borrow();
        if params.is_empty() {
            return self.name.clone();
        }
        let args: Vec<String> = params.iter().map(|(_, v)| v.name().into_owned()).collect();
        format!("{}[{}]", self.name, args.join(", "))
    }

    // === Inheritance ===

    pub fn bases(&self) -> Vec<PyType> {
        self.bases.borrow().clone()
    }

    /// Set the bases and linearize the method resolution order.
    pub fn set_bases(&self, bases: Vec<PyType>) {
        let direct: Vec<ClassRef> = bases.iter().filter_map(|b| b.as_class().cloned()).collect();
        *self.bases.borrow_mut() = bases;
        *self.mro.borrow_mut() = linearize(self.type_hash, &direct);
    }

    /// Base classes in resolution order, excluding this class.
    pub fn mro(&self) -> Vec<ClassRef> {
        self.mro.borrow().clone()
    }

    /// Whether this class, or anything it derives from, is a metaclass.
    pub fn is_metaclass(&self) -> bool {
        self.has_flag(ClassFlags::METACLASS)
            || self.mro.borrow().iter().any(|c| c.has_flag(ClassFlags::METACLASS))
    }

    /// Parameters listed in an explicit `Generic[...]` base.
    pub fn explicit_params(&self) -> Option<Vec<GenericParamRef>> {
        self.bases.borrow().iter().find_map(|b| match b {
            PyType::GenericMarker(params) => Some(params.to_vec()),
            _ => None,
        })
    }

    // === Members ===

    /// Add a member; see [`MemberTable::insert`].
    pub fn add_member(&self, name: impl Into<String>, member: Member, overwrite: bool) -> bool {
        let slot = Slot::new(member, self);
        self.members.borrow_mut().insert_slot(name.into(), slot, overwrite)
    }

    /// Look a member up on this class, then along the resolution order.
    pub fn get_member(&self, name: &str) -> Option<Member> {
        if let Some(m) = self.members.borrow().get(name) {
            return Some(m);
        }
        self.mro
            .borrow()
            .iter()
            .find_map(|c| c.members.borrow().get(name))
    }

    pub fn own_member(&self, name: &str) -> Option<Member> {
        self.members.borrow().get(name)
    }

    pub fn members(&self) -> Ref<'_, MemberTable> {
        self.members.borrow()
    }

    // === Generics ===

    pub fn generic_params(&self) -> ParamMap {
        self.generic_params.borrow().clone()
    }

    pub fn set_generic_params(&self, params: ParamMap) {
        *self.generic_params.borrow_mut() = params;
    }

    /// Parameters that are still open.
    pub fn parameters(&self) -> Vec<GenericParamRef> {
        self.generic_params.borrow().open_parameters()
    }

    /// Whether the class still has open parameters, directly or via a base.
    pub fn is_generic(&self) -> bool {
        if self.resolving_generic.replace(true) {
            return false;
        }
        let generic = !self.parameters().is_empty()
            || self.bases.borrow().iter().any(|b| match b {
                PyType::Class(c) => c.is_generic(),
                _ => false,
            });
        self.resolving_generic.set(false);
        generic
    }

    /// Value a parameter resolves to in this class.
    pub fn resolve_param(&self, param: &GenericParamRef) -> Option<PyType> {
        self.generic_params.borrow().get(param).cloned()
    }

    pub fn template(&self) -> Option<ClassRef> {
        self.template.borrow().upgrade()
    }

    pub fn set_template(&self, template: &ClassRef) {
        *self.template.borrow_mut() = Rc::downgrade(template);
        self.insert_flags(ClassFlags::SPECIALIZED);
    }

    pub fn cached_specialization(&self, key: &SpecializationKey) -> Option<ClassRef> {
        self.specializations.borrow().get(key)
    }

    pub fn store_specialization(&self, key: SpecializationKey, class: ClassRef) -> ClassRef {
        self.specializations.borrow_mut().insert(key, class)
    }

    pub fn specialization_count(&self) -> usize {
        self.specializations.borrow().len()
    }

    /// Mark a specialization as in progress. Returns `false` if it already is.
    pub fn begin_specialization(&self, key: SpecializationKey, placeholder: ClassRef) -> bool {
        self.guard.borrow_mut().push(self.type_hash, key, placeholder)
    }

    /// The placeholder of an in-progress specialization.
    pub fn in_progress(&self, key: &SpecializationKey) -> Option<ClassRef> {
        self.guard.borrow().processing(self.type_hash, key)
    }

    pub fn end_specialization(&self) {
        self.guard.borrow_mut().pop();
    }

    // === Instances ===

    /// An instance of this class.
    ///
    /// Specialized collections receive one sample element per parameter so
    /// that iteration and indexing see the element type.
    pub fn create_instance(self: &Rc<Self>) -> Member {
        let ty = PyType::Class(self.clone());
        let params = self.generic_params.borrow().clone();
        let sample = |i: usize| {
            params
                .iter()
                .nth(i)
                .map(|(_, v)| Member::instance_of(v.clone()))
                .unwrap_or_default()
        };

        if self.has_flag(ClassFlags::TYPE_OF_TYPE) {
            return params
                .iter()
                .next()
                .map(|(_, v)| Member::of_type(v.clone()))
                .unwrap_or_default();
        }

        let specialized = self.template().is_some() && !params.is_empty();
        let instance = match self.builtin_id {
            Some(BuiltinTypeId::NoneType) => Instance::constant(ty, Constant::None),
            Some(BuiltinTypeId::List | BuiltinTypeId::Set | BuiltinTypeId::Tuple) if specialized => {
                Instance::sequence(ty, vec![sample(0)], false)
            }
            Some(BuiltinTypeId::Dict) if specialized => {
                Instance::mapping(ty, vec![(sample(0), sample(1))], false)
            }
            Some(BuiltinTypeId::Iterator | BuiltinTypeId::Generator) if specialized => {
                Instance::iterator(ty, sample(0))
            }
            _ => Instance::new(ty),
        };
        Member::from_instance(instance)
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassType({})", self.display_name())
    }
}

/// C3 linearization of the bases; falls back to depth-first order when the
/// hierarchy has no consistent linearization.
fn linearize(own: TypeHash, bases: &[ClassRef]) -> Vec<ClassRef> {
    let mut sequences: Vec<Vec<ClassRef>> = bases
        .iter()
        .map(|b| {
            let mut seq = vec![b.clone()];
            seq.extend(b.mro());
            seq
        })
        .collect();
    sequences.push(bases.to_vec());

    let mut out: Vec<ClassRef> = Vec::new();
    loop {
        sequences.retain(|s| !s.is_empty());
        if sequences.is_empty() {
            return out;
        }
        let candidate = sequences.iter().map(|s| s[0].clone()).find(|head| {
            !sequences
                .iter()
                .any(|s| s[1..].iter().any(|c| c.type_hash() == head.type_hash()))
        });
        let Some(head) = candidate else {
            return depth_first(own, bases);
        };
        for seq in &mut sequences {
            if seq[0].type_hash() == head.type_hash() {
                seq.remove(0);
            }
        }
        if head.type_hash() != own {
            out.push(head);
        }
    }
}

fn depth_first(own: TypeHash, bases: &[ClassRef]) -> Vec<ClassRef> {
    let mut out: Vec<ClassRef> = Vec::new();
    for base in bases {
        for c in std::iter::once(base.clone()).chain(base.mro()) {
            if c.type_hash() != own && !out.iter().any(|o| o.type_hash() == c.type_hash()) {
                out.push(c);
            }
        }
    }
    out
}
