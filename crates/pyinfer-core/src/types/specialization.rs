//! Specialization cache and reentrancy guard.
//!
//! Both are owned by the template [`ClassType`](super::ClassType) they serve;
//! there is no process-wide cache.

use rustc_hash::FxHashMap;

use super::ClassRef;
use crate::TypeHash;

/// Cache key: the hashes of the resolved parameter values, in parameter order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpecializationKey(Vec<TypeHash>);

impl SpecializationKey {
    pub fn new(hashes: Vec<TypeHash>) -> Self {
        Self(hashes)
    }

    pub fn hashes(&self) -> &[TypeHash] {
        &self.0
    }
}

/// Finished specializations of one template.
///
/// At most one entry exists per key, so specializing twice with the same
/// resolved signature yields the same object.
#[derive(Default, Debug)]
pub struct SpecializationCache {
    entries: FxHashMap<SpecializationKey, ClassRef>,
}

impl SpecializationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SpecializationKey) -> Option<ClassRef> {
        self.entries.get(key).cloned()
    }

    /// Store a finished specialization. An existing entry is kept.
    pub fn insert(&mut self, key: SpecializationKey, class: ClassRef) -> ClassRef {
        self.entries.entry(key).or_insert(class).clone()
    }

    pub fn contains(&self, key: &SpecializationKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Stack of specializations currently being materialized.
///
/// A request for a `(template, key)` pair that is already on the stack
/// receives the in-progress placeholder instead of recursing.
#[derive(Default, Debug)]
pub struct ReentrancyGuard {
    stack: Vec<((TypeHash, SpecializationKey), ClassRef)>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a marker. Returns `false` (and pushes nothing) if it is already active.
    pub fn push(&mut self, template: TypeHash, key: SpecializationKey, placeholder: ClassRef) -> bool {
        if self.processing(template, &key).is_some() {
            return false;
        }
        self.stack.push(((template, key), placeholder));
        true
    }

    /// The in-progress placeholder for a marker, if active.
    pub fn processing(&self, template: TypeHash, key: &SpecializationKey) -> Option<ClassRef> {
        self.stack
            .iter()
            .rev()
            .find(|((t, k), _)| *t == template && k == key)
            .map(|(_, class)| class.clone())
    }

    pub fn pop(&mut self) -> Option<ClassRef> {
        self.stack.pop().map(|(_, class)| class)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
