//! Generic parameters and parameter maps.

use std::fmt;
use std::rc::Rc;

use super::{PyType, SpecializationKey};
use crate::TypeHash;

pub type GenericParamRef = Rc<GenericParam>;

/// A generic parameter (type variable), e.g. `T = TypeVar('T')`.
///
/// Constraints and bound are recorded for display only; they are not checked
/// during specialization.
pub struct GenericParam {
    name: String,
    type_hash: TypeHash,
    constraints: Vec<PyType>,
    bound: Option<PyType>,
}

impl GenericParam {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let type_hash = TypeHash::from_generic_param(&name);
        Self {
            name,
            type_hash,
            constraints: Vec::new(),
            bound: None,
        }
    }

    pub fn with_constraints(mut self, constraints: Vec<PyType>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_bound(mut self, bound: PyType) -> Self {
        self.bound = Some(bound);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    pub fn constraints(&self) -> &[PyType] {
        &self.constraints
    }

    pub fn bound(&self) -> Option<&PyType> {
        self.bound.as_ref()
    }
}

impl fmt::Debug for GenericParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GenericParam({})", self.name)
    }
}

/// Ordered map from generic parameter to the type it resolves to.
///
/// A parameter is unresolved while its entry points to itself.
#[derive(Clone, Default, Debug)]
pub struct ParamMap {
    entries: Vec<(GenericParamRef, PyType)>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map with every parameter pointing to itself.
    pub fn identity(params: &[GenericParamRef]) -> Self {
        Self {
            entries: params
                .iter()
                .map(|p| (p.clone(), PyType::Param(p.clone())))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, param: &GenericParam) -> bool {
        self.position(param).is_some()
    }

    pub fn get(&self, param: &GenericParam) -> Option<&PyType> {
        self.position(param).map(|i| &self.entries[i].1)
    }

    /// Bind a parameter. Parameters not in the map are appended.
    pub fn set(&mut self, param: &GenericParamRef, ty: PyType) {
        match self.position(param) {
            Some(i) => self.entries[i].1 = ty,
            None => self.entries.push((param.clone(), ty)),
        }
    }

    /// Whether the parameter still points to itself (or is absent).
    pub fn is_unresolved(&self, param: &GenericParam) -> bool {
        match self.get(param) {
            Some(PyType::Param(p)) => p.type_hash() == param.type_hash(),
            Some(_) => false,
            None => true,
        }
    }

    /// Parameters whose value is still a generic parameter, in map order.
    ///
    /// A value may be a different parameter than its key (`B(A[E])` maps
    /// `A`'s `T` to `E`); the value is what remains open.
    pub fn open_parameters(&self) -> Vec<GenericParamRef> {
        let mut out: Vec<GenericParamRef> = Vec::new();
        for (_, value) in &self.entries {
            if let PyType::Param(p) = value
                && !out.iter().any(|q| q.type_hash() == p.type_hash())
            {
                out.push(p.clone());
            }
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GenericParamRef, &PyType)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &GenericParamRef> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Cache key derived from the resolved values, in parameter order.
    pub fn key(&self) -> SpecializationKey {
        SpecializationKey::new(self.entries.iter().map(|(_, v)| v.type_hash()).collect())
    }

    fn position(&self, param: &GenericParam) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.type_hash() == param.type_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str) -> GenericParamRef {
        Rc::new(GenericParam::new(name))
    }

    #[test]
    fn identity_map_is_unresolved() {
        let t = param("T");
        let map = ParamMap::identity(&[t.clone()]);
        assert!(map.is_unresolved(&t));
        assert_eq!(map.open_parameters().len(), 1);
    }

    #[test]
    fn binding_resolves_parameter() {
        let t = param("T");
        let mut map = ParamMap::identity(&[t.clone()]);
        map.set(&t, PyType::Unknown);
        assert!(!map.is_unresolved(&t));
        assert!(map.open_parameters().is_empty());
    }

    #[test]
    fn same_name_is_same_parameter() {
        let a = param("T");
        let b = param("T");
        let mut map = ParamMap::identity(&[a]);
        map.set(&b, PyType::Unknown);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn key_tracks_resolution() {
        let k = param("K");
        let v = param("V");
        let mut map = ParamMap::identity(&[k.clone(), v.clone()]);
        let open = map.key();
        map.set(&v, PyType::Unknown);
        assert_ne!(open, map.key());
    }
}
