//! Identifiers for AST nodes and documents.

use std::fmt;
use std::rc::Rc;

/// Identity of a scope-bearing AST node (module, class, function, comprehension).
///
/// Node ids are assigned by the AST producer and are unique within one module.
/// They key scopes, memoized evaluators and the module's AST-to-symbol map.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The id reserved for the module node itself.
    pub const MODULE: NodeId = NodeId(0);
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of the document diagnostics are attached to (typically a URI).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(Rc<str>);

impl DocumentId {
    pub fn new(uri: impl AsRef<str>) -> Self {
        Self(Rc::from(uri.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new("<module>")
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
