//! Analysis configuration.

use pyinfer_core::{DocumentId, ModuleKind};

/// Default cap on evaluated items of a collection literal.
pub const DEFAULT_MAX_COLLECTION_SIZE: usize = 1000;

/// Options for analyzing one module.
///
/// # Example
///
/// ```
/// use pyinfer_analyzer::AnalysisOptions;
/// use pyinfer_core::ModuleKind;
///
/// let options = AnalysisOptions::default()
///     .with_module_kind(ModuleKind::Library)
///     .with_max_collection_size(64);
/// assert_eq!(options.max_collection_size, 64);
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Drives the function body-walk policy.
    pub module_kind: ModuleKind,
    /// Keep function locals of non-user modules after evaluation.
    pub keep_library_locals: bool,
    /// Collection literals with more items are evaluated up to this many and
    /// marked inexact.
    pub max_collection_size: usize,
    /// Document diagnostics are attached to.
    pub document: DocumentId,
    /// Prefix of qualified names declared in the module.
    pub module_name: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            module_kind: ModuleKind::User,
            keep_library_locals: false,
            max_collection_size: DEFAULT_MAX_COLLECTION_SIZE,
            document: DocumentId::default(),
            module_name: "__main__".to_string(),
        }
    }
}

impl AnalysisOptions {
    pub fn with_module_kind(mut self, kind: ModuleKind) -> Self {
        self.module_kind = kind;
        self
    }

    pub fn with_keep_library_locals(mut self, keep: bool) -> Self {
        self.keep_library_locals = keep;
        self
    }

    pub fn with_max_collection_size(mut self, size: usize) -> Self {
        self.max_collection_size = size;
        self
    }

    pub fn with_document(mut self, document: DocumentId) -> Self {
        self.document = document;
        self
    }

    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    /// Whether locals of evaluated functions are discarded.
    pub fn discards_locals(&self) -> bool {
        !self.module_kind.is_user() && !self.keep_library_locals
    }
}
