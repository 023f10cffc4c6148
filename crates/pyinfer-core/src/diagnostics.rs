//! Diagnostic entries and sinks.
//!
//! Producers build a [`DiagnosticEntry`] and hand it to a [`DiagnosticSink`]
//! together with the document it belongs to. Suppression (inline ignore
//! markers, severity overrides) is the sink's concern; producers never filter.

use std::fmt;

use crate::{DocumentId, Severity, Span};

/// Subsystem that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSource {
    Analysis,
    Linter,
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticEntry {
    /// Human-readable message
    pub message: String,
    /// Location of the problem
    pub span: Span,
    /// Stable identifier of the problem (e.g. `bad-index-type`)
    pub error_code: &'static str,
    /// Issue severity
    pub severity: Severity,
    /// Subsystem that produced it
    pub source: DiagnosticSource,
}

impl fmt::Display for DiagnosticEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "info",
            Severity::Hint => "hint",
        };
        write!(
            f,
            "{}: {}[{}]: {}",
            self.span, severity, self.error_code, self.message
        )
    }
}

/// Receiver of diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, document: &DocumentId, entry: DiagnosticEntry);
}

/// In-memory diagnostic sink.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<(DocumentId, DiagnosticEntry)>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, e)| e.severity == Severity::Error)
    }

    /// All entries, in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticEntry> {
        self.entries.iter().map(|(_, e)| e)
    }

    /// Entries attached to one document.
    pub fn for_document<'a>(
        &'a self,
        document: &'a DocumentId,
    ) -> impl Iterator<Item = &'a DiagnosticEntry> {
        self.entries
            .iter()
            .filter(move |(d, _)| d == document)
            .map(|(_, e)| e)
    }

    /// Entries with a given error code.
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a DiagnosticEntry> {
        self.iter().filter(move |e| e.error_code == code)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, document: &DocumentId, entry: DiagnosticEntry) {
        self.entries.push((document.clone(), entry));
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (document, entry) in &self.entries {
            writeln!(f, "{}:{}", document, entry)?;
        }
        Ok(())
    }
}
