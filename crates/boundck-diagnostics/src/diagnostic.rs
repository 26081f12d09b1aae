//! Diagnostic types for checker errors and warnings.

use crate::span::{Label, Span};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // Manifest errors (M001-M099)
    /// The manifest is not valid TOML or does not match the expected shape
    ManifestSyntax,
    /// A type expression inside the manifest could not be read
    MalformedType,

    // Type errors (T101-T199)
    /// Wrong number of explicit type arguments
    ArityError,
    /// Type argument does not satisfy its declared bound
    BoundViolation,
    /// Call argument incompatible with the substituted parameter type
    ArgumentTypeMismatch,
    /// Wrong number of call arguments
    ArgumentCountMismatch,
    /// Returned value incompatible with the declared return type
    ReturnTypeMismatch,
    /// Method call on a value that is not a class instance
    InvalidReceiver,

    // Resolution errors (R101-R199)
    /// A type parameter bound names an unknown class
    UnresolvedBound,
    /// `new` of an unknown class
    UnknownClass,
    /// A signature mentions an unknown type
    UnknownType,
    /// No method of that name on the receiver or its ancestors
    UnknownMethod,
    /// Reference to an unbound local
    UnknownVariable,

    // Declaration errors (D101-D199)
    DuplicateClass,
    DuplicateMethod,
    CyclicInheritance,
    /// A class is declared with the name of a builtin type
    ReservedName,
    /// `extends` names something other than a class
    InvalidParent,

    // Warnings (W101-W199)
    /// A declared type parameter is never used in the class
    UnusedTypeParam,
}

impl DiagnosticCode {
    pub const ALL: &'static [DiagnosticCode] = &[
        Self::ManifestSyntax,
        Self::MalformedType,
        Self::ArityError,
        Self::BoundViolation,
        Self::ArgumentTypeMismatch,
        Self::ArgumentCountMismatch,
        Self::ReturnTypeMismatch,
        Self::InvalidReceiver,
        Self::UnresolvedBound,
        Self::UnknownClass,
        Self::UnknownType,
        Self::UnknownMethod,
        Self::UnknownVariable,
        Self::DuplicateClass,
        Self::DuplicateMethod,
        Self::CyclicInheritance,
        Self::ReservedName,
        Self::InvalidParent,
        Self::UnusedTypeParam,
    ];

    /// Get the code string (e.g. "T102").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManifestSyntax => "M001",
            Self::MalformedType => "M002",

            Self::ArityError => "T101",
            Self::BoundViolation => "T102",
            Self::ArgumentTypeMismatch => "T103",
            Self::ArgumentCountMismatch => "T104",
            Self::ReturnTypeMismatch => "T105",
            Self::InvalidReceiver => "T106",

            Self::UnresolvedBound => "R101",
            Self::UnknownClass => "R102",
            Self::UnknownType => "R103",
            Self::UnknownMethod => "R104",
            Self::UnknownVariable => "R105",

            Self::DuplicateClass => "D101",
            Self::DuplicateMethod => "D102",
            Self::CyclicInheritance => "D103",
            Self::ReservedName => "D104",
            Self::InvalidParent => "D105",

            Self::UnusedTypeParam => "W101",
        }
    }

    /// Look a code up by its string form, case-insensitively.
    pub fn from_code(code: &str) -> Option<DiagnosticCode> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(code))
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            Self::UnusedTypeParam => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    /// Short, single line message
    pub message: String,
    /// Longer help text
    pub explanation: Option<String>,
    /// Primary span
    pub span: Span,
    pub labels: Vec<Label>,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(code, Severity::Error, message)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(code, Severity::Warning, message)
    }

    /// Create a diagnostic with the code's default severity.
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(code, code.default_severity(), message)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

/// Builder for constructing diagnostics fluently.
pub struct DiagnosticBuilder {
    inner: Diagnostic,
}

impl DiagnosticBuilder {
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            inner: Diagnostic {
                code,
                severity,
                message: message.into(),
                explanation: None,
                span: Span::DUMMY,
                labels: Vec::new(),
            },
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.inner.span = span;
        self
    }

    /// Add a secondary label. Dummy spans are dropped.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        if !span.is_dummy() {
            self.inner.labels.push(Label::new(span, message));
        }
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.explanation = Some(help.into());
        self
    }

    pub fn build(self) -> Diagnostic {
        self.inner
    }
}

/// Collection of diagnostics with summary statistics.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_warning()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in DiagnosticCode::ALL {
            assert!(seen.insert(code.as_str()), "duplicate code {}", code);
        }
    }

    #[test]
    fn test_from_code() {
        assert_eq!(
            DiagnosticCode::from_code("t102"),
            Some(DiagnosticCode::BoundViolation)
        );
        assert_eq!(DiagnosticCode::from_code("X999"), None);
    }

    #[test]
    fn test_counts() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new(DiagnosticCode::BoundViolation, "bad").build());
        diags.push(Diagnostic::new(DiagnosticCode::UnusedTypeParam, "unused").build());

        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_dummy_labels_are_dropped() {
        let diag = Diagnostic::error(DiagnosticCode::UnknownMethod, "no method")
            .with_label(Span::DUMMY, "nowhere")
            .build();
        assert!(diag.labels.is_empty());
    }
}
