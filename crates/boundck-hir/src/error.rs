//! Errors found while lowering declarations.

use boundck_diagnostics::{Diagnostic, DiagnosticCode, Span};
use boundck_manifest::TypeExprError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LowerError {
    #[error("class `{name}` is declared more than once")]
    DuplicateClass { name: String, span: Span, first: Span },

    #[error("`{name}` is a builtin type and cannot be declared as a class")]
    ReservedName { name: String, span: Span },

    #[error("method `{method}` is declared more than once on `{class}`")]
    DuplicateMethod {
        class: String,
        method: String,
        span: Span,
    },

    #[error("malformed type `{text}`: {reason}")]
    MalformedType {
        text: String,
        reason: TypeExprError,
        span: Span,
    },

    #[error("unknown type `{name}`")]
    UnknownType { name: String, span: Span },

    #[error("bound `{bound}` of type parameter `{param}` on `{class}` does not name a known class")]
    UnresolvedBound {
        class: String,
        param: String,
        bound: String,
        span: Span,
    },

    #[error("`{name}` expects {expected} type argument(s), found {found}")]
    TypeArity {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("class `{class}` inherits from itself")]
    CyclicInheritance { class: String, span: Span },

    #[error("`{class}` must extend a class, found `{found}`")]
    InvalidParent {
        class: String,
        found: String,
        span: Span,
    },

    #[error("type parameter `{param}` of `{class}` is never used")]
    UnusedTypeParam {
        class: String,
        param: String,
        span: Span,
    },
}

impl LowerError {
    pub fn span(&self) -> Span {
        match self {
            LowerError::DuplicateClass { span, .. }
            | LowerError::ReservedName { span, .. }
            | LowerError::DuplicateMethod { span, .. }
            | LowerError::MalformedType { span, .. }
            | LowerError::UnknownType { span, .. }
            | LowerError::UnresolvedBound { span, .. }
            | LowerError::TypeArity { span, .. }
            | LowerError::CyclicInheritance { span, .. }
            | LowerError::InvalidParent { span, .. }
            | LowerError::UnusedTypeParam { span, .. } => *span,
        }
    }

    pub fn code(&self) -> DiagnosticCode {
        match self {
            LowerError::DuplicateClass { .. } => DiagnosticCode::DuplicateClass,
            LowerError::ReservedName { .. } => DiagnosticCode::ReservedName,
            LowerError::DuplicateMethod { .. } => DiagnosticCode::DuplicateMethod,
            LowerError::MalformedType { .. } => DiagnosticCode::MalformedType,
            LowerError::UnknownType { .. } => DiagnosticCode::UnknownType,
            LowerError::InvalidParent { .. } => DiagnosticCode::InvalidParent,
            LowerError::UnresolvedBound { .. } => DiagnosticCode::UnresolvedBound,
            LowerError::TypeArity { .. } => DiagnosticCode::ArityError,
            LowerError::CyclicInheritance { .. } => DiagnosticCode::CyclicInheritance,
            LowerError::UnusedTypeParam { .. } => DiagnosticCode::UnusedTypeParam,
        }
    }

    /// Errors stop a program from passing; unused parameters only warn.
    pub fn is_error(&self) -> bool {
        !matches!(self, LowerError::UnusedTypeParam { .. })
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut builder = Diagnostic::new(self.code(), self.to_string()).with_span(self.span());
        match self {
            LowerError::DuplicateClass { first, .. } => {
                builder = builder.with_label(*first, "first declared here");
            }
            LowerError::UnresolvedBound { class, .. } => {
                builder = builder.with_help(format!(
                    "`{}` cannot be instantiated until its bounds resolve",
                    class
                ));
            }
            LowerError::UnusedTypeParam { param, .. } => {
                builder = builder.with_help(format!(
                    "remove `{}` or use it in a signature or the parent type",
                    param
                ));
            }
            _ => {}
        }
        builder.build()
    }
}
