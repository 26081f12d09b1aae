//! Errors reported at call sites and in bodies.

use boundck_diagnostics::{Diagnostic, DiagnosticCode, Span};
use boundck_types::Type;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckError {
    #[error("`{class}` expects {expected} type argument(s), found {found}")]
    ArityError {
        class: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("type argument `{candidate}` for `{class}::{param}` does not satisfy bound `{bound}`")]
    BoundViolation {
        class: String,
        param: String,
        candidate: Type,
        bound: Type,
        /// The argument was inferred rather than written out
        inferred: bool,
        span: Span,
    },

    #[error("argument {position} of `{method}` expects `{expected}`, found `{found}`")]
    ArgumentTypeMismatch {
        method: String,
        /// 1-indexed
        position: usize,
        param: String,
        expected: Type,
        /// Parameter type before the receiver's arguments were substituted
        declared: Type,
        found: Type,
        span: Span,
    },

    #[error("`{method}` takes {expected} argument(s), {found} given")]
    ArgumentCountMismatch {
        method: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("{owner} returns `{expected}`, found `{found}`")]
    ReturnTypeMismatch {
        owner: String,
        expected: Type,
        found: Type,
        span: Span,
    },

    #[error("cannot call `{method}` on a value of type `{receiver}`")]
    InvalidReceiver {
        receiver: Type,
        method: String,
        span: Span,
    },

    #[error("unknown class `{name}`")]
    UnknownClass { name: String, span: Span },

    #[error("no method `{method}` on `{receiver}`")]
    UnknownMethod {
        receiver: Type,
        method: String,
        span: Span,
    },

    #[error("unknown variable `{name}`")]
    UnknownVariable { name: String, span: Span },
}

impl CheckError {
    pub fn span(&self) -> Span {
        match self {
            CheckError::ArityError { span, .. }
            | CheckError::BoundViolation { span, .. }
            | CheckError::ArgumentTypeMismatch { span, .. }
            | CheckError::ArgumentCountMismatch { span, .. }
            | CheckError::ReturnTypeMismatch { span, .. }
            | CheckError::InvalidReceiver { span, .. }
            | CheckError::UnknownClass { span, .. }
            | CheckError::UnknownMethod { span, .. }
            | CheckError::UnknownVariable { span, .. } => *span,
        }
    }

    pub fn code(&self) -> DiagnosticCode {
        match self {
            CheckError::ArityError { .. } => DiagnosticCode::ArityError,
            CheckError::BoundViolation { .. } => DiagnosticCode::BoundViolation,
            CheckError::ArgumentTypeMismatch { .. } => DiagnosticCode::ArgumentTypeMismatch,
            CheckError::ArgumentCountMismatch { .. } => DiagnosticCode::ArgumentCountMismatch,
            CheckError::ReturnTypeMismatch { .. } => DiagnosticCode::ReturnTypeMismatch,
            CheckError::InvalidReceiver { .. } => DiagnosticCode::InvalidReceiver,
            CheckError::UnknownClass { .. } => DiagnosticCode::UnknownClass,
            CheckError::UnknownMethod { .. } => DiagnosticCode::UnknownMethod,
            CheckError::UnknownVariable { .. } => DiagnosticCode::UnknownVariable,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let builder = Diagnostic::new(self.code(), self.to_string()).with_span(self.span());
        let builder = match self {
            CheckError::BoundViolation {
                param,
                bound,
                inferred: true,
                ..
            } => builder.with_help(format!(
                "`{}` was inferred; write the type arguments explicitly with a subtype of `{}`",
                param, bound
            )),
            CheckError::BoundViolation { param, bound, .. } => builder.with_help(format!(
                "`{}` must be `{}` or a subclass of it",
                param, bound
            )),
            CheckError::ArgumentTypeMismatch {
                param,
                expected,
                declared,
                ..
            } if declared != expected => builder.with_help(format!(
                "parameter `{}` is declared as `{}`, which is `{}` for this receiver",
                param, declared, expected
            )),
            _ => builder,
        };
        builder.build()
    }
}
