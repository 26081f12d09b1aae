//! Declaration manifest reader
//!
//! A manifest is a TOML file describing classes (type parameters, bounds,
//! parent, method signatures and bodies) and free functions whose bodies
//! are small expression trees. This crate deserializes it into
//! [`ast::Manifest`], registering the text in a [`SourceCache`] so later
//! diagnostics can point into it.

pub mod ast;
pub mod type_expr;

pub use ast::{ClassItem, ExprItem, FunctionItem, Manifest, ParamItem, StmtItem, TypeParamItem};
pub use toml::Spanned;
pub use type_expr::{parse_type_expr, TypeExpr, TypeExprError};

use boundck_diagnostics::{Diagnostic, DiagnosticCode, FileId, SourceCache, Span};
use thiserror::Error;

/// Result of reading a manifest.
#[derive(Debug)]
pub struct ParseResult {
    pub manifest: Manifest,
    /// The file ID in the source cache
    pub file_id: FileId,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("{message}")]
    Syntax { message: String, span: Span },
}

impl ManifestError {
    pub fn span(&self) -> Span {
        match self {
            ManifestError::Syntax { span, .. } => *span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(DiagnosticCode::ManifestSyntax, self.to_string())
            .with_span(self.span())
            .build()
    }
}

/// Read a manifest, adding its text to the source cache.
pub fn parse_manifest_with_cache(
    source: &str,
    filename: &str,
    cache: &mut SourceCache,
) -> Result<ParseResult, ManifestError> {
    let file_id = cache.add_file(filename, source.to_string());

    let manifest: Manifest = toml::from_str(source).map_err(|e| {
        let span = e
            .span()
            .map(|range| Span::from_range(file_id, range))
            .unwrap_or(Span::DUMMY);
        ManifestError::Syntax {
            message: e.message().trim_end().to_string(),
            span,
        }
    })?;

    log::debug!(
        "read manifest {}: {} class(es), {} function(s)",
        filename,
        manifest.classes.len(),
        manifest.functions.len()
    );

    Ok(ParseResult { manifest, file_id })
}

/// Read a manifest without a source cache. Spans in the result refer to a
/// dummy file.
pub fn parse_manifest(source: &str) -> Result<Manifest, ManifestError> {
    toml::from_str(source).map_err(|e| ManifestError::Syntax {
        message: e.message().trim_end().to_string(),
        span: Span::DUMMY,
    })
}

/// Convert a deserializer byte range into a span of `file_id`.
pub fn spanned_to_span<T>(value: &toml::Spanned<T>, file_id: FileId) -> Span {
    Span::from_range(file_id, value.span())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEN6: &str = include_str!("../../../fixtures/self_bound.toml");

    #[test]
    fn test_parse_fixture() {
        let manifest = parse_manifest(GEN6).unwrap();
        let names: Vec<_> = manifest.classes.iter().map(|c| c.name.get_ref().as_str()).collect();
        assert_eq!(names, ["A", "Z"]);

        let a = &manifest.classes[0];
        assert_eq!(a.type_params.len(), 1);
        assert_eq!(a.type_params[0].bound.as_ref().unwrap().get_ref(), "A");
        assert_eq!(a.methods[0].name.get_ref(), "bar");

        let test = &manifest.functions[0];
        assert_eq!(test.name.get_ref(), "test");
        let body = test.body.as_ref().unwrap();
        assert!(matches!(body[0], StmtItem::Let { .. }));
        match &body[1] {
            StmtItem::Expr(ExprItem::Call { method, receiver, .. }) => {
                assert_eq!(method.get_ref(), "foo");
                assert!(matches!(**receiver, ExprItem::Call { .. }));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_spans_point_into_source() {
        let mut cache = SourceCache::new();
        let result = parse_manifest_with_cache(GEN6, "gen6.toml", &mut cache).unwrap();
        let class = &result.manifest.classes[1];
        let span = spanned_to_span(&class.name, result.file_id);
        assert_eq!(cache.source_text(span), Some("\"Z\""));
    }

    #[test]
    fn test_this_receiver() {
        let manifest = parse_manifest(
            r#"
            [[function]]
            name = "f"
            body = [{ expr = { call = { receiver = "this", method = "m" } } }]
            "#,
        )
        .unwrap();
        let body = manifest.functions[0].body.as_ref().unwrap();
        match &body[0] {
            StmtItem::Expr(ExprItem::Call { receiver, args, .. }) => {
                assert!(matches!(**receiver, ExprItem::This));
                assert!(args.is_empty());
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_statement_forms() {
        let manifest = parse_manifest(
            r#"
            [[function]]
            name = "f"
            body = [
              { let = { name = "x", value = { new = { class = "A", type_args = ["Z"] } } } },
              { expr = { call = { receiver = "this", method = "m", args = [{ int = 1 }, { string = "s" }, { bool = true }] } } },
              { return = { var = "x" } },
              { return_void = true },
            ]
            "#,
        )
        .unwrap();
        let body = manifest.functions[0].body.as_ref().unwrap();
        match &body[0] {
            StmtItem::Let { name, value } => {
                assert_eq!(name.get_ref(), "x");
                assert!(matches!(value, ExprItem::New { type_args, .. } if type_args.len() == 1));
            }
            other => panic!("unexpected statement {:?}", other),
        }
        assert!(matches!(body[2], StmtItem::Return(ExprItem::Var(_))));
        assert!(matches!(body[3], StmtItem::ReturnVoid(true)));

        // a statement table has exactly one key
        assert!(parse_manifest(
            "[[function]]\nname = \"f\"\nbody = [{ let = \"x\", value = { int = 1 } }]\n"
        )
        .is_err());
    }

    #[test]
    fn test_syntax_error_has_span() {
        let mut cache = SourceCache::new();
        let err = parse_manifest_with_cache("[[class]]\nname = \n", "bad.toml", &mut cache)
            .unwrap_err();
        assert!(!err.span().is_dummy());
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, DiagnosticCode::ManifestSyntax);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = parse_manifest("[[class]]\nname = \"A\"\nparent = \"B\"\n").unwrap_err();
        assert!(err.to_string().contains("parent"));
    }
}
