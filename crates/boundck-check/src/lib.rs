//! Bound checker for boundck
//!
//! Validates a lowered [`Program`]: every written instantiation against the
//! bounds of the class it names, every method body statement by statement.
//! [`check_source`] runs the whole pipeline from manifest text to
//! diagnostics.

pub mod body;
pub mod bounds;
pub mod error;

pub use body::BodyChecker;
pub use bounds::{BoundChecker, BoundSite, TypeScope};
pub use error::CheckError;

use boundck_diagnostics::{Diagnostics, SourceCache};
use boundck_hir::{lower_manifest, Program};
use boundck_manifest::parse_manifest_with_cache;
use boundck_types::ClassTable;
use std::iter;

/// Check the types written in class declarations: bounds, parents and
/// method signatures. Classes with unresolved bounds are skipped.
pub fn check_declarations(table: &ClassTable) -> Vec<CheckError> {
    let checker = BoundChecker::new(table);
    let mut errors = Vec::new();

    for decl in table.iter().filter(|d| d.bounds_resolved) {
        let scope = TypeScope::of_class(decl);
        let bounds = decl
            .type_params
            .iter()
            .filter_map(|p| p.bound.as_ref().map(|b| (b, p.span)));
        let parent = decl.extends.iter().map(|ty| (ty, decl.span));
        let signatures = decl.methods.iter().flat_map(|m| {
            m.param_types()
                .chain(iter::once(&m.return_type))
                .map(move |ty| (ty, m.span))
        });

        for (ty, span) in bounds.chain(parent).chain(signatures) {
            if let Err(err) = checker.check_well_formed(ty, scope, span) {
                errors.push(err);
            }
        }
    }
    errors
}

/// Check declarations, then every body. Methods of a class with unresolved
/// bounds are skipped like its declarations.
pub fn check_program(program: &Program) -> Vec<CheckError> {
    let mut errors = check_declarations(&program.classes);
    for body in &program.bodies {
        let unresolved = body
            .owner
            .class()
            .and_then(|name| program.classes.lookup(name))
            .map_or(false, |decl| !decl.bounds_resolved);
        if unresolved {
            log::debug!("skipping {}: unresolved bounds", body.owner);
            continue;
        }
        log::debug!("checking {}", body.owner);
        errors.extend(BodyChecker::new(&program.classes, body).check());
    }
    errors
}

/// Read, lower and check one manifest. The text is added to `cache` so the
/// returned diagnostics can be rendered against it.
pub fn check_source(source: &str, filename: &str, cache: &mut SourceCache) -> Diagnostics {
    let parsed = match parse_manifest_with_cache(source, filename, cache) {
        Ok(parsed) => parsed,
        Err(err) => return iter::once(err.to_diagnostic()).collect(),
    };

    let lowered = lower_manifest(&parsed.manifest, parsed.file_id);
    let mut diagnostics: Diagnostics = lowered.errors.iter().map(|e| e.to_diagnostic()).collect();

    let errors = check_program(&lowered.program);
    log::info!(
        "{}: {} class(es), {} body(ies), {} check error(s)",
        filename,
        lowered.program.classes.len(),
        lowered.program.bodies.len(),
        errors.len()
    );
    diagnostics.extend(errors.iter().map(CheckError::to_diagnostic));
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use boundck_diagnostics::{Diagnostic, DiagnosticCode};

    const GEN6: &str = include_str!("../../../fixtures/self_bound.toml");

    const SELF_BOUND_CLASSES: &str = r#"
        [[class]]
        name = "A"
        type_params = [{ name = "T", bound = "A" }]
        [[class.method]]
        name = "bar"
        params = [{ name = "x", type = "T" }]
        returns = "T"
        body = [{ return = { var = "x" } }]

        [[class]]
        name = "Z"
        [[class.method]]
        name = "foo"
        returns = "void"
        body = []
    "#;

    fn check(src: &str) -> (Diagnostics, SourceCache) {
        let mut cache = SourceCache::new();
        let diagnostics = check_source(src, "test.toml", &mut cache);
        (diagnostics, cache)
    }

    fn codes(diagnostics: &Diagnostics) -> Vec<DiagnosticCode> {
        diagnostics.iter().map(|d| d.code).collect()
    }

    fn with_function(body: &str) -> String {
        format!(
            "{}\n[[function]]\nname = \"test\"\nreturns = \"void\"\nbody = [\n{}\n]\n",
            SELF_BOUND_CLASSES, body
        )
    }

    #[test]
    fn test_self_bound_fixture_is_rejected_once() {
        let (diagnostics, cache) = check(GEN6);
        assert_eq!(codes(&diagnostics), [DiagnosticCode::ArgumentTypeMismatch]);

        let diag: &Diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diag.message, "argument 1 of `A::bar` expects `A`, found `Z`");
        assert_eq!(cache.source_text(diag.span), Some("\"Z\""));
        assert!(diag.explanation.as_deref().unwrap().contains("declared as `T`"));
    }

    #[test]
    fn test_accepted_fixture_is_clean() {
        let (diagnostics, _) = check(include_str!("../../../fixtures/self_bound_ok.toml"));
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn test_passing_an_instance_of_the_bound_is_accepted() {
        let src = with_function(
            r#"{ let = { name = "x", value = { new = { class = "A" } } } },
               { let = { name = "y", value = { call = { receiver = { var = "x" }, method = "bar", args = [{ var = "x" }] } } } },
               { expr = { call = { receiver = { var = "y" }, method = "bar", args = [{ new = { class = "A" } }] } } },"#,
        );
        let (diagnostics, _) = check(&src);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn test_crtp_subclass_satisfies_self_bound() {
        let src = format!(
            "{}\n{}",
            SELF_BOUND_CLASSES,
            r#"
            [[class]]
            name = "B"
            extends = "A<B>"

            [[function]]
            name = "test"
            body = [
              { let = { name = "b", value = { new = { class = "B" } } } },
              { expr = { call = { receiver = { var = "b" }, method = "bar", args = [{ var = "b" }] } } },
              { expr = { new = { class = "A", type_args = ["B"] } } },
            ]
            "#
        );
        let (diagnostics, _) = check(&src);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn test_bound_violations_in_declarations_and_bodies() {
        let src = format!(
            "{}\n{}",
            SELF_BOUND_CLASSES,
            r#"
            [[class]]
            name = "Bad"
            extends = "A<Z>"

            [[function]]
            name = "test"
            body = [{ expr = { new = { class = "A", type_args = ["Z"] } } }]
            "#
        );
        let (diagnostics, _) = check(&src);
        assert_eq!(
            codes(&diagnostics),
            [DiagnosticCode::BoundViolation, DiagnosticCode::BoundViolation]
        );
    }

    #[test]
    fn test_constructor_inference_checks_bound() {
        let (diagnostics, _) = check(
            r#"
            [[class]]
            name = "A"
            type_params = [{ name = "T", bound = "A" }]
            [[class.method]]
            name = "__construct"
            params = [{ name = "seed", type = "T" }]

            [[class]]
            name = "Z"

            [[function]]
            name = "test"
            body = [{ expr = { new = { class = "A", args = [{ new = { class = "Z" } }] } } }]
            "#,
        );
        assert_eq!(codes(&diagnostics), [DiagnosticCode::BoundViolation]);
        let diag = diagnostics.iter().next().unwrap();
        assert!(diag.explanation.as_deref().unwrap().contains("was inferred"));
    }

    #[test]
    fn test_errors_do_not_cascade() {
        let src = with_function(
            r#"{ let = { name = "y", value = { call = { receiver = { var = "nope" }, method = "bar" } } } },
               { expr = { call = { receiver = { var = "y" }, method = "whatever" } } },"#,
        );
        let (diagnostics, _) = check(&src);
        assert_eq!(codes(&diagnostics), [DiagnosticCode::UnknownVariable]);
    }

    #[test]
    fn test_unresolved_bound_is_reported_once() {
        let (diagnostics, _) = check(
            r#"
            [[class]]
            name = "A"
            type_params = [{ name = "T", bound = "Missing" }]
            [[class.method]]
            name = "get"
            returns = "T"
            [[class.method]]
            name = "m"
            params = [{ name = "x", type = "T" }]
            body = [{ expr = { call = { receiver = { var = "x" }, method = "foo" } } }]

            [[function]]
            name = "test"
            body = [
              { let = { name = "a", value = { new = { class = "A" } } } },
              { expr = { call = { receiver = { var = "a" }, method = "get" } } },
            ]
            "#,
        );
        assert_eq!(codes(&diagnostics), [DiagnosticCode::UnresolvedBound]);
    }

    #[test]
    fn test_return_and_lookup_errors() {
        let src = format!(
            "{}\n{}",
            SELF_BOUND_CLASSES,
            r#"
            [[function]]
            name = "make"
            returns = "Z"
            body = [{ return = { new = { class = "A" } } }]

            [[function]]
            name = "lookup"
            body = [
              { expr = { new = { class = "Nope" } } },
              { expr = { call = { receiver = { new = { class = "Z" } }, method = "bar" } } },
              { expr = { call = { receiver = { int = 1 }, method = "foo" } } },
              { expr = { call = { receiver = { new = { class = "Z" } }, method = "foo", args = [{ int = 1 }] } } },
              { expr = { new = { class = "Z", args = [{ int = 1 }] } } },
              { expr = { new = { class = "A", type_args = ["Z", "Z"] } } },
              { return = { int = 1 } },
            ]
            "#
        );
        let (diagnostics, _) = check(&src);
        assert_eq!(
            codes(&diagnostics),
            [
                DiagnosticCode::ReturnTypeMismatch,
                DiagnosticCode::UnknownClass,
                DiagnosticCode::UnknownMethod,
                DiagnosticCode::InvalidReceiver,
                DiagnosticCode::ArgumentCountMismatch,
                DiagnosticCode::ArgumentCountMismatch,
                DiagnosticCode::ArityError,
                DiagnosticCode::ReturnTypeMismatch,
            ]
        );
        let first = diagnostics.iter().next().unwrap();
        assert_eq!(first.message, "function `make` returns `Z`, found `A<A>`");
    }

    #[test]
    fn test_syntax_error_becomes_diagnostic() {
        let (diagnostics, _) = check("[[class]\nname = ");
        assert_eq!(codes(&diagnostics), [DiagnosticCode::ManifestSyntax]);
    }

    #[test]
    fn test_this_outside_a_class() {
        let (diagnostics, _) = check(
            r#"
            [[function]]
            name = "f"
            body = [{ expr = { call = { receiver = "this", method = "m" } } }]
            "#,
        );
        assert_eq!(codes(&diagnostics), [DiagnosticCode::UnknownVariable]);
    }
}
