//! Explain command - explain diagnostic codes

use anyhow::{anyhow, Result};
use boundck_diagnostics::DiagnosticCode;
use clap::Args;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Diagnostic code to explain (e.g., T102, R101)
    pub code: String,
}

struct Explanation {
    code: DiagnosticCode,
    title: &'static str,
    description: &'static str,
    example: Option<&'static str>,
    suggestion: Option<&'static str>,
    related: &'static [&'static str],
}

const EXPLANATIONS: &[Explanation] = &[
    // Manifest errors
    Explanation {
        code: DiagnosticCode::ManifestSyntax,
        title: "Manifest Syntax Error",
        description: "The manifest is not valid TOML, or a table does not have the shape a class, method, function or statement needs.",
        example: Some("[[class]\nname = \"A\"  # unclosed table header"),
        suggestion: Some("Fix the TOML at the reported position. Statements and expressions are inline tables with exactly one key."),
        related: &["M002"],
    },
    Explanation {
        code: DiagnosticCode::MalformedType,
        title: "Malformed Type",
        description: "A type string could not be read. Types are a name optionally followed by type arguments in angle brackets.",
        example: Some("returns = \"Box<\""),
        suggestion: Some("Close the argument list: returns = \"Box<int>\""),
        related: &["M001", "R103"],
    },
    // Type errors
    Explanation {
        code: DiagnosticCode::ArityError,
        title: "Wrong Number of Type Arguments",
        description: "A generic class was given a different number of type arguments than it declares. Outside of bounds, a generic class must always be written with all of its arguments.",
        example: Some("class Box<T> { ... }\nfunction f(Box $b)  // Box needs one argument"),
        suggestion: Some("Write every argument (Box<int>), or leave them all out on `new` to have them inferred."),
        related: &["T102"],
    },
    Explanation {
        code: DiagnosticCode::BoundViolation,
        title: "Bound Violation",
        description: r#"A type argument does not satisfy the bound of the parameter it is given for.

With `class A<T as A>`, every argument for T must be A itself or a class that
extends A. When no arguments are written, T is inferred; an inferred argument
is checked the same way."#,
        example: Some("class A<T as A> { ... }\nclass Z { ... }\nnew A<Z>()  // Z is not an A"),
        suggestion: Some("Pass a subclass of the bound, for example `class B extends A<B>` and then `new A<B>()`."),
        related: &["T101", "T103", "R101"],
    },
    Explanation {
        code: DiagnosticCode::ArgumentTypeMismatch,
        title: "Argument Type Mismatch",
        description: r#"An argument is not a subtype of the parameter it is passed to.

Parameter types are taken from the method's declaration with the receiver's
type arguments substituted. On a receiver of type A<A>, a parameter declared
as T expects an A."#,
        example: Some("class A<T as A> { bar(T $x): T }\n$x = new A();       // A<A>\n$x->bar(new Z());   // expects A, found Z"),
        suggestion: Some("Pass a value whose class is, or extends, the expected class."),
        related: &["T102", "T104"],
    },
    Explanation {
        code: DiagnosticCode::ArgumentCountMismatch,
        title: "Argument Count Mismatch",
        description: "A method, or a constructor through `new`, was called with a different number of arguments than it declares.",
        example: Some("class Z { foo(): void }\n$z->foo(1);"),
        suggestion: None,
        related: &["T103"],
    },
    Explanation {
        code: DiagnosticCode::ReturnTypeMismatch,
        title: "Return Type Mismatch",
        description: "A returned value is not a subtype of the declared return type, a void body returns a value, or a non-void body has a bare `return`.",
        example: Some("function make(): Z { return new A(); }"),
        suggestion: None,
        related: &["T103"],
    },
    Explanation {
        code: DiagnosticCode::InvalidReceiver,
        title: "Invalid Receiver",
        description: "A method was called on a value that is not a class instance: a builtin type, or a type parameter with no bound.",
        example: Some("$n = 1;\n$n->foo();"),
        suggestion: Some("Give the type parameter a bound if its methods are needed."),
        related: &["R104"],
    },
    // Resolution errors
    Explanation {
        code: DiagnosticCode::UnresolvedBound,
        title: "Unresolved Bound",
        description: r#"A type parameter's bound does not name a declared class. Bounds must be
classes; builtin types and other type parameters are not allowed.

The class cannot be instantiated. Uses of it are not checked further, so this
is the only error reported for them."#,
        example: Some("class A<T as Missing> { ... }"),
        suggestion: Some("Declare the bound class or fix its name."),
        related: &["T102", "R103"],
    },
    Explanation {
        code: DiagnosticCode::UnknownClass,
        title: "Unknown Class",
        description: "`new` names a class that is not declared in the manifest.",
        example: Some("new Nope()"),
        suggestion: None,
        related: &["R103"],
    },
    Explanation {
        code: DiagnosticCode::UnknownType,
        title: "Unknown Type",
        description: "A type in a signature or parent does not name a builtin, a type parameter in scope, or a declared class.",
        example: Some("params = [{ name = \"x\", type = \"Nope\" }]"),
        suggestion: None,
        related: &["R102", "M002"],
    },
    Explanation {
        code: DiagnosticCode::UnknownMethod,
        title: "Unknown Method",
        description: "Neither the receiver's class nor any of its ancestors declares the called method.",
        example: Some("(new Z())->bar()"),
        suggestion: None,
        related: &["T106"],
    },
    Explanation {
        code: DiagnosticCode::UnknownVariable,
        title: "Unknown Variable",
        description: "A variable is used before it is bound by a parameter or `let`, or `this` is used outside a method.",
        example: Some("{ expr = { call = { receiver = { var = \"nope\" }, method = \"foo\" } } }"),
        suggestion: Some("Bind the variable with `let` first."),
        related: &[],
    },
    // Declaration errors
    Explanation {
        code: DiagnosticCode::DuplicateClass,
        title: "Duplicate Class",
        description: "A class name is declared twice. The first declaration is kept.",
        example: None,
        suggestion: None,
        related: &["D102", "D104"],
    },
    Explanation {
        code: DiagnosticCode::DuplicateMethod,
        title: "Duplicate Method",
        description: "A class declares two methods with the same name. The first is kept.",
        example: None,
        suggestion: None,
        related: &["D101"],
    },
    Explanation {
        code: DiagnosticCode::CyclicInheritance,
        title: "Cyclic Inheritance",
        description: "A class extends itself, directly or through other classes. The parent of every class on the cycle is dropped so checking can continue.",
        example: Some("class P extends Q {}\nclass Q extends P {}"),
        suggestion: None,
        related: &["D105"],
    },
    Explanation {
        code: DiagnosticCode::ReservedName,
        title: "Reserved Name",
        description: "A class uses the name of a builtin type (void, int, bool, string or mixed). The class is not declared.",
        example: Some("[[class]]\nname = \"int\""),
        suggestion: Some("Rename the class."),
        related: &["D101"],
    },
    Explanation {
        code: DiagnosticCode::InvalidParent,
        title: "Invalid Parent",
        description: "`extends` names a builtin type or a type parameter instead of a class. The class is kept without a parent.",
        example: Some("class Box<T> extends T {}"),
        suggestion: Some("Extend a declared class, with all of its type arguments."),
        related: &["D103", "R103"],
    },
    // Warnings
    Explanation {
        code: DiagnosticCode::UnusedTypeParam,
        title: "Unused Type Parameter",
        description: "A type parameter appears in no method signature, parent type or bound of its class.",
        example: Some("class Phantom<T> {}"),
        suggestion: Some("Remove the parameter, or run with --strict to treat this as an error."),
        related: &[],
    },
];

fn lookup(code: &str) -> Result<&'static Explanation> {
    let code = DiagnosticCode::from_code(code)
        .ok_or_else(|| anyhow!("Unknown diagnostic code: {}", code.to_uppercase()))?;
    EXPLANATIONS
        .iter()
        .find(|e| e.code == code)
        .ok_or_else(|| anyhow!("No explanation for {}", code))
}

pub fn run(args: ExplainArgs, format: OutputFormat, use_color: bool) -> Result<()> {
    let explanation = lookup(&args.code)?;
    let code = explanation.code.as_str();

    match format {
        OutputFormat::Text | OutputFormat::Short => {
            if use_color {
                println!(
                    "\n{}: {}\n{}",
                    console::style(code).bold().cyan(),
                    console::style(explanation.title).bold(),
                    "=".repeat(code.len() + explanation.title.len() + 2)
                );
            } else {
                println!(
                    "\n{}: {}\n{}",
                    code,
                    explanation.title,
                    "=".repeat(code.len() + explanation.title.len() + 2)
                );
            }

            println!("\n{}\n", explanation.description);

            if format == OutputFormat::Short {
                return Ok(());
            }

            if let Some(example) = explanation.example {
                if use_color {
                    println!("{}:", console::style("Example").bold());
                } else {
                    println!("Example:");
                }
                for line in example.lines() {
                    println!("  {}", line);
                }
                println!();
            }

            if let Some(suggestion) = explanation.suggestion {
                if use_color {
                    println!("{}:", console::style("Suggestion").bold().green());
                } else {
                    println!("Suggestion:");
                }
                for line in suggestion.lines() {
                    println!("  {}", line);
                }
                println!();
            }

            if !explanation.related.is_empty() {
                if use_color {
                    println!(
                        "{}: {}",
                        console::style("Related").dim(),
                        explanation.related.join(", ")
                    );
                } else {
                    println!("Related: {}", explanation.related.join(", "));
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "code": code,
                "severity": explanation.code.default_severity().as_str(),
                "title": explanation.title,
                "description": explanation.description,
                "example": explanation.example,
                "suggestion": explanation.suggestion,
                "related": explanation.related,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_is_explained() {
        for code in DiagnosticCode::ALL {
            assert!(lookup(code.as_str()).is_ok(), "no explanation for {}", code);
        }
    }

    #[test]
    fn test_related_codes_exist() {
        for explanation in EXPLANATIONS {
            for related in explanation.related {
                assert!(
                    DiagnosticCode::from_code(related).is_some(),
                    "{} refers to unknown {}",
                    explanation.code,
                    related
                );
            }
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("t102").unwrap().code, DiagnosticCode::BoundViolation);
        assert!(lookup("X999").is_err());
    }
}
