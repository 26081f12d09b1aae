//! Type system for boundck
//!
//! Defines the type references that flow from declaration analysis through
//! the bound checker, the immutable class table they are resolved against,
//! and substitution of type arguments into signatures.

pub mod class;
pub mod subst;

pub use class::{Ancestor, ClassDecl, ClassId, ClassTable, MethodSig, CONSTRUCTOR};
pub use subst::Substitution;

use boundck_diagnostics::Span;
use std::fmt;

/// Names reserved for builtin types.
pub const BUILTIN_NAMES: &[&str] = &["void", "int", "bool", "string", "mixed"];

/// Core type representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// No value (return type only)
    Void,
    Int,
    Bool,
    String,
    /// Top type: every type is a subtype of `mixed`
    Mixed,
    /// Result of a failed check. Absorbs further checks without reporting.
    Error,
    /// Reference to a class by name, without type arguments
    Named(String),
    /// Reference to a type parameter in scope (e.g. `T` in `class A<T>`)
    TypeVar(String),
    /// Generic class instantiation (e.g. `A<Z>`)
    Generic {
        /// Class name
        base: String,
        /// Concrete type arguments, never empty
        type_args: Vec<Type>,
    },
}

impl Type {
    /// Build a class type, using `Named` when there are no arguments.
    pub fn class(name: impl Into<String>, type_args: Vec<Type>) -> Type {
        let base = name.into();
        if type_args.is_empty() {
            Type::Named(base)
        } else {
            Type::Generic { base, type_args }
        }
    }

    /// Builtin type for a reserved name.
    pub fn builtin(name: &str) -> Option<Type> {
        match name {
            "void" => Some(Type::Void),
            "int" => Some(Type::Int),
            "bool" => Some(Type::Bool),
            "string" => Some(Type::String),
            "mixed" => Some(Type::Mixed),
            _ => None,
        }
    }

    /// Class name for `Named` and `Generic` types.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Type::Named(name) => Some(name),
            Type::Generic { base, .. } => Some(base),
            _ => None,
        }
    }

    /// Type arguments of a class type (empty for anything else).
    pub fn type_args(&self) -> &[Type] {
        match self {
            Type::Generic { type_args, .. } => type_args,
            _ => &[],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    /// True if the poisoned type occurs anywhere inside this type.
    pub fn contains_error(&self) -> bool {
        match self {
            Type::Error => true,
            Type::Generic { type_args, .. } => type_args.iter().any(Type::contains_error),
            _ => false,
        }
    }

    /// True if `name` occurs as a type variable anywhere inside this type.
    pub fn mentions_var(&self, name: &str) -> bool {
        match self {
            Type::TypeVar(v) => v == name,
            Type::Generic { type_args, .. } => type_args.iter().any(|t| t.mentions_var(name)),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Int => f.write_str("int"),
            Type::Bool => f.write_str("bool"),
            Type::String => f.write_str("string"),
            Type::Mixed => f.write_str("mixed"),
            Type::Error => f.write_str("_"),
            Type::Named(name) | Type::TypeVar(name) => f.write_str(name),
            Type::Generic { base, type_args } => {
                write!(f, "{}<", base)?;
                for (i, arg) in type_args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
        }
    }
}

/// Type parameter of a generic class.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    /// Name of the type parameter (e.g. "T")
    pub name: String,
    /// Upper bound (`T as A`). Stored as a reference by class name and
    /// resolved through the [`ClassTable`], so a class may bound its own
    /// parameter by itself.
    pub bound: Option<Type>,
    pub span: Span,
}

impl TypeParam {
    pub fn new(name: impl Into<String>, bound: Option<Type>) -> Self {
        Self {
            name: name.into(),
            bound,
            span: Span::DUMMY,
        }
    }

    /// True when the bound names `class` itself (`class A<T as A>`).
    pub fn is_self_bound(&self, class: &str) -> bool {
        self.bound
            .as_ref()
            .and_then(Type::class_name)
            .map_or(false, |name| name == class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_constructor_normalizes() {
        assert_eq!(Type::class("A", vec![]), Type::Named("A".to_string()));
        assert_eq!(
            Type::class("A", vec![Type::Int]),
            Type::Generic {
                base: "A".to_string(),
                type_args: vec![Type::Int]
            }
        );
    }

    #[test]
    fn test_display() {
        let ty = Type::class(
            "Map",
            vec![Type::String, Type::class("A", vec![Type::Named("A".into())])],
        );
        assert_eq!(ty.to_string(), "Map<string, A<A>>");
        assert_eq!(Type::TypeVar("T".into()).to_string(), "T");
        assert_eq!(Type::Error.to_string(), "_");
    }

    #[test]
    fn test_self_bound() {
        let param = TypeParam::new("T", Some(Type::Named("A".into())));
        assert!(param.is_self_bound("A"));
        assert!(!param.is_self_bound("Z"));
        assert!(!TypeParam::new("T", None).is_self_bound("A"));
    }

    #[test]
    fn test_builtin_names_round_trip() {
        for name in BUILTIN_NAMES {
            let ty = Type::builtin(name).unwrap();
            assert_eq!(ty.to_string(), *name);
        }
        assert_eq!(Type::builtin("A"), None);
    }

    #[test]
    fn test_contains_error_and_mentions_var() {
        let ty = Type::class("A", vec![Type::TypeVar("T".into())]);
        assert!(ty.mentions_var("T"));
        assert!(!ty.mentions_var("U"));
        assert!(!ty.contains_error());
        assert!(Type::class("A", vec![Type::Error]).contains_error());
    }
}
