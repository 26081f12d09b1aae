//! High-level IR handed to the checker
//!
//! Declarations live in the [`ClassTable`]; everything that has a body
//! (free functions and methods) becomes a [`Body`] holding an expression
//! tree. Local variable names stay textual: the checker binds them while it
//! walks the statements in order.

use boundck_diagnostics::Span;
use boundck_types::{ClassTable, Type};

/// A lowered manifest.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub classes: ClassTable,
    pub bodies: Vec<Body>,
}

impl Program {
    pub fn body(&self, owner: &BodyOwner) -> Option<&Body> {
        self.bodies.iter().find(|b| &b.owner == owner)
    }

    pub fn function(&self, name: &str) -> Option<&Body> {
        self.body(&BodyOwner::Function(name.to_string()))
    }
}

/// What a body belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyOwner {
    Function(String),
    Method { class: String, method: String },
}

impl BodyOwner {
    /// Class whose type parameters and `this` are in scope.
    pub fn class(&self) -> Option<&str> {
        match self {
            BodyOwner::Function(_) => None,
            BodyOwner::Method { class, .. } => Some(class),
        }
    }
}

impl std::fmt::Display for BodyOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BodyOwner::Function(name) => write!(f, "function `{}`", name),
            BodyOwner::Method { class, method } => write!(f, "method `{}::{}`", class, method),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Body {
    pub owner: BodyOwner,
    pub params: Vec<(String, Type)>,
    pub return_type: Type,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// Bind (or rebind) a local
    Let { name: String, value: Expr, span: Span },
    Expr(Expr),
    /// `None` for a bare `return;`
    Return(Option<Expr>, Span),
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    This,
    Var(String),
    Int(i64),
    String(String),
    Bool(bool),
    /// `new class<type_args>(args)`. Empty `type_args` asks for inference.
    New {
        class: String,
        type_args: Vec<Type>,
        args: Vec<Expr>,
    },
    /// `receiver->method(args)`
    Call {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
}
