//! Walks function and method bodies, typing each expression.
//!
//! Expressions are typed in evaluation order: a call's receiver first,
//! then its arguments, then the call itself. A failed check is reported
//! once and the expression gets [`Type::Error`], which every later check
//! accepts, so one mistake does not cascade down a chain of calls.

use crate::bounds::{BoundChecker, TypeScope};
use crate::error::CheckError;
use boundck_diagnostics::Span;
use boundck_hir::{Body, BodyOwner, Expr, ExprKind, Stmt};
use boundck_types::{ClassDecl, ClassTable, Type, CONSTRUCTOR};
use std::collections::HashMap;

pub struct BodyChecker<'a> {
    bounds: BoundChecker<'a>,
    body: &'a Body,
    scope: TypeScope<'a>,
    this: Option<Type>,
    locals: HashMap<String, Type>,
    errors: Vec<CheckError>,
}

impl<'a> BodyChecker<'a> {
    pub fn new(table: &'a ClassTable, body: &'a Body) -> Self {
        let class = body.owner.class().and_then(|name| table.lookup(name));
        Self {
            bounds: BoundChecker::new(table),
            body,
            scope: class.map(TypeScope::of_class).unwrap_or_default(),
            this: class.map(ClassDecl::self_type),
            locals: body.params.iter().cloned().collect(),
            errors: Vec::new(),
        }
    }

    /// Check every statement and return what went wrong, in source order.
    pub fn check(mut self) -> Vec<CheckError> {
        // Method signatures are checked with their class; free functions
        // have nowhere else to be checked.
        let body = self.body;
        if let BodyOwner::Function(_) = body.owner {
            let signature = body
                .params
                .iter()
                .map(|(_, ty)| ty)
                .chain(std::iter::once(&body.return_type));
            for ty in signature {
                if let Err(err) = self.bounds.check_well_formed(ty, self.scope, body.span) {
                    self.errors.push(err);
                }
            }
        }

        for stmt in &body.stmts {
            self.check_stmt(stmt);
        }
        self.errors
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let { name, value, .. } => {
                let ty = self.expr_type(value);
                log::trace!("{}: ${} = {}", self.body.owner, name, ty);
                self.locals.insert(name.clone(), ty);
            }
            Stmt::Expr(expr) => {
                self.expr_type(expr);
            }
            Stmt::Return(value, span) => {
                let fallback = if span.is_dummy() { self.body.span } else { *span };
                let (found, span) = match value {
                    Some(expr) => (self.expr_type(expr), or_span(expr.span, fallback)),
                    None => (Type::Void, fallback),
                };
                let body = self.body;
                let expected = &body.return_type;
                if !self.bounds.is_subtype(&found, expected, self.scope) {
                    self.errors.push(CheckError::ReturnTypeMismatch {
                        owner: body.owner.to_string(),
                        expected: expected.clone(),
                        found,
                        span,
                    });
                }
            }
        }
    }

    fn expr_type(&mut self, expr: &Expr) -> Type {
        let span = or_span(expr.span, self.body.span);
        match &expr.kind {
            ExprKind::This => match &self.this {
                Some(ty) => ty.clone(),
                None => self.fail(CheckError::UnknownVariable {
                    name: "this".to_string(),
                    span,
                }),
            },
            ExprKind::Var(name) => match self.locals.get(name) {
                Some(ty) => ty.clone(),
                None => self.fail(CheckError::UnknownVariable {
                    name: name.clone(),
                    span,
                }),
            },
            ExprKind::Int(_) => Type::Int,
            ExprKind::String(_) => Type::String,
            ExprKind::Bool(_) => Type::Bool,
            ExprKind::New {
                class,
                type_args,
                args,
            } => {
                let args = self.arg_types(args, span);
                self.new_instance(class, type_args, &args, span)
            }
            ExprKind::Call {
                receiver,
                method,
                args,
            } => {
                let receiver = self.expr_type(receiver);
                let args = self.arg_types(args, span);
                match self
                    .bounds
                    .resolve_method_call(&receiver, method, &args, self.scope, span)
                {
                    Ok(ty) => ty,
                    Err(err) => self.fail(err),
                }
            }
        }
    }

    fn arg_types(&mut self, args: &[Expr], call_span: Span) -> Vec<(Type, Span)> {
        args.iter()
            .map(|arg| (self.expr_type(arg), or_span(arg.span, call_span)))
            .collect()
    }

    fn new_instance(
        &mut self,
        class: &str,
        type_args: &[Type],
        args: &[(Type, Span)],
        span: Span,
    ) -> Type {
        let table = self.bounds.table();
        let Some(decl) = table.lookup(class) else {
            return self.fail(CheckError::UnknownClass {
                name: class.to_string(),
                span,
            });
        };

        for ty in type_args {
            if let Err(err) = self.bounds.check_well_formed(ty, self.scope, span) {
                return self.fail(err);
            }
        }

        let ctor_args: Vec<Type> = args.iter().map(|(ty, _)| ty.clone()).collect();
        let instance = match self
            .bounds
            .instantiate(decl, type_args, &ctor_args, self.scope, span)
        {
            Ok(ty) if ty.is_error() => return ty,
            Ok(ty) => ty,
            Err(err) => return self.fail(err),
        };

        let has_ctor = table
            .find_method(class, instance.type_args(), CONSTRUCTOR)
            .is_some();
        let ctor = if has_ctor {
            self.bounds
                .resolve_method_call(&instance, CONSTRUCTOR, args, self.scope, span)
                .map(|_| ())
        } else if args.is_empty() {
            Ok(())
        } else {
            Err(CheckError::ArgumentCountMismatch {
                method: format!("{}::{}", class, CONSTRUCTOR),
                expected: 0,
                found: args.len(),
                span,
            })
        };

        match ctor {
            Ok(()) => instance,
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: CheckError) -> Type {
        log::debug!("{}: {}", self.body.owner, err);
        self.errors.push(err);
        Type::Error
    }
}

fn or_span(span: Span, fallback: Span) -> Span {
    if span.is_dummy() {
        fallback
    } else {
        span
    }
}
