//! Lowering from manifest syntax to the class table and body IR
//!
//! This is the declaration-analysis step: it resolves every type expression
//! against the classes, builtins and type parameters in scope, validates
//! bounds and the inheritance graph, and collects all problems instead of
//! stopping at the first one.

use std::collections::{HashMap, HashSet};

use boundck_diagnostics::{FileId, Span};
use boundck_manifest::{
    parse_type_expr, spanned_to_span, ClassItem, ExprItem, FunctionItem, Manifest, Spanned,
    StmtItem, TypeExpr,
};
use boundck_types::{ClassDecl, ClassTable, MethodSig, Type, TypeParam};

use crate::error::LowerError;
use crate::ir::{Body, BodyOwner, Expr, ExprKind, Program, Stmt};

/// Output of [`lower_manifest`]: the program plus every problem found.
#[derive(Debug, Clone, Default)]
pub struct Lowered {
    pub program: Program,
    pub errors: Vec<LowerError>,
}

impl Lowered {
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(LowerError::is_error)
    }
}

/// Lower a manifest whose text is registered as `file_id`.
pub fn lower_manifest(manifest: &Manifest, file_id: FileId) -> Lowered {
    let mut lowerer = Lowerer {
        file_id,
        errors: Vec::new(),
        arities: HashMap::new(),
    };
    let program = lowerer.lower(manifest);
    Lowered {
        program,
        errors: lowerer.errors,
    }
}

/// Where a type expression appears. Bounds may name a generic class without
/// arguments; every other position must supply all of them.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Position {
    Bound,
    Other,
}

struct Lowerer {
    file_id: FileId,
    errors: Vec<LowerError>,
    /// Class name -> number of type parameters
    arities: HashMap<String, usize>,
}

impl Lowerer {
    fn span<T>(&self, value: &Spanned<T>) -> Span {
        spanned_to_span(value, self.file_id)
    }

    fn lower(&mut self, manifest: &Manifest) -> Program {
        // Pass 1: register class names so declarations may refer to one
        // another (and to themselves) in any order.
        let mut first_seen: HashMap<&str, Span> = HashMap::new();
        let mut accepted: Vec<&ClassItem> = Vec::new();
        for item in &manifest.classes {
            let name = item.name.get_ref().as_str();
            let span = self.span(&item.name);
            if let Some(&first) = first_seen.get(name) {
                self.errors.push(LowerError::DuplicateClass {
                    name: name.to_string(),
                    span,
                    first,
                });
                continue;
            }
            if Type::builtin(name).is_some() {
                self.errors.push(LowerError::ReservedName {
                    name: name.to_string(),
                    span,
                });
                continue;
            }
            first_seen.insert(name, span);
            self.arities.insert(name.to_string(), item.type_params.len());
            accepted.push(item);
        }

        // Pass 2: resolve signatures and lower bodies.
        let mut bodies = Vec::new();
        let mut decls: Vec<ClassDecl> = accepted
            .iter()
            .map(|item| self.lower_class(item, &mut bodies))
            .collect();

        self.break_cycles(&mut decls);
        self.report_unused_params(&decls);

        let mut classes = ClassTable::new();
        for decl in decls {
            if let Err(rejected) = classes.insert(decl) {
                log::warn!("class `{}` registered twice", rejected.name);
            }
        }

        for function in &manifest.functions {
            let sig = MethodSig::new(
                function.name.get_ref().clone(),
                self.lower_params(function, &[]),
                self.lower_return(function, &[]),
            );
            let owner = BodyOwner::Function(sig.name.clone());
            if let Some(body) = self.lower_body(function, &[], owner, &sig) {
                bodies.push(body);
            }
        }

        log::debug!(
            "lowered {} class(es) and {} bod(ies), {} problem(s)",
            classes.len(),
            bodies.len(),
            self.errors.len()
        );

        Program { classes, bodies }
    }

    fn lower_class(&mut self, item: &ClassItem, bodies: &mut Vec<Body>) -> ClassDecl {
        let class_name = item.name.get_ref().clone();
        let scope: Vec<String> = item
            .type_params
            .iter()
            .map(|p| p.name.get_ref().clone())
            .collect();

        let mut decl = ClassDecl::new(class_name.clone());
        decl.span = self.span(&item.name);

        for param in &item.type_params {
            let mut lowered = TypeParam::new(param.name.get_ref().clone(), None);
            lowered.span = self.span(&param.name);
            if let Some(bound) = &param.bound {
                match self.resolve_bound(bound, &scope) {
                    Some(ty) => lowered.bound = Some(ty),
                    None => {
                        decl.bounds_resolved = false;
                        self.errors.push(LowerError::UnresolvedBound {
                            class: class_name.clone(),
                            param: param.name.get_ref().clone(),
                            bound: bound.get_ref().clone(),
                            span: self.span(bound),
                        });
                    }
                }
            }
            decl.type_params.push(lowered);
        }

        if let Some(parent) = &item.extends {
            let span = self.span(parent);
            let ty = self.resolve_type(parent, &scope, Position::Other);
            if ty.class_name().is_some() {
                decl.extends = Some(ty);
            } else if !ty.is_error() {
                self.errors.push(LowerError::InvalidParent {
                    class: class_name.clone(),
                    found: ty.to_string(),
                    span,
                });
            }
        }

        let mut seen_methods = HashSet::new();
        for method in &item.methods {
            let name = method.name.get_ref();
            if !seen_methods.insert(name.as_str()) {
                self.errors.push(LowerError::DuplicateMethod {
                    class: class_name.clone(),
                    method: name.clone(),
                    span: self.span(&method.name),
                });
                continue;
            }

            let mut sig = MethodSig::new(
                name.clone(),
                self.lower_params(method, &scope),
                self.lower_return(method, &scope),
            );
            sig.span = self.span(&method.name);

            let owner = BodyOwner::Method {
                class: class_name.clone(),
                method: name.clone(),
            };
            if let Some(body) = self.lower_body(method, &scope, owner, &sig) {
                bodies.push(body);
            }
            decl.methods.push(sig);
        }

        decl
    }

    fn lower_params(&mut self, item: &FunctionItem, scope: &[String]) -> Vec<(String, Type)> {
        item.params
            .iter()
            .map(|p| {
                (
                    p.name.get_ref().clone(),
                    self.resolve_type(&p.ty, scope, Position::Other),
                )
            })
            .collect()
    }

    fn lower_return(&mut self, item: &FunctionItem, scope: &[String]) -> Type {
        match &item.returns {
            Some(ty) => self.resolve_type(ty, scope, Position::Other),
            None => Type::Void,
        }
    }

    /// Resolve a bound. `None` means it does not name a class.
    fn resolve_bound(&mut self, bound: &Spanned<String>, scope: &[String]) -> Option<Type> {
        let expr = parse_type_expr(bound.get_ref()).ok()?;
        if !self.arities.contains_key(&expr.name) {
            return None;
        }
        // Failures inside the arguments are reported as their own errors;
        // the bound still names a class.
        let span = self.span(bound);
        match self.resolve_expr(&expr, scope, Position::Bound, span) {
            Ok(ty) => Some(ty),
            Err(err) => {
                self.errors.push(err);
                Some(Type::Error)
            }
        }
    }

    /// Resolve a type expression, reporting problems and yielding
    /// [`Type::Error`] in their place.
    fn resolve_type(&mut self, text: &Spanned<String>, scope: &[String], pos: Position) -> Type {
        let span = self.span(text);
        let expr = match parse_type_expr(text.get_ref()) {
            Ok(expr) => expr,
            Err(reason) => {
                self.errors.push(LowerError::MalformedType {
                    text: text.get_ref().clone(),
                    reason,
                    span,
                });
                return Type::Error;
            }
        };
        match self.resolve_expr(&expr, scope, pos, span) {
            Ok(ty) => ty,
            Err(err) => {
                self.errors.push(err);
                Type::Error
            }
        }
    }

    fn resolve_expr(
        &self,
        expr: &TypeExpr,
        scope: &[String],
        pos: Position,
        span: Span,
    ) -> Result<Type, LowerError> {
        let arity_error = |expected: usize| LowerError::TypeArity {
            name: expr.name.clone(),
            expected,
            found: expr.args.len(),
            span,
        };

        if scope.iter().any(|p| *p == expr.name) {
            if !expr.args.is_empty() {
                return Err(arity_error(0));
            }
            return Ok(Type::TypeVar(expr.name.clone()));
        }

        if let Some(builtin) = Type::builtin(&expr.name) {
            if !expr.args.is_empty() {
                return Err(arity_error(0));
            }
            return Ok(builtin);
        }

        let Some(&arity) = self.arities.get(&expr.name) else {
            return Err(LowerError::UnknownType {
                name: expr.name.clone(),
                span,
            });
        };

        let raw_allowed = pos == Position::Bound && expr.args.is_empty();
        if expr.args.len() != arity && !raw_allowed {
            return Err(arity_error(arity));
        }

        let args = expr
            .args
            .iter()
            .map(|arg| self.resolve_expr(arg, scope, Position::Other, span))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Type::class(expr.name.clone(), args))
    }

    /// Report inheritance cycles and cut them by dropping the parent of
    /// every class on a cycle.
    fn break_cycles(&mut self, decls: &mut [ClassDecl]) {
        let parents: HashMap<String, String> = decls
            .iter()
            .filter_map(|d| {
                let parent = d.extends.as_ref()?.class_name()?;
                Some((d.name.clone(), parent.to_string()))
            })
            .collect();

        let mut on_cycle = HashSet::new();
        for decl in decls.iter() {
            let mut current = decl.name.as_str();
            let mut steps = 0;
            while let Some(parent) = parents.get(current) {
                if *parent == decl.name {
                    on_cycle.insert(decl.name.clone());
                    break;
                }
                current = parent.as_str();
                steps += 1;
                if steps > parents.len() {
                    // Cycle elsewhere in the chain; its members report it.
                    break;
                }
            }
        }

        for decl in decls.iter_mut().filter(|d| on_cycle.contains(&d.name)) {
            self.errors.push(LowerError::CyclicInheritance {
                class: decl.name.clone(),
                span: decl.span,
            });
            decl.extends = None;
        }
    }

    fn report_unused_params(&mut self, decls: &[ClassDecl]) {
        for decl in decls {
            for param in &decl.type_params {
                let name = param.name.as_str();
                let in_methods = decl.methods.iter().any(|m| {
                    m.return_type.mentions_var(name) || m.param_types().any(|t| t.mentions_var(name))
                });
                let in_parent = decl.extends.as_ref().map_or(false, |t| t.mentions_var(name));
                let in_bounds = decl
                    .type_params
                    .iter()
                    .filter_map(|p| p.bound.as_ref())
                    .any(|b| b.mentions_var(name));
                if !(in_methods || in_parent || in_bounds) {
                    self.errors.push(LowerError::UnusedTypeParam {
                        class: decl.name.clone(),
                        param: name.to_string(),
                        span: param.span,
                    });
                }
            }
        }
    }

    /// Lower the statements of a function or method whose signature is
    /// already resolved. Items without a body yield nothing.
    fn lower_body(
        &mut self,
        item: &FunctionItem,
        scope: &[String],
        owner: BodyOwner,
        sig: &MethodSig,
    ) -> Option<Body> {
        let stmts = item.body.as_ref()?;
        Some(Body {
            owner,
            params: sig.params.clone(),
            return_type: sig.return_type.clone(),
            stmts: stmts.iter().map(|s| self.lower_stmt(s, scope)).collect(),
            span: self.span(&item.name),
        })
    }

    fn lower_stmt(&mut self, stmt: &StmtItem, scope: &[String]) -> Stmt {
        match stmt {
            StmtItem::Let { name, value } => Stmt::Let {
                name: name.get_ref().clone(),
                value: self.lower_expr(value, scope),
                span: self.span(name),
            },
            StmtItem::Expr(expr) => Stmt::Expr(self.lower_expr(expr, scope)),
            StmtItem::Return(expr) => {
                let expr = self.lower_expr(expr, scope);
                let span = expr.span;
                Stmt::Return(Some(expr), span)
            }
            StmtItem::ReturnVoid(_) => Stmt::Return(None, Span::DUMMY),
        }
    }

    fn lower_expr(&mut self, expr: &ExprItem, scope: &[String]) -> Expr {
        match expr {
            ExprItem::This => Expr::new(ExprKind::This, Span::DUMMY),
            ExprItem::Var(name) => Expr::new(ExprKind::Var(name.get_ref().clone()), self.span(name)),
            ExprItem::Int(v) => Expr::new(ExprKind::Int(*v), Span::DUMMY),
            ExprItem::String(v) => Expr::new(ExprKind::String(v.clone()), Span::DUMMY),
            ExprItem::Bool(v) => Expr::new(ExprKind::Bool(*v), Span::DUMMY),
            ExprItem::New {
                class,
                type_args,
                args,
            } => Expr::new(
                ExprKind::New {
                    class: class.get_ref().clone(),
                    type_args: type_args
                        .iter()
                        .map(|t| self.resolve_type(t, scope, Position::Other))
                        .collect(),
                    args: args.iter().map(|a| self.lower_expr(a, scope)).collect(),
                },
                self.span(class),
            ),
            ExprItem::Call {
                receiver,
                method,
                args,
            } => Expr::new(
                ExprKind::Call {
                    receiver: Box::new(self.lower_expr(receiver, scope)),
                    method: method.get_ref().clone(),
                    args: args.iter().map(|a| self.lower_expr(a, scope)).collect(),
                },
                self.span(method),
            ),
        }
    }
}
