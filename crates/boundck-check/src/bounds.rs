//! Instantiation, bound satisfaction and method resolution
//!
//! Everything here reads the [`ClassTable`] and never mutates it. Bounds
//! are stored by class name, so a class whose parameter is bounded by the
//! class itself (`class A<T as A>`) needs no special construction: the
//! bound is looked up in the table like any other class reference.
//!
//! A bare generic class in a bound (`T as A` where `A` has parameters) is
//! a class-level bound: any instantiation of `A`, or of a subclass,
//! satisfies it. Everywhere else type arguments are compared invariantly.

use crate::error::CheckError;
use boundck_diagnostics::Span;
use boundck_types::{ClassDecl, ClassTable, Substitution, Type, TypeParam, CONSTRUCTOR};
use std::collections::HashMap;

/// Type parameters visible at the point a type is checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScope<'a> {
    params: &'a [TypeParam],
}

impl<'a> TypeScope<'a> {
    pub fn new(params: &'a [TypeParam]) -> Self {
        Self { params }
    }

    /// The parameters of `decl`, as seen from its own signatures and bodies.
    pub fn of_class(decl: &'a ClassDecl) -> Self {
        Self::new(&decl.type_params)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }

    /// Upper bound of a type variable in scope, if it has one.
    pub fn bound_of(&self, name: &str) -> Option<&'a Type> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.bound.as_ref())
    }
}

/// Where a bound is being checked, for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct BoundSite<'s> {
    pub class: &'s str,
    pub param: &'s str,
    /// The candidate came from inference, not from the source
    pub inferred: bool,
    pub span: Span,
}

/// Checks types against a class table.
#[derive(Debug, Clone, Copy)]
pub struct BoundChecker<'a> {
    table: &'a ClassTable,
}

impl<'a> BoundChecker<'a> {
    pub fn new(table: &'a ClassTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'a ClassTable {
        self.table
    }

    /// Build a concrete instance of `decl`.
    ///
    /// With explicit `provided` arguments, their count must match the
    /// class's parameters and each must satisfy its bound (with the other
    /// arguments substituted into the bound). With none, arguments are
    /// inferred: first from `ctor_args` matched against the constructor's
    /// parameter types, then by default. A self-bounded parameter defaults
    /// to the class itself, so `instantiate(A, [])` is `A<A>`; another
    /// bounded parameter defaults to its bound; an unbounded one to `mixed`.
    ///
    /// A class whose bounds failed to resolve yields [`Type::Error`]
    /// without a new error; it was reported where it was declared.
    pub fn instantiate(
        &self,
        decl: &ClassDecl,
        provided: &[Type],
        ctor_args: &[Type],
        scope: TypeScope<'_>,
        span: Span,
    ) -> Result<Type, CheckError> {
        if !decl.bounds_resolved {
            log::debug!("not instantiating `{}`: unresolved bounds", decl.name);
            return Ok(Type::Error);
        }

        let params = &decl.type_params;
        let inferred = provided.is_empty() && !params.is_empty();
        let args = if inferred {
            self.infer_args(decl, ctor_args)
        } else if provided.len() != params.len() {
            return Err(CheckError::ArityError {
                class: decl.name.clone(),
                expected: params.len(),
                found: provided.len(),
                span,
            });
        } else {
            provided.to_vec()
        };

        let subst = Substitution::new(params, &args);
        for (param, arg) in params.iter().zip(&args) {
            let Some(bound) = &param.bound else { continue };
            let site = BoundSite {
                class: &decl.name,
                param: &param.name,
                inferred,
                span,
            };
            self.check_bound(&site, arg, &subst.apply(bound), scope)?;
        }

        let instance = Type::class(decl.name.clone(), args);
        log::trace!("instantiated {}", instance);
        Ok(instance)
    }

    /// Succeeds when `candidate` is `bound` or a subtype of it.
    pub fn check_bound(
        &self,
        site: &BoundSite<'_>,
        candidate: &Type,
        bound: &Type,
        scope: TypeScope<'_>,
    ) -> Result<(), CheckError> {
        if self.is_subtype(candidate, bound, scope) {
            return Ok(());
        }
        Err(CheckError::BoundViolation {
            class: site.class.to_string(),
            param: site.param.to_string(),
            candidate: candidate.clone(),
            bound: bound.clone(),
            inferred: site.inferred,
            span: site.span,
        })
    }

    /// Subtyping: reflexive, transitive through `extends`, everything is a
    /// subtype of `mixed`. Type variables are subtypes of their bound.
    /// The poisoned type is compatible with anything.
    pub fn is_subtype(&self, sub: &Type, sup: &Type, scope: TypeScope<'_>) -> bool {
        match (sub, sup) {
            (Type::Error, _) | (_, Type::Error) => true,
            (Type::Void, _) | (_, Type::Void) => sub == sup,
            (_, Type::Mixed) => true,
            _ if sub == sup => true,
            (Type::TypeVar(name), _) => scope
                .bound_of(name)
                .map_or(false, |bound| self.is_subtype(bound, sup, scope)),
            _ => match (sub.class_name(), sup.class_name()) {
                (Some(sub_class), Some(sup_class)) => self.class_subtype(
                    sub_class,
                    sub.type_args(),
                    sup_class,
                    sup.type_args(),
                    scope,
                ),
                _ => false,
            },
        }
    }

    fn class_subtype(
        &self,
        sub: &str,
        sub_args: &[Type],
        sup: &str,
        sup_args: &[Type],
        scope: TypeScope<'_>,
    ) -> bool {
        let Some(decl) = self.table.lookup(sub) else {
            return false;
        };
        let sub_args = self.complete_args(decl, sub_args);
        self.table
            .ancestors(sub, &sub_args)
            .iter()
            .filter(|a| a.class.name == sup)
            .any(|a| sup_args.is_empty() || self.args_equivalent(&a.type_args, sup_args, scope))
    }

    fn args_equivalent(&self, left: &[Type], right: &[Type], scope: TypeScope<'_>) -> bool {
        left.len() == right.len()
            && left
                .iter()
                .zip(right)
                .all(|(l, r)| self.is_subtype(l, r, scope) && self.is_subtype(r, l, scope))
    }

    /// Resolve `receiver->method(args)` and return the call's type.
    ///
    /// The method is looked up on the receiver's class and its ancestors.
    /// Its signature is instantiated with the receiver's type arguments as
    /// seen from the class that declares it; each argument must be a
    /// subtype of the corresponding parameter type.
    pub fn resolve_method_call(
        &self,
        receiver: &Type,
        method: &str,
        args: &[(Type, Span)],
        scope: TypeScope<'_>,
        span: Span,
    ) -> Result<Type, CheckError> {
        let invalid = || CheckError::InvalidReceiver {
            receiver: receiver.clone(),
            method: method.to_string(),
            span,
        };

        let class = match receiver {
            Type::Error => return Ok(Type::Error),
            Type::TypeVar(name) => {
                let bound = scope.bound_of(name).ok_or_else(invalid)?;
                return self.resolve_method_call(bound, method, args, scope, span);
            }
            _ => receiver.class_name().ok_or_else(invalid)?,
        };

        let decl = self.table.lookup(class).ok_or_else(|| CheckError::UnknownClass {
            name: class.to_string(),
            span,
        })?;
        if !decl.bounds_resolved {
            return Ok(Type::Error);
        }

        let type_args = self.complete_args(decl, receiver.type_args());
        let (owner, sig) = self
            .table
            .find_method(class, &type_args, method)
            .ok_or_else(|| CheckError::UnknownMethod {
                receiver: receiver.clone(),
                method: method.to_string(),
                span,
            })?;
        let concrete = sig.instantiate(&owner.substitution());
        let qualified = format!("{}::{}", owner.class.name, method);

        if concrete.params.len() != args.len() {
            return Err(CheckError::ArgumentCountMismatch {
                method: qualified,
                expected: concrete.params.len(),
                found: args.len(),
                span,
            });
        }

        let declared = sig.param_types();
        for (i, (((param, expected), declared), (found, arg_span))) in concrete
            .params
            .iter()
            .zip(declared)
            .zip(args)
            .enumerate()
        {
            if !self.is_subtype(found, expected, scope) {
                return Err(CheckError::ArgumentTypeMismatch {
                    method: qualified,
                    position: i + 1,
                    param: param.clone(),
                    expected: expected.clone(),
                    declared: declared.clone(),
                    found: found.clone(),
                    span: *arg_span,
                });
            }
        }

        log::trace!(
            "{}->{}() resolved on `{}`, returns {}",
            receiver,
            method,
            owner.class.name,
            concrete.return_type
        );
        Ok(concrete.return_type)
    }

    /// Check that every class instantiation inside `ty` has the right
    /// number of arguments and that they satisfy their bounds.
    pub fn check_well_formed(
        &self,
        ty: &Type,
        scope: TypeScope<'_>,
        span: Span,
    ) -> Result<(), CheckError> {
        let Type::Generic { base, type_args } = ty else {
            return Ok(());
        };
        for arg in type_args {
            self.check_well_formed(arg, scope, span)?;
        }
        match self.table.lookup(base) {
            Some(decl) => self.instantiate(decl, type_args, &[], scope, span).map(|_| ()),
            None => Err(CheckError::UnknownClass {
                name: base.clone(),
                span,
            }),
        }
    }

    /// Arguments for a class referenced without any: the defaults
    /// [`instantiate`](Self::instantiate) would infer with no context.
    fn complete_args(&self, decl: &ClassDecl, args: &[Type]) -> Vec<Type> {
        if args.is_empty() && decl.is_generic() {
            self.infer_args(decl, &[])
        } else {
            args.to_vec()
        }
    }

    fn infer_args(&self, decl: &ClassDecl, ctor_args: &[Type]) -> Vec<Type> {
        let mut bindings: HashMap<String, Type> = HashMap::new();
        if let Some(ctor) = decl.method(CONSTRUCTOR) {
            for (param_ty, arg_ty) in ctor.param_types().zip(ctor_args) {
                if !arg_ty.contains_error() {
                    unify(param_ty, arg_ty, &mut bindings);
                }
            }
        }

        let params = &decl.type_params;
        let mut slots: Vec<Option<Type>> = params
            .iter()
            .map(|param| match bindings.remove(&param.name) {
                Some(ty) => Some(ty),
                None if param.is_self_bound(&decl.name) => Some(Type::Named(decl.name.clone())),
                None if param.bound.is_none() => Some(Type::Mixed),
                None => None,
            })
            .collect();

        // A bounded default may mention any other parameter, in any order.
        // Fill the defaults whose bounds only mention settled parameters
        // until none are left.
        loop {
            let pending = |ty: &Type| {
                params
                    .iter()
                    .zip(&slots)
                    .any(|(p, slot)| slot.is_none() && ty.mentions_var(&p.name))
            };
            let ready: Vec<usize> = params
                .iter()
                .enumerate()
                .filter(|&(i, p)| slots[i].is_none() && !p.bound.as_ref().map_or(false, |b| pending(b)))
                .map(|(i, _)| i)
                .collect();
            if ready.is_empty() {
                break;
            }
            let subst = settled(params, &slots);
            for i in ready {
                slots[i] = params[i].bound.as_ref().map(|b| subst.apply(b));
            }
        }

        // What is left depends on itself; its unsettled parameters become
        // `mixed` and the bound check reports the result.
        let mut subst = settled(params, &slots);
        for (param, slot) in params.iter().zip(&slots) {
            if slot.is_none() {
                subst.insert(param.name.clone(), Type::Mixed);
            }
        }

        params
            .iter()
            .zip(slots)
            .map(|(param, slot)| {
                let arg = slot.unwrap_or_else(|| match &param.bound {
                    Some(bound) => subst.apply(bound),
                    None => Type::Mixed,
                });
                log::trace!("inferred {} for {}::{}", arg, decl.name, param.name);
                arg
            })
            .collect()
    }
}

/// The substitution of every parameter whose argument is already known.
fn settled(params: &[TypeParam], slots: &[Option<Type>]) -> Substitution {
    let mut subst = Substitution::empty();
    for (param, slot) in params.iter().zip(slots) {
        if let Some(ty) = slot {
            subst.insert(param.name.clone(), ty.clone());
        }
    }
    subst
}

/// Bind type variables in `pattern` to the matching parts of `actual`.
/// The first binding for a variable wins; conflicts are left for the
/// argument check to report.
fn unify(pattern: &Type, actual: &Type, bindings: &mut HashMap<String, Type>) {
    match (pattern, actual) {
        (Type::TypeVar(name), _) => {
            bindings
                .entry(name.clone())
                .or_insert_with(|| actual.clone());
        }
        (
            Type::Generic {
                base: p_base,
                type_args: p_args,
            },
            Type::Generic {
                base: a_base,
                type_args: a_args,
            },
        ) if p_base == a_base && p_args.len() == a_args.len() => {
            for (p, a) in p_args.iter().zip(a_args) {
                unify(p, a, bindings);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boundck_types::MethodSig;

    fn var(name: &str) -> Type {
        Type::TypeVar(name.to_string())
    }

    fn named(name: &str) -> Type {
        Type::Named(name.to_string())
    }

    /// class A<T as A> { bar(T $x): T }
    /// class Z { foo(): void }
    /// class B extends A<A> {}
    /// class Box<T> { __construct(T $v); get(): T }
    /// class Cmp<T as Cmp<T>> { compare(T $other): int }
    fn table() -> ClassTable {
        let mut table = ClassTable::new();
        table
            .insert(
                ClassDecl::new("A")
                    .with_type_param(TypeParam::new("T", Some(named("A"))))
                    .with_method(MethodSig::new("bar", vec![("x".into(), var("T"))], var("T"))),
            )
            .unwrap();
        table
            .insert(ClassDecl::new("Z").with_method(MethodSig::new("foo", vec![], Type::Void)))
            .unwrap();
        table
            .insert(ClassDecl::new("B").with_extends(Type::class("A", vec![named("A")])))
            .unwrap();
        table
            .insert(
                ClassDecl::new("Box")
                    .with_type_param(TypeParam::new("T", None))
                    .with_method(MethodSig::new(
                        CONSTRUCTOR,
                        vec![("v".into(), var("T"))],
                        Type::Void,
                    ))
                    .with_method(MethodSig::new("get", vec![], var("T"))),
            )
            .unwrap();
        table
            .insert(
                ClassDecl::new("Cmp")
                    .with_type_param(TypeParam::new(
                        "T",
                        Some(Type::class("Cmp", vec![var("T")])),
                    ))
                    .with_method(MethodSig::new(
                        "compare",
                        vec![("other".into(), var("T"))],
                        Type::Int,
                    )),
            )
            .unwrap();
        table
    }

    fn arg(ty: Type) -> (Type, Span) {
        (ty, Span::DUMMY)
    }

    #[test]
    fn test_instantiate_self_bound_defaults_to_itself() {
        let table = table();
        let checker = BoundChecker::new(&table);
        let a = table.lookup("A").unwrap();
        let ty = checker
            .instantiate(a, &[], &[], TypeScope::default(), Span::DUMMY)
            .unwrap();
        assert_eq!(ty, Type::class("A", vec![named("A")]));
        assert_eq!(ty.to_string(), "A<A>");
    }

    #[test]
    fn test_self_bound_is_reflexive() {
        let table = table();
        let checker = BoundChecker::new(&table);
        let site = BoundSite {
            class: "A",
            param: "T",
            inferred: false,
            span: Span::DUMMY,
        };
        let scope = TypeScope::default();
        assert!(checker.check_bound(&site, &named("A"), &named("A"), scope).is_ok());
        assert!(checker
            .check_bound(&site, &Type::class("A", vec![named("A")]), &named("A"), scope)
            .is_ok());
        // subclass of the bound
        assert!(checker.check_bound(&site, &named("B"), &named("A"), scope).is_ok());
        assert!(matches!(
            checker.check_bound(&site, &named("Z"), &named("A"), scope),
            Err(CheckError::BoundViolation { .. })
        ));
    }

    #[test]
    fn test_bar_rejects_unrelated_class() {
        let table = table();
        let checker = BoundChecker::new(&table);
        let scope = TypeScope::default();
        let receiver = Type::class("A", vec![named("A")]);

        let err = checker
            .resolve_method_call(&receiver, "bar", &[arg(named("Z"))], scope, Span::DUMMY)
            .unwrap_err();
        match &err {
            CheckError::ArgumentTypeMismatch {
                method,
                position,
                expected,
                declared,
                found,
                ..
            } => {
                assert_eq!(method, "A::bar");
                assert_eq!(*position, 1);
                assert_eq!(expected, &named("A"));
                assert_eq!(declared, &var("T"));
                assert_eq!(found, &named("Z"));
            }
            other => panic!("unexpected error {:?}", other),
        }

        // an A, or a subclass of A, is accepted and comes back as the bound
        for good in [receiver.clone(), named("B")] {
            let ret = checker
                .resolve_method_call(&receiver, "bar", &[arg(good)], scope, Span::DUMMY)
                .unwrap();
            assert_eq!(ret, named("A"));
        }
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let table = table();
        let checker = BoundChecker::new(&table);
        let scope = TypeScope::default();
        let a = table.lookup("A").unwrap();

        let first = checker.instantiate(a, &[], &[], scope, Span::DUMMY);
        let second = checker.instantiate(a, &[], &[], scope, Span::DUMMY);
        assert_eq!(first, second);

        let receiver = first.unwrap();
        let call = |t: Type| {
            checker.resolve_method_call(&receiver, "bar", &[arg(t)], scope, Span::DUMMY)
        };
        assert_eq!(call(named("Z")), call(named("Z")));
        assert_eq!(call(named("A")), call(named("A")));
    }

    #[test]
    fn test_inherited_method_uses_parent_arguments() {
        let table = table();
        let checker = BoundChecker::new(&table);
        let ret = checker
            .resolve_method_call(
                &named("B"),
                "bar",
                &[arg(named("B"))],
                TypeScope::default(),
                Span::DUMMY,
            )
            .unwrap();
        assert_eq!(ret, named("A"));
    }

    #[test]
    fn test_explicit_arguments() {
        let table = table();
        let checker = BoundChecker::new(&table);
        let scope = TypeScope::default();
        let a = table.lookup("A").unwrap();

        assert!(matches!(
            checker.instantiate(a, &[Type::Int, Type::Int], &[], scope, Span::DUMMY),
            Err(CheckError::ArityError {
                expected: 1,
                found: 2,
                ..
            })
        ));
        assert!(matches!(
            checker.instantiate(a, &[named("Z")], &[], scope, Span::DUMMY),
            Err(CheckError::BoundViolation { inferred: false, .. })
        ));
        assert_eq!(
            checker.instantiate(a, &[named("B")], &[], scope, Span::DUMMY),
            Ok(Type::class("A", vec![named("B")]))
        );
    }

    #[test]
    fn test_constructor_arguments_drive_inference() {
        let table = table();
        let checker = BoundChecker::new(&table);
        let scope = TypeScope::default();
        let boxed = table.lookup("Box").unwrap();

        let ty = checker
            .instantiate(boxed, &[], &[named("Z")], scope, Span::DUMMY)
            .unwrap();
        assert_eq!(ty.to_string(), "Box<Z>");
        let ty = checker.instantiate(boxed, &[], &[], scope, Span::DUMMY).unwrap();
        assert_eq!(ty.to_string(), "Box<mixed>");

        let get = checker
            .resolve_method_call(&Type::class("Box", vec![Type::Int]), "get", &[], scope, Span::DUMMY)
            .unwrap();
        assert_eq!(get, Type::Int);
    }

    #[test]
    fn test_f_bounded_parameter() {
        let table = table();
        let checker = BoundChecker::new(&table);
        let cmp = table.lookup("Cmp").unwrap();
        let scope = TypeScope::of_class(cmp);

        // Cmp<T> is well formed inside Cmp, where T is bounded by Cmp<T>
        assert!(checker
            .check_well_formed(&Type::class("Cmp", vec![var("T")]), scope, Span::DUMMY)
            .is_ok());
        let ty = checker
            .instantiate(cmp, &[], &[], TypeScope::default(), Span::DUMMY)
            .unwrap();
        assert_eq!(ty.to_string(), "Cmp<Cmp>");
        assert!(checker
            .check_well_formed(&Type::class("Cmp", vec![Type::Int]), TypeScope::default(), Span::DUMMY)
            .is_err());
    }

    #[test]
    fn test_default_bound_may_name_a_later_parameter() {
        let mut table = table();
        // class C<T as Box<U>, U>
        table
            .insert(
                ClassDecl::new("C")
                    .with_type_param(TypeParam::new("T", Some(Type::class("Box", vec![var("U")]))))
                    .with_type_param(TypeParam::new("U", None)),
            )
            .unwrap();
        // class D<T as Box<T>>: the default depends on itself
        table
            .insert(
                ClassDecl::new("D")
                    .with_type_param(TypeParam::new("T", Some(Type::class("Box", vec![var("T")])))),
            )
            .unwrap();
        let checker = BoundChecker::new(&table);
        let scope = TypeScope::default();

        let c = table.lookup("C").unwrap();
        let ty = checker.instantiate(c, &[], &[], scope, Span::DUMMY).unwrap();
        assert_eq!(ty.to_string(), "C<Box<mixed>, mixed>");
        assert!(!ty.mentions_var("U"));

        let d = table.lookup("D").unwrap();
        assert!(matches!(
            checker.instantiate(d, &[], &[], scope, Span::DUMMY),
            Err(CheckError::BoundViolation { inferred: true, .. })
        ));
    }

    #[test]
    fn test_type_var_receiver_uses_bound() {
        let table = table();
        let checker = BoundChecker::new(&table);
        let a = table.lookup("A").unwrap();
        let scope = TypeScope::of_class(a);

        let ret = checker
            .resolve_method_call(&var("T"), "bar", &[arg(var("T"))], scope, Span::DUMMY)
            .unwrap();
        assert_eq!(ret, named("A"));
        assert!(matches!(
            checker.resolve_method_call(&var("U"), "bar", &[], scope, Span::DUMMY),
            Err(CheckError::InvalidReceiver { .. })
        ));
    }

    #[test]
    fn test_error_type_is_silent() {
        let table = table();
        let checker = BoundChecker::new(&table);
        let scope = TypeScope::default();
        assert_eq!(
            checker.resolve_method_call(&Type::Error, "foo", &[], scope, Span::DUMMY),
            Ok(Type::Error)
        );
        assert!(checker.is_subtype(&Type::Error, &named("A"), scope));
        assert!(checker.is_subtype(&named("Z"), &Type::Mixed, scope));
        assert!(!checker.is_subtype(&Type::Void, &Type::Mixed, scope));
    }

    #[test]
    fn test_unknown_method_and_primitive_receiver() {
        let table = table();
        let checker = BoundChecker::new(&table);
        let scope = TypeScope::default();
        assert!(matches!(
            checker.resolve_method_call(&named("Z"), "nope", &[], scope, Span::DUMMY),
            Err(CheckError::UnknownMethod { .. })
        ));
        assert!(matches!(
            checker.resolve_method_call(&Type::Int, "foo", &[], scope, Span::DUMMY),
            Err(CheckError::InvalidReceiver { .. })
        ));
        assert!(matches!(
            checker.resolve_method_call(&named("Z"), "foo", &[arg(Type::Int)], scope, Span::DUMMY),
            Err(CheckError::ArgumentCountMismatch {
                expected: 0,
                found: 1,
                ..
            })
        ));
    }
}
