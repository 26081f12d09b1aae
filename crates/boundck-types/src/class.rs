//! Class declarations and the arena they live in.

use crate::subst::Substitution;
use crate::{Type, TypeParam};
use boundck_diagnostics::Span;
use std::collections::HashMap;

/// Index of a class inside a [`ClassTable`].
pub type ClassId = u32;

/// Method signature as declared on a class.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub name: String,
    /// (name, type) of each parameter, in order
    pub params: Vec<(String, Type)>,
    pub return_type: Type,
    pub span: Span,
}

impl MethodSig {
    pub fn new(name: impl Into<String>, params: Vec<(String, Type)>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            span: Span::DUMMY,
        }
    }

    /// Signature with every type parameter replaced by its argument.
    pub fn instantiate(&self, subst: &Substitution) -> MethodSig {
        MethodSig {
            name: self.name.clone(),
            params: self
                .params
                .iter()
                .map(|(name, ty)| (name.clone(), subst.apply(ty)))
                .collect(),
            return_type: subst.apply(&self.return_type),
            span: self.span,
        }
    }

    /// Inverse of [`instantiate`](Self::instantiate): every occurrence of a
    /// substituted argument becomes the parameter it replaced.
    pub fn abstract_over(&self, subst: &Substitution) -> MethodSig {
        MethodSig {
            name: self.name.clone(),
            params: self
                .params
                .iter()
                .map(|(name, ty)| (name.clone(), subst.unapply(ty)))
                .collect(),
            return_type: subst.unapply(&self.return_type),
            span: self.span,
        }
    }

    pub fn param_types(&self) -> impl Iterator<Item = &Type> {
        self.params.iter().map(|(_, ty)| ty)
    }
}

/// Name of the method `new` resolves constructor arguments against.
pub const CONSTRUCTOR: &str = "__construct";

/// A class as produced by declaration analysis. Immutable once in a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub id: ClassId,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    /// Parent class, possibly mentioning this class's parameters
    pub extends: Option<Type>,
    pub methods: Vec<MethodSig>,
    /// False when a bound failed to resolve. Such a class cannot be
    /// instantiated.
    pub bounds_resolved: bool,
    pub span: Span,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            type_params: Vec::new(),
            extends: None,
            methods: Vec::new(),
            bounds_resolved: true,
            span: Span::DUMMY,
        }
    }

    pub fn with_type_param(mut self, param: TypeParam) -> Self {
        self.type_params.push(param);
        self
    }

    pub fn with_extends(mut self, parent: Type) -> Self {
        self.extends = Some(parent);
        self
    }

    pub fn with_method(mut self, method: MethodSig) -> Self {
        self.methods.push(method);
        self
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Method declared directly on this class (not inherited).
    pub fn method(&self, name: &str) -> Option<&MethodSig> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn type_param(&self, name: &str) -> Option<&TypeParam> {
        self.type_params.iter().find(|p| p.name == name)
    }

    /// The class applied to its own parameters (`A<T>` inside `class A<T>`).
    pub fn self_type(&self) -> Type {
        Type::class(
            self.name.clone(),
            self.type_params
                .iter()
                .map(|p| Type::TypeVar(p.name.clone()))
                .collect(),
        )
    }
}

/// One step of a linearized ancestor walk: a class together with the type
/// arguments it is instantiated with at that point of the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Ancestor<'a> {
    pub class: &'a ClassDecl,
    pub type_args: Vec<Type>,
}

impl Ancestor<'_> {
    /// Substitution of this ancestor's parameters by its arguments.
    pub fn substitution(&self) -> Substitution {
        Substitution::new(&self.class.type_params, &self.type_args)
    }
}

/// Arena of class declarations keyed by name.
///
/// Classes refer to one another (bounds, parents, signatures) only by name;
/// lookups go through this table.
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    classes: Vec<ClassDecl>,
    by_name: HashMap<String, ClassId>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class, assigning its id. A class with the same name already in
    /// the table is left in place and the new one is rejected.
    pub fn insert(&mut self, mut decl: ClassDecl) -> Result<ClassId, ClassDecl> {
        if self.by_name.contains_key(&decl.name) {
            return Err(decl);
        }
        let id = self.classes.len() as ClassId;
        decl.id = id;
        self.by_name.insert(decl.name.clone(), id);
        self.classes.push(decl);
        Ok(id)
    }

    pub fn get(&self, id: ClassId) -> Option<&ClassDecl> {
        self.classes.get(id as usize)
    }

    pub fn lookup(&self, name: &str) -> Option<&ClassDecl> {
        self.by_name.get(name).and_then(|&id| self.get(id))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassDecl> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Linearized ancestors of `class<type_args>`, starting with the class
    /// itself. Each parent's arguments are substituted from its child's.
    /// The walk stops at unknown parents and at cycles.
    pub fn ancestors(&self, class: &str, type_args: &[Type]) -> Vec<Ancestor<'_>> {
        let mut chain: Vec<Ancestor<'_>> = Vec::new();
        let mut next = self
            .lookup(class)
            .map(|decl| (decl, type_args.to_vec()));

        while let Some((decl, args)) = next.take() {
            if chain.iter().any(|a| a.class.id == decl.id) {
                log::warn!("inheritance cycle through `{}`", decl.name);
                break;
            }
            let step = Ancestor {
                class: decl,
                type_args: args,
            };
            next = decl.extends.as_ref().and_then(|parent| {
                let parent = step.substitution().apply(parent);
                let name = parent.class_name()?;
                let parent_decl = self.lookup(name)?;
                Some((parent_decl, parent.type_args().to_vec()))
            });
            chain.push(step);
        }
        chain
    }

    /// True when `sub` is `sup` or inherits from it.
    pub fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        sub == sup
            || self
                .ancestors(sub, &[])
                .iter()
                .any(|a| a.class.name == sup)
    }

    /// Find a method on `class<type_args>` or its nearest ancestor that
    /// declares it. Returns the ancestor it was found on.
    pub fn find_method<'a>(
        &'a self,
        class: &str,
        type_args: &[Type],
        method: &str,
    ) -> Option<(Ancestor<'a>, &'a MethodSig)> {
        self.ancestors(class, type_args)
            .into_iter()
            .find_map(|a| {
                let class = a.class;
                class.method(method).map(|m| (a, m))
            })
    }
}
