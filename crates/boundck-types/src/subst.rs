//! Substitution of type parameters by type arguments.

use crate::{Type, TypeParam};

/// Ordered mapping from type parameter names to the arguments replacing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitution {
    pairs: Vec<(String, Type)>,
}

impl Substitution {
    /// Pair each parameter with the argument at the same position. Extra
    /// parameters or arguments on either side are ignored.
    pub fn new(params: &[TypeParam], args: &[Type]) -> Self {
        Self {
            pairs: params
                .iter()
                .zip(args)
                .map(|(p, a)| (p.name.clone(), a.clone()))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, ty: Type) {
        let name = name.into();
        match self.pairs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = ty,
            None => self.pairs.push((name, ty)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.pairs.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Replace every type variable bound here by its argument.
    pub fn apply(&self, ty: &Type) -> Type {
        if self.is_empty() {
            return ty.clone();
        }
        match ty {
            Type::TypeVar(name) => self.get(name).cloned().unwrap_or_else(|| ty.clone()),
            Type::Generic { base, type_args } => Type::Generic {
                base: base.clone(),
                type_args: type_args.iter().map(|t| self.apply(t)).collect(),
            },
            _ => ty.clone(),
        }
    }

    /// Replace every subtree equal to one of the arguments by the type
    /// variable it was substituted for. Recovers the original type when the
    /// arguments are pairwise distinct and did not already occur in it.
    pub fn unapply(&self, ty: &Type) -> Type {
        if let Some((name, _)) = self.pairs.iter().find(|(_, arg)| arg == ty) {
            return Type::TypeVar(name.clone());
        }
        match ty {
            Type::Generic { base, type_args } => Type::Generic {
                base: base.clone(),
                type_args: type_args.iter().map(|t| self.unapply(t)).collect(),
            },
            _ => ty.clone(),
        }
    }
}
