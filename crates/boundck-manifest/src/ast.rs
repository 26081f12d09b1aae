//! Syntax tree of a declaration manifest, as deserialized from TOML.
//!
//! Names that diagnostics point at are wrapped in [`Spanned`] so their byte
//! range in the manifest survives deserialization.

use serde::Deserialize;
use toml::Spanned;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default, rename = "class")]
    pub classes: Vec<ClassItem>,
    #[serde(default, rename = "function")]
    pub functions: Vec<FunctionItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassItem {
    pub name: Spanned<String>,
    #[serde(default)]
    pub type_params: Vec<TypeParamItem>,
    /// Parent class as a type expression, e.g. `"Base<T>"`
    #[serde(default)]
    pub extends: Option<Spanned<String>>,
    #[serde(default, rename = "method")]
    pub methods: Vec<FunctionItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeParamItem {
    pub name: Spanned<String>,
    #[serde(default)]
    pub bound: Option<Spanned<String>>,
}

/// A free function or a method. Methods without a body are signatures only.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionItem {
    pub name: Spanned<String>,
    #[serde(default)]
    pub params: Vec<ParamItem>,
    /// Return type expression; `void` when omitted
    #[serde(default)]
    pub returns: Option<Spanned<String>>,
    #[serde(default)]
    pub body: Option<Vec<StmtItem>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamItem {
    pub name: Spanned<String>,
    #[serde(rename = "type")]
    pub ty: Spanned<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StmtItem {
    /// `{ let = { name = "x", value = <expr> } }`
    Let {
        name: Spanned<String>,
        value: ExprItem,
    },
    /// `{ expr = <expr> }`
    Expr(ExprItem),
    /// `{ return = <expr> }`
    Return(ExprItem),
    /// `{ return_void = true }`
    ReturnVoid(bool),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprItem {
    /// `"this"`
    This,
    /// `{ var = "x" }`
    Var(Spanned<String>),
    /// `{ int = 1 }`
    Int(i64),
    /// `{ string = "s" }`
    String(String),
    /// `{ bool = true }`
    Bool(bool),
    /// `{ new = { class = "A", type_args = ["Z"], args = [...] } }`
    New {
        class: Spanned<String>,
        #[serde(default)]
        type_args: Vec<Spanned<String>>,
        #[serde(default)]
        args: Vec<ExprItem>,
    },
    /// `{ call = { receiver = <expr>, method = "m", args = [...] } }`
    Call {
        receiver: Box<ExprItem>,
        method: Spanned<String>,
        #[serde(default)]
        args: Vec<ExprItem>,
    },
}
