//! Reader for the type expressions used in manifests (`A`, `Map<K, Box<V>>`).

use thiserror::Error;

/// Deepest nesting of type arguments a manifest may use.
pub const MAX_TYPE_DEPTH: usize = 64;

/// Unresolved type expression: a name with optional arguments.
///
/// Whether the name denotes a class, a type parameter or a builtin is
/// decided later, against the scope it appears in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    pub name: String,
    pub args: Vec<TypeExpr>,
}

impl TypeExpr {
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeExprError {
    #[error("empty type expression")]
    Empty,
    #[error("expected a type name at offset {0}")]
    ExpectedName(usize),
    #[error("expected `{expected}` at offset {offset}")]
    Expected { expected: char, offset: usize },
    #[error("unexpected `{found}` at offset {offset}")]
    Trailing { found: char, offset: usize },
    #[error("type arguments nested deeper than {} levels at offset {0}", MAX_TYPE_DEPTH)]
    TooDeep(usize),
}

impl TypeExprError {
    /// Byte offset inside the expression the error points at.
    pub fn offset(&self) -> usize {
        match self {
            TypeExprError::Empty => 0,
            TypeExprError::ExpectedName(offset)
            | TypeExprError::TooDeep(offset)
            | TypeExprError::Expected { offset, .. }
            | TypeExprError::Trailing { offset, .. } => *offset,
        }
    }
}

/// Read a complete type expression.
pub fn parse_type_expr(text: &str) -> Result<TypeExpr, TypeExprError> {
    if text.trim().is_empty() {
        return Err(TypeExprError::Empty);
    }
    let mut reader = Reader { text, pos: 0 };
    let ty = reader.type_expr(0)?;
    reader.skip_ws();
    match reader.peek() {
        None => Ok(ty),
        Some(found) => Err(TypeExprError::Trailing {
            found,
            offset: reader.pos,
        }),
    }
}

struct Reader<'a> {
    text: &'a str,
    pos: usize,
}

impl Reader<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), TypeExprError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(TypeExprError::Expected {
                expected,
                offset: self.pos,
            })
        }
    }

    fn name(&mut self) -> Result<String, TypeExprError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self
            .peek()
            .filter(|&c| c.is_alphanumeric() || c == '_' || c == '\\')
        {
            if self.pos == start && c.is_ascii_digit() {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(TypeExprError::ExpectedName(start));
        }
        Ok(self.text[start..self.pos].to_string())
    }

    fn type_expr(&mut self, depth: usize) -> Result<TypeExpr, TypeExprError> {
        let name = self.name()?;
        let mut args = Vec::new();
        if self.eat('<') {
            if depth >= MAX_TYPE_DEPTH {
                return Err(TypeExprError::TooDeep(self.pos));
            }
            loop {
                args.push(self.type_expr(depth + 1)?);
                if !self.eat(',') {
                    break;
                }
            }
            self.expect('>')?;
        }
        Ok(TypeExpr { name, args })
    }
}
