//! Expression AST nodes.
//!
//! # Expression Precedence
//!
//! 1. Logical OR (`||`)
//! 2. Logical AND (`&&`)
//! 3. Equality (`==`, `!=`)
//! 4. Relational (`<`, `<=`, `>`, `>=`)
//! 5. Additive (`+`, `-`)
//! 6. Multiplicative (`*`, `/`, `%`)
//! 7. Prefix unary (`-`, `!`)
//! 8. Postfix (call, index, member)

use stratum_core::Span;

use crate::ast::{BinaryOp, Ident, UnaryOp};

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    Literal(LiteralExpr<'ast>),
    Ident(Ident<'ast>),
    List(&'ast ListExpr<'ast>),
    Map(&'ast MapExpr<'ast>),
    Member(&'ast MemberExpr<'ast>),
    Index(&'ast IndexExpr<'ast>),
    Call(&'ast CallExpr<'ast>),
    Unary(&'ast UnaryExpr<'ast>),
    Binary(&'ast BinaryExpr<'ast>),
    Paren(&'ast ParenExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Ident(e) => e.span,
            Self::List(e) => e.span,
            Self::Map(e) => e.span,
            Self::Member(e) => e.span,
            Self::Index(e) => e.span,
            Self::Call(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Paren(e) => e.span,
        }
    }

    /// The dotted identifier chain this expression spells, if it is nothing
    /// but identifiers joined by member access (`a`, `a.b.c`).
    pub fn dotted_chain(&self) -> Option<Vec<Ident<'ast>>> {
        match self {
            Self::Ident(ident) => Some(vec![*ident]),
            Self::Member(member) => {
                let mut chain = member.object.dotted_chain()?;
                chain.push(member.member);
                Some(chain)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    pub kind: LiteralKind<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Decoded string contents (escapes already processed).
    Str(&'ast str),
    Null,
}

/// `[a, b, c]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListExpr<'ast> {
    pub items: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

/// `{key: value, ...}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapExpr<'ast> {
    pub entries: &'ast [MapEntry<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapEntry<'ast> {
    pub key: &'ast Expr<'ast>,
    pub value: &'ast Expr<'ast>,
}

/// `object.member`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub member: Ident<'ast>,
    pub span: Span,
}

/// `object[index]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub index: &'ast Expr<'ast>,
    pub span: Span,
}

/// `callee(args)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: &'ast Expr<'ast>,
    pub args: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: BinaryOp,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

/// `(expr)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParenExpr<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}
