//! Statement AST nodes.
//!
//! Provides nodes for:
//! - Imports (`import`, `from ... import`)
//! - Bindings (`let`, assignment) and function definitions
//! - Control flow (`if`, `while`, `for ... in`, `return`)
//! - Expression statements

use stratum_core::Span;

use crate::ast::expr::Expr;
use crate::ast::{Ident, ImportPath};

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    Import(ImportStmt<'ast>),
    FromImport(FromImportStmt<'ast>),
    Let(LetStmt<'ast>),
    Assign(AssignStmt<'ast>),
    Function(&'ast FunctionDecl<'ast>),
    Return(ReturnStmt<'ast>),
    If(&'ast IfStmt<'ast>),
    While(&'ast WhileStmt<'ast>),
    For(&'ast ForStmt<'ast>),
    Expr(ExprStmt<'ast>),
}

impl<'ast> Stmt<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Import(s) => s.span,
            Self::FromImport(s) => s.span,
            Self::Let(s) => s.span,
            Self::Assign(s) => s.span,
            Self::Function(s) => s.span,
            Self::Return(s) => s.span,
            Self::If(s) => s.span,
            Self::While(s) => s.span,
            Self::For(s) => s.span,
            Self::Expr(s) => s.span,
        }
    }
}

/// `import a.b;` or `import a.b as x;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportStmt<'ast> {
    /// Always absolute.
    pub path: ImportPath<'ast>,
    pub alias: Option<Ident<'ast>>,
    pub span: Span,
}

/// `from a.b import f, g as h;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FromImportStmt<'ast> {
    pub path: ImportPath<'ast>,
    pub names: &'ast [ImportItem<'ast>],
    pub span: Span,
}

/// One `name [as alias]` of a from-import.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportItem<'ast> {
    pub name: Ident<'ast>,
    pub alias: Option<Ident<'ast>>,
}

impl<'ast> ImportItem<'ast> {
    /// The name the item is bound under.
    pub fn binding(&self) -> Ident<'ast> {
        self.alias.unwrap_or(self.name)
    }
}

/// `let x = expr;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetStmt<'ast> {
    pub name: Ident<'ast>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

/// `x = expr;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignStmt<'ast> {
    pub target: Ident<'ast>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

/// `fn name(params) { body }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionDecl<'ast> {
    pub name: Ident<'ast>,
    pub params: &'ast [Ident<'ast>],
    pub body: Block<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub value: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub then_block: Block<'ast>,
    pub else_branch: Option<ElseBranch<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElseBranch<'ast> {
    Block(Block<'ast>),
    If(&'ast IfStmt<'ast>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhileStmt<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub body: Block<'ast>,
    pub span: Span,
}

/// `for x in xs { ... }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForStmt<'ast> {
    pub var: Ident<'ast>,
    pub iterable: &'ast Expr<'ast>,
    pub body: Block<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprStmt<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}

/// A braced statement list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub span: Span,
}
