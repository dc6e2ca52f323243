//! Owned intermediate representation of a definition unit.
//!
//! The parser produces an arena-allocated AST tied to the lifetime of its
//! arena. Lowering turns it into this owned form: names of function locals
//! are resolved to slots, everything else stays symbolic. Function prototypes
//! are shared (`Arc`) so values can outlive the chunk that defined them.

use std::fmt;
use std::sync::Arc;

use crate::Value;

/// A lowered definition unit: its top-level statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chunk {
    pub body: Vec<Stmt>,
}

/// A lowered function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionProto {
    pub name: Arc<str>,
    /// Parameters occupy the first `params.len()` local slots.
    pub params: Vec<Arc<str>>,
    /// Total slots needed, parameters included.
    pub local_count: u32,
    /// Name of each slot, for diagnostics.
    pub local_names: Vec<Arc<str>>,
    pub body: Vec<Stmt>,
}

/// Where a name is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Local(u32),
    Global(Arc<str>),
}

/// A possibly relative namespace path in an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPath {
    /// Number of leading dots; zero for absolute imports.
    pub level: u32,
    pub segments: Vec<Arc<str>>,
}

impl ImportPath {
    pub fn is_relative(&self) -> bool {
        self.level > 0
    }
}

impl fmt::Display for ImportPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.level {
            f.write_str(".")?;
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(seg)?;
        }
        Ok(())
    }
}

/// One `name [as alias]` item of a from-import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportName {
    pub name: Arc<str>,
    pub target: Target,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `import a.b;` binds the root `a` to `target`; `import a.b as x;`
    /// binds `a.b` itself.
    Import {
        path: ImportPath,
        target: Target,
        bind_root: bool,
    },
    FromImport {
        path: ImportPath,
        names: Vec<ImportName>,
    },
    Function(Arc<FunctionProto>),
    Store {
        target: Target,
        value: Expr,
    },
    Return(Option<Expr>),
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    For {
        target: Target,
        iter: Expr,
        body: Vec<Stmt>,
    },
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(Value),
    Local(u32),
    Global(Arc<str>),
    List(Vec<Expr>),
    Map(Vec<(Expr, Expr)>),
    Attr {
        object: Box<Expr>,
        name: Arc<str>,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `receiver.method(args)`: an attribute call on a namespace, or a
    /// builtin method on a string, list or map.
    MethodCall {
        receiver: Box<Expr>,
        method: Arc<str>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}
