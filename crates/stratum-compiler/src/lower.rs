//! Lowering from the arena AST to owned IR.
//!
//! Top-level names are globals of the unit's symbol table. Inside a function,
//! parameters, `let` bindings, loop variables and imported names are locals
//! with fixed slots; any other name refers to a global, looked up when the
//! function runs.

use std::sync::Arc;

use stratum_core::Value;
use stratum_core::ir::{self, Chunk, FunctionProto, ImportName, Target};
use stratum_parser::ast::{
    self, BinaryOp, ElseBranch, Expr, Ident, LiteralKind, Stmt, UnaryOp, Unit,
};

use crate::scope::LocalScope;

/// Lower a parsed unit into an owned [`Chunk`].
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn lower(unit: &Unit<'_>) -> Chunk {
    let mut lowerer = Lowerer { scope: None };
    Chunk {
        body: lowerer.stmts(unit.stmts()),
    }
}

struct Lowerer {
    /// Present while lowering a function body.
    scope: Option<LocalScope>,
}

impl Lowerer {
    // =========================================
    // Statements
    // =========================================

    fn stmts(&mut self, stmts: &[Stmt<'_>]) -> Vec<ir::Stmt> {
        stmts.iter().map(|s| self.stmt(s)).collect()
    }

    fn block(&mut self, block: &ast::Block<'_>) -> Vec<ir::Stmt> {
        self.push_scope();
        let body = self.stmts(block.stmts);
        self.pop_scope();
        body
    }

    fn stmt(&mut self, stmt: &Stmt<'_>) -> ir::Stmt {
        match stmt {
            Stmt::Import(import) => {
                let path = import_path(&import.path);
                match import.alias {
                    Some(alias) => ir::Stmt::Import {
                        path,
                        target: self.declare(alias.name),
                        bind_root: false,
                    },
                    None => {
                        let root = import.path.segments[0].name;
                        ir::Stmt::Import {
                            path,
                            target: self.declare(root),
                            bind_root: true,
                        }
                    }
                }
            }
            Stmt::FromImport(from) => ir::Stmt::FromImport {
                path: import_path(&from.path),
                names: from
                    .names
                    .iter()
                    .map(|item| ImportName {
                        name: Arc::from(item.name.name),
                        target: self.declare(item.binding().name),
                    })
                    .collect(),
            },
            Stmt::Let(let_stmt) => {
                let value = self.expr(let_stmt.value);
                ir::Stmt::Store {
                    target: self.declare(let_stmt.name.name),
                    value,
                }
            }
            Stmt::Assign(assign) => ir::Stmt::Store {
                target: self.resolve(assign.target.name),
                value: self.expr(assign.value),
            },
            Stmt::Function(decl) => ir::Stmt::Function(Arc::new(self.function(decl))),
            Stmt::Return(ret) => ir::Stmt::Return(ret.value.map(|v| self.expr(v))),
            Stmt::If(if_stmt) => self.if_stmt(if_stmt),
            Stmt::While(while_stmt) => ir::Stmt::While {
                cond: self.expr(while_stmt.condition),
                body: self.block(&while_stmt.body),
            },
            Stmt::For(for_stmt) => {
                let iter = self.expr(for_stmt.iterable);
                self.push_scope();
                let target = self.declare(for_stmt.var.name);
                let body = self.stmts(for_stmt.body.stmts);
                self.pop_scope();
                ir::Stmt::For { target, iter, body }
            }
            Stmt::Expr(expr_stmt) => ir::Stmt::Expr(self.expr(expr_stmt.expr)),
        }
    }

    fn if_stmt(&mut self, if_stmt: &ast::IfStmt<'_>) -> ir::Stmt {
        let cond = self.expr(if_stmt.condition);
        let then_body = self.block(&if_stmt.then_block);
        let else_body = match if_stmt.else_branch {
            Some(ElseBranch::Block(block)) => self.block(&block),
            Some(ElseBranch::If(nested)) => vec![self.if_stmt(nested)],
            None => Vec::new(),
        };
        ir::Stmt::If {
            cond,
            then_body,
            else_body,
        }
    }

    fn function(&mut self, decl: &ast::FunctionDecl<'_>) -> FunctionProto {
        let mut scope = LocalScope::new();
        let params: Vec<Arc<str>> = decl
            .params
            .iter()
            .map(|p| {
                scope.declare(p.name);
                Arc::from(p.name)
            })
            .collect();

        let outer = self.scope.replace(scope);
        let body = self.stmts(decl.body.stmts);
        let scope = std::mem::replace(&mut self.scope, outer).unwrap_or_default();

        FunctionProto {
            name: Arc::from(decl.name.name),
            params,
            local_count: scope.frame_size(),
            local_names: scope.into_slot_names(),
            body,
        }
    }

    // =========================================
    // Expressions
    // =========================================

    fn expr(&mut self, expr: &Expr<'_>) -> ir::Expr {
        match expr {
            Expr::Literal(lit) => ir::Expr::Const(literal(&lit.kind)),
            Expr::Ident(ident) => match self.local(ident) {
                Some(slot) => ir::Expr::Local(slot),
                None => ir::Expr::Global(Arc::from(ident.name)),
            },
            Expr::List(list) => ir::Expr::List(list.items.iter().map(|e| self.expr(e)).collect()),
            Expr::Map(map) => ir::Expr::Map(
                map.entries
                    .iter()
                    .map(|entry| (self.expr(entry.key), self.expr(entry.value)))
                    .collect(),
            ),
            Expr::Member(member) => ir::Expr::Attr {
                object: Box::new(self.expr(member.object)),
                name: Arc::from(member.member.name),
            },
            Expr::Index(index) => ir::Expr::Index {
                object: Box::new(self.expr(index.object)),
                index: Box::new(self.expr(index.index)),
            },
            Expr::Call(call) => {
                let args = call.args.iter().map(|a| self.expr(a)).collect();
                match call.callee {
                    Expr::Member(member) => ir::Expr::MethodCall {
                        receiver: Box::new(self.expr(member.object)),
                        method: Arc::from(member.member.name),
                        args,
                    },
                    callee => ir::Expr::Call {
                        callee: Box::new(self.expr(callee)),
                        args,
                    },
                }
            }
            Expr::Unary(unary) => ir::Expr::Unary {
                op: match unary.op {
                    UnaryOp::Neg => ir::UnaryOp::Neg,
                    UnaryOp::Not => ir::UnaryOp::Not,
                },
                operand: Box::new(self.expr(unary.operand)),
            },
            Expr::Binary(binary) => {
                let left = Box::new(self.expr(binary.left));
                let right = Box::new(self.expr(binary.right));
                match binary_op(binary.op) {
                    Some(op) => ir::Expr::Binary { op, left, right },
                    None if binary.op == BinaryOp::LogicalAnd => ir::Expr::And(left, right),
                    None => ir::Expr::Or(left, right),
                }
            }
            Expr::Paren(paren) => self.expr(paren.expr),
        }
    }

    // =========================================
    // Names
    // =========================================

    /// Bind a new name: a local inside functions, a global at top level.
    fn declare(&mut self, name: &str) -> Target {
        match &mut self.scope {
            Some(scope) => Target::Local(scope.declare(name)),
            None => Target::Global(Arc::from(name)),
        }
    }

    /// Target of an assignment to an existing name.
    fn resolve(&self, name: &str) -> Target {
        match self.scope.as_ref().and_then(|s| s.get(name)) {
            Some(var) => Target::Local(var.slot),
            None => Target::Global(Arc::from(name)),
        }
    }

    fn local(&self, ident: &Ident<'_>) -> Option<u32> {
        self.scope
            .as_ref()
            .and_then(|s| s.get(ident.name))
            .map(|var| var.slot)
    }

    fn push_scope(&mut self) {
        if let Some(scope) = &mut self.scope {
            scope.push_scope();
        }
    }

    fn pop_scope(&mut self) {
        if let Some(scope) = &mut self.scope {
            scope.pop_scope();
        }
    }
}

fn import_path(path: &ast::ImportPath<'_>) -> ir::ImportPath {
    ir::ImportPath {
        level: path.level,
        segments: path.names().map(Arc::from).collect(),
    }
}

fn literal(kind: &LiteralKind<'_>) -> Value {
    match *kind {
        LiteralKind::Int(i) => Value::Int(i),
        LiteralKind::Float(f) => Value::from(f),
        LiteralKind::Bool(b) => Value::Bool(b),
        LiteralKind::Str(s) => Value::str(s),
        LiteralKind::Null => Value::Null,
    }
}

/// Arithmetic and comparison operators; `None` for the short-circuiting ones.
fn binary_op(op: BinaryOp) -> Option<ir::BinaryOp> {
    let op = match op {
        BinaryOp::Add => ir::BinaryOp::Add,
        BinaryOp::Sub => ir::BinaryOp::Sub,
        BinaryOp::Mul => ir::BinaryOp::Mul,
        BinaryOp::Div => ir::BinaryOp::Div,
        BinaryOp::Mod => ir::BinaryOp::Mod,
        BinaryOp::Less => ir::BinaryOp::Lt,
        BinaryOp::LessEqual => ir::BinaryOp::Le,
        BinaryOp::Greater => ir::BinaryOp::Gt,
        BinaryOp::GreaterEqual => ir::BinaryOp::Ge,
        BinaryOp::Equal => ir::BinaryOp::Eq,
        BinaryOp::NotEqual => ir::BinaryOp::Ne,
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => return None,
    };
    Some(op)
}
