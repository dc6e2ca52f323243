//! Cross-reference rewriting.
//!
//! Re-roots every reference to a namespace root (or one of its descendants)
//! so that it names another root instead:
//!
//! - `import a.b [as x];` paths
//! - `from a.b import ...;` paths
//! - dotted identifier chains in expressions (`a.b.f(x)`), where the whole
//!   leading chain is replaced
//!
//! Matching is segment-exact, so a search root `json` never touches
//! `json2.x`. Relative imports are left alone: they already resolve through
//! whatever namespace the unit is bound into.
//!
//! Rewriting is pure. Unchanged subtrees are shared with the input, and a
//! unit with no matching reference comes back as-is with `changed == false`.
//!
//! ```
//! use bumpalo::Bump;
//! use stratum_core::NamespacePath;
//! use stratum_parser::rewrite_source;
//!
//! let arena = Bump::new();
//! let search = NamespacePath::parse("json").unwrap();
//! let replace = NamespacePath::parse("json_sq").unwrap();
//! let out = rewrite_source("import json; let s = json.dumps(1);", &search, &replace, &arena)
//!     .unwrap();
//! assert!(out.changed);
//! ```

use bumpalo::Bump;
use stratum_core::{NamespacePath, ParseErrors, Span};

use crate::Parser;
use crate::ast::*;

/// Result of a rewrite pass.
#[derive(Debug, Clone, Copy)]
pub struct Rewritten<'ast> {
    pub unit: Unit<'ast>,
    /// Whether any reference was re-rooted.
    pub changed: bool,
}

/// Re-root references to `search` so they name `replace`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn rewrite<'ast>(
    unit: &Unit<'ast>,
    search: &NamespacePath,
    replace: &NamespacePath,
    arena: &'ast Bump,
) -> Rewritten<'ast> {
    if search == replace {
        return Rewritten {
            unit: *unit,
            changed: false,
        };
    }

    let rewriter = Rewriter {
        search,
        replace,
        arena,
    };
    match rewriter.stmts(unit.stmts()) {
        Some(stmts) => Rewritten {
            unit: Unit::new(stmts, unit.span()),
            changed: true,
        },
        None => Rewritten {
            unit: *unit,
            changed: false,
        },
    }
}

/// Parse `source` and rewrite it in one step.
pub fn rewrite_source<'ast>(
    source: &str,
    search: &NamespacePath,
    replace: &NamespacePath,
    arena: &'ast Bump,
) -> Result<Rewritten<'ast>, ParseErrors> {
    let unit = Parser::parse(source, arena)?;
    Ok(rewrite(&unit, search, replace, arena))
}

/// Every method returns `None` when nothing below the node changed.
struct Rewriter<'a, 'ast> {
    search: &'a NamespacePath,
    replace: &'a NamespacePath,
    arena: &'ast Bump,
}

impl<'a, 'ast> Rewriter<'a, 'ast> {
    // =========================================
    // Statements
    // =========================================

    fn stmts(&self, stmts: &'ast [Stmt<'ast>]) -> Option<&'ast [Stmt<'ast>]> {
        let rewritten: Vec<Option<Stmt<'ast>>> = stmts.iter().map(|s| self.stmt(s)).collect();
        if rewritten.iter().all(Option::is_none) {
            return None;
        }
        Some(
            self.arena.alloc_slice_fill_iter(
                stmts
                    .iter()
                    .zip(rewritten)
                    .map(|(orig, new)| new.unwrap_or(*orig)),
            ),
        )
    }

    fn stmt(&self, stmt: &Stmt<'ast>) -> Option<Stmt<'ast>> {
        match *stmt {
            Stmt::Import(s) => {
                let path = self.import_path(&s.path)?;
                Some(Stmt::Import(ImportStmt { path, ..s }))
            }
            Stmt::FromImport(s) => {
                let path = self.import_path(&s.path)?;
                Some(Stmt::FromImport(FromImportStmt { path, ..s }))
            }
            Stmt::Let(s) => {
                let value = self.expr(s.value)?;
                Some(Stmt::Let(LetStmt { value, ..s }))
            }
            Stmt::Assign(s) => {
                let value = self.expr(s.value)?;
                Some(Stmt::Assign(AssignStmt { value, ..s }))
            }
            Stmt::Function(f) => {
                let body = self.block(&f.body)?;
                Some(Stmt::Function(self.arena.alloc(FunctionDecl { body, ..*f })))
            }
            Stmt::Return(s) => {
                let value = self.expr(s.value?)?;
                Some(Stmt::Return(ReturnStmt {
                    value: Some(value),
                    ..s
                }))
            }
            Stmt::If(s) => self.if_stmt(s).map(Stmt::If),
            Stmt::While(s) => {
                let condition = self.expr(s.condition);
                let body = self.block(&s.body);
                if condition.is_none() && body.is_none() {
                    return None;
                }
                Some(Stmt::While(self.arena.alloc(WhileStmt {
                    condition: condition.unwrap_or(s.condition),
                    body: body.unwrap_or(s.body),
                    span: s.span,
                })))
            }
            Stmt::For(s) => {
                let iterable = self.expr(s.iterable);
                let body = self.block(&s.body);
                if iterable.is_none() && body.is_none() {
                    return None;
                }
                Some(Stmt::For(self.arena.alloc(ForStmt {
                    iterable: iterable.unwrap_or(s.iterable),
                    body: body.unwrap_or(s.body),
                    ..*s
                })))
            }
            Stmt::Expr(s) => {
                let expr = self.expr(s.expr)?;
                Some(Stmt::Expr(ExprStmt { expr, ..s }))
            }
        }
    }

    fn if_stmt(&self, s: &'ast IfStmt<'ast>) -> Option<&'ast IfStmt<'ast>> {
        let condition = self.expr(s.condition);
        let then_block = self.block(&s.then_block);
        let else_branch = match s.else_branch {
            Some(ElseBranch::Block(block)) => self.block(&block).map(ElseBranch::Block),
            Some(ElseBranch::If(nested)) => self.if_stmt(nested).map(ElseBranch::If),
            None => None,
        };
        if condition.is_none() && then_block.is_none() && else_branch.is_none() {
            return None;
        }
        Some(self.arena.alloc(IfStmt {
            condition: condition.unwrap_or(s.condition),
            then_block: then_block.unwrap_or(s.then_block),
            else_branch: else_branch.or(s.else_branch),
            span: s.span,
        }))
    }

    fn block(&self, block: &Block<'ast>) -> Option<Block<'ast>> {
        let stmts = self.stmts(block.stmts)?;
        Some(Block { stmts, ..*block })
    }

    fn import_path(&self, path: &ImportPath<'ast>) -> Option<ImportPath<'ast>> {
        if path.is_relative() {
            return None;
        }
        let suffix = self.matched_suffix(path.segments)?;
        let mut segments: Vec<Ident<'ast>> = self.replacement_idents(path.span);
        segments.extend_from_slice(suffix);
        Some(ImportPath {
            segments: self.arena.alloc_slice_copy(&segments),
            ..*path
        })
    }

    // =========================================
    // Expressions
    // =========================================

    fn expr(&self, expr: &'ast Expr<'ast>) -> Option<&'ast Expr<'ast>> {
        if let Some(chain) = expr.dotted_chain() {
            return self.chain(&chain);
        }

        let new = match *expr {
            Expr::Literal(_) | Expr::Ident(_) => return None,
            Expr::List(list) => {
                let items = self.exprs(list.items)?;
                Expr::List(self.arena.alloc(ListExpr { items, ..*list }))
            }
            Expr::Map(map) => {
                let keys: Vec<_> = map.entries.iter().map(|e| self.expr(e.key)).collect();
                let values: Vec<_> = map.entries.iter().map(|e| self.expr(e.value)).collect();
                if keys.iter().chain(&values).all(Option::is_none) {
                    return None;
                }
                let entries = self.arena.alloc_slice_fill_iter(
                    map.entries
                        .iter()
                        .zip(keys.into_iter().zip(values))
                        .map(|(orig, (key, value))| MapEntry {
                            key: key.unwrap_or(orig.key),
                            value: value.unwrap_or(orig.value),
                        }),
                );
                Expr::Map(self.arena.alloc(MapExpr { entries, ..*map }))
            }
            Expr::Member(member) => {
                let object = self.expr(member.object)?;
                Expr::Member(self.arena.alloc(MemberExpr { object, ..*member }))
            }
            Expr::Index(index) => {
                let object = self.expr(index.object);
                let idx = self.expr(index.index);
                if object.is_none() && idx.is_none() {
                    return None;
                }
                Expr::Index(self.arena.alloc(IndexExpr {
                    object: object.unwrap_or(index.object),
                    index: idx.unwrap_or(index.index),
                    span: index.span,
                }))
            }
            Expr::Call(call) => {
                let callee = self.expr(call.callee);
                let args = self.exprs(call.args);
                if callee.is_none() && args.is_none() {
                    return None;
                }
                Expr::Call(self.arena.alloc(CallExpr {
                    callee: callee.unwrap_or(call.callee),
                    args: args.unwrap_or(call.args),
                    span: call.span,
                }))
            }
            Expr::Unary(unary) => {
                let operand = self.expr(unary.operand)?;
                Expr::Unary(self.arena.alloc(UnaryExpr { operand, ..*unary }))
            }
            Expr::Binary(binary) => {
                let left = self.expr(binary.left);
                let right = self.expr(binary.right);
                if left.is_none() && right.is_none() {
                    return None;
                }
                Expr::Binary(self.arena.alloc(BinaryExpr {
                    left: left.unwrap_or(binary.left),
                    right: right.unwrap_or(binary.right),
                    ..*binary
                }))
            }
            Expr::Paren(paren) => {
                let inner = self.expr(paren.expr)?;
                Expr::Paren(self.arena.alloc(ParenExpr {
                    expr: inner,
                    ..*paren
                }))
            }
        };
        Some(self.arena.alloc(new))
    }

    fn exprs(&self, items: &'ast [&'ast Expr<'ast>]) -> Option<&'ast [&'ast Expr<'ast>]> {
        let rewritten: Vec<Option<&'ast Expr<'ast>>> =
            items.iter().map(|&e| self.expr(e)).collect();
        if rewritten.iter().all(Option::is_none) {
            return None;
        }
        Some(
            self.arena.alloc_slice_fill_iter(
                items
                    .iter()
                    .zip(rewritten)
                    .map(|(orig, new)| new.unwrap_or(*orig)),
            ),
        )
    }

    /// Rebuild a dotted chain whose leading segments match the search root.
    fn chain(&self, chain: &[Ident<'ast>]) -> Option<&'ast Expr<'ast>> {
        let suffix = self.matched_suffix(chain)?;
        let span = chain[0].span;
        let mut idents = self.replacement_idents(span).into_iter().chain(suffix.iter().copied());

        let first = idents.next()?;
        let mut expr: &'ast Expr<'ast> = self.arena.alloc(Expr::Ident(first));
        for member in idents {
            let span = expr.span().merge(member.span);
            expr = self.arena.alloc(Expr::Member(self.arena.alloc(MemberExpr {
                object: expr,
                member,
                span,
            })));
        }
        Some(expr)
    }

    // =========================================
    // Helpers
    // =========================================

    /// The part of `segments` below the search root, if they start with it.
    fn matched_suffix<'s>(&self, segments: &'s [Ident<'ast>]) -> Option<&'s [Ident<'ast>]> {
        let names: Vec<&str> = segments.iter().map(|s| s.name).collect();
        if self.search.is_prefix_of(&names) {
            Some(&segments[self.search.len()..])
        } else {
            None
        }
    }

    /// Arena-allocated identifiers spelling the replacement root.
    fn replacement_idents(&self, span: Span) -> Vec<Ident<'ast>> {
        self.replace
            .segments()
            .iter()
            .map(|seg| Ident::new(self.arena.alloc_str(seg), span))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> NamespacePath {
        NamespacePath::parse(s).unwrap()
    }

    fn chain_names(expr: &Expr<'_>) -> Vec<String> {
        expr.dotted_chain()
            .unwrap()
            .iter()
            .map(|i| i.name.to_string())
            .collect()
    }

    /// Callee chain of the expression statement at `index`.
    fn callee_chain(unit: &Unit<'_>, index: usize) -> Vec<String> {
        let Stmt::Expr(stmt) = unit.stmts()[index] else {
            panic!("expected expression statement");
        };
        let Expr::Call(call) = stmt.expr else {
            panic!("expected call");
        };
        chain_names(call.callee)
    }

    #[test]
    fn rewrites_imports_and_chains() {
        let arena = Bump::new();
        let out = rewrite_source(
            "import json; from json.decoder import x as y; json.dumps(1);",
            &p("json"),
            &p("json_sq"),
            &arena,
        )
        .unwrap();
        assert!(out.changed);
        let Stmt::Import(import) = out.unit.stmts()[0] else {
            panic!("expected import");
        };
        assert_eq!(import.path.to_string(), "json_sq");
        let Stmt::FromImport(from) = out.unit.stmts()[1] else {
            panic!("expected from-import");
        };
        assert_eq!(from.path.to_string(), "json_sq.decoder");
        assert_eq!(callee_chain(&out.unit, 2), ["json_sq", "dumps"]);
    }

    #[test]
    fn prefix_safety() {
        let arena = Bump::new();
        let source = "import json2; json2.dumps(1); jsonx.f();";
        let out = rewrite_source(source, &p("json"), &p("mnt"), &arena).unwrap();
        assert!(!out.changed);
    }

    #[test]
    fn multi_level_search_collapses_chain() {
        let arena = Bump::new();
        let out = rewrite_source("pkg.json.dumps(x); pkg.other(x);", &p("pkg.json"), &p("mnt"), &arena)
            .unwrap();
        assert!(out.changed);
        assert_eq!(callee_chain(&out.unit, 0), ["mnt", "dumps"]);
        assert_eq!(callee_chain(&out.unit, 1), ["pkg", "other"]);
    }

    #[test]
    fn multi_level_replace_expands_chain() {
        let arena = Bump::new();
        let out = rewrite_source("json.dumps(x);", &p("json"), &p("a.b"), &arena).unwrap();
        assert_eq!(callee_chain(&out.unit, 0), ["a", "b", "dumps"]);
    }

    #[test]
    fn relative_imports_untouched() {
        let arena = Bump::new();
        let out = rewrite_source("from .json import x; from . import json;", &p("json"), &p("m"), &arena)
            .unwrap();
        assert!(!out.changed);
    }

    #[test]
    fn unchanged_unit_is_shared() {
        let arena = Bump::new();
        let unit = Parser::parse("let a = 1; fn f() { return a; }", &arena).unwrap();
        let out = rewrite(&unit, &p("json"), &p("m"), &arena);
        assert!(!out.changed);
        assert!(std::ptr::eq(out.unit.stmts(), unit.stmts()));
    }

    #[test]
    fn unchanged_statements_are_shared() {
        let arena = Bump::new();
        let unit = Parser::parse("let a = [1, 2]; let b = json.x;", &arena).unwrap();
        let out = rewrite(&unit, &p("json"), &p("m"), &arena);
        assert!(out.changed);
        let (Stmt::Let(before), Stmt::Let(after)) = (unit.stmts()[0], out.unit.stmts()[0]) else {
            panic!("expected let statements");
        };
        assert!(std::ptr::eq(before.value, after.value));
    }

    #[test]
    fn rewrites_inside_nested_constructs() {
        let arena = Bump::new();
        let source = r#"
            fn f(xs) {
                for x in json.items(xs) {
                    if json.ok(x) { return [json.wrap(x)]; } else { g({"k": json.v}); }
                }
                while !json.done() { }
                return -json.n + (json.m * 2);
            }
        "#;
        let unit = Parser::parse(source, &arena).unwrap();
        let once = rewrite(&unit, &p("json"), &p("m"), &arena);
        assert!(once.changed);
        // Nothing is left to rewrite the second time round.
        let twice = rewrite(&once.unit, &p("json"), &p("m"), &arena);
        assert!(!twice.changed);
    }

    #[test]
    fn rewrites_compose_in_sequence() {
        let arena = Bump::new();
        let unit = Parser::parse("import json; json.dumps(1);", &arena).unwrap();
        let first = rewrite(&unit, &p("json"), &p("mnt"), &arena);
        let second = rewrite(&first.unit, &p("mnt"), &p("_wc_0"), &arena);
        assert!(second.changed);
        assert_eq!(callee_chain(&second.unit, 1), ["_wc_0", "dumps"]);
    }

    #[test]
    fn identity_rewrite_is_noop() {
        let arena = Bump::new();
        let unit = Parser::parse("import json;", &arena).unwrap();
        assert!(!rewrite(&unit, &p("json"), &p("json"), &arena).changed);
    }

    #[test]
    fn binding_names_are_not_references() {
        let arena = Bump::new();
        let out = rewrite_source("let json = 1; fn json(a) { }", &p("json"), &p("m"), &arena).unwrap();
        assert!(!out.changed);
    }

    #[test]
    fn malformed_source_surfaces_errors() {
        let arena = Bump::new();
        assert!(rewrite_source("import ;", &p("a"), &p("b"), &arena).is_err());
    }
}
