//! Abstract Syntax Tree (AST) for definition units.
//!
//! All nodes are allocated in a `bumpalo` arena and are `Copy`; a parsed
//! [`Unit`] stays valid for the lifetime of its arena.
//!
//! # Example
//!
//! ```
//! use stratum_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = r#"
//!     import json;
//!
//!     fn shout(s) {
//!         return json.dumps(s).upper();
//!     }
//! "#;
//!
//! let unit = Parser::parse(source, &arena).unwrap();
//! assert_eq!(unit.stmts().len(), 2);
//! ```

mod node;
mod ops;
mod parser;

pub mod expr;
mod expr_parser;

pub mod stmt;
mod stmt_parser;

pub use stratum_core::{ParseError, ParseErrorKind, ParseErrors};

pub use expr::*;
pub use node::*;
pub use ops::*;
pub use parser::Parser;
pub use stmt::*;

/// A parsed definition unit: its top-level statements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit<'ast> {
    stmts: &'ast [Stmt<'ast>],
    span: stratum_core::Span,
}

impl<'ast> Unit<'ast> {
    pub fn new(stmts: &'ast [Stmt<'ast>], span: stratum_core::Span) -> Self {
        Self { stmts, span }
    }

    pub fn stmts(&self) -> &'ast [Stmt<'ast>] {
        self.stmts
    }

    pub fn span(&self) -> stratum_core::Span {
        self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_unit() {
        let arena = bumpalo::Bump::new();
        let unit = Parser::parse("// nothing here\n", &arena).unwrap();
        assert!(unit.stmts().is_empty());
    }

    #[test]
    fn parse_complete_unit() {
        let arena = bumpalo::Bump::new();
        let source = r#"
            import json;
            from .helpers import quote as q, strip;

            let DEFAULTS = {"indent": null, "sort": false};

            fn dumps(value) {
                let text = json.dumps(value);
                if DEFAULTS["sort"] {
                    return q(text);
                }
                return strip(text.replace("\"", "'"));
            }
        "#;
        let unit = Parser::parse(source, &arena).unwrap();
        assert_eq!(unit.stmts().len(), 4);
    }

    #[test]
    fn parse_with_errors() {
        let arena = bumpalo::Bump::new();
        let errors = Parser::parse("let x = ;", &arena).unwrap_err();
        assert!(!errors.is_empty());
    }
}
