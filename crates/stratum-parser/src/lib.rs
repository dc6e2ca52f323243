//! Stratum parser crate.
//!
//! Lexer, arena-allocated AST and parser for definition units, plus the
//! cross-reference [`rewrite`] pass that re-roots namespace references.
//!
//! # Example
//!
//! ```
//! use stratum_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! match Parser::parse("from json import dumps; let s = dumps([1, 2]);", &arena) {
//!     Ok(unit) => assert_eq!(unit.stmts().len(), 2),
//!     Err(errors) => panic!("parse errors: {errors}"),
//! }
//! ```

pub mod ast;
pub mod lexer;
pub mod rewrite;

pub use ast::{Parser, Unit};
pub use lexer::{Lexer, Token, TokenKind};
pub use rewrite::{Rewritten, rewrite, rewrite_source};
