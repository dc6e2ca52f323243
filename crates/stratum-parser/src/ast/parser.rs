//! Parser state and token-level helpers.
//!
//! Statement and expression parsing live in `stmt_parser` and `expr_parser`
//! as further `impl` blocks on [`Parser`].

use bumpalo::Bump;
use stratum_core::{ParseError, ParseErrorKind, ParseErrors};

use crate::ast::{Expr, Unit};
use crate::lexer::{Lexer, Token, TokenKind};

/// Recursive-descent parser producing an arena-allocated [`Unit`].
pub struct Parser<'ast> {
    tokens: Vec<Token<'ast>>,
    pos: usize,
    pub(crate) arena: &'ast Bump,
    errors: ParseErrors,
    /// Depth of enclosing function bodies; `fn` is only allowed at zero.
    pub(crate) function_depth: u32,
}

impl<'ast> Parser<'ast> {
    fn new(source: &str, arena: &'ast Bump) -> Self {
        let (tokens, lex_errors) = Lexer::new(source, arena).tokenize();
        let mut errors = ParseErrors::new();
        for error in lex_errors {
            errors.push(error.into());
        }
        Self {
            tokens,
            pos: 0,
            arena,
            errors,
            function_depth: 0,
        }
    }

    /// Parse a complete definition unit.
    ///
    /// Fails if any error was reported, including lexing errors.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(source: &str, arena: &'ast Bump) -> Result<Unit<'ast>, ParseErrors> {
        let (unit, errors) = Self::parse_lenient(source, arena);
        if errors.is_empty() {
            Ok(unit)
        } else {
            Err(errors)
        }
    }

    /// Parse a definition unit, recovering from errors at statement
    /// boundaries. Returns whatever parsed plus every error.
    pub fn parse_lenient(source: &str, arena: &'ast Bump) -> (Unit<'ast>, ParseErrors) {
        let mut parser = Self::new(source, arena);
        let start = parser.peek().span;
        let mut stmts = Vec::new();

        while !parser.is_eof() {
            match parser.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(error) => {
                    parser.errors.push(error);
                    parser.synchronize();
                }
            }
        }

        let span = start.merge(parser.peek().span);
        let unit = Unit::new(arena.alloc_slice_copy(&stmts), span);
        (unit, parser.errors)
    }

    /// Parse a single expression (the whole input must be consumed).
    pub fn expression(source: &str, arena: &'ast Bump) -> Result<&'ast Expr<'ast>, ParseErrors> {
        let mut parser = Self::new(source, arena);
        let result = parser.parse_expr(0).and_then(|expr| {
            parser.expect(TokenKind::Eof)?;
            Ok(expr)
        });
        match result {
            Ok(expr) if parser.errors.is_empty() => Ok(expr),
            Ok(_) => Err(parser.errors),
            Err(error) => {
                parser.errors.push(error);
                Err(parser.errors)
            }
        }
    }

    // =========================================
    // Token helpers
    // =========================================

    #[inline]
    pub(crate) fn peek(&self) -> &Token<'ast> {
        self.peek_nth(0)
    }

    /// The token `n` positions ahead; the trailing `Eof` repeats forever.
    pub(crate) fn peek_nth(&self, n: usize) -> &Token<'ast> {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    pub(crate) fn advance(&mut self) -> Token<'ast> {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    #[inline]
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    #[inline]
    pub(crate) fn is_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Consume the next token if it has the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume a token of the given kind or report what was found instead.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token<'ast>, ParseError> {
        if let Some(token) = self.eat(kind) {
            return Ok(token);
        }
        let found = *self.peek();
        let error_kind = if found.kind == TokenKind::Eof {
            ParseErrorKind::UnexpectedEof
        } else {
            ParseErrorKind::ExpectedToken
        };
        Err(ParseError::new(
            error_kind,
            found.span,
            format!("expected {}, found {}", kind, found.kind),
        ))
    }

    /// Skip to the next plausible statement start after an error.
    fn synchronize(&mut self) {
        // Always make progress.
        let first = self.advance();
        if matches!(first.kind, TokenKind::Semicolon | TokenKind::RightBrace) {
            return;
        }
        while !self.is_eof() {
            match self.peek().kind {
                TokenKind::Semicolon | TokenKind::RightBrace => {
                    self.advance();
                    return;
                }
                TokenKind::Import
                | TokenKind::From
                | TokenKind::Let
                | TokenKind::Fn
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}
