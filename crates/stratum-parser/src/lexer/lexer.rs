//! Main lexer implementation.
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s using
//! direct dispatch on the first character. Lexemes are copied into the arena
//! so the source string can be freed after lexing completes.

use std::collections::VecDeque;

use bumpalo::Bump;
use stratum_core::{LexError, Span};

use super::cursor::{Cursor, Position, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer for definition-unit source text.
///
/// The `'src` lifetime is the source string being lexed (temporary).
/// The `'ast` lifetime is the arena where token lexemes are allocated.
pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
    lookahead: VecDeque<Token<'ast>>,
    errors: Vec<LexError>,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            lookahead: VecDeque::with_capacity(4),
            errors: Vec::new(),
        }
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'ast> {
        if let Some(token) = self.lookahead.pop_front() {
            return token;
        }
        self.scan_token()
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Token<'ast> {
        self.peek_nth(0)
    }

    /// Peek `n` tokens ahead (0 = next).
    pub fn peek_nth(&mut self, n: usize) -> Token<'ast> {
        while self.lookahead.len() <= n {
            let token = self.scan_token();
            self.lookahead.push_back(token);
        }
        self.lookahead[n]
    }

    /// Lex the whole input, ending with an `Eof` token.
    pub fn tokenize(mut self) -> (Vec<Token<'ast>>, Vec<LexError>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        (tokens, self.errors)
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    fn scan_token(&mut self) -> Token<'ast> {
        loop {
            self.skip_whitespace();

            let Some(c) = self.cursor.current() else {
                return self.make_eof();
            };

            let start = self.cursor.position();

            if c == '/' {
                match self.cursor.lookahead(1) {
                    Some('/') => {
                        self.skip_line_comment();
                        continue;
                    }
                    Some('*') => {
                        if let Some(error) = self.skip_block_comment(start) {
                            return self.make_error(error);
                        }
                        continue;
                    }
                    _ => {}
                }
            }

            return match c {
                '"' | '\'' => self.scan_string(c, start),
                c if c.is_ascii_digit() => self.scan_number(start),
                c if is_ident_start(c) => self.scan_identifier(start),
                _ => self.scan_operator(c, start),
            };
        }
    }

    fn skip_whitespace(&mut self) {
        self.cursor.bump_while(|c| c.is_whitespace());
    }

    fn skip_line_comment(&mut self) {
        self.cursor.bump_while(|c| c != '\n');
    }

    /// Skip `/* ... */`, returning an error if it never closes.
    fn skip_block_comment(&mut self, start: Position) -> Option<LexError> {
        self.cursor.bump();
        self.cursor.bump();
        loop {
            match self.cursor.bump() {
                None => {
                    return Some(LexError::UnterminatedComment {
                        span: self.cursor.span_from(start),
                    });
                }
                Some('*') if self.cursor.bump_if('/') => return None,
                Some(_) => {}
            }
        }
    }

    fn make_eof(&self) -> Token<'ast> {
        let at = self.cursor.position();
        let span = Span::point(at.line, at.col);
        Token::new(TokenKind::Eof, "", span)
    }

    /// Create a token from `start` to the current position, copying the
    /// lexeme into the arena.
    fn make_token(&self, kind: TokenKind, start: Position) -> Token<'ast> {
        let lexeme = self.arena.alloc_str(self.cursor.lexeme_from(start));
        Token::new(kind, lexeme, self.cursor.span_from(start))
    }

    fn make_error(&mut self, error: LexError) -> Token<'ast> {
        let span = error.span();
        self.errors.push(error);
        Token::new(TokenKind::Error, "", span)
    }

    // =========================================
    // Scanning: literals and identifiers
    // =========================================

    /// Scan a quoted string. The lexeme keeps its quotes and escapes; the
    /// parser decodes it.
    fn scan_string(&mut self, quote: char, start: Position) -> Token<'ast> {
        self.cursor.bump();
        loop {
            match self.cursor.current() {
                None | Some('\n') => {
                    let error = LexError::UnterminatedString {
                        span: self.cursor.span_from(start),
                    };
                    return self.make_error(error);
                }
                Some('\\') => {
                    self.cursor.bump();
                    if self.cursor.current().is_some_and(|c| c != '\n') {
                        self.cursor.bump();
                    }
                }
                Some(c) if c == quote => {
                    self.cursor.bump();
                    return self.make_token(TokenKind::StringLiteral, start);
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
    }

    fn scan_number(&mut self, start: Position) -> Token<'ast> {
        self.cursor.bump_while(|c| c.is_ascii_digit());
        let mut kind = TokenKind::IntLiteral;

        // A float needs a digit after the dot.
        let fraction = self.cursor.current() == Some('.')
            && self.cursor.lookahead(1).is_some_and(|c| c.is_ascii_digit());
        if fraction {
            self.cursor.bump();
            self.cursor.bump_while(|c| c.is_ascii_digit());
            kind = TokenKind::FloatLiteral;
        }

        if matches!(self.cursor.current(), Some('e' | 'E')) {
            let sign = matches!(self.cursor.lookahead(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.cursor.lookahead(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.cursor.bump();
                if sign {
                    self.cursor.bump();
                }
                self.cursor.bump_while(|c| c.is_ascii_digit());
                kind = TokenKind::FloatLiteral;
            }
        }

        if self.cursor.at(is_ident_start) {
            let bad = self.cursor.bump_while(is_ident_continue);
            let error = LexError::InvalidNumber {
                span: self.cursor.span_from(start),
                detail: format!("unexpected suffix `{bad}`"),
            };
            return self.make_error(error);
        }

        self.make_token(kind, start)
    }

    fn scan_identifier(&mut self, start: Position) -> Token<'ast> {
        let ident = self.cursor.bump_while(is_ident_continue);
        let kind = lookup_keyword(ident).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start)
    }

    // =========================================
    // Scanning: operators and punctuation
    // =========================================

    fn scan_operator(&mut self, c: char, start: Position) -> Token<'ast> {
        self.cursor.bump();
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '=' => self.pick('=', TokenKind::EqualEqual, TokenKind::Equal),
            '!' => self.pick('=', TokenKind::BangEqual, TokenKind::Bang),
            '<' => self.pick('=', TokenKind::LessEqual, TokenKind::Less),
            '>' => self.pick('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '&' if self.cursor.bump_if('&') => TokenKind::AmpAmp,
            '|' if self.cursor.bump_if('|') => TokenKind::PipePipe,
            other => {
                let error = LexError::UnexpectedChar {
                    ch: other,
                    span: self.cursor.span_from(start),
                };
                return self.make_error(error);
            }
        };
        self.make_token(kind, start)
    }

    /// `second` if the next character is `next` (consuming it), else `first`.
    fn pick(&mut self, next: char, second: TokenKind, first: TokenKind) -> TokenKind {
        if self.cursor.bump_if(next) { second } else { first }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let arena = Bump::new();
        let (tokens, errors) = Lexer::new(source, &arena).tokenize();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_import_statement() {
        use TokenKind::*;
        assert_eq!(
            kinds("import a.b as x;"),
            vec![Import, Identifier, Dot, Identifier, As, Identifier, Semicolon, Eof]
        );
    }

    #[test]
    fn lex_relative_from_import() {
        use TokenKind::*;
        assert_eq!(
            kinds("from ..sib import f"),
            vec![From, Dot, Dot, Identifier, Import, Identifier, Eof]
        );
    }

    #[test]
    fn lex_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("== != <= >= && || ! = < >"),
            vec![
                EqualEqual, BangEqual, LessEqual, GreaterEqual, AmpAmp, PipePipe, Bang, Equal,
                Less, Greater, Eof
            ]
        );
    }

    #[test]
    fn lex_numbers() {
        use TokenKind::*;
        assert_eq!(kinds("42 3.5 1e3 2.5E-2"), vec![IntLiteral, FloatLiteral, FloatLiteral, FloatLiteral, Eof]);
    }

    #[test]
    fn lex_skips_comments() {
        use TokenKind::*;
        assert_eq!(
            kinds("// line\nlet /* block\n comment */ x"),
            vec![Let, Identifier, Eof]
        );
    }

    #[test]
    fn lex_string_keeps_quotes() {
        let arena = Bump::new();
        let mut lexer = Lexer::new(r#"'a\'b' "c""#, &arena);
        assert_eq!(lexer.next_token().lexeme, r"'a\'b'");
        assert_eq!(lexer.next_token().lexeme, "\"c\"");
    }

    #[test]
    fn lex_spans_track_lines() {
        let arena = Bump::new();
        let mut lexer = Lexer::new("let\n  x", &arena);
        lexer.next_token();
        let x = lexer.next_token();
        assert_eq!(x.span, Span::new(2, 3, 1));
    }

    #[test]
    fn lex_peek_does_not_consume() {
        let arena = Bump::new();
        let mut lexer = Lexer::new("a b", &arena);
        assert_eq!(lexer.peek_nth(1).lexeme, "b");
        assert_eq!(lexer.next_token().lexeme, "a");
        assert_eq!(lexer.next_token().lexeme, "b");
    }

    #[test]
    fn lex_errors() {
        let arena = Bump::new();
        let (_, errors) = Lexer::new("\"open", &arena).tokenize();
        assert!(matches!(errors[0], LexError::UnterminatedString { .. }));

        let (_, errors) = Lexer::new("/* never closed", &arena).tokenize();
        assert!(matches!(errors[0], LexError::UnterminatedComment { .. }));

        let (tokens, errors) = Lexer::new("a # b", &arena).tokenize();
        assert!(matches!(errors[0], LexError::UnexpectedChar { ch: '#', .. }));
        assert_eq!(tokens[1].kind, TokenKind::Error);

        let (_, errors) = Lexer::new("12abc", &arena).tokenize();
        assert!(matches!(errors[0], LexError::InvalidNumber { .. }));
    }
}
