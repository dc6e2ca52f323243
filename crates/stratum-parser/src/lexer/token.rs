//! Token types for the definition-language lexer.

use std::fmt;

use stratum_core::Span;

/// A token from the source code.
///
/// The `'ast` lifetime refers to the arena where the lexeme is allocated, so
/// the source string can be dropped once lexing is done.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    pub kind: TokenKind,
    /// Source text of this token (allocated in the arena).
    pub lexeme: &'ast str,
    pub span: Span,
}

impl<'ast> Token<'ast> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {})", self.kind, self.lexeme, self.span)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// `42`
    IntLiteral,
    /// `3.14`, `1e10`
    FloatLiteral,
    /// `"hello"`, `'hello'`
    StringLiteral,

    Identifier,

    // =========================================
    // Keywords
    // =========================================
    Import,
    From,
    As,
    Let,
    Fn,
    Return,
    If,
    Else,
    While,
    For,
    In,
    True,
    False,
    Null,

    // =========================================
    // Operators
    // =========================================
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `!`
    Bang,
    /// `!=`
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,

    // =========================================
    // Delimiters
    // =========================================
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,
    Semicolon,

    // =========================================
    // Special
    // =========================================
    Eof,
    /// A lexing error was recorded for this position.
    Error,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Import | From | As | Let | Fn | Return | If | Else | While | For | In | True | False | Null
        )
    }

    /// Human-readable description used in diagnostics.
    pub fn description(self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "integer literal",
            FloatLiteral => "float literal",
            StringLiteral => "string literal",
            Identifier => "identifier",
            Import => "'import'",
            From => "'from'",
            As => "'as'",
            Let => "'let'",
            Fn => "'fn'",
            Return => "'return'",
            If => "'if'",
            Else => "'else'",
            While => "'while'",
            For => "'for'",
            In => "'in'",
            True => "'true'",
            False => "'false'",
            Null => "'null'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            Equal => "'='",
            EqualEqual => "'=='",
            Bang => "'!'",
            BangEqual => "'!='",
            Less => "'<'",
            LessEqual => "'<='",
            Greater => "'>'",
            GreaterEqual => "'>='",
            AmpAmp => "'&&'",
            PipePipe => "'||'",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            LeftBracket => "'['",
            RightBracket => "']'",
            Comma => "','",
            Dot => "'.'",
            Colon => "':'",
            Semicolon => "';'",
            Eof => "end of input",
            Error => "invalid token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Map an identifier to its keyword kind, if it is one.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "import" => TokenKind::Import,
        "from" => TokenKind::From,
        "as" => TokenKind::As,
        "let" => TokenKind::Let,
        "fn" => TokenKind::Fn,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup() {
        assert_eq!(lookup_keyword("import"), Some(TokenKind::Import));
        assert_eq!(lookup_keyword("fn"), Some(TokenKind::Fn));
        assert_eq!(lookup_keyword("imports"), None);
        assert!(TokenKind::Null.is_keyword());
        assert!(!TokenKind::Identifier.is_keyword());
    }

    #[test]
    fn token_debug_format() {
        let token = Token::new(TokenKind::Identifier, "json", Span::new(1, 8, 4));
        assert_eq!(format!("{token:?}"), "Identifier(\"json\" @ 1:8)");
    }
}
