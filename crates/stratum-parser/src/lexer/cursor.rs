//! Character cursor for the lexer.

use stratum_core::Span;

/// A point in the source. Tokens remember the position they started at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Byte offset into the source.
    pub offset: usize,
    pub line: u32,
    /// Byte-based, starting at 1.
    pub col: u32,
}

pub struct Cursor<'src> {
    source: &'src str,
    pos: Position,
}

impl<'src> Cursor<'src> {
    /// A leading byte-order mark is not part of the text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source: source.strip_prefix('\u{FEFF}').unwrap_or(source),
            pos: Position {
                offset: 0,
                line: 1,
                col: 1,
            },
        }
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.pos
    }

    #[inline]
    fn rest(&self) -> &'src str {
        &self.source[self.pos.offset..]
    }

    #[inline]
    pub fn current(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The character `n` places after the current one.
    pub fn lookahead(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    #[inline]
    pub fn at(&self, pred: impl Fn(char) -> bool) -> bool {
        self.current().is_some_and(pred)
    }

    pub fn bump(&mut self) -> Option<char> {
        let ch = self.current()?;
        let width = ch.len_utf8();
        self.pos.offset += width;
        if ch == '\n' {
            self.pos.line += 1;
            self.pos.col = 1;
        } else {
            self.pos.col += width as u32;
        }
        Some(ch)
    }

    pub fn bump_if(&mut self, expected: char) -> bool {
        let hit = self.current() == Some(expected);
        if hit {
            self.bump();
        }
        hit
    }

    /// Consume a run of matching characters and return it.
    pub fn bump_while(&mut self, pred: impl Fn(char) -> bool) -> &'src str {
        let start = self.pos;
        while self.at(&pred) {
            self.bump();
        }
        self.lexeme_from(start)
    }

    pub fn lexeme_from(&self, start: Position) -> &'src str {
        &self.source[start.offset..self.pos.offset]
    }

    pub fn span_from(&self, start: Position) -> Span {
        Span::between((start.line, start.col), (self.pos.line, self.pos.col))
    }
}

#[inline]
pub fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_and_lexemes() {
        let mut cursor = Cursor::new("json.dumps");
        let start = cursor.position();
        assert_eq!(cursor.bump_while(is_ident_continue), "json");
        assert!(cursor.bump_if('.'));
        assert!(!cursor.bump_if('.'));
        cursor.bump_while(is_ident_continue);
        assert_eq!(cursor.lexeme_from(start), "json.dumps");
        assert_eq!(cursor.span_from(start), Span::new(1, 1, 10));
        assert_eq!(cursor.current(), None);
    }

    #[test]
    fn newlines_reset_the_column() {
        let mut cursor = Cursor::new("a\n  b");
        cursor.bump_while(|c| c != 'b');
        let at = cursor.position();
        assert_eq!((at.line, at.col, at.offset), (2, 3, 4));
    }

    #[test]
    fn lookahead_and_multibyte_text() {
        let mut cursor = Cursor::new("\u{FEFF}é=1");
        assert_eq!(cursor.lookahead(1), Some('='));
        cursor.bump();
        assert_eq!(cursor.position().col, 3);
        assert!(cursor.at(|c| c == '='));
    }
}
