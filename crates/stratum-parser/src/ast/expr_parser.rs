//! Expression parsing using Pratt parsing (precedence climbing).

use stratum_core::{ParseError, ParseErrorKind, Span};

use super::parser::Parser;
use crate::ast::expr::*;
use crate::ast::{BinaryOp, Ident, POSTFIX_BINDING_POWER, UnaryOp};
use crate::lexer::{Token, TokenKind};

impl<'ast> Parser<'ast> {
    /// Parse an expression with a minimum binding power.
    ///
    /// Only operators binding at least as tightly as `min_bp` are consumed.
    pub fn parse_expr(&mut self, min_bp: u8) -> Result<&'ast Expr<'ast>, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let kind = self.peek().kind;

            if matches!(kind, TokenKind::Dot | TokenKind::LeftParen | TokenKind::LeftBracket) {
                if POSTFIX_BINDING_POWER < min_bp {
                    break;
                }
                lhs = match kind {
                    TokenKind::Dot => self.parse_member_access(lhs)?,
                    TokenKind::LeftParen => self.parse_call(lhs)?,
                    _ => self.parse_index(lhs)?,
                };
                continue;
            }

            let Some(op) = BinaryOp::from_token(kind) else {
                break;
            };
            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(r_bp)?;
            let span = lhs.span().merge(rhs.span());
            lhs = self.arena.alloc(Expr::Binary(self.arena.alloc(BinaryExpr {
                left: lhs,
                op,
                right: rhs,
                span,
            })));
        }

        Ok(lhs)
    }

    /// Parse a prefix expression: literals, identifiers, unary operators,
    /// parenthesized expressions, list and map literals.
    fn parse_prefix(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let token = *self.peek();

        if let Some(op) = UnaryOp::from_token(token.kind) {
            self.advance();
            let operand = self.parse_expr(UnaryOp::binding_power())?;
            let span = token.span.merge(operand.span());
            return Ok(self.arena.alloc(Expr::Unary(self.arena.alloc(UnaryExpr {
                op,
                operand,
                span,
            }))));
        }

        let expr = match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::InvalidSyntax,
                        token.span,
                        format!("integer literal `{}` is out of range", token.lexeme),
                    )
                })?;
                literal(LiteralKind::Int(value), token.span)
            }
            TokenKind::FloatLiteral => {
                self.advance();
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::InvalidSyntax,
                        token.span,
                        format!("invalid float literal `{}`", token.lexeme),
                    )
                })?;
                literal(LiteralKind::Float(value), token.span)
            }
            TokenKind::StringLiteral => {
                self.advance();
                let text = self.arena.alloc_str(&unescape(token.lexeme));
                literal(LiteralKind::Str(text), token.span)
            }
            TokenKind::True => {
                self.advance();
                literal(LiteralKind::Bool(true), token.span)
            }
            TokenKind::False => {
                self.advance();
                literal(LiteralKind::Bool(false), token.span)
            }
            TokenKind::Null => {
                self.advance();
                literal(LiteralKind::Null, token.span)
            }
            TokenKind::Identifier => {
                self.advance();
                Expr::Ident(Ident::new(token.lexeme, token.span))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                let end = self.expect(TokenKind::RightParen)?;
                Expr::Paren(self.arena.alloc(ParenExpr {
                    expr: inner,
                    span: token.span.merge(end.span),
                }))
            }
            TokenKind::LeftBracket => return self.parse_list(),
            TokenKind::LeftBrace => return self.parse_map(),
            TokenKind::Eof => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedEof,
                    token.span,
                    "expected expression",
                ));
            }
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedExpression,
                    token.span,
                    format!("found {}", token.kind),
                ));
            }
        };

        Ok(self.arena.alloc(expr))
    }

    /// `object.member`
    fn parse_member_access(
        &mut self,
        object: &'ast Expr<'ast>,
    ) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::Dot)?;
        let name = self.expect_ident()?;
        let span = object.span().merge(name.span);
        Ok(self.arena.alloc(Expr::Member(self.arena.alloc(MemberExpr {
            object,
            member: name,
            span,
        }))))
    }

    /// `callee(args)`
    fn parse_call(&mut self, callee: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let (args, end) = self.parse_expr_list(TokenKind::RightParen)?;
        let span = callee.span().merge(end.span);
        Ok(self.arena.alloc(Expr::Call(self.arena.alloc(CallExpr {
            callee,
            args,
            span,
        }))))
    }

    /// `object[index]`
    fn parse_index(&mut self, object: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::LeftBracket)?;
        let index = self.parse_expr(0)?;
        let end = self.expect(TokenKind::RightBracket)?;
        let span = object.span().merge(end.span);
        Ok(self.arena.alloc(Expr::Index(self.arena.alloc(IndexExpr {
            object,
            index,
            span,
        }))))
    }

    /// `[a, b, c]`
    fn parse_list(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let start = self.expect(TokenKind::LeftBracket)?;
        let (items, end) = self.parse_expr_list(TokenKind::RightBracket)?;
        Ok(self.arena.alloc(Expr::List(self.arena.alloc(ListExpr {
            items,
            span: start.span.merge(end.span),
        }))))
    }

    /// `{key: value, ...}`
    fn parse_map(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let start = self.expect(TokenKind::LeftBrace)?;
        let mut entries = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            let key = self.parse_expr(0)?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr(0)?;
            entries.push(MapEntry { key, value });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let end = self.expect(TokenKind::RightBrace)?;
        Ok(self.arena.alloc(Expr::Map(self.arena.alloc(MapExpr {
            entries: self.arena.alloc_slice_copy(&entries),
            span: start.span.merge(end.span),
        }))))
    }

    /// Comma-separated expressions up to `close`, allowing a trailing comma.
    fn parse_expr_list(
        &mut self,
        close: TokenKind,
    ) -> Result<(&'ast [&'ast Expr<'ast>], Token<'ast>), ParseError> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.parse_expr(0)?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let end = self.expect(close)?;
        Ok((self.arena.alloc_slice_copy(&items), end))
    }

    pub(crate) fn expect_ident(&mut self) -> Result<Ident<'ast>, ParseError> {
        let token = *self.peek();
        if token.kind == TokenKind::Identifier {
            self.advance();
            return Ok(Ident::new(token.lexeme, token.span));
        }
        let message = if token.kind.is_keyword() {
            format!("{} is a reserved word", token.kind)
        } else {
            format!("found {}", token.kind)
        };
        Err(ParseError::new(
            ParseErrorKind::ExpectedIdentifier,
            token.span,
            message,
        ))
    }
}

fn literal(kind: LiteralKind<'_>, span: Span) -> Expr<'_> {
    Expr::Literal(LiteralExpr { kind, span })
}

/// Strip the quotes from a string lexeme and decode its escapes.
///
/// Unknown escapes are kept verbatim, backslash included.
fn unescape(lexeme: &str) -> String {
    let inner = &lexeme[1..lexeme.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;

    use super::*;

    fn parse<'a>(source: &str, arena: &'a Bump) -> &'a Expr<'a> {
        Parser::expression(source, arena).unwrap_or_else(|e| panic!("{source}: {e}"))
    }

    #[test]
    fn parse_int_literal() {
        let arena = Bump::new();
        let expr = parse("42", &arena);
        assert!(matches!(expr, Expr::Literal(LiteralExpr { kind: LiteralKind::Int(42), .. })));
    }

    #[test]
    fn parse_precedence() {
        let arena = Bump::new();
        let Expr::Binary(add) = parse("1 + 2 * 3", &arena) else {
            panic!("expected binary");
        };
        assert_eq!(add.op, BinaryOp::Add);
        assert!(matches!(add.right, Expr::Binary(mul) if mul.op == BinaryOp::Mul));
    }

    #[test]
    fn parse_left_associative() {
        let arena = Bump::new();
        let Expr::Binary(sub) = parse("10 - 4 - 3", &arena) else {
            panic!("expected binary");
        };
        assert!(matches!(sub.left, Expr::Binary(_)));
        assert!(matches!(sub.right, Expr::Literal(_)));
    }

    #[test]
    fn parse_logical_lower_than_comparison() {
        let arena = Bump::new();
        let Expr::Binary(or) = parse("a < b || c == d && !e", &arena) else {
            panic!("expected binary");
        };
        assert_eq!(or.op, BinaryOp::LogicalOr);
        assert!(matches!(or.right, Expr::Binary(and) if and.op == BinaryOp::LogicalAnd));
    }

    #[test]
    fn parse_unary_binds_tighter_than_binary() {
        let arena = Bump::new();
        let Expr::Binary(mul) = parse("-a * b", &arena) else {
            panic!("expected binary");
        };
        assert!(matches!(mul.left, Expr::Unary(u) if u.op == UnaryOp::Neg));
    }

    #[test]
    fn parse_member_call_chain() {
        let arena = Bump::new();
        let Expr::Call(call) = parse("pkg.json.dumps(x, 1)", &arena) else {
            panic!("expected call");
        };
        assert_eq!(call.args.len(), 2);
        let chain: Vec<&str> = call
            .callee
            .dotted_chain()
            .unwrap()
            .iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(chain, ["pkg", "json", "dumps"]);
    }

    #[test]
    fn dotted_chain_stops_at_calls() {
        let arena = Bump::new();
        assert!(parse("a.b().c", &arena).dotted_chain().is_none());
        assert!(parse("a[0]", &arena).dotted_chain().is_none());
    }

    #[test]
    fn parse_index() {
        let arena = Bump::new();
        assert!(matches!(parse("xs[i + 1]", &arena), Expr::Index(_)));
    }

    #[test]
    fn parse_list_and_map() {
        let arena = Bump::new();
        let Expr::List(list) = parse("[1, 'a', [],]", &arena) else {
            panic!("expected list");
        };
        assert_eq!(list.items.len(), 3);

        let Expr::Map(map) = parse(r#"{"k": "v", 1: null}"#, &arena) else {
            panic!("expected map");
        };
        assert_eq!(map.entries.len(), 2);
    }

    #[test]
    fn parse_string_escapes() {
        let arena = Bump::new();
        let expr = parse(r#""a\"b\n\t\\ \q""#, &arena);
        let Expr::Literal(LiteralExpr { kind: LiteralKind::Str(s), .. }) = expr else {
            panic!("expected string");
        };
        assert_eq!(*s, "a\"b\n\t\\ \\q");
    }

    #[test]
    fn parse_single_quoted_string() {
        let arena = Bump::new();
        let expr = parse(r#"'"'"#, &arena);
        assert!(matches!(expr, Expr::Literal(LiteralExpr { kind: LiteralKind::Str("\""), .. })));
    }

    #[test]
    fn parse_errors() {
        let arena = Bump::new();
        assert!(Parser::expression("1 +", &arena).is_err());
        assert!(Parser::expression("(1", &arena).is_err());
        assert!(Parser::expression("a.", &arena).is_err());
        assert!(Parser::expression("a b", &arena).is_err());
        assert!(Parser::expression("99999999999999999999", &arena).is_err());
    }
}
