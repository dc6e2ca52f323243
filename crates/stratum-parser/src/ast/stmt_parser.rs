//! Statement parsing functions.

use stratum_core::{ParseError, ParseErrorKind};

use super::parser::Parser;
use crate::ast::expr::Expr;
use crate::ast::stmt::*;
use crate::ast::{Ident, ImportPath};
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// Parse a statement, dispatching on the current token.
    pub fn parse_statement(&mut self) -> Result<Stmt<'ast>, ParseError> {
        match self.peek().kind {
            TokenKind::Import => self.parse_import(),
            TokenKind::From => self.parse_from_import(),
            TokenKind::Let => self.parse_let(),
            TokenKind::Fn => self.parse_function(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => Ok(Stmt::If(self.parse_if()?)),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            _ => self.parse_expr_or_assign(),
        }
    }

    // =========================================
    // Imports
    // =========================================

    /// Grammar: `'import' PATH ('as' IDENT)? ';'`
    fn parse_import(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Import)?.span;
        if self.check(TokenKind::Dot) {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedPath,
                self.peek().span,
                "relative imports must use `from . import name`",
            ));
        }
        let path = self.parse_import_path()?;
        let alias = if self.eat(TokenKind::As).is_some() {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt::Import(ImportStmt {
            path,
            alias,
            span: start.merge(end),
        }))
    }

    /// Grammar: `'from' PATH 'import' ITEM (',' ITEM)* ';'`
    fn parse_from_import(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::From)?.span;
        let path = self.parse_import_path()?;
        self.expect(TokenKind::Import)?;

        let mut names = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let alias = if self.eat(TokenKind::As).is_some() {
                Some(self.expect_ident()?)
            } else {
                None
            };
            names.push(ImportItem { name, alias });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt::FromImport(FromImportStmt {
            path,
            names: self.arena.alloc_slice_copy(&names),
            span: start.merge(end),
        }))
    }

    /// Grammar: `'.'* (IDENT ('.' IDENT)*)?`, with at least one of the two.
    fn parse_import_path(&mut self) -> Result<ImportPath<'ast>, ParseError> {
        let start = self.peek().span;
        let mut level = 0;
        while self.eat(TokenKind::Dot).is_some() {
            level += 1;
        }

        let mut segments = Vec::new();
        if level == 0 || self.check(TokenKind::Identifier) {
            segments.push(self.expect_ident().map_err(|e| {
                ParseError::new(ParseErrorKind::ExpectedPath, e.span, e.message)
            })?);
            while self.check(TokenKind::Dot) && self.peek_nth(1).kind == TokenKind::Identifier {
                self.advance();
                segments.push(self.expect_ident()?);
            }
        }

        let span = segments
            .last()
            .map_or(start, |last: &Ident<'ast>| start.merge(last.span));
        Ok(ImportPath {
            level,
            segments: self.arena.alloc_slice_copy(&segments),
            span,
        })
    }

    // =========================================
    // Bindings
    // =========================================

    /// Grammar: `'let' IDENT '=' EXPR ';'`
    fn parse_let(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Let)?.span;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Equal)?;
        let value = self.parse_expr(0)?;
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt::Let(LetStmt {
            name,
            value,
            span: start.merge(end),
        }))
    }

    /// An expression statement, or an assignment when the expression is a
    /// bare identifier followed by `=`.
    fn parse_expr_or_assign(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let expr = self.parse_expr(0)?;

        if self.eat(TokenKind::Equal).is_some() {
            let Expr::Ident(target) = *expr else {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidSyntax,
                    expr.span(),
                    "only plain names can be assigned to",
                ));
            };
            let value = self.parse_expr(0)?;
            let end = self.expect(TokenKind::Semicolon)?.span;
            return Ok(Stmt::Assign(AssignStmt {
                target,
                value,
                span: expr.span().merge(end),
            }));
        }

        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt::Expr(ExprStmt {
            expr,
            span: expr.span().merge(end),
        }))
    }

    // =========================================
    // Functions
    // =========================================

    /// Grammar: `'fn' IDENT '(' (IDENT (',' IDENT)* ','?)? ')' BLOCK`
    fn parse_function(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Fn)?.span;
        if self.function_depth > 0 {
            return Err(ParseError::new(
                ParseErrorKind::Misplaced,
                start,
                "functions can only be defined at the top level",
            ));
        }
        let name = self.expect_ident()?;

        self.expect(TokenKind::LeftParen)?;
        let mut params: Vec<Ident<'ast>> = Vec::new();
        while !self.check(TokenKind::RightParen) {
            let param = self.expect_ident()?;
            if params.iter().any(|p| p.name == param.name) {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidSyntax,
                    param.span,
                    format!("duplicate parameter `{}`", param.name),
                ));
            }
            params.push(param);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightParen)?;

        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        let body = body?;

        Ok(Stmt::Function(self.arena.alloc(FunctionDecl {
            name,
            params: self.arena.alloc_slice_copy(&params),
            body,
            span: start.merge(body.span),
        })))
    }

    /// Grammar: `'return' EXPR? ';'`
    fn parse_return(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Return)?.span;
        if self.function_depth == 0 {
            return Err(ParseError::new(
                ParseErrorKind::Misplaced,
                start,
                "`return` outside of a function",
            ));
        }
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr(0)?)
        };
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt::Return(ReturnStmt {
            value,
            span: start.merge(end),
        }))
    }

    // =========================================
    // Control flow
    // =========================================

    /// Grammar: `'if' EXPR BLOCK ('else' (IF | BLOCK))?`
    fn parse_if(&mut self) -> Result<&'ast IfStmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::If)?.span;
        let condition = self.parse_expr(0)?;
        let then_block = self.parse_block()?;
        let mut span = start.merge(then_block.span);

        let else_branch = if self.eat(TokenKind::Else).is_some() {
            if self.check(TokenKind::If) {
                let nested = self.parse_if()?;
                span = span.merge(nested.span);
                Some(ElseBranch::If(nested))
            } else {
                let block = self.parse_block()?;
                span = span.merge(block.span);
                Some(ElseBranch::Block(block))
            }
        } else {
            None
        };

        Ok(self.arena.alloc(IfStmt {
            condition,
            then_block,
            else_branch,
            span,
        }))
    }

    /// Grammar: `'while' EXPR BLOCK`
    fn parse_while(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::While)?.span;
        let condition = self.parse_expr(0)?;
        let body = self.parse_block()?;
        Ok(Stmt::While(self.arena.alloc(WhileStmt {
            condition,
            body,
            span: start.merge(body.span),
        })))
    }

    /// Grammar: `'for' IDENT 'in' EXPR BLOCK`
    fn parse_for(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::For)?.span;
        let var = self.expect_ident()?;
        self.expect(TokenKind::In)?;
        let iterable = self.parse_expr(0)?;
        let body = self.parse_block()?;
        Ok(Stmt::For(self.arena.alloc(ForStmt {
            var,
            iterable,
            body,
            span: start.merge(body.span),
        })))
    }

    /// Grammar: `'{' STMT* '}'`
    pub fn parse_block(&mut self) -> Result<Block<'ast>, ParseError> {
        let start = self.expect(TokenKind::LeftBrace)?.span;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            stmts.push(self.parse_statement()?);
        }
        let end = self.expect(TokenKind::RightBrace)?.span;
        Ok(Block {
            stmts: self.arena.alloc_slice_copy(&stmts),
            span: start.merge(end),
        })
    }
}
