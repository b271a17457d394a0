use super::{
    ast,
    lexer::{Lexer, Token},
};
use codespan::{FileId, Files, Span};
use codespan_reporting::diagnostic::Diagnostic;

type Precedence = u8;

pub struct Parser<'a> {
    tokens: Vec<(Token, Span)>,
    current: usize,
    #[allow(dead_code)]
    files: &'a Files<String>,
    file_id: FileId,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Result<Self, Diagnostic<FileId>> {
        Ok(Self {
            tokens: lexer.tokens()?,
            current: 0,
            files: lexer.files,
            file_id: lexer.file_id,
        })
    }

    pub fn parse_program(&mut self) -> Result<ast::Program, Diagnostic<FileId>> {
        let mut body = Vec::new();
        while !self.is_at_end() {
            body.push(self.parse_stmt()?);
        }
        Ok(ast::Program { body })
    }

    fn parse_stmt(&mut self) -> Result<ast::Stmt, Diagnostic<FileId>> {
        let stmt = match self.peek_token() {
            Token::KwLet => ast::Stmt::VarDecl(self.parse_var_decl()?),
            Token::LBrace => ast::Stmt::Block(self.parse_block()?),
            Token::KwIf => ast::Stmt::If(self.parse_if()?),
            Token::KwWhile => self.parse_while()?,
            Token::KwFor => ast::Stmt::For(self.parse_for()?),
            Token::KwFunction => ast::Stmt::Function(self.parse_function()?),
            Token::KwClass => ast::Stmt::Class(self.parse_class()?),
            Token::KwReturn => self.parse_return()?,
            _ => {
                let expr = self.parse_expr()?;
                let span = expr.span();
                ast::Stmt::Expr(expr, span)
            }
        };

        // Block-shaped statements never take a trailing semicolon; for the
        // rest one is consumed when present but not required.
        let block_shaped = matches!(
            stmt,
            ast::Stmt::Block(_)
                | ast::Stmt::If(_)
                | ast::Stmt::While { .. }
                | ast::Stmt::For(_)
                | ast::Stmt::Function(_)
                | ast::Stmt::Class(_)
        );
        if !block_shaped && self.check(Token::Semi) {
            self.advance();
        }

        Ok(stmt)
    }

    fn parse_var_decl(&mut self) -> Result<ast::VarDecl, Diagnostic<FileId>> {
        let start_span = self.consume(Token::KwLet, "expected 'let'")?;
        let (name, name_span) = self.consume_ident()?;

        let init = if self.check(Token::Eq) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };

        let end = init.as_ref().map(|e| e.span().end()).unwrap_or_else(|| name_span.end());
        Ok(ast::VarDecl {
            name,
            init,
            span: Span::new(start_span.start(), end),
        })
    }

    fn parse_block(&mut self) -> Result<ast::Block, Diagnostic<FileId>> {
        let start_span = self.expect(Token::LBrace)?;
        let mut body = Vec::new();
        while !self.check(Token::RBrace) && !self.is_at_end() {
            body.push(self.parse_stmt()?);
        }
        let end_span = self.expect(Token::RBrace)?;
        Ok(ast::Block {
            body,
            span: Span::new(start_span.start(), end_span.end()),
        })
    }

    fn parse_if(&mut self) -> Result<ast::IfStmt, Diagnostic<FileId>> {
        let start_span = self.consume(Token::KwIf, "expected 'if'")?;
        self.expect(Token::LParen)?;
        let test = self.parse_expr()?;
        self.expect(Token::RParen)?;

        let consequent = self.parse_block()?;

        let alternate = if self.check(Token::KwElse) {
            self.advance();
            if self.check(Token::KwIf) {
                Some(Box::new(ast::ElseBranch::ElseIf(self.parse_if()?)))
            } else {
                Some(Box::new(ast::ElseBranch::Else(self.parse_block()?)))
            }
        } else {
            None
        };

        let end = match alternate.as_deref() {
            Some(ast::ElseBranch::ElseIf(else_if)) => else_if.span.end(),
            Some(ast::ElseBranch::Else(block)) => block.span.end(),
            None => consequent.span.end(),
        };

        Ok(ast::IfStmt {
            test,
            consequent,
            alternate,
            span: Span::new(start_span.start(), end),
        })
    }

    fn parse_while(&mut self) -> Result<ast::Stmt, Diagnostic<FileId>> {
        let start_span = self.consume(Token::KwWhile, "expected 'while'")?;
        self.expect(Token::LParen)?;
        let test = self.parse_expr()?;
        self.expect(Token::RParen)?;

        let body = self.parse_block()?;
        let span = Span::new(start_span.start(), body.span.end());

        Ok(ast::Stmt::While { test, body, span })
    }

    fn parse_for(&mut self) -> Result<ast::ForStmt, Diagnostic<FileId>> {
        let start_span = self.consume(Token::KwFor, "expected 'for'")?;
        self.expect(Token::LParen)?;

        let init = if self.check(Token::Semi) {
            None
        } else if self.check(Token::KwLet) {
            Some(ast::ForInit::VarDecl(self.parse_var_decl()?))
        } else {
            Some(ast::ForInit::Expr(self.parse_expr()?))
        };
        self.expect(Token::Semi)?;

        let test = if self.check(Token::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(Token::Semi)?;

        let update = if self.check(Token::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(Token::RParen)?;

        let body = self.parse_block()?;
        let span = Span::new(start_span.start(), body.span.end());

        Ok(ast::ForStmt {
            init,
            test,
            update,
            body,
            span,
        })
    }

    fn parse_function(&mut self) -> Result<ast::FunctionDecl, Diagnostic<FileId>> {
        let start_span = self.consume(Token::KwFunction, "expected 'function'")?;
        let (name, _) = self.consume_ident()?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        let span = Span::new(start_span.start(), body.span.end());

        Ok(ast::FunctionDecl {
            name,
            params,
            body,
            span,
        })
    }

    fn parse_class(&mut self) -> Result<ast::ClassDecl, Diagnostic<FileId>> {
        let start_span = self.consume(Token::KwClass, "expected 'class'")?;
        let (name, _) = self.consume_ident()?;
        self.expect(Token::LBrace)?;

        let mut body = Vec::new();
        while !self.check(Token::RBrace) && !self.is_at_end() {
            body.push(self.parse_method()?);
        }
        let end_span = self.expect(Token::RBrace)?;

        Ok(ast::ClassDecl {
            name,
            body,
            span: Span::new(start_span.start(), end_span.end()),
        })
    }

    fn parse_method(&mut self) -> Result<ast::MethodDef, Diagnostic<FileId>> {
        let (key, key_span) = if self.check(Token::KwConstructor) {
            let span = self.expect(Token::KwConstructor)?;
            ("constructor".to_string(), span)
        } else {
            self.consume_ident()?
        };
        // A method literally named `constructor` is the constructor even
        // when the keyword token was not produced.
        let kind = if key == "constructor" {
            ast::MethodKind::Constructor
        } else {
            ast::MethodKind::Method
        };

        let params = self.parse_params()?;
        let body = self.parse_block()?;
        let span = Span::new(key_span.start(), body.span.end());

        Ok(ast::MethodDef {
            key,
            kind,
            params,
            body,
            span,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<String>, Diagnostic<FileId>> {
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if !self.check(Token::RParen) {
            let (name, _) = self.consume_ident()?;
            params.push(name);
            while self.check(Token::Comma) {
                self.advance();
                let (name, _) = self.consume_ident()?;
                params.push(name);
            }
        }
        self.expect(Token::RParen)?;
        Ok(params)
    }

    fn parse_return(&mut self) -> Result<ast::Stmt, Diagnostic<FileId>> {
        let start_span = self.consume(Token::KwReturn, "expected 'return'")?;

        let argument = if self.check(Token::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };

        let end = argument
            .as_ref()
            .map(|e| e.span().end())
            .unwrap_or_else(|| start_span.end());

        Ok(ast::Stmt::Return {
            argument,
            span: Span::new(start_span.start(), end),
        })
    }

    fn parse_expr(&mut self) -> Result<ast::Expr, Diagnostic<FileId>> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<ast::Expr, Diagnostic<FileId>> {
        let left = self.parse_binary_expr(0)?;

        if self.check(Token::Eq) {
            if !matches!(left, ast::Expr::Ident(..) | ast::Expr::Member { .. }) {
                return self.error("invalid assignment target", left.span());
            }
            self.advance();
            // Right-associative: `a = b = c` parses as `a = (b = c)`.
            let right = self.parse_assignment()?;
            let span = Span::new(left.span().start(), right.span().end());
            return Ok(ast::Expr::Assign(Box::new(left), Box::new(right), span));
        }

        Ok(left)
    }

    /// Precedence climbing: consume operators binding strictly tighter than
    /// `min_prec`, recursing with the operator's own level on the right.
    fn parse_binary_expr(&mut self, min_prec: Precedence) -> Result<ast::Expr, Diagnostic<FileId>> {
        let mut left = self.parse_call_member(true)?;

        loop {
            let token = self.peek_token();
            let prec = Self::precedence(&token);
            if prec == 0 || prec <= min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary_expr(prec)?;
            let span = Span::new(left.span().start(), right.span().end());

            left = match token {
                Token::AndAnd => ast::Expr::Logical(
                    Box::new(left),
                    ast::LogicalOp::And,
                    Box::new(right),
                    span,
                ),
                Token::OrOr => ast::Expr::Logical(
                    Box::new(left),
                    ast::LogicalOp::Or,
                    Box::new(right),
                    span,
                ),
                _ => {
                    let op = match token {
                        Token::EqEq => ast::BinOp::Eq,
                        Token::NotEq => ast::BinOp::NotEq,
                        Token::Lt => ast::BinOp::Lt,
                        Token::Gt => ast::BinOp::Gt,
                        Token::LtEq => ast::BinOp::LtEq,
                        Token::GtEq => ast::BinOp::GtEq,
                        Token::Plus => ast::BinOp::Add,
                        Token::Minus => ast::BinOp::Sub,
                        Token::Star => ast::BinOp::Mul,
                        Token::Slash => ast::BinOp::Div,
                        _ => unreachable!(),
                    };
                    ast::Expr::Binary(Box::new(left), op, Box::new(right), span)
                }
            };
        }

        Ok(left)
    }

    fn precedence(token: &Token) -> Precedence {
        match token {
            Token::OrOr => 1,
            Token::AndAnd => 2,
            Token::EqEq
            | Token::NotEq
            | Token::Lt
            | Token::Gt
            | Token::LtEq
            | Token::GtEq => 3,
            Token::Plus | Token::Minus => 4,
            Token::Star | Token::Slash => 5,
            _ => 0,
        }
    }

    /// Postfix chain after a primary: calls, `[index]`, `.field`, applied
    /// left-associatively. `new` parses its callee with `allow_call` off so
    /// `new Foo.Bar()` does not swallow the argument list into the callee.
    fn parse_call_member(&mut self, allow_call: bool) -> Result<ast::Expr, Diagnostic<FileId>> {
        let mut expr = self.parse_primary()?;

        loop {
            if allow_call && self.check(Token::LParen) {
                let (args, end_span) = self.parse_call_args()?;
                let span = Span::new(expr.span().start(), end_span.end());
                expr = ast::Expr::Call {
                    callee: Box::new(expr),
                    args,
                    span,
                };
            } else if self.check(Token::LBracket) {
                self.advance();
                let property = self.parse_expr()?;
                let end_span = self.expect(Token::RBracket)?;
                let span = Span::new(expr.span().start(), end_span.end());
                expr = ast::Expr::Member {
                    object: Box::new(expr),
                    property: Box::new(property),
                    computed: true,
                    span,
                };
            } else if self.check(Token::Dot) {
                self.advance();
                let (name, name_span) = self.consume_ident()?;
                let span = Span::new(expr.span().start(), name_span.end());
                expr = ast::Expr::Member {
                    object: Box::new(expr),
                    property: Box::new(ast::Expr::Ident(name, name_span)),
                    computed: false,
                    span,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<(Vec<ast::Expr>, Span), Diagnostic<FileId>> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if !self.check(Token::RParen) {
            args.push(self.parse_expr()?);
            while self.check(Token::Comma) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }
        let rparen_span = self.expect(Token::RParen)?;
        Ok((args, rparen_span))
    }

    fn parse_primary(&mut self) -> Result<ast::Expr, Diagnostic<FileId>> {
        match self.peek_token() {
            // Unary operators bind tighter than any binary operator: the
            // argument is another primary, not a full expression, so a
            // following postfix chain wraps the unary node.
            Token::Minus | Token::Bang => {
                let (token, op_span) = self.advance().cloned().unwrap();
                let op = match token {
                    Token::Minus => ast::UnOp::Neg,
                    Token::Bang => ast::UnOp::Not,
                    _ => unreachable!(),
                };
                let argument = self.parse_primary()?;
                let span = Span::new(op_span.start(), argument.span().end());
                Ok(ast::Expr::Unary(op, Box::new(argument), span))
            }
            Token::Ident(_) => {
                let (name, span) = self.consume_ident()?;
                Ok(ast::Expr::Ident(name, span))
            }
            Token::Int(value) => {
                let span = self.peek_span();
                self.advance();
                Ok(ast::Expr::Int(value, span))
            }
            Token::Str(value) => {
                let span = self.peek_span();
                self.advance();
                Ok(ast::Expr::Str(value, span))
            }
            Token::KwTrue => {
                let span = self.peek_span();
                self.advance();
                Ok(ast::Expr::Bool(true, span))
            }
            Token::KwFalse => {
                let span = self.peek_span();
                self.advance();
                Ok(ast::Expr::Bool(false, span))
            }
            Token::KwThis => {
                let span = self.peek_span();
                self.advance();
                Ok(ast::Expr::This(span))
            }
            Token::KwFirst => {
                let start_span = self.peek_span();
                self.advance();
                let argument = self.parse_expr()?;
                let span = Span::new(start_span.start(), argument.span().end());
                Ok(ast::Expr::First(Box::new(argument), span))
            }
            Token::KwNew => self.parse_new(),
            Token::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::LBracket => self.parse_array(),
            Token::LBrace => self.parse_object(),
            token => self.error(
                &format!("unexpected primary expression: {:?}", token),
                self.peek_span(),
            ),
        }
    }

    fn parse_new(&mut self) -> Result<ast::Expr, Diagnostic<FileId>> {
        let start_span = self.consume(Token::KwNew, "expected 'new'")?;
        let callee = self.parse_call_member(false)?;

        // The argument list is optional: `new Foo` and `new Foo()` agree.
        let (args, end) = if self.check(Token::LParen) {
            let (args, rparen_span) = self.parse_call_args()?;
            (args, rparen_span.end())
        } else {
            (Vec::new(), callee.span().end())
        };

        Ok(ast::Expr::New {
            callee: Box::new(callee),
            args,
            span: Span::new(start_span.start(), end),
        })
    }

    fn parse_array(&mut self) -> Result<ast::Expr, Diagnostic<FileId>> {
        let start_span = self.expect(Token::LBracket)?;
        let mut elements = Vec::new();
        if !self.check(Token::RBracket) {
            elements.push(self.parse_expr()?);
            while self.check(Token::Comma) {
                self.advance();
                elements.push(self.parse_expr()?);
            }
        }
        let end_span = self.expect(Token::RBracket)?;
        Ok(ast::Expr::Array(
            elements,
            Span::new(start_span.start(), end_span.end()),
        ))
    }

    fn parse_object(&mut self) -> Result<ast::Expr, Diagnostic<FileId>> {
        let start_span = self.expect(Token::LBrace)?;
        let mut properties = Vec::new();
        if !self.check(Token::RBrace) {
            properties.push(self.parse_property()?);
            while self.check(Token::Comma) {
                self.advance();
                properties.push(self.parse_property()?);
            }
        }
        let end_span = self.expect(Token::RBrace)?;
        Ok(ast::Expr::Object(
            properties,
            Span::new(start_span.start(), end_span.end()),
        ))
    }

    fn parse_property(&mut self) -> Result<ast::Property, Diagnostic<FileId>> {
        let (key, key_span) = match self.peek_token() {
            Token::Ident(name) => {
                let span = self.peek_span();
                self.advance();
                (ast::PropertyKey::Ident(name), span)
            }
            Token::Str(value) => {
                let span = self.peek_span();
                self.advance();
                (ast::PropertyKey::Str(value), span)
            }
            token => {
                return self.error(
                    &format!("invalid property key: {:?}", token),
                    self.peek_span(),
                );
            }
        };

        self.expect(Token::Colon)?;
        let value = self.parse_expr()?;
        let span = Span::new(key_span.start(), value.span().end());

        Ok(ast::Property { key, value, span })
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn check(&self, token: Token) -> bool {
        matches!(self.peek(), Some((t, _)) if *t == token)
    }

    fn advance(&mut self) -> Option<&(Token, Span)> {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn previous(&self) -> Option<&(Token, Span)> {
        if self.current > 0 {
            self.tokens.get(self.current - 1)
        } else {
            None
        }
    }

    fn peek(&self) -> Option<&(Token, Span)> {
        self.tokens.get(self.current)
    }

    /// Past the end of the stream this keeps returning `Token::Error`, which
    /// no grammar rule accepts, so every loop terminates at EOF.
    fn peek_token(&self) -> Token {
        self.peek().map(|(t, _)| t.clone()).unwrap_or(Token::Error)
    }

    fn peek_span(&self) -> Span {
        self.peek()
            .map(|(_, s)| *s)
            .unwrap_or_else(|| self.eof_span())
    }

    fn eof_span(&self) -> Span {
        self.tokens
            .last()
            .map(|(_, s)| Span::new(s.end(), s.end()))
            .unwrap_or_else(|| Span::new(0, 0))
    }

    fn expect(&mut self, token: Token) -> Result<Span, Diagnostic<FileId>> {
        if self.check(token.clone()) {
            let span = self.peek().map(|(_, s)| *s).unwrap();
            self.advance();
            Ok(span)
        } else {
            self.error(
                &format!("expected {:?}, found {:?}", token, self.peek_token()),
                self.peek_span(),
            )
        }
    }

    fn consume(&mut self, expected: Token, err_msg: &str) -> Result<Span, Diagnostic<FileId>> {
        if self.check(expected) {
            let span = self.peek().map(|(_, s)| *s).unwrap();
            self.advance();
            Ok(span)
        } else {
            self.error(err_msg, self.peek_span())
        }
    }

    fn consume_ident(&mut self) -> Result<(String, Span), Diagnostic<FileId>> {
        match self.peek().cloned() {
            Some((Token::Ident(name), span)) => {
                self.advance();
                Ok((name, span))
            }
            Some((token, span)) => {
                self.error(&format!("expected identifier, found {:?}", token), span)
            }
            None => self.error("expected identifier, found end of input", self.eof_span()),
        }
    }

    fn error<T>(&self, message: &str, span: Span) -> Result<T, Diagnostic<FileId>> {
        Err(Diagnostic::error()
            .with_message(message)
            .with_labels(vec![codespan_reporting::diagnostic::Label::primary(
                self.file_id,
                span,
            )]))
    }
}
