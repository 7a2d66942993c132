//! Recursive-descent parser for Lux.
//!
//! One level per precedence tier, loosest binding first:
//! assignment, `||`, `&&`, `|`, `^`, `&`, equality, relational,
//! shifts, additive, multiplicative, unary, postfix, primary.

use crate::ast::{AssignOp, BinaryOp, Expr, Program, Stmt, TypeMember, UnaryOp};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, SpannedToken};
use crate::span::Span;
use crate::token::Token;

/// Parse a complete Lux program.
pub fn parse(source: &str) -> ParseResult<Program> {
    Parser::new(source)?.parse_program()
}

/// Lux parser.
#[derive(Debug)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Option<SpannedToken<'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> ParseResult<Self> {
        let mut parser = Self {
            lexer: Lexer::new(source),
            current: None,
        };
        parser.advance()?;
        Ok(parser)
    }

    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();
        while self.current.is_some() {
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }

    // ==================== token plumbing ====================

    fn advance(&mut self) -> ParseResult<()> {
        self.current = match self.lexer.next_token() {
            Some(result) => Some(result?),
            None => None,
        };
        Ok(())
    }

    fn current_kind(&self) -> Option<Token> {
        self.current.as_ref().map(|t| t.token)
    }

    fn current_span(&self) -> Span {
        match &self.current {
            Some(t) => t.span,
            None => self.lexer.eof_span(),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match &self.current {
            Some(t) => ParseError::unexpected_token(t.token.describe(), expected, t.span),
            None => ParseError::unexpected_eof(expected, self.lexer.eof_span()),
        }
    }

    fn check(&self, kind: Token) -> bool {
        self.current_kind() == Some(kind)
    }

    /// Consume the current token if it matches.
    fn eat(&mut self, kind: Token) -> ParseResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: Token, expected: &str) -> ParseResult<SpannedToken<'a>> {
        match self.current.take() {
            Some(t) if t.token == kind => {
                self.advance()?;
                Ok(t)
            }
            Some(t) => {
                let err = ParseError::unexpected_token(t.token.describe(), expected, t.span);
                self.current = Some(t);
                Err(err)
            }
            None => Err(ParseError::unexpected_eof(expected, self.lexer.eof_span())),
        }
    }

    fn expect_ident(&mut self, expected: &str) -> ParseResult<String> {
        let token = self.expect(Token::Ident, expected)?;
        Ok(token.text.to_string())
    }

    // ==================== statements ====================

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        match self.current_kind() {
            Some(Token::KwLet) | Some(Token::KwConst) => self.parse_let_statement(true),
            Some(Token::LBrace) => self.parse_block_statement(),
            Some(Token::KwIf) => self.parse_if_statement(),
            Some(Token::KwWhile) => self.parse_while_statement(),
            Some(Token::KwFor) => self.parse_for_statement(),
            Some(Token::KwBreak) => {
                self.advance()?;
                self.expect(Token::Semicolon, "';' after 'break'")?;
                Ok(Stmt::Break)
            }
            Some(Token::KwContinue) => {
                self.advance()?;
                self.expect(Token::Semicolon, "';' after 'continue'")?;
                Ok(Stmt::Continue)
            }
            Some(Token::KwReturn) => self.parse_return_statement(),
            Some(Token::KwFunc) => self.parse_func_statement(),
            Some(Token::KwType) => self.parse_type_statement(),
            Some(Token::KwMod) => self.parse_mod_statement(),
            Some(_) => {
                let expr = self.parse_expression()?;
                self.expect(Token::Semicolon, "';' after expression")?;
                Ok(Stmt::Expr(expr))
            }
            None => Err(self.unexpected("statement")),
        }
    }

    fn parse_let_statement(&mut self, consume_semicolon: bool) -> ParseResult<Stmt> {
        let span = self.current_span();
        // `const` is accepted as a synonym of `let`.
        self.advance()?;

        let mut names = vec![self.expect_ident("identifier after 'let'")?];
        while self.eat(Token::Comma)? {
            names.push(self.expect_ident("identifier after ','")?);
        }

        let init = if self.eat(Token::Assign)? {
            Some(self.parse_expression()?)
        } else {
            None
        };

        if names.len() > 1 && init.is_some() {
            return Err(ParseError::invalid_syntax(
                "an initializer requires a single declared identifier",
                span,
            ));
        }

        if consume_semicolon {
            self.expect(Token::Semicolon, "';' after declaration")?;
        }
        Ok(Stmt::Let { names, init })
    }

    fn parse_block_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(Token::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(Token::RBrace) {
            if self.current.is_none() {
                return Err(self.unexpected("'}' to close block"));
            }
            statements.push(self.parse_statement()?);
        }
        self.expect(Token::RBrace, "'}'")?;
        Ok(Stmt::Block(statements))
    }

    fn parse_if_statement(&mut self) -> ParseResult<Stmt> {
        self.advance()?; // `if` or `elif`
        self.expect(Token::LParen, "'(' after 'if'")?;
        let cond = self.parse_expression()?;
        self.expect(Token::RParen, "')' after condition")?;
        let body = Box::new(self.parse_statement()?);

        let else_body = match self.current_kind() {
            // `elif` chains parse as a nested `if` in the else slot.
            Some(Token::KwElif) => Some(Box::new(self.parse_if_statement()?)),
            Some(Token::KwElse) => {
                self.advance()?;
                Some(Box::new(self.parse_statement()?))
            }
            _ => None,
        };

        Ok(Stmt::If {
            cond,
            body,
            else_body,
        })
    }

    fn parse_while_statement(&mut self) -> ParseResult<Stmt> {
        self.advance()?;
        self.expect(Token::LParen, "'(' after 'while'")?;
        let cond = self.parse_expression()?;
        self.expect(Token::RParen, "')' after condition")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::While { cond, body })
    }

    fn parse_for_statement(&mut self) -> ParseResult<Stmt> {
        self.advance()?;
        self.expect(Token::LParen, "'(' after 'for'")?;

        let init = match self.current_kind() {
            Some(Token::KwLet) | Some(Token::KwConst) => self.parse_let_statement(true)?,
            _ => {
                let expr = self.parse_expression()?;
                self.expect(Token::Semicolon, "';' after loop initializer")?;
                Stmt::Expr(expr)
            }
        };

        let cond = self.parse_expression()?;
        self.expect(Token::Semicolon, "';' after loop condition")?;

        let update = Stmt::Expr(self.parse_expression()?);
        self.expect(Token::RParen, "')' after loop update")?;

        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For {
            init: Box::new(init),
            cond,
            update: Box::new(update),
            body,
        })
    }

    fn parse_return_statement(&mut self) -> ParseResult<Stmt> {
        self.advance()?;
        if self.eat(Token::Semicolon)? {
            return Ok(Stmt::Return { value: None });
        }
        let value = self.parse_expression()?;
        self.expect(Token::Semicolon, "';' after return value")?;
        Ok(Stmt::Return { value: Some(value) })
    }

    fn parse_func_statement(&mut self) -> ParseResult<Stmt> {
        self.advance()?;
        let name = self.expect_ident("function name")?;
        let params = self.parse_parameter_list()?;

        // Forward declaration: `func name(params);`
        if self.eat(Token::Semicolon)? {
            return Ok(Stmt::Func {
                name,
                params,
                body: None,
            });
        }

        let body = self.parse_brace_body()?;
        Ok(Stmt::Func {
            name,
            params,
            body: Some(body),
        })
    }

    fn parse_parameter_list(&mut self) -> ParseResult<Vec<String>> {
        self.expect(Token::LParen, "'(' before parameters")?;
        let mut params = Vec::new();
        if !self.check(Token::RParen) {
            params.push(self.expect_ident("parameter name")?);
            while self.eat(Token::Comma)? {
                params.push(self.expect_ident("parameter name")?);
            }
        }
        self.expect(Token::RParen, "')' after parameters")?;
        Ok(params)
    }

    fn parse_brace_body(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(Token::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(Token::RBrace) {
            if self.current.is_none() {
                return Err(self.unexpected("'}' to close body"));
            }
            statements.push(self.parse_statement()?);
        }
        self.expect(Token::RBrace, "'}'")?;
        Ok(statements)
    }

    fn parse_type_statement(&mut self) -> ParseResult<Stmt> {
        self.advance()?;
        let name = self.expect_ident("type name")?;
        self.expect(Token::LBrace, "'{' after type name")?;

        let mut members = Vec::new();
        loop {
            match self.current_kind() {
                Some(Token::RBrace) => break,
                Some(Token::KwField) => {
                    self.advance()?;
                    let field_name = self.expect_ident("field name")?;
                    self.expect(Token::Colon, "':' after field name")?;
                    let ty = self.parse_expression()?;
                    self.expect(Token::Semicolon, "';' after field declaration")?;
                    members.push(TypeMember::Field {
                        name: field_name,
                        ty,
                    });
                }
                Some(Token::KwMethod) => {
                    self.advance()?;
                    let method_name = self.expect_ident("method name")?;
                    let params = self.parse_parameter_list()?;
                    let body = self.parse_brace_body()?;
                    members.push(TypeMember::Method {
                        name: method_name,
                        params,
                        body,
                    });
                }
                _ => return Err(self.unexpected("'field', 'method' or '}'")),
            }
        }
        self.expect(Token::RBrace, "'}'")?;
        Ok(Stmt::TypeDecl { name, members })
    }

    fn parse_mod_statement(&mut self) -> ParseResult<Stmt> {
        self.advance()?;
        let name = self.expect_ident("module name")?;
        let body = self.parse_brace_body()?;
        Ok(Stmt::ModDecl { name, body })
    }

    // ==================== expressions ====================

    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let left = self.parse_logical_or()?;

        let op = match self.current_kind() {
            Some(Token::Assign) => AssignOp::Assign,
            Some(Token::PlusEq) => AssignOp::AddAssign,
            Some(Token::MinusEq) => AssignOp::SubAssign,
            _ => return Ok(left),
        };
        self.advance()?;

        // Right-associative: `a = b = c` parses as `a = (b = c)`.
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(left),
            value: Box::new(value),
        })
    }

    fn parse_logical_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_logical_and()?;
        while self.eat(Token::PipePipe)? {
            let right = self.parse_logical_and()?;
            left = binary(BinaryOp::LogicalOr, left, right);
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_bitwise_or()?;
        while self.eat(Token::AmpAmp)? {
            let right = self.parse_bitwise_or()?;
            left = binary(BinaryOp::LogicalAnd, left, right);
        }
        Ok(left)
    }

    fn parse_bitwise_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_bitwise_xor()?;
        while self.eat(Token::Pipe)? {
            let right = self.parse_bitwise_xor()?;
            left = binary(BinaryOp::BitOr, left, right);
        }
        Ok(left)
    }

    fn parse_bitwise_xor(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_bitwise_and()?;
        while self.eat(Token::Caret)? {
            let right = self.parse_bitwise_and()?;
            left = binary(BinaryOp::BitXor, left, right);
        }
        Ok(left)
    }

    fn parse_bitwise_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(Token::Amp)? {
            let right = self.parse_equality()?;
            left = binary(BinaryOp::BitAnd, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.current_kind() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_shift()?;
        loop {
            let op = match self.current_kind() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_shift()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current_kind() {
                Some(Token::Shl) => BinaryOp::Shl,
                Some(Token::Shr) => BinaryOp::Shr,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_kind() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current_kind() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.current_kind() {
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Plus) => Some(UnaryOp::Pos),
            Some(Token::Bang) => Some(UnaryOp::LogicalNot),
            Some(Token::Tilde) => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance()?;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current_kind() {
                Some(Token::Dot) => {
                    self.advance()?;
                    let member = self.expect_ident("member name after '.'")?;
                    if self.check(Token::LParen) {
                        let args = self.parse_call_args()?;
                        expr = Expr::MethodCall {
                            object: Box::new(expr),
                            method: member,
                            args,
                        };
                    } else {
                        expr = Expr::Member {
                            object: Box::new(expr),
                            member,
                        };
                    }
                }
                Some(Token::LParen) => {
                    let args = self.parse_call_args()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                // Initializer list after a type expression.
                Some(Token::LBrace) if matches!(expr, Expr::Ident(_) | Expr::Member { .. }) => {
                    self.advance()?;
                    let fields = self.parse_init_fields()?;
                    expr = Expr::InitList {
                        type_expr: Some(Box::new(expr)),
                        fields,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(Token::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.check(Token::RParen) {
            args.push(self.parse_expression()?);
            while self.eat(Token::Comma)? {
                args.push(self.parse_expression()?);
            }
        }
        self.expect(Token::RParen, "')' after arguments")?;
        Ok(args)
    }

    /// Body of an initializer list, after the opening brace.
    fn parse_init_fields(&mut self) -> ParseResult<Vec<(String, Expr)>> {
        let mut fields = Vec::new();
        while !self.check(Token::RBrace) {
            let name = self.expect_ident("field name in initializer list")?;
            self.expect(Token::Assign, "'=' in initializer list")?;
            let value = self.parse_expression()?;
            fields.push((name, value));
            if !self.eat(Token::Comma)? {
                break;
            }
        }
        self.expect(Token::RBrace, "'}' to close initializer list")?;
        Ok(fields)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let Some(token) = self.current.take() else {
            return Err(ParseError::unexpected_eof(
                "expression",
                self.lexer.eof_span(),
            ));
        };

        match token.token {
            Token::Number => {
                let text = token.text;
                let span = token.span;
                self.advance()?;
                parse_number(text, span)
            }
            Token::DoubleQuote => {
                let value = token.decoded.clone().unwrap_or_default();
                self.advance()?;
                Ok(Expr::Str(value))
            }
            Token::KwTrue => {
                self.advance()?;
                Ok(Expr::Bool(true))
            }
            Token::KwFalse => {
                self.advance()?;
                Ok(Expr::Bool(false))
            }
            Token::KwNull => {
                self.advance()?;
                Ok(Expr::Null)
            }
            Token::Ident => {
                let name = token.text.to_string();
                self.advance()?;
                Ok(Expr::Ident(name))
            }
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(expr)
            }
            Token::KwUse => {
                self.advance()?;
                let literal = self.expect(Token::DoubleQuote, "module path string")?;
                let path = literal.decoded.unwrap_or_default();
                Ok(Expr::Import { path })
            }
            Token::LBrace => {
                // Anonymous initializer list.
                self.advance()?;
                let fields = self.parse_init_fields()?;
                Ok(Expr::InitList {
                    type_expr: None,
                    fields,
                })
            }
            _ => {
                let err =
                    ParseError::unexpected_token(token.token.describe(), "expression", token.span);
                self.current = Some(token);
                Err(err)
            }
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn parse_number(text: &str, span: Span) -> ParseResult<Expr> {
    let invalid = || ParseError::InvalidNumber {
        literal: text.to_string(),
        span,
    };

    if let Some(stripped) = text.strip_suffix('f') {
        return stripped.parse::<f64>().map(Expr::Float).map_err(|_| invalid());
    }
    if text.contains('.') || text.contains('e') || text.contains('E') {
        return text.parse::<f64>().map(Expr::Float).map_err(|_| invalid());
    }
    text.parse::<i64>().map(Expr::Int).map_err(|_| invalid())
}
