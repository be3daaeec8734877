//! Expression parsing: Pratt-precedence binary/range operators, prefix unary/cast/address-of/dereference,
//! and postfix call/method-call/static-call/member-access/index.

use super::{merge_span, Parser, PREC_ADDITIVE, PREC_AND, PREC_COMPARISON, PREC_EQUALITY, PREC_MULTIPLICATIVE, PREC_OR, PREC_RANGE};
use crate::ParseError;
use quark_ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use quark_lexer::Token;

enum Op {
    Bin(BinaryOp),
    Range,
}

fn binary_op(tok: &Token) -> Option<(Op, u8)> {
    Some(match tok {
        Token::OrOr => (Op::Bin(BinaryOp::Or), PREC_OR),
        Token::AndAnd => (Op::Bin(BinaryOp::And), PREC_AND),
        Token::DotDot => (Op::Range, PREC_RANGE),
        Token::EqEq => (Op::Bin(BinaryOp::Eq), PREC_EQUALITY),
        Token::NotEq => (Op::Bin(BinaryOp::NotEq), PREC_EQUALITY),
        Token::Lt => (Op::Bin(BinaryOp::Lt), PREC_COMPARISON),
        Token::Gt => (Op::Bin(BinaryOp::Gt), PREC_COMPARISON),
        Token::LtEq => (Op::Bin(BinaryOp::Le), PREC_COMPARISON),
        Token::GtEq => (Op::Bin(BinaryOp::Ge), PREC_COMPARISON),
        Token::Plus => (Op::Bin(BinaryOp::Add), PREC_ADDITIVE),
        Token::Minus => (Op::Bin(BinaryOp::Sub), PREC_ADDITIVE),
        Token::Star => (Op::Bin(BinaryOp::Mul), PREC_MULTIPLICATIVE),
        Token::Slash => (Op::Bin(BinaryOp::Div), PREC_MULTIPLICATIVE),
        Token::Percent => (Op::Bin(BinaryOp::Mod), PREC_MULTIPLICATIVE),
        _ => return None,
    })
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some((op, prec)) = self.peek().and_then(binary_op) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            let start = lhs.span.clone();
            self.advance();
            let rhs = self.parse_binary(prec + 1)?;
            let end = self.span_at_previous();
            let span = merge_span(&start, &end);
            lhs = match op {
                Op::Range => Expr::new(
                    ExprKind::Range {
                        start: Box::new(lhs),
                        end: Box::new(rhs),
                    },
                    span,
                ),
                Op::Bin(op) => Expr::new(
                    ExprKind::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    span,
                ),
            };
        }
        Ok(lhs)
    }

    /// Unary `- ! & *` bind tighter than any binary operator. A parenthesized type name followed by a primary is a
    /// C-style cast, checked before falling back to a grouping paren.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.span_at_current();
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let operand = self.parse_unary()?;
                let span = merge_span(&start, &operand.span.clone());
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Neg,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            Some(Token::Bang) => {
                self.advance();
                let operand = self.parse_unary()?;
                let span = merge_span(&start, &operand.span.clone());
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            Some(Token::Amp) => {
                self.advance();
                let operand = self.parse_unary()?;
                let span = merge_span(&start, &operand.span.clone());
                Ok(Expr::new(ExprKind::AddressOf(Box::new(operand)), span))
            }
            Some(Token::Star) => {
                self.advance();
                let operand = self.parse_unary()?;
                let span = merge_span(&start, &operand.span.clone());
                Ok(Expr::new(ExprKind::Deref(Box::new(operand)), span))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    let name = self.consume_ident("expected a field or method name after '.'")?;
                    if self.check(&Token::LParen) {
                        let args = self.parse_call_args()?;
                        let end = self.span_at_previous();
                        let span = merge_span(&expr.span.clone(), &end);
                        expr = Expr::new(
                            ExprKind::MethodCall {
                                object: Box::new(expr),
                                method: name,
                                args,
                            },
                            span,
                        );
                    } else {
                        let end = self.span_at_previous();
                        let span = merge_span(&expr.span.clone(), &end);
                        expr = Expr::new(
                            ExprKind::FieldAccess {
                                object: Box::new(expr),
                                field: name,
                            },
                            span,
                        );
                    }
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.consume(&Token::RBracket, "expected ']' to close index expression")?;
                    let end = self.span_at_previous();
                    let span = merge_span(&expr.span.clone(), &end);
                    expr = Expr::new(
                        ExprKind::Index {
                            base: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.consume(&Token::LParen, "expected '(' to begin argument list")?;
        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        self.consume(&Token::RParen, "expected ')' to close argument list")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.span_at_current();
        match self.peek().cloned() {
            Some(Token::IntLiteral(v)) | Some(Token::FloatLiteral(v)) => {
                self.advance();
                Ok(Expr::new(ExprKind::Number(v), start))
            }
            Some(Token::StringLiteral(s)) => {
                self.advance();
                Ok(Expr::new(ExprKind::Str(s), start))
            }
            Some(Token::True) => {
                self.advance();
                Ok(Expr::new(ExprKind::Boolean(true), start))
            }
            Some(Token::False) => {
                self.advance();
                Ok(Expr::new(ExprKind::Boolean(false), start))
            }
            Some(Token::Null) => {
                self.advance();
                Ok(Expr::new(ExprKind::Null, start))
            }
            Some(Token::This) => {
                self.advance();
                Ok(Expr::new(ExprKind::This, start))
            }
            Some(Token::Ident(name)) => {
                self.advance();
                self.parse_ident_led_primary(name, start)
            }
            Some(Token::LParen) => self.parse_paren_or_cast(start),
            Some(Token::LBracket) => self.parse_array_literal(start),
            Some(Token::LBrace) => self.parse_map_literal(start),
            _ => Err(self.error_here("E0001", "expected an expression")),
        }
    }

    /// An identifier can lead a bare variable, a call `f(...)`, a static
    /// call `T::m(...)`, or a struct literal `T { field: v, ... }`.
    fn parse_ident_led_primary(&mut self, name: String, start: quark_diagnostics::Span) -> Result<Expr, ParseError> {
        if self.check(&Token::LParen) {
            let args = self.parse_call_args()?;
            let end = self.span_at_previous();
            return Ok(Expr::new(ExprKind::Call { callee: name, args }, merge_span(&start, &end)));
        }
        if self.check(&Token::ColonColon) {
            self.advance();
            let method = self.consume_ident("expected a method name after '::'")?;
            let args = self.parse_call_args()?;
            let end = self.span_at_previous();
            return Ok(Expr::new(
                ExprKind::StaticCall {
                    type_name: name,
                    method,
                    args,
                },
                merge_span(&start, &end),
            ));
        }
        if self.check(&Token::LBrace) {
            return self.parse_struct_literal(name, start);
        }
        Ok(Expr::new(ExprKind::Variable(name), start))
    }

    fn parse_struct_literal(&mut self, type_name: String, start: quark_diagnostics::Span) -> Result<Expr, ParseError> {
        self.consume(&Token::LBrace, "expected '{' to begin struct literal")?;
        let mut fields = Vec::new();
        if !self.check(&Token::RBrace) {
            loop {
                let field_name = self.consume_ident("expected a field name in struct literal")?;
                self.consume(&Token::Colon, "expected ':' after struct literal field name")?;
                let value = self.parse_expression()?;
                fields.push((field_name, value));
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        self.consume(&Token::RBrace, "expected '}' to close struct literal")?;
        let end = self.span_at_previous();
        Ok(Expr::new(ExprKind::StructLiteral { type_name, fields }, merge_span(&start, &end)))
    }

    fn parse_paren_or_cast(&mut self, start: quark_diagnostics::Span) -> Result<Expr, ParseError> {
        let checkpoint = self.checkpoint();
        self.advance(); // consume '('
        if self.at_type_name_start() {
            if let Ok(target) = self.parse_type_name() {
                if self.check(&Token::RParen) {
                    self.advance();
                    let operand = self.parse_unary()?;
                    let span = merge_span(&start, &operand.span.clone());
                    return Ok(Expr::new(ExprKind::Cast { target, expr: Box::new(operand) }, span));
                }
            }
            self.restore(checkpoint);
            self.advance(); // consume '(' again
        }
        let inner = self.parse_expression()?;
        self.consume(&Token::RParen, "expected ')' to close parenthesized expression")?;
        Ok(inner)
    }

    fn parse_array_literal(&mut self, start: quark_diagnostics::Span) -> Result<Expr, ParseError> {
        self.advance(); // consume '['
        let mut elements = Vec::new();
        if !self.check(&Token::RBracket) {
            loop {
                elements.push(self.parse_expression()?);
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        self.consume(&Token::RBracket, "expected ']' to close array literal")?;
        let end = self.span_at_previous();
        Ok(Expr::new(ExprKind::ArrayLiteral(elements), merge_span(&start, &end)))
    }

    fn parse_map_literal(&mut self, start: quark_diagnostics::Span) -> Result<Expr, ParseError> {
        self.advance(); // consume '{'
        let mut pairs = Vec::new();
        if !self.check(&Token::RBrace) {
            loop {
                let key = self.parse_expression()?;
                self.consume(&Token::Colon, "expected ':' between map key and value")?;
                let value = self.parse_expression()?;
                pairs.push((key, value));
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        self.consume(&Token::RBrace, "expected '}' to close map literal")?;
        let end = self.span_at_previous();
        Ok(Expr::new(ExprKind::MapLiteral(pairs), merge_span(&start, &end)))
    }
}
