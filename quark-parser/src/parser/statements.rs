//! Statement parsing:
//! keyword-directed dispatch, assignment-target disambiguation, and the
//! C-style-for-to-while desugaring.

use super::{merge_span, Parser};
use crate::ParseError;
use quark_ast::{AssignOp, Block, Expr, ExprKind, MatchArm, MatchPattern, Stmt, StmtKind};
use quark_diagnostics::{error_codes, Span};
use quark_lexer::Token;

impl<'a> Parser<'a> {
    /// Dispatches on the statement's leading token. Shared by top-level
    /// parsing and every block body (function/if/while/for/match arms).
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            Some(Token::Var) => self.parse_var_decl_stmt(),
            Some(Token::If) => self.parse_if_stmt(),
            Some(Token::While) => self.parse_while_stmt(),
            Some(Token::For) => self.parse_for_stmt(),
            Some(Token::Ret) => self.parse_return_stmt(),
            Some(Token::Match) => self.parse_match_stmt(),
            Some(Token::Break) => {
                let start = self.span_at_current();
                self.advance();
                self.consume(&Token::Semicolon, "expected ';' after 'break'")?;
                let end = self.span_at_previous();
                Ok(Stmt::new(StmtKind::Break, merge_span(&start, &end)))
            }
            Some(Token::Continue) => {
                let start = self.span_at_current();
                self.advance();
                self.consume(&Token::Semicolon, "expected ';' after 'continue'")?;
                let end = self.span_at_previous();
                Ok(Stmt::new(StmtKind::Continue, merge_span(&start, &end)))
            }
            _ => {
                if self.looks_like_type_leading_decl() {
                    self.parse_type_leading_statement()
                } else {
                    self.parse_expr_or_assignment_statement()
                }
            }
        }
    }

    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.span_at_current();
        self.consume(&Token::LBrace, "expected '{' to begin block")?;
        let mut statements = Vec::new();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.consume(&Token::RBrace, "expected '}' to close block")?;
        let end = self.span_at_previous();
        Ok(Block {
            statements,
            span: merge_span(&start, &end),
        })
    }

    fn parse_paren_expr(&mut self) -> Result<Expr, ParseError> {
        self.consume(&Token::LParen, "expected '(' to begin condition")?;
        let expr = self.parse_expression()?;
        self.consume(&Token::RParen, "expected ')' to close condition")?;
        Ok(expr)
    }

    fn parse_var_decl_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span_at_current();
        self.advance(); // 'var'
        let name = self.consume_ident("expected a variable name after 'var'")?;
        let declared_type = if self.match_token(&Token::Colon) {
            Some(self.parse_type_name()?)
        } else {
            None
        };
        let init = if self.match_token(&Token::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.consume(&Token::Semicolon, "expected ';' after variable declaration")?;
        let end = self.span_at_previous();
        Ok(Stmt::new(
            StmtKind::VarDecl { name, declared_type, init },
            merge_span(&start, &end),
        ))
    }

    /// A leading type keyword, or an identifier that parses as a type name
    /// and is itself followed by another identifier, starts either a typed
    /// variable declaration or a function definition.
    pub(crate) fn looks_like_type_leading_decl(&mut self) -> bool {
        if matches!(
            self.peek(),
            Some(Token::Int) | Some(Token::Float) | Some(Token::Double) | Some(Token::Bool) | Some(Token::Str) | Some(Token::Void)
        ) {
            return true;
        }
        if !matches!(self.peek(), Some(Token::Ident(_))) {
            return false;
        }
        let checkpoint = self.checkpoint();
        let looks_typed = self.parse_type_name().is_ok() && matches!(self.peek(), Some(Token::Ident(_)));
        self.restore(checkpoint);
        looks_typed
    }

    fn parse_type_leading_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span_at_current();
        let ty = self.parse_type_name()?;
        let name = self.consume_ident("expected a name after type")?;
        if self.check(&Token::LParen) {
            let func = self.parse_function_body_and_params(ty, name, None, start)?;
            let span = func.span.clone();
            Ok(Stmt::new(StmtKind::FunctionDef(func), span))
        } else {
            let init = if self.match_token(&Token::Eq) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.consume(&Token::Semicolon, "expected ';' after variable declaration")?;
            let end = self.span_at_previous();
            Ok(Stmt::new(
                StmtKind::VarDecl {
                    name,
                    declared_type: Some(ty),
                    init,
                },
                merge_span(&start, &end),
            ))
        }
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span_at_current();
        self.advance(); // 'if'
        let cond = self.parse_paren_expr()?;
        let body = self.parse_block()?;
        let mut branches = vec![(cond, body)];
        let mut else_branch = None;
        loop {
            if self.match_token(&Token::Elif) {
                let cond = self.parse_paren_expr()?;
                let body = self.parse_block()?;
                branches.push((cond, body));
            } else if self.match_token(&Token::Else) {
                else_branch = Some(self.parse_block()?);
                break;
            } else {
                break;
            }
        }
        let end = else_branch
            .as_ref()
            .map(|b: &Block| b.span.clone())
            .unwrap_or_else(|| branches.last().expect("if always has a primary branch").1.span.clone());
        Ok(Stmt::new(StmtKind::If { branches, else_branch }, merge_span(&start, &end)))
    }

    fn parse_while_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span_at_current();
        self.advance(); // 'while'
        let condition = self.parse_paren_expr()?;
        let body = self.parse_block()?;
        let end = body.span.clone();
        Ok(Stmt::new(StmtKind::While { condition, body }, merge_span(&start, &end)))
    }

    /// Two shapes share the `for (` prefix:
    /// `for (var i in range) { .. }` lowers directly to `ForRange`; the
    /// C-like `for (init; cond; incr) { .. }` desugars to
    /// `{ init; while (cond) { body; incr; } }`, keeping the loop variable
    /// scoped by wrapping the whole thing in a `Block`.
    fn parse_for_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span_at_current();
        self.advance(); // 'for'
        self.consume(&Token::LParen, "expected '(' after 'for'")?;

        if matches!(self.peek(), Some(Token::Var)) && self.looks_like_for_in() {
            self.advance(); // 'var'
            let var = self.consume_ident("expected a loop variable name")?;
            self.consume(&Token::In, "expected 'in' in for-loop")?;
            let range = self.parse_expression()?;
            self.consume(&Token::RParen, "expected ')' after for-loop range")?;
            let body = self.parse_block()?;
            let end = body.span.clone();
            return Ok(Stmt::new(StmtKind::ForRange { var, range, body }, merge_span(&start, &end)));
        }

        let init = self.parse_for_clause_stmt()?;
        let condition = if self.check(&Token::Semicolon) {
            Expr::new(ExprKind::Boolean(true), self.span_at_current())
        } else {
            self.parse_expression()?
        };
        self.consume(&Token::Semicolon, "expected ';' after loop condition")?;
        let incr = if self.check(&Token::RParen) { None } else { Some(self.parse_bare_assignment()?) };
        self.consume(&Token::RParen, "expected ')' after for-loop clauses")?;
        let mut body = self.parse_block()?;
        if let Some(incr_stmt) = incr {
            body.statements.push(incr_stmt);
        }
        let while_span = merge_span(&init.span.clone(), &body.span.clone());
        let while_stmt = Stmt::new(StmtKind::While { condition, body }, while_span.clone());
        Ok(Stmt::new(
            StmtKind::Block(Block {
                statements: vec![init, while_stmt],
                span: while_span.clone(),
            }),
            merge_span(&start, &while_span),
        ))
    }

    /// True if, after the `for (` already consumed, `var` is immediately
    /// followed by `ident in` (the range-for shape) rather than `ident =`
    /// (the C-like init shape).
    fn looks_like_for_in(&mut self) -> bool {
        let checkpoint = self.checkpoint();
        self.advance(); // 'var'
        let is_in = matches!(self.peek(), Some(Token::Ident(_))) && matches!(self.peek_at(1), Some(Token::In));
        self.restore(checkpoint);
        is_in
    }

    fn parse_for_clause_stmt(&mut self) -> Result<Stmt, ParseError> {
        if self.check(&Token::Var) {
            self.parse_var_decl_stmt()
        } else {
            self.parse_expr_or_assignment_statement()
        }
    }

    fn parse_match_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span_at_current();
        self.advance(); // 'match'
        let subject = self.parse_expression()?;
        self.consume(&Token::LBrace, "expected '{' to begin match body")?;
        let mut arms = Vec::new();
        while !self.check(&Token::RBrace) {
            let arm_start = self.span_at_current();
            let pattern = if matches!(self.peek(), Some(Token::Ident(name)) if name == "_") {
                self.advance();
                MatchPattern::Wildcard
            } else {
                MatchPattern::Literal(self.parse_expression()?)
            };
            self.consume(&Token::FatArrow, "expected '=>' after match pattern")?;
            let body = if self.check(&Token::LBrace) {
                self.parse_block()?
            } else {
                let expr = self.parse_expression()?;
                let span = expr.span.clone();
                Block {
                    statements: vec![Stmt::new(StmtKind::Expr(expr), span.clone())],
                    span,
                }
            };
            let arm_span = merge_span(&arm_start, &body.span.clone());
            arms.push(MatchArm { pattern, body, span: arm_span });
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.consume(&Token::RBrace, "expected '}' to close match body")?;
        let end = self.span_at_previous();
        Ok(Stmt::new(StmtKind::Match { subject, arms }, merge_span(&start, &end)))
    }

    fn parse_return_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span_at_current();
        self.advance(); // 'ret'
        let value = if self.check(&Token::Semicolon) { None } else { Some(self.parse_expression()?) };
        self.consume(&Token::Semicolon, "expected ';' after return statement")?;
        let end = self.span_at_previous();
        Ok(Stmt::new(StmtKind::Return(value), merge_span(&start, &end)))
    }

    fn match_assign_op(&mut self) -> Option<AssignOp> {
        let op = match self.peek() {
            Some(Token::Eq) => AssignOp::Assign,
            Some(Token::PlusEq) => AssignOp::AddAssign,
            Some(Token::MinusEq) => AssignOp::SubAssign,
            Some(Token::StarEq) => AssignOp::MulAssign,
            Some(Token::SlashEq) => AssignOp::DivAssign,
            Some(Token::PercentEq) => AssignOp::ModAssign,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    /// Builds the assignment statement matching `target`'s expression shape
    ///.
    /// Only bare-variable assignment supports the compound `+=`-style
    /// operators; the other three shapes carry no `op` field in the AST.
    fn build_assignment_stmt(&self, target: Expr, op: AssignOp, value: Expr, span: Span) -> Result<Stmt, ParseError> {
        match target.kind {
            ExprKind::Variable(name) => Ok(Stmt::new(StmtKind::Assign { name, op, value }, span)),
            ExprKind::FieldAccess { object, field } if op == AssignOp::Assign => {
                Ok(Stmt::new(StmtKind::MemberAssign { object: *object, field, value }, span))
            }
            ExprKind::Index { base, index } if op == AssignOp::Assign => {
                Ok(Stmt::new(StmtKind::ArrayAssign { array: *base, index: *index, value }, span))
            }
            ExprKind::Deref(inner) if op == AssignOp::Assign => {
                Ok(Stmt::new(StmtKind::DerefAssign { pointer: *inner, value }, span))
            }
            ExprKind::FieldAccess { .. } | ExprKind::Index { .. } | ExprKind::Deref(_) => Err(ParseError::Syntax {
                span,
                code: error_codes::INVALID_ASSIGNMENT,
                message: "compound assignment is only supported for plain variables".to_string(),
            }),
            _ => Err(ParseError::Syntax {
                span,
                code: error_codes::INVALID_ASSIGNMENT,
                message: "invalid assignment target".to_string(),
            }),
        }
    }

    /// An assignment with no trailing `;`, for a C-style for-loop's
    /// increment clause (`i += 1` immediately followed by `)`).
    fn parse_bare_assignment(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span_at_current();
        let target = self.parse_expression()?;
        let op = self
            .match_assign_op()
            .ok_or_else(|| self.error_here(error_codes::UNEXPECTED_TOKEN, "expected an assignment in for-loop increment"))?;
        let value = self.parse_expression()?;
        let end = self.span_at_previous();
        self.build_assignment_stmt(target, op, value, merge_span(&start, &end))
    }

    fn parse_expr_or_assignment_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span_at_current();
        let expr = self.parse_expression()?;
        let stmt = if let Some(op) = self.match_assign_op() {
            let value = self.parse_expression()?;
            let end = self.span_at_previous();
            self.build_assignment_stmt(expr, op, value, merge_span(&start, &end))?
        } else {
            let span = expr.span.clone();
            Stmt::new(StmtKind::Expr(expr), span)
        };
        self.consume(&Token::Semicolon, "expected ';' after statement")?;
        Ok(stmt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_fn_body(src: &str) -> Block {
        let wrapped = format!("int main() {{ {src} }}");
        let mut parser = Parser::new(&wrapped, "t.qk").unwrap();
        let program = parser.parse().unwrap();
        match &program.statements[0].kind {
            StmtKind::FunctionDef(f) => f.body.clone(),
            other => panic!("expected function def, got {other:?}"),
        }
    }

    #[test]
    fn var_decl_with_inference() {
        let block = parse_fn_body("var s = 0;");
        assert!(matches!(block.statements[0].kind, StmtKind::VarDecl { ref name, declared_type: None, init: Some(_) } if name == "s"));
    }

    #[test]
    fn for_range_desugars_to_for_range_stmt() {
        let block = parse_fn_body("for (var i in 0..5) { s += i; }");
        assert!(matches!(block.statements[0].kind, StmtKind::ForRange { ref var, .. } if var == "i"));
    }

    #[test]
    fn c_style_for_desugars_to_block_with_while() {
        let block = parse_fn_body("for (var i = 0; i < 5; i += 1) { s += i; }");
        match &block.statements[0].kind {
            StmtKind::Block(inner) => {
                assert_eq!(inner.statements.len(), 2);
                assert!(matches!(inner.statements[0].kind, StmtKind::VarDecl { .. }));
                match &inner.statements[1].kind {
                    StmtKind::While { body, .. } => assert_eq!(body.statements.len(), 2),
                    other => panic!("expected while, got {other:?}"),
                }
            }
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn match_with_wildcard() {
        let block = parse_fn_body(r#"match k { "a" => println("one"), _ => println("other") }"#);
        match &block.statements[0].kind {
            StmtKind::Match { arms, .. } => {
                assert_eq!(arms.len(), 2);
                assert!(matches!(arms[1].pattern, MatchPattern::Wildcard));
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn member_assign_target() {
        let block = parse_fn_body("a.x = 1;");
        assert!(matches!(block.statements[0].kind, StmtKind::MemberAssign { .. }));
    }
}
