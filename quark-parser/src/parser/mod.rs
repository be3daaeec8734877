//! Recursive-descent parser: tokens -> AST.
//!
//! A thin cursor core here, with expression/statement/item/type parsing
//! in their own modules that extend `Parser` via separate `impl` blocks.

mod expressions;
mod items;
mod statements;
mod types;

/// An opaque cursor position saved before a speculative parse (used by the
/// cast-vs-parenthesized-expression disambiguation in `expressions.rs`).
pub(crate) struct Checkpoint(usize);

use crate::ParseError;
use quark_ast::*;
use quark_diagnostics::{error_codes, Span};
use quark_lexer::{Lexer, Token, TokenSpan};

/// Operator precedence levels. Higher binds tighter.
pub(crate) const PREC_OR: u8 = 5;
pub(crate) const PREC_AND: u8 = 10;
pub(crate) const PREC_RANGE: u8 = 12;
pub(crate) const PREC_EQUALITY: u8 = 15;
pub(crate) const PREC_COMPARISON: u8 = 17;
pub(crate) const PREC_ADDITIVE: u8 = 20;
pub(crate) const PREC_MULTIPLICATIVE: u8 = 30;

pub struct Parser<'a> {
    tokens: Vec<TokenSpan>,
    current: usize,
    file: String,
    source: &'a str,
}

impl<'a> Parser<'a> {
    /// `file` is the registered name used on every span this parser
    /// produces; it need not be a real path (tests use synthetic names).
    pub fn new(source: &'a str, file: impl Into<String>) -> Result<Self, ParseError> {
        let lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        for tok in lexer {
            tokens.push(tok.map_err(|e| ParseError::LexerError(format!("{e}")))?);
        }
        Ok(Self {
            tokens,
            current: 0,
            file: file.into(),
            source,
        })
    }

    /// Parses every top-level statement in this file. Does not resolve
    /// `import`; callers that need inlined imports should use
    /// [`crate::parse_program`] instead, which recurses through the
    /// source manager.
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.extend(self.parse_top_level_statement()?);
        }
        Ok(Program::new(statements))
    }

    // --- cursor helpers -------------------------------------------------

    pub(crate) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current).map(|t| &t.token)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset).map(|t| &t.token)
    }

    pub(crate) fn previous_span(&self) -> std::ops::Range<usize> {
        self.tokens
            .get(self.current.saturating_sub(1))
            .map(|t| t.span.clone())
            .unwrap_or(0..0)
    }

    pub(crate) fn current_byte_span(&self) -> std::ops::Range<usize> {
        self.tokens
            .get(self.current)
            .map(|t| t.span.clone())
            .unwrap_or_else(|| {
                let end = self.source.len();
                end..end
            })
    }

    pub(crate) fn check(&self, tok: &Token) -> bool {
        self.peek() == Some(tok)
    }

    pub(crate) fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.current).map(|t| t.token.clone());
        if !self.is_at_end() {
            self.current += 1;
        }
        tok
    }

    pub(crate) fn match_token(&mut self, tok: &Token) -> bool {
        if self.check(tok) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn consume(&mut self, tok: &Token, message: &str) -> Result<(), ParseError> {
        if self.check(tok) {
            self.advance();
            Ok(())
        } else {
            let code = missing_token_code(tok);
            Err(self.error_here(code, message))
        }
    }

    /// Consumes an identifier token, returning its text.
    /// Saves the current token position for a speculative parse.
    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.current)
    }

    /// Rewinds to a position saved by [`Parser::checkpoint`].
    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.current = checkpoint.0;
    }

    pub(crate) fn consume_ident(&mut self, message: &str) -> Result<String, ParseError> {
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_here("E0001", message)),
        }
    }

    // --- span / error helpers -------------------------------------------

    /// Builds a [`Span`] for the byte range `[start, end)`, computing the
    /// 1-based (line, column) of `start` directly from the source text.
    /// Every node's span must resolve inside this file.
    pub(crate) fn span_from(&self, start: usize, end: usize) -> Span {
        let mut line = 1usize;
        let mut col = 1usize;
        for (i, ch) in self.source.char_indices() {
            if i >= start {
                break;
            }
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        Span::new(self.file.clone(), line, col, end.saturating_sub(start).max(1))
    }

    pub(crate) fn span_at_current(&self) -> Span {
        let r = self.current_byte_span();
        self.span_from(r.start, r.end)
    }

    pub(crate) fn span_at_previous(&self) -> Span {
        let r = self.previous_span();
        self.span_from(r.start, r.end)
    }

    /// Raises a parse error at the current token with a fixed code:
    /// callers pick `E0002` for a missing semicolon, `E0007` for a
    /// missing brace, `E0001`/`E0006` otherwise.
    pub(crate) fn error_here(&self, code: &'static str, message: &str) -> ParseError {
        ParseError::Syntax {
            span: self.span_at_current(),
            code,
            message: message.to_string(),
        }
    }
}

/// Merges two spans produced by the same parser into the span covering
/// both, used to backdate a node's span to cover its full extent once its
/// last child has been parsed. Falls back to `start` for cross-line spans,
/// since diagnostics only ever render the start line anyway.
pub(crate) fn merge_span(start: &Span, end: &Span) -> Span {
    if start.file != end.file || end.line < start.line || (end.line == start.line && end.column < start.column) {
        return start.clone();
    }
    if start.line == end.line {
        let length = (end.column + end.length).saturating_sub(start.column).max(1);
        Span::new(start.file.clone(), start.line, start.column, length)
    } else {
        start.clone()
    }
}

fn missing_token_code(tok: &Token) -> &'static str {
    match tok {
        Token::Semicolon => error_codes::MISSING_SEMICOLON,
        Token::RBrace | Token::LBrace => error_codes::MISSING_BRACE,
        _ => error_codes::UNEXPECTED_TOKEN,
    }
}
