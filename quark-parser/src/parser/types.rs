//! Type-name parsing: primitives, `T[]`, `T*` (arbitrary depth), and
//! named (struct) types. Spec.md §3 TypeInfo / §6 extern parameter types.

use super::Parser;
use crate::ParseError;
use quark_ast::TypeName;
use quark_lexer::Token;

impl<'a> Parser<'a> {
    /// Parses a base type name then any trailing `[]`/`*` suffixes, in
    /// the order written (`int[]*` = pointer to array of int).
    pub(crate) fn parse_type_name(&mut self) -> Result<TypeName, ParseError> {
        let mut ty = self.parse_base_type_name()?;
        loop {
            if self.match_token(&Token::LBracket) {
                self.consume(&Token::RBracket, "expected ']' to close array type")?;
                ty = TypeName::Array(Box::new(ty), None);
            } else if self.match_token(&Token::Star) {
                ty = TypeName::Pointer(Box::new(ty));
            } else {
                break;
            }
        }
        Ok(ty)
    }

    fn parse_base_type_name(&mut self) -> Result<TypeName, ParseError> {
        let tok = self.peek().cloned();
        match tok {
            Some(Token::Int) => {
                self.advance();
                Ok(TypeName::Int)
            }
            Some(Token::Float) => {
                self.advance();
                Ok(TypeName::Float)
            }
            Some(Token::Double) => {
                self.advance();
                Ok(TypeName::Double)
            }
            Some(Token::Bool) => {
                self.advance();
                Ok(TypeName::Bool)
            }
            Some(Token::Str) => {
                self.advance();
                Ok(TypeName::Str)
            }
            Some(Token::Void) => {
                self.advance();
                Ok(TypeName::Void)
            }
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(TypeName::Named(name))
            }
            _ => Err(self.error_here("E0001", "expected a type name")),
        }
    }

    /// True if the current position looks like the start of a type name
    /// (used to disambiguate a C-style cast `(int) x` from a parenthesized
    /// expression).
    pub(crate) fn at_type_name_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Int)
                | Some(Token::Float)
                | Some(Token::Double)
                | Some(Token::Bool)
                | Some(Token::Str)
                | Some(Token::Void)
                | Some(Token::Ident(_))
        )
    }
}
