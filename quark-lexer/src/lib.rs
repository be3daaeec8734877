//! Byte stream -> token stream.
//!
//! Greedy longest-match via `logos`. Every token carries the byte range
//! it was lexed from; the parser turns that range into a [`Span`] once it
//! knows which file is being parsed.

use logos::Logos;

/// Unescape a string literal body (no surrounding quotes) with C-style
/// escapes: `\n \r \t \\ \" \0` plus `\xHH`.
fn unescape_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('0') => result.push('\0'),
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    result.push(byte as char);
                }
            }
            Some(c) => {
                result.push('\\');
                result.push(c);
            }
            None => result.push('\\'),
        }
    }

    result
}

/// A numeric literal's lexical classification, computed once here so the
/// analyzer's "integer fast path" never has to re-parse literal text.
fn number_value(lex: &mut logos::Lexer<Token>) -> f64 {
    lex.slice().parse().unwrap_or(f64::NAN)
}

/// The reserved word / keyword / operator / literal vocabulary of Quark.
/// `numberValue` is precomputed for numeric literals.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum Token {
    // Keywords
    #[token("var")]
    Var,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("ret")]
    Ret,
    #[token("struct")]
    Struct,
    #[token("data")]
    Data,
    #[token("impl")]
    Impl,
    #[token("extend")]
    Extend,
    #[token("extern")]
    Extern,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("this")]
    This,
    #[token("match")]
    Match,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("import")]
    Import,

    // Primitive type keywords
    #[token("int")]
    Int,
    #[token("str")]
    Str,
    #[token("bool")]
    Bool,
    #[token("float")]
    Float,
    #[token("double")]
    Double,
    #[token("void")]
    Void,

    // Literals
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", number_value)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", number_value)]
    FloatLiteral(f64),

    #[regex(r"[0-9]+", number_value)]
    IntLiteral(f64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1])
    })]
    StringLiteral(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,
    #[token("&")]
    Amp,

    #[token("=")]
    Eq,

    // Delimiters & punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("::")]
    ColonColon,
    #[token(";")]
    Semicolon,
    #[token("...")]
    DotDotDot,
    #[token("..")]
    DotDot,
    #[token(".")]
    Dot,
    #[token("=>")]
    FatArrow,
}

impl Token {
    /// True for the fixed keyword/reserved-word set,
    /// used by the fuzzy-suggestion filter to exclude them as candidates.
    pub fn is_reserved_word(&self) -> bool {
        !matches!(
            self,
            Token::Ident(_) | Token::IntLiteral(_) | Token::FloatLiteral(_) | Token::StringLiteral(_)
        )
    }
}

/// A lexed token plus the byte range it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}

/// Thin iterator wrapper over `logos::Lexer` producing [`TokenSpan`]s.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
        }
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<TokenSpan, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.inner.next()?;
        let span = self.inner.span();

        match token {
            Ok(tok) => Some(Ok(TokenSpan { token: tok, span })),
            Err(()) => Some(Err(LexError::InvalidToken { span })),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LexError {
    #[error("invalid token at byte range {span:?}")]
    InvalidToken { span: std::ops::Range<usize> },
}

impl LexError {
    pub fn span(&self) -> std::ops::Range<usize> {
        match self {
            LexError::InvalidToken { span } => span.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        Lexer::new(source).map(|r| r.unwrap().token).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            tokens("var x struct impl ret"),
            vec![
                Token::Var,
                Token::Ident("x".to_string()),
                Token::Struct,
                Token::Impl,
                Token::Ret,
            ]
        );
    }

    #[test]
    fn integer_and_float_literals() {
        assert_eq!(tokens("42"), vec![Token::IntLiteral(42.0)]);
        assert_eq!(tokens("3.14"), vec![Token::FloatLiteral(3.14)]);
        assert_eq!(tokens("1.5e10"), vec![Token::FloatLiteral(1.5e10)]);
    }

    #[test]
    fn string_literal_with_escapes() {
        let toks = tokens(r#""hi\nthere""#);
        assert_eq!(toks, vec![Token::StringLiteral("hi\nthere".to_string())]);
    }

    #[test]
    fn compound_assign_and_comparisons_are_single_tokens() {
        assert_eq!(
            tokens("+= <= >= == !="),
            vec![
                Token::PlusEq,
                Token::LtEq,
                Token::GtEq,
                Token::EqEq,
                Token::NotEq,
            ]
        );
    }

    #[test]
    fn range_and_fat_arrow() {
        assert_eq!(
            tokens("0..5 => a.b"),
            vec![
                Token::IntLiteral(0.0),
                Token::DotDot,
                Token::IntLiteral(5.0),
                Token::FatArrow,
                Token::Ident("a".to_string()),
                Token::Dot,
                Token::Ident("b".to_string()),
            ]
        );
    }

    #[test]
    fn line_and_block_comments_are_skipped() {
        assert_eq!(
            tokens("var x = 1; // trailing\n/* block */ var y = 2;"),
            vec![
                Token::Var,
                Token::Ident("x".to_string()),
                Token::Eq,
                Token::IntLiteral(1.0),
                Token::Semicolon,
                Token::Var,
                Token::Ident("y".to_string()),
                Token::Eq,
                Token::IntLiteral(2.0),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn static_call_double_colon() {
        assert_eq!(
            tokens("T::m()"),
            vec![
                Token::Ident("T".to_string()),
                Token::ColonColon,
                Token::Ident("m".to_string()),
                Token::LParen,
                Token::RParen,
            ]
        );
    }
}
