//! Structural error enums for the codegen and driver phases (thiserror,
//! teacher's exact per-crate pattern — compare `quark-lexer::LexError`,
//! `quark-parser::ParseError`).

use quark_diagnostics::Span;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CodegenError {
    #[error("{message}")]
    Failed {
        span: Span,
        code: &'static str,
        message: String,
    },
    #[error("LLVM error: {0}")]
    Llvm(String),
}

impl CodegenError {
    /// Overrides the span on a `Failed` error constructed with a
    /// placeholder (e.g. `Span::unknown()`) once the call site's real
    /// span is known. A no-op on `Llvm`, which carries none.
    pub fn with_span(self, span: Span) -> Self {
        match self {
            CodegenError::Failed { code, message, .. } => CodegenError::Failed { span, code, message },
            other => other,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            CodegenError::Failed { span, .. } => Some(span.clone()),
            CodegenError::Llvm(_) => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CodegenError::Failed { code, .. } => code,
            CodegenError::Llvm(_) => quark_diagnostics::error_codes::LLVM_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("cannot read '{path}': {reason}")]
    Io { path: String, reason: String },
    #[error("{0} error(s) aborted compilation")]
    DiagnosticsReported(usize),
    #[error("code generation failed: {0}")]
    Codegen(#[from] CodegenError),
    #[error("failed to emit object file: {0}")]
    ObjectEmission(String),
    #[error("failed to link: {0}")]
    Link(String),
}
