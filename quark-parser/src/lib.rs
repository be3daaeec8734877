//! Tokens -> AST, plus `import` recursion through the
//! shared [`SourceManager`].

mod parser;

pub use parser::Parser;

use quark_ast::{Program, Stmt, StmtKind};
use quark_diagnostics::{Span, SourceManager};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("{message}")]
    Syntax {
        span: Span,
        code: &'static str,
        message: String,
    },
    #[error("lexer error: {0}")]
    LexerError(String),
    #[error("cannot read imported file '{path}': {reason}")]
    ImportIo { path: String, reason: String },
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::Syntax { span, .. } => Some(span.clone()),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ParseError::Syntax { code, .. } => code,
            ParseError::LexerError(_) => "E0001",
            ParseError::ImportIo { .. } => "E0001",
        }
    }
}

/// Parses `entry_path` and recursively inlines every `import`ed file,
/// registering each with `source_manager` and deduplicating repeat
/// imports at parse time.
pub fn parse_program(entry_path: &Path, source_manager: &mut SourceManager) -> Result<Program, ParseError> {
    let mut imported = HashSet::new();
    let canonical = canonical_key(entry_path);
    imported.insert(canonical);
    let statements = parse_file_inline(entry_path, source_manager, &mut imported)?;
    Ok(Program::new(statements))
}

fn canonical_key(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn parse_file_inline(
    path: &Path,
    source_manager: &mut SourceManager,
    imported: &mut HashSet<String>,
) -> Result<Vec<Stmt>, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|e| ParseError::ImportIo {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let file_name = path.display().to_string();
    source_manager.add_file(file_name.clone(), content.clone());

    let mut parser = Parser::new(&content, file_name)?;
    let program = parser.parse()?;

    let mut out = Vec::with_capacity(program.statements.len());
    for stmt in program.statements {
        if let StmtKind::Include(raw_paths) = stmt.kind {
            // `parser::parse_import` stashes raw import path strings as a
            // placeholder `Include` so this layer (which alone has
            // filesystem + SourceManager access) can resolve them.
            let mut inlined = Vec::new();
            for raw in &raw_paths {
                if let StmtKind::Expr(quark_ast::Expr {
                    kind: quark_ast::ExprKind::Str(import_path),
                    ..
                }) = &raw.kind
                {
                    let resolved = resolve_import_path(path, import_path);
                    let key = canonical_key(&resolved);
                    if !imported.insert(key) {
                        continue; // already imported; dedupe silently
                    }
                    inlined.extend(parse_file_inline(&resolved, source_manager, imported)?);
                }
            }
            out.push(Stmt::new(StmtKind::Include(inlined), stmt.span));
        } else {
            out.push(stmt);
        }
    }
    Ok(out)
}

fn resolve_import_path(from_file: &Path, import_path: &str) -> PathBuf {
    let candidate = PathBuf::from(import_path);
    if candidate.is_absolute() {
        return candidate;
    }
    from_file
        .parent()
        .map(|dir| dir.join(&candidate))
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_function() {
        let mut parser = Parser::new("int main() { ret 0; }", "t.qk").unwrap();
        let program = parser.parse().unwrap();
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(program.statements[0].kind, quark_ast::StmtKind::FunctionDef(_)));
    }
}
