// Diagnostic rendering and source management for the Quark compiler.
// Rust-quality error messages with spans, colors, and "did you mean?" suggestions.

use colored::Colorize;
use std::fmt;

pub mod error_codes;
pub mod fuzzy;
pub mod source_manager;

pub use source_manager::{SourceFile, SourceManager};

/// Source code location (line, column, file).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

impl Span {
    pub fn new(file: String, line: usize, column: usize, length: usize) -> Self {
        Self {
            file,
            line,
            column,
            length,
        }
    }

    pub fn unknown() -> Self {
        Self {
            file: "<unknown>".to_string(),
            line: 0,
            column: 0,
            length: 0,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Diagnostic severity. Quark only distinguishes hard errors from warnings;
/// notes/help are annotations carried on a `Diagnostic`, not severities of
/// their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "{}", "error".red().bold()),
            Severity::Warning => write!(f, "{}", "warning".yellow().bold()),
        }
    }
}

/// A single structured diagnostic message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Vec<String>,
}

impl Diagnostic {
    /// Attaches `error_codes::help_for(code)`'s fixed suggestions
    /// automatically (spec.md §4.B "Reporting functions ... attach
    /// code-specific suggestions"); call `with_help` afterward to append
    /// anything more specific to this occurrence.
    pub fn new(severity: Severity, code: &'static str, message: String, span: Span) -> Self {
        Self {
            severity,
            code,
            message,
            span,
            notes: Vec::new(),
            help: error_codes::help_for(code).iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn error(code: &'static str, message: String, span: Span) -> Self {
        Self::new(Severity::Error, code, message, span)
    }

    pub fn warning(code: &'static str, message: String, span: Span) -> Self {
        Self::new(Severity::Warning, code, message, span)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    /// Render in the Rust-compiler style:
    ///   error[E111]: undefined variable 'x'
    ///    --> file.qk:3:10
    ///      |
    ///    3 |     print(x);
    ///      |           ^
    ///      = note: ...
    ///      help: ...
    pub fn render(&self, source: Option<&SourceFile>, color: bool) -> String {
        if color {
            self.render_inner(source)
        } else {
            colored::control::set_override(false);
            let s = self.render_inner(source);
            colored::control::unset_override();
            s
        }
    }

    fn render_inner(&self, source: Option<&SourceFile>) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "{}[{}]: {}\n",
            self.severity,
            self.code,
            self.message.bold()
        ));
        out.push_str(&format!(" {} {}\n", "-->".cyan().bold(), self.span));

        if let Some(source) = source {
            if let Some(snippet) = self.snippet(source) {
                out.push_str(&snippet);
            }
        }

        for note in &self.notes {
            out.push_str(&format!(" {} {}\n", "=".cyan().bold(), note));
        }
        for help in &self.help {
            out.push_str(&format!(" {} {}\n", "help:".green().bold(), help));
        }

        out
    }

    fn snippet(&self, source: &SourceFile) -> Option<String> {
        let line = source.line_text(self.span.line)?;
        let width = self.span.line.to_string().len().max(2);

        let mut snippet = String::new();
        snippet.push_str(&format!(" {}\n", " ".repeat(width + 1).cyan()));
        snippet.push_str(&format!(
            " {} {} {}\n",
            format!("{:>width$}", self.span.line, width = width)
                .cyan()
                .bold(),
            "|".cyan().bold(),
            line
        ));

        let caret_col = source.display_column(self.span.line, self.span.column);
        let padding = " ".repeat(width + 3 + caret_col.saturating_sub(1));
        let underline = "^".repeat(self.span.length.max(1));
        snippet.push_str(&format!(
            " {} {}{}\n",
            " ".repeat(width + 1).cyan(),
            padding,
            underline.red().bold()
        ));

        Some(snippet)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.render(None, false))
    }
}

/// Collects diagnostics as they are emitted and renders/summarizes them.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Print every accumulated diagnostic, using `manager` to resolve
    /// source snippets by file name.
    pub fn print_all(&self, manager: &SourceManager, color: bool) {
        for diag in &self.diagnostics {
            let source = manager.get(&diag.span.file);
            eprintln!("{}", diag.render(source, color));
        }
    }

    /// `error: aborting due to N previous error(s)` style summary line.
    pub fn print_summary(&self) {
        if self.error_count > 0 {
            eprintln!(
                "{}: aborting due to {} previous error{}",
                "error".red().bold(),
                self.error_count,
                if self.error_count == 1 { "" } else { "s" }
            );
        }
        if self.warning_count > 0 {
            eprintln!(
                "{}: {} warning{} emitted",
                "warning".yellow().bold(),
                self.warning_count,
                if self.warning_count == 1 { "" } else { "s" }
            );
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "diagnostics": self.diagnostics.iter().map(|d| serde_json::json!({
                "severity": if d.severity == Severity::Error { "error" } else { "warning" },
                "code": d.code,
                "message": d.message,
                "file": d.span.file,
                "line": d.span.line,
                "column": d.span.column,
                "length": d.span.length,
                "notes": d.notes,
                "help": d.help,
            })).collect::<Vec<_>>()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_error_header_and_location() {
        let span = Span::new("test.qk".to_string(), 2, 21, 7);
        let diag = Diagnostic::error(
            error_codes::TYPE_MISMATCH,
            "mismatched types".to_string(),
            span,
        )
        .with_note("expected `int`, found `str`")
        .with_help("try converting `str` to `int`");

        let rendered = diag.render(None, false);
        assert!(rendered.contains("error[E0004]"));
        assert!(rendered.contains("mismatched types"));
        assert!(rendered.contains("test.qk:2:21"));
        assert!(rendered.contains("help:"));
    }

    #[test]
    fn engine_tracks_counts() {
        let mut engine = DiagnosticEngine::new();
        engine.emit(Diagnostic::error(
            error_codes::UNDEFINED_VARIABLE,
            "cannot find value `x`".to_string(),
            Span::unknown(),
        ));
        engine.emit(Diagnostic::warning(
            error_codes::MAY_NOT_RETURN,
            "function may not return on all paths".to_string(),
            Span::unknown(),
        ));
        assert_eq!(engine.error_count(), 1);
        assert_eq!(engine.warning_count(), 1);
        assert!(engine.has_errors());
    }
}
