//! Semantic Analyzer, grounded on
//! `original_source/include/semantic_analyzer.h` and
//! `original_source/src/semantic_analyzer.cpp`: two-pass analysis over a
//! flattened [`Program`] (declarations, then statement bodies), with
//! diagnostics flushed through the shared [`DiagnosticEngine`].

mod builtins;
mod declarations;
mod expressions;
mod statements;
mod types;

pub use types::struct_fields;

use crate::symbols::{Symbol, SymbolTable};
use quark_ast::{Function, Program, StructDef};
use quark_diagnostics::{error_codes, Diagnostic, DiagnosticEngine, Span};
use std::collections::HashMap;

/// Declaration-time record of a `struct` not yet available at method-body
/// analysis time is not possible here since structs are collected before
/// any statement is analyzed.
pub struct SemanticAnalyzer<'a> {
    pub(crate) symbols: SymbolTable,
    pub(crate) structs: HashMap<String, StructDef>,
    pub(crate) functions: HashMap<String, Function>,
    pub(crate) extern_functions: HashMap<String, quark_ast::ExternFunction>,
    pub(crate) diagnostics: &'a mut DiagnosticEngine,
    pub(crate) errors: Vec<Diagnostic>,
    pub(crate) warnings: Vec<Diagnostic>,
    /// Depth of enclosing loops, for `break`/`continue` validity (E105/E106).
    pub(crate) loop_depth: usize,
    /// Return type of the function currently being analyzed, and whether a
    /// `ret` covering every path has been seen.
    pub(crate) current_function_return: Option<quark_ast::TypeName>,
    pub(crate) current_function_has_return: bool,
    /// Set while analyzing an instance method body, so `this`/field access
    /// without a receiver resolves against it.
    pub(crate) current_receiver_struct: Option<String>,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(diagnostics: &'a mut DiagnosticEngine) -> Self {
        let mut analyzer = Self {
            symbols: SymbolTable::new(),
            structs: HashMap::new(),
            functions: HashMap::new(),
            extern_functions: HashMap::new(),
            diagnostics,
            errors: Vec::new(),
            warnings: Vec::new(),
            loop_depth: 0,
            current_function_return: None,
            current_function_has_return: false,
            current_receiver_struct: None,
        };
        builtins::register_builtin_functions(&mut analyzer);
        analyzer
    }

    /// Runs both passes and flushes diagnostics. Returns `true` if no hard
    /// error was reported (codegen is only attempted in that case).
    pub fn analyze(&mut self, program: &Program) -> bool {
        let flattened: Vec<&quark_ast::Stmt> = program.flattened();
        self.collect_declarations(&flattened);

        // Flush declaration-pass errors before statement analysis so a
        // broken declaration (e.g. an unresolvable parent struct) doesn't
        // cascade into a wall of spurious member-access errors.
        let had_declaration_errors = self.errors.iter().any(|d| d.severity == quark_diagnostics::Severity::Error);
        self.flush();
        if had_declaration_errors {
            return false;
        }

        self.analyze_statements(&flattened);
        self.flush();
        !self.diagnostics.has_errors()
    }

    fn flush(&mut self) {
        for diag in self.errors.drain(..) {
            self.diagnostics.emit(diag);
        }
        for diag in self.warnings.drain(..) {
            self.diagnostics.emit(diag);
        }
    }

    pub(crate) fn error(&mut self, code: &'static str, message: impl Into<String>, span: Span) {
        self.errors.push(Diagnostic::error(code, message.into(), span));
    }

    pub(crate) fn warning(&mut self, code: &'static str, message: impl Into<String>, span: Span) {
        self.warnings.push(Diagnostic::warning(code, message.into(), span));
    }

    pub(crate) fn declare_or_error(&mut self, symbol: Symbol, already_defined_code: &'static str) {
        let name = symbol.name.clone();
        let span = symbol.span.clone();
        if !self.symbols.declare(symbol) {
            self.error(already_defined_code, format!("'{name}' is already defined in this scope"), span);
        }
    }

    pub(crate) fn undefined_variable(&mut self, name: &str, span: Span) {
        let suggestion = closest_name(name, self.symbols_in_scope_names());
        let mut message = format!("undefined variable '{name}'");
        if let Some(s) = &suggestion {
            message.push_str(&format!(" (did you mean '{s}'?)"));
        }
        self.error(error_codes::UNDEFINED_VARIABLE, message, span);
    }

    fn symbols_in_scope_names(&self) -> Vec<String> {
        // The symbol table only exposes per-scope lookup, not enumeration;
        // known globals (functions/structs) are offered as a reasonable
        // fallback candidate pool for "did you mean" on an undefined name.
        self.functions
            .keys()
            .chain(self.structs.keys())
            .cloned()
            .collect()
    }
}

fn closest_name(target: &str, candidates: Vec<String>) -> Option<String> {
    use strsim::levenshtein;
    candidates
        .into_iter()
        .map(|c| {
            let d = levenshtein(target, &c);
            (c, d)
        })
        .filter(|(c, d)| *d <= 3 && c != target)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quark_parser::Parser;

    fn analyze_source(src: &str) -> (bool, Vec<String>) {
        let mut parser = Parser::new(src, "t.qk").unwrap();
        let program = parser.parse().unwrap();
        let mut diags = DiagnosticEngine::new();
        let mut analyzer = SemanticAnalyzer::new(&mut diags);
        let ok = analyzer.analyze(&program);
        (ok, diags.diagnostics().iter().map(|d| d.code.to_string()).collect())
    }

    #[test]
    fn well_typed_program_has_no_errors() {
        let (ok, codes) = analyze_source("int main() { var x: int = 1; ret x; }");
        assert!(ok, "unexpected errors: {codes:?}");
    }

    #[test]
    fn undefined_variable_is_reported() {
        let (ok, codes) = analyze_source("int main() { ret y; }");
        assert!(!ok);
        assert!(codes.contains(&error_codes::UNDEFINED_VARIABLE.to_string()));
    }

    #[test]
    fn break_outside_loop_is_reported() {
        let (ok, codes) = analyze_source("int main() { break; ret 0; }");
        assert!(!ok);
        assert!(codes.contains(&error_codes::BREAK_OUTSIDE_LOOP.to_string()));
    }
}
