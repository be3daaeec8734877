//! Orchestrates the whole pipeline, grounded on
//! `vex-cli/src/main.rs`'s `Compile`/`Run` handlers for the phase
//! ordering (parse -> borrow/semantic check -> codegen -> verify ->
//! object -> link) and on `original_source/src/codegen.cpp`'s
//! optimize-then-emit-then-link flow for what happens after codegen.

use crate::codegen::ASTCodeGen;
use crate::error::{CodegenError, DriverError};
use crate::semantic::SemanticAnalyzer;
use inkwell::context::Context;
use quark_diagnostics::{Diagnostic, DiagnosticEngine, Severity, SourceManager, Span};
use std::path::{Path, PathBuf};
use std::process::Command;

/// `-O0..3`, `--emit-llvm`, and the output path.
pub struct CompileOptions {
    pub output: PathBuf,
    pub opt_level: u8,
    pub emit_llvm: bool,
    pub color: bool,
}

/// Runs lex+parse+analyze only, matching `quarkc check`. Returns `true` if the source is free of hard errors.
pub fn check(entry: &Path, color: bool) -> Result<bool, DriverError> {
    let mut source_manager = SourceManager::new();
    let mut diagnostics = DiagnosticEngine::new();

    let program = match quark_parser::parse_program(entry, &mut source_manager) {
        Ok(p) => p,
        Err(e) => {
            report_parse_error(&mut diagnostics, &e);
            diagnostics.print_all(&source_manager, color);
            diagnostics.print_summary();
            return Ok(false);
        }
    };

    let mut analyzer = SemanticAnalyzer::new(&mut diagnostics);
    let ok = analyzer.analyze(&program);
    diagnostics.print_all(&source_manager, color);
    diagnostics.print_summary();
    Ok(ok)
}

/// Full `quarkc build`: lex -> parse (recursing into imports) -> semantic
/// analysis -> codegen -> LLVM pass pipeline -> object emission -> link.
/// Stops at the first phase reporting a hard error.
pub fn compile(entry: &Path, opts: &CompileOptions) -> Result<(), DriverError> {
    let mut source_manager = SourceManager::new();
    let mut diagnostics = DiagnosticEngine::new();

    log::info!("parsing {}", entry.display());
    let program = match quark_parser::parse_program(entry, &mut source_manager) {
        Ok(p) => p,
        Err(e) => {
            report_parse_error(&mut diagnostics, &e);
            diagnostics.print_all(&source_manager, opts.color);
            diagnostics.print_summary();
            return Err(DriverError::DiagnosticsReported(diagnostics.error_count()));
        }
    };

    log::info!("running semantic analysis");
    let mut analyzer = SemanticAnalyzer::new(&mut diagnostics);
    let analysis_ok = analyzer.analyze(&program);
    if !analysis_ok {
        diagnostics.print_all(&source_manager, opts.color);
        diagnostics.print_summary();
        return Err(DriverError::DiagnosticsReported(diagnostics.error_count()));
    }

    log::info!("generating code");
    let context = Context::create();
    let module_name = entry.file_stem().and_then(|n| n.to_str()).unwrap_or("program");
    let mut codegen = ASTCodeGen::new(&context, module_name);
    if let Err(e) = codegen.compile_program(&program).and_then(|_| codegen.verify()) {
        report_codegen_error(&mut diagnostics, &e);
        diagnostics.print_all(&source_manager, opts.color);
        diagnostics.print_summary();
        return Err(DriverError::Codegen(e));
    }

    if opts.emit_llvm {
        let ir_path = opts.output.with_extension("ll");
        std::fs::write(&ir_path, codegen.module.print_to_string().to_string()).map_err(|e| DriverError::Io { path: ir_path.display().to_string(), reason: e.to_string() })?;
        log::info!("wrote LLVM IR to {}", ir_path.display());
    }

    log::info!("running optimization pipeline at -O{}", opts.opt_level);
    codegen.optimize(opts.opt_level).map_err(DriverError::Codegen)?;

    // The staged object file must be removed on every exit path --
    // `NamedTempFile`'s `Drop` deletes it whether we return early below
    // or fall through to a successful link.
    let obj_ext = if cfg!(windows) { "obj" } else { "o" };
    let obj_file = tempfile::Builder::new()
        .prefix("quark_")
        .suffix(&format!(".{obj_ext}"))
        .tempfile()
        .map_err(|e| DriverError::ObjectEmission(e.to_string()))?;

    log::info!("emitting object file to {}", obj_file.path().display());
    codegen.write_object(obj_file.path(), opts.opt_level).map_err(DriverError::Codegen)?;

    log::info!("linking {}", opts.output.display());
    link(obj_file.path(), &opts.output)?;

    Ok(())
}

fn report_parse_error(diagnostics: &mut DiagnosticEngine, err: &quark_parser::ParseError) {
    let span = err.span().unwrap_or_else(Span::unknown);
    diagnostics.emit(Diagnostic::new(Severity::Error, err.code(), err.to_string(), span));
}

fn report_codegen_error(diagnostics: &mut DiagnosticEngine, err: &CodegenError) {
    let span = err.span().unwrap_or_else(Span::unknown);
    diagnostics.emit(Diagnostic::new(Severity::Error, err.code(), err.to_string(), span));
}

/// Invokes the host's linker driver;
/// `CC` lets a caller override which one, matching `vex-cli`'s use of a
/// plain `clang` subprocess rather than embedding LLD.
fn link(object_path: &Path, output_path: &Path) -> Result<(), DriverError> {
    let linker = std::env::var("CC").unwrap_or_else(|_| if cfg!(windows) { "clang".to_string() } else { "cc".to_string() });
    let result = Command::new(&linker)
        .arg(object_path)
        .arg("-o")
        .arg(output_path)
        .output()
        .map_err(|e| DriverError::Link(format!("failed to invoke '{linker}': {e}")))?;

    if !result.status.success() {
        return Err(DriverError::Link(String::from_utf8_lossy(&result.stderr).into_owned()));
    }
    Ok(())
}
