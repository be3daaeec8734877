//! Compilation context: threads the
//! `SourceManager` and `DiagnosticEngine` through every phase by
//! reference instead of the reference implementation's process-wide
//! `g_sourceManager`/`g_errorReporter` globals.

use quark_diagnostics::{DiagnosticEngine, SourceManager};

pub struct CompilationContext {
    pub source_manager: SourceManager,
    pub diagnostics: DiagnosticEngine,
}

impl CompilationContext {
    pub fn new() -> Self {
        Self {
            source_manager: SourceManager::new(),
            diagnostics: DiagnosticEngine::new(),
        }
    }
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self::new()
    }
}
