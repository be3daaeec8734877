//! Module verification, the LLVM optimization pipeline, and object-file
//! emission, grounded on
//! `vex-compiler/src/codegen_ast/compilation.rs`'s `compile_to_object_with_opt`/
//! `verify_and_print` (same `Target::initialize_native`/`TargetMachine`
//! shape) plus `original_source/src/codegen.cpp`'s opt-level-driven
//! pipeline (there built from `llvm::PassBuilder`; here from inkwell's
//! `TargetMachine::run_passes`, its one pass-manager entry point).

use super::ASTCodeGen;
use crate::error::CodegenError;
use inkwell::targets::{CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine};
use inkwell::OptimizationLevel;
use std::path::Path;

impl<'ctx> ASTCodeGen<'ctx> {
    /// Runs LLVM's module verifier; a module that fails this never reaches
    /// object emission.
    pub fn verify(&self) -> Result<(), CodegenError> {
        self.module.verify().map_err(|e| CodegenError::Llvm(e.to_string()))
    }

    fn target_machine(&self, opt_level: OptimizationLevel) -> Result<TargetMachine, CodegenError> {
        Target::initialize_native(&InitializationConfig::default()).map_err(|e| CodegenError::Llvm(format!("target init: {e}")))?;
        let triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&triple).map_err(|e| CodegenError::Llvm(format!("target lookup: {e}")))?;
        target
            .create_target_machine(&triple, "generic", "", opt_level, RelocMode::Default, CodeModel::Default)
            .ok_or_else(|| CodegenError::Llvm("failed to create target machine".to_string()))
    }

    /// Runs the module through LLVM's new-pass-manager default pipeline at
    /// the requested `-O` level; `O0`
    /// skips the pipeline entirely, matching `original_source`'s own
    /// `optimizationLevel_ == 0` short-circuit.
    pub fn optimize(&self, opt_level: u8) -> Result<(), CodegenError> {
        if opt_level == 0 {
            return Ok(());
        }
        let level = match opt_level {
            1 => OptimizationLevel::Less,
            2 => OptimizationLevel::Default,
            _ => OptimizationLevel::Aggressive,
        };
        let tm = self.target_machine(level)?;
        let pass_pipeline = format!("default<O{opt_level}>");
        let options = inkwell::passes::PassBuilderOptions::create();
        self.module
            .run_passes(&pass_pipeline, &tm, options)
            .map_err(|e| CodegenError::Llvm(format!("optimization pipeline: {e}")))
    }

    /// Emits the module as a native object file at `output_path`
    ///.
    pub fn write_object(&self, output_path: &Path, opt_level: u8) -> Result<(), CodegenError> {
        let level = match opt_level {
            0 => OptimizationLevel::None,
            1 => OptimizationLevel::Less,
            2 => OptimizationLevel::Default,
            _ => OptimizationLevel::Aggressive,
        };
        let tm = self.target_machine(level)?;
        tm.write_to_file(&self.module, FileType::Object, output_path)
            .map_err(|e| CodegenError::Llvm(format!("object emission: {e}")))
    }
}
