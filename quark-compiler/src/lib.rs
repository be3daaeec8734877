//! Semantic analysis, LLVM codegen, and the compile driver: a thin
//! `pub mod` list plus re-exports of the types a caller actually needs,
//! rather than a crate-root struct of its own.

pub mod codegen;
pub mod context;
pub mod driver;
pub mod error;
pub mod semantic;
pub mod symbols;

pub use codegen::ASTCodeGen;
pub use context::CompilationContext;
pub use error::{CodegenError, DriverError};
pub use semantic::SemanticAnalyzer;
