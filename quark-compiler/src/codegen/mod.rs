//! LLVM code generation, grounded on
//! `vex-compiler/src/codegen_ast/mod.rs`'s `ASTCodeGen` shape: the
//! codegen struct holds its symbol/type tables directly as `HashMap`
//! fields rather than through a separate table object (SPEC_FULL.md §7).

mod builtins;
mod emit;
mod expressions;
mod runtime;
mod statements;
mod types;

pub(crate) use types::llvm_basic_type;

use crate::error::CodegenError;
use crate::semantic::struct_fields;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::BasicTypeEnum;
use inkwell::values::{FunctionValue, PointerValue};
use quark_ast::{ExternFunction, Function, Program, StmtKind, StructDef, TypeName};
use quark_diagnostics::error_codes;
use std::collections::HashMap;

pub struct ASTCodeGen<'ctx> {
    pub context: &'ctx Context,
    pub module: Module<'ctx>,
    pub builder: Builder<'ctx>,

    /// Local variable allocas, cleared on every function entry.
    pub(crate) variables: HashMap<String, PointerValue<'ctx>>,
    pub(crate) variable_types: HashMap<String, BasicTypeEnum<'ctx>>,
    pub(crate) variable_ast_types: HashMap<String, TypeName>,

    pub(crate) functions: HashMap<String, FunctionValue<'ctx>>,
    pub(crate) function_defs: HashMap<String, Function>,
    pub(crate) extern_defs: HashMap<String, ExternFunction>,
    pub(crate) struct_defs: HashMap<String, StructDef>,
    pub(crate) struct_types: HashMap<String, inkwell::types::StructType<'ctx>>,

    /// Lazily-declared runtime/libc externs (`strcmp`, `printf`,
    /// `array_length`, `quark_map_get`, ...), keyed by symbol name so each
    /// is declared in the module at most once.
    pub(crate) runtime_fns: HashMap<String, FunctionValue<'ctx>>,

    pub(crate) current_function: Option<FunctionValue<'ctx>>,
    pub(crate) current_function_return_type: Option<TypeName>,
    /// Set while compiling an instance method, so `this`/field access
    /// resolves against its implicit receiver alloca.
    pub(crate) current_receiver_struct: Option<String>,
    /// Pushed/popped around each loop body so `break`/`continue` can find
    /// their target blocks (semantic analysis already rejected misuse).
    pub(crate) loop_stack: Vec<(inkwell::basic_block::BasicBlock<'ctx>, inkwell::basic_block::BasicBlock<'ctx>)>,

    /// Interns string-literal/dynamic-type-name globals by content so the
    /// same text (a struct's dynamic-type-name string is rebuilt at every
    /// call site that dispatches on it, a string literal may appear
    /// verbatim more than once in a translation unit) is emitted into the
    /// module as one LLVM global instead of one per occurrence.
    pub(crate) string_literal_cache: dashmap::DashMap<String, PointerValue<'ctx>>,
}

impl<'ctx> ASTCodeGen<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        let module = context.create_module(module_name);
        let builder = context.create_builder();
        Self {
            context,
            module,
            builder,
            variables: HashMap::new(),
            variable_types: HashMap::new(),
            variable_ast_types: HashMap::new(),
            functions: HashMap::new(),
            function_defs: HashMap::new(),
            extern_defs: HashMap::new(),
            struct_defs: HashMap::new(),
            struct_types: HashMap::new(),
            runtime_fns: HashMap::new(),
            current_function: None,
            current_function_return_type: None,
            current_receiver_struct: None,
            loop_stack: Vec::new(),
            string_literal_cache: dashmap::DashMap::new(),
        }
    }

    /// Returns the cached global for `s`, building and inserting one on
    /// first sight (teacher-grounded interning pattern: see
    /// `vex-compiler/src/types/interner.rs`'s `TypeInterner::intern`).
    pub(crate) fn intern_global_string(&mut self, s: &str, hint: &str) -> Result<PointerValue<'ctx>, CodegenError> {
        if let Some(existing) = self.string_literal_cache.get(s) {
            return Ok(*existing);
        }
        let global = self.builder.build_global_string_ptr(s, hint).map_err(|e| self.llvm_error("string literal", e))?;
        let ptr = global.as_pointer_value();
        self.string_literal_cache.insert(s.to_string(), ptr);
        Ok(ptr)
    }

    /// Lowers every top-level item: struct layouts first (so method bodies
    /// can reference any struct regardless of declaration order), then
    /// function/extern/method signatures, then bodies.
    pub fn compile_program(&mut self, program: &Program) -> Result<(), CodegenError> {
        let statements = program.flattened();

        for stmt in &statements {
            if let StmtKind::StructDef(def) = &stmt.kind {
                self.struct_defs.insert(def.name.clone(), def.clone());
            }
        }
        // Extern struct forward-declarations
        // carry no fields of their own; `Named` already lowers to an opaque
        // pointer, so registering an empty definition only keeps lookups
        // like `struct_fields` from treating the name as unknown.
        for stmt in &statements {
            if let StmtKind::ExternStruct { name } = &stmt.kind {
                self.struct_defs.entry(name.clone()).or_insert_with(|| StructDef {
                    name: name.clone(),
                    parent: None,
                    fields: Vec::new(),
                    methods: Vec::new(),
                    span: stmt.span.clone(),
                });
            }
        }
        for stmt in &statements {
            if let StmtKind::ImplBlock { type_name, methods } = &stmt.kind {
                if let Some(def) = self.struct_defs.get_mut(type_name) {
                    def.methods.extend(methods.clone());
                }
            }
        }
        for name in self.struct_defs.keys().cloned().collect::<Vec<_>>() {
            self.declare_struct_type(&name)?;
        }

        for stmt in &statements {
            match &stmt.kind {
                StmtKind::ExternFunction(f) => {
                    self.extern_defs.insert(f.name.clone(), f.clone());
                    self.declare_extern_function(f)?;
                }
                StmtKind::FunctionDef(f) => {
                    self.function_defs.insert(f.name.clone(), f.clone());
                    self.declare_function(&f.name, f)?;
                }
                StmtKind::StructDef(def) => {
                    for method in &def.methods {
                        let mangled = mangled_name(&def.name, &method.name);
                        self.function_defs.insert(mangled.clone(), method.clone());
                        self.declare_function(&mangled, method)?;
                    }
                }
                _ => {}
            }
        }

        for stmt in &statements {
            match &stmt.kind {
                StmtKind::FunctionDef(f) => self.compile_function(&f.name, f, None)?,
                StmtKind::StructDef(def) => {
                    for method in &def.methods {
                        let mangled = mangled_name(&def.name, &method.name);
                        self.compile_function(&mangled, method, Some(&def.name))?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn declare_struct_type(&mut self, name: &str) -> Result<(), CodegenError> {
        if self.struct_types.contains_key(name) {
            return Ok(());
        }
        let fields = struct_fields(&self.struct_defs, name);
        let field_types: Vec<BasicTypeEnum> = fields.iter().map(|f| llvm_basic_type(self.context, &f.type_name)).collect();
        let struct_ty = self.context.opaque_struct_type(name);
        struct_ty.set_body(&field_types, false);
        self.struct_types.insert(name.to_string(), struct_ty);
        Ok(())
    }

    fn declare_function(&mut self, mangled_name: &str, f: &Function) -> Result<(), CodegenError> {
        if self.functions.contains_key(mangled_name) {
            return Ok(());
        }
        let mut param_types: Vec<TypeName> = Vec::new();
        if f.is_instance_method {
            // Hidden receiver pointer plus the dynamic-type-name string,
            // ahead of every user-declared parameter.
            param_types.push(TypeName::Pointer(Box::new(TypeName::Named(
                f.receiver_struct.clone().unwrap_or_default(),
            ))));
            param_types.push(TypeName::Str);
        }
        param_types.extend(f.params.iter().map(|p| p.type_name.clone()));

        let param_metadata: Vec<inkwell::types::BasicMetadataTypeEnum> =
            param_types.iter().map(|t| llvm_basic_type(self.context, t).into()).collect();

        let fn_type = function_type(self.context, &f.return_type, &param_metadata, false);
        let fn_val = self.module.add_function(mangled_name, fn_type, None);
        self.functions.insert(mangled_name.to_string(), fn_val);
        Ok(())
    }

    fn declare_extern_function(&mut self, f: &ExternFunction) -> Result<(), CodegenError> {
        let param_metadata: Vec<inkwell::types::BasicMetadataTypeEnum> =
            f.params.iter().map(|p| llvm_basic_type(self.context, &p.type_name).into()).collect();
        let fn_type = function_type(self.context, &f.return_type, &param_metadata, f.is_variadic);
        let fn_val = self.module.add_function(&f.name, fn_type, None);
        self.functions.insert(f.name.clone(), fn_val);
        Ok(())
    }

    pub(crate) fn lookup_function(&self, name: &str) -> Option<FunctionValue<'ctx>> {
        self.functions.get(name).copied()
    }

    pub(crate) fn codegen_error(&self, code: &'static str, message: impl Into<String>) -> CodegenError {
        CodegenError::Failed {
            span: quark_diagnostics::Span::unknown(),
            code,
            message: message.into(),
        }
    }

    pub(crate) fn llvm_error(&self, context: &str, err: impl std::fmt::Display) -> CodegenError {
        CodegenError::Failed {
            span: quark_diagnostics::Span::unknown(),
            code: error_codes::LLVM_ERROR,
            message: format!("{context}: {err}"),
        }
    }
}

/// `Struct::method`; shared with the
/// semantic analyzer's identical scheme in `semantic::types`.
pub(crate) fn mangled_name(struct_name: &str, method_name: &str) -> String {
    format!("{struct_name}::{method_name}")
}

/// Builds a `FunctionType` from a Quark return type, matching the
/// teacher's per-variant dispatch (`vex-compiler/src/codegen_ast/functions/declare.rs`)
/// since `fn_type` is implemented per concrete LLVM type, not on the
/// `BasicTypeEnum` union itself.
fn function_type<'ctx>(
    context: &'ctx Context,
    return_type: &TypeName,
    params: &[inkwell::types::BasicMetadataTypeEnum<'ctx>],
    is_variadic: bool,
) -> inkwell::types::FunctionType<'ctx> {
    if matches!(return_type, TypeName::Void) {
        return context.void_type().fn_type(params, is_variadic);
    }
    match llvm_basic_type(context, return_type) {
        BasicTypeEnum::IntType(t) => t.fn_type(params, is_variadic),
        BasicTypeEnum::FloatType(t) => t.fn_type(params, is_variadic),
        BasicTypeEnum::ArrayType(t) => t.fn_type(params, is_variadic),
        BasicTypeEnum::StructType(t) => t.fn_type(params, is_variadic),
        BasicTypeEnum::PointerType(t) => t.fn_type(params, is_variadic),
        other => unreachable!("Quark has no scalar type lowering to {other:?}"),
    }
}
