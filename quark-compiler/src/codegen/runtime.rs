//! Declarations for the extern "C" runtime and libc symbols codegen
//! calls into directly: `strcmp`/`printf` from libc, and the small
//! `quark_*`/`array_*` support library.

use super::types::llvm_basic_type;
use super::ASTCodeGen;
use inkwell::types::BasicMetadataTypeEnum;
use inkwell::values::FunctionValue;
use inkwell::AddressSpace;
use quark_ast::TypeName;

impl<'ctx> ASTCodeGen<'ctx> {
    fn get_or_declare(
        &mut self,
        name: &str,
        params: &[TypeName],
        return_type: &TypeName,
        is_variadic: bool,
    ) -> FunctionValue<'ctx> {
        if let Some(f) = self.runtime_fns.get(name) {
            return *f;
        }
        if let Some(f) = self.module.get_function(name) {
            self.runtime_fns.insert(name.to_string(), f);
            return f;
        }
        let param_metadata: Vec<BasicMetadataTypeEnum> =
            params.iter().map(|t| llvm_basic_type(self.context, t).into()).collect();
        let fn_type = if matches!(return_type, TypeName::Void) {
            self.context.void_type().fn_type(&param_metadata, is_variadic)
        } else {
            use inkwell::types::BasicTypeEnum;
            match llvm_basic_type(self.context, return_type) {
                BasicTypeEnum::IntType(t) => t.fn_type(&param_metadata, is_variadic),
                BasicTypeEnum::FloatType(t) => t.fn_type(&param_metadata, is_variadic),
                BasicTypeEnum::PointerType(t) => t.fn_type(&param_metadata, is_variadic),
                BasicTypeEnum::ArrayType(t) => t.fn_type(&param_metadata, is_variadic),
                BasicTypeEnum::StructType(t) => t.fn_type(&param_metadata, is_variadic),
                other => unreachable!("runtime symbol '{name}' has unsupported return lowering {other:?}"),
            }
        };
        let f = self.module.add_function(name, fn_type, None);
        self.runtime_fns.insert(name.to_string(), f);
        f
    }

    pub(crate) fn runtime_strcmp(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("strcmp", &[TypeName::Str, TypeName::Str], &TypeName::Int, false)
    }

    pub(crate) fn runtime_printf(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("printf", &[TypeName::Str], &TypeName::Int, true)
    }

    pub(crate) fn runtime_str_concat(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("str_concat", &[TypeName::Str, TypeName::Str], &TypeName::Str, false)
    }

    pub(crate) fn runtime_array_new(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_array_new", &[TypeName::Int, TypeName::Int], &TypeName::Str, false)
    }

    pub(crate) fn runtime_array_length(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("array_length", &[TypeName::Str], &TypeName::Int, false)
    }

    pub(crate) fn runtime_array_push(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("array_push", &[TypeName::Str, TypeName::Str, TypeName::Int], &TypeName::Str, false)
    }

    pub(crate) fn runtime_array_pop(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("array_pop", &[TypeName::Str, TypeName::Int], &TypeName::Double, false)
    }

    pub(crate) fn runtime_array_slice(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_array_slice", &[TypeName::Str, TypeName::Int, TypeName::Int, TypeName::Int], &TypeName::Str, false)
    }

    pub(crate) fn runtime_array_free(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_array_free", &[TypeName::Str], &TypeName::Void, false)
    }

    pub(crate) fn runtime_map_new(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_map_new", &[], &TypeName::Str, false)
    }

    pub(crate) fn runtime_map_get(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_map_get", &[TypeName::Str, TypeName::Str], &TypeName::Str, false)
    }

    pub(crate) fn runtime_map_set(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare(
            "quark_map_set",
            &[TypeName::Str, TypeName::Str, TypeName::Str],
            &TypeName::Void,
            false,
        )
    }

    /// Unary `libm` functions (`sin`, `sqrt`, ...) all share the
    /// `double -> double` signature.
    pub(crate) fn runtime_libm_unary(&mut self, name: &str) -> FunctionValue<'ctx> {
        self.get_or_declare(name, &[TypeName::Double], &TypeName::Double, false)
    }

    pub(crate) fn runtime_libm_binary(&mut self, name: &str) -> FunctionValue<'ctx> {
        self.get_or_declare(name, &[TypeName::Double, TypeName::Double], &TypeName::Double, false)
    }

    pub(crate) fn runtime_readline(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_readline", &[], &TypeName::Str, false)
    }

    pub(crate) fn runtime_sleep(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("sleep", &[TypeName::Int], &TypeName::Int, false)
    }

    pub(crate) fn runtime_to_string_int(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_int_to_string", &[TypeName::Int], &TypeName::Str, false)
    }

    pub(crate) fn runtime_to_string_double(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_double_to_string", &[TypeName::Double], &TypeName::Str, false)
    }

    pub(crate) fn runtime_to_string_bool(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_bool_to_string", &[TypeName::Bool], &TypeName::Str, false)
    }

    pub(crate) fn runtime_to_int(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_str_to_int", &[TypeName::Str], &TypeName::Int, false)
    }

    pub(crate) fn runtime_str_len(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_str_len", &[TypeName::Str], &TypeName::Int, false)
    }

    pub(crate) fn runtime_str_slice(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_str_slice", &[TypeName::Str, TypeName::Int, TypeName::Int], &TypeName::Str, false)
    }

    pub(crate) fn runtime_str_find(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_str_find", &[TypeName::Str, TypeName::Str], &TypeName::Int, false)
    }

    pub(crate) fn runtime_str_replace(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_str_replace", &[TypeName::Str, TypeName::Str, TypeName::Str], &TypeName::Str, false)
    }

    /// Returns an opaque pointer to a `quark_array_new`-shaped array of
    /// `str` (the stand-in return type mirrors `runtime_array_new`'s own
    /// `TypeName::Str` trick — both just need an opaque pointer shape).
    pub(crate) fn runtime_str_split(&mut self) -> FunctionValue<'ctx> {
        self.get_or_declare("quark_str_split", &[TypeName::Str, TypeName::Str], &TypeName::Str, false)
    }

    pub(crate) fn ptr_type(&self) -> inkwell::types::PointerType<'ctx> {
        self.context.ptr_type(AddressSpace::default())
    }
}
