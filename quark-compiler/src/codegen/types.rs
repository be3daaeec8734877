//! AST type -> LLVM type lowering, ported in spirit from
//! `vex-compiler/src/codegen_ast/types.rs`'s `ast_type_to_llvm`. Quark has
//! a closed, non-generic type set, so this is a plain recursive match
//! with no type-parameter substitution.

use inkwell::context::Context;
use inkwell::types::BasicTypeEnum;
use inkwell::AddressSpace;
use quark_ast::TypeName;

/// `str`, struct values, pointers, and arrays-of-non-scalar all lower to
/// an opaque pointer.
pub(crate) fn llvm_basic_type<'ctx>(context: &'ctx Context, ty: &TypeName) -> BasicTypeEnum<'ctx> {
    match ty {
        TypeName::Int => BasicTypeEnum::IntType(context.i32_type()),
        TypeName::Float => BasicTypeEnum::FloatType(context.f32_type()),
        TypeName::Double => BasicTypeEnum::FloatType(context.f64_type()),
        TypeName::Bool => BasicTypeEnum::IntType(context.bool_type()),
        TypeName::Str => BasicTypeEnum::PointerType(context.ptr_type(AddressSpace::default())),
        TypeName::Void => BasicTypeEnum::IntType(context.i8_type()),
        TypeName::Named(_) => BasicTypeEnum::PointerType(context.ptr_type(AddressSpace::default())),
        TypeName::Array(_, _) => BasicTypeEnum::PointerType(context.ptr_type(AddressSpace::default())),
        TypeName::Pointer(_) => BasicTypeEnum::PointerType(context.ptr_type(AddressSpace::default())),
    }
}

/// The default value poured into an epilogue block that falls off the end
/// of a non-void function without an explicit `ret`.
pub(crate) fn default_value<'ctx>(context: &'ctx Context, ty: &TypeName) -> inkwell::values::BasicValueEnum<'ctx> {
    match ty {
        TypeName::Int => context.i32_type().const_zero().into(),
        TypeName::Float => context.f32_type().const_zero().into(),
        TypeName::Double => context.f64_type().const_zero().into(),
        TypeName::Bool => context.bool_type().const_zero().into(),
        TypeName::Str | TypeName::Named(_) | TypeName::Array(_, _) | TypeName::Pointer(_) => {
            context.ptr_type(AddressSpace::default()).const_null().into()
        }
        TypeName::Void => context.i8_type().const_zero().into(),
    }
}
