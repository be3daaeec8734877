//! Builtin call codegen, mirroring the registrations in
//! `semantic/builtins.rs` one-for-one so every name the semantic analyzer
//! accepts has a matching lowering here. `print`/`println`/`format` accept
//! any argument count and type, so unlike a user function
//! call their argument list is walked dynamically instead of against a
//! fixed `Function` signature.

use super::ASTCodeGen;
use crate::error::CodegenError;
use inkwell::values::BasicValueEnum;
use quark_ast::{Expr, TypeName};
use quark_diagnostics::{error_codes, Span};

impl<'ctx> ASTCodeGen<'ctx> {
    /// Returns `Ok(None)` for any callee that isn't a registered builtin,
    /// so `compile_call` falls through to ordinary function resolution.
    pub(crate) fn compile_builtin_call(
        &mut self,
        callee: &str,
        args: &[Expr],
        span: Span,
    ) -> Result<Option<(BasicValueEnum<'ctx>, TypeName)>, CodegenError> {
        let result = match callee {
            "print" => self.compile_print(args, false)?,
            "println" => self.compile_print(args, true)?,
            "format" => self.compile_format(args)?,
            "to_string" => self.compile_to_string(args, span)?,
            "to_int" => self.compile_unary_runtime_call(args, span, |s| s.runtime_to_int(), TypeName::Str, TypeName::Int)?,
            "readline" => {
                let f = self.runtime_readline();
                let call = self.builder.build_call(f, &[], "readline").map_err(|e| self.llvm_error("readline call", e))?;
                let v = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "readline returned no value"))?;
                (v, TypeName::Str)
            }
            "sleep" => {
                let (ms, _) = self.compile_one_arg(args, "sleep", span.clone())?;
                let f = self.runtime_sleep();
                self.builder.build_call(f, &[ms.into()], "sleep").map_err(|e| self.llvm_error("sleep call", e))?;
                (self.context.i8_type().const_zero().into(), TypeName::Void)
            }
            "str_len" => self.compile_unary_runtime_call(args, span, |s| s.runtime_str_len(), TypeName::Str, TypeName::Int)?,
            "str_concat" => {
                let (a, b) = self.compile_two_args(args, "str_concat", span)?;
                let f = self.runtime_str_concat();
                let call = self.builder.build_call(f, &[a.0.into(), b.0.into()], "str_concat").map_err(|e| self.llvm_error("str_concat call", e))?;
                let v = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "str_concat returned no value"))?;
                (v, TypeName::Str)
            }
            "str_find" => {
                let (a, b) = self.compile_two_args(args, "str_find", span)?;
                let f = self.runtime_str_find();
                let call = self.builder.build_call(f, &[a.0.into(), b.0.into()], "str_find").map_err(|e| self.llvm_error("str_find call", e))?;
                let v = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "str_find returned no value"))?;
                (v, TypeName::Int)
            }
            "str_split" => {
                let (a, b) = self.compile_two_args(args, "str_split", span)?;
                let f = self.runtime_str_split();
                let call = self.builder.build_call(f, &[a.0.into(), b.0.into()], "str_split").map_err(|e| self.llvm_error("str_split call", e))?;
                let v = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "str_split returned no value"))?;
                (v, TypeName::Array(Box::new(TypeName::Str), None))
            }
            "str_slice" => {
                if args.len() != 3 {
                    return Err(self.codegen_error(error_codes::ARGUMENT_COUNT_MISMATCH, "str_slice() requires 3 arguments").with_span(span));
                }
                let s = self.compile_expr(&args[0])?.0;
                let start = self.compile_expr(&args[1])?.0;
                let end = self.compile_expr(&args[2])?.0;
                let f = self.runtime_str_slice();
                let call = self
                    .builder
                    .build_call(f, &[s.into(), start.into(), end.into()], "str_slice")
                    .map_err(|e| self.llvm_error("str_slice call", e))?;
                let v = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "str_slice returned no value"))?;
                (v, TypeName::Str)
            }
            "str_replace" => {
                if args.len() != 3 {
                    return Err(self.codegen_error(error_codes::ARGUMENT_COUNT_MISMATCH, "str_replace() requires 3 arguments").with_span(span));
                }
                let s = self.compile_expr(&args[0])?.0;
                let old = self.compile_expr(&args[1])?.0;
                let new = self.compile_expr(&args[2])?.0;
                let f = self.runtime_str_replace();
                let call = self
                    .builder
                    .build_call(f, &[s.into(), old.into(), new.into()], "str_replace")
                    .map_err(|e| self.llvm_error("str_replace call", e))?;
                let v = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "str_replace returned no value"))?;
                (v, TypeName::Str)
            }
            "pow" => self.compile_libm_binary(args, "pow", span)?,
            "fmod" => self.compile_libm_binary(args, "fmod", span)?,
            "atan2" => self.compile_libm_binary(args, "atan2", span)?,
            "min" => self.compile_minmax(args, true, span)?,
            "max" => self.compile_minmax(args, false, span)?,
            "clamp" => self.compile_clamp(args, span)?,
            name if UNARY_MATH.contains(&name) => self.compile_libm_unary(args, name, span)?,
            _ => return Ok(None),
        };
        Ok(Some(result))
    }

    fn compile_one_arg(&mut self, args: &[Expr], name: &str, span: Span) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let arg = args
            .first()
            .ok_or_else(|| self.codegen_error(error_codes::ARGUMENT_COUNT_MISMATCH, format!("{name}() requires one argument")).with_span(span))?;
        self.compile_expr(arg)
    }

    fn compile_two_args(
        &mut self,
        args: &[Expr],
        name: &str,
        span: Span,
    ) -> Result<((BasicValueEnum<'ctx>, TypeName), (BasicValueEnum<'ctx>, TypeName)), CodegenError> {
        if args.len() != 2 {
            return Err(self.codegen_error(error_codes::ARGUMENT_COUNT_MISMATCH, format!("{name}() requires two arguments")).with_span(span));
        }
        let a = self.compile_expr(&args[0])?;
        let b = self.compile_expr(&args[1])?;
        Ok((a, b))
    }

    fn compile_unary_runtime_call(
        &mut self,
        args: &[Expr],
        span: Span,
        runtime_fn: impl FnOnce(&mut Self) -> inkwell::values::FunctionValue<'ctx>,
        _arg_ty: TypeName,
        ret_ty: TypeName,
    ) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let (val, _) = self.compile_one_arg(args, "builtin", span)?;
        let f = runtime_fn(self);
        let call = self.builder.build_call(f, &[val.into()], "builtin_call").map_err(|e| self.llvm_error("builtin call", e))?;
        let v = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "builtin call returned no value"))?;
        Ok((v, ret_ty))
    }

    /// `to_string` dispatches on the compiled argument's own type, matching
    /// the semantic analyzer's `to_string(int|double|bool)` overload keys.
    fn compile_to_string(&mut self, args: &[Expr], span: Span) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let (val, ty) = self.compile_one_arg(args, "to_string", span.clone())?;
        let (f, arg) = match ty {
            TypeName::Int => (self.runtime_to_string_int(), val),
            TypeName::Double => (self.runtime_to_string_double(), val),
            TypeName::Float => {
                let widened = self
                    .builder
                    .build_float_ext(val.into_float_value(), self.context.f64_type(), "to_string_widen")
                    .map_err(|e| self.llvm_error("to_string float widen", e))?;
                (self.runtime_to_string_double(), widened.into())
            }
            TypeName::Bool => (self.runtime_to_string_bool(), val),
            TypeName::Str => return Ok((val, TypeName::Str)),
            _ => return Err(self.codegen_error(error_codes::INVALID_TYPE, "to_string() does not support this type").with_span(span)),
        };
        let call = self.builder.build_call(f, &[arg.into()], "to_string").map_err(|e| self.llvm_error("to_string call", e))?;
        let v = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "to_string returned no value"))?;
        Ok((v, TypeName::Str))
    }

    fn compile_libm_unary(&mut self, args: &[Expr], name: &str, span: Span) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let (val, ty) = self.compile_one_arg(args, name, span)?;
        let x = self.to_float_arg(val, &ty)?;
        let f = self.runtime_libm_unary(name);
        let call = self.builder.build_call(f, &[x.into()], name).map_err(|e| self.llvm_error("libm call", e))?;
        let v = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "libm call returned no value"))?;
        Ok((v, TypeName::Double))
    }

    fn compile_libm_binary(&mut self, args: &[Expr], name: &str, span: Span) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let (a, b) = self.compile_two_args(args, name, span)?;
        let x = self.to_float_arg(a.0, &a.1)?;
        let y = self.to_float_arg(b.0, &b.1)?;
        let f = self.runtime_libm_binary(name);
        let call = self.builder.build_call(f, &[x.into(), y.into()], name).map_err(|e| self.llvm_error("libm call", e))?;
        let v = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "libm call returned no value"))?;
        Ok((v, TypeName::Double))
    }

    fn to_float_arg(&mut self, val: BasicValueEnum<'ctx>, ty: &TypeName) -> Result<inkwell::values::FloatValue<'ctx>, CodegenError> {
        match ty {
            TypeName::Double => Ok(val.into_float_value()),
            TypeName::Float => self
                .builder
                .build_float_ext(val.into_float_value(), self.context.f64_type(), "widen")
                .map_err(|e| self.llvm_error("float widen", e)),
            TypeName::Int => self
                .builder
                .build_signed_int_to_float(val.into_int_value(), self.context.f64_type(), "itof")
                .map_err(|e| self.llvm_error("int to float", e)),
            _ => Err(self.codegen_error(error_codes::INVALID_TYPE, "expected a numeric argument")),
        }
    }

    /// `min(int|double)`/`max(int|double)`: resolved at codegen time by
    /// the compiled operand type, same overload scheme as `to_string`.
    fn compile_minmax(&mut self, args: &[Expr], is_min: bool, span: Span) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let (a, b) = self.compile_two_args(args, if is_min { "min" } else { "max" }, span.clone())?;
        let is_float = matches!(a.1, TypeName::Float | TypeName::Double) || matches!(b.1, TypeName::Float | TypeName::Double);
        if is_float {
            let x = self.to_float_arg(a.0, &a.1)?;
            let y = self.to_float_arg(b.0, &b.1)?;
            let predicate = if is_min { inkwell::FloatPredicate::OLT } else { inkwell::FloatPredicate::OGT };
            let cmp = self.builder.build_float_compare(predicate, x, y, "minmax_cmp").map_err(|e| self.llvm_error("minmax compare", e))?;
            let v = self.builder.build_select(cmp, x, y, "minmax").map_err(|e| self.llvm_error("minmax select", e))?;
            Ok((v, TypeName::Double))
        } else {
            let x = a.0.into_int_value();
            let y = b.0.into_int_value();
            let predicate = if is_min { inkwell::IntPredicate::SLT } else { inkwell::IntPredicate::SGT };
            let cmp = self.builder.build_int_compare(predicate, x, y, "minmax_cmp").map_err(|e| self.llvm_error("minmax compare", e))?;
            let v = self.builder.build_select(cmp, x, y, "minmax").map_err(|e| self.llvm_error("minmax select", e))?;
            Ok((v, TypeName::Int))
        }
    }

    fn compile_clamp(&mut self, args: &[Expr], span: Span) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        if args.len() != 3 {
            return Err(self.codegen_error(error_codes::ARGUMENT_COUNT_MISMATCH, "clamp() requires 3 arguments").with_span(span));
        }
        let x = self.compile_expr(&args[0])?;
        let lo = self.compile_expr(&args[1])?;
        let hi = self.compile_expr(&args[2])?;
        let is_float = [&x.1, &lo.1, &hi.1].iter().any(|t| matches!(t, TypeName::Float | TypeName::Double));
        if is_float {
            let xv = self.to_float_arg(x.0, &x.1)?;
            let lov = self.to_float_arg(lo.0, &lo.1)?;
            let hiv = self.to_float_arg(hi.0, &hi.1)?;
            let above_lo = self.builder.build_float_compare(inkwell::FloatPredicate::OLT, xv, lov, "clamp_lo_cmp").map_err(|e| self.llvm_error("clamp", e))?;
            let floored = self.builder.build_select(above_lo, lov, xv, "clamp_lo").map_err(|e| self.llvm_error("clamp", e))?.into_float_value();
            let above_hi = self.builder.build_float_compare(inkwell::FloatPredicate::OGT, floored, hiv, "clamp_hi_cmp").map_err(|e| self.llvm_error("clamp", e))?;
            let v = self.builder.build_select(above_hi, hiv, floored, "clamp_hi").map_err(|e| self.llvm_error("clamp", e))?;
            Ok((v, TypeName::Double))
        } else {
            let xv = x.0.into_int_value();
            let lov = lo.0.into_int_value();
            let hiv = hi.0.into_int_value();
            let below = self.builder.build_int_compare(inkwell::IntPredicate::SLT, xv, lov, "clamp_lo_cmp").map_err(|e| self.llvm_error("clamp", e))?;
            let floored = self.builder.build_select(below, lov, xv, "clamp_lo").map_err(|e| self.llvm_error("clamp", e))?.into_int_value();
            let above = self.builder.build_int_compare(inkwell::IntPredicate::SGT, floored, hiv, "clamp_hi_cmp").map_err(|e| self.llvm_error("clamp", e))?;
            let v = self.builder.build_select(above, hiv, floored, "clamp_hi").map_err(|e| self.llvm_error("clamp", e))?;
            Ok((v, TypeName::Int))
        }
    }

    /// `print`/`println`: builds a dynamic `printf` format string from each
    /// argument's compiled type, applying the C variadic default promotions
    /// (`float` -> `double`, `bool` -> `int`) before the call.
    fn compile_print(&mut self, args: &[Expr], newline: bool) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let mut format = String::new();
        let mut call_args: Vec<inkwell::values::BasicMetadataValueEnum> = Vec::with_capacity(args.len() + 1);
        for arg in args {
            let (val, ty) = self.compile_expr(arg)?;
            match ty {
                TypeName::Str => {
                    format.push_str("%s");
                    call_args.push(val.into());
                }
                TypeName::Int => {
                    format.push_str("%d");
                    call_args.push(val.into());
                }
                TypeName::Bool => {
                    format.push_str("%d");
                    let widened = self
                        .builder
                        .build_int_z_extend(val.into_int_value(), self.context.i32_type(), "bool_promote")
                        .map_err(|e| self.llvm_error("bool promote", e))?;
                    call_args.push(widened.into());
                }
                TypeName::Double => {
                    format.push_str("%f");
                    call_args.push(val.into());
                }
                TypeName::Float => {
                    format.push_str("%f");
                    let widened = self
                        .builder
                        .build_float_ext(val.into_float_value(), self.context.f64_type(), "float_promote")
                        .map_err(|e| self.llvm_error("float promote", e))?;
                    call_args.push(widened.into());
                }
                TypeName::Named(_) | TypeName::Array(_, _) | TypeName::Pointer(_) | TypeName::Void => {
                    format.push_str("%p");
                    call_args.push(val.into());
                }
            }
        }
        if newline {
            format.push('\n');
        }
        let fmt_global = self.builder.build_global_string_ptr(&format, "fmt").map_err(|e| self.llvm_error("format literal", e))?;
        let mut full_args: Vec<inkwell::values::BasicMetadataValueEnum> = vec![fmt_global.as_pointer_value().into()];
        full_args.extend(call_args);
        let printf = self.runtime_printf();
        self.builder.build_call(printf, &full_args, "print").map_err(|e| self.llvm_error("print call", e))?;
        Ok((self.context.i8_type().const_zero().into(), TypeName::Void))
    }

    /// `format`: same per-argument conversion as `to_string`, concatenated
    /// in order with `str_concat` (no runtime `snprintf` shim to build a
    /// single call into, so multi-arg formatting is built up incrementally).
    fn compile_format(&mut self, args: &[Expr]) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        if args.is_empty() {
            let empty = self.builder.build_global_string_ptr("", "empty_str").map_err(|e| self.llvm_error("format literal", e))?;
            return Ok((empty.as_pointer_value().into(), TypeName::Str));
        }
        let mut acc: Option<BasicValueEnum<'ctx>> = None;
        for arg in args {
            let (val, ty) = self.compile_expr(arg)?;
            let piece = match ty {
                TypeName::Str => val,
                TypeName::Int => {
                    let f = self.runtime_to_string_int();
                    let call = self.builder.build_call(f, &[val.into()], "format_int").map_err(|e| self.llvm_error("format call", e))?;
                    call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "conversion returned no value"))?
                }
                TypeName::Double => {
                    let f = self.runtime_to_string_double();
                    let call = self.builder.build_call(f, &[val.into()], "format_double").map_err(|e| self.llvm_error("format call", e))?;
                    call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "conversion returned no value"))?
                }
                TypeName::Float => {
                    let widened = self
                        .builder
                        .build_float_ext(val.into_float_value(), self.context.f64_type(), "format_widen")
                        .map_err(|e| self.llvm_error("format widen", e))?;
                    let f = self.runtime_to_string_double();
                    let call = self.builder.build_call(f, &[widened.into()], "format_float").map_err(|e| self.llvm_error("format call", e))?;
                    call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "conversion returned no value"))?
                }
                TypeName::Bool => {
                    let f = self.runtime_to_string_bool();
                    let call = self.builder.build_call(f, &[val.into()], "format_bool").map_err(|e| self.llvm_error("format call", e))?;
                    call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "conversion returned no value"))?
                }
                TypeName::Named(_) | TypeName::Array(_, _) | TypeName::Pointer(_) | TypeName::Void => val,
            };
            acc = Some(match acc {
                None => piece,
                Some(prev) => {
                    let concat = self.runtime_str_concat();
                    let call = self.builder.build_call(concat, &[prev.into(), piece.into()], "format_concat").map_err(|e| self.llvm_error("format concat", e))?;
                    call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "str_concat returned no value"))?
                }
            });
        }
        Ok((acc.unwrap_or_else(|| self.context.ptr_type(inkwell::AddressSpace::default()).const_null().into()), TypeName::Str))
    }
}

const UNARY_MATH: &[&str] = &[
    "sin", "cos", "tan", "sqrt", "log", "log10", "exp", "abs", "floor", "ceil", "round", "asin", "acos", "atan", "sinh", "cosh", "tanh",
];
