//! Expression codegen, split by expression kind. Since nothing in
//! this AST carries a resolved `TypeInfo` (unlike the semantic analyzer's
//! annotated walk), every lowering returns the value alongside the
//! `TypeName` it produced so callers can coerce/dispatch without
//! re-deriving it from scratch.

use super::types::llvm_basic_type;
use super::{mangled_name, ASTCodeGen};
use crate::error::CodegenError;
use crate::semantic::struct_fields;
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, PointerValue};
use inkwell::{FloatPredicate, IntPredicate};
use quark_ast::{BinaryOp, Expr, ExprKind, TypeName, UnaryOp};
use quark_diagnostics::error_codes;

impl<'ctx> ASTCodeGen<'ctx> {
    pub(crate) fn compile_expr(&mut self, expr: &Expr) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        match &expr.kind {
            ExprKind::Number(n) => {
                if n.fract() == 0.0 && *n >= i32::MIN as f64 && *n <= i32::MAX as f64 {
                    let v = self.context.i32_type().const_int(*n as i64 as u64, true);
                    Ok((v.into(), TypeName::Int))
                } else {
                    let v = self.context.f64_type().const_float(*n);
                    Ok((v.into(), TypeName::Double))
                }
            }
            ExprKind::Str(s) => {
                let ptr = self.intern_global_string(s, "str")?;
                Ok((ptr.into(), TypeName::Str))
            }
            ExprKind::Boolean(b) => {
                let v = self.context.bool_type().const_int(*b as u64, false);
                Ok((v.into(), TypeName::Bool))
            }
            ExprKind::Null => Ok((self.ptr_type().const_null().into(), TypeName::Pointer(Box::new(TypeName::Void)))),
            ExprKind::This => {
                let (ptr, ty) = self.compile_place(expr)?;
                Ok((ptr.into(), TypeName::Pointer(Box::new(ty))))
            }
            ExprKind::Variable(_) => self.compile_variable_read(expr),
            ExprKind::Unary { op, operand } => self.compile_unary(*op, operand, expr.span.clone()),
            ExprKind::Binary { op, lhs, rhs } => self.compile_binary(*op, lhs, rhs, expr.span.clone()),
            ExprKind::Call { callee, args } => self.compile_call(callee, args, expr.span.clone()),
            ExprKind::MethodCall { object, method, args } => self.compile_method_call(object, method, args, expr.span.clone()),
            ExprKind::StaticCall { type_name, method, args } => self.compile_static_call(type_name, method, args, expr.span.clone()),
            ExprKind::FieldAccess { .. } => {
                let (ptr, ty) = self.compile_place(expr)?;
                let llvm_ty = llvm_basic_type(self.context, &ty);
                let loaded = self.builder.build_load(llvm_ty, ptr, "field_val").map_err(|e| self.llvm_error("field load", e))?;
                Ok((loaded, ty))
            }
            ExprKind::Index { .. } => {
                let (ptr, ty) = self.compile_place(expr)?;
                let llvm_ty = llvm_basic_type(self.context, &ty);
                let loaded = self.builder.build_load(llvm_ty, ptr, "idx_val").map_err(|e| self.llvm_error("index load", e))?;
                Ok((loaded, ty))
            }
            ExprKind::ArrayLiteral(elems) => self.compile_array_literal(elems),
            ExprKind::MapLiteral(pairs) => self.compile_map_literal(pairs),
            ExprKind::Range { start, .. } => self.compile_expr(start),
            ExprKind::StructLiteral { type_name, fields } => self.compile_struct_literal(type_name, fields, expr.span.clone()),
            ExprKind::Cast { target, expr: inner } => self.compile_cast(target, inner, expr.span.clone()),
            ExprKind::AddressOf(inner) => {
                let (ptr, ty) = self.compile_place(inner)?;
                Ok((ptr.into(), TypeName::Pointer(Box::new(ty))))
            }
            ExprKind::Deref(_) => {
                let (ptr, ty) = self.compile_place(expr)?;
                let llvm_ty = llvm_basic_type(self.context, &ty);
                let loaded = self.builder.build_load(llvm_ty, ptr, "deref_val").map_err(|e| self.llvm_error("deref load", e))?;
                Ok((loaded, ty))
            }
        }
    }

    /// Resolves an expression to the pointer backing its storage, for
    /// field/index/deref access and `&expr`. Mirrors variable-read resolution order but
    /// never loads the final value.
    pub(crate) fn compile_place(&mut self, expr: &Expr) -> Result<(PointerValue<'ctx>, TypeName), CodegenError> {
        match &expr.kind {
            ExprKind::This => {
                let alloca = *self
                    .variables
                    .get("this")
                    .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, "'this' used outside an instance method"))?;
                let loaded = self
                    .builder
                    .build_load(self.ptr_type(), alloca, "this_ptr")
                    .map_err(|e| self.llvm_error("this load", e))?
                    .into_pointer_value();
                let struct_name = self
                    .current_receiver_struct
                    .clone()
                    .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, "'this' used outside an instance method"))?;
                Ok((loaded, TypeName::Named(struct_name)))
            }
            ExprKind::Variable(name) => {
                let alloca = *self
                    .variables
                    .get(name)
                    .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, format!("undefined variable '{name}'")))?;
                let ty = self
                    .variable_ast_types
                    .get(name)
                    .cloned()
                    .unwrap_or(TypeName::Int);
                match ty {
                    TypeName::Pointer(inner) => {
                        let loaded = self
                            .builder
                            .build_load(self.ptr_type(), alloca, "ptr_load")
                            .map_err(|e| self.llvm_error("pointer load", e))?
                            .into_pointer_value();
                        Ok((loaded, *inner))
                    }
                    other => Ok((alloca, other)),
                }
            }
            ExprKind::FieldAccess { object, field } => {
                let (obj_ptr, obj_ty) = self.compile_place(object)?;
                let struct_name = match obj_ty {
                    TypeName::Named(s) => s,
                    _ => {
                        return Err(self.codegen_error(
                            error_codes::INVALID_TYPE,
                            format!("cannot access field '{field}' on a non-struct value"),
                        ))
                    }
                };
                let fields = struct_fields(&self.struct_defs, &struct_name);
                let idx = fields
                    .iter()
                    .position(|f| f.name == *field)
                    .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, format!("unknown field '{field}' on '{struct_name}'")))?;
                let struct_ty = *self
                    .struct_types
                    .get(&struct_name)
                    .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, format!("unknown struct '{struct_name}'")))?;
                let field_ptr = self
                    .builder
                    .build_struct_gep(struct_ty, obj_ptr, idx as u32, field)
                    .map_err(|e| self.llvm_error("field gep", e))?;
                Ok((field_ptr, fields[idx].type_name.clone()))
            }
            ExprKind::Index { base, index } => {
                let (base_val, base_ty) = self.compile_expr(base)?;
                if matches!(&base_ty, TypeName::Named(n) if n == "Map") {
                    // `quark_map_get` returns its result by value rather than an
                    // address; spill it to a temporary so callers that expect
                    // `compile_place` to hand back a loadable slot still work.
                    let (key_val, _) = self.compile_expr(index)?;
                    let get_fn = self.runtime_map_get();
                    let call = self
                        .builder
                        .build_call(get_fn, &[base_val.into(), key_val.into()], "map_get")
                        .map_err(|e| self.llvm_error("quark_map_get call", e))?;
                    let result = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "quark_map_get returned no value"))?;
                    let slot = self.build_entry_alloca(self.ptr_type().into(), "map_get_slot")?;
                    self.builder.build_store(slot, result).map_err(|e| self.llvm_error("map_get store", e))?;
                    return Ok((slot, TypeName::Str));
                }
                let elem_ty = match base_ty {
                    TypeName::Array(elem, _) => *elem,
                    TypeName::Pointer(inner) => *inner,
                    _ => {
                        return Err(self.codegen_error(error_codes::INVALID_TYPE, "indexed expression is not an array or pointer"));
                    }
                };
                let (idx_val, _) = self.compile_expr(index)?;
                let elem_llvm = llvm_basic_type(self.context, &elem_ty);
                let base_ptr = base_val.into_pointer_value();
                let gep = unsafe {
                    self.builder
                        .build_gep(elem_llvm, base_ptr, &[idx_val.into_int_value()], "idx")
                        .map_err(|e| self.llvm_error("index gep", e))?
                };
                Ok((gep, elem_ty))
            }
            ExprKind::Deref(inner) => {
                let (val, ty) = self.compile_expr(inner)?;
                let pointee = match ty {
                    TypeName::Pointer(inner_ty) => *inner_ty,
                    _ => TypeName::Int,
                };
                Ok((val.into_pointer_value(), pointee))
            }
            _ => Err(self.codegen_error(error_codes::INVALID_OPERATION, "expression is not addressable")),
        }
    }

    fn compile_variable_read(&mut self, expr: &Expr) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let ExprKind::Variable(name) = &expr.kind else { unreachable!() };
        if let Some(alloca) = self.variables.get(name).copied() {
            let ty = self.variable_ast_types.get(name).cloned().unwrap_or(TypeName::Int);
            // Named bindings hold the struct's own address directly (no
            // separate slot indirection, matching `compile_place`'s treatment
            // and `compile_struct_literal`'s alloca-is-the-value convention).
            if let TypeName::Named(_) = ty {
                return Ok((alloca.into(), ty));
            }
            let llvm_ty = llvm_basic_type(self.context, &ty);
            let loaded = self
                .builder
                .build_load(llvm_ty, alloca, name)
                .map_err(|e| self.llvm_error("variable load", e))?;
            return Ok((loaded, ty));
        }
        if let Some(f) = self.functions.get(name).copied() {
            return Ok((f.as_global_value().as_pointer_value().into(), TypeName::Pointer(Box::new(TypeName::Void))));
        }
        Err(self.codegen_error(error_codes::SYMBOL_NOT_FOUND, format!("undefined variable '{name}'")))
    }

    fn compile_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        span: quark_diagnostics::Span,
    ) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let (val, ty) = self.compile_expr(operand)?;
        match op {
            UnaryOp::Neg => match ty {
                TypeName::Int => {
                    let v = self.builder.build_int_neg(val.into_int_value(), "neg").map_err(|e| self.llvm_error("neg", e))?;
                    Ok((v.into(), TypeName::Int))
                }
                TypeName::Float | TypeName::Double => {
                    let v = self.builder.build_float_neg(val.into_float_value(), "fneg").map_err(|e| self.llvm_error("fneg", e))?;
                    Ok((v.into(), ty))
                }
                _ => Err(self.codegen_error(error_codes::INVALID_TYPE, "unary '-' requires a numeric operand").with_span(span)),
            },
            UnaryOp::Not => {
                let v = self.builder.build_not(val.into_int_value(), "not").map_err(|e| self.llvm_error("not", e))?;
                Ok((v.into(), TypeName::Bool))
            }
        }
    }

    fn compile_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        span: quark_diagnostics::Span,
    ) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            return self.compile_short_circuit(op, lhs, rhs);
        }

        let (lv, lt) = self.compile_expr(lhs)?;
        let (rv, rt) = self.compile_expr(rhs)?;

        if matches!(op, BinaryOp::Add) && matches!(lt, TypeName::Str) && matches!(rt, TypeName::Str) {
            let concat = self.runtime_str_concat();
            let call = self
                .builder
                .build_call(concat, &[lv.into(), rv.into()], "str_concat")
                .map_err(|e| self.llvm_error("str_concat call", e))?;
            let result = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "str_concat returned no value"))?;
            return Ok((result, TypeName::Str));
        }

        if matches!(lt, TypeName::Str) && matches!(rt, TypeName::Str) {
            let strcmp = self.runtime_strcmp();
            let call = self
                .builder
                .build_call(strcmp, &[lv.into(), rv.into()], "strcmp")
                .map_err(|e| self.llvm_error("strcmp call", e))?;
            let cmp = call
                .try_as_basic_value()
                .left()
                .ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "strcmp returned no value"))?
                .into_int_value();
            let zero = self.context.i32_type().const_zero();
            let predicate = match op {
                BinaryOp::Eq => IntPredicate::EQ,
                BinaryOp::NotEq => IntPredicate::NE,
                BinaryOp::Lt => IntPredicate::SLT,
                BinaryOp::Gt => IntPredicate::SGT,
                BinaryOp::Le => IntPredicate::SLE,
                BinaryOp::Ge => IntPredicate::SGE,
                _ => return Err(self.codegen_error(error_codes::INVALID_OPERATION, "unsupported string operator").with_span(span)),
            };
            let v = self.builder.build_int_compare(predicate, cmp, zero, "strcmp_result").map_err(|e| self.llvm_error("strcmp compare", e))?;
            return Ok((v.into(), TypeName::Bool));
        }

        let is_float = matches!(lt, TypeName::Float | TypeName::Double) || matches!(rt, TypeName::Float | TypeName::Double);

        if is_float && is_comparison(op) {
            let target_is_double = matches!(widen(&lt, &rt), TypeName::Double);
            let lf = self.to_float(lv, &lt, target_is_double)?;
            let rf = self.to_float(rv, &rt, target_is_double)?;
            let predicate = match op {
                BinaryOp::Eq => FloatPredicate::OEQ,
                BinaryOp::NotEq => FloatPredicate::ONE,
                BinaryOp::Lt => FloatPredicate::OLT,
                BinaryOp::Gt => FloatPredicate::OGT,
                BinaryOp::Le => FloatPredicate::OLE,
                BinaryOp::Ge => FloatPredicate::OGE,
                _ => unreachable!(),
            };
            let v = self.builder.build_float_compare(predicate, lf, rf, "fcmp").map_err(|e| self.llvm_error("float compare", e))?;
            return Ok((v.into(), TypeName::Bool));
        }
        if is_float {
            return self.compile_arithmetic(op, lv, &lt, rv, &rt, span);
        }

        // Pointer/null equality (I/void*): ptrtoint then integer compare.
        if matches!(lt, TypeName::Pointer(_)) || matches!(rt, TypeName::Pointer(_)) {
            let i64_ty = self.context.i64_type();
            let li = self
                .builder
                .build_ptr_to_int(lv.into_pointer_value(), i64_ty, "lptr")
                .map_err(|e| self.llvm_error("ptrtoint", e))?;
            let ri = self
                .builder
                .build_ptr_to_int(rv.into_pointer_value(), i64_ty, "rptr")
                .map_err(|e| self.llvm_error("ptrtoint", e))?;
            let predicate = match op {
                BinaryOp::Eq => IntPredicate::EQ,
                BinaryOp::NotEq => IntPredicate::NE,
                _ => return Err(self.codegen_error(error_codes::INVALID_OPERATION, "pointers only support ==/!=").with_span(span)),
            };
            let v = self.builder.build_int_compare(predicate, li, ri, "ptrcmp").map_err(|e| self.llvm_error("ptr compare", e))?;
            return Ok((v.into(), TypeName::Bool));
        }

        if is_comparison(op) {
            let li = lv.into_int_value();
            let ri = rv.into_int_value();
            let predicate = match op {
                BinaryOp::Eq => IntPredicate::EQ,
                BinaryOp::NotEq => IntPredicate::NE,
                BinaryOp::Lt => IntPredicate::SLT,
                BinaryOp::Gt => IntPredicate::SGT,
                BinaryOp::Le => IntPredicate::SLE,
                BinaryOp::Ge => IntPredicate::SGE,
                _ => unreachable!(),
            };
            let v = self.builder.build_int_compare(predicate, li, ri, "icmp").map_err(|e| self.llvm_error("int compare", e))?;
            return Ok((v.into(), TypeName::Bool));
        }
        self.compile_arithmetic(op, lv, &lt, rv, &rt, span)
    }

    /// `&&`/`||` short-circuit via a dedicated rhs block and a phi at the
    /// merge block, rather than eagerly evaluating both sides.
    fn compile_short_circuit(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let current_fn = self.current_function.ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "logical operator outside a function"))?;
        let lhs_val = self.gen_expr_bool(lhs)?;
        let entry_bb = self.builder.get_insert_block().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "no active block"))?;

        let rhs_bb = self.context.append_basic_block(current_fn, "logic_rhs");
        let merge_bb = self.context.append_basic_block(current_fn, "logic_merge");
        match op {
            BinaryOp::And => self.builder.build_conditional_branch(lhs_val, rhs_bb, merge_bb),
            BinaryOp::Or => self.builder.build_conditional_branch(lhs_val, merge_bb, rhs_bb),
            _ => unreachable!(),
        }
        .map_err(|e| self.llvm_error("logical branch", e))?;

        self.builder.position_at_end(rhs_bb);
        let rhs_val = self.gen_expr_bool(rhs)?;
        let rhs_end_bb = self.builder.get_insert_block().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "no active block"))?;
        self.builder.build_unconditional_branch(merge_bb).map_err(|e| self.llvm_error("logical merge branch", e))?;

        self.builder.position_at_end(merge_bb);
        let short_circuit_value = self.context.bool_type().const_int(matches!(op, BinaryOp::Or) as u64, false);
        let phi = self.builder.build_phi(self.context.bool_type(), "logic_result").map_err(|e| self.llvm_error("logical phi", e))?;
        phi.add_incoming(&[(&short_circuit_value, entry_bb), (&rhs_val, rhs_end_bb)]);
        Ok((phi.as_basic_value(), TypeName::Bool))
    }

    /// Coerces an expression to `i1`, the entry point for every branch
    /// condition.
    pub(crate) fn gen_expr_bool(&mut self, expr: &Expr) -> Result<inkwell::values::IntValue<'ctx>, CodegenError> {
        let (val, ty) = self.compile_expr(expr)?;
        match ty {
            TypeName::Bool => Ok(val.into_int_value()),
            TypeName::Int => {
                let zero = val.into_int_value().get_type().const_zero();
                self.builder
                    .build_int_compare(IntPredicate::NE, val.into_int_value(), zero, "tobool")
                    .map_err(|e| self.llvm_error("bool coercion", e))
            }
            _ => Err(self.codegen_error(error_codes::INVALID_TYPE, "expected a boolean expression").with_span(expr.span.clone())),
        }
    }

    /// Coerces an expression to `i32`, used by for-range bounds.
    pub(crate) fn gen_expr_int(&mut self, expr: &Expr) -> Result<inkwell::values::IntValue<'ctx>, CodegenError> {
        let (val, ty) = self.compile_expr(expr)?;
        match ty {
            TypeName::Int => Ok(val.into_int_value()),
            TypeName::Bool => self
                .builder
                .build_int_z_extend(val.into_int_value(), self.context.i32_type(), "booltoi32")
                .map_err(|e| self.llvm_error("int coercion", e)),
            TypeName::Float | TypeName::Double => self
                .builder
                .build_float_to_signed_int(val.into_float_value(), self.context.i32_type(), "floattoi32")
                .map_err(|e| self.llvm_error("int coercion", e)),
            _ => Err(self.codegen_error(error_codes::INVALID_TYPE, "expected a numeric expression").with_span(expr.span.clone())),
        }
    }

    /// Shared numeric-arithmetic core for `+ - * / %`, factored out so
    /// compound assignment (`statements.rs`) can reuse it without going
    /// through a synthetic AST node.
    pub(crate) fn compile_arithmetic(
        &mut self,
        op: BinaryOp,
        lv: BasicValueEnum<'ctx>,
        lt: &TypeName,
        rv: BasicValueEnum<'ctx>,
        rt: &TypeName,
        span: quark_diagnostics::Span,
    ) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        if matches!(op, BinaryOp::Add) && matches!(lt, TypeName::Str) && matches!(rt, TypeName::Str) {
            let concat = self.runtime_str_concat();
            let call = self.builder.build_call(concat, &[lv.into(), rv.into()], "str_concat").map_err(|e| self.llvm_error("str_concat call", e))?;
            let result = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "str_concat returned no value"))?;
            return Ok((result, TypeName::Str));
        }
        let is_float = matches!(lt, TypeName::Float | TypeName::Double) || matches!(rt, TypeName::Float | TypeName::Double);
        let result_ty = widen(lt, rt);
        if is_float {
            let target_is_double = matches!(result_ty, TypeName::Double);
            let lf = self.to_float(lv, lt, target_is_double)?;
            let rf = self.to_float(rv, rt, target_is_double)?;
            let v = match op {
                BinaryOp::Add => self.builder.build_float_add(lf, rf, "fadd"),
                BinaryOp::Sub => self.builder.build_float_sub(lf, rf, "fsub"),
                BinaryOp::Mul => self.builder.build_float_mul(lf, rf, "fmul"),
                BinaryOp::Div => self.builder.build_float_div(lf, rf, "fdiv"),
                BinaryOp::Mod => self.builder.build_float_rem(lf, rf, "frem"),
                _ => return Err(self.codegen_error(error_codes::INVALID_OPERATION, "unsupported float operator").with_span(span)),
            }
            .map_err(|e| self.llvm_error("float arithmetic", e))?;
            return Ok((v.into(), result_ty));
        }
        let li = lv.into_int_value();
        let ri = rv.into_int_value();
        let v = match op {
            BinaryOp::Add => self.builder.build_int_add(li, ri, "iadd"),
            BinaryOp::Sub => self.builder.build_int_sub(li, ri, "isub"),
            BinaryOp::Mul => self.builder.build_int_mul(li, ri, "imul"),
            BinaryOp::Div => self.builder.build_int_signed_div(li, ri, "idiv"),
            BinaryOp::Mod => self.builder.build_int_signed_rem(li, ri, "irem"),
            _ => return Err(self.codegen_error(error_codes::INVALID_OPERATION, "unsupported integer operator").with_span(span)),
        }
        .map_err(|e| self.llvm_error("integer arithmetic", e))?;
        Ok((v.into(), TypeName::Int))
    }

    /// Converts `val` to a float of the common arithmetic width
    /// (`f64` when `target_is_double`, else `f32`), matching spec §4.H's
    /// "if either side is double, promote both to double; else if
    /// either is float, promote both". A bare `f32`/`f64` cast between
    /// mismatched widths is malformed IR, so `Float`/`Double` operands
    /// are extended/truncated here rather than passed through as-is.
    fn to_float(&mut self, val: BasicValueEnum<'ctx>, ty: &TypeName, target_is_double: bool) -> Result<inkwell::values::FloatValue<'ctx>, CodegenError> {
        let target = if target_is_double { self.context.f64_type() } else { self.context.f32_type() };
        match ty {
            TypeName::Double if !target_is_double => {
                self.builder.build_float_trunc(val.into_float_value(), target, "dtof").map_err(|e| self.llvm_error("double to float", e))
            }
            TypeName::Float if target_is_double => {
                self.builder.build_float_ext(val.into_float_value(), target, "ftod").map_err(|e| self.llvm_error("float to double", e))
            }
            TypeName::Float | TypeName::Double => Ok(val.into_float_value()),
            TypeName::Int => self
                .builder
                .build_signed_int_to_float(val.into_int_value(), target, "itof")
                .map_err(|e| self.llvm_error("int to float", e)),
            _ => Err(self.codegen_error(error_codes::INVALID_TYPE, "expected a numeric value")),
        }
    }

    fn compile_call(&mut self, callee: &str, args: &[Expr], span: quark_diagnostics::Span) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        if let Some(result) = self.compile_builtin_call(callee, args, span.clone())? {
            return Ok(result);
        }

        let resolved_name = self.resolve_call_name(callee, args.len());
        let fn_val = self
            .functions
            .get(&resolved_name)
            .copied()
            .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, format!("undefined function '{callee}'")))?;
        let ret_ty = self
            .function_defs
            .get(&resolved_name)
            .map(|f| f.return_type.clone())
            .or_else(|| self.extern_defs.get(&resolved_name).map(|f| f.return_type.clone()))
            .unwrap_or(TypeName::Void);

        let mut arg_vals: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len());
        for a in args {
            arg_vals.push(self.compile_expr(a)?.0.into());
        }
        let call = self.builder.build_call(fn_val, &arg_vals, "call").map_err(|e| self.llvm_error("call", e))?;
        let value = call.try_as_basic_value().left().unwrap_or_else(|| self.zero_value(&ret_ty));
        Ok((value, ret_ty))
    }

    /// Mirrors `semantic::expressions::resolve_call_target`'s overload-key
    /// lookup for builtins registered under a typed key (`min(int)`).
    fn resolve_call_name(&self, callee: &str, arg_count: usize) -> String {
        if self.functions.contains_key(callee) || self.extern_defs.contains_key(callee) {
            return callee.to_string();
        }
        for suffix in ["int", "double", "bool"] {
            let key = format!("{callee}({suffix})");
            if let Some(f) = self.function_defs.get(&key) {
                if f.params.len() == arg_count {
                    return key;
                }
            }
        }
        callee.to_string()
    }

    fn zero_value(&self, ty: &TypeName) -> BasicValueEnum<'ctx> {
        super::types::default_value(self.context, ty)
    }

    fn compile_method_call(
        &mut self,
        object: &Expr,
        method: &str,
        args: &[Expr],
        span: quark_diagnostics::Span,
    ) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let is_this_receiver = matches!(object.kind, ExprKind::This);
        let (obj_ptr, obj_ty) = self.compile_place(object)?;

        if let TypeName::Array(elem, _) = &obj_ty {
            return self.compile_array_method(obj_ptr, elem, method, args, span);
        }

        let struct_name = match &obj_ty {
            TypeName::Named(s) => s.clone(),
            _ => return Err(self.codegen_error(error_codes::METHOD_CALL_NOT_STRUCT, format!("cannot call '.{method}' on a non-struct value")).with_span(span)),
        };

        let mut arg_vals: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len());
        for a in args {
            arg_vals.push(self.compile_expr(a)?.0.into());
        }

        if is_this_receiver {
            self.compile_dynamic_dispatch(obj_ptr, &struct_name, method, &arg_vals, span)
        } else {
            let dyn_name = self.intern_global_string(&struct_name, "dyn_name")?;
            self.compile_static_method_call(obj_ptr, dyn_name, &struct_name, method, &arg_vals, span)
        }
    }

    /// Known derived overrides of `base::method`: structs whose ancestor
    /// chain includes `base` and which directly declare `method`. Dispatch
    /// emits a chain of `strcmp(dynName, "Tk") == 0` checks against each
    /// one known at compile time.
    fn derived_overrides(&self, base: &str, method: &str) -> Vec<String> {
        let mut out = Vec::new();
        for (name, def) in &self.struct_defs {
            if name == base {
                continue;
            }
            if !self.is_descendant_of(name, base) {
                continue;
            }
            if def.methods.iter().any(|m| m.name == method) {
                out.push(name.clone());
            }
        }
        out.sort();
        out
    }

    fn is_descendant_of(&self, name: &str, ancestor: &str) -> bool {
        let mut current = self.struct_defs.get(name).and_then(|d| d.parent.clone());
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.struct_defs.get(&p).and_then(|d| d.parent.clone());
        }
        false
    }

    /// `obj.m(args)` where `obj` is `this`: strcmp dispatch chain against
    /// every known override, falling through to the statically resolved
    /// implementation.
    fn compile_dynamic_dispatch(
        &mut self,
        receiver: PointerValue<'ctx>,
        struct_name: &str,
        method: &str,
        arg_vals: &[BasicMetadataValueEnum<'ctx>],
        span: quark_diagnostics::Span,
    ) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let overrides = self.derived_overrides(struct_name, method);
        let dyn_name_ptr = *self
            .variables
            .get("__dyn_type_name")
            .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, "'this' method call outside an instance method"))?;
        let dyn_name = self
            .builder
            .build_load(self.ptr_type(), dyn_name_ptr, "dyn_name")
            .map_err(|e| self.llvm_error("dyn name load", e))?
            .into_pointer_value();

        let (base_name, base_def) = self
            .find_declaring_method(struct_name, method)
            .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, format!("unknown method '{struct_name}::{method}'")))?;
        let ret_ty = base_def.return_type.clone();

        if overrides.is_empty() {
            return self.compile_static_method_call(receiver, dyn_name, &base_name, method, arg_vals, span);
        }

        let current_fn = self.current_function.ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "method call outside a function"))?;
        let merge_bb = self.context.append_basic_block(current_fn, "dispatch_merge");
        let result_alloca = self
            .builder
            .build_alloca(llvm_basic_type(self.context, &ret_ty), "dispatch_result")
            .map_err(|e| self.llvm_error("dispatch result alloca", e))?;

        let strcmp = self.runtime_strcmp();
        for candidate in &overrides {
            let check_bb = self.context.append_basic_block(current_fn, "dispatch_check");
            let then_bb = self.context.append_basic_block(current_fn, "dispatch_hit");
            let next_bb = self.context.append_basic_block(current_fn, "dispatch_miss");
            self.builder.build_unconditional_branch(check_bb).map_err(|e| self.llvm_error("dispatch branch", e))?;
            self.builder.position_at_end(check_bb);
            let candidate_name = self.intern_global_string(candidate, "candidate_name")?;
            let call = self
                .builder
                .build_call(strcmp, &[dyn_name.into(), candidate_name.into()], "strcmp")
                .map_err(|e| self.llvm_error("strcmp call", e))?;
            let cmp = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "strcmp returned no value"))?.into_int_value();
            let zero = self.context.i32_type().const_zero();
            let is_match = self.builder.build_int_compare(IntPredicate::EQ, cmp, zero, "is_match").map_err(|e| self.llvm_error("dispatch compare", e))?;
            self.builder.build_conditional_branch(is_match, then_bb, next_bb).map_err(|e| self.llvm_error("dispatch cond branch", e))?;

            self.builder.position_at_end(then_bb);
            let (val, _) = self.compile_static_method_call(receiver, dyn_name, candidate, method, arg_vals, span.clone())?;
            if !matches!(ret_ty, TypeName::Void) {
                self.builder.build_store(result_alloca, val).map_err(|e| self.llvm_error("dispatch store", e))?;
            }
            self.builder.build_unconditional_branch(merge_bb).map_err(|e| self.llvm_error("dispatch merge branch", e))?;

            self.builder.position_at_end(next_bb);
        }

        // Fell through every override: call the statically resolved base implementation.
        let (val, _) = self.compile_static_method_call(receiver, dyn_name, &base_name, method, arg_vals, span)?;
        if !matches!(ret_ty, TypeName::Void) {
            self.builder.build_store(result_alloca, val).map_err(|e| self.llvm_error("dispatch store", e))?;
        }
        self.builder.build_unconditional_branch(merge_bb).map_err(|e| self.llvm_error("dispatch merge branch", e))?;

        self.builder.position_at_end(merge_bb);
        if matches!(ret_ty, TypeName::Void) {
            Ok((self.context.i8_type().const_zero().into(), TypeName::Void))
        } else {
            let loaded = self
                .builder
                .build_load(llvm_basic_type(self.context, &ret_ty), result_alloca, "dispatch_value")
                .map_err(|e| self.llvm_error("dispatch result load", e))?;
            Ok((loaded, ret_ty))
        }
    }

    fn find_declaring_method(&self, struct_name: &str, method: &str) -> Option<(String, quark_ast::Function)> {
        let mut current = Some(struct_name.to_string());
        while let Some(name) = current {
            let def = self.struct_defs.get(&name)?;
            if let Some(m) = def.methods.iter().find(|m| m.name == method) {
                return Some((name, m.clone()));
            }
            current = def.parent.clone();
        }
        None
    }

    fn compile_static_method_call(
        &mut self,
        receiver: PointerValue<'ctx>,
        dyn_name: PointerValue<'ctx>,
        declaring_struct: &str,
        method: &str,
        arg_vals: &[BasicMetadataValueEnum<'ctx>],
        span: quark_diagnostics::Span,
    ) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let mangled = mangled_name(declaring_struct, method);
        let fn_val = self
            .functions
            .get(&mangled)
            .copied()
            .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, format!("unknown method '{mangled}'")).with_span(span))?;
        let ret_ty = self.function_defs.get(&mangled).map(|f| f.return_type.clone()).unwrap_or(TypeName::Void);
        let mut full_args: Vec<BasicMetadataValueEnum> = vec![receiver.into(), dyn_name.into()];
        full_args.extend_from_slice(arg_vals);
        let call = self.builder.build_call(fn_val, &full_args, "methodcall").map_err(|e| self.llvm_error("method call", e))?;
        let value = call.try_as_basic_value().left().unwrap_or_else(|| self.zero_value(&ret_ty));
        Ok((value, ret_ty))
    }

    /// `T::m(args)`. Two shapes share this syntax: a genuine static method
    /// (no `self` in its declaration — a constructor-style factory) takes
    /// only the user args; an instance method named this way is the
    /// explicit-base-call idiom (`Base::greet()` from inside an override)
    /// and needs the same hidden `(selfPtr, dynamicTypeName)` prologue as
    /// any other instance method (invariant I6), sourced from the
    /// enclosing method's own `this`/`__dyn_type_name` slots rather than
    /// from an expression in `args` — `T::m(...)` carries no receiver
    /// expression in the grammar.
    fn compile_static_call(
        &mut self,
        type_name: &str,
        method: &str,
        args: &[Expr],
        span: quark_diagnostics::Span,
    ) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let mangled = mangled_name(type_name, method);
        let fn_val = self
            .functions
            .get(&mangled)
            .copied()
            .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, format!("unknown static method '{mangled}'")).with_span(span))?;
        let target = self.function_defs.get(&mangled).cloned();
        let ret_ty = target.as_ref().map(|f| f.return_type.clone()).unwrap_or(TypeName::Void);
        let is_instance_method = target.as_ref().map(|f| f.is_instance_method).unwrap_or(false);

        let mut arg_vals: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len() + 2);
        if is_instance_method {
            let this_slot = *self
                .variables
                .get("this")
                .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, "explicit 'T::m()' call to an instance method outside an instance method body").with_span(span.clone()))?;
            let receiver = self.builder.build_load(self.ptr_type(), this_slot, "this").map_err(|e| self.llvm_error("static call receiver load", e))?;
            let dyn_name = self.intern_global_string(type_name, "dyn_name")?;
            arg_vals.push(receiver.into());
            arg_vals.push(dyn_name.into());
        }
        for a in args {
            arg_vals.push(self.compile_expr(a)?.0.into());
        }
        let call = self.builder.build_call(fn_val, &arg_vals, "staticcall").map_err(|e| self.llvm_error("static call", e))?;
        let value = call.try_as_basic_value().left().unwrap_or_else(|| self.zero_value(&ret_ty));
        Ok((value, ret_ty))
    }

    fn array_elem_size(&self, elem_ty: &TypeName) -> u32 {
        match elem_ty {
            TypeName::Int | TypeName::Float => 4,
            TypeName::Double => 8,
            TypeName::Bool => 1,
            TypeName::Void => 0,
            TypeName::Str | TypeName::Named(_) | TypeName::Array(_, _) | TypeName::Pointer(_) => 8,
        }
    }

    fn compile_array_literal(&mut self, elems: &[Expr]) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        if elems.is_empty() {
            let fn_new = self.runtime_array_new();
            let size = self.context.i32_type().const_int(4, false);
            let count = self.context.i32_type().const_zero();
            let call = self.builder.build_call(fn_new, &[size.into(), count.into()], "array_new").map_err(|e| self.llvm_error("array_new call", e))?;
            let ptr = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "array_new returned no value"))?;
            return Ok((ptr, TypeName::Array(Box::new(TypeName::Int), Some(0))));
        }

        let mut vals = Vec::with_capacity(elems.len());
        let mut elem_ty = None;
        for e in elems {
            let (v, t) = self.compile_expr(e)?;
            if elem_ty.is_none() {
                elem_ty = Some(t);
            }
            vals.push(v);
        }
        let elem_ty = elem_ty.ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "array literal has no elements"))?;
        let elem_size = self.array_elem_size(&elem_ty);
        let count = vals.len();

        let fn_new = self.runtime_array_new();
        let size_c = self.context.i32_type().const_int(elem_size as u64, false);
        let count_c = self.context.i32_type().const_int(count as u64, false);
        let call = self.builder.build_call(fn_new, &[size_c.into(), count_c.into()], "array_new").map_err(|e| self.llvm_error("array_new call", e))?;
        let base_ptr = call
            .try_as_basic_value()
            .left()
            .ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "array_new returned no value"))?
            .into_pointer_value();

        let elem_llvm = llvm_basic_type(self.context, &elem_ty);
        for (i, v) in vals.into_iter().enumerate() {
            let idx = self.context.i32_type().const_int(i as u64, false);
            let gep = unsafe { self.builder.build_gep(elem_llvm, base_ptr, &[idx], "arrinit").map_err(|e| self.llvm_error("array init gep", e))? };
            self.builder.build_store(gep, v).map_err(|e| self.llvm_error("array init store", e))?;
        }
        Ok((base_ptr.into(), TypeName::Array(Box::new(elem_ty), Some(count))))
    }

    fn compile_array_method(
        &mut self,
        array_ptr: PointerValue<'ctx>,
        elem_ty: &TypeName,
        method: &str,
        args: &[Expr],
        span: quark_diagnostics::Span,
    ) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let base_val = self
            .builder
            .build_load(self.ptr_type(), array_ptr, "array_base")
            .map_err(|e| self.llvm_error("array base load", e))?;
        match method {
            "len" | "length" | "count" => {
                let len_fn = self.runtime_array_length();
                let call = self.builder.build_call(len_fn, &[base_val.into()], "array_len").map_err(|e| self.llvm_error("array_length call", e))?;
                let v = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "array_length returned no value"))?;
                Ok((v, TypeName::Int))
            }
            "push" => {
                let (elem_val, _) = self.compile_expr(args.first().ok_or_else(|| self.codegen_error(error_codes::ARGUMENT_COUNT_MISMATCH, "push() requires one argument"))?)?;
                let temp = self.build_entry_alloca(llvm_basic_type(self.context, elem_ty), "push_tmp")?;
                self.builder.build_store(temp, elem_val).map_err(|e| self.llvm_error("push store", e))?;
                let elem_size = self.context.i32_type().const_int(self.array_elem_size(elem_ty) as u64, false);
                let push_fn = self.runtime_array_push();
                let call = self
                    .builder
                    .build_call(push_fn, &[base_val.into(), temp.into(), elem_size.into()], "array_push")
                    .map_err(|e| self.llvm_error("array_push call", e))?;
                let new_base = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "array_push returned no value"))?;
                self.builder.build_store(array_ptr, new_base).map_err(|e| self.llvm_error("push writeback", e))?;
                Ok((self.context.i8_type().const_zero().into(), TypeName::Void))
            }
            "pop" => {
                let elem_size = self.context.i32_type().const_int(self.array_elem_size(elem_ty) as u64, false);
                let pop_fn = self.runtime_array_pop();
                let call = self.builder.build_call(pop_fn, &[base_val.into(), elem_size.into()], "array_pop").map_err(|e| self.llvm_error("array_pop call", e))?;
                let raw = call
                    .try_as_basic_value()
                    .left()
                    .ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "array_pop returned no value"))?
                    .into_float_value();
                let coerced = match elem_ty {
                    TypeName::Double => raw.into(),
                    TypeName::Float => self.builder.build_float_trunc(raw, self.context.f32_type(), "pop_f32").map_err(|e| self.llvm_error("pop narrow", e))?.into(),
                    TypeName::Int | TypeName::Bool => {
                        let as_int = self.builder.build_float_to_signed_int(raw, self.context.i64_type(), "pop_bits").map_err(|e| self.llvm_error("pop to int", e))?;
                        let target = llvm_basic_type(self.context, elem_ty).into_int_type();
                        self.builder.build_int_truncate(as_int, target, "pop_trunc").map_err(|e| self.llvm_error("pop truncate", e))?.into()
                    }
                    _ => raw.into(),
                };
                Ok((coerced, elem_ty.clone()))
            }
            "slice" => {
                let start = args.first().ok_or_else(|| self.codegen_error(error_codes::ARGUMENT_COUNT_MISMATCH, "slice() requires a start argument"))?;
                let end = args.get(1).ok_or_else(|| self.codegen_error(error_codes::ARGUMENT_COUNT_MISMATCH, "slice() requires an end argument"))?;
                let start_val = self.gen_expr_int(start)?;
                let end_val = self.gen_expr_int(end)?;
                let elem_size = self.context.i32_type().const_int(self.array_elem_size(elem_ty) as u64, false);
                let slice_fn = self.runtime_array_slice();
                let call = self
                    .builder
                    .build_call(slice_fn, &[base_val.into(), start_val.into(), end_val.into(), elem_size.into()], "array_slice")
                    .map_err(|e| self.llvm_error("quark_array_slice call", e))?;
                let v = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "quark_array_slice returned no value"))?;
                Ok((v, TypeName::Array(Box::new(elem_ty.clone()), None)))
            }
            "free" => {
                let free_fn = self.runtime_array_free();
                self.builder.build_call(free_fn, &[base_val.into()], "array_free").map_err(|e| self.llvm_error("quark_array_free call", e))?;
                Ok((self.context.i8_type().const_zero().into(), TypeName::Void))
            }
            _ => Err(self.codegen_error(error_codes::ARRAY_METHOD_UNSUPPORTED, format!("unsupported array method '{method}'")).with_span(span)),
        }
    }

    fn compile_map_literal(&mut self, pairs: &[(Expr, Expr)]) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let new_fn = self.runtime_map_new();
        let call = self.builder.build_call(new_fn, &[], "map_new").map_err(|e| self.llvm_error("quark_map_new call", e))?;
        let map_ptr = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "quark_map_new returned no value"))?;
        let set_fn = self.runtime_map_set();
        for (k, v) in pairs {
            let (kv, _) = self.compile_expr(k)?;
            let (vv, _) = self.compile_expr(v)?;
            self.builder.build_call(set_fn, &[map_ptr.into(), kv.into(), vv.into()], "map_set").map_err(|e| self.llvm_error("quark_map_set call", e))?;
        }
        Ok((map_ptr, TypeName::Named("Map".to_string())))
    }

    fn compile_struct_literal(
        &mut self,
        type_name: &str,
        fields: &[(String, Expr)],
        span: quark_diagnostics::Span,
    ) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let struct_ty = *self
            .struct_types
            .get(type_name)
            .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, format!("unknown struct '{type_name}'")).with_span(span.clone()))?;
        let alloca = self.build_entry_alloca(struct_ty.into(), &format!("{type_name}_literal"))?;

        let field_defs = struct_fields(&self.struct_defs, type_name);
        for (name, expr) in fields {
            let idx = field_defs
                .iter()
                .position(|f| f.name == *name)
                .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, format!("unknown field '{name}' on '{type_name}'")).with_span(span.clone()))?;
            let (val, _) = self.compile_expr(expr)?;
            let field_ptr = self.builder.build_struct_gep(struct_ty, alloca, idx as u32, name).map_err(|e| self.llvm_error("struct literal gep", e))?;
            self.builder.build_store(field_ptr, val).map_err(|e| self.llvm_error("struct literal store", e))?;
        }
        Ok((alloca.into(), TypeName::Named(type_name.to_string())))
    }

    fn compile_cast(&mut self, target: &TypeName, inner: &Expr, span: quark_diagnostics::Span) -> Result<(BasicValueEnum<'ctx>, TypeName), CodegenError> {
        let (val, from) = self.compile_expr(inner)?;
        let target_llvm = llvm_basic_type(self.context, target);
        let result: BasicValueEnum = match (&from, target) {
            (TypeName::Int, TypeName::Int) => val,
            (TypeName::Int, TypeName::Float) | (TypeName::Int, TypeName::Double) => self
                .builder
                .build_signed_int_to_float(val.into_int_value(), target_llvm.into_float_type(), "cast_itof")
                .map_err(|e| self.llvm_error("cast int to float", e))?
                .into(),
            (TypeName::Float, TypeName::Double) => self
                .builder
                .build_float_ext(val.into_float_value(), target_llvm.into_float_type(), "cast_fext")
                .map_err(|e| self.llvm_error("cast float extend", e))?
                .into(),
            (TypeName::Double, TypeName::Float) => self
                .builder
                .build_float_trunc(val.into_float_value(), target_llvm.into_float_type(), "cast_ftrunc")
                .map_err(|e| self.llvm_error("cast float truncate", e))?
                .into(),
            (TypeName::Float, TypeName::Int) | (TypeName::Double, TypeName::Int) => self
                .builder
                .build_float_to_signed_int(val.into_float_value(), target_llvm.into_int_type(), "cast_ftoi")
                .map_err(|e| self.llvm_error("cast float to int", e))?
                .into(),
            (TypeName::Bool, TypeName::Int) => self
                .builder
                .build_int_z_extend(val.into_int_value(), target_llvm.into_int_type(), "cast_zext")
                .map_err(|e| self.llvm_error("cast bool to int", e))?
                .into(),
            (TypeName::Int, TypeName::Bool) => {
                let zero = val.into_int_value().get_type().const_zero();
                self.builder
                    .build_int_compare(IntPredicate::NE, val.into_int_value(), zero, "cast_tobool")
                    .map_err(|e| self.llvm_error("cast int to bool", e))?
                    .into()
            }
            (TypeName::Pointer(_), TypeName::Pointer(_)) | (TypeName::Named(_), TypeName::Pointer(_)) | (TypeName::Pointer(_), TypeName::Named(_)) => val,
            (TypeName::Pointer(_), TypeName::Int) => self
                .builder
                .build_ptr_to_int(val.into_pointer_value(), target_llvm.into_int_type(), "cast_ptoi")
                .map_err(|e| self.llvm_error("cast pointer to int", e))?
                .into(),
            (TypeName::Int, TypeName::Pointer(_)) => self
                .builder
                .build_int_to_ptr(val.into_int_value(), target_llvm.into_pointer_type(), "cast_itop")
                .map_err(|e| self.llvm_error("cast int to pointer", e))?
                .into(),
            _ if from == *target => val,
            _ => return Err(self.codegen_error(error_codes::INVALID_TYPE, format!("unsupported cast from '{}' to '{}'", from.display(), target.display())).with_span(span)),
        };
        Ok((result, target.clone()))
    }

    pub(crate) fn build_entry_alloca(&mut self, ty: inkwell::types::BasicTypeEnum<'ctx>, name: &str) -> Result<PointerValue<'ctx>, CodegenError> {
        let current_fn = self.current_function.ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "alloca outside a function"))?;
        let entry = current_fn.get_first_basic_block().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "function has no entry block"))?;
        let tmp_builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(first) => tmp_builder.position_before(&first),
            None => tmp_builder.position_at_end(entry),
        }
        tmp_builder.build_alloca(ty, name).map_err(|e| self.llvm_error("alloca", e))
    }
}

fn is_comparison(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge)
}

fn widen(a: &TypeName, b: &TypeName) -> TypeName {
    if matches!(a, TypeName::Double) || matches!(b, TypeName::Double) {
        TypeName::Double
    } else if matches!(a, TypeName::Float) || matches!(b, TypeName::Float) {
        TypeName::Float
    } else {
        TypeName::Int
    }
}
