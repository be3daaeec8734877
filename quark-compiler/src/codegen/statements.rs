//! Statement codegen: function-prologue/epilogue and control-flow
//! lowering, split by statement kind.

use super::types::{default_value, llvm_basic_type};
use super::ASTCodeGen;
use crate::error::CodegenError;
use inkwell::values::BasicValueEnum;
use quark_ast::{AssignOp, Block, Expr, ExprKind, Function, Stmt, StmtKind, TypeName};
use quark_diagnostics::error_codes;
use std::collections::HashMap;

impl<'ctx> ASTCodeGen<'ctx> {
    /// Emits one function's entry block, parameter bindings, body, and
    /// fall-off-the-end epilogue (invariant I6: instance methods receive
    /// `(selfPtr, dynamicTypeName, ...userParams)` ahead of everything else).
    pub(crate) fn compile_function(&mut self, mangled_name: &str, f: &Function, receiver_struct: Option<&str>) -> Result<(), CodegenError> {
        let fn_val = self
            .lookup_function(mangled_name)
            .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, format!("function '{mangled_name}' was not declared")))?;

        let entry = self.context.append_basic_block(fn_val, "entry");
        self.builder.position_at_end(entry);

        self.variables = HashMap::new();
        self.variable_ast_types = HashMap::new();
        self.current_function = Some(fn_val);
        self.current_function_return_type = Some(f.return_type.clone());
        self.current_receiver_struct = receiver_struct.map(str::to_string);
        self.loop_stack.clear();

        let mut param_idx = 0usize;
        if f.is_instance_method {
            let this_slot = self.build_entry_alloca(self.ptr_type().into(), "this")?;
            let this_val = fn_val
                .get_nth_param(param_idx as u32)
                .ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "missing implicit 'this' parameter"))?;
            self.builder.build_store(this_slot, this_val).map_err(|e| self.llvm_error("this store", e))?;
            self.variables.insert("this".to_string(), this_slot);
            self.variable_ast_types.insert(
                "this".to_string(),
                TypeName::Pointer(Box::new(TypeName::Named(receiver_struct.unwrap_or_default().to_string()))),
            );
            param_idx += 1;

            let dyn_name_slot = self.build_entry_alloca(self.ptr_type().into(), "__dyn_type_name")?;
            let dyn_name_val = fn_val
                .get_nth_param(param_idx as u32)
                .ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "missing implicit dynamic-type-name parameter"))?;
            self.builder.build_store(dyn_name_slot, dyn_name_val).map_err(|e| self.llvm_error("dyn name store", e))?;
            self.variables.insert("__dyn_type_name".to_string(), dyn_name_slot);
            self.variable_ast_types.insert("__dyn_type_name".to_string(), TypeName::Str);
            param_idx += 1;
        }

        for param in &f.params {
            let incoming = fn_val
                .get_nth_param(param_idx as u32)
                .ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, format!("missing parameter '{}'", param.name)))?;
            if let TypeName::Named(_) = param.type_name {
                // Structs are always accessed behind a pointer: the incoming
                // argument already *is* the binding, no slot indirection.
                self.variables.insert(param.name.clone(), incoming.into_pointer_value());
            } else {
                let slot = self.build_entry_alloca(llvm_basic_type(self.context, &param.type_name), &param.name)?;
                self.builder.build_store(slot, incoming).map_err(|e| self.llvm_error("param store", e))?;
                self.variables.insert(param.name.clone(), slot);
            }
            self.variable_ast_types.insert(param.name.clone(), param.type_name.clone());
            param_idx += 1;
        }

        self.compile_block(&f.body)?;

        if !self.block_terminated() {
            if matches!(f.return_type, TypeName::Void) {
                self.builder.build_return(None).map_err(|e| self.llvm_error("implicit void return", e))?;
            } else {
                let zero = default_value(self.context, &f.return_type);
                self.builder.build_return(Some(&zero)).map_err(|e| self.llvm_error("implicit return", e))?;
            }
        }

        Ok(())
    }

    fn block_terminated(&self) -> bool {
        self.builder.get_insert_block().and_then(|bb| bb.get_terminator()).is_some()
    }

    pub(crate) fn compile_block(&mut self, block: &Block) -> Result<(), CodegenError> {
        for stmt in &block.statements {
            if self.block_terminated() {
                break;
            }
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    /// Runs `block` in a snapshot of the current variable bindings, so
    /// locals declared inside (including shadowing an outer name) don't
    /// leak once the block ends — the only scoping mechanism `variables`
    /// needs, since it is otherwise a single flat map per function.
    fn compile_scoped_block(&mut self, block: &Block) -> Result<(), CodegenError> {
        let saved_vars = self.variables.clone();
        let saved_types = self.variable_ast_types.clone();
        self.compile_block(block)?;
        self.variables = saved_vars;
        self.variable_ast_types = saved_types;
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match &stmt.kind {
            StmtKind::VarDecl { name, declared_type, init } => self.compile_var_decl(name, declared_type.as_ref(), init.as_ref(), stmt.span.clone()),
            StmtKind::Assign { name, op, value } => self.compile_assign(name, *op, value, stmt.span.clone()),
            StmtKind::MemberAssign { object, field, value } => self.compile_member_assign(object, field, value, stmt.span.clone()),
            StmtKind::ArrayAssign { array, index, value } => self.compile_array_assign(array, index, value, stmt.span.clone()),
            StmtKind::DerefAssign { pointer, value } => self.compile_deref_assign(pointer, value, stmt.span.clone()),
            StmtKind::If { branches, else_branch } => self.compile_if(branches, else_branch.as_ref()),
            StmtKind::While { condition, body } => self.compile_while(condition, body),
            StmtKind::ForRange { var, range, body } => self.compile_for_range(var, range, body, stmt.span.clone()),
            StmtKind::Match { subject, arms } => self.compile_match(subject, arms, stmt.span.clone()),
            StmtKind::Return(value) => self.compile_return(value.as_ref()),
            StmtKind::Break => self.compile_break(stmt.span.clone()),
            StmtKind::Continue => self.compile_continue(stmt.span.clone()),
            StmtKind::Expr(expr) => self.compile_expr(expr).map(|_| ()),
            StmtKind::Block(inner) => self.compile_scoped_block(inner),
            // Top-level item kinds are fully handled by `compile_program`'s
            // declaration passes; nothing left to lower inside a body.
            StmtKind::FunctionDef(_)
            | StmtKind::StructDef(_)
            | StmtKind::ImplBlock { .. }
            | StmtKind::ExternFunction(_)
            | StmtKind::ExternStruct { .. }
            | StmtKind::Include(_) => Ok(()),
        }
    }

    fn coerce_value(&mut self, val: BasicValueEnum<'ctx>, from: &TypeName, to: &TypeName) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        if from == to {
            return Ok(val);
        }
        match (from, to) {
            (TypeName::Int, TypeName::Double) | (TypeName::Int, TypeName::Float) => {
                let target = llvm_basic_type(self.context, to).into_float_type();
                Ok(self.builder.build_signed_int_to_float(val.into_int_value(), target, "coerce_itof").map_err(|e| self.llvm_error("coercion", e))?.into())
            }
            (TypeName::Float, TypeName::Double) => Ok(self
                .builder
                .build_float_ext(val.into_float_value(), self.context.f64_type(), "coerce_fext")
                .map_err(|e| self.llvm_error("coercion", e))?
                .into()),
            (TypeName::Double, TypeName::Float) => Ok(self
                .builder
                .build_float_trunc(val.into_float_value(), self.context.f32_type(), "coerce_ftrunc")
                .map_err(|e| self.llvm_error("coercion", e))?
                .into()),
            (TypeName::Bool, TypeName::Int) => Ok(self
                .builder
                .build_int_z_extend(val.into_int_value(), self.context.i32_type(), "coerce_zext")
                .map_err(|e| self.llvm_error("coercion", e))?
                .into()),
            (TypeName::Int, TypeName::Bool) => {
                let zero = val.into_int_value().get_type().const_zero();
                Ok(self.builder.build_int_compare(inkwell::IntPredicate::NE, val.into_int_value(), zero, "coerce_tobool").map_err(|e| self.llvm_error("coercion", e))?.into())
            }
            _ => Ok(val),
        }
    }

    fn compile_var_decl(&mut self, name: &str, declared_type: Option<&TypeName>, init: Option<&Expr>, span: quark_diagnostics::Span) -> Result<(), CodegenError> {
        let (init_val, init_ty) = match init {
            Some(expr) => {
                let (v, t) = self.compile_expr(expr)?;
                (Some(v), Some(t))
            }
            None => (None, None),
        };
        let var_ty = declared_type.cloned().or(init_ty.clone()).ok_or_else(|| {
            self.codegen_error(error_codes::INVALID_TYPE, format!("cannot infer a type for '{name}' with no initializer")).with_span(span.clone())
        })?;

        if let TypeName::Named(_) = var_ty {
            let ptr = match init_val {
                Some(v) => v.into_pointer_value(),
                None => self.ptr_type().const_null(),
            };
            self.variables.insert(name.to_string(), ptr);
            self.variable_ast_types.insert(name.to_string(), var_ty);
            return Ok(());
        }

        let slot = self.build_entry_alloca(llvm_basic_type(self.context, &var_ty), name)?;
        if let Some(v) = init_val {
            let from_ty = init_ty.unwrap_or_else(|| var_ty.clone());
            let coerced = self.coerce_value(v, &from_ty, &var_ty)?;
            self.builder.build_store(slot, coerced).map_err(|e| self.llvm_error("var decl store", e))?;
        } else {
            let zero = default_value(self.context, &var_ty);
            self.builder.build_store(slot, zero).map_err(|e| self.llvm_error("var decl default store", e))?;
        }
        self.variables.insert(name.to_string(), slot);
        self.variable_ast_types.insert(name.to_string(), var_ty);
        Ok(())
    }

    fn compile_assign(&mut self, name: &str, op: AssignOp, value: &Expr, span: quark_diagnostics::Span) -> Result<(), CodegenError> {
        let var_ty = self
            .variable_ast_types
            .get(name)
            .cloned()
            .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, format!("undefined variable '{name}'")).with_span(span.clone()))?;

        if let TypeName::Named(_) = var_ty {
            let (v, _) = self.compile_expr(value)?;
            self.variables.insert(name.to_string(), v.into_pointer_value());
            return Ok(());
        }

        let slot = *self
            .variables
            .get(name)
            .ok_or_else(|| self.codegen_error(error_codes::SYMBOL_NOT_FOUND, format!("undefined variable '{name}'")).with_span(span.clone()))?;

        let (rv, rt) = self.compile_expr(value)?;

        let new_val = if matches!(op, AssignOp::Assign) {
            self.coerce_value(rv, &rt, &var_ty)?
        } else {
            let current_ty = llvm_basic_type(self.context, &var_ty);
            let current = self.builder.build_load(current_ty, slot, "compound_lhs").map_err(|e| self.llvm_error("compound load", e))?;
            let bin_op = match op {
                AssignOp::AddAssign => quark_ast::BinaryOp::Add,
                AssignOp::SubAssign => quark_ast::BinaryOp::Sub,
                AssignOp::MulAssign => quark_ast::BinaryOp::Mul,
                AssignOp::DivAssign => quark_ast::BinaryOp::Div,
                AssignOp::ModAssign => quark_ast::BinaryOp::Mod,
                AssignOp::Assign => unreachable!(),
            };
            let (computed, computed_ty) = self.compile_arithmetic(bin_op, current, &var_ty, rv, &rt, span.clone())?;
            self.coerce_value(computed, &computed_ty, &var_ty)?
        };

        self.builder.build_store(slot, new_val).map_err(|e| self.llvm_error("assign store", e))?;
        Ok(())
    }

    fn compile_member_assign(&mut self, object: &Expr, field: &str, value: &Expr, span: quark_diagnostics::Span) -> Result<(), CodegenError> {
        let place_expr = Expr::new(ExprKind::FieldAccess { object: Box::new(object.clone()), field: field.to_string() }, span);
        let (ptr, field_ty) = self.compile_place(&place_expr)?;
        let (v, vt) = self.compile_expr(value)?;
        let coerced = self.coerce_value(v, &vt, &field_ty)?;
        self.builder.build_store(ptr, coerced).map_err(|e| self.llvm_error("member assign store", e))?;
        Ok(())
    }

    fn compile_array_assign(&mut self, array: &Expr, index: &Expr, value: &Expr, span: quark_diagnostics::Span) -> Result<(), CodegenError> {
        let place_expr = Expr::new(ExprKind::Index { base: Box::new(array.clone()), index: Box::new(index.clone()) }, span);
        let (ptr, elem_ty) = self.compile_place(&place_expr)?;
        let (v, vt) = self.compile_expr(value)?;
        let coerced = self.coerce_value(v, &vt, &elem_ty)?;
        self.builder.build_store(ptr, coerced).map_err(|e| self.llvm_error("array assign store", e))?;
        Ok(())
    }

    fn compile_deref_assign(&mut self, pointer: &Expr, value: &Expr, span: quark_diagnostics::Span) -> Result<(), CodegenError> {
        let place_expr = Expr::new(ExprKind::Deref(Box::new(pointer.clone())), span);
        let (ptr, pointee_ty) = self.compile_place(&place_expr)?;
        let (v, vt) = self.compile_expr(value)?;
        let coerced = self.coerce_value(v, &vt, &pointee_ty)?;
        self.builder.build_store(ptr, coerced).map_err(|e| self.llvm_error("deref assign store", e))?;
        Ok(())
    }

    /// Chains `if`/`elif`/`else` into a CFG of `then`/`else`/`ifcont`
    /// blocks; every branch converges on a single merge block regardless of
    /// how many `elif`s precede the trailing `else`.
    fn compile_if(&mut self, branches: &[(Expr, Block)], else_branch: Option<&Block>) -> Result<(), CodegenError> {
        let current_fn = self.current_function.ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "'if' outside a function"))?;
        let merge_bb = self.context.append_basic_block(current_fn, "if_merge");
        self.compile_if_chain(branches, else_branch, merge_bb)?;
        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    fn compile_if_chain(&mut self, branches: &[(Expr, Block)], else_branch: Option<&Block>, merge_bb: inkwell::basic_block::BasicBlock<'ctx>) -> Result<(), CodegenError> {
        let current_fn = self.current_function.ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "'if' outside a function"))?;
        let Some((cond, body)) = branches.first() else {
            if let Some(else_block) = else_branch {
                self.compile_scoped_block(else_block)?;
            }
            if !self.block_terminated() {
                self.builder.build_unconditional_branch(merge_bb).map_err(|e| self.llvm_error("if merge branch", e))?;
            }
            return Ok(());
        };

        let cond_val = self.gen_expr_bool(cond)?;
        let then_bb = self.context.append_basic_block(current_fn, "if_then");
        let else_bb = self.context.append_basic_block(current_fn, "if_else");
        self.builder.build_conditional_branch(cond_val, then_bb, else_bb).map_err(|e| self.llvm_error("if cond branch", e))?;

        self.builder.position_at_end(then_bb);
        self.compile_scoped_block(body)?;
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(merge_bb).map_err(|e| self.llvm_error("if then branch", e))?;
        }

        self.builder.position_at_end(else_bb);
        self.compile_if_chain(&branches[1..], else_branch, merge_bb)
    }

    fn compile_while(&mut self, condition: &Expr, body: &Block) -> Result<(), CodegenError> {
        let current_fn = self.current_function.ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "'while' outside a function"))?;
        let cond_bb = self.context.append_basic_block(current_fn, "while_cond");
        let body_bb = self.context.append_basic_block(current_fn, "while_body");
        let exit_bb = self.context.append_basic_block(current_fn, "while_exit");

        self.builder.build_unconditional_branch(cond_bb).map_err(|e| self.llvm_error("while entry branch", e))?;
        self.builder.position_at_end(cond_bb);
        let cond_val = self.gen_expr_bool(condition)?;
        self.builder.build_conditional_branch(cond_val, body_bb, exit_bb).map_err(|e| self.llvm_error("while cond branch", e))?;

        self.builder.position_at_end(body_bb);
        self.loop_stack.push((cond_bb, exit_bb));
        self.compile_scoped_block(body)?;
        self.loop_stack.pop();
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(cond_bb).map_err(|e| self.llvm_error("while backedge", e))?;
        }

        self.builder.position_at_end(exit_bb);
        Ok(())
    }

    /// `for (var in start..end) { .. }`: the loop variable's alloca lives in
    /// the function entry block (so overwriting it each iteration is just a
    /// store, matching every other scalar local) but the binding itself is
    /// scoped to the loop like an ordinary block-local.
    fn compile_for_range(&mut self, var: &str, range: &Expr, body: &Block, span: quark_diagnostics::Span) -> Result<(), CodegenError> {
        let ExprKind::Range { start, end } = &range.kind else {
            return Err(self.codegen_error(error_codes::INVALID_TYPE, "'for ... in' requires a range expression").with_span(span));
        };

        let current_fn = self.current_function.ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "'for' outside a function"))?;
        let start_val = self.gen_expr_int(start)?;
        let end_val = self.gen_expr_int(end)?;

        let slot = self.build_entry_alloca(self.context.i32_type().into(), var)?;
        self.builder.build_store(slot, start_val).map_err(|e| self.llvm_error("for init store", e))?;

        let cond_bb = self.context.append_basic_block(current_fn, "for_cond");
        let body_bb = self.context.append_basic_block(current_fn, "for_body");
        let inc_bb = self.context.append_basic_block(current_fn, "for_inc");
        let exit_bb = self.context.append_basic_block(current_fn, "for_exit");

        self.builder.build_unconditional_branch(cond_bb).map_err(|e| self.llvm_error("for entry branch", e))?;
        self.builder.position_at_end(cond_bb);
        let current = self.builder.build_load(self.context.i32_type(), slot, "for_cur").map_err(|e| self.llvm_error("for cond load", e))?.into_int_value();
        let cond_val = self
            .builder
            .build_int_compare(inkwell::IntPredicate::SLT, current, end_val, "for_cmp")
            .map_err(|e| self.llvm_error("for cond", e))?;
        self.builder.build_conditional_branch(cond_val, body_bb, exit_bb).map_err(|e| self.llvm_error("for cond branch", e))?;

        self.builder.position_at_end(body_bb);
        let saved_var = self.variables.insert(var.to_string(), slot);
        let saved_ty = self.variable_ast_types.insert(var.to_string(), TypeName::Int);
        self.loop_stack.push((inc_bb, exit_bb));
        self.compile_scoped_block(body)?;
        self.loop_stack.pop();
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(inc_bb).map_err(|e| self.llvm_error("for body to inc", e))?;
        }

        self.builder.position_at_end(inc_bb);
        let cur = self.builder.build_load(self.context.i32_type(), slot, "for_cur_inc").map_err(|e| self.llvm_error("for inc load", e))?.into_int_value();
        let one = self.context.i32_type().const_int(1, false);
        let next = self.builder.build_int_add(cur, one, "for_next").map_err(|e| self.llvm_error("for inc add", e))?;
        self.builder.build_store(slot, next).map_err(|e| self.llvm_error("for inc store", e))?;
        self.builder.build_unconditional_branch(cond_bb).map_err(|e| self.llvm_error("for backedge", e))?;

        self.builder.position_at_end(exit_bb);
        match saved_var {
            Some(v) => {
                self.variables.insert(var.to_string(), v);
            }
            None => {
                self.variables.remove(var);
            }
        }
        match saved_ty {
            Some(t) => {
                self.variable_ast_types.insert(var.to_string(), t);
            }
            None => {
                self.variable_ast_types.remove(var);
            }
        }
        Ok(())
    }

    /// Each arm becomes its own block; `strcmp`/float-`OEQ`/pointer-`ptrtoint`
    /// /int-`ICmp` equality is picked per the subject's compiled type, and a
    /// `Wildcard` pattern always matches (parser/semantic analysis guarantee
    /// it is the last arm, if present).
    fn compile_match(&mut self, subject: &Expr, arms: &[quark_ast::MatchArm], span: quark_diagnostics::Span) -> Result<(), CodegenError> {
        let current_fn = self.current_function.ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "'match' outside a function"))?;
        let (subject_val, subject_ty) = self.compile_expr(subject)?;
        let merge_bb = self.context.append_basic_block(current_fn, "match_merge");

        for arm in arms {
            match &arm.pattern {
                // Guaranteed to be the last arm (semantic analysis rejects
                // anything following a wildcard): falls straight into its
                // body with no comparison or extra block needed.
                quark_ast::MatchPattern::Wildcard => {
                    self.compile_scoped_block(&arm.body)?;
                    if !self.block_terminated() {
                        self.builder.build_unconditional_branch(merge_bb).map_err(|e| self.llvm_error("match arm branch", e))?;
                    }
                    self.builder.position_at_end(merge_bb);
                    return Ok(());
                }
                quark_ast::MatchPattern::Literal(pattern_expr) => {
                    let matches = self.compile_match_pattern_eq(subject_val, &subject_ty, pattern_expr, span.clone())?;
                    let arm_bb = self.context.append_basic_block(current_fn, "match_arm");
                    let next_bb = self.context.append_basic_block(current_fn, "match_next");
                    self.builder.build_conditional_branch(matches, arm_bb, next_bb).map_err(|e| self.llvm_error("match cond branch", e))?;
                    self.builder.position_at_end(arm_bb);
                    self.compile_scoped_block(&arm.body)?;
                    if !self.block_terminated() {
                        self.builder.build_unconditional_branch(merge_bb).map_err(|e| self.llvm_error("match arm branch", e))?;
                    }
                    self.builder.position_at_end(next_bb);
                }
            }
        }

        if !self.block_terminated() {
            self.builder.build_unconditional_branch(merge_bb).map_err(|e| self.llvm_error("match fallthrough", e))?;
        }
        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    fn compile_match_pattern_eq(
        &mut self,
        subject_val: BasicValueEnum<'ctx>,
        subject_ty: &TypeName,
        pattern: &Expr,
        span: quark_diagnostics::Span,
    ) -> Result<inkwell::values::IntValue<'ctx>, CodegenError> {
        let (pattern_val, _) = self.compile_expr(pattern)?;
        match subject_ty {
            TypeName::Str => {
                let strcmp = self.runtime_strcmp();
                let call = self
                    .builder
                    .build_call(strcmp, &[subject_val.into(), pattern_val.into()], "match_strcmp")
                    .map_err(|e| self.llvm_error("match strcmp", e))?;
                let cmp = call.try_as_basic_value().left().ok_or_else(|| self.codegen_error(error_codes::LLVM_ERROR, "strcmp returned no value"))?.into_int_value();
                let zero = self.context.i32_type().const_zero();
                self.builder.build_int_compare(inkwell::IntPredicate::EQ, cmp, zero, "match_is_eq").map_err(|e| self.llvm_error("match compare", e))
            }
            TypeName::Float | TypeName::Double => self
                .builder
                .build_float_compare(inkwell::FloatPredicate::OEQ, subject_val.into_float_value(), pattern_val.into_float_value(), "match_feq")
                .map_err(|e| self.llvm_error("match compare", e)),
            TypeName::Pointer(_) | TypeName::Named(_) | TypeName::Array(_, _) => {
                let i64_ty = self.context.i64_type();
                let a = self.builder.build_ptr_to_int(subject_val.into_pointer_value(), i64_ty, "match_lptr").map_err(|e| self.llvm_error("match ptrtoint", e))?;
                let b = self.builder.build_ptr_to_int(pattern_val.into_pointer_value(), i64_ty, "match_rptr").map_err(|e| self.llvm_error("match ptrtoint", e))?;
                self.builder.build_int_compare(inkwell::IntPredicate::EQ, a, b, "match_peq").map_err(|e| self.llvm_error("match compare", e))
            }
            TypeName::Int | TypeName::Bool | TypeName::Void => self
                .builder
                .build_int_compare(inkwell::IntPredicate::EQ, subject_val.into_int_value(), pattern_val.into_int_value(), "match_ieq")
                .map_err(|e| self.llvm_error("match compare", e).with_span(span)),
        }
    }

    fn compile_return(&mut self, value: Option<&Expr>) -> Result<(), CodegenError> {
        let return_ty = self.current_function_return_type.clone().unwrap_or(TypeName::Void);
        match value {
            None => {
                self.builder.build_return(None).map_err(|e| self.llvm_error("return", e))?;
            }
            Some(expr) => {
                let (val, ty) = self.compile_expr(expr)?;
                let coerced = if matches!(ty, TypeName::Named(_)) {
                    val
                } else {
                    self.coerce_value(val, &ty, &return_ty)?
                };
                self.builder.build_return(Some(&coerced)).map_err(|e| self.llvm_error("return", e))?;
            }
        }
        Ok(())
    }

    fn compile_break(&mut self, span: quark_diagnostics::Span) -> Result<(), CodegenError> {
        let (_, exit_bb) = self.loop_stack.last().copied().ok_or_else(|| self.codegen_error(error_codes::INVALID_OPERATION, "'break' outside a loop").with_span(span))?;
        self.builder.build_unconditional_branch(exit_bb).map_err(|e| self.llvm_error("break", e))?;
        Ok(())
    }

    fn compile_continue(&mut self, span: quark_diagnostics::Span) -> Result<(), CodegenError> {
        let (continue_bb, _) = self.loop_stack.last().copied().ok_or_else(|| self.codegen_error(error_codes::INVALID_OPERATION, "'continue' outside a loop").with_span(span))?;
        self.builder.build_unconditional_branch(continue_bb).map_err(|e| self.llvm_error("continue", e))?;
        Ok(())
    }
}
