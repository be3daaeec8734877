//! Statement analysis, ported from
//! `semantic_analyzer.cpp`'s `analyzeStmt`/`analyzeFunction` family.

use super::SemanticAnalyzer;
use crate::symbols::{Symbol, SymbolKind};
use quark_ast::{Block, Stmt, StmtKind, TypeInfo, TypeKind};
use quark_diagnostics::error_codes;

impl<'a> SemanticAnalyzer<'a> {
    pub(crate) fn analyze_statements(&mut self, statements: &[&Stmt]) {
        for stmt in statements {
            match &stmt.kind {
                StmtKind::FunctionDef(f) => self.analyze_function(f),
                StmtKind::StructDef(def) => {
                    for method in &def.methods {
                        self.analyze_method(&def.name, method);
                    }
                }
                StmtKind::ImplBlock { type_name, methods } => {
                    for method in methods {
                        self.analyze_method(type_name, method);
                    }
                }
                StmtKind::ExternFunction(_) | StmtKind::ExternStruct { .. } => {}
                other => self.analyze_stmt(&Stmt::new(other.clone(), stmt.span.clone())),
            }
        }
    }

    fn analyze_function(&mut self, f: &quark_ast::Function) {
        self.analyze_function_common(f.params.as_slice(), &f.body, &f.return_type, f.is_instance_method, None);
    }

    fn analyze_method(&mut self, struct_name: &str, f: &quark_ast::Function) {
        self.analyze_function_common(f.params.as_slice(), &f.body, &f.return_type, f.is_instance_method, Some(struct_name));
    }

    fn analyze_function_common(
        &mut self,
        params: &[quark_ast::Param],
        body: &Block,
        return_type: &quark_ast::TypeName,
        is_instance_method: bool,
        receiver: Option<&str>,
    ) {
        self.symbols.enter_scope();
        let mut seen = std::collections::HashSet::new();
        for p in params {
            if !seen.insert(p.name.clone()) {
                self.error(error_codes::DUPLICATE_PARAMETER, format!("duplicate parameter '{}'", p.name), body.span.clone());
                continue;
            }
            let type_info = self.resolve_type(&p.type_name);
            self.symbols.declare(Symbol {
                name: p.name.clone(),
                kind: SymbolKind::Parameter,
                type_info,
                span: body.span.clone(),
            });
        }
        if is_instance_method {
            if let Some(struct_name) = receiver {
                self.symbols.declare(Symbol {
                    name: "this".to_string(),
                    kind: SymbolKind::Parameter,
                    type_info: TypeInfo::struct_of(struct_name.to_string()),
                    span: body.span.clone(),
                });
            }
        }

        let prev_return = self.current_function_return.replace(return_type.clone());
        let prev_has_return = std::mem::replace(&mut self.current_function_has_return, false);
        let prev_receiver = self.current_receiver_struct.take();
        self.current_receiver_struct = receiver.map(|s| s.to_string());

        self.analyze_block(body);

        if !self.current_function_has_return && !matches!(return_type, quark_ast::TypeName::Void) {
            self.warning(error_codes::MAY_NOT_RETURN, "function may not return a value on all paths", body.span.clone());
        }

        self.current_function_return = prev_return;
        self.current_function_has_return = prev_has_return;
        self.current_receiver_struct = prev_receiver;
        self.symbols.exit_scope();
    }

    fn analyze_block(&mut self, block: &Block) {
        self.symbols.enter_scope();
        for stmt in &block.statements {
            self.analyze_stmt(stmt);
        }
        self.symbols.exit_scope();
    }

    pub(crate) fn analyze_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl { name, declared_type, init } => self.analyze_var_decl(name, declared_type.as_ref(), init.as_ref(), stmt.span.clone()),
            StmtKind::Assign { name, op: _, value } => self.analyze_assign(name, value, stmt.span.clone()),
            StmtKind::MemberAssign { object, field, value } => self.analyze_member_assign(object, field, value, stmt.span.clone()),
            StmtKind::ArrayAssign { array, index, value } => self.analyze_array_assign(array, index, value, stmt.span.clone()),
            StmtKind::DerefAssign { pointer, value } => self.analyze_deref_assign(pointer, value, stmt.span.clone()),
            StmtKind::If { branches, else_branch } => {
                for (cond, body) in branches {
                    let cond_ty = self.analyze_expr(cond);
                    if cond_ty.kind != TypeKind::Bool && cond_ty.kind != TypeKind::Unknown {
                        self.error(error_codes::CONDITION_NOT_BOOLEAN, "condition must be a bool", cond.span.clone());
                    }
                    self.analyze_block(body);
                }
                if let Some(body) = else_branch {
                    self.analyze_block(body);
                }
            }
            StmtKind::While { condition, body } => {
                let cond_ty = self.analyze_expr(condition);
                if cond_ty.kind != TypeKind::Bool && cond_ty.kind != TypeKind::Unknown {
                    self.error(error_codes::CONDITION_NOT_BOOLEAN, "condition must be a bool", condition.span.clone());
                }
                self.loop_depth += 1;
                self.analyze_block(body);
                self.loop_depth -= 1;
            }
            StmtKind::ForRange { var, range, body } => {
                self.analyze_expr(range);
                self.symbols.enter_scope();
                self.symbols.declare(Symbol {
                    name: var.clone(),
                    kind: SymbolKind::Variable,
                    type_info: TypeInfo::simple(TypeKind::Int),
                    span: stmt.span.clone(),
                });
                self.loop_depth += 1;
                for s in &body.statements {
                    self.analyze_stmt(s);
                }
                self.loop_depth -= 1;
                self.symbols.exit_scope();
            }
            StmtKind::Match { subject, arms } => {
                self.analyze_expr(subject);
                // Codegen jumps straight into a wildcard arm's body and stops
                // lowering the rest.
                if let Some(wildcard_pos) = arms.iter().position(|a| matches!(a.pattern, quark_ast::MatchPattern::Wildcard)) {
                    if wildcard_pos != arms.len() - 1 {
                        self.error(
                            error_codes::WILDCARD_MATCH_ARM_NOT_LAST,
                            "wildcard arm '_' must be the last arm in a 'match'",
                            arms[wildcard_pos].span.clone(),
                        );
                    }
                }
                for arm in arms {
                    if let quark_ast::MatchPattern::Literal(pattern_expr) = &arm.pattern {
                        let pattern_ty = self.analyze_expr(pattern_expr);
                        if matches!(pattern_ty.kind, quark_ast::TypeKind::Double | quark_ast::TypeKind::Float) {
                            self.warning(
                                error_codes::FLOAT_MATCH_PATTERN,
                                "floating-point equality in 'match' compares bit-for-bit and rarely matches the intended value",
                                pattern_expr.span.clone(),
                            );
                        }
                    }
                    self.analyze_block(&arm.body);
                }
            }
            StmtKind::Return(value) => self.analyze_return(value.as_ref(), stmt.span.clone()),
            StmtKind::Break => {
                if self.loop_depth == 0 {
                    self.error(error_codes::BREAK_OUTSIDE_LOOP, "'break' outside of a loop", stmt.span.clone());
                }
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.error(error_codes::CONTINUE_OUTSIDE_LOOP, "'continue' outside of a loop", stmt.span.clone());
                }
            }
            StmtKind::Expr(expr) => {
                self.analyze_expr(expr);
            }
            StmtKind::Block(block) => self.analyze_block(block),
            StmtKind::FunctionDef(_)
            | StmtKind::StructDef(_)
            | StmtKind::ImplBlock { .. }
            | StmtKind::ExternFunction(_)
            | StmtKind::ExternStruct { .. }
            | StmtKind::Include(_) => {
                // Nested item-like statements are collected and analyzed
                // through `analyze_statements`'s top-level walk, not here.
            }
        }
    }

    fn analyze_var_decl(&mut self, name: &str, declared_type: Option<&quark_ast::TypeName>, init: Option<&quark_ast::Expr>, span: quark_diagnostics::Span) {
        let init_ty = init.map(|e| self.analyze_expr(e));
        let type_info = match (declared_type, &init_ty) {
            (Some(t), _) => self.resolve_type(t),
            (None, Some(ty)) => ty.clone(),
            (None, None) => {
                self.error(error_codes::INFERENCE_NEEDS_INITIALIZER, format!("cannot infer type of '{name}' without an initializer"), span.clone());
                TypeInfo::unknown()
            }
        };
        if let (Some(declared), Some(init_ty)) = (declared_type, &init_ty) {
            let declared_info = self.resolve_type(declared);
            if !self.can_implicitly_convert(init_ty, &declared_info) {
                self.error(
                    error_codes::VAR_INIT_TYPE_MISMATCH,
                    format!("cannot initialize '{name}: {}' with a value of type '{}'", self.type_to_string(&declared_info), self.type_to_string(init_ty)),
                    span.clone(),
                );
            }
        }
        self.declare_or_error(
            Symbol {
                name: name.to_string(),
                kind: SymbolKind::Variable,
                type_info,
                span: span.clone(),
            },
            error_codes::VARIABLE_ALREADY_DEFINED,
        );
    }

    fn analyze_assign(&mut self, name: &str, value: &quark_ast::Expr, span: quark_diagnostics::Span) {
        let value_ty = self.analyze_expr(value);
        let Some(symbol) = self.symbols.lookup(name) else {
            self.undefined_variable(name, span);
            return;
        };
        let target_ty = symbol.type_info.clone();
        if !self.can_implicitly_convert(&value_ty, &target_ty) {
            self.error(
                error_codes::ASSIGN_TYPE_MISMATCH,
                format!("cannot assign a value of type '{}' to '{name}' of type '{}'", self.type_to_string(&value_ty), self.type_to_string(&target_ty)),
                span,
            );
        }
    }

    fn analyze_member_assign(&mut self, object: &quark_ast::Expr, field: &str, value: &quark_ast::Expr, span: quark_diagnostics::Span) {
        let object_ty = self.analyze_expr(object);
        let value_ty = self.analyze_expr(value);
        if object_ty.kind == TypeKind::Unknown {
            return;
        }
        if object_ty.kind != TypeKind::Struct {
            self.error(error_codes::MEMBER_ACCESS_NOT_STRUCT, "member assignment target is not a struct", span);
            return;
        }
        let struct_name = object_ty.struct_name.clone().unwrap_or_default();
        let Some(field_def) = self.get_struct_fields(&struct_name).into_iter().find(|f| f.name == field) else {
            self.error(error_codes::UNKNOWN_FIELD, format!("struct '{struct_name}' has no field '{field}'"), span);
            return;
        };
        let field_ty = self.resolve_type(&field_def.type_name);
        if !self.can_implicitly_convert(&value_ty, &field_ty) {
            self.error(error_codes::FIELD_ASSIGN_TYPE_MISMATCH, format!("cannot assign '{}' to field '{field}' of type '{}'", self.type_to_string(&value_ty), self.type_to_string(&field_ty)), span);
        }
    }

    fn analyze_array_assign(&mut self, array: &quark_ast::Expr, index: &quark_ast::Expr, value: &quark_ast::Expr, span: quark_diagnostics::Span) {
        let array_ty = self.analyze_expr(array);
        let index_ty = self.analyze_expr(index);
        let value_ty = self.analyze_expr(value);
        if array_ty.kind == TypeKind::Unknown {
            return;
        }
        if array_ty.kind != TypeKind::Array {
            self.error(error_codes::SUBSCRIPT_NOT_INDEXABLE, "value is not indexable", span);
            return;
        }
        if index_ty.kind != TypeKind::Int && index_ty.kind != TypeKind::Unknown {
            self.error(error_codes::INDEX_NOT_INTEGER, "array index must be an int", span.clone());
        }
        if let Some(elem_kind) = array_ty.element_type {
            let elem_ty = TypeInfo::simple(elem_kind);
            if !self.can_implicitly_convert(&value_ty, &elem_ty) {
                self.error(error_codes::ARRAY_ELEMENT_TYPE_MISMATCH, "array element type mismatch on assignment", span);
            }
        }
    }

    fn analyze_deref_assign(&mut self, pointer: &quark_ast::Expr, value: &quark_ast::Expr, span: quark_diagnostics::Span) {
        let pointer_ty = self.analyze_expr(pointer);
        self.analyze_expr(value);
        if pointer_ty.kind != TypeKind::Pointer && pointer_ty.kind != TypeKind::Unknown {
            self.error(error_codes::DEREF_NOT_POINTER, "cannot dereference a non-pointer value", span);
        }
    }

    fn analyze_return(&mut self, value: Option<&quark_ast::Expr>, span: quark_diagnostics::Span) {
        self.current_function_has_return = true;
        let Some(expected) = self.current_function_return.clone() else {
            self.error(error_codes::RETURN_OUTSIDE_FUNCTION, "'ret' outside of a function", span);
            return;
        };
        let expected_info = self.resolve_type(&expected);
        match (value, expected_info.kind) {
            (Some(expr), TypeKind::Void) => {
                self.analyze_expr(expr);
                self.error(error_codes::VOID_RETURNS_VALUE, "void function cannot return a value", span);
            }
            (None, TypeKind::Void) => {}
            (None, _) => {
                self.error(error_codes::NON_VOID_MISSING_RETURN_VALUE, "missing return value", span);
            }
            (Some(expr), _) => {
                let actual = self.analyze_expr(expr);
                if !self.can_implicitly_convert(&actual, &expected_info) {
                    self.error(
                        error_codes::RETURN_TYPE_MISMATCH,
                        format!("expected return type '{}', found '{}'", self.type_to_string(&expected_info), self.type_to_string(&actual)),
                        span,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quark_diagnostics::DiagnosticEngine;
    use quark_parser::Parser;

    fn analyze_source(src: &str) -> (bool, Vec<String>) {
        let mut parser = Parser::new(src, "t.qk").unwrap();
        let program = parser.parse().unwrap();
        let mut diags = DiagnosticEngine::new();
        let mut analyzer = SemanticAnalyzer::new(&mut diags);
        let ok = analyzer.analyze(&program);
        (ok, diags.diagnostics().iter().map(|d| d.code.to_string()).collect())
    }

    #[test]
    fn wildcard_not_last_is_rejected() {
        let (ok, codes) = analyze_source(
            r#"int main() { var k = "a"; match k { _ => print("x"), "a" => print("y") } ret 0; }"#,
        );
        assert!(!ok);
        assert!(codes.contains(&error_codes::WILDCARD_MATCH_ARM_NOT_LAST.to_string()));
    }

    #[test]
    fn wildcard_last_is_accepted() {
        let (ok, codes) = analyze_source(
            r#"int main() { var k = "a"; match k { "a" => print("y"), _ => print("x") } ret 0; }"#,
        );
        assert!(ok, "unexpected errors: {codes:?}");
    }

    #[test]
    fn float_literal_match_pattern_warns() {
        let (ok, codes) = analyze_source(
            r#"int main() { var k = 1.5; match k { 1.5 => print("x"), _ => print("y") } ret 0; }"#,
        );
        assert!(ok, "warnings should not block analysis: {codes:?}");
        assert!(codes.contains(&error_codes::FLOAT_MATCH_PATTERN.to_string()));
    }
}
