//! Expression type-checking, ported from
//! `semantic_analyzer.cpp`'s `analyzeExpr*` family. Every call returns the
//! resolved [`TypeInfo`] of the expression, mirroring the reference
//! implementation's `Type analyzeExpr(...)` signature.

use super::builtins::OVERLOADED_BUILTINS;
use super::SemanticAnalyzer;
use quark_ast::{BinaryOp, Expr, ExprKind, TypeInfo, TypeKind, UnaryOp};
use quark_diagnostics::{error_codes, Span};

impl<'a> SemanticAnalyzer<'a> {
    pub(crate) fn analyze_expr(&mut self, expr: &Expr) -> TypeInfo {
        match &expr.kind {
            ExprKind::Number(n) => {
                if n.fract() == 0.0 && *n >= i32::MIN as f64 && *n <= i32::MAX as f64 {
                    TypeInfo::simple(TypeKind::Int)
                } else {
                    TypeInfo::simple(TypeKind::Double)
                }
            }
            ExprKind::Str(_) => TypeInfo::simple(TypeKind::String),
            ExprKind::Boolean(_) => TypeInfo::simple(TypeKind::Bool),
            ExprKind::Null => TypeInfo::simple(TypeKind::Null),
            ExprKind::This => self
                .current_receiver_struct
                .clone()
                .map(TypeInfo::struct_of)
                .unwrap_or_else(TypeInfo::unknown),
            ExprKind::Variable(name) => self.analyze_variable(name, expr.span.clone()),
            ExprKind::Unary { op, operand } => self.analyze_unary(*op, operand, expr.span.clone()),
            ExprKind::Binary { op, lhs, rhs } => self.analyze_binary(*op, lhs, rhs, expr.span.clone()),
            ExprKind::Call { callee, args } => self.analyze_call(callee, args, expr.span.clone()),
            ExprKind::MethodCall { object, method, args } => self.analyze_method_call(object, method, args, expr.span.clone()),
            ExprKind::StaticCall { type_name, method, args } => self.analyze_static_call(type_name, method, args, expr.span.clone()),
            ExprKind::FieldAccess { object, field } => self.analyze_field_access(object, field, expr.span.clone()),
            ExprKind::Index { base, index } => self.analyze_index(base, index, expr.span.clone()),
            ExprKind::ArrayLiteral(elements) => self.analyze_array_literal(elements, expr.span.clone()),
            ExprKind::MapLiteral(pairs) => {
                for (k, v) in pairs {
                    self.analyze_expr(k);
                    self.analyze_expr(v);
                }
                TypeInfo::simple(TypeKind::Map)
            }
            ExprKind::Range { start, end } => {
                self.analyze_expr(start);
                self.analyze_expr(end);
                TypeInfo::simple(TypeKind::Int)
            }
            ExprKind::StructLiteral { type_name, fields } => self.analyze_struct_literal(type_name, fields, expr.span.clone()),
            ExprKind::Cast { target, expr: inner } => {
                self.analyze_expr(inner);
                self.resolve_type(target)
            }
            ExprKind::AddressOf(inner) => {
                let inner_ty = self.analyze_expr(inner);
                let mut info = TypeInfo::simple(TypeKind::Pointer);
                info.pointer_type_name = Some(self.type_to_string(&inner_ty));
                info
            }
            ExprKind::Deref(inner) => {
                let inner_ty = self.analyze_expr(inner);
                if inner_ty.kind != TypeKind::Pointer && inner_ty.kind != TypeKind::Unknown {
                    self.error(error_codes::DEREF_NOT_POINTER, "cannot dereference a non-pointer value", expr.span.clone());
                    return TypeInfo::unknown();
                }
                TypeInfo::unknown()
            }
        }
    }

    fn analyze_variable(&mut self, name: &str, span: Span) -> TypeInfo {
        match self.symbols.lookup(name) {
            Some(sym) => sym.type_info.clone(),
            None => {
                self.undefined_variable(name, span);
                TypeInfo::unknown()
            }
        }
    }

    fn analyze_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> TypeInfo {
        let ty = self.analyze_expr(operand);
        match op {
            UnaryOp::Neg => {
                if !matches!(ty.kind, TypeKind::Int | TypeKind::Float | TypeKind::Double | TypeKind::Unknown) {
                    self.error(error_codes::UNARY_MINUS_NOT_NUMERIC, "unary '-' requires a numeric operand", span);
                    return TypeInfo::unknown();
                }
                ty
            }
            UnaryOp::Not => {
                if ty.kind != TypeKind::Bool && ty.kind != TypeKind::Unknown {
                    self.error(error_codes::LOGICAL_NOT_OPERAND_INVALID, "'!' requires a bool operand", span);
                    return TypeInfo::unknown();
                }
                TypeInfo::simple(TypeKind::Bool)
            }
        }
    }

    fn analyze_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, span: Span) -> TypeInfo {
        let lhs_ty = self.analyze_expr(lhs);
        let rhs_ty = self.analyze_expr(rhs);
        if lhs_ty.kind == TypeKind::Unknown || rhs_ty.kind == TypeKind::Unknown {
            return match op {
                BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::And | BinaryOp::Or => {
                    TypeInfo::simple(TypeKind::Bool)
                }
                _ => TypeInfo::unknown(),
            };
        }
        match op {
            BinaryOp::And | BinaryOp::Or => {
                if lhs_ty.kind != TypeKind::Bool || rhs_ty.kind != TypeKind::Bool {
                    self.error(error_codes::LOGICAL_NOT_BOOLEAN, "logical operator requires bool operands", span);
                }
                TypeInfo::simple(TypeKind::Bool)
            }
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => TypeInfo::simple(TypeKind::Bool),
            BinaryOp::Add if lhs_ty.kind == TypeKind::String || rhs_ty.kind == TypeKind::String => {
                if lhs_ty.kind != TypeKind::String || rhs_ty.kind != TypeKind::String {
                    self.error(error_codes::TYPE_MISMATCH, "'+' between str and non-str is not supported", span);
                }
                TypeInfo::simple(TypeKind::String)
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                if !is_numeric(lhs_ty.kind) || !is_numeric(rhs_ty.kind) {
                    self.error(error_codes::ARITHMETIC_NOT_NUMERIC, "arithmetic operators require numeric operands", span);
                    return TypeInfo::unknown();
                }
                TypeInfo::simple(widen(lhs_ty.kind, rhs_ty.kind))
            }
        }
    }

    fn analyze_call(&mut self, callee: &str, args: &[Expr], span: Span) -> TypeInfo {
        let arg_types: Vec<TypeInfo> = args.iter().map(|a| self.analyze_expr(a)).collect();
        let resolved = self.resolve_call_target(callee, &arg_types);
        let Some(function) = resolved else {
            if self.extern_functions.contains_key(callee) {
                return self.resolve_type(&self.extern_functions[callee].return_type.clone());
            }
            self.error(error_codes::UNDEFINED_FUNCTION, format!("undefined function '{callee}'"), span);
            return TypeInfo::unknown();
        };
        self.check_arguments(&function, &arg_types, span);
        self.resolve_type(&function.return_type)
    }

    /// Picks the overload whose parameter count/types best match `args`
    /// (Q2); variadic builtins (`print`/`println`/`format`) accept any
    /// argument list.
    fn resolve_call_target(&self, callee: &str, arg_types: &[TypeInfo]) -> Option<quark_ast::Function> {
        if self.functions.contains_key(callee) {
            return self.functions.get(callee).cloned();
        }
        if OVERLOADED_BUILTINS.contains(&callee) {
            for suffix in ["int", "double", "bool"] {
                if let Some(f) = self.functions.get(&format!("{callee}({suffix})")) {
                    if f.params.len() == arg_types.len() {
                        return Some(f.clone());
                    }
                }
            }
            return self.functions.values().find(|f| f.name == callee).cloned();
        }
        None
    }

    fn check_arguments(&mut self, function: &quark_ast::Function, arg_types: &[TypeInfo], span: Span) {
        if function.params.len() != arg_types.len() && !matches!(function.name.as_str(), "print" | "println" | "format") {
            self.error(
                error_codes::ARGUMENT_COUNT_MISMATCH,
                format!("'{}' expects {} argument(s), found {}", function.name, function.params.len(), arg_types.len()),
                span,
            );
            return;
        }
        for (param, actual) in function.params.iter().zip(arg_types) {
            let expected = self.resolve_type(&param.type_name);
            if !self.can_implicitly_convert(actual, &expected) {
                self.error(
                    error_codes::ARGUMENT_TYPE_MISMATCH,
                    format!("argument '{}' expects '{}', found '{}'", param.name, self.type_to_string(&expected), self.type_to_string(actual)),
                    span.clone(),
                );
            }
        }
    }

    fn analyze_method_call(&mut self, object: &Expr, method: &str, args: &[Expr], span: Span) -> TypeInfo {
        let object_ty = self.analyze_expr(object);
        let arg_types: Vec<TypeInfo> = args.iter().map(|a| self.analyze_expr(a)).collect();
        if object_ty.kind == TypeKind::Array {
            return self.analyze_array_method(method, object_ty.element_type, span);
        }
        if object_ty.kind == TypeKind::Unknown {
            return TypeInfo::unknown();
        }
        if object_ty.kind != TypeKind::Struct {
            self.error(error_codes::METHOD_CALL_NOT_STRUCT, "method call target is not a struct", span);
            return TypeInfo::unknown();
        }
        let struct_name = object_ty.struct_name.clone().unwrap_or_default();
        let Some(def) = self.find_method(&struct_name, method).cloned() else {
            self.error(error_codes::UNKNOWN_METHOD, format!("struct '{struct_name}' has no method '{method}'"), span);
            return TypeInfo::unknown();
        };
        self.check_arguments(&def, &arg_types, span);
        self.resolve_type(&def.return_type)
    }

    /// The array builtin methods (`len`/`length`/`count`/`push`/`pop`);
    /// anything else is `ARRAY_METHOD_UNSUPPORTED`.
    fn analyze_array_method(&mut self, method: &str, element_type: Option<TypeKind>, span: Span) -> TypeInfo {
        match method {
            "len" | "length" | "count" => TypeInfo::simple(TypeKind::Int),
            "push" => TypeInfo::simple(TypeKind::Void),
            "pop" => element_type.map(TypeInfo::simple).unwrap_or_else(TypeInfo::unknown),
            "slice" => element_type.map(|e| TypeInfo::array_of(e, None)).unwrap_or_else(TypeInfo::unknown),
            "free" => TypeInfo::simple(TypeKind::Void),
            _ => {
                self.error(error_codes::ARRAY_METHOD_UNSUPPORTED, format!("unsupported array method '{method}'"), span);
                TypeInfo::unknown()
            }
        }
    }

    fn analyze_static_call(&mut self, type_name: &str, method: &str, args: &[Expr], span: Span) -> TypeInfo {
        let arg_types: Vec<TypeInfo> = args.iter().map(|a| self.analyze_expr(a)).collect();
        if !self.structs.contains_key(type_name) {
            self.error(error_codes::UNKNOWN_STRUCT, format!("unknown struct '{type_name}'"), span);
            return TypeInfo::unknown();
        }
        let Some(def) = self.find_method(type_name, method).cloned() else {
            self.error(error_codes::UNKNOWN_STATIC_METHOD, format!("struct '{type_name}' has no static method '{method}'"), span);
            return TypeInfo::unknown();
        };
        self.check_arguments(&def, &arg_types, span);
        self.resolve_type(&def.return_type)
    }

    fn analyze_field_access(&mut self, object: &Expr, field: &str, span: Span) -> TypeInfo {
        let object_ty = self.analyze_expr(object);
        if object_ty.kind == TypeKind::Unknown {
            return TypeInfo::unknown();
        }
        if object_ty.kind != TypeKind::Struct {
            self.error(error_codes::MEMBER_ACCESS_NOT_STRUCT, "field access target is not a struct", span);
            return TypeInfo::unknown();
        }
        let struct_name = object_ty.struct_name.clone().unwrap_or_default();
        match self.get_struct_fields(&struct_name).into_iter().find(|f| f.name == field) {
            Some(f) => self.resolve_type(&f.type_name),
            None => {
                self.error(error_codes::UNKNOWN_FIELD, format!("struct '{struct_name}' has no field '{field}'"), span);
                TypeInfo::unknown()
            }
        }
    }

    fn analyze_index(&mut self, base: &Expr, index: &Expr, span: Span) -> TypeInfo {
        let base_ty = self.analyze_expr(base);
        let index_ty = self.analyze_expr(index);
        // Map keys are not positional, so the int-index check only applies
        // to arrays/strings.
        if base_ty.kind != TypeKind::Map && index_ty.kind != TypeKind::Int && index_ty.kind != TypeKind::Unknown {
            self.error(error_codes::INDEX_NOT_INTEGER, "index must be an int", span.clone());
        }
        match base_ty.kind {
            TypeKind::Array => base_ty.element_type.map(TypeInfo::simple).unwrap_or_else(TypeInfo::unknown),
            TypeKind::String => TypeInfo::simple(TypeKind::String),
            // `quark_map_get` stores/retrieves values through the same
            // opaque-string-pointer convention as `quark_map_set`, so a map
            // read is always typed as `str` regardless of what was stored.
            TypeKind::Map => TypeInfo::simple(TypeKind::String),
            TypeKind::Unknown => TypeInfo::unknown(),
            _ => {
                self.error(error_codes::SUBSCRIPT_NOT_INDEXABLE, "value is not indexable", span);
                TypeInfo::unknown()
            }
        }
    }

    fn analyze_array_literal(&mut self, elements: &[Expr], span: Span) -> TypeInfo {
        if elements.is_empty() {
            return TypeInfo::array_of(TypeKind::Unknown, Some(0));
        }
        let first = self.analyze_expr(&elements[0]);
        for el in &elements[1..] {
            let ty = self.analyze_expr(el);
            if !self.can_implicitly_convert(&ty, &first) {
                self.error(error_codes::ARRAY_LITERAL_INCONSISTENT_TYPES, "array literal elements must share a type", span.clone());
            }
        }
        TypeInfo::array_of(first.kind, Some(elements.len()))
    }

    fn analyze_struct_literal(&mut self, type_name: &str, fields: &[(String, Expr)], span: Span) -> TypeInfo {
        if !self.structs.contains_key(type_name) {
            self.error(error_codes::UNKNOWN_STRUCT, format!("unknown struct '{type_name}'"), span);
            return TypeInfo::unknown();
        }
        let declared_fields = self.get_struct_fields(type_name);
        let mut seen = std::collections::HashSet::new();
        for (name, value) in fields {
            let value_ty = self.analyze_expr(value);
            if !seen.insert(name.clone()) {
                self.error(error_codes::DUPLICATE_STRUCT_LITERAL_FIELD, format!("duplicate field '{name}' in struct literal"), span.clone());
                continue;
            }
            match declared_fields.iter().find(|f| &f.name == name) {
                Some(field_def) => {
                    let expected = self.resolve_type(&field_def.type_name);
                    if !self.can_implicitly_convert(&value_ty, &expected) {
                        self.error(error_codes::STRUCT_LITERAL_FIELD_TYPE_MISMATCH, format!("field '{name}' expects '{}', found '{}'", self.type_to_string(&expected), self.type_to_string(&value_ty)), span.clone());
                    }
                }
                None => self.error(error_codes::UNKNOWN_FIELD, format!("struct '{type_name}' has no field '{name}'"), span.clone()),
            }
        }
        for field_def in &declared_fields {
            if !seen.contains(&field_def.name) {
                self.warning(error_codes::STRUCT_LITERAL_FIELD_UNINITIALIZED, format!("field '{}' is not initialized", field_def.name), span.clone());
            }
        }
        TypeInfo::struct_of(type_name.to_string())
    }
}

fn is_numeric(kind: TypeKind) -> bool {
    matches!(kind, TypeKind::Int | TypeKind::Float | TypeKind::Double)
}

/// The wider of two numeric kinds.
fn widen(a: TypeKind, b: TypeKind) -> TypeKind {
    use TypeKind::*;
    match (a, b) {
        (Double, _) | (_, Double) => Double,
        (Float, _) | (_, Float) => Float,
        _ => Int,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quark_diagnostics::DiagnosticEngine;
    use quark_parser::Parser;

    fn analyze(src: &str) -> (bool, Vec<String>) {
        let mut parser = Parser::new(src, "t.qk").unwrap();
        let program = parser.parse().unwrap();
        let mut diags = DiagnosticEngine::new();
        let mut analyzer = SemanticAnalyzer::new(&mut diags);
        let ok = analyzer.analyze(&program);
        (ok, diags.diagnostics().iter().map(|d| d.code.to_string()).collect())
    }

    #[test]
    fn int_plus_double_widens_to_double() {
        let (ok, codes) = analyze("double f() { var x: int = 1; var y: double = 2.0; ret x + y; }");
        assert!(ok, "unexpected errors: {codes:?}");
    }

    #[test]
    fn struct_field_access_type_checks() {
        let (ok, codes) = analyze(
            r#"struct Point { data { x: int, y: int } }
            int main() { var p = Point { x: 1, y: 2 }; ret p.x; }"#,
        );
        assert!(ok, "unexpected errors: {codes:?}");
    }

    #[test]
    fn unknown_struct_field_is_reported() {
        let (ok, codes) = analyze(
            r#"struct Point { data { x: int } }
            int main() { var p = Point { x: 1 }; ret p.z; }"#,
        );
        assert!(!ok);
        assert!(codes.contains(&error_codes::UNKNOWN_FIELD.to_string()));
    }
}
