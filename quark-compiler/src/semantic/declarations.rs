//! Declaration-collection pass, ported from
//! `semantic_analyzer.cpp`'s `collectDeclarations`/`collectStructDef`/
//! `collectFunction`/`collectExternFunction`/`collectImplBlock`.

use super::types::mangled_name;
use super::SemanticAnalyzer;
use crate::symbols::{Symbol, SymbolKind};
use quark_ast::{Stmt, StmtKind};
use quark_diagnostics::error_codes;

impl<'a> SemanticAnalyzer<'a> {
    pub(crate) fn collect_declarations(&mut self, statements: &[&Stmt]) {
        // Structs first: functions/methods may reference struct types that
        // are declared later in the same file.
        for stmt in statements {
            if let StmtKind::StructDef(def) = &stmt.kind {
                self.collect_struct_def(def, stmt.span.clone());
            }
        }
        for stmt in statements {
            match &stmt.kind {
                StmtKind::FunctionDef(f) => self.collect_function(f),
                StmtKind::ExternFunction(f) => self.collect_extern_function(f),
                StmtKind::ExternStruct { name } => {
                    self.structs.entry(name.clone()).or_insert_with(|| quark_ast::StructDef {
                        name: name.clone(),
                        parent: None,
                        fields: Vec::new(),
                        methods: Vec::new(),
                        span: stmt.span.clone(),
                    });
                }
                StmtKind::ImplBlock { type_name, methods } => self.collect_impl_block(type_name, methods),
                _ => {}
            }
        }
    }

    fn collect_struct_def(&mut self, def: &quark_ast::StructDef, span: quark_diagnostics::Span) {
        if self.structs.contains_key(&def.name) {
            self.error(error_codes::STRUCT_ALREADY_DEFINED, format!("struct '{}' is already defined", def.name), span);
            return;
        }
        self.structs.insert(def.name.clone(), def.clone());
        for method in &def.methods {
            self.register_method(&def.name, method);
        }
    }

    fn collect_impl_block(&mut self, type_name: &str, methods: &[quark_ast::Function]) {
        let Some(def) = self.structs.get(type_name).cloned() else {
            self.error(
                error_codes::IMPL_UNKNOWN_STRUCT,
                format!("cannot implement methods for unknown struct '{type_name}'"),
                methods.first().map(|m| m.span.clone()).unwrap_or_else(quark_diagnostics::Span::unknown),
            );
            return;
        };
        let mut merged = def.clone();
        for method in methods {
            self.register_method(type_name, method);
            merged.methods.push(method.clone());
        }
        self.structs.insert(type_name.to_string(), merged);
    }

    fn register_method(&mut self, struct_name: &str, method: &quark_ast::Function) {
        let key = mangled_name(struct_name, &method.name);
        if self.functions.contains_key(&key) {
            self.error(
                error_codes::FUNCTION_ALREADY_DEFINED,
                format!("method '{struct_name}::{}' is already defined", method.name),
                method.span.clone(),
            );
            return;
        }
        self.functions.insert(key, method.clone());
    }

    fn collect_function(&mut self, f: &quark_ast::Function) {
        if self.functions.contains_key(&f.name) {
            self.error(error_codes::FUNCTION_ALREADY_DEFINED, format!("function '{}' is already defined", f.name), f.span.clone());
            return;
        }
        self.functions.insert(f.name.clone(), f.clone());
        self.symbols.global_scope().declare(Symbol {
            name: f.name.clone(),
            kind: SymbolKind::Function,
            type_info: self.resolve_type(&f.return_type),
            span: f.span.clone(),
        });
    }

    fn collect_extern_function(&mut self, f: &quark_ast::ExternFunction) {
        if self.extern_functions.contains_key(&f.name) || self.functions.contains_key(&f.name) {
            self.error(error_codes::FUNCTION_ALREADY_DEFINED, format!("function '{}' is already defined", f.name), f.span.clone());
            return;
        }
        self.extern_functions.insert(f.name.clone(), f.clone());
    }
}
