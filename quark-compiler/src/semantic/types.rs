//! Type resolution and compatibility rules, ported in
//! meaning from `original_source/include/semantic_analyzer.h`'s
//! `resolveType`/`isTypeCompatible`/`canImplicitlyConvert`/
//! `typeToString`/`getStructFields`/`findMethod`.

use super::SemanticAnalyzer;
use quark_ast::{Function, StructDef, TypeInfo, TypeKind, TypeName};
use std::collections::HashMap;

impl<'a> SemanticAnalyzer<'a> {
    /// Lowers the surface `TypeName` syntax into a resolved `TypeInfo`.
    /// A `Named` type that isn't a known struct resolves to `Unknown`
    /// rather than erroring here — callers report `UNKNOWN_STRUCT` with
    /// the precise context (variable decl, cast, field, ...).
    pub(crate) fn resolve_type(&self, name: &TypeName) -> TypeInfo {
        match name {
            TypeName::Int => TypeInfo::simple(TypeKind::Int),
            TypeName::Float => TypeInfo::simple(TypeKind::Float),
            TypeName::Double => TypeInfo::simple(TypeKind::Double),
            TypeName::Bool => TypeInfo::simple(TypeKind::Bool),
            TypeName::Str => TypeInfo::simple(TypeKind::String),
            TypeName::Void => TypeInfo::simple(TypeKind::Void),
            TypeName::Named(n) => {
                if self.structs.contains_key(n) {
                    TypeInfo::struct_of(n.clone())
                } else {
                    TypeInfo::unknown()
                }
            }
            TypeName::Array(elem, size) => {
                let elem_info = self.resolve_type(elem);
                TypeInfo::array_of(elem_info.kind, *size)
            }
            TypeName::Pointer(base) => {
                let base_info = self.resolve_type(base);
                let mut info = TypeInfo::simple(TypeKind::Pointer);
                info.pointer_type_name = Some(base_info_display(base));
                info
            }
        }
    }

    /// The source-level spelling of a resolved type, for diagnostics.
    pub(crate) fn type_to_string(&self, ty: &TypeInfo) -> String {
        match ty.kind {
            TypeKind::Int => "int".to_string(),
            TypeKind::Float => "float".to_string(),
            TypeKind::Double => "double".to_string(),
            TypeKind::Bool => "bool".to_string(),
            TypeKind::String => "str".to_string(),
            TypeKind::Void => "void".to_string(),
            TypeKind::Struct => ty.struct_name.clone().unwrap_or_else(|| "<struct>".to_string()),
            TypeKind::Array => format!("{}[]", ty.element_type.map(kind_name).unwrap_or("unknown")),
            TypeKind::Map => "map".to_string(),
            TypeKind::Pointer => format!("{}*", ty.pointer_type_name.clone().unwrap_or_else(|| "unknown".to_string())),
            TypeKind::Null => "null".to_string(),
            TypeKind::Unknown => "unknown".to_string(),
        }
    }

    /// Exact-match compatibility, used for return-type checks and
    /// parameter binding once implicit conversions are already accounted
    /// for by the caller.
    pub(crate) fn is_type_compatible(&self, a: &TypeInfo, b: &TypeInfo) -> bool {
        if a.kind == TypeKind::Unknown || b.kind == TypeKind::Unknown {
            return true; // already reported upstream; avoid cascades
        }
        match (a.kind, b.kind) {
            (TypeKind::Struct, TypeKind::Struct) => a.struct_name == b.struct_name,
            (TypeKind::Array, TypeKind::Array) => a.element_type == b.element_type,
            (TypeKind::Pointer, TypeKind::Pointer) => a.pointer_type_name == b.pointer_type_name,
            _ => a.kind == b.kind,
        }
    }

    /// Whether a value of type `from` may be implicitly used where `to` is
    /// expected: `int`→`float`/`double`, `float`→`double`, `null`→any
    /// pointer/struct, or an exact match.
    pub(crate) fn can_implicitly_convert(&self, from: &TypeInfo, to: &TypeInfo) -> bool {
        if self.is_type_compatible(from, to) {
            return true;
        }
        matches!(
            (from.kind, to.kind),
            (TypeKind::Int, TypeKind::Float)
                | (TypeKind::Int, TypeKind::Double)
                | (TypeKind::Float, TypeKind::Double)
        ) || (from.kind == TypeKind::Null && matches!(to.kind, TypeKind::Pointer | TypeKind::Struct))
    }

    /// Transitive field list, parent fields first then the struct's own,
    /// in declaration order (invariant I5 / testable property P3).
    pub(crate) fn get_struct_fields(&self, name: &str) -> Vec<quark_ast::Field> {
        struct_fields(&self.structs, name)
    }

    /// Walks the parent chain looking for `method_name`, preferring the
    /// most-derived definition.
    pub(crate) fn find_method(&self, struct_name: &str, method_name: &str) -> Option<&Function> {
        let mut current = Some(struct_name.to_string());
        while let Some(name) = current {
            let def = self.structs.get(&name)?;
            if let Some(m) = def.methods.iter().find(|m| m.name == method_name) {
                return self.functions.get(&mangled_name(&name, method_name)).or(Some(m));
            }
            current = def.parent.clone();
        }
        None
    }
}

/// `Struct::method` mangled name.
pub(crate) fn mangled_name(struct_name: &str, method_name: &str) -> String {
    format!("{struct_name}::{method_name}")
}

/// Standalone version of `get_struct_fields` usable before a
/// `SemanticAnalyzer` exists (codegen re-derives field layout from the
/// same map without re-running analysis).
pub fn struct_fields(structs: &HashMap<String, StructDef>, name: &str) -> Vec<quark_ast::Field> {
    let Some(def) = structs.get(name) else {
        return Vec::new();
    };
    let mut fields = match &def.parent {
        Some(parent) => struct_fields(structs, parent),
        None => Vec::new(),
    };
    fields.extend(def.fields.clone());
    fields
}

fn kind_name(k: TypeKind) -> &'static str {
    match k {
        TypeKind::Int => "int",
        TypeKind::Float => "float",
        TypeKind::Double => "double",
        TypeKind::Bool => "bool",
        TypeKind::String => "str",
        TypeKind::Void => "void",
        TypeKind::Struct => "struct",
        TypeKind::Array => "array",
        TypeKind::Map => "map",
        TypeKind::Pointer => "pointer",
        TypeKind::Null => "null",
        TypeKind::Unknown => "unknown",
    }
}

fn base_info_display(name: &TypeName) -> String {
    name.display()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quark_diagnostics::{DiagnosticEngine, Span};

    fn dummy_span() -> Span {
        Span::new("t.qk".to_string(), 1, 1, 1)
    }

    #[test]
    fn int_implicitly_converts_to_double() {
        let mut diags = DiagnosticEngine::new();
        let analyzer = SemanticAnalyzer::new(&mut diags);
        let int_ty = TypeInfo::simple(TypeKind::Int);
        let double_ty = TypeInfo::simple(TypeKind::Double);
        assert!(analyzer.can_implicitly_convert(&int_ty, &double_ty));
        assert!(!analyzer.can_implicitly_convert(&double_ty, &int_ty));
    }

    #[test]
    fn struct_fields_flatten_parent_then_own_in_order() {
        let mut structs = HashMap::new();
        structs.insert(
            "Animal".to_string(),
            StructDef {
                name: "Animal".to_string(),
                parent: None,
                fields: vec![quark_ast::Field {
                    name: "name".to_string(),
                    type_name: TypeName::Str,
                    span: dummy_span(),
                }],
                methods: vec![],
                span: dummy_span(),
            },
        );
        structs.insert(
            "Dog".to_string(),
            StructDef {
                name: "Dog".to_string(),
                parent: Some("Animal".to_string()),
                fields: vec![quark_ast::Field {
                    name: "breed".to_string(),
                    type_name: TypeName::Str,
                    span: dummy_span(),
                }],
                methods: vec![],
                span: dummy_span(),
            },
        );
        let fields = struct_fields(&structs, "Dog");
        assert_eq!(fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["name", "breed"]);
    }
}
