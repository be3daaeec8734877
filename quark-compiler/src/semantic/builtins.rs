//! Builtin function pre-registration, ported from
//! `original_source/src/semantic_analyzer.cpp::registerBuiltinFunctions`.
//! Resolved per SPEC_FULL.md §8 Q2 into explicit typed overloads (each
//! overload gets its own mangled entry in `functions`) instead of the
//! original's C-variadic-style overloading.

use super::SemanticAnalyzer;
use quark_ast::{Function, Param, TypeName};
use quark_diagnostics::Span;

fn builtin_span() -> Span {
    Span::new("<builtin>".to_string(), 0, 0, 0)
}

fn func(name: &str, params: &[(&str, TypeName)], return_type: TypeName) -> Function {
    Function {
        name: name.to_string(),
        params: params
            .iter()
            .map(|(n, t)| Param {
                name: n.to_string(),
                type_name: t.clone(),
            })
            .collect(),
        return_type,
        body: quark_ast::Block {
            statements: Vec::new(),
            span: builtin_span(),
        },
        receiver_struct: None,
        is_instance_method: false,
        span: builtin_span(),
    }
}

/// Registers one overload under `key` (the mangled lookup name used by
/// call-site resolution when more than one signature shares a base name).
fn register(analyzer: &mut SemanticAnalyzer, key: &str, f: Function) {
    analyzer.functions.insert(key.to_string(), f);
}

pub(crate) fn register_builtin_functions(analyzer: &mut SemanticAnalyzer) {
    use TypeName::*;

    register(analyzer, "print", func("print", &[], Void));
    register(analyzer, "println", func("println", &[], Void));
    register(analyzer, "readline", func("readline", &[], Str));
    register(analyzer, "format", func("format", &[], Str));

    register(analyzer, "to_string(int)", func("to_string", &[("x", Int)], Str));
    register(analyzer, "to_string(double)", func("to_string", &[("x", Double)], Str));
    register(analyzer, "to_string(bool)", func("to_string", &[("x", Bool)], Str));
    register(analyzer, "to_int", func("to_int", &[("s", Str)], Int));

    register(analyzer, "str_len", func("str_len", &[("s", Str)], Int));
    register(
        analyzer,
        "str_slice",
        func("str_slice", &[("s", Str), ("start", Int), ("end", Int)], Str),
    );
    register(analyzer, "str_concat", func("str_concat", &[("a", Str), ("b", Str)], Str));
    register(
        analyzer,
        "str_find",
        func("str_find", &[("haystack", Str), ("needle", Str)], Int),
    );
    register(
        analyzer,
        "str_replace",
        func("str_replace", &[("s", Str), ("old", Str), ("new", Str)], Str),
    );
    register(
        analyzer,
        "str_split",
        func("str_split", &[("s", Str), ("delim", Str)], Array(Box::new(Str), None)),
    );

    const UNARY_MATH: &[&str] = &[
        "sin", "cos", "tan", "sqrt", "log", "log10", "exp", "abs", "floor", "ceil", "round", "asin", "acos", "atan",
        "sinh", "cosh", "tanh",
    ];
    for name in UNARY_MATH {
        register(analyzer, name, func(name, &[("x", Double)], Double));
    }
    register(analyzer, "pow", func("pow", &[("base", Double), ("exp", Double)], Double));
    register(analyzer, "fmod", func("fmod", &[("x", Double), ("y", Double)], Double));
    register(analyzer, "atan2", func("atan2", &[("y", Double), ("x", Double)], Double));
    register(analyzer, "sleep", func("sleep", &[("ms", Int)], Void));

    for (suffix, ty) in [("int", Int), ("double", Double)] {
        register(analyzer, &format!("min({suffix})"), func("min", &[("a", ty.clone()), ("b", ty.clone())], ty.clone()));
        register(analyzer, &format!("max({suffix})"), func("max", &[("a", ty.clone()), ("b", ty.clone())], ty.clone()));
        register(
            analyzer,
            &format!("clamp({suffix})"),
            func("clamp", &[("x", ty.clone()), ("lo", ty.clone()), ("hi", ty.clone())], ty.clone()),
        );
    }
}

/// Base names that resolve to more than one registered overload — call
/// sites match by declared argument count/type before falling back to
/// the first-registered candidate (Q2).
pub const OVERLOADED_BUILTINS: &[&str] = &["to_string", "min", "max", "clamp"];

#[cfg(test)]
mod tests {
    use super::*;
    use quark_diagnostics::DiagnosticEngine;

    #[test]
    fn variadic_print_and_println_are_registered() {
        let mut diags = DiagnosticEngine::new();
        let analyzer = SemanticAnalyzer::new(&mut diags);
        assert!(analyzer.functions.contains_key("print"));
        assert!(analyzer.functions.contains_key("println"));
    }

    #[test]
    fn math_overloads_cover_the_full_unary_table() {
        let mut diags = DiagnosticEngine::new();
        let analyzer = SemanticAnalyzer::new(&mut diags);
        for name in ["sin", "sqrt", "tanh", "atan2", "pow", "fmod"] {
            assert!(
                analyzer.functions.contains_key(name) || analyzer.functions.keys().any(|k| k.starts_with(name)),
                "missing builtin {name}"
            );
        }
    }
}
