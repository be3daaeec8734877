//! Declaration-collection pass diagnostics:
//! duplicate struct/function/method definitions and `impl` blocks for an
//! unknown struct, all detected before any statement body is analyzed.

use quark_compiler::semantic::SemanticAnalyzer;
use quark_diagnostics::DiagnosticEngine;
use quark_parser::Parser;

fn analyze(src: &str) -> (bool, Vec<String>) {
    let program = Parser::new(src, "decls.qk").expect("lexing failed").parse().expect("parsing failed");
    let mut diags = DiagnosticEngine::new();
    let mut analyzer = SemanticAnalyzer::new(&mut diags);
    let ok = analyzer.analyze(&program);
    (ok, diags.diagnostics().iter().map(|d| d.code.to_string()).collect())
}

#[test]
fn duplicate_struct_definition_is_rejected() {
    let (ok, codes) = analyze(
        r#"
        struct Point { data { x: int } }
        struct Point { data { y: int } }
        int main() { ret 0; }
        "#,
    );
    assert!(!ok);
    assert!(codes.contains(&"E101".to_string()), "expected E101 (struct already defined), got {codes:?}");
}

#[test]
fn duplicate_function_definition_is_rejected() {
    let (ok, _codes) = analyze(
        r#"
        int add(a: int, b: int) { ret a + b; }
        int add(a: int, b: int) { ret a - b; }
        int main() { ret 0; }
        "#,
    );
    assert!(!ok, "redefining a free function must be a semantic error");
}

#[test]
fn impl_block_for_unknown_struct_is_rejected() {
    let (ok, _codes) = analyze(
        r#"
        impl Ghost { int poke() { ret 0; } }
        int main() { ret 0; }
        "#,
    );
    assert!(!ok, "an impl block for a struct with no matching struct definition must be rejected");
}

#[test]
fn impl_block_extends_an_existing_struct_with_new_methods() {
    let (ok, _codes) = analyze(
        r#"
        struct Point { data { x: int, y: int } }
        impl Point { int sum(self) { ret this.x + this.y; } }
        int main() {
            var p: Point = Point { x: 1, y: 2 };
            ret p.sum();
        }
        "#,
    );
    assert!(ok, "a well-formed impl block should typecheck cleanly: {ok}");
}

#[test]
fn extern_struct_is_usable_as_a_field_type_without_a_body() {
    let (ok, _codes) = analyze(
        r#"
        extern "C" { struct FILE; }
        struct Handle { data { f: FILE } }
        int main() { ret 0; }
        "#,
    );
    assert!(ok, "an extern struct forward-declaration should register a usable opaque type");
}
