//! `import` recursion, exercised against real files on
//! disk since `parse_program` resolves import paths relative to the
//! importing file's own directory, not the process cwd.

use quark_ast::StmtKind;
use quark_diagnostics::SourceManager;
use std::fs;

fn write(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("failed to write fixture");
    path
}

#[test]
fn single_import_is_inlined_as_an_include() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "math.qk", "int square(x: int) { ret x * x; }");
    let entry = write(
        dir.path(),
        "main.qk",
        r#"import "math.qk"; int main() { ret square(3); }"#,
    );

    let mut source_manager = SourceManager::new();
    let program = quark_parser::parse_program(&entry, &mut source_manager).expect("parse should succeed");

    let includes: Vec<_> = program.statements.iter().filter(|s| matches!(s.kind, StmtKind::Include(_))).collect();
    assert_eq!(includes.len(), 1);
    let StmtKind::Include(inlined) = &includes[0].kind else { unreachable!() };
    assert_eq!(inlined.len(), 1);
    assert!(matches!(inlined[0].kind, StmtKind::FunctionDef(ref f) if f.name == "square"));
}

/// The same path may be imported multiple times; the core deduplicates.
/// Two distinct files both importing the same shared file must not
/// inline it twice.
#[test]
fn diamond_import_is_deduplicated() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "shared.qk", "int one() { ret 1; }");
    write(dir.path(), "left.qk", r#"import "shared.qk"; int left_fn() { ret one(); }"#);
    write(dir.path(), "right.qk", r#"import "shared.qk"; int right_fn() { ret one(); }"#);
    let entry = write(
        dir.path(),
        "main.qk",
        r#"import { "left.qk", "right.qk" } int main() { ret left_fn() + right_fn(); }"#,
    );

    let mut source_manager = SourceManager::new();
    let program = quark_parser::parse_program(&entry, &mut source_manager).expect("parse should succeed");

    fn count_function_defs(stmts: &[quark_ast::Stmt], name: &str) -> usize {
        stmts
            .iter()
            .map(|s| match &s.kind {
                StmtKind::FunctionDef(f) if f.name == name => 1,
                StmtKind::Include(inner) => count_function_defs(inner, name),
                _ => 0,
            })
            .sum()
    }

    assert_eq!(count_function_defs(&program.statements, "one"), 1, "shared.qk should be inlined exactly once");
}

#[test]
fn importing_a_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entry = write(dir.path(), "main.qk", r#"import "does_not_exist.qk"; int main() { ret 0; }"#);

    let mut source_manager = SourceManager::new();
    let err = quark_parser::parse_program(&entry, &mut source_manager).expect_err("missing import should fail");
    assert!(matches!(err, quark_parser::ParseError::ImportIo { .. }));
}
