//! Error code catalogue. Three independent namespaces, matching how each
//! compiler phase reports failures: `E0xxx` is shared between the parser
//! and codegen for generic syntax/type complaints, `Cxxxx` is codegen's
//! own namespace for failures discovered while lowering to IR, and `E1xx`
//! (plus `Wxxx` warnings) belongs entirely to the semantic analyzer.

// Lex/parse and shared codegen codes (E0001-E0010).
pub const UNEXPECTED_TOKEN: &str = "E0001";
pub const MISSING_SEMICOLON: &str = "E0002";
pub const UNDEFINED_VARIABLE_PARSE: &str = "E0003";
pub const TYPE_MISMATCH: &str = "E0004";
pub const FUNCTION_NOT_FOUND: &str = "E0005";
pub const INVALID_SYNTAX: &str = "E0006";
pub const MISSING_BRACE: &str = "E0007";
pub const DUPLICATE_DEFINITION: &str = "E0008";
pub const INVALID_ASSIGNMENT: &str = "E0009";
pub const MISSING_RETURN: &str = "E0010";

// Codegen-specific codes (C0001-C0005).
pub const CODEGEN_FAILED: &str = "C0001";
pub const INVALID_TYPE: &str = "C0002";
pub const LLVM_ERROR: &str = "C0003";
pub const SYMBOL_NOT_FOUND: &str = "C0004";
pub const INVALID_OPERATION: &str = "C0005";

// Semantic analysis codes (E101-E140).
pub const STRUCT_ALREADY_DEFINED: &str = "E101";
pub const PARENT_STRUCT_NOT_FOUND: &str = "E102";
pub const FUNCTION_ALREADY_DEFINED: &str = "E103";
pub const IMPL_UNKNOWN_STRUCT: &str = "E104";
pub const BREAK_OUTSIDE_LOOP: &str = "E105";
pub const CONTINUE_OUTSIDE_LOOP: &str = "E106";
pub const DUPLICATE_PARAMETER: &str = "E107";
pub const INFERENCE_NEEDS_INITIALIZER: &str = "E108";
pub const VAR_INIT_TYPE_MISMATCH: &str = "E109";
pub const VARIABLE_ALREADY_DEFINED: &str = "E110";
pub const UNDEFINED_VARIABLE: &str = "E111";
pub const ASSIGN_TYPE_MISMATCH: &str = "E112";
pub const MEMBER_ACCESS_NOT_STRUCT: &str = "E113";
pub const UNKNOWN_FIELD: &str = "E114";
pub const FIELD_ASSIGN_TYPE_MISMATCH: &str = "E115";
pub const SUBSCRIPT_NOT_INDEXABLE: &str = "E116";
pub const INDEX_NOT_INTEGER: &str = "E117";
pub const ARRAY_ELEMENT_TYPE_MISMATCH: &str = "E118";
pub const DEREF_NOT_POINTER: &str = "E119";
pub const CONDITION_NOT_BOOLEAN: &str = "E120";
pub const RETURN_OUTSIDE_FUNCTION: &str = "E121";
pub const VOID_RETURNS_VALUE: &str = "E122";
pub const NON_VOID_MISSING_RETURN_VALUE: &str = "E123";
pub const RETURN_TYPE_MISMATCH: &str = "E124";
pub const UNDEFINED_FUNCTION: &str = "E125";
pub const NOT_A_FUNCTION: &str = "E126";
pub const ARGUMENT_COUNT_MISMATCH: &str = "E127";
pub const ARGUMENT_TYPE_MISMATCH: &str = "E128";
pub const ARRAY_METHOD_UNSUPPORTED: &str = "E129";
pub const METHOD_CALL_NOT_STRUCT: &str = "E130";
pub const UNKNOWN_METHOD: &str = "E131";
pub const UNKNOWN_STRUCT: &str = "E132";
pub const UNKNOWN_STATIC_METHOD: &str = "E133";
pub const ARITHMETIC_NOT_NUMERIC: &str = "E134";
pub const LOGICAL_NOT_BOOLEAN: &str = "E135";
pub const UNARY_MINUS_NOT_NUMERIC: &str = "E136";
pub const LOGICAL_NOT_OPERAND_INVALID: &str = "E137";
pub const DUPLICATE_STRUCT_LITERAL_FIELD: &str = "E138";
pub const STRUCT_LITERAL_FIELD_TYPE_MISMATCH: &str = "E139";
pub const ARRAY_LITERAL_INCONSISTENT_TYPES: &str = "E140";
pub const WILDCARD_MATCH_ARM_NOT_LAST: &str = "E141";

// Semantic analysis warnings.
pub const MAY_NOT_RETURN: &str = "W001";
pub const MAY_BE_UNINITIALIZED: &str = "W002";
pub const STRUCT_LITERAL_FIELD_UNINITIALIZED: &str = "W003";
pub const FLOAT_MATCH_PATTERN: &str = "W004";

/// Fixed help text per code, ported verbatim in meaning from
/// `original_source/src/error_reporter.cpp::getErrorSuggestions` (spec.md
/// §7 "Help text per code (fixed, localised strings)"). Codes the original
/// never assigned suggestions for (the E1xx semantic range, which the
/// original's semantic analyzer reports through a different path with
/// inline messages) return an empty slice; `Diagnostic::new` only attaches
/// what's here, callers add anything more specific via `with_help`.
pub fn help_for(code: &str) -> &'static [&'static str] {
    match code {
        UNEXPECTED_TOKEN => &[
            "Check for missing semicolons, braces, or parentheses",
            "Verify that all keywords are spelled correctly",
        ],
        MISSING_SEMICOLON => &["Add a semicolon ';' at the end of the statement"],
        UNDEFINED_VARIABLE_PARSE | UNDEFINED_VARIABLE => &[
            "Check if the variable is declared before use",
            "Verify the variable name spelling",
            "Ensure the variable is in scope",
        ],
        TYPE_MISMATCH => &[
            "Check that the types on both sides of the assignment match",
            "Consider using explicit type conversion",
        ],
        FUNCTION_NOT_FOUND => &[
            "Check if the function is declared before use",
            "Verify the function name spelling",
            "Ensure the function is imported if it's from another module",
        ],
        INVALID_SYNTAX => &[
            "Review the language syntax documentation",
            "Check for proper use of keywords and operators",
        ],
        MISSING_BRACE => &[
            "Add the missing opening or closing brace '{' or '}'",
            "Check that all code blocks are properly enclosed",
        ],
        DUPLICATE_DEFINITION => &[
            "Remove the duplicate definition",
            "Use different names for different variables/functions",
        ],
        INVALID_ASSIGNMENT => &[
            "Check that you're assigning to a valid lvalue",
            "Ensure the variable is not declared as const",
        ],
        MISSING_RETURN => &[
            "Add a return statement to the function",
            "Ensure all code paths return a value",
        ],
        CODEGEN_FAILED => &[
            "Check for type compatibility issues",
            "Verify that all referenced symbols are defined",
        ],
        INVALID_TYPE => &[
            "Use a valid type name (int, str, bool, etc.)",
            "Check if custom types are properly defined",
        ],
        LLVM_ERROR => &[
            "This is an internal compiler error",
            "Please report this issue to the Quark developers",
        ],
        SYMBOL_NOT_FOUND => &[
            "Ensure the symbol is declared in the current scope",
            "Check for typos in the symbol name",
        ],
        INVALID_OPERATION => &[
            "Check that the operation is valid for the given types",
            "Verify operator precedence and associativity",
        ],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_code_returns_fixed_suggestions() {
        assert_eq!(help_for(MISSING_SEMICOLON), ["Add a semicolon ';' at the end of the statement"]);
    }

    #[test]
    fn unmapped_code_returns_empty() {
        assert!(help_for(BREAK_OUTSIDE_LOOP).is_empty());
    }
}
