//! Typed AST for Quark: a closed set of expression and statement node
//! variants, each carrying its own [`Span`] directly (rather than the
//! indirect span-table approach of resolving a node to a location after
//! the fact) so that every diagnostic emitted downstream can point back
//! at exact source text.

use quark_diagnostics::Span;
use serde::{Deserialize, Serialize};

/// Resolved type information attached to expressions during semantic
/// analysis. `kind` is the primary tag; the remaining fields are
/// populated only for the kinds that need them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub kind: TypeKind,
    pub struct_name: Option<String>,
    pub element_type: Option<TypeKind>,
    pub array_size: Option<usize>,
    pub pointer_type_name: Option<String>,
}

impl TypeInfo {
    pub fn simple(kind: TypeKind) -> Self {
        Self {
            kind,
            struct_name: None,
            element_type: None,
            array_size: None,
            pointer_type_name: None,
        }
    }

    pub fn struct_of(name: impl Into<String>) -> Self {
        Self {
            kind: TypeKind::Struct,
            struct_name: Some(name.into()),
            element_type: None,
            array_size: None,
            pointer_type_name: None,
        }
    }

    pub fn array_of(element_type: TypeKind, array_size: Option<usize>) -> Self {
        Self {
            kind: TypeKind::Array,
            struct_name: None,
            element_type: Some(element_type),
            array_size,
            pointer_type_name: None,
        }
    }

    pub fn unknown() -> Self {
        Self::simple(TypeKind::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Int,
    Float,
    Double,
    Bool,
    String,
    Void,
    Struct,
    Array,
    Map,
    Pointer,
    Null,
    Unknown,
}

/// The textual type syntax as written by the user (`int`, `Point`,
/// `int[]`, `Point*`, `int*[]`, ...), preserved so nested pointer/array
/// depth survives parsing even though `TypeInfo`/`TypeKind` flattens to a
/// single tag plus one level of `element_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeName {
    Int,
    Float,
    Double,
    Bool,
    Str,
    Void,
    Named(String),
    Array(Box<TypeName>, Option<usize>),
    Pointer(Box<TypeName>),
}

impl TypeName {
    /// The canonical source-level spelling, used both for error messages
    /// and as the key into the struct-field type table.
    pub fn display(&self) -> String {
        match self {
            TypeName::Int => "int".to_string(),
            TypeName::Float => "float".to_string(),
            TypeName::Double => "double".to_string(),
            TypeName::Bool => "bool".to_string(),
            TypeName::Str => "str".to_string(),
            TypeName::Void => "void".to_string(),
            TypeName::Named(name) => name.clone(),
            TypeName::Array(elem, _) => format!("{}[]", elem.display()),
            TypeName::Pointer(base) => format!("{}*", base.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Number(f64),
    Str(String),
    Boolean(bool),
    Null,
    This,
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    StaticCall {
        type_name: String,
        method: String,
        args: Vec<Expr>,
    },
    FieldAccess {
        object: Box<Expr>,
        field: String,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    ArrayLiteral(Vec<Expr>),
    MapLiteral(Vec<(Expr, Expr)>),
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
    },
    StructLiteral {
        type_name: String,
        fields: Vec<(String, Expr)>,
    },
    Cast {
        target: TypeName,
        expr: Box<Expr>,
    },
    AddressOf(Box<Expr>),
    Deref(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchPattern {
    Literal(Expr),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchArm {
    pub pattern: MatchPattern,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub type_name: TypeName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeName,
    pub body: Block,
    /// `Some(struct_name)` when this function is an instance or static
    /// method declared inside a `struct`/`impl` block for `struct_name`.
    pub receiver_struct: Option<String>,
    /// Instance methods take an implicit `this`; static methods (and free
    /// functions) do not.
    pub is_instance_method: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub type_name: TypeName,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    pub parent: Option<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Function>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternFunction {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeName,
    pub is_variadic: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    VarDecl {
        name: String,
        declared_type: Option<TypeName>,
        init: Option<Expr>,
    },
    Assign {
        name: String,
        op: AssignOp,
        value: Expr,
    },
    MemberAssign {
        object: Expr,
        field: String,
        value: Expr,
    },
    ArrayAssign {
        array: Expr,
        index: Expr,
        value: Expr,
    },
    DerefAssign {
        pointer: Expr,
        value: Expr,
    },
    /// `branches[0]` is the `if`, the rest are `elif`s, in source order.
    If {
        branches: Vec<(Expr, Block)>,
        else_branch: Option<Block>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    ForRange {
        var: String,
        range: Expr,
        body: Block,
    },
    Match {
        subject: Expr,
        arms: Vec<MatchArm>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Expr(Expr),
    /// A scoped group of statements with no condition of its own. Used by
    /// the parser to desugar a C-style `for (init; cond; incr)` loop into
    /// `{ init; while (cond) { body; incr; } }`
    /// while keeping the loop variable scoped to the surrounding block.
    Block(Block),
    FunctionDef(Function),
    StructDef(StructDef),
    ImplBlock {
        type_name: String,
        methods: Vec<Function>,
    },
    ExternFunction(ExternFunction),
    ExternStruct {
        name: String,
    },
    /// The flattened, already-parsed statements of an imported file.
    Include(Vec<Stmt>),
}

/// Root of the parsed translation unit: the entry file's statements with
/// every `import`'d file's statements inlined as `Include` nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    /// Every statement reachable from `self`, recursing into `Include`
    /// nodes in source order. Declaration collection walks this view.
    pub fn flattened(&self) -> Vec<&Stmt> {
        fn walk<'a>(stmts: &'a [Stmt], out: &mut Vec<&'a Stmt>) {
            for stmt in stmts {
                if let StmtKind::Include(inner) = &stmt.kind {
                    walk(inner, out);
                } else {
                    out.push(stmt);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.statements, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_span() -> Span {
        Span::new("t.qk".to_string(), 1, 1, 1)
    }

    #[test]
    fn flattened_inlines_include_nodes_in_order() {
        let inner = vec![Stmt::new(
            StmtKind::Expr(Expr::new(ExprKind::Number(1.0), dummy_span())),
            dummy_span(),
        )];
        let program = Program::new(vec![
            Stmt::new(StmtKind::Include(inner), dummy_span()),
            Stmt::new(
                StmtKind::Expr(Expr::new(ExprKind::Number(2.0), dummy_span())),
                dummy_span(),
            ),
        ]);

        let flat = program.flattened();
        assert_eq!(flat.len(), 2);
        assert!(matches!(
            flat[0].kind,
            StmtKind::Expr(Expr { kind: ExprKind::Number(n), .. }) if n == 1.0
        ));
    }

    #[test]
    fn type_name_display_preserves_pointer_and_array_depth() {
        let ty = TypeName::Pointer(Box::new(TypeName::Array(Box::new(TypeName::Int), None)));
        assert_eq!(ty.display(), "int[]*");
    }
}
