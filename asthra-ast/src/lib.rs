use serde::{Deserialize, Serialize};

pub mod visit;

/// Byte range into the source buffer. Line/column resolution happens in the
/// diagnostics layer on demand.
pub type ByteSpan = std::ops::Range<usize>;

/// Parser-assigned expression identity. The semantic analyzer attaches
/// resolved type information in a side table keyed by this id, so the tree
/// itself stays a plain single-owner value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Root of the Abstract Syntax Tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
}

/// Import statement: import "path" [as alias];
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub path: String,
    pub alias: Option<String>,
    pub span: ByteSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
}

/// Declaration annotation: #[name]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    pub span: ByteSpan,
}

/// FFI ownership transfer tags, recorded but never enforced by the
/// front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnershipTag {
    TransferFull,
    TransferNone,
    Borrowed,
}

/// Top-level declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    Function(Function),
    Struct(StructDecl),
    Enum(EnumDecl),
    Impl(ImplBlock),
    Extern(ExternBlock),
}

impl Decl {
    pub fn span(&self) -> ByteSpan {
        match self {
            Decl::Function(f) => f.span.clone(),
            Decl::Struct(s) => s.span.clone(),
            Decl::Enum(e) => e.span.clone(),
            Decl::Impl(i) => i.span.clone(),
            Decl::Extern(e) => e.span.clone(),
        }
    }
}

/// Function or method definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub visibility: Visibility,
    pub annotations: Vec<Annotation>,
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeExpr,
    pub body: Block,
    pub span: ByteSpan,
}

impl Function {
    /// Instance methods have a literal `self` first parameter.
    pub fn has_self_receiver(&self) -> bool {
        self.params.first().is_some_and(|p| p.name == "self")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
    pub ownership: Vec<OwnershipTag>,
    pub span: ByteSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDecl {
    pub visibility: Visibility,
    pub annotations: Vec<Annotation>,
    pub name: String,
    pub type_params: Vec<String>,
    pub fields: Vec<Field>,
    pub span: ByteSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeExpr,
    pub span: ByteSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub visibility: Visibility,
    pub annotations: Vec<Annotation>,
    pub name: String,
    pub type_params: Vec<String>,
    pub variants: Vec<EnumVariant>,
    pub span: ByteSpan,
}

/// Enum variant: unit `V`, tuple `V(T, …)`, or struct `V { f: T, … }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    pub payload: Option<VariantPayload>,
    pub span: ByteSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariantPayload {
    Tuple(Vec<TypeExpr>),
    Struct(Vec<Field>),
}

/// Impl block attaching methods to a previously declared struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplBlock {
    pub struct_name: String,
    pub methods: Vec<Function>,
    pub span: ByteSpan,
}

/// Extern block for FFI declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternBlock {
    pub abi: String,
    pub functions: Vec<ExternFunction>,
    pub span: ByteSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternFunction {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub params: Vec<Param>,
    pub return_type: TypeExpr,
    pub span: ByteSpan,
}

/// Block of statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: ByteSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub span: ByteSpan,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// let [mut] NAME: TYPE [tags]* [= EXPR]; — the type is mandatory
    Let {
        is_mutable: bool,
        name: String,
        ty: TypeExpr,
        ownership: Vec<OwnershipTag>,
        value: Option<Expr>,
    },

    /// return EXPR; — the canonical void return is `return ();`
    Return(Expr),

    Expression(Expr),

    If(IfStmt),

    /// if let PATTERN = EXPR { … } [else { … }]
    IfLet {
        pattern: Pattern,
        value: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },

    /// for NAME in EXPR { … } — the iterable must be a slice
    For {
        variable: String,
        iterable: Expr,
        body: Block,
    },

    Match {
        scrutinee: Expr,
        arms: Vec<MatchArm>,
    },

    /// spawn f(args);
    Spawn { call: Expr },

    /// spawn_with_handle h = f(args);
    SpawnWithHandle { handle: String, call: Expr },

    Unsafe(Block),

    Break,
    Continue,

    Assign { target: Expr, value: Expr },

    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    pub else_branch: Option<ElseBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElseBranch {
    Block(Block),
    If(Box<IfStmt>),
}

/// Match arm: pattern => expression-or-block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: ArmBody,
    pub span: ByteSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArmBody {
    Expr(Expr),
    Block(Block),
}

/// Pattern for match arms and if-let
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub span: ByteSpan,
    pub kind: PatternKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatternKind {
    /// Identifier binding: x
    Ident(String),
    /// Wildcard: _
    Wildcard,
    /// Tuple pattern: (a, b, _)
    Tuple(Vec<Pattern>),
    /// Qualified enum pattern: Option.Some(x), Result.Err(e), Color.Red
    Enum {
        enum_name: String,
        variant: String,
        inner: Option<Box<Pattern>>,
    },
    /// Struct pattern: Point { x: a, y: _, .. }
    Struct {
        name: String,
        type_args: Vec<TypeExpr>,
        fields: Vec<(String, Pattern)>,
        has_rest: bool,
    },
    Literal(LiteralPattern),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralPattern {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Char(char),
}

/// Expressions. Every expression carries a parser-assigned NodeId used by
/// the analyzer's type side table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    pub span: ByteSpan,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    CharLiteral(char),
    BoolLiteral(bool),
    /// Unit literal: ()
    Unit,
    /// Tuple literal: (a, b, c) — always arity >= 2
    Tuple(Vec<Expr>),
    /// Array literal: [1, 2, 3] or []
    Array(Vec<Expr>),

    Ident(String),

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    /// Field access: obj.field — tuple element access uses a numeric field
    /// name ("0", "1", …)
    FieldAccess {
        object: Box<Expr>,
        field: String,
    },

    /// Index access: a[i]
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },

    /// Slice expression: a[lo:hi] with optional bounds
    Slice {
        object: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },

    /// Call: f(args) or obj.method(args) (callee is then a FieldAccess)
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    /// Associated function call: Type::function(args)
    AssociatedCall {
        type_name: String,
        function: String,
        args: Vec<Expr>,
    },

    /// Enum variant constructor: Option.Some(x), Result.Ok(v), Color.Red
    EnumConstructor {
        enum_name: String,
        variant: String,
        payload: Option<Box<Expr>>,
    },

    /// Struct literal: Point { x: 1, y: 2 } or Vec<i32> { items: [] }
    StructLiteral {
        name: String,
        type_args: Vec<TypeExpr>,
        fields: Vec<(String, Expr)>,
    },

    /// sizeof(T)
    SizeOf(TypeExpr),

    /// await handle
    Await(Box<Expr>),

    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
    },
}

impl Expr {
    /// Can this expression appear on the left of `=`?
    pub fn is_lvalue(&self) -> bool {
        match &self.kind {
            ExprKind::Ident(_) | ExprKind::FieldAccess { .. } | ExprKind::Index { .. } => true,
            ExprKind::Unary { op, .. } => *op == UnaryOp::Deref,
            _ => false,
        }
    }
}

/// Binary operators
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
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd, // &
    BitOr,  // |
    BitXor, // ^
    Shl,    // <<
    Shr,    // >>
}

/// Unary prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,    // -
    Not,    // !
    BitNot, // ~
    AddrOf, // &
    Deref,  // *
}

/// AST-level (pre-resolution) type expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeExpr {
    pub span: ByteSpan,
    pub kind: TypeExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExprKind {
    /// Builtin primitive type. `int`/`float` are spelled aliases and are
    /// recorded as i32/f32 directly.
    Primitive(PrimitiveType),

    /// User-declared type with optional type arguments: Foo, Vec<T>.
    /// Whether it names a struct or an enum is resolved by the analyzer —
    /// the parser never guesses.
    Named {
        name: String,
        type_args: Vec<TypeExpr>,
    },

    /// Raw pointer: *mut T or *const T
    Pointer {
        is_mutable: bool,
        pointee: Box<TypeExpr>,
    },

    /// Slice: []T
    Slice(Box<TypeExpr>),

    /// Fixed array: [N]T with a const-expr length
    Array {
        element: Box<TypeExpr>,
        size: Box<Expr>,
    },

    /// Tuple: (T, U, …) — arity >= 2; (T) is just T
    Tuple(Vec<TypeExpr>),

    Option(Box<TypeExpr>),

    Result {
        ok: Box<TypeExpr>,
        err: Box<TypeExpr>,
    },

    TaskHandle(Box<TypeExpr>),

    /// `Self` inside impl blocks
    SelfType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    Isize,
    F32,
    F64,
    Char,
    String,
    Void,
    Never,
}

impl PrimitiveType {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::I8 => "i8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::I128 => "i128",
            PrimitiveType::U8 => "u8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::U128 => "u128",
            PrimitiveType::Usize => "usize",
            PrimitiveType::Isize => "isize",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::Char => "char",
            PrimitiveType::String => "string",
            PrimitiveType::Void => "void",
            PrimitiveType::Never => "Never",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            PrimitiveType::I8
                | PrimitiveType::I16
                | PrimitiveType::I32
                | PrimitiveType::I64
                | PrimitiveType::I128
                | PrimitiveType::U8
                | PrimitiveType::U16
                | PrimitiveType::U32
                | PrimitiveType::U64
                | PrimitiveType::U128
                | PrimitiveType::Usize
                | PrimitiveType::Isize
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, PrimitiveType::F32 | PrimitiveType::F64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(kind: ExprKind) -> Expr {
        Expr {
            id: NodeId(0),
            span: 0..0,
            kind,
        }
    }

    #[test]
    fn test_lvalues() {
        assert!(expr(ExprKind::Ident("x".to_string())).is_lvalue());
        assert!(expr(ExprKind::FieldAccess {
            object: Box::new(expr(ExprKind::Ident("p".to_string()))),
            field: "0".to_string(),
        })
        .is_lvalue());
        assert!(!expr(ExprKind::IntLiteral(3)).is_lvalue());
        assert!(expr(ExprKind::Unary {
            op: UnaryOp::Deref,
            operand: Box::new(expr(ExprKind::Ident("p".to_string()))),
        })
        .is_lvalue());
        assert!(!expr(ExprKind::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(expr(ExprKind::Ident("p".to_string()))),
        })
        .is_lvalue());
    }

    #[test]
    fn test_serialization_round_trip() {
        let program = Program {
            package: Some("main".to_string()),
            imports: vec![Import {
                path: "stdlib/io".to_string(),
                alias: Some("io".to_string()),
                span: 0..20,
            }],
            decls: vec![],
        };

        let json = serde_json::to_string(&program).unwrap();
        let deserialized: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(program, deserialized);
    }

    #[test]
    fn test_self_receiver() {
        let method = Function {
            visibility: Visibility::Public,
            annotations: vec![],
            name: "len".to_string(),
            params: vec![Param {
                name: "self".to_string(),
                ty: TypeExpr {
                    span: 0..0,
                    kind: TypeExprKind::SelfType,
                },
                ownership: vec![],
                span: 0..4,
            }],
            return_type: TypeExpr {
                span: 0..0,
                kind: TypeExprKind::Primitive(PrimitiveType::U64),
            },
            body: Block {
                statements: vec![],
                span: 0..0,
            },
            span: 0..0,
        };

        assert!(method.has_self_receiver());
    }
}
