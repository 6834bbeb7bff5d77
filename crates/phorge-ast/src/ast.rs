use std::fmt;

use serde::Serialize;

use crate::{Modifiers, Span, Visibility};

/// Root of a parsed file.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

// =============================================================================
// Names
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Name {
    pub parts: Vec<String>,
    pub kind: NameKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NameKind {
    Unqualified,
    Qualified,
    FullyQualified,
    /// `namespace\Foo`
    Relative,
}

impl Name {
    pub fn simple(text: impl Into<String>, span: Span) -> Self {
        Self {
            parts: vec![text.into()],
            kind: NameKind::Unqualified,
            span,
        }
    }

    /// Last segment, e.g. `Baz` for `Foo\Bar\Baz`.
    pub fn last(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NameKind::FullyQualified => f.write_str("\\")?,
            NameKind::Relative => f.write_str("namespace\\")?,
            NameKind::Unqualified | NameKind::Qualified => {}
        }
        f.write_str(&self.parts.join("\\"))
    }
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Type {
    pub kind: TypeKind,
    pub span: Span,
}

/// Type expression tree.
///
/// Union and intersection members are kept flat: `A|B|C` is one union of
/// three members. A `Nullable` never wraps another `Nullable`, and when
/// present it wraps the whole composite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeKind {
    /// Class-like reference, including `self` and `parent`.
    Named(Name),
    Array,
    Callable,
    Static,
    Scalar(ScalarType),
    Nullable(Box<Type>),
    Union(Vec<Type>),
    Intersection(Vec<Type>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScalarType {
    Int,
    Float,
    String,
    Bool,
    True,
    False,
    Null,
    Void,
    Never,
    Mixed,
    Object,
    Iterable,
}

impl ScalarType {
    /// Resolves a builtin type name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let scalar = match name.to_ascii_lowercase().as_str() {
            "int" => ScalarType::Int,
            "float" => ScalarType::Float,
            "string" => ScalarType::String,
            "bool" => ScalarType::Bool,
            "true" => ScalarType::True,
            "false" => ScalarType::False,
            "null" => ScalarType::Null,
            "void" => ScalarType::Void,
            "never" => ScalarType::Never,
            "mixed" => ScalarType::Mixed,
            "object" => ScalarType::Object,
            "iterable" => ScalarType::Iterable,
            _ => return None,
        };
        Some(scalar)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::String => "string",
            ScalarType::Bool => "bool",
            ScalarType::True => "true",
            ScalarType::False => "false",
            ScalarType::Null => "null",
            ScalarType::Void => "void",
            ScalarType::Never => "never",
            ScalarType::Mixed => "mixed",
            ScalarType::Object => "object",
            ScalarType::Iterable => "iterable",
        }
    }
}

impl Type {
    pub fn is_nullable(&self) -> bool {
        matches!(self.kind, TypeKind::Nullable(_))
    }

    /// Members of a union or intersection; a single-element slice otherwise.
    pub fn members(&self) -> &[Type] {
        match &self.kind {
            TypeKind::Union(types) | TypeKind::Intersection(types) => types,
            _ => std::slice::from_ref(self),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::Named(name) => write!(f, "{name}"),
            TypeKind::Array => f.write_str("array"),
            TypeKind::Callable => f.write_str("callable"),
            TypeKind::Static => f.write_str("static"),
            TypeKind::Scalar(scalar) => f.write_str(scalar.as_str()),
            TypeKind::Nullable(inner) => match inner.kind {
                TypeKind::Union(_) | TypeKind::Intersection(_) => write!(f, "?({inner})"),
                _ => write!(f, "?{inner}"),
            },
            TypeKind::Union(types) => {
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    if matches!(ty.kind, TypeKind::Intersection(_)) {
                        write!(f, "({ty})")?;
                    } else {
                        write!(f, "{ty}")?;
                    }
                }
                Ok(())
            }
            TypeKind::Intersection(types) => {
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str("&")?;
                    }
                    write!(f, "{ty}")?;
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// One attribute inside `#[...]`, e.g. `Route('/x', methods: ['GET'])`.
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub name: Name,
    pub args: Vec<Expr>,
    pub span: Span,
}

// =============================================================================
// Statements
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[allow(clippy::large_enum_variant)]
pub enum StmtKind {
    /// `foo();`, also `throw $e;`
    Expression(Expr),

    /// `echo a, b;` and the `<?=` short tag
    Echo(Vec<Expr>),

    Return(Option<Expr>),

    /// `{ ... }`
    Block(Vec<Stmt>),

    If(IfStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
    For(ForStmt),
    Foreach(ForeachStmt),
    Switch(SwitchStmt),

    Break(Option<Expr>),
    Continue(Option<Expr>),

    Declare(DeclareStmt),
    TryCatch(TryCatchStmt),

    Goto(String),
    Label(String),

    /// `unset($a, $b);`
    Unset(Vec<Expr>),

    /// `global $a, $b;`
    Global(Vec<Expr>),

    /// `static $x = 1, $y;`
    StaticVar(Vec<StaticVar>),

    Function(FunctionDecl),
    Class(ClassDecl),
    Interface(InterfaceDecl),
    Trait(TraitDecl),
    Enum(EnumDecl),
    Namespace(NamespaceDecl),
    Use(UseDecl),

    /// `const A = 1, B = 2;`
    Const(ConstDecl),

    InlineHtml(String),

    /// `;`
    Nop,

    /// Region skipped during recovery.
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub elseif_branches: Vec<ElseIfBranch>,
    pub else_branch: Option<Box<Stmt>>,
    /// Written as `if (...): ... endif;`
    pub alternative: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElseIfBranch {
    pub condition: Expr,
    pub body: Stmt,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub alternative: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoWhileStmt {
    pub body: Box<Stmt>,
    pub condition: Expr,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForStmt {
    pub init: Vec<Expr>,
    pub condition: Vec<Expr>,
    pub update: Vec<Expr>,
    pub body: Box<Stmt>,
    pub alternative: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForeachStmt {
    pub subject: Expr,
    pub key: Option<Expr>,
    /// By-reference iteration shows up as a `Reference` unary here.
    pub value: Expr,
    pub body: Box<Stmt>,
    pub alternative: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchStmt {
    pub subject: Expr,
    pub cases: Vec<SwitchCase>,
    pub alternative: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchCase {
    /// `None` for `default:`
    pub value: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeclareStmt {
    pub directives: Vec<DeclareDirective>,
    /// `None` for the statement form `declare(strict_types=1);`
    pub body: Option<Box<Stmt>>,
    pub alternative: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeclareDirective {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct TryCatchStmt {
    pub body: Vec<Stmt>,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatchClause {
    pub types: Vec<Name>,
    pub var: Option<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaticVar {
    pub name: String,
    pub default: Option<Expr>,
    pub span: Span,
}

// =============================================================================
// Declarations
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    pub body: Vec<Stmt>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub name: String,
    pub type_hint: Option<Type>,
    pub default: Option<Expr>,
    pub by_ref: bool,
    pub variadic: bool,
    /// Non-empty for promoted constructor parameters.
    pub modifiers: Modifiers,
    pub attributes: Vec<Attribute>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<PropertyHook>,
    pub span: Span,
}

impl Param {
    pub fn is_promoted(&self) -> bool {
        !self.modifiers.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassDecl {
    /// `None` for anonymous classes.
    pub name: Option<String>,
    pub modifiers: Modifiers,
    pub extends: Option<Name>,
    pub implements: Vec<Name>,
    pub members: Vec<ClassMember>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceDecl {
    pub name: String,
    pub extends: Vec<Name>,
    pub members: Vec<ClassMember>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraitDecl {
    pub name: String,
    pub members: Vec<ClassMember>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumDecl {
    pub name: String,
    pub backing_type: Option<Type>,
    pub implements: Vec<Name>,
    pub members: Vec<ClassMember>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassMember {
    pub kind: ClassMemberKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum ClassMemberKind {
    Property(PropertyDecl),
    Method(MethodDecl),
    Constant(ConstDecl),
    TraitUse(TraitUseDecl),
    Case(EnumCase),
}

impl ClassMember {
    /// Attribute list of the member, for attaching a leading `#[...]` group
    /// after the member has been built. Trait uses carry none.
    pub fn attributes_mut(&mut self) -> Option<&mut Vec<Attribute>> {
        match &mut self.kind {
            ClassMemberKind::Property(p) => Some(&mut p.attributes),
            ClassMemberKind::Method(m) => Some(&mut m.attributes),
            ClassMemberKind::Constant(c) => Some(&mut c.attributes),
            ClassMemberKind::Case(c) => Some(&mut c.attributes),
            ClassMemberKind::TraitUse(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyDecl {
    pub name: String,
    pub modifiers: Modifiers,
    pub type_hint: Option<Type>,
    pub default: Option<Expr>,
    pub attributes: Vec<Attribute>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<PropertyHook>,
}

impl PropertyDecl {
    pub fn visibility(&self) -> Visibility {
        self.modifiers.visibility()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropertyHookKind {
    Get,
    Set,
}

#[derive(Debug, Clone, Serialize)]
pub enum PropertyHookBody {
    Block(Vec<Stmt>),
    /// `get => expr;`
    Expression(Expr),
    /// `get;`
    Abstract,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyHook {
    pub kind: PropertyHookKind,
    pub body: PropertyHookBody,
    pub is_final: bool,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: Modifiers,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    /// `None` for abstract and interface methods.
    pub body: Option<Vec<Stmt>>,
    pub attributes: Vec<Attribute>,
}

impl MethodDecl {
    pub fn visibility(&self) -> Visibility {
        self.modifiers.visibility()
    }
}

/// `const` declaration, at top level or inside a class-like body.
/// One declaration holds every comma-separated clause.
#[derive(Debug, Clone, Serialize)]
pub struct ConstDecl {
    pub modifiers: Modifiers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<Type>,
    pub clauses: Vec<ConstantClause>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConstantClause {
    pub name: String,
    pub value: Expr,
    pub visibility: Visibility,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumCase {
    pub name: String,
    pub value: Option<Expr>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraitUseDecl {
    pub traits: Vec<Name>,
    pub adaptations: Vec<TraitAdaptation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraitAdaptation {
    pub kind: TraitAdaptationKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum TraitAdaptationKind {
    /// `A::foo insteadof B, C;`
    Precedence {
        trait_name: Name,
        method: String,
        insteadof: Vec<Name>,
    },
    /// `foo as bar;`, `A::foo as protected bar;`, `foo as protected;`
    Alias {
        trait_name: Option<Name>,
        method: String,
        visibility: Option<Visibility>,
        alias: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct NamespaceDecl {
    pub name: Option<Name>,
    pub body: NamespaceBody,
}

#[derive(Debug, Clone, Serialize)]
pub enum NamespaceBody {
    Braced(Vec<Stmt>),
    /// `namespace Foo;` applies to the statements that follow.
    Unbraced,
}

#[derive(Debug, Clone, Serialize)]
pub struct UseDecl {
    pub kind: UseKind,
    pub items: Vec<UseItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UseKind {
    Normal,
    Function,
    Const,
}

#[derive(Debug, Clone, Serialize)]
pub struct UseItem {
    pub name: Name,
    pub alias: Option<String>,
    /// Per-item kind inside a mixed group use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<UseKind>,
    pub span: Span,
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    /// String without interpolation, escapes already processed.
    String(String),
    /// `"Hello $name, {$user->age}"`
    InterpolatedString(Vec<StringPart>),
    Heredoc {
        label: String,
        parts: Vec<StringPart>,
    },
    Nowdoc {
        label: String,
        value: String,
    },
    /// `` `ls $dir` ``
    ShellExec(Vec<StringPart>),
    Bool(bool),
    Null,

    /// `$name`
    Variable(String),
    /// `$$name`, `${expr}`
    VariableVariable(Box<Expr>),
    /// Bare name: constant, function name, class reference, member selector.
    Name(Name),

    Assign(AssignExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Postfix(PostfixExpr),
    /// `a ? b : c` and `a ?: c`
    Ternary(TernaryExpr),
    /// `a ?? b`
    Coalesce(CoalesceExpr),
    /// `$x |> f(...)`
    Pipe(PipeExpr),

    Call(CallExpr),
    /// First-class callable `strlen(...)`, `$obj->m(...)`
    CallableCreate(Box<Expr>),
    /// `->`, `?->`, `::`
    MemberAccess(MemberAccessExpr),
    /// `$a[i]`, `$a[]`
    ArrayAccess(ArrayAccessExpr),

    /// `[1, 'k' => 2]`, `array(...)`
    Array(Vec<ArrayElement>),
    /// `list($a, $b)`
    List(Vec<ArrayElement>),

    New(NewExpr),
    AnonymousClass(Box<ClassDecl>),
    Clone(Box<Expr>),
    Match(MatchExpr),
    Closure(ClosureExpr),
    ArrowFunction(ArrowFunctionExpr),

    /// `name: value` inside an argument list
    NamedArgument(NamedArgument),
    /// `...$args`
    Spread(Box<Expr>),

    MagicConst(MagicConstKind),
    Cast(CastKind, Box<Expr>),

    Isset(Vec<Expr>),
    Empty(Box<Expr>),
    Exit(Option<Box<Expr>>),
    Eval(Box<Expr>),
    Print(Box<Expr>),
    Include(IncludeKind, Box<Expr>),
    Yield(YieldExpr),
    Throw(Box<Expr>),

    Parenthesized(Box<Expr>),
}

#[derive(Debug, Clone, Serialize)]
pub enum StringPart {
    Literal(String),
    Expr(Expr),
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignExpr {
    pub target: Box<Expr>,
    pub op: AssignOp,
    /// `$a = &$b`
    pub by_ref: bool,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Assign,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    Coalesce,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Plus => "+=",
            AssignOp::Minus => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
            AssignOp::Pow => "**=",
            AssignOp::Concat => ".=",
            AssignOp::BitwiseAnd => "&=",
            AssignOp::BitwiseOr => "|=",
            AssignOp::BitwiseXor => "^=",
            AssignOp::ShiftLeft => "<<=",
            AssignOp::ShiftRight => ">>=",
            AssignOp::Coalesce => "??=",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub op: BinaryOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    Spaceship,
    BooleanAnd,
    BooleanOr,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Instanceof,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Concat => ".",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Identical => "===",
            BinaryOp::NotIdentical => "!==",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::Spaceship => "<=>",
            BinaryOp::BooleanAnd => "&&",
            BinaryOp::BooleanOr => "||",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::LogicalAnd => "and",
            BinaryOp::LogicalOr => "or",
            BinaryOp::LogicalXor => "xor",
            BinaryOp::Instanceof => "instanceof",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Negate,
    Plus,
    Not,
    BitwiseNot,
    PreIncrement,
    PreDecrement,
    /// `@expr`
    Silence,
    /// `&expr` in array elements, arguments and `foreach` targets
    Reference,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitwiseNot => "~",
            UnaryOp::PreIncrement => "++",
            UnaryOp::PreDecrement => "--",
            UnaryOp::Silence => "@",
            UnaryOp::Reference => "&",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostfixExpr {
    pub operand: Box<Expr>,
    pub op: PostfixOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PostfixOp {
    Increment,
    Decrement,
}

impl PostfixOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PostfixOp::Increment => "++",
            PostfixOp::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TernaryExpr {
    pub condition: Box<Expr>,
    /// `None` for the short form `a ?: b`
    pub then_expr: Option<Box<Expr>>,
    pub else_expr: Box<Expr>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoalesceExpr {
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipeExpr {
    pub input: Box<Expr>,
    pub callable: Box<Expr>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    /// Positional, named (`NamedArgument`) and unpacked (`Spread`) arguments.
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessKind {
    /// `->`
    Plain,
    /// `?->`
    Nullsafe,
    /// `::`
    Static,
}

impl AccessKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessKind::Plain => "->",
            AccessKind::Nullsafe => "?->",
            AccessKind::Static => "::",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberAccessExpr {
    pub object: Box<Expr>,
    /// `Name` for `->prop`/`::CONST`, `Variable` for `->$p`/`::$p`,
    /// any expression for `->{expr}`.
    pub member: Box<Expr>,
    pub kind: AccessKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArrayAccessExpr {
    pub array: Box<Expr>,
    /// `None` for the append form `$a[]`
    pub index: Option<Box<Expr>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArrayElement {
    pub key: Option<Expr>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewExpr {
    /// Class reference, or `AnonymousClass`.
    pub class: Box<Expr>,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedArgument {
    pub name: String,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchExpr {
    pub subject: Box<Expr>,
    pub arms: Vec<MatchArm>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchArm {
    /// `None` for the `default` arm.
    pub conditions: Option<Vec<Expr>>,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosureExpr {
    pub is_static: bool,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub uses: Vec<ClosureUse>,
    pub return_type: Option<Type>,
    pub body: Vec<Stmt>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosureUse {
    pub name: String,
    pub by_ref: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArrowFunctionExpr {
    pub is_static: bool,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    pub body: Box<Expr>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct YieldExpr {
    pub key: Option<Box<Expr>>,
    pub value: Option<Box<Expr>>,
    /// `yield from expr`
    pub from: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CastKind {
    Int,
    Float,
    String,
    Bool,
    Array,
    Object,
    Unset,
}

impl CastKind {
    /// Resolves the word inside `( ... )`, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "int" | "integer" => CastKind::Int,
            "float" | "double" | "real" => CastKind::Float,
            "string" | "binary" => CastKind::String,
            "bool" | "boolean" => CastKind::Bool,
            "array" => CastKind::Array,
            "object" => CastKind::Object,
            "unset" => CastKind::Unset,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CastKind::Int => "int",
            CastKind::Float => "float",
            CastKind::String => "string",
            CastKind::Bool => "bool",
            CastKind::Array => "array",
            CastKind::Object => "object",
            CastKind::Unset => "unset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncludeKind {
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MagicConstKind {
    Class,
    Dir,
    File,
    Function,
    Line,
    Method,
    Namespace,
    Trait,
    Property,
}

impl MagicConstKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MagicConstKind::Class => "__CLASS__",
            MagicConstKind::Dir => "__DIR__",
            MagicConstKind::File => "__FILE__",
            MagicConstKind::Function => "__FUNCTION__",
            MagicConstKind::Line => "__LINE__",
            MagicConstKind::Method => "__METHOD__",
            MagicConstKind::Namespace => "__NAMESPACE__",
            MagicConstKind::Trait => "__TRAIT__",
            MagicConstKind::Property => "__PROPERTY__",
        }
    }
}
