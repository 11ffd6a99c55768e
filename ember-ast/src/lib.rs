#![forbid(unsafe_code)]

use miette::SourceSpan;

pub type Span = SourceSpan;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub node: T,
}

impl<T> Spanned<T> {
    pub fn new(span: Span, node: T) -> Self {
        Self { span, node }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            span: self.span,
            node: f(self.node),
        }
    }
}

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}

pub fn span_between(start: usize, end: usize) -> Span {
    debug_assert!(end >= start);
    span(start, end - start)
}

pub type Ident = Spanned<String>;

/// Root of a parsed compilation unit; children are top-level declarations.
#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    pub span: Span,
    pub decls: Vec<Decl>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    Func(FuncDecl),
    Struct(StructDecl),
    Trait(TraitDecl),
    Impl(ImplDecl),
    Const(ConstDecl),
    Import(ImportDecl),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FuncDecl {
    pub span: Span,
    pub name: Ident,
    pub generics: Vec<Ident>,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub span: Span,
    pub name: Ident,
    pub ty: Option<TypeExpr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructDecl {
    pub span: Span,
    pub name: Ident,
    pub generics: Vec<Ident>,
    pub fields: Vec<FieldDef>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub span: Span,
    pub name: Ident,
    pub ty: TypeExpr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TraitDecl {
    pub span: Span,
    pub name: Ident,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImplDecl {
    pub span: Span,
    pub trait_name: Option<Ident>,
    pub target: Ident,
    pub funcs: Vec<FuncDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConstDecl {
    pub span: Span,
    pub name: Ident,
    pub ty: Option<TypeExpr>,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportDecl {
    pub span: Span,
    pub path: Vec<Ident>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub span: Span,
    pub stmts: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Let(LetStmt),
    Assign(AssignStmt),
    Return(ReturnStmt),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Match(MatchStmt),
    Block(Block),
    Expr(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LetStmt {
    pub span: Span,
    pub name: Ident,
    pub ty: Option<TypeExpr>,
    pub init: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssignStmt {
    pub span: Span,
    pub target: Expr,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReturnStmt {
    pub span: Span,
    pub value: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfStmt {
    pub span: Span,
    pub cond: Expr,
    pub then_block: Block,
    pub else_block: Option<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WhileStmt {
    pub span: Span,
    pub cond: Expr,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ForStmt {
    pub span: Span,
    pub binder: Ident,
    pub iter: Expr,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchStmt {
    pub span: Span,
    pub scrutinee: Expr,
    pub arms: Vec<MatchArm>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchArm {
    pub span: Span,
    pub pat: Pattern,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    Wildcard { span: Span },
    IntLit { span: Span, value: i64 },
    StringLit { span: Span, value: String },
    Binder { span: Span, name: Ident },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    IntLit(i64),
    FloatLit(f64),
    StrLit(String),
    Ident(String),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Field {
        base: Box<Expr>,
        field: Ident,
    },
    /// `TypeName { field: value, ... }`
    StructLit {
        name: Ident,
        fields: Vec<(Ident, Expr)>,
    },
    ArrayLit(Vec<Expr>),
    Lambda {
        params: Vec<Param>,
        body: Box<Block>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    /// `&expr` — borrow
    Ref,
    /// `*expr` — dereference
    Deref,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,

    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    And,
    Or,
}

impl BinOp {
    /// Comparison and logical operators produce `bool` regardless of operands.
    pub fn yields_bool(&self) -> bool {
        matches!(
            self,
            BinOp::Eq
                | BinOp::Ne
                | BinOp::Lt
                | BinOp::Gt
                | BinOp::Le
                | BinOp::Ge
                | BinOp::And
                | BinOp::Or
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeExpr {
    Name {
        span: Span,
        name: Ident,
    },
    Generic {
        span: Span,
        name: Ident,
        args: Vec<TypeExpr>,
    },
    Func {
        span: Span,
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
    },
    Array {
        span: Span,
        elem: Box<TypeExpr>,
    },
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Name { span, .. }
            | TypeExpr::Generic { span, .. }
            | TypeExpr::Func { span, .. }
            | TypeExpr::Array { span, .. } => *span,
        }
    }
}

// Constructor helpers for tree producers (parsers, tests). The analysis
// passes never build nodes; they only read them.

pub fn ident(name: &str) -> Ident {
    Spanned::new(span(0, 0), name.to_string())
}

impl Expr {
    pub fn new(span: Span, kind: ExprKind) -> Self {
        Self { span, kind }
    }

    pub fn int(value: i64) -> Self {
        Expr::new(span(0, 0), ExprKind::IntLit(value))
    }

    pub fn float(value: f64) -> Self {
        Expr::new(span(0, 0), ExprKind::FloatLit(value))
    }

    pub fn str_lit(value: &str) -> Self {
        Expr::new(span(0, 0), ExprKind::StrLit(value.to_string()))
    }

    pub fn var(name: &str) -> Self {
        Expr::new(span(0, 0), ExprKind::Ident(name.to_string()))
    }

    pub fn unary(op: UnaryOp, expr: Expr) -> Self {
        Expr::new(
            span(0, 0),
            ExprKind::Unary {
                op,
                expr: Box::new(expr),
            },
        )
    }

    pub fn borrow_of(name: &str) -> Self {
        Expr::unary(UnaryOp::Ref, Expr::var(name))
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::new(
            span(0, 0),
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
        )
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::new(
            span(0, 0),
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
        )
    }

    pub fn call_named(name: &str, args: Vec<Expr>) -> Self {
        Expr::call(Expr::var(name), args)
    }
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Block {
            span: span(0, 0),
            stmts,
        }
    }
}

impl Stmt {
    pub fn let_binding(name: &str, init: Expr) -> Self {
        Stmt::Let(LetStmt {
            span: span(0, 0),
            name: ident(name),
            ty: None,
            init,
        })
    }

    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }
}

impl FuncDecl {
    pub fn new(name: &str, params: Vec<&str>, body: Block) -> Self {
        FuncDecl {
            span: span(0, 0),
            name: ident(name),
            generics: Vec::new(),
            params: params
                .into_iter()
                .map(|p| Param {
                    span: span(0, 0),
                    name: ident(p),
                    ty: None,
                })
                .collect(),
            ret: None,
            body,
        }
    }
}

impl Module {
    pub fn new(decls: Vec<Decl>) -> Self {
        Module {
            span: span(0, 0),
            decls,
        }
    }

    pub fn of_funcs(funcs: Vec<FuncDecl>) -> Self {
        Module::new(funcs.into_iter().map(Decl::Func).collect())
    }
}
