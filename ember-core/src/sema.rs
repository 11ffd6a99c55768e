#![forbid(unsafe_code)]

use ember_ast::{Block, Decl, Expr, ExprKind, FuncDecl, Module, Stmt, TypeExpr};

use crate::env::TypeEnv;
use crate::types::Type;

/// Best-effort type inference pass.
///
/// Assigns a type term to every expression and populates `TypeEnv` bindings
/// for `let`-introduced names. This pass never rejects a program: unknown
/// names and untypeable expressions degrade to the default numeric type. It
/// exists to populate declared types for later tooling, not to gatekeep.
pub struct Checker {
    env: TypeEnv,
    /// Generic parameter names of the function currently being checked.
    generics: Vec<String>,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker {
    pub fn new() -> Self {
        Checker {
            env: TypeEnv::new(),
            generics: Vec::new(),
        }
    }

    /// Checker over an already-populated environment, e.g. the top-level env
    /// returned by `check_module`, for typing expressions after the fact.
    pub fn with_env(env: TypeEnv) -> Self {
        Checker {
            env,
            generics: Vec::new(),
        }
    }

    /// Two-pass module check. Pass 1 registers every top-level function under
    /// a `Func` type so forward references and mutual recursion resolve; the
    /// registered return type is defaulted to `Int`, not the declared one.
    /// Pass 2 checks each body against the fully populated top level.
    ///
    /// Returns the populated top-level environment.
    pub fn check_module(mut self, module: &Module) -> TypeEnv {
        for decl in &module.decls {
            if let Decl::Func(func) = decl {
                self.env.define(&func.name.node, Type::func(Type::Int));
            }
        }
        for decl in &module.decls {
            if let Decl::Func(func) = decl {
                self.check_func(func);
            }
        }
        self.env
    }

    fn check_func(&mut self, func: &FuncDecl) {
        self.generics = func.generics.iter().map(|g| g.node.clone()).collect();
        self.env.push_scope();
        for param in &func.params {
            let ty = param
                .ty
                .as_ref()
                .map(|te| self.resolve_type_expr(te))
                .unwrap_or(Type::Int);
            self.env.define(&param.name.node, ty);
        }
        self.check_block(&func.body);
        self.env.pop_scope();
        self.generics.clear();
    }

    fn check_block(&mut self, block: &Block) {
        self.env.push_scope();
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        self.env.pop_scope();
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(l) => {
                let inferred = self.infer_expr(&l.init);
                self.env.define(&l.name.node, inferred);
            }
            Stmt::If(i) => {
                let _cond = self.infer_expr(&i.cond);
                self.check_block(&i.then_block);
                if let Some(else_block) = &i.else_block {
                    self.check_block(else_block);
                }
            }
            Stmt::While(w) => {
                self.check_block(&w.body);
            }
            Stmt::For(f) => {
                self.env.push_scope();
                self.env.define(&f.binder.node, Type::Int);
                self.check_block(&f.body);
                self.env.pop_scope();
            }
            Stmt::Block(b) => self.check_block(b),
            _ => {}
        }
    }

    /// Bottom-up expression typing. No numeric promotion: operand types are
    /// assumed compatible by construction.
    pub fn infer_expr(&self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::IntLit(_) => Type::Int,
            ExprKind::FloatLit(_) => Type::Float,
            ExprKind::StrLit(_) => Type::String,
            ExprKind::Ident(name) => self.env.lookup(name).cloned().unwrap_or(Type::Int),
            ExprKind::Binary { left, op, .. } => {
                if op.yields_bool() {
                    Type::Bool
                } else {
                    self.infer_expr(left)
                }
            }
            ExprKind::Call { callee, .. } => match self.infer_expr(callee) {
                Type::Func(ret) => *ret,
                _ => Type::Int,
            },
            ExprKind::ArrayLit(elems) => match elems.first() {
                Some(first) => Type::array(self.infer_expr(first)),
                None => Type::array(Type::Int),
            },
            ExprKind::StructLit { name, .. } => Type::Struct(name.node.clone()),
            _ => Type::Int,
        }
    }

    fn resolve_type_expr(&self, te: &TypeExpr) -> Type {
        match te {
            TypeExpr::Name { name, .. } => {
                if self.generics.iter().any(|g| g == &name.node) {
                    return Type::Generic(name.node.clone());
                }
                match name.node.as_str() {
                    "Int" => Type::Int,
                    "Float" => Type::Float,
                    "Bool" => Type::Bool,
                    "String" => Type::String,
                    "Void" => Type::Void,
                    other => Type::Struct(other.to_string()),
                }
            }
            // Generic applications resolve to their base nominal type; the
            // arguments are not tracked by this pass.
            TypeExpr::Generic { name, .. } => Type::Struct(name.node.clone()),
            TypeExpr::Func { ret, .. } => Type::func(self.resolve_type_expr(ret)),
            TypeExpr::Array { elem, .. } => Type::array(self.resolve_type_expr(elem)),
        }
    }
}
