#![forbid(unsafe_code)]

use std::collections::{BTreeMap, HashMap};

use ember_ast::{Block, Decl, Expr, ExprKind, FuncDecl, Module, Stmt, UnaryOp};

use crate::error::OwnershipViolation;
use crate::ownership::{BorrowKind, OwnershipContext, OwnershipState, ScopeId};

/// Scope-exit destructor contract handed to code generation: for every name
/// listed under a scope id, the generator must emit exactly one destructor
/// call, in list order, before control leaves that scope.
#[derive(Clone, Debug, Default)]
pub struct OwnershipReport {
    pub drops: BTreeMap<ScopeId, Vec<String>>,
}

impl OwnershipReport {
    pub fn drops_for(&self, scope: ScopeId) -> &[String] {
        self.drops.get(&scope).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Walks one function body enforcing move/borrow rules and collecting the
/// per-scope drop lists.
///
/// Only `let`, assignment, `return`, `if`, `while`, `match`, nested blocks,
/// and expression statements are interpreted; every other statement kind
/// passes through. Early `return` does not unwind enclosing scopes' drops.
pub struct BorrowChecker {
    ctx: OwnershipContext,
    report: OwnershipReport,
}

impl Default for BorrowChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl BorrowChecker {
    pub fn new() -> Self {
        BorrowChecker {
            ctx: OwnershipContext::new(),
            report: OwnershipReport::default(),
        }
    }

    /// Check a whole function: parameters are pre-registered as Owned in the
    /// root scope, then the body is walked.
    pub fn check_func(mut self, func: &FuncDecl) -> Result<OwnershipReport, OwnershipViolation> {
        for param in &func.params {
            self.ctx.declare(&param.name.node);
        }
        self.check_block(&func.body)?;
        Ok(self.report)
    }

    fn check_block(&mut self, block: &Block) -> Result<(), OwnershipViolation> {
        self.ctx.enter_scope();
        for stmt in &block.stmts {
            self.check_stmt(stmt)?;
        }
        let (id, drops) = self.ctx.exit_scope();
        self.report.drops.insert(id, drops);
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Result<(), OwnershipViolation> {
        match stmt {
            Stmt::Let(l) => {
                self.check_expr(&l.init)?;
                self.ctx.declare(&l.name.node);
                Ok(())
            }
            // The assignment target itself is not move/borrow-checked;
            // only the value expression is verified.
            Stmt::Assign(a) => self.check_expr(&a.value),
            Stmt::Return(r) => match &r.value {
                Some(expr) => self.check_expr(expr),
                None => Ok(()),
            },
            Stmt::If(i) => {
                self.check_expr(&i.cond)?;
                self.check_block(&i.then_block)?;
                if let Some(else_block) = &i.else_block {
                    self.check_block(else_block)?;
                }
                Ok(())
            }
            Stmt::While(w) => {
                self.check_expr(&w.cond)?;
                self.check_block(&w.body)
            }
            Stmt::Match(m) => {
                self.check_expr(&m.scrutinee)?;
                for arm in &m.arms {
                    self.check_block(&arm.body)?;
                }
                Ok(())
            }
            Stmt::Block(b) => self.check_block(b),
            Stmt::Expr(e) => self.check_expr(e),
            Stmt::For(_) => Ok(()),
        }
    }

    fn check_expr(&mut self, expr: &Expr) -> Result<(), OwnershipViolation> {
        match &expr.kind {
            ExprKind::Ident(name) => {
                if self.ctx.state_of(name) == Some(OwnershipState::Moved) {
                    return Err(OwnershipViolation::use_after_move(name, expr.span));
                }
                Ok(())
            }
            ExprKind::Unary {
                op: UnaryOp::Ref,
                expr: operand,
            } => {
                if let ExprKind::Ident(name) = &operand.kind {
                    // The walker issues immutable borrows only; the mutable
                    // path in the engine has no reachable syntax yet.
                    self.ctx.borrow_var(name, BorrowKind::Immutable, expr.span)
                } else {
                    self.check_expr(operand)
                }
            }
            ExprKind::Unary { expr: operand, .. } => self.check_expr(operand),
            ExprKind::Binary { left, right, .. } => {
                self.check_expr(left)?;
                self.check_expr(right)
            }
            ExprKind::Call { callee, args } => {
                for arg in args {
                    if let ExprKind::Ident(name) = &arg.kind {
                        // A bare identifier argument transfers ownership to
                        // the callee; anything else is merely verified.
                        self.ctx.move_var(name, arg.span)?;
                    } else {
                        self.check_expr(arg)?;
                    }
                }
                self.check_expr(callee)
            }
            _ => Ok(()),
        }
    }
}

/// Whole-program ownership pass. Each top-level function is checked against
/// a fresh context; the first violation anywhere aborts the pass.
pub fn check_module(
    module: &Module,
) -> Result<HashMap<String, OwnershipReport>, OwnershipViolation> {
    let mut reports = HashMap::new();
    for decl in &module.decls {
        if let Decl::Func(func) = decl {
            let report = BorrowChecker::new().check_func(func)?;
            reports.insert(func.name.node.clone(), report);
        }
    }
    Ok(reports)
}
