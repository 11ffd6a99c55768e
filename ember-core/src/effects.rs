#![forbid(unsafe_code)]

use std::collections::HashMap;

use ember_ast::{Block, Decl, Expr, ExprKind, FuncDecl, Module, Stmt};

/// Coarse observable side-effect categories, inferred syntactically from
/// call-site name patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Io,
    Async,
    Throw,
    State,
    Yield,
    Resume,
}

/// Ordered set of effects, deduplicated by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EffectSet {
    effects: Vec<EffectKind>,
}

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adding an already-present kind is a no-op.
    pub fn add(&mut self, kind: EffectKind) {
        if !self.effects.contains(&kind) {
            self.effects.push(kind);
        }
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        self.effects.contains(&kind)
    }

    pub fn union(&self, other: &EffectSet) -> EffectSet {
        let mut result = self.clone();
        for kind in &other.effects {
            result.add(*kind);
        }
        result
    }

    pub fn iter(&self) -> impl Iterator<Item = EffectKind> + '_ {
        self.effects.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Registered handler for an effect kind. Reserved machinery for future
/// handler/resume support; the inference walker never consults it.
#[derive(Clone, Debug)]
pub struct Handler {
    pub kind: EffectKind,
    pub func: String,
    pub resumable: bool,
}

#[derive(Clone, Debug, Default)]
pub struct HandlerStack {
    handlers: Vec<Handler>,
}

impl HandlerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handler: Handler) {
        self.handlers.push(handler);
    }

    /// Nearest enclosing handler for `kind`, searching from the top.
    pub fn find(&self, kind: EffectKind) -> Option<&Handler> {
        self.handlers.iter().rev().find(|h| h.kind == kind)
    }
}

struct EffectContext {
    handlers: HandlerStack,
    effects: EffectSet,
}

impl EffectContext {
    fn new() -> Self {
        EffectContext {
            handlers: HandlerStack::new(),
            effects: EffectSet::new(),
        }
    }
}

/// Classify a callee name by prefix. Effects are purely syntactic and local;
/// calling a function that itself performs I/O does not mark the caller.
fn classify_callee(name: &str) -> Option<EffectKind> {
    if name.starts_with("print") {
        Some(EffectKind::Io)
    } else if name.starts_with("async") {
        Some(EffectKind::Async)
    } else if name.starts_with("panic") {
        Some(EffectKind::Throw)
    } else {
        None
    }
}

fn infer_expr(ctx: &mut EffectContext, expr: &Expr) {
    match &expr.kind {
        ExprKind::Call { callee, args } => {
            if let ExprKind::Ident(name) = &callee.kind {
                if let Some(kind) = classify_callee(name) {
                    ctx.effects.add(kind);
                }
            }
            for arg in args {
                infer_expr(ctx, arg);
            }
        }
        ExprKind::Binary { left, right, .. } => {
            infer_expr(ctx, left);
            infer_expr(ctx, right);
        }
        ExprKind::Unary { expr: operand, .. } => infer_expr(ctx, operand),
        _ => {}
    }
}

fn infer_stmt(ctx: &mut EffectContext, stmt: &Stmt) {
    match stmt {
        Stmt::Let(l) => infer_expr(ctx, &l.init),
        Stmt::Return(r) => {
            if let Some(value) = &r.value {
                infer_expr(ctx, value);
            }
        }
        Stmt::If(i) => {
            infer_expr(ctx, &i.cond);
            infer_block(ctx, &i.then_block);
            if let Some(else_block) = &i.else_block {
                infer_block(ctx, else_block);
            }
        }
        Stmt::While(w) => {
            infer_expr(ctx, &w.cond);
            infer_block(ctx, &w.body);
        }
        Stmt::Block(b) => infer_block(ctx, b),
        Stmt::Expr(e) => infer_expr(ctx, e),
        _ => {}
    }
}

fn infer_block(ctx: &mut EffectContext, block: &Block) {
    for stmt in &block.stmts {
        infer_stmt(ctx, stmt);
    }
}

/// Effect set for one function body.
pub fn infer_func_effects(func: &FuncDecl) -> EffectSet {
    let mut ctx = EffectContext::new();
    infer_block(&mut ctx, &func.body);
    ctx.effects
}

/// Effect sets for every top-level function. Informational only; the result
/// never rejects a program.
pub fn infer_module_effects(module: &Module) -> HashMap<String, EffectSet> {
    let mut result = HashMap::new();
    for decl in &module.decls {
        if let Decl::Func(func) = decl {
            result.insert(func.name.node.clone(), infer_func_effects(func));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_set_deduplicates_by_kind() {
        let mut set = EffectSet::new();
        set.add(EffectKind::Io);
        set.add(EffectKind::Io);
        set.add(EffectKind::Throw);
        assert_eq!(set.len(), 2);
        assert!(set.contains(EffectKind::Io));
        assert!(set.contains(EffectKind::Throw));
    }

    #[test]
    fn union_preserves_left_order() {
        let mut a = EffectSet::new();
        a.add(EffectKind::Io);
        let mut b = EffectSet::new();
        b.add(EffectKind::Async);
        b.add(EffectKind::Io);

        let u = a.union(&b);
        assert_eq!(u.iter().collect::<Vec<_>>(), vec![EffectKind::Io, EffectKind::Async]);
    }

    #[test]
    fn handler_stack_finds_nearest() {
        let mut stack = HandlerStack::new();
        stack.push(Handler {
            kind: EffectKind::Throw,
            func: "outer_handler".into(),
            resumable: false,
        });
        stack.push(Handler {
            kind: EffectKind::Throw,
            func: "inner_handler".into(),
            resumable: true,
        });

        let found = stack.find(EffectKind::Throw).unwrap();
        assert_eq!(found.func, "inner_handler");
        assert!(stack.find(EffectKind::Yield).is_none());
    }

    #[test]
    fn classify_is_prefix_based() {
        assert_eq!(classify_callee("println"), Some(EffectKind::Io));
        assert_eq!(classify_callee("async_fetch"), Some(EffectKind::Async));
        assert_eq!(classify_callee("panic_with"), Some(EffectKind::Throw));
        assert_eq!(classify_callee("compute"), None);
    }
}
