use ember_ast::{Block, Expr, FuncDecl, Module, Stmt, WhileStmt, span};
use ember_core::{infer_func_effects, infer_module_effects, EffectKind};

fn func(name: &str, body: Vec<Stmt>) -> FuncDecl {
    FuncDecl::new(name, vec![], Block::new(body))
}

#[test]
fn print_call_adds_io() {
    let f = func(
        "main",
        vec![Stmt::expr(Expr::call_named("println", vec![Expr::int(1)]))],
    );
    let effects = infer_func_effects(&f);
    assert!(effects.contains(EffectKind::Io));
    assert_eq!(effects.len(), 1);
}

#[test]
fn async_and_panic_prefixes_classify() {
    let f = func(
        "main",
        vec![
            Stmt::expr(Expr::call_named("async_fetch", vec![])),
            Stmt::expr(Expr::call_named("panic_if", vec![Expr::int(0)])),
        ],
    );
    let effects = infer_func_effects(&f);
    assert!(effects.contains(EffectKind::Async));
    assert!(effects.contains(EffectKind::Throw));
    assert_eq!(effects.len(), 2);
}

#[test]
fn repeated_calls_deduplicate() {
    let f = func(
        "main",
        vec![
            Stmt::expr(Expr::call_named("print", vec![])),
            Stmt::expr(Expr::call_named("println", vec![])),
            Stmt::expr(Expr::call_named("print_err", vec![])),
        ],
    );
    let effects = infer_func_effects(&f);
    assert_eq!(effects.len(), 1);
}

#[test]
fn nested_call_arguments_are_inferred() {
    // compute(panic_on_zero(x)) — the inner call still registers Throw.
    let f = func(
        "main",
        vec![Stmt::expr(Expr::call_named(
            "compute",
            vec![Expr::call_named("panic_on_zero", vec![Expr::var("x")])],
        ))],
    );
    let effects = infer_func_effects(&f);
    assert!(effects.contains(EffectKind::Throw));
}

#[test]
fn effects_inside_control_flow_are_collected() {
    let f = func(
        "main",
        vec![Stmt::While(WhileStmt {
            span: span(0, 0),
            cond: Expr::int(1),
            body: Block::new(vec![Stmt::expr(Expr::call_named("print", vec![]))]),
        })],
    );
    let effects = infer_func_effects(&f);
    assert!(effects.contains(EffectKind::Io));
}

#[test]
fn effects_do_not_propagate_across_calls() {
    // helper() performs I/O; main() calls helper — but inference is purely
    // syntactic, so main stays effect-free.
    let helper = func(
        "helper",
        vec![Stmt::expr(Expr::call_named("print", vec![]))],
    );
    let main = func("main", vec![Stmt::expr(Expr::call_named("helper", vec![]))]);
    let module = Module::of_funcs(vec![helper, main]);

    let effects = infer_module_effects(&module);
    assert!(effects["helper"].contains(EffectKind::Io));
    assert!(effects["main"].is_empty());
}

#[test]
fn pure_function_has_empty_effect_set() {
    let f = func(
        "add",
        vec![Stmt::let_binding("c", Expr::int(3))],
    );
    assert!(infer_func_effects(&f).is_empty());
}

#[test]
fn module_driver_covers_every_function() {
    let module = Module::of_funcs(vec![
        func("a", vec![Stmt::expr(Expr::call_named("print", vec![]))]),
        func("b", vec![]),
    ]);
    let effects = infer_module_effects(&module);
    assert_eq!(effects.len(), 2);
}
