mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::*;
use hologram::{
    call_named_function, CaseClause, CondClause, Error, FunctionClause, Interpreter, Term, Vars,
};

fn expr_module() -> Interpreter {
    Interpreter::builder()
        .define_function(
            "Elixir.Aaa.Bbb",
            "f",
            1,
            vec![
                FunctionClause::new(vec![int(1)], returns(atom("expr_1"))),
                FunctionClause::new(vec![int(2)], returns(atom("expr_2"))),
            ],
        )
        .build()
}

#[test]
fn test_two_clause_function_end_to_end() {
    let interp = expr_module();
    assert_eq!(interp.call("Elixir.Aaa.Bbb", "f", vec![int(1)]).unwrap(), atom("expr_1"));
    assert_eq!(interp.call("Elixir.Aaa.Bbb", "f", vec![int(2)]).unwrap(), atom("expr_2"));

    let err = interp.call("Elixir.Aaa.Bbb", "f", vec![int(3)]).unwrap_err();
    assert!(err.is_exception("FunctionClauseError"));
    assert!(err.exception_message().unwrap_or_default().contains("f/1"));
}

#[test]
fn test_unknown_arity_is_undefined() {
    let interp = expr_module();
    let err = interp.call("Elixir.Aaa.Bbb", "f", vec![int(1), int(2)]).unwrap_err();
    assert!(err.is_exception("UndefinedFunctionError"));
    assert_eq!(
        err.exception_message().as_deref(),
        Some("function Aaa.Bbb.f/2 is undefined or private")
    );
}

#[test]
fn test_declaration_order_with_overlapping_guards() {
    let ran = Rc::new(RefCell::new(Vec::new()));
    let clause = |name: &'static str, guard: bool| {
        let ran = ran.clone();
        FunctionClause::new(vec![var("x")], move |_, _| {
            ran.borrow_mut().push(name);
            Ok(atom(name))
        })
        .with_guard(move |_, _| Ok(Term::boolean(guard)))
    };
    let interp = Interpreter::builder()
        .define_function(
            "Elixir.Order",
            "pick",
            1,
            vec![
                clause("first", false),
                clause("second", true),
                clause("third", true),
            ],
        )
        .build();

    assert_eq!(interp.call("Elixir.Order", "pick", vec![int(0)]).unwrap(), atom("second"));
    assert_eq!(*ran.borrow(), vec!["second"]);
}

#[test]
fn test_guards_call_builtins() {
    let interp = Interpreter::builder()
        .define_function(
            "Elixir.Sign",
            "of",
            1,
            vec![
                FunctionClause::new(vec![var("n")], returns(atom("positive"))).with_guard(
                    |ctx, vars| call_named_function(ctx, "erlang", ">", vec![lookup(vars, "n")?, int(0)]),
                ),
                FunctionClause::new(vec![var("n")], returns(atom("other"))),
            ],
        )
        .build();
    assert_eq!(interp.call("Elixir.Sign", "of", vec![int(3)]).unwrap(), atom("positive"));
    assert_eq!(interp.call("Elixir.Sign", "of", vec![Term::float(-0.5)]).unwrap(), atom("other"));

    // ordering on atoms is an interpreter error and is not swallowed
    let err = interp.call("Elixir.Sign", "of", vec![atom("a")]).unwrap_err();
    assert!(matches!(err, Error::Interpreter(_)));
}

#[test]
fn test_recursive_sum() {
    let interp = Interpreter::builder()
        .define_function(
            "Elixir.Lists",
            "sum",
            1,
            vec![
                FunctionClause::new(vec![ints(&[])], returns(int(0))),
                FunctionClause::new(vec![Term::cons_pattern(var("h"), var("t"))], |ctx, vars| {
                    let rest = call_named_function(ctx, "Elixir.Lists", "sum", vec![lookup(vars, "t")?])?;
                    call_named_function(ctx, "erlang", "+", vec![lookup(vars, "h")?, rest])
                }),
            ],
        )
        .build();
    assert_eq!(
        interp.call("Elixir.Lists", "sum", vec![ints(&[1, 2, 3, 4])]).unwrap(),
        int(10)
    );
    assert_eq!(interp.ctx().call_depth(), 0);
}

#[test]
fn test_call_depth_limit() {
    let interp = Interpreter::builder()
        .max_call_depth(16)
        .define_function(
            "Elixir.Loop",
            "run",
            1,
            vec![FunctionClause::new(vec![var("n")], |ctx, vars| {
                let next = call_named_function(ctx, "erlang", "+", vec![lookup(vars, "n")?, int(1)])?;
                call_named_function(ctx, "Elixir.Loop", "run", vec![next])
            })],
        )
        .build();
    let err = interp.call("Elixir.Loop", "run", vec![int(0)]).unwrap_err();
    assert!(err.to_string().contains("maximum call depth (16) exceeded"));
    assert_eq!(interp.ctx().call_depth(), 0);
}

#[test]
fn test_user_definitions_replace_stdlib() {
    let interp = Interpreter::builder()
        .define_native("erlang", "hd", 1, |_, _| Ok(atom("overridden")))
        .build();
    assert_eq!(interp.call("erlang", "hd", vec![ints(&[1])]).unwrap(), atom("overridden"));
}

#[test]
fn test_without_stdlib() {
    let interp = Interpreter::builder().without_stdlib().build();
    assert!(interp.ctx().registry().is_empty());
    let err = interp.call("erlang", "+", vec![int(1), int(2)]).unwrap_err();
    assert!(err.is_exception("UndefinedFunctionError"));
    assert_eq!(
        err.exception_message().as_deref(),
        Some("function :erlang.+/2 is undefined or private")
    );
}

#[test]
fn test_not_ported_function() {
    let interp = Interpreter::builder()
        .define_not_implemented("Elixir.Process", "spawn", 1)
        .build();
    let err = interp.call("Elixir.Process", "spawn", vec![atom("f")]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Interpreter error: Function Process.spawn/1 is not yet ported."
    );
}

#[test]
fn test_anonymous_fallback_names_arity() {
    let fun = Term::anonymous_function(
        1,
        vec![
            FunctionClause::new(vec![int(1)], returns(atom("a"))),
            FunctionClause::new(vec![int(2)], returns(atom("b"))),
        ],
        &Vars::new(),
    );
    let interp = interp();
    assert_eq!(interp.call_anonymous(&fun, vec![int(1)]).unwrap(), atom("a"));
    let err = interp.call_anonymous(&fun, vec![int(3)]).unwrap_err();
    assert!(err.is_exception("FunctionClauseError"));
    assert!(err.exception_message().unwrap_or_default().ends_with("fn/1"));
}

#[test]
fn test_closure_over_outer_scope() {
    let outer = Vars::from_pairs([("offset", int(10))]);
    let fun = Term::anonymous_function(
        1,
        vec![FunctionClause::new(vec![var("x")], |ctx, vars| {
            call_named_function(ctx, "erlang", "+", vec![lookup(vars, "x")?, lookup(vars, "offset")?])
        })],
        &outer,
    );
    assert_eq!(interp().call_anonymous(&fun, vec![int(5)]).unwrap(), int(15));
}

#[test]
fn test_case_and_cond() {
    let interp = interp();
    let clauses = vec![
        CaseClause::new(tuple(vec![atom("ok"), var("v")]), bound("v")),
        CaseClause::new(tuple(vec![atom("error"), Term::match_placeholder()]), returns(atom("failed"))),
    ];
    let ok = tuple(vec![atom("ok"), int(7)]);
    assert_eq!(interp.case(&ok, &clauses, &Vars::new()).unwrap(), int(7));

    let err = interp.case(&atom("other"), &clauses, &Vars::new()).unwrap_err();
    assert!(err.is_exception("CaseClauseError"));
    assert_eq!(
        err.exception_message().as_deref(),
        Some("no case clause matching: :other")
    );

    let conds = vec![
        CondClause::new(
            |ctx, vars| call_named_function(ctx, "erlang", "<", vec![lookup(vars, "n")?, int(0)]),
            returns(atom("negative")),
        ),
        CondClause::new(returns(Term::boolean(true)), returns(atom("non_negative"))),
    ];
    let vars = Vars::from_pairs([("n", int(-1))]);
    assert_eq!(interp.cond(&conds, &vars).unwrap(), atom("negative"));
    let vars = Vars::from_pairs([("n", int(1))]);
    assert_eq!(interp.cond(&conds, &vars).unwrap(), atom("non_negative"));
}

#[test]
fn test_dot_operator() {
    let interp = Interpreter::builder()
        .define_function(
            "Elixir.Config",
            "port",
            0,
            vec![FunctionClause::new(vec![], returns(int(4000)))],
        )
        .build();
    assert_eq!(interp.dot(&Term::alias("Config"), &atom("port")).unwrap(), int(4000));

    let map = Term::map(vec![(atom("a"), int(1))]);
    assert_eq!(interp.dot(&map, &atom("a")).unwrap(), int(1));
    assert!(interp.dot(&map, &atom("b")).unwrap_err().is_exception("KeyError"));
    assert!(interp.dot(&int(1), &atom("b")).unwrap_err().is_exception("BadMapError"));
}

#[test]
fn test_error_payload_reaches_host() {
    let interp = interp();
    let err = interp
        .call("erlang", "error", vec![Term::error_struct("ArgumentError", "bad input")])
        .unwrap_err();
    assert_eq!(err.to_string(), "(ArgumentError) bad input");
    let payload = err.exception().map(|e| e.payload()).unwrap_or_default();
    assert!(payload.starts_with("__hologram__:"));
    assert_eq!(
        hologram::json::deserialize(&payload["__hologram__:".len()..]).unwrap(),
        Term::error_struct("ArgumentError", "bad input")
    );
}
