#![allow(dead_code)]

use hologram::{Error, EvalContext, EvalResult, Interpreter, Term, Vars};

pub fn int(n: i64) -> Term {
    Term::integer(n)
}

pub fn atom(name: &str) -> Term {
    Term::atom(name)
}

pub fn var(name: &str) -> Term {
    Term::variable_pattern(name)
}

pub fn list(items: Vec<Term>) -> Term {
    Term::list(items)
}

pub fn tuple(items: Vec<Term>) -> Term {
    Term::tuple(items)
}

pub fn ints(ns: &[i64]) -> Term {
    Term::list(ns.iter().map(|n| Term::integer(*n)).collect())
}

/// Body returning a constant.
pub fn returns(term: Term) -> impl Fn(&EvalContext, &mut Vars) -> EvalResult {
    move |_, _| Ok(term.clone())
}

/// Body returning a bound variable.
pub fn bound(name: &'static str) -> impl Fn(&EvalContext, &mut Vars) -> EvalResult {
    move |_, vars| lookup(vars, name)
}

pub fn lookup(vars: &Vars, name: &str) -> EvalResult {
    vars.get(name)
        .cloned()
        .ok_or_else(|| Error::interpreter(format!("unbound variable {name}")))
}

pub fn interp() -> Interpreter {
    Interpreter::new()
}

/// Match via the raising operator, panicking on failure.
pub fn match_ok(pattern: &Term, value: Term) -> Vars {
    let mut vars = Vars::new();
    interp()
        .match_operator(value, pattern, &mut vars)
        .unwrap_or_else(|e| panic!("match failed for {pattern}: {e}"));
    vars
}

/// Match via the non-raising check.
pub fn is_matched_ok(pattern: &Term, value: &Term) -> Option<Vars> {
    let mut vars = Vars::new();
    hologram::is_matched(pattern, value, &mut vars)
        .unwrap_or_else(|e| panic!("is_matched raised for {pattern}: {e}"))
        .then_some(vars)
}

pub fn assert_bindings(vars: &Vars, expected: Vec<(&str, Term)>) {
    let mut expected: Vec<(String, Term)> = expected
        .into_iter()
        .map(|(name, term)| (name.to_string(), term))
        .collect();
    expected.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(vars.to_sorted_vec(), expected);
}

pub fn assert_match_error(pattern: &Term, value: Term) {
    let mut vars = Vars::new();
    let err = interp()
        .match_operator(value.clone(), pattern, &mut vars)
        .expect_err(&format!("expected {pattern} not to match {value}"));
    assert!(err.is_exception("MatchError"), "unexpected error: {err}");
    assert_eq!(
        err.exception_message(),
        Some(format!("no match of right hand side value: {value}"))
    );
    assert!(vars.is_empty(), "failed match leaked bindings");
}

/// Generate tests for both the raising match operator and the
/// non-raising `is_matched` check.
///
/// Usage:
/// ```ignore
/// match_tests! {
///     test_name: pattern, value => vec![("x", expected)],
/// }
/// ```
///
/// This generates `test_name_operator` and `test_name_is_matched`.
#[macro_export]
macro_rules! match_tests {
    ($($name:ident : $pattern:expr, $value:expr => $bindings:expr),* $(,)?) => {
        $(
            paste::paste! {
                #[test]
                fn [<$name _operator>]() {
                    let vars = common::match_ok(&$pattern, $value);
                    common::assert_bindings(&vars, $bindings);
                }

                #[test]
                fn [<$name _is_matched>]() {
                    let vars = common::is_matched_ok(&$pattern, &$value)
                        .unwrap_or_else(|| panic!("is_matched: {} should match", $pattern));
                    common::assert_bindings(&vars, $bindings);
                }
            }
        )*
    };
}

/// Like `match_tests!` for values that must not match.
#[macro_export]
macro_rules! no_match_tests {
    ($($name:ident : $pattern:expr, $value:expr),* $(,)?) => {
        $(
            paste::paste! {
                #[test]
                fn [<$name _operator>]() {
                    common::assert_match_error(&$pattern, $value);
                }

                #[test]
                fn [<$name _is_matched>]() {
                    assert!(common::is_matched_ok(&$pattern, &$value).is_none());
                }
            }
        )*
    };
}

/// Check a rendering through both `inspect` and `Kernel.inspect/1`.
#[macro_export]
macro_rules! inspect_tests {
    ($($name:ident : $term:expr => $expected:expr),* $(,)?) => {
        $(
            paste::paste! {
                #[test]
                fn [<$name _inspect>]() {
                    assert_eq!(hologram::inspect(&$term), $expected);
                }

                #[test]
                fn [<$name _kernel>]() {
                    let rendered = common::interp()
                        .call("Elixir.Kernel", "inspect", vec![$term])
                        .unwrap();
                    assert_eq!(rendered, hologram::Term::string($expected));
                }
            }
        )*
    };
}
