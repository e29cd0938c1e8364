use std::cmp::Ordering;

use num_bigint::BigInt;

use hologram_core::term::{count, head, tail};
use hologram_core::{
    check_arity, normalize_numbers, Error, EvalResult, Exception, NumberKind, RegistryBuilder,
    Term,
};

use crate::register_fn;

const MODULE: &str = "erlang";

fn arithmetic(
    args: &[Term],
    op: &str,
    int_op: impl Fn(&BigInt, &BigInt) -> BigInt,
    float_op: impl Fn(f64, f64) -> f64,
) -> EvalResult {
    check_arity!(args, op, 2);
    let Some((kind, left, right)) = normalize_numbers(&args[0], &args[1]) else {
        return Err(Error::argument_error(format!(
            "bad argument in arithmetic expression: {} {op} {}",
            args[0], args[1]
        )));
    };
    match (kind, &left, &right) {
        (NumberKind::Integer, Term::Integer(a), Term::Integer(b)) => {
            Ok(Term::integer(int_op(&**a, &**b)))
        }
        (NumberKind::Float, Term::Float(a), Term::Float(b)) => Ok(Term::float(float_op(*a, *b))),
        _ => Err(Error::interpreter(format!(
            "cannot apply {op} to {left} and {right}"
        ))),
    }
}

/// Numeric ordering; any other type raises an interpreter error.
fn compare(args: &[Term], op: &str, accept: impl Fn(Ordering) -> bool) -> EvalResult {
    check_arity!(args, op, 2);
    let (left, right) = (&args[0], &args[1]);
    match left.numeric_cmp(right) {
        Some(ordering) => Ok(Term::boolean(accept(ordering))),
        // NaN on either side
        None if left.is_number() && right.is_number() => Ok(Term::boolean(false)),
        None => Err(Error::interpreter(format!(
            ":erlang.{op}/2 currently supports only floats and integers, left = {left}, right = {right}"
        ))),
    }
}

fn predicate(builder: &mut RegistryBuilder, name: &'static str, test: fn(&Term) -> bool) {
    register_fn(builder, MODULE, name, 1, move |args| {
        check_arity!(args, name, 1);
        Ok(Term::boolean(test(&args[0])))
    });
}

/// `:erlang.error/1`: exception structs are raised as they are, any other
/// reason is wrapped in `ErlangError`.
fn raise(reason: &Term) -> Error {
    let is_exception = reason
        .as_map()
        .and_then(|m| m.get(&Term::atom("__exception__")))
        .is_some_and(Term::is_true);
    if is_exception {
        Error::Raised(Exception::from_term(reason.clone()))
    } else {
        Error::raise("ErlangError", format!("Erlang error: {reason}"))
    }
}

pub fn register(builder: &mut RegistryBuilder) {
    register_fn(builder, MODULE, "+", 2, |args| {
        arithmetic(args, "+", |a, b| a + b, |a, b| a + b)
    });
    register_fn(builder, MODULE, "-", 2, |args| {
        arithmetic(args, "-", |a, b| a - b, |a, b| a - b)
    });

    register_fn(builder, MODULE, "==", 2, |args| {
        check_arity!(args, "==", 2);
        Ok(Term::boolean(args[0].loosely_equals(&args[1])))
    });
    register_fn(builder, MODULE, "/=", 2, |args| {
        check_arity!(args, "/=", 2);
        Ok(Term::boolean(!args[0].loosely_equals(&args[1])))
    });
    register_fn(builder, MODULE, "=:=", 2, |args| {
        check_arity!(args, "=:=", 2);
        Ok(Term::boolean(args[0].strictly_equals(&args[1])))
    });
    register_fn(builder, MODULE, "=/=", 2, |args| {
        check_arity!(args, "=/=", 2);
        Ok(Term::boolean(!args[0].strictly_equals(&args[1])))
    });

    register_fn(builder, MODULE, "<", 2, |args| {
        compare(args, "<", |o| o == Ordering::Less)
    });
    register_fn(builder, MODULE, ">", 2, |args| {
        compare(args, ">", |o| o == Ordering::Greater)
    });
    register_fn(builder, MODULE, "=<", 2, |args| {
        compare(args, "=<", |o| o != Ordering::Greater)
    });
    register_fn(builder, MODULE, ">=", 2, |args| {
        compare(args, ">=", |o| o != Ordering::Less)
    });

    register_fn(builder, MODULE, "error", 1, |args| {
        check_arity!(args, "error", 1);
        Err(raise(&args[0]))
    });

    register_fn(builder, MODULE, "hd", 1, |args| {
        check_arity!(args, "hd", 1);
        head(&args[0])
    });
    register_fn(builder, MODULE, "tl", 1, |args| {
        check_arity!(args, "tl", 1);
        tail(&args[0])
    });
    register_fn(builder, MODULE, "length", 1, |args| {
        check_arity!(args, "length", 1);
        match &args[0] {
            Term::List(l) if l.is_proper => Ok(Term::integer(count(&args[0])? as i64)),
            other => Err(Error::argument_error(format!(
                "errors were found at the given arguments:\n\n  * 1st argument: not a list\n\n(got: {other})"
            ))),
        }
    });

    predicate(builder, "is_atom", Term::is_atom);
    predicate(builder, "is_binary", Term::is_binary);
    predicate(builder, "is_bitstring", Term::is_bitstring);
    predicate(builder, "is_boolean", Term::is_boolean);
    predicate(builder, "is_float", Term::is_float);
    predicate(builder, "is_function", Term::is_anonymous_function);
    predicate(builder, "is_integer", Term::is_integer);
    predicate(builder, "is_list", Term::is_list);
    predicate(builder, "is_map", Term::is_map);
    predicate(builder, "is_number", Term::is_number);
    predicate(builder, "is_tuple", Term::is_tuple);
}
