use hologram_core::term::cons;
use hologram_core::{EvalContext, EvalResult, Term};

use crate::dispatch::call_named_function;

/// `[head | tail]`
pub fn cons_operator(head: Term, tail: Term) -> Term {
    cons(head, tail)
}

/// `left.right`: a zero-arity remote call when `left` is a module atom,
/// otherwise a map key lookup through `:maps.get/2`.
pub fn dot_operator(ctx: &EvalContext, left: &Term, right: &Term) -> EvalResult {
    if let (Some(module), Some(function)) = (left.as_atom(), right.as_atom()) {
        if !left.is_boolean() && !left.is_nil() {
            return call_named_function(ctx, &module, &function, Vec::new());
        }
    }
    call_named_function(ctx, "maps", "get", vec![right.clone(), left.clone()])
}

/// `===`
pub fn strict_equal(left: &Term, right: &Term) -> Term {
    Term::boolean(left.strictly_equals(right))
}

/// `==`
pub fn loose_equal(left: &Term, right: &Term) -> Term {
    Term::boolean(left.loosely_equals(right))
}

#[cfg(test)]
mod tests {
    use hologram_core::{FunctionClause, RegistryBuilder};

    use super::*;

    #[test]
    fn test_cons_operator() {
        let list = cons_operator(Term::integer(1), Term::list(vec![Term::integer(2)]));
        assert_eq!(list, Term::list(vec![Term::integer(1), Term::integer(2)]));
        assert!(!cons_operator(Term::integer(1), Term::integer(2)).is_proper_list());
    }

    #[test]
    fn test_dot_operator_remote_call() {
        let mut builder = RegistryBuilder::new();
        builder.define_function(
            "Elixir.Config",
            "port",
            0,
            vec![FunctionClause::new(vec![], |_, _| Ok(Term::integer(4000)))],
        );
        let ctx = EvalContext::new(builder.build());
        assert_eq!(
            dot_operator(&ctx, &Term::alias("Config"), &Term::atom("port")).unwrap(),
            Term::integer(4000)
        );
    }

    #[test]
    fn test_equality_operators() {
        assert!(strict_equal(&Term::integer(1), &Term::integer(1)).is_true());
        assert!(strict_equal(&Term::integer(1), &Term::float(1.0)).is_false());
        assert!(loose_equal(&Term::integer(1), &Term::float(1.0)).is_true());
    }
}
