use hologram_core::{check_arity, inspect, RegistryBuilder, Term};

use crate::register_fn;

pub fn register(builder: &mut RegistryBuilder) {
    register_fn(builder, "Elixir.Kernel", "inspect", 1, |args| {
        check_arity!(args, "Kernel.inspect", 1);
        Ok(Term::string(&inspect(&args[0])))
    });
}

#[cfg(test)]
mod tests {
    use crate::test_support::call;

    use super::*;

    #[test]
    fn test_inspect_returns_string() {
        let term = Term::list(vec![Term::atom("a"), Term::string("b")]);
        assert_eq!(
            call("Elixir.Kernel", "inspect", vec![term]).unwrap(),
            Term::string("[:a, \"b\"]")
        );
    }
}
