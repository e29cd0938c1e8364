use std::rc::Rc;

use hologram_core::{check_arity, Error, Map, RegistryBuilder, Term};

use crate::register_fn;

const MODULE: &str = "maps";

fn expect_map(term: &Term) -> Result<&Map, Error> {
    term.as_map().ok_or_else(|| Error::bad_map_error(term))
}

pub fn register(builder: &mut RegistryBuilder) {
    // :maps.get(key, map)
    register_fn(builder, MODULE, "get", 2, |args| {
        check_arity!(args, ":maps.get", 2);
        let (key, map) = (&args[0], &args[1]);
        expect_map(map)?
            .get(key)
            .cloned()
            .ok_or_else(|| Error::key_error(key, map))
    });

    // :maps.put(key, value, map)
    register_fn(builder, MODULE, "put", 3, |args| {
        check_arity!(args, ":maps.put", 3);
        let map = expect_map(&args[2])?;
        Ok(Term::Map(Rc::new(map.put(args[0].clone(), args[1].clone()))))
    });

    // :maps.is_key(key, map)
    register_fn(builder, MODULE, "is_key", 2, |args| {
        check_arity!(args, ":maps.is_key", 2);
        Ok(Term::boolean(expect_map(&args[1])?.contains_key(&args[0])))
    });
}

#[cfg(test)]
mod tests {
    use crate::test_support::call;

    use super::*;

    fn sample() -> Term {
        Term::map(vec![(Term::atom("a"), Term::integer(1))])
    }

    #[test]
    fn test_get() {
        assert_eq!(
            call(MODULE, "get", vec![Term::atom("a"), sample()]).unwrap(),
            Term::integer(1)
        );
    }

    #[test]
    fn test_get_missing_key() {
        let err = call(MODULE, "get", vec![Term::atom("x"), sample()]).unwrap_err();
        assert!(err.is_exception("KeyError"));
        assert_eq!(
            err.exception_message().as_deref(),
            Some("key :x not found in: %{a: 1}")
        );
    }

    #[test]
    fn test_get_non_map() {
        let err = call(MODULE, "get", vec![Term::atom("a"), Term::integer(1)]).unwrap_err();
        assert!(err.is_exception("BadMapError"));
        assert_eq!(
            err.exception_message().as_deref(),
            Some("expected a map, got: 1")
        );
    }

    #[test]
    fn test_put_and_is_key() {
        let updated = call(
            MODULE,
            "put",
            vec![Term::atom("b"), Term::integer(2), sample()],
        )
        .unwrap();
        assert!(call(MODULE, "is_key", vec![Term::atom("b"), updated.clone()])
            .unwrap()
            .is_true());
        // the input map is unchanged
        assert!(call(MODULE, "is_key", vec![Term::atom("b"), sample()])
            .unwrap()
            .is_false());
        assert_eq!(updated.as_map().map(Map::len), Some(2));
    }
}
