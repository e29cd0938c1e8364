use std::rc::Rc;

use hologram_core::{check_arity, Bitstring, Error, Map, RegistryBuilder, Term};

use crate::register_fn;

const MODULE: &str = "Elixir.Enum";

fn not_implemented(protocol: &str, term: &Term) -> Error {
    Error::argument_error(format!(
        "protocol {protocol} not implemented for {term} of type {}",
        term.type_name()
    ))
}

/// Items of an enumerable: a proper list as is, a map as `{key, value}`
/// tuples in insertion order.
fn to_list(term: &Term) -> Result<Vec<Term>, Error> {
    match term {
        Term::List(l) if l.is_proper => Ok(l.items.clone()),
        Term::Map(m) => Ok(m
            .iter()
            .map(|(k, v)| Term::tuple(vec![k.clone(), v.clone()]))
            .collect()),
        other => Err(not_implemented("Enumerable", other)),
    }
}

fn into(items: Vec<Term>, collectable: &Term) -> Result<Term, Error> {
    match collectable {
        Term::List(l) if l.is_proper => {
            let mut all = l.items.clone();
            all.extend(items);
            Ok(Term::list(all))
        }
        Term::Map(m) => {
            let mut pairs: Vec<(Term, Term)> =
                m.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            for item in items {
                match item.as_tuple() {
                    Some([k, v]) => pairs.push((k.clone(), v.clone())),
                    _ => {
                        return Err(Error::argument_error(format!(
                            "collecting into a map requires {{key, value}} tuples, got: {item}"
                        )))
                    }
                }
            }
            Ok(Term::Map(Rc::new(Map::from_pairs(pairs))))
        }
        Term::Bitstring(b) => {
            let mut acc: Bitstring = (**b).clone();
            for item in items {
                match item.as_bitstring() {
                    Some(bits) => acc = acc.concat(bits),
                    None => {
                        return Err(Error::argument_error(format!(
                            "collecting into a bitstring requires bitstrings, got: {item}"
                        )))
                    }
                }
            }
            Ok(Term::Bitstring(Rc::new(acc)))
        }
        other => Err(not_implemented("Collectable", other)),
    }
}

pub fn register(builder: &mut RegistryBuilder) {
    register_fn(builder, MODULE, "to_list", 1, |args| {
        check_arity!(args, "Enum.to_list", 1);
        Ok(Term::list(to_list(&args[0])?))
    });

    register_fn(builder, MODULE, "into", 2, |args| {
        check_arity!(args, "Enum.into", 2);
        into(to_list(&args[0])?, &args[1])
    });
}
