use num_bigint::BigInt;
use serde_json::{json, Map as JsonMap, Value as Json};

use crate::error::Error;
use crate::term::{resolve, Term};

const BIGINT_PREFIX: &str = "__bigint__:";

/// Serialize a term to its JSON transport form.
pub fn serialize(term: &Term) -> Result<String, Error> {
    let value = term_to_json(term)?;
    serde_json::to_string(&value).map_err(|e| Error::serialization(e.to_string()))
}

/// Inverse of [`serialize`].
pub fn deserialize(input: &str) -> Result<Term, Error> {
    let value: Json =
        serde_json::from_str(input).map_err(|e| Error::serialization(e.to_string()))?;
    json_to_term(&value)
}

pub fn term_to_json(term: &Term) -> Result<Json, Error> {
    Ok(match term {
        Term::Atom(_) => json!({ "type": "atom", "value": term.as_atom() }),
        Term::Integer(i) => json!({ "type": "integer", "value": format!("{BIGINT_PREFIX}{i}") }),
        Term::Float(f) => {
            if !f.is_finite() {
                return Err(Error::serialization(format!(
                    "non-finite float cannot be serialized: {f}"
                )));
            }
            json!({ "type": "float", "value": f })
        }
        Term::Bitstring(b) => json!({ "type": "bitstring", "bits": b.bits() }),
        Term::List(l) => json!({
            "type": "list",
            "data": items_to_json(&l.items)?,
            "isProper": l.is_proper,
        }),
        Term::Tuple(items) => json!({ "type": "tuple", "data": items_to_json(items)? }),
        Term::Map(m) => {
            let mut data = JsonMap::new();
            for (encoded, k, v) in m.encoded_entries() {
                data.insert(
                    encoded.to_string(),
                    Json::Array(vec![term_to_json(k)?, term_to_json(v)?]),
                );
            }
            json!({ "type": "map", "data": data })
        }
        Term::VariablePattern(name) => {
            json!({ "type": "variable_pattern", "name": resolve(*name) })
        }
        Term::MatchPlaceholder => json!({ "type": "match_placeholder" }),
        Term::ConsPattern(c) => json!({
            "type": "cons_pattern",
            "head": term_to_json(&c.head)?,
            "tail": term_to_json(&c.tail)?,
        }),
        Term::MatchPattern(m) => json!({
            "type": "match_pattern",
            "left": term_to_json(&m.left)?,
            "right": term_to_json(&m.right)?,
        }),
        Term::AnonymousFunction(_) | Term::BitstringPattern(_) => {
            return Err(Error::serialization(format!(
                "{} terms cannot be serialized",
                term.type_name()
            )))
        }
    })
}

fn items_to_json(items: &[Term]) -> Result<Json, Error> {
    items
        .iter()
        .map(term_to_json)
        .collect::<Result<Vec<_>, _>>()
        .map(Json::Array)
}

pub fn json_to_term(value: &Json) -> Result<Term, Error> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::serialization(format!("expected a term object, got: {value}")))?;
    let kind = obj
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| Error::serialization("term object is missing \"type\""))?;
    let field = |name: &str| {
        obj.get(name)
            .ok_or_else(|| Error::serialization(format!("{kind} term is missing \"{name}\"")))
    };

    match kind {
        "atom" => field("value")?
            .as_str()
            .map(Term::atom)
            .ok_or_else(|| Error::serialization("atom value must be a string")),
        "integer" => decode_integer(field("value")?),
        "float" => field("value")?
            .as_f64()
            .map(Term::float)
            .ok_or_else(|| Error::serialization("float value must be a number")),
        "bitstring" => {
            let bits = field("bits")?
                .as_array()
                .ok_or_else(|| Error::serialization("bitstring bits must be an array"))?
                .iter()
                .map(|b| match b.as_u64() {
                    Some(bit @ (0 | 1)) => Ok(bit as u8),
                    _ => Err(Error::serialization(format!("invalid bit: {b}"))),
                })
                .collect::<Result<Vec<u8>, _>>()?;
            Ok(Term::bitstring(bits))
        }
        "list" => {
            let items = json_items(field("data")?)?;
            let is_proper = obj.get("isProper").and_then(Json::as_bool).unwrap_or(true);
            if is_proper {
                Ok(Term::list(items))
            } else {
                Term::improper_list(items)
            }
        }
        "tuple" => Ok(Term::tuple(json_items(field("data")?)?)),
        "map" => {
            let data = field("data")?
                .as_object()
                .ok_or_else(|| Error::serialization("map data must be an object"))?;
            let mut pairs = Vec::with_capacity(data.len());
            for entry in data.values() {
                match entry.as_array().map(Vec::as_slice) {
                    Some([k, v]) => pairs.push((json_to_term(k)?, json_to_term(v)?)),
                    _ => {
                        return Err(Error::serialization(format!(
                            "map entry must be a [key, value] pair, got: {entry}"
                        )))
                    }
                }
            }
            Ok(Term::map(pairs))
        }
        "variable_pattern" => field("name")?
            .as_str()
            .map(Term::variable_pattern)
            .ok_or_else(|| Error::serialization("variable name must be a string")),
        "match_placeholder" => Ok(Term::match_placeholder()),
        "cons_pattern" => Ok(Term::cons_pattern(
            json_to_term(field("head")?)?,
            json_to_term(field("tail")?)?,
        )),
        "match_pattern" => Ok(Term::match_pattern(
            json_to_term(field("left")?)?,
            json_to_term(field("right")?)?,
        )),
        other => Err(Error::serialization(format!("unknown term type: {other}"))),
    }
}

fn json_items(value: &Json) -> Result<Vec<Term>, Error> {
    value
        .as_array()
        .ok_or_else(|| Error::serialization("term data must be an array"))?
        .iter()
        .map(json_to_term)
        .collect()
}

/// `"__bigint__:-12"` decodes exactly; plain JSON integers are accepted too.
fn decode_integer(value: &Json) -> Result<Term, Error> {
    if let Some(s) = value.as_str() {
        let digits = s.strip_prefix(BIGINT_PREFIX).ok_or_else(|| {
            Error::serialization(format!("integer string must start with {BIGINT_PREFIX}"))
        })?;
        let parsed: BigInt = digits
            .parse()
            .map_err(|_| Error::serialization(format!("invalid integer: {s}")))?;
        return Ok(Term::integer(parsed));
    }
    if let Some(i) = value.as_i64() {
        return Ok(Term::integer(i));
    }
    if let Some(u) = value.as_u64() {
        return Ok(Term::integer(u));
    }
    Err(Error::serialization(format!("invalid integer value: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1. Big integers keep their exact value
    #[test]
    fn test_bigint_round_trip() {
        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        let term = Term::integer(big.clone());
        let text = serialize(&term).unwrap();
        assert!(text.contains("__bigint__:123456789012345678901234567890"));
        assert_eq!(deserialize(&text).unwrap(), Term::integer(big));
    }

    // 2. Object shapes
    #[test]
    fn test_shapes() {
        assert_eq!(
            term_to_json(&Term::atom("a")).unwrap(),
            json!({"type": "atom", "value": "a"})
        );
        assert_eq!(
            term_to_json(&Term::bitstring(vec![1, 0])).unwrap(),
            json!({"type": "bitstring", "bits": [1, 0]})
        );
        assert_eq!(
            term_to_json(&Term::list(vec![])).unwrap(),
            json!({"type": "list", "data": [], "isProper": true})
        );
    }

    // 3. Nested containers and patterns decode
    #[test]
    fn test_nested_decode() {
        let input = r#"{"type":"map","data":{"atom(a)":[
            {"type":"atom","value":"a"},
            {"type":"list","data":[{"type":"integer","value":"__bigint__:-12"},{"type":"float","value":1.5}],"isProper":false}
        ]}}"#;
        let term = deserialize(input).unwrap();
        let expected = Term::map(vec![(
            Term::atom("a"),
            Term::improper_list(vec![Term::integer(-12), Term::float(1.5)]).unwrap(),
        )]);
        assert_eq!(term, expected);

        let pattern = deserialize(
            r#"{"type":"cons_pattern","head":{"type":"variable_pattern","name":"h"},"tail":{"type":"match_placeholder"}}"#,
        )
        .unwrap();
        assert_eq!(
            pattern,
            Term::cons_pattern(Term::variable_pattern("h"), Term::match_placeholder())
        );
    }

    // 4. Functions are not transportable
    #[test]
    fn test_function_not_serializable() {
        let fun = Term::anonymous_function(0, vec![], &crate::Vars::new());
        assert!(matches!(serialize(&fun), Err(Error::Serialization(_))));
    }

    // 5. Malformed input
    #[test]
    fn test_malformed() {
        assert!(deserialize("[1]").is_err());
        assert!(deserialize(r#"{"type":"nope"}"#).is_err());
        assert!(deserialize(r#"{"type":"integer","value":"12"}"#).is_err());
        assert!(deserialize(r#"{"type":"bitstring","bits":[2]}"#).is_err());
    }
}
