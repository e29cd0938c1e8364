use hologram_core::bitstring::{decode_segment, encode_segment};
use hologram_core::term::{tail, ConsPattern, List};
use hologram_core::{Error, Map, Segment, Spur, Term, Vars};

/// `left = right`: match `right` against the pattern `left`, binding
/// variables in `vars`. Returns `right`, or raises `MatchError` carrying it.
///
/// When `right` is itself still a pattern (the inner half of `[a = b] = ...`),
/// nothing is matched yet and a deferred `left = right` pattern is returned
/// for the enclosing match to resolve.
pub fn match_operator(right: Term, left: &Term, vars: &mut Vars) -> Result<Term, Error> {
    if right.has_unresolved_variable_pattern() {
        return Ok(Term::match_pattern(left.clone(), right));
    }
    if match_root(&right, left, vars)? {
        Ok(right)
    } else {
        Err(Error::match_error(&right))
    }
}

/// Non-raising form of [`match_operator`] for guards and dispatch.
pub fn is_matched(left: &Term, right: &Term, vars: &mut Vars) -> Result<bool, Error> {
    match_root(right, left, vars)
}

/// One complete match. On failure `vars` is restored to its state before
/// the call, so partial bindings never escape.
fn match_root(right: &Term, left: &Term, vars: &mut Vars) -> Result<bool, Error> {
    let snapshot = vars.clone();
    vars.begin_match();
    match unify(right, left, vars) {
        Ok(true) => {
            vars.finish_match();
            Ok(true)
        }
        Ok(false) => {
            *vars = snapshot;
            vars.finish_match();
            Ok(false)
        }
        Err(e) => {
            *vars = snapshot;
            vars.finish_match();
            Err(e)
        }
    }
}

// ── Structural matching ─────────────────────────────────────────────

/// `Ok(false)` is a mismatch; `Err` is a genuine raised error.
fn unify(right: &Term, left: &Term, vars: &mut Vars) -> Result<bool, Error> {
    match left {
        Term::MatchPattern(m) => Ok(unify(right, &m.right, vars)? && unify(right, &m.left, vars)?),
        Term::MatchPlaceholder => Ok(true),
        Term::VariablePattern(name) => Ok(match_variable(right, *name, vars)),
        Term::ConsPattern(cons) => match_cons(right, cons, vars),
        Term::BitstringPattern(segments) => match_bitstring(right, segments, vars),
        _ if left.type_name() != right.type_name() => Ok(false),
        Term::List(pattern) => match right {
            Term::List(list) => match_list(list, pattern, vars),
            _ => Ok(false),
        },
        Term::Tuple(pattern) => match right {
            Term::Tuple(items) => match_items(items, pattern, vars),
            _ => Ok(false),
        },
        Term::Map(pattern) => match right {
            Term::Map(map) => match_map(map, pattern, vars),
            _ => Ok(false),
        },
        _ => Ok(left.strictly_equals(right)),
    }
}

fn match_variable(right: &Term, name: Spur, vars: &mut Vars) -> bool {
    if let Some(previous) = vars.matched(name) {
        return previous.strictly_equals(right);
    }
    vars.bind_matched(name, right.clone());
    true
}

fn match_cons(right: &Term, cons: &ConsPattern, vars: &mut Vars) -> Result<bool, Error> {
    let Term::List(list) = right else {
        return Ok(false);
    };
    if list.items.is_empty() {
        return Ok(false);
    }
    if let Term::List(pattern_tail) = &cons.tail {
        if pattern_tail.is_proper != list.is_proper {
            return Ok(false);
        }
    }
    let rest = tail(right)?;
    Ok(unify(&list.items[0], &cons.head, vars)? && unify(&rest, &cons.tail, vars)?)
}

fn match_list(list: &List, pattern: &List, vars: &mut Vars) -> Result<bool, Error> {
    if list.is_proper != pattern.is_proper {
        return Ok(false);
    }
    match_items(&list.items, &pattern.items, vars)
}

fn match_items(items: &[Term], patterns: &[Term], vars: &mut Vars) -> Result<bool, Error> {
    if items.len() != patterns.len() {
        return Ok(false);
    }
    for (item, pattern) in items.iter().zip(patterns) {
        if !unify(item, pattern, vars)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Every key of the pattern must be present; extra keys are ignored.
fn match_map(map: &Map, pattern: &Map, vars: &mut Vars) -> Result<bool, Error> {
    for (encoded, _, value_pattern) in pattern.encoded_entries() {
        let Some(value) = map.get_encoded(encoded) else {
            return Ok(false);
        };
        if !unify(value, value_pattern, vars)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Segments consume the input left to right and must use all of it.
fn match_bitstring(right: &Term, segments: &[Segment], vars: &mut Vars) -> Result<bool, Error> {
    let Term::Bitstring(bitstring) = right else {
        return Ok(false);
    };
    let bits = bitstring.bits();
    let mut offset = 0;

    for (i, segment) in segments.iter().enumerate() {
        let remaining = &bits[offset..];
        if !segment.fits_in(remaining.len())? {
            return Ok(false);
        }
        if segment.value.is_pattern() {
            let Some((value, width)) = decode_segment(segment, remaining)? else {
                return Ok(false);
            };
            if !unify(&value, &segment.value, vars)? {
                return Ok(false);
            }
            offset += width;
        } else {
            let expected = encode_segment(segment, i + 1)?;
            if remaining.len() < expected.len() || remaining[..expected.len()] != expected[..] {
                return Ok(false);
            }
            offset += expected.len();
        }
    }
    Ok(offset == bits.len())
}
