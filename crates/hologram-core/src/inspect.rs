use std::fmt;

use crate::bitstring::{Bitstring, Segment};
use crate::term::{with_resolved, Map, Term};

/// Source-language rendering of a term, as `Kernel.inspect/1` prints it.
pub fn inspect(term: &Term) -> String {
    let mut out = String::new();
    write_term(&mut out, term);
    out
}

/// `Elixir.Aaa.Bbb` renders as `Aaa.Bbb`; Erlang modules render as `:name`.
pub fn inspect_module_name(module: &str) -> String {
    match module.strip_prefix("Elixir.") {
        Some(alias) => alias.to_string(),
        None => format!(":{module}"),
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&inspect(self))
    }
}

fn write_term(out: &mut String, term: &Term) {
    match term {
        Term::Atom(s) => with_resolved(*s, |name| out.push_str(&atom_literal(name))),
        Term::Integer(i) => out.push_str(&i.to_string()),
        Term::Float(f) => out.push_str(&format_float(*f)),
        Term::Bitstring(b) => write_bitstring(out, b),
        Term::List(l) => {
            if l.is_proper {
                if let Some(pairs) = keyword_pairs(&l.items) {
                    out.push('[');
                    write_keyword_pairs(out, &pairs);
                    out.push(']');
                    return;
                }
            }
            out.push('[');
            let (items, tail) = match l.items.split_last() {
                Some((last, init)) if !l.is_proper => (init, Some(last)),
                _ => (&l.items[..], None),
            };
            write_joined(out, items);
            if let Some(tail) = tail {
                out.push_str(" | ");
                write_term(out, tail);
            }
            out.push(']');
        }
        Term::Tuple(items) => {
            out.push('{');
            write_joined(out, items);
            out.push('}');
        }
        Term::Map(m) => write_map(out, m),
        Term::AnonymousFunction(fun) => {
            out.push_str(&format!("#Function<{}/{}>", fun.unique_id, fun.arity));
        }
        Term::VariablePattern(s) => with_resolved(*s, |name| out.push_str(name)),
        Term::MatchPlaceholder => out.push('_'),
        Term::ConsPattern(c) => {
            out.push('[');
            write_term(out, &c.head);
            out.push_str(" | ");
            write_term(out, &c.tail);
            out.push(']');
        }
        Term::BitstringPattern(segments) => write_segments(out, segments),
        Term::MatchPattern(m) => {
            write_term(out, &m.left);
            out.push_str(" = ");
            write_term(out, &m.right);
        }
    }
}

fn write_joined(out: &mut String, items: &[Term]) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_term(out, item);
    }
}

fn write_map(out: &mut String, map: &Map) {
    let struct_name = map
        .get(&Term::atom("__struct__"))
        .filter(|name| name.is_alias())
        .and_then(Term::as_atom);

    let entries: Vec<(&Term, &Term)> = map
        .iter()
        .filter(|(k, _)| {
            struct_name.is_none() || !(k.is_atom_named("__struct__") || k.is_atom_named("__exception__"))
        })
        .collect();

    match &struct_name {
        Some(name) => out.push_str(&format!("%{}{{", inspect_module_name(name))),
        None => out.push_str("%{"),
    }

    let all_atom_keys = entries
        .iter()
        .all(|(k, _)| k.as_atom().is_some_and(|name| is_keyword_key(&name)));

    if all_atom_keys {
        let pairs: Vec<(String, &Term)> = entries
            .iter()
            .filter_map(|(k, v)| k.as_atom().map(|name| (name, *v)))
            .collect();
        write_keyword_pairs(out, &pairs);
    } else {
        for (i, (k, v)) in entries.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            write_term(out, k);
            out.push_str(" => ");
            write_term(out, v);
        }
    }
    out.push('}');
}

/// `[a: 1]` form, when every item is an `{identifier_atom, value}` tuple.
fn keyword_pairs(items: &[Term]) -> Option<Vec<(String, &Term)>> {
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| match item.as_tuple() {
            Some([key, value]) => key
                .as_atom()
                .filter(|name| is_keyword_key(name))
                .map(|name| (name, value)),
            _ => None,
        })
        .collect()
}

fn write_keyword_pairs(out: &mut String, pairs: &[(String, &Term)]) {
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(key);
        out.push_str(": ");
        write_term(out, value);
    }
}

fn is_keyword_key(name: &str) -> bool {
    !name.starts_with("Elixir.") && is_identifier(name)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_') {
        return false;
    }
    let rest: Vec<char> = chars.collect();
    let body = match rest.last() {
        Some('?') | Some('!') => &rest[..rest.len() - 1],
        _ => &rest[..],
    };
    body.iter().all(|c| c.is_alphanumeric() || *c == '_' || *c == '@')
}

const OPERATOR_ATOMS: &[&str] = &[
    "+", "-", "*", "/", "++", "--", "==", "!=", "===", "!==", "=~", "<", ">", "<=", ">=", "&&",
    "||", "!", "<>", "|>", "..", "<-", "\\\\", "=:=", "=/=", "=<", "/=",
];

fn atom_literal(name: &str) -> String {
    match name {
        "true" | "false" | "nil" => name.to_string(),
        _ if name.starts_with("Elixir.") => inspect_module_name(name),
        _ if is_identifier(name) || OPERATOR_ATOMS.contains(&name) => format!(":{name}"),
        _ => format!(":\"{}\"", escape_text(name)),
    }
}

/// Shortest round-trip digits, always with a fractional part.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let abs = f.abs();
    if abs >= 1e21 || (abs != 0.0 && abs < 1e-6) {
        let s = format!("{f:e}");
        return match s.split_once('e') {
            Some((mantissa, exp)) if !mantissa.contains('.') => format!("{mantissa}.0e{exp}"),
            _ => s,
        };
    }
    let s = f.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

fn write_bitstring(out: &mut String, bits: &Bitstring) {
    if let Some(text) = bits.to_text().filter(|t| is_printable(t)) {
        out.push('"');
        out.push_str(&escape_text(&text));
        out.push('"');
        return;
    }
    let (bytes, partial) = bits.split_bytes();
    out.push_str("<<");
    let mut parts: Vec<String> = bytes.iter().map(u8::to_string).collect();
    if let Some((value, size)) = partial {
        parts.push(format!("{value}::size({size})"));
    }
    out.push_str(&parts.join(", "));
    out.push_str(">>");
}

fn is_printable(text: &str) -> bool {
    text.chars().all(|c| {
        !c.is_control() || matches!(c, '\n' | '\t' | '\r' | '\u{1b}' | '\u{7}' | '\u{8}' | '\u{b}' | '\u{c}')
    })
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{1b}' => out.push_str("\\e"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{b}' => out.push_str("\\v"),
            '\u{c}' => out.push_str("\\f"),
            '#' if chars.peek() == Some(&'{') => out.push_str("\\#"),
            c => out.push(c),
        }
    }
    out
}

fn write_segments(out: &mut String, segments: &[Segment]) {
    out.push_str("<<");
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_term(out, &segment.value);
        out.push_str("::");
        out.push_str(segment.kind.name());
        if let Some(size) = &segment.size {
            out.push_str("-size(");
            write_term(out, size);
            out.push(')');
        }
    }
    out.push_str(">>");
}
