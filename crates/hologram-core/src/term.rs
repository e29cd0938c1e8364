use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use lasso::{Rodeo, Spur};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::bitstring::{Bitstring, Segment};
use crate::clause::FunctionClause;
use crate::error::Error;
use crate::vars::Vars;

thread_local! {
    static INTERNER: RefCell<Rodeo> = RefCell::new(Rodeo::default());
    static NEXT_UNIQUE_ID: Cell<u64> = const { Cell::new(1) };
}

/// Intern a string, returning a Spur key.
pub fn intern(s: &str) -> Spur {
    INTERNER.with(|r| r.borrow_mut().get_or_intern(s))
}

/// Resolve a Spur key back to a String.
pub fn resolve(spur: Spur) -> String {
    INTERNER.with(|r| r.borrow().resolve(&spur).to_string())
}

/// Resolve a Spur and call f with the &str, avoiding allocation.
pub fn with_resolved<F, R>(spur: Spur, f: F) -> R
where
    F: FnOnce(&str) -> R,
{
    INTERNER.with(|r| {
        let interner = r.borrow();
        f(interner.resolve(&spur))
    })
}

/// Allocate the next anonymous function identity.
pub fn next_unique_id() -> u64 {
    NEXT_UNIQUE_ID.with(|id| {
        let current = id.get();
        id.set(current + 1);
        current
    })
}

/// List payload. An improper list stores its non-list tail as the last item.
#[derive(Debug, Clone)]
pub struct List {
    pub items: Vec<Term>,
    pub is_proper: bool,
}

/// Map payload keyed by the structural encoding of each key.
#[derive(Debug, Clone, Default)]
pub struct Map {
    entries: IndexMap<String, (Term, Term)>,
}

impl Map {
    /// Build a map; when a key encoding repeats, the last value wins.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Term, Term)>) -> Self {
        let mut entries = IndexMap::new();
        for (key, value) in pairs {
            entries.insert(key.encode_map_key(), (key, value));
        }
        Map { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Term) -> Option<&Term> {
        self.get_encoded(&key.encode_map_key())
    }

    pub fn get_encoded(&self, encoded: &str) -> Option<&Term> {
        self.entries.get(encoded).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &Term) -> bool {
        self.entries.contains_key(&key.encode_map_key())
    }

    /// Copy of this map with `key` set to `value`.
    pub fn put(&self, key: Term, value: Term) -> Map {
        let mut entries = self.entries.clone();
        entries.insert(key.encode_map_key(), (key, value));
        Map { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Term, &Term)> {
        self.entries.values().map(|(k, v)| (k, v))
    }

    pub fn encoded_entries(&self) -> impl Iterator<Item = (&str, &Term, &Term)> {
        self.entries
            .iter()
            .map(|(enc, (k, v))| (enc.as_str(), k, v))
    }
}

/// A closure value: its clauses plus a snapshot of the defining scope.
#[derive(Clone)]
pub struct AnonymousFunction {
    pub arity: usize,
    pub clauses: Rc<[FunctionClause]>,
    pub vars: Vars,
    pub unique_id: u64,
}

impl fmt::Debug for AnonymousFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#Function<{}/{}>", self.unique_id, self.arity)
    }
}

#[derive(Debug, Clone)]
pub struct ConsPattern {
    pub head: Term,
    pub tail: Term,
}

/// Deferred `left = right` node produced by a nested match expression.
#[derive(Debug, Clone)]
pub struct MatchPattern {
    pub left: Term,
    pub right: Term,
}

/// A boxed runtime value or pattern.
#[derive(Debug, Clone)]
pub enum Term {
    Atom(Spur),
    Integer(Rc<BigInt>),
    Float(f64),
    Bitstring(Rc<Bitstring>),
    List(Rc<List>),
    Tuple(Rc<Vec<Term>>),
    Map(Rc<Map>),
    AnonymousFunction(Rc<AnonymousFunction>),
    VariablePattern(Spur),
    MatchPlaceholder,
    ConsPattern(Rc<ConsPattern>),
    BitstringPattern(Rc<Vec<Segment>>),
    MatchPattern(Rc<MatchPattern>),
}

impl Term {
    // -- constructors --

    pub fn atom(name: &str) -> Term {
        Term::Atom(intern(name))
    }

    pub fn boolean(value: bool) -> Term {
        Term::atom(if value { "true" } else { "false" })
    }

    pub fn nil() -> Term {
        Term::atom("nil")
    }

    /// Module alias atom: `alias("Aaa.Bbb")` is the atom `Elixir.Aaa.Bbb`.
    pub fn alias(name: &str) -> Term {
        Term::atom(&format!("Elixir.{name}"))
    }

    pub fn integer(value: impl Into<BigInt>) -> Term {
        Term::Integer(Rc::new(value.into()))
    }

    pub fn float(value: f64) -> Term {
        Term::Float(value)
    }

    pub fn string(text: &str) -> Term {
        Term::Bitstring(Rc::new(Bitstring::from_text(text)))
    }

    /// Bitstring from a sequence of bits; any non-zero entry counts as 1.
    pub fn bitstring(bits: Vec<u8>) -> Term {
        Term::Bitstring(Rc::new(Bitstring::from_bits(bits)))
    }

    /// Bitstring built from literal segments.
    pub fn bitstring_from_segments(segments: &[Segment]) -> Result<Term, Error> {
        Ok(Term::Bitstring(Rc::new(
            crate::bitstring::encode_segments(segments)?,
        )))
    }

    pub fn list(items: Vec<Term>) -> Term {
        Term::List(Rc::new(List {
            items,
            is_proper: true,
        }))
    }

    /// Improper list `[a, b | tail]`, where the last item is the tail.
    ///
    /// A list tail is spliced in, so `[1 | [2]]` is the proper list `[1, 2]`.
    pub fn improper_list(mut items: Vec<Term>) -> Result<Term, Error> {
        if items.len() < 2 {
            return Err(Error::interpreter(format!(
                "improper list must have at least 2 items, received {}",
                Term::list(items)
            )));
        }
        if let Some(Term::List(tail)) = items.last().cloned() {
            items.pop();
            items.extend(tail.items.iter().cloned());
            return Ok(Term::List(Rc::new(List {
                items,
                is_proper: tail.is_proper,
            })));
        }
        Ok(Term::List(Rc::new(List {
            items,
            is_proper: false,
        })))
    }

    pub fn tuple(items: Vec<Term>) -> Term {
        Term::Tuple(Rc::new(items))
    }

    pub fn map(pairs: Vec<(Term, Term)>) -> Term {
        Term::Map(Rc::new(Map::from_pairs(pairs)))
    }

    /// `[a: 1, b: 2]` as a list of `{atom, value}` tuples.
    pub fn keyword_list(pairs: Vec<(&str, Term)>) -> Term {
        Term::list(
            pairs
                .into_iter()
                .map(|(k, v)| Term::tuple(vec![Term::atom(k), v]))
                .collect(),
        )
    }

    /// Struct map `%Alias{...}` with the `__struct__` key set.
    pub fn struct_map(alias: &str, fields: Vec<(&str, Term)>) -> Term {
        let mut pairs = vec![(Term::atom("__struct__"), Term::alias(alias))];
        pairs.extend(fields.into_iter().map(|(k, v)| (Term::atom(k), v)));
        Term::map(pairs)
    }

    /// Exception struct with `__exception__: true` and a `message`.
    pub fn error_struct(alias: &str, message: &str) -> Term {
        Term::struct_map(
            alias,
            vec![
                ("__exception__", Term::boolean(true)),
                ("message", Term::string(message)),
            ],
        )
    }

    /// Closure over a deep snapshot of `vars`.
    pub fn anonymous_function(arity: usize, clauses: Vec<FunctionClause>, vars: &Vars) -> Term {
        Term::AnonymousFunction(Rc::new(AnonymousFunction {
            arity,
            clauses: clauses.into(),
            vars: vars.clone(),
            unique_id: next_unique_id(),
        }))
    }

    pub fn variable_pattern(name: &str) -> Term {
        Term::VariablePattern(intern(name))
    }

    pub fn match_placeholder() -> Term {
        Term::MatchPlaceholder
    }

    pub fn cons_pattern(head: Term, tail: Term) -> Term {
        Term::ConsPattern(Rc::new(ConsPattern { head, tail }))
    }

    pub fn bitstring_pattern(segments: Vec<Segment>) -> Term {
        Term::BitstringPattern(Rc::new(segments))
    }

    pub fn match_pattern(left: Term, right: Term) -> Term {
        Term::MatchPattern(Rc::new(MatchPattern { left, right }))
    }

    // -- predicates --

    pub fn type_name(&self) -> &'static str {
        match self {
            Term::Atom(_) => "atom",
            Term::Integer(_) => "integer",
            Term::Float(_) => "float",
            Term::Bitstring(_) => "bitstring",
            Term::List(_) => "list",
            Term::Tuple(_) => "tuple",
            Term::Map(_) => "map",
            Term::AnonymousFunction(_) => "anonymous_function",
            Term::VariablePattern(_) => "variable_pattern",
            Term::MatchPlaceholder => "match_placeholder",
            Term::ConsPattern(_) => "cons_pattern",
            Term::BitstringPattern(_) => "bitstring_pattern",
            Term::MatchPattern(_) => "match_pattern",
        }
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Term::Atom(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Term::Integer(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Term::Float(_))
    }

    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_bitstring(&self) -> bool {
        matches!(self, Term::Bitstring(_))
    }

    /// A bitstring whose length is a whole number of bytes.
    pub fn is_binary(&self) -> bool {
        matches!(self, Term::Bitstring(b) if b.is_binary())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Term::List(_))
    }

    pub fn is_proper_list(&self) -> bool {
        matches!(self, Term::List(l) if l.is_proper)
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, Term::Tuple(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Term::Map(_))
    }

    pub fn is_anonymous_function(&self) -> bool {
        matches!(self, Term::AnonymousFunction(_))
    }

    pub fn is_atom_named(&self, name: &str) -> bool {
        match self {
            Term::Atom(s) => with_resolved(*s, |n| n == name),
            _ => false,
        }
    }

    pub fn is_true(&self) -> bool {
        self.is_atom_named("true")
    }

    pub fn is_false(&self) -> bool {
        self.is_atom_named("false")
    }

    pub fn is_nil(&self) -> bool {
        self.is_atom_named("nil")
    }

    pub fn is_boolean(&self) -> bool {
        self.is_true() || self.is_false()
    }

    /// `false` and `nil` are falsy; everything else is truthy.
    pub fn is_falsy(&self) -> bool {
        self.is_false() || self.is_nil()
    }

    pub fn is_truthy(&self) -> bool {
        !self.is_falsy()
    }

    /// Atom starting with `Elixir.`.
    pub fn is_alias(&self) -> bool {
        match self {
            Term::Atom(s) => with_resolved(*s, |n| n.starts_with("Elixir.")),
            _ => false,
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            Term::VariablePattern(_)
                | Term::MatchPlaceholder
                | Term::ConsPattern(_)
                | Term::BitstringPattern(_)
                | Term::MatchPattern(_)
        )
    }

    /// True when a variable pattern occurs anywhere inside this term.
    pub fn has_unresolved_variable_pattern(&self) -> bool {
        match self {
            Term::VariablePattern(_) => true,
            Term::List(l) => l.items.iter().any(Term::has_unresolved_variable_pattern),
            Term::Tuple(items) => items.iter().any(Term::has_unresolved_variable_pattern),
            Term::Map(m) => m.iter().any(|(k, v)| {
                k.has_unresolved_variable_pattern() || v.has_unresolved_variable_pattern()
            }),
            Term::ConsPattern(c) => {
                c.head.has_unresolved_variable_pattern() || c.tail.has_unresolved_variable_pattern()
            }
            Term::MatchPattern(m) => {
                m.left.has_unresolved_variable_pattern() || m.right.has_unresolved_variable_pattern()
            }
            _ => false,
        }
    }

    // -- accessors --

    pub fn as_atom(&self) -> Option<String> {
        match self {
            Term::Atom(s) => Some(resolve(*s)),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Term::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// Integer or float as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Term::Integer(i) => i.to_f64(),
            Term::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bitstring(&self) -> Option<&Bitstring> {
        match self {
            Term::Bitstring(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        self.as_bitstring().and_then(Bitstring::to_text)
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Term::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Term]> {
        match self {
            Term::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Term::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_anonymous_function(&self) -> Option<&AnonymousFunction> {
        match self {
            Term::AnonymousFunction(f) => Some(f),
            _ => None,
        }
    }

    // -- equality --

    /// Same tag and deep-equal payload. `1` and `1.0` are not strictly equal.
    pub fn strictly_equals(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Atom(a), Term::Atom(b)) => a == b,
            (Term::Integer(a), Term::Integer(b)) => a == b,
            (Term::Float(a), Term::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Term::Bitstring(a), Term::Bitstring(b)) => a == b,
            (Term::List(a), Term::List(b)) => {
                a.is_proper == b.is_proper && slices_equal(&a.items, &b.items, Term::strictly_equals)
            }
            (Term::Tuple(a), Term::Tuple(b)) => slices_equal(a, b, Term::strictly_equals),
            (Term::Map(a), Term::Map(b)) => maps_equal(a, b, Term::strictly_equals),
            (Term::AnonymousFunction(a), Term::AnonymousFunction(b)) => a.unique_id == b.unique_id,
            (Term::VariablePattern(a), Term::VariablePattern(b)) => a == b,
            (Term::MatchPlaceholder, Term::MatchPlaceholder) => true,
            (Term::ConsPattern(a), Term::ConsPattern(b)) => {
                a.head.strictly_equals(&b.head) && a.tail.strictly_equals(&b.tail)
            }
            (Term::MatchPattern(a), Term::MatchPattern(b)) => {
                a.left.strictly_equals(&b.left) && a.right.strictly_equals(&b.right)
            }
            (Term::BitstringPattern(a), Term::BitstringPattern(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==` semantics: numbers compare by value, containers element-wise.
    pub fn loosely_equals(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Integer(a), Term::Float(b)) | (Term::Float(b), Term::Integer(a)) => {
                a.to_f64().is_some_and(|a| a == *b)
            }
            (Term::List(a), Term::List(b)) => {
                a.is_proper == b.is_proper && slices_equal(&a.items, &b.items, Term::loosely_equals)
            }
            (Term::Tuple(a), Term::Tuple(b)) => slices_equal(a, b, Term::loosely_equals),
            (Term::Map(a), Term::Map(b)) => maps_equal(a, b, Term::loosely_equals),
            _ => self.strictly_equals(other),
        }
    }

    /// Numeric ordering; `None` unless both terms are numbers.
    pub fn numeric_cmp(&self, other: &Term) -> Option<Ordering> {
        match (self, other) {
            (Term::Integer(a), Term::Integer(b)) => Some(a.cmp(b)),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }

    // -- map keys --

    /// Structural encoding used to identify map keys. Two terms share an
    /// encoding exactly when they are strictly equal.
    pub fn encode_map_key(&self) -> String {
        match self {
            Term::Atom(s) => with_resolved(*s, |n| format!("atom({})", escape_name(n))),
            Term::Integer(i) => format!("integer({i})"),
            // -0.0 == 0.0
            Term::Float(f) if *f == 0.0 => "float(0)".to_string(),
            Term::Float(f) => format!("float({f})"),
            Term::Bitstring(b) => {
                let bits: String = b.bits().iter().map(|bit| char::from(b'0' + bit)).collect();
                format!("bitstring({bits})")
            }
            Term::List(l) if l.is_proper => format!("list({})", encode_items(&l.items)),
            Term::List(l) => format!("improper_list({})", encode_items(&l.items)),
            Term::Tuple(items) => format!("tuple({})", encode_items(items)),
            Term::Map(m) => {
                let mut keys: Vec<String> = m
                    .encoded_entries()
                    .map(|(enc, _, v)| format!("{enc}:{}", v.encode_map_key()))
                    .collect();
                keys.sort();
                format!("map({})", keys.join(","))
            }
            Term::AnonymousFunction(f) => format!("anonymous_function({})", f.unique_id),
            Term::VariablePattern(s) => {
                with_resolved(*s, |n| format!("variable_pattern({})", escape_name(n)))
            }
            Term::MatchPlaceholder => "match_placeholder()".to_string(),
            Term::ConsPattern(c) => format!(
                "cons_pattern({},{})",
                c.head.encode_map_key(),
                c.tail.encode_map_key()
            ),
            Term::BitstringPattern(segments) => {
                format!("bitstring_pattern({:p})", Rc::as_ptr(segments))
            }
            Term::MatchPattern(m) => format!(
                "match_pattern({},{})",
                m.left.encode_map_key(),
                m.right.encode_map_key()
            ),
        }
    }
}

fn escape_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '\\' | '(' | ')' | ',' | ':') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn encode_items(items: &[Term]) -> String {
    items
        .iter()
        .map(Term::encode_map_key)
        .collect::<Vec<_>>()
        .join(",")
}

fn slices_equal(a: &[Term], b: &[Term], eq: fn(&Term, &Term) -> bool) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| eq(x, y))
}

fn maps_equal(a: &Map, b: &Map, eq: fn(&Term, &Term) -> bool) -> bool {
    a.len() == b.len()
        && a
            .encoded_entries()
            .all(|(enc, _, v)| b.get_encoded(enc).is_some_and(|w| eq(v, w)))
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.strictly_equals(other)
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Term::boolean(value)
    }
}

impl From<i32> for Term {
    fn from(value: i32) -> Self {
        Term::integer(value)
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::integer(value)
    }
}

impl From<f64> for Term {
    fn from(value: f64) -> Self {
        Term::float(value)
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Term::string(value)
    }
}

// -- numbers --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Integer,
    Float,
}

/// Bring two numbers to a common kind: both floats if either is a float.
/// `None` if either is not a number.
pub fn normalize_numbers(left: &Term, right: &Term) -> Option<(NumberKind, Term, Term)> {
    match (left, right) {
        (Term::Integer(_), Term::Integer(_)) => {
            Some((NumberKind::Integer, left.clone(), right.clone()))
        }
        _ if left.is_number() && right.is_number() => Some((
            NumberKind::Float,
            Term::float(left.as_f64()?),
            Term::float(right.as_f64()?),
        )),
        _ => None,
    }
}

// -- list helpers --

const NOT_A_NONEMPTY_LIST: &str =
    "errors were found at the given arguments:\n\n  * 1st argument: not a nonempty list\n";

/// First item of a non-empty list.
pub fn head(list: &Term) -> Result<Term, Error> {
    match list {
        Term::List(l) if !l.items.is_empty() => Ok(l.items[0].clone()),
        _ => Err(Error::argument_error(NOT_A_NONEMPTY_LIST)),
    }
}

/// Everything after the head. `tl([1 | 2])` is `2`.
pub fn tail(list: &Term) -> Result<Term, Error> {
    match list {
        Term::List(l) if !l.items.is_empty() => {
            let rest = &l.items[1..];
            if l.is_proper {
                Ok(Term::list(rest.to_vec()))
            } else if rest.len() == 1 {
                Ok(rest[0].clone())
            } else {
                Term::improper_list(rest.to_vec())
            }
        }
        _ => Err(Error::argument_error(NOT_A_NONEMPTY_LIST)),
    }
}

/// Number of elements, excluding the tail of an improper list.
pub fn count(list: &Term) -> Result<usize, Error> {
    match list {
        Term::List(l) if l.is_proper => Ok(l.items.len()),
        Term::List(l) => Ok(l.items.len() - 1),
        other => Err(Error::argument_error(format!(
            "errors were found at the given arguments:\n\n  * 1st argument: not a list\n\n(got: {other})"
        ))),
    }
}

/// `[head | tail]`: prepend to a list, or build an improper pair.
pub fn cons(head: Term, tail: Term) -> Term {
    match &tail {
        Term::List(l) => {
            let mut items = Vec::with_capacity(l.items.len() + 1);
            items.push(head);
            items.extend(l.items.iter().cloned());
            Term::List(Rc::new(List {
                items,
                is_proper: l.is_proper,
            }))
        }
        _ => Term::List(Rc::new(List {
            items: vec![head, tail],
            is_proper: false,
        })),
    }
}
