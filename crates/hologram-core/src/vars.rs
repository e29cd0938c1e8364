use lasso::Spur;

use crate::term::{intern, resolve, Term};

type Bindings = im::HashMap<Spur, Term>;

/// Variable bindings for one scope.
///
/// Backed by persistent maps, so `clone()` is a constant-time snapshot and a
/// failed clause attempt never leaks into the scope it was cloned from. The
/// `matched` map lives only for the duration of one root match and records
/// every variable bound by it, so a repeated variable must match an equal
/// term.
#[derive(Debug, Clone, Default)]
pub struct Vars {
    bindings: Bindings,
    matched: Option<Bindings>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, Term)>) -> Self {
        let mut vars = Vars::new();
        for (name, term) in pairs {
            vars.set(name, term);
        }
        vars
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        self.bindings.get(&intern(name))
    }

    pub fn get_spur(&self, name: Spur) -> Option<&Term> {
        self.bindings.get(&name)
    }

    pub fn set(&mut self, name: &str, term: Term) {
        self.bindings.insert(intern(name), term);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(&intern(name))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings sorted by name.
    pub fn to_sorted_vec(&self) -> Vec<(String, Term)> {
        let mut pairs: Vec<(String, Term)> = self
            .bindings
            .iter()
            .map(|(k, v)| (resolve(*k), v.clone()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    // -- root match bookkeeping --

    /// Start tracking matched variables unless a match is already in progress.
    pub fn begin_match(&mut self) {
        if self.matched.is_none() {
            self.matched = Some(Bindings::new());
        }
    }

    /// Drop the matched-variable record at the end of a root match.
    pub fn finish_match(&mut self) {
        self.matched = None;
    }

    pub fn is_matching(&self) -> bool {
        self.matched.is_some()
    }

    /// Value already bound to `name` by the current root match.
    pub fn matched(&self, name: Spur) -> Option<&Term> {
        self.matched.as_ref().and_then(|m| m.get(&name))
    }

    /// Bind `name` in the scope and in the current match record.
    pub fn bind_matched(&mut self, name: Spur, term: Term) {
        self.matched
            .get_or_insert_with(Bindings::new)
            .insert(name, term.clone());
        self.bindings.insert(name, term);
    }
}
