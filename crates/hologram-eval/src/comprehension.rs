use hologram_core::{Comprehension, Error, EvalContext, EvalResult, Generator, Term, Vars};

use crate::dispatch::call_named_function;
use crate::guards::evaluate_guards;
use crate::unify::is_matched;

/// Evaluate a `for` comprehension against the outer scope `vars`.
///
/// Generators are combined as nested loops, the first generator outermost.
/// A combination whose patterns or guards do not match, or that a filter
/// rejects, is skipped.
pub fn comprehension(ctx: &EvalContext, comprehension: &Comprehension, vars: &Vars) -> EvalResult {
    let sources = comprehension
        .generators
        .iter()
        .map(|generator| {
            let source = (generator.source)(ctx, vars)?;
            enumerable_to_vec(ctx, source)
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let mut combinations = Combinations::new(&sources);
    let mut visited = 0usize;
    let mut items: Vec<Term> = Vec::new();
    while let Some(combination) = combinations.next_combination() {
        visited += 1;
        let mut scoped = vars.clone();
        if !bind_generators(ctx, &comprehension.generators, combination, &mut scoped)? {
            continue;
        }
        if !filters_pass(ctx, comprehension, &scoped)? {
            continue;
        }
        let item = (comprehension.mapper)(ctx, &scoped)?;
        if comprehension.unique && items.iter().any(|kept| kept.strictly_equals(&item)) {
            continue;
        }
        items.push(item);
    }
    tracing::trace!(combinations = visited, items = items.len(), "comprehension done");

    call_named_function(
        ctx,
        "Elixir.Enum",
        "into",
        vec![Term::list(items), comprehension.collectable.clone()],
    )
}

fn enumerable_to_vec(ctx: &EvalContext, source: Term) -> Result<Vec<Term>, Error> {
    let list = call_named_function(ctx, "Elixir.Enum", "to_list", vec![source])?;
    match list {
        Term::List(l) if l.is_proper => Ok(l.items.clone()),
        other => Err(Error::interpreter(format!(
            "Enum.to_list/1 returned a non-list: {other}"
        ))),
    }
}

fn bind_generators(
    ctx: &EvalContext,
    generators: &[Generator],
    combination: &[Term],
    vars: &mut Vars,
) -> Result<bool, Error> {
    for (generator, item) in generators.iter().zip(combination) {
        if !is_matched(&generator.pattern, item, vars)? {
            return Ok(false);
        }
        if !evaluate_guards(ctx, &generator.guards, vars)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn filters_pass(ctx: &EvalContext, comprehension: &Comprehension, vars: &Vars) -> Result<bool, Error> {
    for filter in &comprehension.filters {
        if filter(ctx, vars)?.is_falsy() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Walks the cartesian product of `sources` one combination at a time, the
/// last source varying fastest. No sources, no combinations.
struct Combinations<'a> {
    sources: &'a [Vec<Term>],
    indices: Vec<usize>,
    current: Vec<Term>,
    done: bool,
}

impl<'a> Combinations<'a> {
    fn new(sources: &'a [Vec<Term>]) -> Self {
        let done = sources.is_empty() || sources.iter().any(Vec::is_empty);
        Combinations {
            sources,
            indices: vec![0; sources.len()],
            current: Vec::with_capacity(sources.len()),
            done,
        }
    }

    fn next_combination(&mut self) -> Option<&[Term]> {
        if self.done {
            return None;
        }
        self.current.clear();
        self.current.extend(
            self.sources
                .iter()
                .zip(&self.indices)
                .map(|(source, &i)| source[i].clone()),
        );
        self.advance();
        Some(&self.current)
    }

    fn advance(&mut self) {
        for position in (0..self.indices.len()).rev() {
            self.indices[position] += 1;
            if self.indices[position] < self.sources[position].len() {
                return;
            }
            self.indices[position] = 0;
        }
        self.done = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(ns: &[i64]) -> Vec<Term> {
        ns.iter().map(|n| Term::integer(*n)).collect()
    }

    fn collect(sources: &[Vec<Term>]) -> Vec<Vec<Term>> {
        let mut combinations = Combinations::new(sources);
        let mut out = Vec::new();
        while let Some(combination) = combinations.next_combination() {
            out.push(combination.to_vec());
        }
        out
    }

    #[test]
    fn test_combinations_order() {
        assert_eq!(
            collect(&[ints(&[1, 2]), ints(&[3, 4])]),
            vec![ints(&[1, 3]), ints(&[1, 4]), ints(&[2, 3]), ints(&[2, 4])]
        );
        assert_eq!(
            collect(&[ints(&[1]), ints(&[2, 3]), ints(&[4])]),
            vec![ints(&[1, 2, 4]), ints(&[1, 3, 4])]
        );
    }

    #[test]
    fn test_combinations_empty_source() {
        assert!(collect(&[ints(&[1, 2]), vec![]]).is_empty());
        assert!(collect(&[]).is_empty());
    }

    #[test]
    fn test_missing_enum_is_undefined() {
        let ctx = EvalContext::default();
        let comprehension = Comprehension::new(
            vec![Generator::new(Term::variable_pattern("x"), |_, _| {
                Ok(Term::list(ints(&[1])))
            })],
            |_, vars| Ok(vars.get("x").cloned().unwrap_or_else(Term::nil)),
        );
        let err = super::comprehension(&ctx, &comprehension, &Vars::new()).unwrap_err();
        assert!(err.is_exception("UndefinedFunctionError"));
    }
}
