use std::fmt;
use std::rc::Rc;

use crate::context::EvalContext;
use crate::error::Error;
use crate::term::Term;
use crate::vars::Vars;

pub type EvalResult = Result<Term, Error>;

/// Read-only expression over a scope: guards, generator sources, filters
/// and mappers.
pub type Expr = Rc<dyn Fn(&EvalContext, &Vars) -> EvalResult>;

/// Clause body or `cond` condition; may bind further variables.
pub type Body = Rc<dyn Fn(&EvalContext, &mut Vars) -> EvalResult>;

/// Parameter patterns of a function clause.
#[derive(Clone)]
pub enum Params {
    Fixed(Vec<Term>),
    /// Patterns built from the scope at call time (pinned outer variables).
    Scoped {
        arity: usize,
        build: Rc<dyn Fn(&Vars) -> Vec<Term>>,
    },
}

#[derive(Clone)]
pub struct FunctionClause {
    pub params: Params,
    pub guards: Vec<Expr>,
    pub body: Body,
}

impl FunctionClause {
    pub fn new(
        params: Vec<Term>,
        body: impl Fn(&EvalContext, &mut Vars) -> EvalResult + 'static,
    ) -> Self {
        FunctionClause {
            params: Params::Fixed(params),
            guards: Vec::new(),
            body: Rc::new(body),
        }
    }

    pub fn scoped(
        arity: usize,
        params: impl Fn(&Vars) -> Vec<Term> + 'static,
        body: impl Fn(&EvalContext, &mut Vars) -> EvalResult + 'static,
    ) -> Self {
        FunctionClause {
            params: Params::Scoped {
                arity,
                build: Rc::new(params),
            },
            guards: Vec::new(),
            body: Rc::new(body),
        }
    }

    /// Add a `when` guard. Guards are alternatives: the clause is taken if any
    /// of them returns `true`.
    pub fn with_guard(
        mut self,
        guard: impl Fn(&EvalContext, &Vars) -> EvalResult + 'static,
    ) -> Self {
        self.guards.push(Rc::new(guard));
        self
    }

    pub fn arity(&self) -> usize {
        match &self.params {
            Params::Fixed(params) => params.len(),
            Params::Scoped { arity, .. } => *arity,
        }
    }

    pub fn params(&self, vars: &Vars) -> Vec<Term> {
        match &self.params {
            Params::Fixed(params) => params.clone(),
            Params::Scoped { build, .. } => build(vars),
        }
    }
}

impl fmt::Debug for FunctionClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionClause")
            .field("arity", &self.arity())
            .field("guards", &self.guards.len())
            .finish()
    }
}

#[derive(Clone)]
pub struct CaseClause {
    pub pattern: Term,
    pub guards: Vec<Expr>,
    pub body: Body,
}

impl CaseClause {
    pub fn new(
        pattern: Term,
        body: impl Fn(&EvalContext, &mut Vars) -> EvalResult + 'static,
    ) -> Self {
        CaseClause {
            pattern,
            guards: Vec::new(),
            body: Rc::new(body),
        }
    }

    pub fn with_guard(
        mut self,
        guard: impl Fn(&EvalContext, &Vars) -> EvalResult + 'static,
    ) -> Self {
        self.guards.push(Rc::new(guard));
        self
    }
}

#[derive(Clone)]
pub struct CondClause {
    pub condition: Body,
    pub body: Body,
}

impl CondClause {
    pub fn new(
        condition: impl Fn(&EvalContext, &mut Vars) -> EvalResult + 'static,
        body: impl Fn(&EvalContext, &mut Vars) -> EvalResult + 'static,
    ) -> Self {
        CondClause {
            condition: Rc::new(condition),
            body: Rc::new(body),
        }
    }
}

/// `pattern <- source` inside a comprehension.
#[derive(Clone)]
pub struct Generator {
    pub pattern: Term,
    pub guards: Vec<Expr>,
    pub source: Expr,
}

impl Generator {
    pub fn new(
        pattern: Term,
        source: impl Fn(&EvalContext, &Vars) -> EvalResult + 'static,
    ) -> Self {
        Generator {
            pattern,
            guards: Vec::new(),
            source: Rc::new(source),
        }
    }

    pub fn with_guard(
        mut self,
        guard: impl Fn(&EvalContext, &Vars) -> EvalResult + 'static,
    ) -> Self {
        self.guards.push(Rc::new(guard));
        self
    }
}

/// A `for` expression: generators, filters, `into:` target and `uniq:` flag.
#[derive(Clone)]
pub struct Comprehension {
    pub generators: Vec<Generator>,
    pub filters: Vec<Expr>,
    pub collectable: Term,
    pub unique: bool,
    pub mapper: Expr,
}

impl Comprehension {
    pub fn new(
        generators: Vec<Generator>,
        mapper: impl Fn(&EvalContext, &Vars) -> EvalResult + 'static,
    ) -> Self {
        Comprehension {
            generators,
            filters: Vec::new(),
            collectable: Term::list(Vec::new()),
            unique: false,
            mapper: Rc::new(mapper),
        }
    }

    pub fn with_filter(
        mut self,
        filter: impl Fn(&EvalContext, &Vars) -> EvalResult + 'static,
    ) -> Self {
        self.filters.push(Rc::new(filter));
        self
    }

    pub fn into_collectable(mut self, collectable: Term) -> Self {
        self.collectable = collectable;
        self
    }

    pub fn uniq(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }
}
