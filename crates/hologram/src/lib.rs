//! Hologram: an embeddable interpreter core for boxed Elixir terms.
//!
//! The interpreter does not parse source code. Callers build terms,
//! patterns and clauses directly and hand them to the matching and
//! dispatch entry points.
//!
//! # Quick Start
//!
//! ```no_run
//! use hologram::{FunctionClause, Interpreter, Term};
//!
//! let interp = Interpreter::builder()
//!     .define_function(
//!         "Elixir.Math",
//!         "double",
//!         1,
//!         vec![FunctionClause::new(vec![Term::variable_pattern("x")], |ctx, vars| {
//!             let x = vars.get("x").cloned().unwrap_or_else(Term::nil);
//!             hologram::call_named_function(ctx, "erlang", "+", vec![x.clone(), x])
//!         })],
//!     )
//!     .build();
//! let result = interp.call("Elixir.Math", "double", vec![Term::integer(21)]).unwrap();
//! assert_eq!(result, Term::integer(42));
//! ```

pub use hologram_core::{
    check_arity, inspect, inspect_module_name, intern, json, resolve, with_resolved, Bitstring,
    CaseClause, Comprehension, CondClause, Definition, Endianness, Error, EvalContext, EvalResult,
    Exception, Expr, FunctionClause, FunctionKey, Generator, Params, Registry, RegistryBuilder,
    Segment, SegmentType, Term, Vars,
};
pub use hologram_eval::{
    call_anonymous_function, call_named_function, cons_operator, dot_operator, evaluate_guards,
    is_matched, loose_equal, strict_equal,
};

pub type Result<T> = std::result::Result<T, Error>;

/// Builder for configuring and constructing an [`Interpreter`].
///
/// The standard library is registered by default. Definitions added here
/// replace stdlib entries with the same key.
pub struct InterpreterBuilder {
    stdlib: bool,
    max_call_depth: Option<usize>,
    definitions: RegistryBuilder,
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self {
            stdlib: true,
            max_call_depth: None,
            definitions: RegistryBuilder::new(),
        }
    }

    /// Enable or disable the standard library (default: `true`).
    pub fn with_stdlib(mut self, enable: bool) -> Self {
        self.stdlib = enable;
        self
    }

    pub fn without_stdlib(self) -> Self {
        self.with_stdlib(false)
    }

    /// Limit nested named calls (default: 10 000).
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = Some(depth);
        self
    }

    /// Define `module.function/arity` from its clauses.
    pub fn define_function(
        mut self,
        module: &str,
        function: &str,
        arity: usize,
        clauses: Vec<FunctionClause>,
    ) -> Self {
        self.definitions
            .define_function(module, function, arity, clauses);
        self
    }

    /// Define a host builtin.
    pub fn define_native<F>(mut self, module: &str, function: &str, arity: usize, f: F) -> Self
    where
        F: Fn(&EvalContext, &[Term]) -> EvalResult + 'static,
    {
        self.definitions.define_native(module, function, arity, f);
        self
    }

    pub fn define_not_implemented(mut self, module: &str, function: &str, arity: usize) -> Self {
        self.definitions
            .define_not_implemented(module, function, arity);
        self
    }

    pub fn build(self) -> Interpreter {
        let mut builder = RegistryBuilder::new();
        if self.stdlib {
            hologram_stdlib::register_stdlib(&mut builder);
        }
        builder.merge(self.definitions);

        let mut ctx = EvalContext::new(builder.build());
        if let Some(depth) = self.max_call_depth {
            ctx = ctx.with_max_call_depth(depth);
        }
        Interpreter { ctx }
    }
}

/// An interpreter instance: a frozen function registry plus call state.
pub struct Interpreter {
    ctx: EvalContext,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter with the standard library and nothing else.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    pub fn ctx(&self) -> &EvalContext {
        &self.ctx
    }

    /// Call `module.function(args...)`. `module` is the full atom name,
    /// e.g. `Elixir.Aaa.Bbb` or `erlang`.
    pub fn call(&self, module: &str, function: &str, args: Vec<Term>) -> EvalResult {
        call_named_function(&self.ctx, module, function, args)
    }

    pub fn call_anonymous(&self, fun: &Term, args: Vec<Term>) -> EvalResult {
        call_anonymous_function(&self.ctx, fun, args)
    }

    /// `left = right`, binding into `vars`.
    pub fn match_operator(&self, right: Term, left: &Term, vars: &mut Vars) -> EvalResult {
        hologram_eval::match_operator(right, left, vars)
    }

    pub fn case(&self, condition: &Term, clauses: &[CaseClause], vars: &Vars) -> EvalResult {
        hologram_eval::case(&self.ctx, condition, clauses, vars)
    }

    pub fn cond(&self, clauses: &[CondClause], vars: &Vars) -> EvalResult {
        hologram_eval::cond(&self.ctx, clauses, vars)
    }

    pub fn comprehension(&self, comprehension: &Comprehension, vars: &Vars) -> EvalResult {
        hologram_eval::comprehension(&self.ctx, comprehension, vars)
    }

    pub fn dot(&self, left: &Term, right: &Term) -> EvalResult {
        dot_operator(&self.ctx, left, right)
    }
}
