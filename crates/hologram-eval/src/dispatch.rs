use hologram_core::{
    CaseClause, CondClause, Definition, Error, EvalContext, EvalResult, FunctionClause,
    FunctionKey, Term, Vars,
};

use crate::guards::evaluate_guards;
use crate::unify::is_matched;

/// Call an anonymous function. Each clause starts from the scope captured
/// when the function was created.
pub fn call_anonymous_function(ctx: &EvalContext, fun: &Term, args: Vec<Term>) -> EvalResult {
    let Term::AnonymousFunction(fun) = fun else {
        return Err(Error::bad_function_error(fun));
    };
    let args = Term::list(args);

    for (index, clause) in fun.clauses.iter().enumerate() {
        let mut vars = fun.vars.clone();
        if try_clause(ctx, clause, &args, &mut vars, index)? {
            return (clause.body)(ctx, &mut vars);
        }
    }

    Err(Error::function_clause_error(format!(
        "no function clause matching in anonymous fn/{}",
        fun.arity
    )))
}

/// Call `module.function(args...)` through the registry.
pub fn call_named_function(
    ctx: &EvalContext,
    module: &str,
    function: &str,
    args: Vec<Term>,
) -> EvalResult {
    let arity = args.len();
    let Some(definition) = ctx.registry().lookup(module, function, arity) else {
        return Err(Error::undefined_function_error(module, function, arity));
    };
    let key = FunctionKey::new(module, function, arity);

    ctx.enter_call(&key)?;
    let result = match definition {
        Definition::Native(native) => (native.func)(ctx, &args),
        Definition::Clauses(clauses) => dispatch_function_clauses(ctx, &key, clauses, args),
        Definition::NotImplemented => Err(Error::interpreter(format!(
            "Function {key} is not yet ported."
        ))),
    };
    ctx.exit_call();
    result
}

fn dispatch_function_clauses(
    ctx: &EvalContext,
    key: &FunctionKey,
    clauses: &[FunctionClause],
    args: Vec<Term>,
) -> EvalResult {
    let arity = args.len();
    if !clauses.iter().any(|clause| clause.arity() == arity) {
        return Err(Error::undefined_function_error(
            &hologram_core::resolve(key.module),
            &hologram_core::resolve(key.function),
            arity,
        ));
    }
    let args = Term::list(args);

    for (index, clause) in clauses.iter().enumerate() {
        if clause.arity() != arity {
            continue;
        }
        let mut vars = Vars::new();
        if try_clause(ctx, clause, &args, &mut vars, index)? {
            return (clause.body)(ctx, &mut vars);
        }
    }

    Err(Error::function_clause_error(format!(
        "no function clause matching in {key}"
    )))
}

/// Match the argument list and guards of one clause.
fn try_clause(
    ctx: &EvalContext,
    clause: &FunctionClause,
    args: &Term,
    vars: &mut Vars,
    index: usize,
) -> Result<bool, Error> {
    let params = Term::list(clause.params(vars));
    if !is_matched(&params, args, vars)? {
        tracing::trace!(clause = index, "function clause pattern did not match");
        return Ok(false);
    }
    if !evaluate_guards(ctx, &clause.guards, vars)? {
        tracing::trace!(clause = index, "function clause guards failed");
        return Ok(false);
    }
    Ok(true)
}

/// `case condition do ... end`
pub fn case(ctx: &EvalContext, condition: &Term, clauses: &[CaseClause], vars: &Vars) -> EvalResult {
    for (index, clause) in clauses.iter().enumerate() {
        let mut scoped = vars.clone();
        if !is_matched(&clause.pattern, condition, &mut scoped)? {
            tracing::trace!(clause = index, "case clause pattern did not match");
            continue;
        }
        if !evaluate_guards(ctx, &clause.guards, &scoped)? {
            tracing::trace!(clause = index, "case clause guards failed");
            continue;
        }
        return (clause.body)(ctx, &mut scoped);
    }

    Err(Error::case_clause_error(condition))
}

/// `cond do ... end`: the first truthy condition wins.
pub fn cond(ctx: &EvalContext, clauses: &[CondClause], vars: &Vars) -> EvalResult {
    for (index, clause) in clauses.iter().enumerate() {
        let mut scoped = vars.clone();
        if (clause.condition)(ctx, &mut scoped)?.is_truthy() {
            return (clause.body)(ctx, &mut scoped);
        }
        tracing::trace!(clause = index, "cond condition was falsy");
    }

    Err(Error::cond_clause_error())
}
