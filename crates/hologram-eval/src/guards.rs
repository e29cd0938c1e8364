use hologram_core::{Error, EvalContext, Expr, Vars};

/// `when a when b`: passes if there are no guards or any guard returns `true`.
///
/// Only the atom `true` passes; other truthy terms do not. A guard that
/// raises aborts the whole dispatch.
pub fn evaluate_guards(ctx: &EvalContext, guards: &[Expr], vars: &Vars) -> Result<bool, Error> {
    if guards.is_empty() {
        return Ok(true);
    }
    for guard in guards {
        if guard(ctx, vars)?.is_true() {
            return Ok(true);
        }
    }
    Ok(false)
}
