mod enumerable;
mod erlang;
mod kernel;
mod maps;

use hologram_core::{EvalResult, RegistryBuilder, Term};

/// Register every builtin module.
pub fn register_stdlib(builder: &mut RegistryBuilder) {
    erlang::register(builder);
    maps::register(builder);
    enumerable::register(builder);
    kernel::register(builder);
    tracing::debug!(definitions = builder.len(), "stdlib registered");
}

fn register_fn(
    builder: &mut RegistryBuilder,
    module: &str,
    name: &str,
    arity: usize,
    f: impl Fn(&[Term]) -> EvalResult + 'static,
) {
    builder.define_native(module, name, arity, move |_ctx, args| f(args));
}
