use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use lasso::Spur;

use crate::clause::{EvalResult, FunctionClause};
use crate::error::Error;
use crate::inspect::inspect_module_name;
use crate::term::{intern, with_resolved, Term};

const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

/// A host builtin callable through the registry.
pub type NativeFnInner = dyn Fn(&EvalContext, &[Term]) -> EvalResult;

pub struct NativeFn {
    pub name: String,
    pub func: Box<NativeFnInner>,
}

impl NativeFn {
    pub fn simple(
        name: impl Into<String>,
        f: impl Fn(&[Term]) -> EvalResult + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(move |_ctx, args| f(args)),
        }
    }

    pub fn with_ctx(
        name: impl Into<String>,
        f: impl Fn(&EvalContext, &[Term]) -> EvalResult + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(f),
        }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native-fn {}>", self.name)
    }
}

/// `module.function/arity`, with module as the full atom name
/// (`Elixir.Aaa.Bbb`, `erlang`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionKey {
    pub module: Spur,
    pub function: Spur,
    pub arity: usize,
}

impl FunctionKey {
    pub fn new(module: &str, function: &str, arity: usize) -> Self {
        FunctionKey {
            module: intern(module),
            function: intern(function),
            arity,
        }
    }
}

impl fmt::Display for FunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let module = with_resolved(self.module, inspect_module_name);
        with_resolved(self.function, |function| {
            write!(f, "{module}.{function}/{}", self.arity)
        })
    }
}

#[derive(Debug, Clone)]
pub enum Definition {
    Clauses(Rc<[FunctionClause]>),
    Native(Rc<NativeFn>),
    NotImplemented,
}

/// Collects definitions before the registry is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    definitions: HashMap<FunctionKey, Definition>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a function from its clauses. Redefining a key replaces it.
    pub fn define_function(
        &mut self,
        module: &str,
        function: &str,
        arity: usize,
        clauses: Vec<FunctionClause>,
    ) -> &mut Self {
        let key = FunctionKey::new(module, function, arity);
        tracing::debug!(function = %key, clauses = clauses.len(), "define function");
        self.definitions
            .insert(key, Definition::Clauses(clauses.into()));
        self
    }

    pub fn define_native(
        &mut self,
        module: &str,
        function: &str,
        arity: usize,
        f: impl Fn(&EvalContext, &[Term]) -> EvalResult + 'static,
    ) -> &mut Self {
        let key = FunctionKey::new(module, function, arity);
        tracing::trace!(function = %key, "define native");
        self.definitions.insert(
            key,
            Definition::Native(Rc::new(NativeFn::with_ctx(key.to_string(), f))),
        );
        self
    }

    /// Placeholder that raises when called.
    pub fn define_not_implemented(
        &mut self,
        module: &str,
        function: &str,
        arity: usize,
    ) -> &mut Self {
        self.definitions.insert(
            FunctionKey::new(module, function, arity),
            Definition::NotImplemented,
        );
        self
    }

    /// Move every definition of `other` into this builder, replacing
    /// existing keys.
    pub fn merge(&mut self, other: RegistryBuilder) -> &mut Self {
        self.definitions.extend(other.definitions);
        self
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn build(self) -> Registry {
        tracing::debug!(definitions = self.definitions.len(), "registry built");
        Registry {
            definitions: self.definitions,
        }
    }
}

/// Read-only function table.
#[derive(Debug, Default)]
pub struct Registry {
    definitions: HashMap<FunctionKey, Definition>,
}

impl Registry {
    pub fn lookup(&self, module: &str, function: &str, arity: usize) -> Option<&Definition> {
        self.definitions
            .get(&FunctionKey::new(module, function, arity))
    }

    /// Whether any arity of `module.function` is defined.
    pub fn has_function(&self, module: &str, function: &str) -> bool {
        let (module, function) = (intern(module), intern(function));
        self.definitions
            .keys()
            .any(|k| k.module == module && k.function == function)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Shared state threaded through every dispatch, guard and body.
pub struct EvalContext {
    registry: Registry,
    call_depth: Cell<usize>,
    max_call_depth: usize,
}

impl EvalContext {
    pub fn new(registry: Registry) -> Self {
        EvalContext {
            registry,
            call_depth: Cell::new(0),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn call_depth(&self) -> usize {
        self.call_depth.get()
    }

    /// Enter a named call; fails once the depth limit is reached.
    pub fn enter_call(&self, key: &FunctionKey) -> Result<(), Error> {
        let depth = self.call_depth.get();
        if depth >= self.max_call_depth {
            return Err(Error::interpreter(format!(
                "maximum call depth ({}) exceeded in {key}",
                self.max_call_depth
            )));
        }
        self.call_depth.set(depth + 1);
        Ok(())
    }

    pub fn exit_call(&self) {
        self.call_depth.set(self.call_depth.get().saturating_sub(1));
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new(Registry::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1. Keys render with inspected module names
    #[test]
    fn test_function_key_display() {
        assert_eq!(
            FunctionKey::new("Elixir.Aaa.Bbb", "fun", 2).to_string(),
            "Aaa.Bbb.fun/2"
        );
        assert_eq!(FunctionKey::new("erlang", "+", 2).to_string(), ":erlang.+/2");
    }

    // 2. Lookup is per arity
    #[test]
    fn test_registry_lookup() {
        let mut builder = RegistryBuilder::new();
        builder.define_native("erlang", "hd", 1, |_, args| Ok(args[0].clone()));
        builder.define_not_implemented("erlang", "spawn", 1);
        let registry = builder.build();
        assert!(matches!(
            registry.lookup("erlang", "hd", 1),
            Some(Definition::Native(_))
        ));
        assert!(registry.lookup("erlang", "hd", 2).is_none());
        assert!(registry.has_function("erlang", "spawn"));
        assert!(!registry.has_function("erlang", "tl"));
    }

    // 3. Depth accounting
    #[test]
    fn test_call_depth_limit() {
        let ctx = EvalContext::default().with_max_call_depth(1);
        let key = FunctionKey::new("Elixir.A", "f", 0);
        ctx.enter_call(&key).unwrap();
        assert!(ctx.enter_call(&key).is_err());
        ctx.exit_call();
        assert_eq!(ctx.call_depth(), 0);
    }
}
