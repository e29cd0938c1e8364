use crate::inspect::inspect_module_name;
use crate::term::Term;

/// Check arity of a builtin's arguments, raising an interpreter error on mismatch.
///
/// ```ignore
/// check_arity!(args, ":erlang.hd", 1);
/// ```
#[macro_export]
macro_rules! check_arity {
    ($args:expr, $name:expr, $exact:literal) => {
        if $args.len() != $exact {
            return Err($crate::Error::arity($name, $exact, $args.len()));
        }
    };
}

/// A language-level exception: a struct map with `__struct__`,
/// `__exception__: true` and a `message`.
#[derive(Debug, Clone)]
pub struct Exception {
    term: Term,
}

impl Exception {
    pub fn new(alias: &str, message: &str) -> Self {
        Exception {
            term: Term::error_struct(alias, message),
        }
    }

    /// Wrap an already built exception struct.
    pub fn from_term(term: Term) -> Self {
        Exception { term }
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    /// Struct alias as rendered by `inspect`, e.g. `MatchError`.
    pub fn struct_name(&self) -> String {
        self.term
            .as_map()
            .and_then(|m| m.get(&Term::atom("__struct__")))
            .and_then(Term::as_atom)
            .map(|name| inspect_module_name(&name))
            .unwrap_or_default()
    }

    pub fn message(&self) -> String {
        self.term
            .as_map()
            .and_then(|m| m.get(&Term::atom("message")))
            .and_then(Term::as_text)
            .unwrap_or_default()
    }

    /// Host-level form: `__hologram__:` followed by the serialized struct.
    pub fn payload(&self) -> String {
        match crate::json::serialize(&self.term) {
            Ok(json) => format!("__hologram__:{json}"),
            Err(e) => format!("__hologram__:{e}"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("({}) {}", .0.struct_name(), .0.message())]
    Raised(Exception),

    #[error("Interpreter error: {0}")]
    Interpreter(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{inner}")]
    WithContext {
        inner: Box<Error>,
        hint: Option<String>,
    },
}

impl Error {
    /// Raise `%Alias{message: message}`.
    pub fn raise(alias: &str, message: impl AsRef<str>) -> Self {
        Error::Raised(Exception::new(alias, message.as_ref()))
    }

    pub fn interpreter(msg: impl Into<String>) -> Self {
        Error::Interpreter(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Error::Serialization(msg.into())
    }

    pub fn arity(name: &str, expected: usize, got: usize) -> Self {
        Error::Interpreter(format!("{name} expects {expected} args, got {got}"))
    }

    pub fn match_error(right: &Term) -> Self {
        Error::raise(
            "MatchError",
            format!("no match of right hand side value: {right}"),
        )
    }

    pub fn function_clause_error(msg: impl AsRef<str>) -> Self {
        Error::raise("FunctionClauseError", msg)
    }

    pub fn undefined_function_error(module: &str, function: &str, arity: usize) -> Self {
        Error::raise(
            "UndefinedFunctionError",
            format!(
                "function {}.{function}/{arity} is undefined or private",
                inspect_module_name(module)
            ),
        )
    }

    pub fn case_clause_error(scrutinee: &Term) -> Self {
        Error::raise(
            "CaseClauseError",
            format!("no case clause matching: {scrutinee}"),
        )
    }

    pub fn cond_clause_error() -> Self {
        Error::raise("CondClauseError", "no cond clause evaluated to a truthy value")
    }

    pub fn argument_error(msg: impl AsRef<str>) -> Self {
        Error::raise("ArgumentError", msg)
    }

    pub fn bad_map_error(term: &Term) -> Self {
        Error::raise("BadMapError", format!("expected a map, got: {term}"))
    }

    pub fn bad_function_error(term: &Term) -> Self {
        Error::raise("BadFunctionError", format!("expected a function, got: {term}"))
    }

    pub fn key_error(key: &Term, map: &Term) -> Self {
        Error::raise("KeyError", format!("key {key} not found in: {map}"))
    }

    pub fn compile_error(msg: impl AsRef<str>) -> Self {
        Error::raise("CompileError", msg)
    }

    /// Attach a hint (actionable suggestion) to this error.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        match self {
            Error::WithContext { inner, .. } => Error::WithContext {
                inner,
                hint: Some(hint.into()),
            },
            other => Error::WithContext {
                inner: Box::new(other),
                hint: Some(hint.into()),
            },
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            Error::WithContext { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    pub fn inner(&self) -> &Error {
        match self {
            Error::WithContext { inner, .. } => inner.inner(),
            other => other,
        }
    }

    /// The raised exception, looking through any context wrapper.
    pub fn exception(&self) -> Option<&Exception> {
        match self.inner() {
            Error::Raised(exception) => Some(exception),
            _ => None,
        }
    }

    /// e.g. `Some("MatchError")` for a raised match error.
    pub fn exception_struct_name(&self) -> Option<String> {
        self.exception().map(Exception::struct_name)
    }

    pub fn exception_message(&self) -> Option<String> {
        self.exception().map(Exception::message)
    }

    /// Whether this is a raised exception of the given alias.
    pub fn is_exception(&self, alias: &str) -> bool {
        self.exception_struct_name().as_deref() == Some(alias)
    }
}
