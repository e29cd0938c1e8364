pub mod bitstring;
pub mod clause;
pub mod context;
pub mod error;
pub mod inspect;
pub mod json;
pub mod term;
pub mod vars;

pub use lasso::Spur;

pub use bitstring::{Bitstring, Endianness, Segment, SegmentType};
pub use clause::{
    Body, CaseClause, Comprehension, CondClause, EvalResult, Expr, FunctionClause, Generator,
    Params,
};
pub use context::{Definition, EvalContext, FunctionKey, NativeFn, Registry, RegistryBuilder};
pub use error::{Error, Exception};
pub use inspect::{inspect, inspect_module_name};
pub use term::{
    intern, normalize_numbers, resolve, with_resolved, AnonymousFunction, List, Map, NumberKind,
    Term,
};
pub use vars::Vars;
