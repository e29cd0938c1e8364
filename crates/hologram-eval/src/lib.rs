mod comprehension;
mod dispatch;
mod guards;
mod operators;
mod unify;

pub use comprehension::comprehension;
pub use dispatch::{call_anonymous_function, call_named_function, case, cond};
pub use guards::evaluate_guards;
pub use operators::{cons_operator, dot_operator, loose_equal, strict_equal};
pub use unify::{is_matched, match_operator};
