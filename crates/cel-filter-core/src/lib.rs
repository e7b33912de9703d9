//! Type checking and evaluation for the filter expression language.
//!
//! [`Env`] holds the declarations an expression is compiled against;
//! [`Env::compile`] parses and checks source text and returns a
//! [`Program`] that can be evaluated any number of times.

pub mod checker;
pub mod decls;
pub mod env;
pub mod eval;
pub mod stdlib;
pub mod types;

pub use checker::{CheckError, CheckErrorKind, CheckResult};
pub use decls::{FunctionDecl, FunctionImpl, OverloadDecl};
pub use env::{CompileError, Env};
pub use eval::{Activation, EvalError, EvalErrorKind, MapActivation, Program, Value};
pub use types::CelType;

pub use cel_filter_parser::{ParseError, Span};
