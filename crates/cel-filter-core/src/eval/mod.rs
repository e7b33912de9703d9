//! Runtime evaluation.
//!
//! ```
//! use cel_filter_core::{CelType, Env};
//! use cel_filter_core::eval::{MapActivation, Value};
//!
//! let env = Env::with_standard_library().with_variable("x", CelType::Int);
//! let program = env.compile("x + 1").unwrap();
//!
//! let activation = MapActivation::new().with("x", 41i64);
//! assert_eq!(program.eval(&activation), Value::Int(42));
//! ```

mod activation;
mod error;
mod evaluator;
mod functions;
mod program;
mod value;

pub use activation::{Activation, MapActivation};
pub use error::{EvalError, EvalErrorKind};
pub use functions::FunctionRegistry;
pub use program::Program;
pub use value::{MapKey, Value, ValueMap};
