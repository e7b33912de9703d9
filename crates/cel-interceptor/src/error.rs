//! Errors surfaced to the caller of the interceptor.

use std::fmt;

use cel_filter_core::{CompileError, EvalError, Value};

/// Result type for interceptor operations.
pub type Result<T> = std::result::Result<T, InterceptorError>;

/// The stage of a filter decision that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Decode,
    Compile,
    Evaluate,
    Usage,
}

impl Stage {
    /// Lower-case stage name, as logged.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::Compile => "compile",
            Stage::Evaluate => "evaluate",
            Stage::Usage => "usage",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an event could be neither passed nor rejected.
///
/// Every variant is final for the event that caused it; none of them affect
/// later events.
#[derive(Debug, thiserror::Error)]
pub enum InterceptorError {
    #[error("failed to decode request body: {0}")]
    BodyDecode(#[from] serde_json::Error),

    #[error("failed to compile filter: {0}")]
    Compile(#[from] CompileError),

    #[error("failed to evaluate filter: {0}")]
    Evaluate(#[from] EvalError),

    /// The filter evaluated cleanly to something other than a bool.
    #[error("filter must evaluate to bool, got {}: {value}", .value.type_name())]
    Usage { value: Value },
}

impl InterceptorError {
    /// The stage of the decision that failed.
    pub fn stage(&self) -> Stage {
        match self {
            InterceptorError::BodyDecode(_) => Stage::Decode,
            InterceptorError::Compile(_) => Stage::Compile,
            InterceptorError::Evaluate(_) => Stage::Evaluate,
            InterceptorError::Usage { .. } => Stage::Usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_error_names_the_type() {
        let err = InterceptorError::Usage {
            value: Value::from("testing"),
        };
        assert_eq!(err.stage(), Stage::Usage);
        assert_eq!(
            err.to_string(),
            "filter must evaluate to bool, got string: \"testing\""
        );
    }

    #[test]
    fn decode_errors_convert() {
        let err: InterceptorError = serde_json::from_slice::<serde_json::Value>(b"{]")
            .unwrap_err()
            .into();
        assert_eq!(err.stage(), Stage::Decode);
        assert_eq!(err.stage().to_string(), "decode");
    }
}
