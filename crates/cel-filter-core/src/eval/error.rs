//! Runtime evaluation errors.
//!
//! Evaluation never panics or returns early: a failure becomes a
//! `Value::Error` carrying one of these, and the caller decides what to do.

/// An error raised while evaluating an expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    DivisionByZero,
    ModuloByZero,
    Overflow,
    UnknownIdentifier,
    IndexOutOfBounds,
    KeyNotFound,
    InvalidArgument,
    NoMatchingOverload,
    InvalidConversion,
}

impl EvalError {
    /// An error of `kind` with a human-readable `message`.
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn division_by_zero() -> Self {
        Self::new(EvalErrorKind::DivisionByZero, "division by zero")
    }

    pub fn modulo_by_zero() -> Self {
        Self::new(EvalErrorKind::ModuloByZero, "modulus by zero")
    }

    /// Integer `operation` overflowed.
    pub fn overflow(operation: &str) -> Self {
        Self::new(
            EvalErrorKind::Overflow,
            format!("{operation} return error for overflow"),
        )
    }

    pub fn unknown_identifier(name: &str) -> Self {
        Self::new(
            EvalErrorKind::UnknownIdentifier,
            format!("no such attribute: {name}"),
        )
    }

    /// List index `index` on a list of `len` elements.
    pub fn index_out_of_bounds(index: impl std::fmt::Display, len: usize) -> Self {
        Self::new(
            EvalErrorKind::IndexOutOfBounds,
            format!("index out of range: {index} (size {len})"),
        )
    }

    /// Map access with a key the map does not hold.
    pub fn key_not_found(key: impl std::fmt::Display) -> Self {
        Self::new(EvalErrorKind::KeyNotFound, format!("no such key: {key}"))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::InvalidArgument, message)
    }

    /// `function` applied to arguments of the listed runtime types.
    pub fn no_matching_overload(function: &str, arg_types: &[&str]) -> Self {
        Self::new(
            EvalErrorKind::NoMatchingOverload,
            format!(
                "no such overload: {function}({})",
                arg_types.join(", ")
            ),
        )
    }

    pub fn invalid_conversion(from: &str, to: &str) -> Self {
        Self::new(
            EvalErrorKind::InvalidConversion,
            format!("type conversion error from '{from}' to '{to}'"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(EvalError::key_not_found("\"X-Test\"").to_string(), "no such key: \"X-Test\"");
        assert_eq!(
            EvalError::no_matching_overload("_+_", &["string", "int"]).to_string(),
            "no such overload: _+_(string, int)"
        );
        assert_eq!(EvalError::overflow("addition").kind, EvalErrorKind::Overflow);
    }
}
