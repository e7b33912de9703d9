//! Type checking errors.

use cel_filter_parser::Span;

use crate::types::CelType;

/// A type error, located at the expression it was found in.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}")]
pub struct CheckError {
    pub kind: CheckErrorKind,
    pub span: Span,
    pub expr_id: i64,
}

impl CheckError {
    /// An error of `kind` at the node `expr_id` spanning `span`.
    pub fn new(kind: CheckErrorKind, span: Span, expr_id: i64) -> Self {
        Self {
            kind,
            span,
            expr_id,
        }
    }

    /// A variable or function name nothing declares.
    pub fn undeclared_reference(name: &str, span: Span, expr_id: i64) -> Self {
        Self::new(
            CheckErrorKind::UndeclaredReference {
                name: name.to_string(),
            },
            span,
            expr_id,
        )
    }

    /// A call whose argument types fit none of the function's overloads.
    pub fn no_matching_overload(
        function: &str,
        arg_types: Vec<CelType>,
        span: Span,
        expr_id: i64,
    ) -> Self {
        Self::new(
            CheckErrorKind::NoMatchingOverload {
                function: function.to_string(),
                arg_types,
            },
            span,
            expr_id,
        )
    }

    /// Field selection on a type without fields.
    pub fn undefined_field(ty: &CelType, field: &str, span: Span, expr_id: i64) -> Self {
        Self::new(
            CheckErrorKind::UndefinedField {
                type_name: ty.to_string(),
                field: field.to_string(),
            },
            span,
            expr_id,
        )
    }

    /// The message without location.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckErrorKind {
    #[error("undeclared reference to '{name}'")]
    UndeclaredReference { name: String },

    #[error(
        "no matching overload for '{function}' applied to ({})",
        type_list(.arg_types)
    )]
    NoMatchingOverload {
        function: String,
        arg_types: Vec<CelType>,
    },

    #[error("undefined field '{field}' on type '{type_name}'")]
    UndefinedField { type_name: String, field: String },

    #[error("aggregate literal contains heterogeneous types: {}", type_list(.types))]
    HeterogeneousAggregate { types: Vec<CelType> },

    /// Names starting with `__` are kept for internal bindings.
    #[error("reserved identifier '{name}'")]
    ReservedIdentifier { name: String },

    #[error("expression of type '{ty}' cannot be the range of a comprehension")]
    NotIterable { ty: CelType },
}

fn type_list(types: &[CelType]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
