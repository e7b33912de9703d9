//! Function declarations shared by the checker and the evaluator.
//!
//! One `OverloadDecl` carries both the static signature the checker resolves
//! against and, optionally, the implementation the evaluator dispatches to.
//! Operators are declared without an implementation; the evaluator handles
//! them natively.

use std::sync::Arc;

use crate::eval::Value;
use crate::types::CelType;

/// Runtime body of an overload. Receives the receiver first for member
/// overloads; arguments are never errors.
pub type FunctionImpl = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

#[derive(Clone)]
pub struct OverloadDecl {
    /// Stable identifier, e.g. `size_string` or `map_header_match`.
    pub id: String,
    /// Parameter types, receiver first for member overloads.
    pub params: Vec<CelType>,
    pub result: CelType,
    pub is_member: bool,
    /// Names of the `TypeParam`s used in `params` and `result`.
    pub type_params: Vec<String>,
    pub implementation: Option<FunctionImpl>,
}

impl std::fmt::Debug for OverloadDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverloadDecl")
            .field("id", &self.id)
            .field("params", &self.params)
            .field("result", &self.result)
            .field("is_member", &self.is_member)
            .field("has_impl", &self.implementation.is_some())
            .finish()
    }
}

impl OverloadDecl {
    /// A global overload: `name(params...)`.
    pub fn function(id: impl Into<String>, params: Vec<CelType>, result: CelType) -> Self {
        Self {
            id: id.into(),
            params,
            result,
            is_member: false,
            type_params: Vec::new(),
            implementation: None,
        }
    }

    /// A member overload: `params[0].name(params[1..]...)`.
    pub fn method(id: impl Into<String>, params: Vec<CelType>, result: CelType) -> Self {
        Self {
            is_member: true,
            ..Self::function(id, params, result)
        }
    }

    /// Declares the type parameter names the signature uses.
    pub fn with_type_params(mut self, names: &[&str]) -> Self {
        self.type_params = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Attaches the runtime implementation. Receives the receiver first
    /// for methods, and never sees error values.
    pub fn with_impl<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.implementation = Some(Arc::new(f));
        self
    }

    /// Whether runtime `args` fit this overload's parameter list.
    pub fn accepts(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self
                .params
                .iter()
                .zip(args)
                .all(|(param, arg)| arg.matches_type(param))
    }
}

/// A function name with every overload declared for it.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub overloads: Vec<OverloadDecl>,
}

impl FunctionDecl {
    /// A function with no overloads yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overloads: Vec::new(),
        }
    }

    /// Adds an overload.
    pub fn with_overload(mut self, overload: OverloadDecl) -> Self {
        self.overloads.push(overload);
        self
    }

    /// Adds the overloads of `other`; an overload with an id already present
    /// replaces the existing one.
    pub fn merge(&mut self, other: FunctionDecl) {
        for overload in other.overloads {
            match self.overloads.iter_mut().find(|o| o.id == overload.id) {
                Some(existing) => *existing = overload,
                None => self.overloads.push(overload),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_replaces_by_id() {
        let mut size = FunctionDecl::new("size").with_overload(OverloadDecl::function(
            "size_string",
            vec![CelType::String],
            CelType::Int,
        ));
        size.merge(
            FunctionDecl::new("size")
                .with_overload(
                    OverloadDecl::function("size_string", vec![CelType::String], CelType::Int)
                        .with_impl(|_| Value::Int(0)),
                )
                .with_overload(OverloadDecl::method(
                    "string_size",
                    vec![CelType::String],
                    CelType::Int,
                )),
        );
        assert_eq!(size.overloads.len(), 2);
        assert!(size.overloads[0].implementation.is_some());
        assert!(size.overloads[1].is_member);
    }

    #[test]
    fn accepts_checks_runtime_kinds() {
        let contains = OverloadDecl::method(
            "string_contains_string",
            vec![CelType::String, CelType::String],
            CelType::Bool,
        );
        assert!(contains.accepts(&[Value::from("abc"), Value::from("b")]));
        assert!(!contains.accepts(&[Value::from("abc"), Value::Int(1)]));
        assert!(!contains.accepts(&[Value::from("abc")]));
    }
}
