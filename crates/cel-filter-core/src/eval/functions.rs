//! Function lookup and runtime dispatch.

use std::collections::HashMap;

use super::{EvalError, Value};
use crate::decls::{FunctionDecl, OverloadDecl};

/// All declared functions, keyed by name.
///
/// The checker resolves calls against the declarations; the evaluator picks
/// the first overload whose parameter kinds accept the runtime arguments.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDecl>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `decl`, merging overloads with an existing function of the same name.
    pub fn register(&mut self, decl: FunctionDecl) {
        match self.functions.get_mut(&decl.name) {
            Some(existing) => existing.merge(decl),
            None => {
                self.functions.insert(decl.name.clone(), decl);
            }
        }
    }

    /// The declaration of `name` with every overload.
    pub fn get(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn find_overload(&self, name: &str, is_member: bool, args: &[Value]) -> Option<&OverloadDecl> {
        self.functions.get(name)?.overloads.iter().find(|o| {
            o.is_member == is_member && o.implementation.is_some() && o.accepts(args)
        })
    }

    /// Calls `name` on already-evaluated, error-free `args` (receiver first
    /// for member calls).
    pub fn dispatch(&self, name: &str, is_member: bool, args: &[Value]) -> Value {
        match self
            .find_overload(name, is_member, args)
            .and_then(|o| o.implementation.as_ref())
        {
            Some(implementation) => implementation(args),
            None => {
                let kinds: Vec<&str> = args.iter().map(Value::type_name).collect();
                Value::error(EvalError::no_matching_overload(name, &kinds))
            }
        }
    }
}

impl FromIterator<FunctionDecl> for FunctionRegistry {
    fn from_iter<I: IntoIterator<Item = FunctionDecl>>(iter: I) -> Self {
        let mut registry = Self::new();
        for decl in iter {
            registry.register(decl);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::EvalErrorKind;
    use crate::types::CelType;

    fn registry() -> FunctionRegistry {
        [FunctionDecl::new("twice")
            .with_overload(
                OverloadDecl::function("twice_int", vec![CelType::Int], CelType::Int)
                    .with_impl(|args| Value::Int(args[0].as_int().unwrap_or_default() * 2)),
            )
            .with_overload(
                OverloadDecl::method("string_twice", vec![CelType::String], CelType::String)
                    .with_impl(|args| Value::from(args[0].as_str().unwrap_or_default().repeat(2))),
            )]
        .into_iter()
        .collect()
    }

    #[test]
    fn dispatches_by_style_and_kind() {
        let registry = registry();
        assert_eq!(registry.dispatch("twice", false, &[Value::Int(4)]), Value::Int(8));
        assert_eq!(
            registry.dispatch("twice", true, &[Value::from("ab")]),
            Value::from("abab")
        );
    }

    #[test]
    fn mismatch_is_an_error_value() {
        let registry = registry();
        let result = registry.dispatch("twice", false, &[Value::from("ab")]);
        let err = result.as_error().unwrap();
        assert_eq!(err.kind, EvalErrorKind::NoMatchingOverload);
        assert_eq!(err.message, "no such overload: twice(string)");
    }
}
