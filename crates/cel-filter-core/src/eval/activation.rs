//! Variable bindings visible to an evaluation.

use std::collections::HashMap;

use super::Value;

/// Resolves variable names to values during evaluation.
pub trait Activation: Send + Sync {
    /// `None` if the name is not bound.
    fn resolve(&self, name: &str) -> Option<Value>;
}

/// Owned name-to-value bindings.
#[derive(Debug, Clone, Default)]
pub struct MapActivation {
    bindings: HashMap<String, Value>,
}

impl MapActivation {
    /// No bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`, replacing an earlier binding.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// In-place form of [`MapActivation::with`].
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(name.into(), value.into());
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<(String, Value)> for MapActivation {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

impl Activation for MapActivation {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }
}

/// One comprehension scope: the iteration variable and accumulator shadow
/// the enclosing bindings.
pub(crate) struct ScopedActivation<'a> {
    parent: &'a dyn Activation,
    locals: Vec<(&'a str, Value)>,
}

impl<'a> ScopedActivation<'a> {
    pub(crate) fn new(parent: &'a dyn Activation) -> Self {
        Self {
            parent,
            locals: Vec::with_capacity(2),
        }
    }

    /// Binds or rebinds `name` in this scope.
    pub(crate) fn set(&mut self, name: &'a str, value: Value) {
        match self.locals.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.locals.push((name, value)),
        }
    }

    pub(crate) fn unset(&mut self, name: &str) {
        self.locals.retain(|(n, _)| *n != name);
    }
}

impl Activation for ScopedActivation<'_> {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.locals
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
            .or_else(|| self.parent.resolve(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_shadows_parent() {
        let outer = MapActivation::new().with("x", 1i64).with("y", 2i64);
        let mut scope = ScopedActivation::new(&outer);
        scope.set("x", Value::Int(10));
        assert_eq!(scope.resolve("x"), Some(Value::Int(10)));
        assert_eq!(scope.resolve("y"), Some(Value::Int(2)));

        scope.set("x", Value::Int(11));
        assert_eq!(scope.resolve("x"), Some(Value::Int(11)));

        scope.unset("x");
        assert_eq!(scope.resolve("x"), Some(Value::Int(1)));
        assert_eq!(scope.resolve("z"), None);
    }
}
