//! Comprehension scopes.

use std::collections::HashMap;

use crate::types::CelType;

/// Stack of local bindings; inner scopes shadow outer ones and the
/// environment's declared variables.
#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    scopes: Vec<HashMap<String, CelType>>,
}

impl ScopeStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enter(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(crate) fn exit(&mut self) {
        self.scopes.pop();
    }

    /// Declares `name` in the innermost scope. A no-op outside any scope.
    pub(crate) fn declare(&mut self, name: &str, ty: CelType) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&CelType> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}
