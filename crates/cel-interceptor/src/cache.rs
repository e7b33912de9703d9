//! Compiled programs keyed by source text.

use std::sync::Arc;

use cel_filter_core::{CompileError, Env, Program};
use dashmap::DashMap;

/// Concurrent cache of successful compilations.
///
/// Entries are only valid for the environment they were compiled against,
/// so a cache belongs to exactly one interceptor.
#[derive(Debug, Default)]
pub struct ProgramCache {
    programs: DashMap<Arc<str>, Arc<Program>>,
}

impl ProgramCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached program for `source`, compiling it on a miss.
    /// Compile errors are returned and not cached.
    pub fn get_or_compile(&self, env: &Env, source: &str) -> Result<Arc<Program>, CompileError> {
        if let Some(program) = self.programs.get(source) {
            tracing::debug!("Program cache hit");
            return Ok(Arc::clone(program.value()));
        }
        tracing::debug!(filter = source, "Program cache miss");
        let program = Arc::new(env.compile(source)?);
        self.programs
            .entry(Arc::from(source))
            .or_insert_with(|| Arc::clone(&program));
        Ok(program)
    }

    /// Number of cached programs.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Drops every cached program.
    pub fn clear(&self) {
        self.programs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::filter_env;

    #[test]
    fn caches_only_successes() {
        let cache = ProgramCache::new();
        let env = filter_env();

        let first = cache.get_or_compile(&env, "body.value == 'x'").unwrap();
        let second = cache.get_or_compile(&env, "body.value == 'x'").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        assert!(cache.get_or_compile(&env, "header['X-Test").is_err());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_are_exact_source_text() {
        let cache = ProgramCache::new();
        let env = filter_env();
        cache.get_or_compile(&env, "true").unwrap();
        cache.get_or_compile(&env, "true ").unwrap();
        assert_eq!(cache.len(), 2);
    }
}
