//! The process-wide filter environment.

use std::sync::{Arc, LazyLock};

use cel_filter_core::{CelType, Env};

use crate::library::{header_library, header_type};

static FILTER_ENV: LazyLock<Arc<Env>> = LazyLock::new(|| Arc::new(build_filter_env()));

/// Shared environment every filter is compiled against: the standard
/// library, the header library, `body: dyn` and
/// `header: map(string, list(string))`.
pub fn filter_env() -> Arc<Env> {
    Arc::clone(&FILTER_ENV)
}

/// A fresh, unshared copy of the filter environment, for callers that want
/// to add declarations of their own.
pub fn build_filter_env() -> Env {
    header_library().into_iter().fold(
        Env::with_standard_library()
            .with_variable("body", CelType::Dyn)
            .with_variable("header", header_type()),
        Env::with_function,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_body_and_header() {
        let env = filter_env();
        assert_eq!(env.variables().len(), 2);
        assert_eq!(env.variables()["body"], CelType::Dyn);
        assert!(env.functions().contains("match"));
        assert!(env.functions().contains("size"));
    }

    #[test]
    fn is_shared() {
        assert!(Arc::ptr_eq(&filter_env(), &filter_env()));
    }

    #[test]
    fn rejects_undeclared_variables() {
        assert!(filter_env().compile("request.url == ''").is_err());
        assert!(filter_env().compile("header.match('x-test', 'v')").is_ok());
    }
}
