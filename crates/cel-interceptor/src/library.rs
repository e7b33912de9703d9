//! Functions the filter environment adds to the standard library.

use cel_filter_core::eval::MapKey;
use cel_filter_core::{CelType, EvalError, FunctionDecl, OverloadDecl, Value};

/// Declared type of the `header` variable.
pub fn header_type() -> CelType {
    CelType::map(CelType::String, CelType::list(CelType::String))
}

/// `header.match(name, value)`.
///
/// ```text
/// header.match('x-github-event', 'push')
/// ```
///
/// The header name is compared ignoring ASCII case, the value exactly, and
/// only against the first value sent for that header. A missing header is
/// `false`, never an error.
///
/// This is the case-insensitive way to look a header up. Indexing the map
/// directly, as in `header['X-Test']`, needs the canonical MIME name, so
/// `header['x-test']` fails with a missing key even when the header was sent.
pub fn header_library() -> Vec<FunctionDecl> {
    vec![FunctionDecl::new("match").with_overload(
        OverloadDecl::method(
            "map_header_match",
            vec![header_type(), CelType::String, CelType::String],
            CelType::Bool,
        )
        .with_impl(header_match),
    )]
}

fn header_match(args: &[Value]) -> Value {
    let [Value::Map(headers), Value::String(name), Value::String(expected)] = args else {
        let kinds: Vec<&str> = args.iter().map(Value::type_name).collect();
        return Value::error(EvalError::no_matching_overload("match", &kinds));
    };
    let first = headers
        .iter()
        .find(|(key, _)| matches!(key, MapKey::String(key) if key.eq_ignore_ascii_case(name)))
        .and_then(|(_, values)| values.as_list()?.first());
    Value::Bool(matches!(first, Some(Value::String(actual)) if actual == expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(args: &[Value]) -> Value {
        let decl = &header_library()[0];
        let overload = &decl.overloads[0];
        assert!(overload.accepts(args));
        overload.implementation.as_ref().unwrap()(args)
    }

    fn headers() -> Value {
        Value::map([
            (
                MapKey::from("X-Test"),
                Value::from(vec![Value::from("test-value"), Value::from("second")]),
            ),
            (MapKey::from("X-Empty"), Value::from(Vec::new())),
        ])
    }

    #[test]
    fn name_is_case_insensitive() {
        for name in ["x-test", "X-TEST", "X-Test"] {
            assert_eq!(
                call(&[headers(), Value::from(name), Value::from("test-value")]),
                Value::Bool(true),
                "{name}"
            );
        }
    }

    #[test]
    fn value_is_exact_and_first_only() {
        assert_eq!(
            call(&[headers(), Value::from("x-test"), Value::from("TEST-VALUE")]),
            Value::Bool(false)
        );
        assert_eq!(
            call(&[headers(), Value::from("x-test"), Value::from("second")]),
            Value::Bool(false)
        );
    }

    #[test]
    fn missing_or_empty_is_false() {
        assert_eq!(
            call(&[headers(), Value::from("x-missing"), Value::from("")]),
            Value::Bool(false)
        );
        assert_eq!(
            call(&[headers(), Value::from("x-empty"), Value::from("")]),
            Value::Bool(false)
        );
    }
}
