//! Bindings for one event: the decoded body and the request headers.

use std::collections::BTreeMap;

use cel_filter_core::eval::{Activation, MapKey};
use cel_filter_core::Value;
use http::HeaderMap;

use crate::error::Result;

/// Decodes a JSON body into a value tree. Numbers become doubles.
pub fn decode_body(raw: &[u8]) -> Result<Value> {
    let json: serde_json::Value = serde_json::from_slice(raw)?;
    Ok(from_json(json))
}

fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::from(s),
        serde_json::Value::Array(items) => {
            Value::from(items.into_iter().map(from_json).collect::<Vec<_>>())
        }
        serde_json::Value::Object(fields) => Value::map(
            fields
                .into_iter()
                .map(|(k, v)| (MapKey::String(k.into()), from_json(v))),
        ),
    }
}

/// `content-type` becomes `Content-Type`: the first letter and every letter
/// after a hyphen upper case, the rest lower case.
pub fn canonical_header_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            mapped
        })
        .collect()
}

/// The `header` binding: canonical name to every value, in arrival order.
///
/// Keys are only ever canonical, so a lower-case index misses.
pub fn header_value(headers: &HeaderMap) -> Value {
    let mut grouped: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for (name, value) in headers {
        grouped
            .entry(canonical_header_name(name.as_str()))
            .or_default()
            .push(Value::from(String::from_utf8_lossy(value.as_bytes()).into_owned()));
    }
    Value::map(
        grouped
            .into_iter()
            .map(|(name, values)| (MapKey::String(name.into()), Value::from(values))),
    )
}

/// Exactly `body` and `header`; every other name is unbound.
#[derive(Debug, Clone)]
pub struct EventActivation {
    body: Value,
    header: Value,
}

impl EventActivation {
    /// Bindings from an already decoded body and header map.
    pub fn new(body: Value, header: Value) -> Self {
        Self { body, header }
    }

    /// Decodes `raw_body` and groups `headers`. Fails only if the body is not JSON.
    pub fn from_parts(raw_body: &[u8], headers: &HeaderMap) -> Result<Self> {
        Ok(Self::new(decode_body(raw_body)?, header_value(headers)))
    }
}

impl Activation for EventActivation {
    fn resolve(&self, name: &str) -> Option<Value> {
        match name {
            "body" => Some(self.body.clone()),
            "header" => Some(self.header.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderName, HeaderValue};

    #[test]
    fn canonical_names() {
        assert_eq!(canonical_header_name("x-test"), "X-Test");
        assert_eq!(canonical_header_name("content-type"), "Content-Type");
        assert_eq!(canonical_header_name("x-github-event"), "X-Github-Event");
        assert_eq!(canonical_header_name("etag"), "Etag");
    }

    #[test]
    fn headers_keep_every_value_in_order() {
        let mut headers = HeaderMap::new();
        let name = HeaderName::from_static("x-test");
        headers.append(&name, HeaderValue::from_static("one"));
        headers.append(&name, HeaderValue::from_static("two"));

        let value = header_value(&headers);
        let values = value.as_map().unwrap().get(&MapKey::from("X-Test")).unwrap();
        assert_eq!(
            values,
            &Value::from(vec![Value::from("one"), Value::from("two")])
        );
        assert!(value.as_map().unwrap().get(&MapKey::from("x-test")).is_none());
    }

    #[test]
    fn json_maps_onto_values() {
        let body = decode_body(br#"{"n": 1, "list": [true, null], "s": "x"}"#).unwrap();
        let map = body.as_map().unwrap();
        assert_eq!(map.get(&MapKey::from("n")), Some(&Value::Double(1.0)));
        assert_eq!(
            map.get(&MapKey::from("list")),
            Some(&Value::from(vec![Value::Bool(true), Value::Null]))
        );
        assert_eq!(map.get(&MapKey::from("s")), Some(&Value::from("x")));
    }

    #[test]
    fn scalar_bodies_decode() {
        assert_eq!(decode_body(b"\"hi\"").unwrap(), Value::from("hi"));
        assert!(decode_body(b"{]").is_err());
        assert!(decode_body(b"").is_err());
    }

    #[test]
    fn only_declared_names_resolve() {
        let activation = EventActivation::new(Value::Null, Value::map([]));
        assert_eq!(activation.resolve("body"), Some(Value::Null));
        assert!(activation.resolve("header").is_some());
        assert_eq!(activation.resolve("env"), None);
    }
}
