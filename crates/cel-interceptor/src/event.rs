//! Inbound events.

use std::sync::Arc;

use bytes::Bytes;
use http::HeaderMap;

use crate::config::CelFilterConfig;

/// One inbound request awaiting a filter decision.
///
/// The body is kept as raw bytes; decoding happens on a separate copy, so
/// [`Event::body`] always returns exactly what was received.
#[derive(Debug, Clone)]
pub struct Event {
    body: Bytes,
    headers: HeaderMap,
    filter: Arc<str>,
}

impl Event {
    /// An event with the raw `body`, its `headers` and the filter to apply.
    pub fn new(body: impl Into<Bytes>, headers: HeaderMap, filter: impl Into<Arc<str>>) -> Self {
        Self {
            body: body.into(),
            headers,
            filter: filter.into(),
        }
    }

    /// An event whose filter comes from a trigger's [`CelFilterConfig`].
    pub fn from_config(config: &CelFilterConfig, body: impl Into<Bytes>, headers: HeaderMap) -> Self {
        Self::new(body, headers, config.filter.as_str())
    }

    /// Splits an HTTP request into headers and body.
    pub fn from_request(request: http::Request<Bytes>, config: &CelFilterConfig) -> Self {
        let (parts, body) = request.into_parts();
        Self::from_config(config, body, parts.headers)
    }

    /// A new handle to the original body bytes. Cheap, and may be called
    /// any number of times.
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }

    /// Request headers as received.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Source text of the filter expression.
    pub fn filter(&self) -> &str {
        &self.filter
    }
}
