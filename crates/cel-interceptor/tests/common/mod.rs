//! Helpers shared by the interceptor integration tests.

use cel_interceptor::{CelInterceptor, Event, InterceptorError, Outcome};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::HeaderMap;

/// The headers every webhook in these tests arrives with.
pub fn webhook_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("x-test", HeaderValue::from_static("test-value"));
    headers
}

pub fn execute(filter: &str, payload: &[u8]) -> Result<Outcome, InterceptorError> {
    let event = Event::new(payload.to_vec(), webhook_headers(), filter);
    CelInterceptor::new().execute(&event)
}

#[allow(dead_code)]
pub fn assert_passes(filter: &str, payload: &[u8]) {
    match execute(filter, payload) {
        Ok(Outcome::Passed { body, .. }) => assert_eq!(&body[..], payload, "{filter}"),
        other => panic!("expected '{filter}' to pass, got {other:?}"),
    }
}

#[allow(dead_code)]
pub fn assert_rejects(filter: &str, payload: &[u8]) {
    match execute(filter, payload) {
        Ok(Outcome::Rejected) => {}
        other => panic!("expected '{filter}' to reject, got {other:?}"),
    }
}
