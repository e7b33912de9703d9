//! A conditional webhook admission filter.
//!
//! Each inbound [`Event`] carries a JSON body, HTTP headers and a filter
//! expression written against two variables, `body` and `header`. The
//! [`CelInterceptor`] compiles the filter, decodes the body, evaluates the
//! filter and either passes the event on with its original bytes, rejects
//! it, or reports which stage failed.
//!
//! `header` maps canonical header names (`X-Test`) to their values, so
//! index access must use that spelling. `header.match(name, value)` ignores
//! the case of `name`.
//!
//! ```
//! use cel_interceptor::{CelInterceptor, Event};
//! use http::HeaderMap;
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("x-test", "test-value".parse().unwrap());
//!
//! let event = Event::new(&b"{}"[..], headers, "header.match('X-TEST', 'test-value')");
//! assert!(CelInterceptor::new().execute(&event).unwrap().is_passed());
//! ```

mod activation;
mod cache;
mod config;
mod env;
mod error;
mod event;
mod interceptor;
mod library;

pub use activation::{canonical_header_name, decode_body, header_value, EventActivation};
pub use cache::ProgramCache;
pub use config::{CelFilterConfig, InterceptorSettings};
pub use env::{build_filter_env, filter_env};
pub use error::{InterceptorError, Result, Stage};
pub use event::Event;
pub use interceptor::{evaluate, CelInterceptor, Outcome};
pub use library::{header_library, header_type};

pub use cel_filter_core::Value;
