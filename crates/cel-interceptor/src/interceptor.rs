//! The filter decision itself.

use std::sync::Arc;

use bytes::Bytes;
use cel_filter_core::{Env, Program, Value};
use http::HeaderMap;

use crate::activation::{header_value, EventActivation};
use crate::cache::ProgramCache;
use crate::config::InterceptorSettings;
use crate::env::filter_env;
use crate::error::{InterceptorError, Result};
use crate::event::Event;

/// Result of a filter decision that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The event continues downstream, with its original body and headers.
    Passed { body: Bytes, headers: HeaderMap },
    /// The event is filtered out. This is not an error.
    Rejected,
}

impl Outcome {
    /// Whether the event continues downstream.
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed { .. })
    }

    /// The untouched body of a passed event; `None` when rejected.
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Outcome::Passed { body, .. } => Some(body),
            Outcome::Rejected => None,
        }
    }
}

/// Decides whether events pass their trigger's filter.
///
/// Holds no per-event state; one instance can serve concurrent events.
///
/// ```
/// use cel_interceptor::{CelInterceptor, Event};
/// use http::HeaderMap;
///
/// let interceptor = CelInterceptor::new();
/// let event = Event::new(&br#"{"value":"testing"}"#[..], HeaderMap::new(), "body.value == 'testing'");
/// let outcome = interceptor.execute(&event).unwrap();
/// assert_eq!(outcome.body().map(|b| &b[..]), Some(&br#"{"value":"testing"}"#[..]));
/// ```
#[derive(Debug)]
pub struct CelInterceptor {
    env: Arc<Env>,
    cache: Option<ProgramCache>,
}

impl Default for CelInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl CelInterceptor {
    /// An interceptor over [`filter_env`](crate::filter_env) with program caching on.
    pub fn new() -> Self {
        Self::with_settings(&InterceptorSettings::default())
    }

    /// An interceptor over the shared environment, configured by `settings`.
    pub fn with_settings(settings: &InterceptorSettings) -> Self {
        Self::with_env(filter_env(), settings)
    }

    /// Uses `env` instead of the shared filter environment. `env` should
    /// extend [`build_filter_env`](crate::build_filter_env) so that `body`
    /// and `header` stay declared.
    pub fn with_env(env: Arc<Env>, settings: &InterceptorSettings) -> Self {
        Self {
            env,
            cache: settings.cache_programs.then(ProgramCache::new),
        }
    }

    /// Environment filters are compiled against.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// The program cache, if caching is enabled.
    pub fn cache(&self) -> Option<&ProgramCache> {
        self.cache.as_ref()
    }

    /// Runs one event through its filter.
    ///
    /// The filter is compiled before the body is decoded, so a malformed
    /// filter is reported as a compile error whatever the body holds.
    pub fn execute(&self, event: &Event) -> Result<Outcome> {
        let outcome = self.decide(event);
        if let Err(err) = &outcome {
            tracing::warn!(stage = %err.stage(), error = %err, "Filter failed");
        }
        outcome
    }

    fn decide(&self, event: &Event) -> Result<Outcome> {
        tracing::debug!(filter = event.filter(), "Compiling filter");
        let program = self.compile(event.filter())?;

        tracing::debug!(bytes = event.body().len(), "Decoding body");
        let activation = EventActivation::from_parts(&event.body(), event.headers())?;

        tracing::debug!("Evaluating filter");
        match program.eval(&activation) {
            Value::Bool(true) => {
                tracing::info!("Event passed filter");
                Ok(Outcome::Passed {
                    body: event.body(),
                    headers: event.headers().clone(),
                })
            }
            Value::Bool(false) => {
                tracing::info!("Event rejected by filter");
                Ok(Outcome::Rejected)
            }
            Value::Error(err) => Err(InterceptorError::Evaluate(err.as_ref().clone())),
            value => Err(InterceptorError::Usage { value }),
        }
    }

    fn compile(&self, source: &str) -> Result<Arc<Program>> {
        let program = match &self.cache {
            Some(cache) => cache.get_or_compile(&self.env, source)?,
            None => Arc::new(self.env.compile(source)?),
        };
        Ok(program)
    }
}

/// Compiles `filter` against `env` and evaluates it over an already decoded
/// body, returning whatever value it produces.
///
/// Unlike [`CelInterceptor::execute`] the result need not be a bool.
pub fn evaluate(env: &Env, filter: &str, body: Value, headers: &HeaderMap) -> Result<Value> {
    let program = env.compile(filter)?;
    let activation = EventActivation::new(body, header_value(headers));
    match program.eval(&activation) {
        Value::Error(err) => Err(InterceptorError::Evaluate(err.as_ref().clone())),
        value => Ok(value),
    }
}
