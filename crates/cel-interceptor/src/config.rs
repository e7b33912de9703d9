//! Serde-backed configuration.

use serde::{Deserialize, Serialize};

/// The filter a trigger applies to its inbound events.
///
/// ```
/// use cel_interceptor::CelFilterConfig;
///
/// let config: CelFilterConfig =
///     serde_json::from_str(r#"{"filter": "body.action == 'opened'"}"#).unwrap();
/// assert_eq!(config.filter, "body.action == 'opened'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CelFilterConfig {
    pub filter: String,
}

impl CelFilterConfig {
    /// Configuration applying `filter`.
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
        }
    }
}

/// Settings for a [`CelInterceptor`](crate::CelInterceptor) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptorSettings {
    /// Keep compiled programs keyed by their source text.
    pub cache_programs: bool,
}

impl Default for InterceptorSettings {
    fn default() -> Self {
        Self {
            cache_programs: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_trigger_fields_are_rejected() {
        let result = serde_json::from_str::<CelFilterConfig>(r#"{"filter": "true", "overlays": []}"#);
        assert!(result.is_err());
        assert!(serde_json::from_str::<CelFilterConfig>("{}").is_err());
    }

    #[test]
    fn settings_default_to_caching() {
        let settings: InterceptorSettings = serde_json::from_str("{}").unwrap();
        assert!(settings.cache_programs);
        let settings: InterceptorSettings =
            serde_json::from_str(r#"{"cache_programs": false}"#).unwrap();
        assert!(!settings.cache_programs);
    }
}
