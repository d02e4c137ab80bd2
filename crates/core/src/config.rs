//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the viewer. Nothing
//! in the event handling path reads process-wide environment variables, so the debounce delay
//! and API location stay fixed for the lifetime of a session.

use crate::constants::{
    API_URL_ENV, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SEARCH_DEBOUNCE,
    REQUEST_TIMEOUT_ENV, SEARCH_DEBOUNCE_ENV,
};
use crate::{WikiError, WikiResult};
use std::time::Duration;

/// Viewer configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    api_url: String,
    search_debounce: Duration,
    request_timeout: Duration,
}

impl ViewerConfig {
    /// Create a new `ViewerConfig`.
    ///
    /// # Errors
    ///
    /// Returns `WikiError::InvalidConfig` if `api_url` is blank or is not an `http(s)` URL, or
    /// if `request_timeout` is zero.
    pub fn new(
        api_url: impl Into<String>,
        search_debounce: Duration,
        request_timeout: Duration,
    ) -> WikiResult<Self> {
        let api_url = api_url.into().trim().trim_end_matches('/').to_string();
        if api_url.is_empty() {
            return Err(WikiError::InvalidConfig("api url cannot be empty".into()));
        }
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(WikiError::InvalidConfig(format!(
                "api url must start with http:// or https://, got {api_url}"
            )));
        }
        if request_timeout.is_zero() {
            return Err(WikiError::InvalidConfig(
                "request timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            api_url,
            search_debounce,
            request_timeout,
        })
    }

    /// Base URL of the content API, without a trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn search_debounce(&self) -> Duration {
        self.search_debounce
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn with_search_debounce(mut self, search_debounce: Duration) -> Self {
        self.search_debounce = search_debounce;
        self
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Parse a millisecond duration from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `default`.
///
/// # Errors
///
/// Returns `WikiError::InvalidConfig` if the value is not a non-negative integer.
pub fn millis_from_env_value(value: Option<String>, default: Duration) -> WikiResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(default),
        Some(v) => v
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| WikiError::InvalidConfig(format!("invalid millisecond value {v:?}: {e}"))),
    }
}

/// Resolve a `ViewerConfig` from optional environment values.
///
/// `api_url` falls back to [`DEFAULT_API_URL`]; the durations fall back to their defaults.
pub fn config_from_env_values(
    api_url: Option<String>,
    search_debounce_ms: Option<String>,
    request_timeout_ms: Option<String>,
) -> WikiResult<ViewerConfig> {
    let api_url = api_url
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let search_debounce = millis_from_env_value(search_debounce_ms, DEFAULT_SEARCH_DEBOUNCE)?;
    let request_timeout = millis_from_env_value(request_timeout_ms, DEFAULT_REQUEST_TIMEOUT)?;

    ViewerConfig::new(api_url, search_debounce, request_timeout)
}

/// Read the viewer configuration from the process environment.
///
/// Intended to be called exactly once, at startup.
pub fn config_from_env() -> WikiResult<ViewerConfig> {
    config_from_env_values(
        std::env::var(API_URL_ENV).ok(),
        std::env::var(SEARCH_DEBOUNCE_ENV).ok(),
        std::env::var(REQUEST_TIMEOUT_ENV).ok(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_values_missing() {
        let cfg = config_from_env_values(None, None, Some("  ".into())).unwrap();
        assert_eq!(cfg.api_url(), DEFAULT_API_URL);
        assert_eq!(cfg.search_debounce(), Duration::from_millis(500));
        assert_eq!(cfg.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let cfg = config_from_env_values(Some("http://wiki.local/api/".into()), None, None)
            .unwrap();
        assert_eq!(cfg.api_url(), "http://wiki.local/api");
    }

    #[test]
    fn non_http_url_is_rejected() {
        let err = config_from_env_values(Some("ftp://wiki".into()), None, None).unwrap_err();
        assert!(matches!(err, WikiError::InvalidConfig(_)));
    }

    #[test]
    fn debounce_must_be_numeric() {
        let err = config_from_env_values(None, Some("fast".into()), None).unwrap_err();
        assert!(matches!(err, WikiError::InvalidConfig(_)));

        let cfg = config_from_env_values(None, Some("120".into()), None).unwrap();
        assert_eq!(cfg.search_debounce(), Duration::from_millis(120));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ViewerConfig::new("http://x", Duration::ZERO, Duration::ZERO).unwrap_err();
        assert!(matches!(err, WikiError::InvalidConfig(_)));
    }
}
