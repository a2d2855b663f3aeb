//! Relay configuration
//!
//! `RelayConfig` is built once at startup and injected into the relay and the
//! server. A missing credential fails here, before any listener is bound or
//! request is attempted.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::defaults;
use crate::error::RelayError;

/// Generation parameters sent with every upstream request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: defaults::generation::TEMPERATURE,
            max_tokens: defaults::generation::MAX_TOKENS,
            top_p: defaults::generation::TOP_P,
        }
    }
}

/// Time limits applied to one relayed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLimits {
    /// Longest gap allowed between upstream frames, and before the response head
    pub idle_timeout: Duration,
    /// Wall-clock cap for the whole stream
    pub max_duration: Duration,
}

impl Default for StreamLimits {
    fn default() -> Self {
        Self {
            idle_timeout: defaults::stream::IDLE_TIMEOUT,
            max_duration: defaults::stream::MAX_DURATION,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// User agent
    pub user_agent: String,
    /// Proxy settings
    pub proxy: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: defaults::http::CONNECT_TIMEOUT,
            user_agent: defaults::http::USER_AGENT.to_string(),
            proxy: None,
        }
    }
}

/// Process-wide relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Upstream bearer credential
    pub api_key: SecretString,
    /// Upstream API root
    pub base_url: String,
    /// Upstream model
    pub model: String,
    pub generation: GenerationParams,
    pub limits: StreamLimits,
    pub http: HttpConfig,
    /// Listen address of the HTTP server
    pub bind_addr: SocketAddr,
    /// SSE keep-alive interval; `None` disables keep-alive comments
    pub keep_alive: Option<Duration>,
    /// Replace in-stream error text with a fixed message
    pub mask_errors: bool,
}

impl RelayConfig {
    /// Create a configuration with defaults for everything but the credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: defaults::upstream::BASE_URL.to_string(),
            model: defaults::upstream::MODEL.to_string(),
            generation: GenerationParams::default(),
            limits: StreamLimits::default(),
            http: HttpConfig::default(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            keep_alive: Some(defaults::stream::KEEP_ALIVE),
            mask_errors: false,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_generation(mut self, generation: GenerationParams) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_limits(mut self, limits: StreamLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: Option<Duration>) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_mask_errors(mut self, mask_errors: bool) -> Self {
        self.mask_errors = mask_errors;
        self
    }

    /// Load configuration from process environment.
    ///
    /// Supported environment variables:
    /// - `RELAY_UPSTREAM_API_KEY` (required; falls back to `OPENAI_API_KEY`)
    /// - `RELAY_UPSTREAM_BASE_URL`, `RELAY_MODEL`
    /// - `RELAY_TEMPERATURE`, `RELAY_MAX_TOKENS`, `RELAY_TOP_P`
    /// - `RELAY_BIND_ADDR`
    /// - `RELAY_CONNECT_TIMEOUT_SECS`, `RELAY_IDLE_TIMEOUT_SECS`, `RELAY_MAX_STREAM_SECS`
    /// - `RELAY_KEEP_ALIVE_SECS` (`0` disables)
    /// - `RELAY_MASK_ERRORS`
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("RELAY_UPSTREAM_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                RelayError::MissingApiKey(
                    "set RELAY_UPSTREAM_API_KEY (or OPENAI_API_KEY)".to_string(),
                )
            })?;

        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup("RELAY_UPSTREAM_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(model) = lookup("RELAY_MODEL") {
            config.model = model;
        }

        config.generation = GenerationParams {
            temperature: parse_var(&lookup, "RELAY_TEMPERATURE", config.generation.temperature)?,
            max_tokens: parse_var(&lookup, "RELAY_MAX_TOKENS", config.generation.max_tokens)?,
            top_p: parse_var(&lookup, "RELAY_TOP_P", config.generation.top_p)?,
        };

        config.bind_addr = parse_var(&lookup, "RELAY_BIND_ADDR", config.bind_addr)?;

        config.http.connect_timeout = parse_secs(
            &lookup,
            "RELAY_CONNECT_TIMEOUT_SECS",
            config.http.connect_timeout,
        )?;
        config.limits = StreamLimits {
            idle_timeout: parse_secs(&lookup, "RELAY_IDLE_TIMEOUT_SECS", config.limits.idle_timeout)?,
            max_duration: parse_secs(&lookup, "RELAY_MAX_STREAM_SECS", config.limits.max_duration)?,
        };

        let keep_alive = parse_secs(
            &lookup,
            "RELAY_KEEP_ALIVE_SECS",
            defaults::stream::KEEP_ALIVE,
        )?;
        config.keep_alive = (!keep_alive.is_zero()).then_some(keep_alive);

        if let Some(raw) = lookup("RELAY_MASK_ERRORS") {
            config.mask_errors = parse_flag("RELAY_MASK_ERRORS", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(RelayError::MissingApiKey(
                "API key cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(RelayError::ConfigurationError(
                "Base URL must start with http:// or https://".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(RelayError::ConfigurationError(
                "Model cannot be empty".to_string(),
            ));
        }

        let GenerationParams {
            temperature,
            max_tokens,
            top_p,
        } = self.generation;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(RelayError::ConfigurationError(format!(
                "temperature must be within 0.0..=2.0, got {temperature}"
            )));
        }
        if !(0.0..=1.0).contains(&top_p) {
            return Err(RelayError::ConfigurationError(format!(
                "top_p must be within 0.0..=1.0, got {top_p}"
            )));
        }
        if max_tokens == 0 {
            return Err(RelayError::ConfigurationError(
                "max_tokens must be positive".to_string(),
            ));
        }

        if self.limits.idle_timeout.is_zero() {
            return Err(RelayError::ConfigurationError(
                "idle timeout must be positive".to_string(),
            ));
        }
        if self.limits.max_duration < self.limits.idle_timeout {
            return Err(RelayError::ConfigurationError(
                "max stream duration must not be shorter than the idle timeout".to_string(),
            ));
        }

        Ok(())
    }

    /// Full URL of the streaming completion endpoint.
    pub fn chat_completions_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            defaults::upstream::CHAT_COMPLETIONS_PATH
        )
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, RelayError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| RelayError::ConfigurationError(format!("invalid {key} '{raw}': {e}"))),
        None => Ok(default),
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, RelayError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_var(lookup, key, default.as_secs()).map(Duration::from_secs)
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, RelayError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RelayError::ConfigurationError(format!(
            "invalid {key} '{raw}': expected true or false"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_fails_fast() {
        let err = RelayConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, RelayError::MissingApiKey(_)));

        let err = RelayConfig::from_lookup(lookup_from(&[("RELAY_UPSTREAM_API_KEY", "  ")]))
            .unwrap_err();
        assert!(matches!(err, RelayError::MissingApiKey(_)));
    }

    #[test]
    fn falls_back_to_openai_api_key() {
        let config = RelayConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key.expose_secret(), "sk-test");
        assert_eq!(config.base_url, defaults::upstream::BASE_URL);
        assert_eq!(config.generation, GenerationParams::default());
        assert_eq!(config.keep_alive, Some(defaults::stream::KEEP_ALIVE));
        assert!(!config.mask_errors);
    }

    #[test]
    fn reads_overrides() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("RELAY_UPSTREAM_API_KEY", "key"),
            ("RELAY_UPSTREAM_BASE_URL", "http://localhost:9000/v1/"),
            ("RELAY_MODEL", "local-model"),
            ("RELAY_TEMPERATURE", "0.2"),
            ("RELAY_MAX_TOKENS", "256"),
            ("RELAY_TOP_P", "0.5"),
            ("RELAY_BIND_ADDR", "0.0.0.0:8080"),
            ("RELAY_IDLE_TIMEOUT_SECS", "5"),
            ("RELAY_MAX_STREAM_SECS", "30"),
            ("RELAY_KEEP_ALIVE_SECS", "0"),
            ("RELAY_MASK_ERRORS", "yes"),
        ]))
        .unwrap();

        assert_eq!(config.model, "local-model");
        assert_eq!(
            config.chat_completions_url(),
            "http://localhost:9000/v1/chat/completions"
        );
        assert_eq!(config.generation.max_tokens, 256);
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.limits.idle_timeout, Duration::from_secs(5));
        assert_eq!(config.limits.max_duration, Duration::from_secs(30));
        assert_eq!(config.keep_alive, None);
        assert!(config.mask_errors);
    }

    #[test]
    fn rejects_invalid_values() {
        let bad = [
            ("RELAY_TEMPERATURE", "hot"),
            ("RELAY_TEMPERATURE", "3.5"),
            ("RELAY_TOP_P", "1.5"),
            ("RELAY_MAX_TOKENS", "0"),
            ("RELAY_UPSTREAM_BASE_URL", "ftp://example.com"),
            ("RELAY_IDLE_TIMEOUT_SECS", "0"),
            ("RELAY_MASK_ERRORS", "maybe"),
        ];
        for (key, value) in bad {
            let res = RelayConfig::from_lookup(lookup_from(&[
                ("RELAY_UPSTREAM_API_KEY", "key"),
                (key, value),
            ]));
            assert!(
                matches!(res, Err(RelayError::ConfigurationError(_))),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn max_duration_must_cover_idle_timeout() {
        let config = RelayConfig::new("key").with_limits(StreamLimits {
            idle_timeout: Duration::from_secs(60),
            max_duration: Duration::from_secs(10),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = RelayConfig::new("sk-very-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-very-secret"));
    }
}
