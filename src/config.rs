//! Pipeline configuration.
//!
//! Defaults mirror the production client: flush at 10 queued events, retain at most 50
//! events while the endpoint is unreachable, periodic flushing disabled.
//!
//! ```rust
//! use eventline::PipelineConfig;
//! use std::time::Duration;
//!
//! let config = PipelineConfig::builder()
//!     .batch_threshold(20)
//!     .periodic_flush(Duration::from_secs(60))
//!     .endpoint("https://collect.example.com/api/analytics/events")
//!     .build()
//!     .unwrap();
//! assert_eq!(config.batch_threshold(), 20);
//! assert!(config.periodic_flush_enabled());
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BATCH_THRESHOLD: usize = 10;
pub const DEFAULT_MAX_RETAINED: usize = 50;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);

/// Validated pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    batch_threshold: usize,
    max_retained: usize,
    periodic_flush: bool,
    flush_interval: Duration,
    request_timeout: Option<Duration>,
    endpoint: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_threshold: DEFAULT_BATCH_THRESHOLD,
            max_retained: DEFAULT_MAX_RETAINED,
            periodic_flush: false,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            request_timeout: None,
            endpoint: None,
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Parse a JSON document; absent fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        file.into_builder().build()
    }

    /// Queue length that triggers an automatic flush.
    pub fn batch_threshold(&self) -> usize {
        self.batch_threshold
    }

    /// Hard cap on queued events (`MAX_RETAINED`).
    pub fn max_retained(&self) -> usize {
        self.max_retained
    }

    pub fn periodic_flush_enabled(&self) -> bool {
        self.periodic_flush
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    /// Upper bound on a single delivery attempt. `None` lets a hung request hang.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn batch_threshold(mut self, threshold: usize) -> Self {
        self.config.batch_threshold = threshold;
        self
    }

    pub fn max_retained(mut self, max: usize) -> Self {
        self.config.max_retained = max;
        self
    }

    /// Enable the periodic flush timer at the given interval.
    pub fn periodic_flush(mut self, every: Duration) -> Self {
        self.config.periodic_flush = true;
        self.config.flush_interval = every;
        self
    }

    pub fn disable_periodic_flush(mut self) -> Self {
        self.config.periodic_flush = false;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let config = self.config;
        if config.batch_threshold == 0 {
            return Err(ConfigError::BatchThreshold(config.batch_threshold));
        }
        if config.max_retained == 0 {
            return Err(ConfigError::MaxRetained(config.max_retained));
        }
        if config.flush_interval.is_zero() {
            return Err(ConfigError::FlushInterval);
        }
        if config.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::RequestTimeout);
        }
        Ok(config)
    }
}

/// On-disk / embedded JSON shape.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    batch_threshold: Option<usize>,
    max_retained: Option<usize>,
    periodic_flush: Option<bool>,
    flush_interval_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    endpoint: Option<String>,
}

impl ConfigFile {
    fn into_builder(self) -> PipelineConfigBuilder {
        let mut builder = PipelineConfig::builder();
        if let Some(threshold) = self.batch_threshold {
            builder = builder.batch_threshold(threshold);
        }
        if let Some(max) = self.max_retained {
            builder = builder.max_retained(max);
        }
        if let Some(ms) = self.flush_interval_ms {
            builder.config.flush_interval = Duration::from_millis(ms);
        }
        builder.config.periodic_flush = self.periodic_flush.unwrap_or(false);
        if let Some(ms) = self.request_timeout_ms {
            builder = builder.request_timeout(Duration::from_millis(ms));
        }
        if let Some(endpoint) = self.endpoint {
            builder = builder.endpoint(endpoint);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_client() {
        let config = PipelineConfig::default();
        assert_eq!(config.batch_threshold(), 10);
        assert_eq!(config.max_retained(), 50);
        assert!(!config.periodic_flush_enabled());
        assert_eq!(config.flush_interval(), Duration::from_secs(30));
        assert!(config.request_timeout().is_none());
        assert!(config.endpoint().is_none());
    }

    #[test]
    fn builder_rejects_zero_threshold() {
        let err = PipelineConfig::builder().batch_threshold(0).build().unwrap_err();
        assert_eq!(err, ConfigError::BatchThreshold(0));
    }

    #[test]
    fn builder_rejects_zero_cap_and_interval() {
        assert_eq!(
            PipelineConfig::builder().max_retained(0).build().unwrap_err(),
            ConfigError::MaxRetained(0)
        );
        assert_eq!(
            PipelineConfig::builder().periodic_flush(Duration::ZERO).build().unwrap_err(),
            ConfigError::FlushInterval
        );
        assert_eq!(
            PipelineConfig::builder().request_timeout(Duration::ZERO).build().unwrap_err(),
            ConfigError::RequestTimeout
        );
    }

    #[test]
    fn json_fills_absent_fields_with_defaults() {
        let config = PipelineConfig::from_json_str(r#"{"batch_threshold": 5}"#).unwrap();
        assert_eq!(config.batch_threshold(), 5);
        assert_eq!(config.max_retained(), DEFAULT_MAX_RETAINED);
        assert!(!config.periodic_flush_enabled());
    }

    #[test]
    fn json_full_document() {
        let config = PipelineConfig::from_json_str(
            r#"{
                "batch_threshold": 4,
                "max_retained": 8,
                "periodic_flush": true,
                "flush_interval_ms": 500,
                "request_timeout_ms": 2000,
                "endpoint": "http://localhost:3000/api/analytics/events"
            }"#,
        )
        .unwrap();
        assert_eq!(config.max_retained(), 8);
        assert!(config.periodic_flush_enabled());
        assert_eq!(config.flush_interval(), Duration::from_millis(500));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(2)));
        assert_eq!(config.endpoint(), Some("http://localhost:3000/api/analytics/events"));
    }

    #[test]
    fn json_rejects_unknown_and_malformed() {
        assert!(matches!(
            PipelineConfig::from_json_str(r#"{"batch_size": 5}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(PipelineConfig::from_json_str("nope"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn json_validation_still_applies() {
        assert_eq!(
            PipelineConfig::from_json_str(r#"{"max_retained": 0}"#).unwrap_err(),
            ConfigError::MaxRetained(0)
        );
    }
}
