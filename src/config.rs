//! Configuration management for the prediction client

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix, e.g. `FRAUD_CLIENT__BACKEND__BASE_URL`
pub const ENV_PREFIX: &str = "FRAUD_CLIENT";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scoring backend connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base address the endpoint paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in milliseconds; transport default when absent
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl BackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: None,
        }
    }
}

/// Result cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Ignore responses issued before the currently cached one
    #[serde(default = "default_discard_stale")]
    pub discard_stale_responses: bool,
    /// Buffered result-updated events per subscriber
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_discard_stale() -> bool {
    true
}

fn default_event_capacity() -> usize {
    16
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            discard_stale_responses: default_discard_stale(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file plus environment overrides.
    /// A missing file is not an error.
    pub fn load() -> Result<Self> {
        Self::build(
            Config::builder().add_source(File::with_name("config/config").required(false)),
            Self::environment(),
        )
    }

    /// Load configuration from a specific path plus environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(
            Config::builder().add_source(File::from(path.as_ref())),
            Self::environment(),
        )
    }

    /// `FRAUD_CLIENT__<SECTION>__<KEY>` overrides
    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX).separator("__")
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        environment: Environment,
    ) -> Result<Self> {
        let config = builder
            .add_source(environment)
            .build()
            .context("Failed to build configuration")?;

        let app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app.validate()?;
        Ok(app)
    }

    /// Reject settings the client cannot run with
    pub fn validate(&self) -> Result<()> {
        let base_url = self.backend.base_url.trim();
        if base_url.is_empty() {
            bail!("backend.base_url must not be empty");
        }
        let url = reqwest::Url::parse(base_url)
            .with_context(|| format!("backend.base_url is not a valid URL: {base_url}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("backend.base_url must be an http or https URL, got {base_url:?}");
        }

        if self.backend.timeout_ms == Some(0) {
            bail!("backend.timeout_ms must be greater than zero when set");
        }
        if self.cache.event_capacity == 0 {
            bail!("cache.event_capacity must be greater than zero");
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            bail!(
                "logging.format must be \"json\" or \"pretty\", got {:?}",
                self.logging.format
            );
        }
        Ok(())
    }
}
