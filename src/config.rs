//! Configuration structures and loading logic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Base URL of the OpenAI-compatible provider (e.g. LM Studio)
    pub provider_endpoint: String,

    /// Timeout applied to every provider request (listing and load probes)
    pub request_timeout_secs: u64,

    pub policy: LoadingPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            provider_endpoint: default_provider_endpoint(),
            request_timeout_secs: default_request_timeout(),
            policy: LoadingPolicy::default(),
        }
    }
}

impl PoolConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content).context("Failed to parse TOML config")?
        } else {
            Self::default()
        };

        // Environment variable overrides
        if let Ok(endpoint) = std::env::var("MODEL_POOL_ENDPOINT") {
            config.provider_endpoint = endpoint;
        }
        if let Ok(max) = std::env::var("MODEL_POOL_MAX_CONCURRENT") {
            config.policy.max_concurrent_models = max
                .parse()
                .context("Invalid MODEL_POOL_MAX_CONCURRENT value")?;
        }
        if let Ok(threshold) = std::env::var("MODEL_POOL_UNLOAD_THRESHOLD_MB") {
            config.policy.unload_threshold_mb = threshold
                .parse()
                .context("Invalid MODEL_POOL_UNLOAD_THRESHOLD_MB value")?;
        }
        if let Ok(interval) = std::env::var("MODEL_POOL_MONITOR_INTERVAL") {
            config.policy.monitor_interval_secs = interval
                .parse()
                .context("Invalid MODEL_POOL_MONITOR_INTERVAL value")?;
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.provider_endpoint.is_empty() {
            anyhow::bail!("Provider endpoint cannot be empty");
        }
        if !self.provider_endpoint.starts_with("http://")
            && !self.provider_endpoint.starts_with("https://")
        {
            anyhow::bail!(
                "Provider endpoint must be an http(s) URL (got '{}')",
                self.provider_endpoint
            );
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("Request timeout must be at least 1 second");
        }
        self.policy.validate()
    }
}

/// Loading policy: capacity limits, eviction thresholds, preload list
///
/// Static at runtime; the pool never mutates it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadingPolicy {
    /// Maximum number of models resident at once
    pub max_concurrent_models: usize,

    /// Aggregate loaded footprint (MB) above which the monitor evicts
    pub unload_threshold_mb: u64,

    /// Minutes of inactivity before a model is considered idle
    pub idle_timeout_mins: u64,

    /// Model identities loaded eagerly at startup, if present in the registry
    pub preload_models: Vec<String>,

    /// Seconds between memory pressure checks
    pub monitor_interval_secs: u64,
}

impl Default for LoadingPolicy {
    fn default() -> Self {
        Self {
            max_concurrent_models: 3,
            unload_threshold_mb: 8_192,
            idle_timeout_mins: 30,
            preload_models: vec![
                "llama-3.2-3b-instruct".to_string(),
                "phi-3.5-mini-instruct".to_string(),
            ],
            monitor_interval_secs: 60,
        }
    }
}

impl LoadingPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_models == 0 {
            anyhow::bail!("max_concurrent_models must be at least 1");
        }
        if self.monitor_interval_secs == 0 {
            anyhow::bail!("monitor_interval_secs must be at least 1");
        }
        Ok(())
    }
}

fn default_provider_endpoint() -> String {
    "http://localhost:1234/v1".to_string()
}

fn default_request_timeout() -> u64 {
    10
}
