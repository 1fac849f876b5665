use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Engine configuration. Every field has a default, so a partial TOML file
/// (or none at all) is valid. The engine only reads configuration; where it
/// lives is the caller's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum simultaneous transfers per batch.
    pub concurrency: usize,
    /// Wall-clock limit for one item's request, in milliseconds.
    pub item_timeout_ms: u64,
    /// TCP/TLS connect limit for every request, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Limit for each individual mirror probe, in milliseconds.
    pub probe_timeout_ms: u64,
    /// Cadence of the throughput estimator, in milliseconds.
    pub tick_interval_ms: u64,
    /// Maximum redirects followed per request.
    pub max_redirects: u32,
    /// Optional `User-Agent` header.
    pub user_agent: Option<String>,
    /// Optional curl receive buffer size in bytes (None = library default).
    pub buffer_size: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            item_timeout_ms: 60_000,
            connect_timeout_ms: 10_000,
            probe_timeout_ms: 5_000,
            tick_interval_ms: 500,
            max_redirects: 10,
            user_agent: None,
            buffer_size: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: EngineConfig = toml::from_str(s).context("invalid engine config")?;
        Ok(cfg)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let cfg = Self::from_toml_str(&data)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(cfg)
    }

    pub fn item_timeout(&self) -> Duration {
        Duration::from_millis(self.item_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Options applied to every curl handle the engine creates.
    pub fn transport(&self) -> TransportOptions {
        TransportOptions {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            probe_timeout: self.probe_timeout(),
            tick_interval: self.tick_interval(),
            max_redirects: self.max_redirects,
            user_agent: self.user_agent.clone(),
            buffer_size: self.buffer_size,
        }
    }
}

/// Per-request transport settings derived from `EngineConfig`.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    pub probe_timeout: Duration,
    /// Estimator cadence for batches run with these options.
    pub tick_interval: Duration,
    pub max_redirects: u32,
    pub user_agent: Option<String>,
    pub buffer_size: Option<usize>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        EngineConfig::default().transport()
    }
}

impl TransportOptions {
    /// Apply the shared options to a fresh curl handle.
    pub(crate) fn apply(&self, easy: &mut curl::easy::Easy) -> Result<(), curl::Error> {
        easy.follow_location(true)?;
        easy.max_redirections(self.max_redirects)?;
        easy.connect_timeout(self.connect_timeout)?;
        if let Some(ref ua) = self.user_agent {
            easy.useragent(ua)?;
        }
        if let Some(sz) = self.buffer_size {
            easy.buffer_size(sz)?;
        }
        Ok(())
    }
}
