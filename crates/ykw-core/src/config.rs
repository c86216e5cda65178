//! Global configuration loaded from `~/.config/ykw/config.toml`.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";

/// Configuration for a watch run. Credentials are opaque: the cookie string
/// is forwarded as-is, never interpreted beyond header derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Raw `Cookie` header value copied from a logged-in browser session.
    #[serde(default)]
    pub cookie: String,
    /// User-Agent to present; should match the browser the cookie came from.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Maximum sessions streaming concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Seconds of playback each heartbeat covers.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
    /// Simulated playback speed (1.0 = real time, 2.0 = double speed).
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f64,
    /// Std deviation (seconds) of the Gaussian timing jitter.
    #[serde(default = "default_jitter_std_dev")]
    pub jitter_std_dev: f64,
    /// Delay between heartbeat delivery attempts.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: f64,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_concurrency() -> usize {
    8
}

fn default_interval_secs() -> f64 {
    5.0
}

fn default_playback_rate() -> f64 {
    1.0
}

fn default_jitter_std_dev() -> f64 {
    0.05
}

fn default_retry_delay_secs() -> f64 {
    1.0
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            cookie: String::new(),
            user_agent: default_user_agent(),
            concurrency: default_concurrency(),
            interval_secs: default_interval_secs(),
            playback_rate: default_playback_rate(),
            jitter_std_dev: default_jitter_std_dev(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl WatchConfig {
    /// Validate values that would make a run meaningless. Called at startup;
    /// failures here are fatal for the whole run.
    pub fn validate(&self) -> Result<()> {
        if self.cookie.trim().is_empty() {
            bail!(
                "no cookie configured; paste your browser session cookie into {}",
                config_path().map(|p| p.display().to_string()).unwrap_or_else(|_| "the config file".to_string())
            );
        }
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if !(self.interval_secs > 0.0) {
            bail!("interval_secs must be positive");
        }
        if !(self.playback_rate > 0.0) {
            bail!("playback_rate must be positive");
        }
        if !self.jitter_std_dev.is_finite() || self.jitter_std_dev < 0.0 {
            bail!("jitter_std_dev must be finite and non-negative");
        }
        if !(self.retry_delay_secs > 0.0) {
            bail!("retry_delay_secs must be positive");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ykw")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
/// The default file has an empty cookie, so `validate()` will tell the user
/// where to paste it.
pub fn load_or_init() -> Result<WatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = WatchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: WatchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
