use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default cap on simultaneous in-flight fetches.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 20;

/// Global configuration loaded from `~/.config/mdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MdlConfig {
    /// Maximum number of fetches in flight at once (the only admission control).
    pub max_concurrent_downloads: usize,
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Hard limit for one whole transfer in seconds.
    pub timeout_secs: u64,
    /// Abort a transfer slower than this many bytes/s for `low_speed_time_secs`.
    #[serde(default = "default_low_speed_limit")]
    pub low_speed_limit_bytes: u32,
    #[serde(default = "default_low_speed_time")]
    pub low_speed_time_secs: u64,
    /// Redirects followed per request.
    #[serde(default = "default_max_redirections")]
    pub max_redirections: u32,
    /// Optional User-Agent header; libcurl sends none when unset.
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_low_speed_limit() -> u32 {
    1024
}

fn default_low_speed_time() -> u64 {
    60
}

fn default_max_redirections() -> u32 {
    10
}

impl Default for MdlConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            connect_timeout_secs: 30,
            timeout_secs: 600,
            low_speed_limit_bytes: default_low_speed_limit(),
            low_speed_time_secs: default_low_speed_time(),
            max_redirections: default_max_redirections(),
            user_agent: None,
        }
    }
}

impl MdlConfig {
    /// Concurrency limit actually used: never below 1.
    pub fn concurrency_limit(&self) -> usize {
        self.max_concurrent_downloads.max(1)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MdlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
