use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::layout::SizePreset;
use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub artwork: ArtworkConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub sizes: SizesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Remote artwork lookup and the on-disk cache it feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtworkConfig {
    /// Album search endpoint. Queried with `term`, `entity=album` and `limit=1`.
    #[serde(default = "default_search_url")]
    pub search_url: String,
    /// Directory holding one `<key>.jpg` per resolved album.
    /// Defaults to `$XDG_CACHE_HOME/sleevie`.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Size marker embedded in the search result's artwork URL.
    #[serde(default = "default_low_res_token")]
    pub low_res_token: String,
    /// Marker substituted in to request the larger rendition.
    #[serde(default = "default_high_res_token")]
    pub high_res_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window class the overlay registers with the compositor.
    #[serde(default = "default_window_class")]
    pub class: String,
    /// How long to wait after a resize before reading back the real size.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_ipc_timeout_ms")]
    pub ipc_timeout_ms: u64,
}

/// Square edge length, in pixels, of each footprint preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizesConfig {
    #[serde(default = "default_small")]
    pub small: u32,
    #[serde(default = "default_medium")]
    pub medium: u32,
    #[serde(default = "default_large")]
    pub large: u32,
    #[serde(default = "default_minimized")]
    pub minimized: u32,
    /// Preset used at startup.
    #[serde(default, rename = "default")]
    pub initial: SizePreset,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            cache_dir: default_cache_dir(),
            request_timeout_ms: default_request_timeout_ms(),
            low_res_token: default_low_res_token(),
            high_res_token: default_high_res_token(),
        }
    }
}

impl ArtworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            class: default_window_class(),
            settle_delay_ms: default_settle_delay_ms(),
            ipc_timeout_ms: default_ipc_timeout_ms(),
        }
    }
}

impl WindowConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn ipc_timeout(&self) -> Duration {
        Duration::from_millis(self.ipc_timeout_ms)
    }
}

impl Default for SizesConfig {
    fn default() -> Self {
        Self {
            small: default_small(),
            medium: default_medium(),
            large: default_large(),
            minimized: default_minimized(),
            initial: SizePreset::default(),
        }
    }
}

impl SizesConfig {
    pub fn edge(&self, preset: SizePreset) -> u32 {
        match preset {
            SizePreset::Small => self.small,
            SizePreset::Medium => self.medium,
            SizePreset::Large => self.large,
        }
    }
}

fn default_port() -> u16 {
    9877
}

fn default_search_url() -> String {
    "https://itunes.apple.com/search".to_string()
}

fn default_cache_dir() -> PathBuf {
    platform::cache_dir()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_low_res_token() -> String {
    "100x100".to_string()
}

fn default_high_res_token() -> String {
    "600x600".to_string()
}

fn default_window_class() -> String {
    "sleevie".to_string()
}

fn default_settle_delay_ms() -> u64 {
    50
}

fn default_ipc_timeout_ms() -> u64 {
    1_000
}

fn default_small() -> u32 {
    120
}

fn default_medium() -> u32 {
    180
}

fn default_large() -> u32 {
    260
}

fn default_minimized() -> u32 {
    48
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            tracing::info!("Wrote default config to {:?}", config_path);
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
