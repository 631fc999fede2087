//! Runtime configuration
//!
//! Read from `$DRIVESYNC_CONFIG` if set, otherwise
//! `<config dir>/drivesync/config.json`. Every field has a default, so a
//! partial file (or no file at all) is valid.

use anyhow::{bail, Context, Result};
use ds_adapters::LinkConfig;
use ds_core::InputSource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "DRIVESYNC_CONFIG";
pub const MAX_TICK_HZ: u32 = 1000;

/// Output sink selection
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    #[default]
    Log,
    Udp { host: String, port: u16 },
    File { path: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub bind: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:9110".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control loop rate
    pub tick_hz: u32,
    /// Most bytes read from the link per tick
    pub read_chunk: usize,
    /// Input source at startup
    pub source: InputSource,
    pub link: LinkConfig,
    pub sink: SinkConfig,
    /// HTTP status/input API; `null` disables it
    pub api: Option<ApiConfig>,
    /// Pending input events before the API starts refusing them
    pub input_queue: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            read_chunk: 256,
            source: InputSource::Telemetry,
            link: LinkConfig::default(),
            sink: SinkConfig::default(),
            api: Some(ApiConfig::default()),
            input_queue: 64,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("drivesync").join("config.json"))
    }

    /// Load from the environment-selected or default path. A missing file
    /// yields the defaults.
    pub fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::default_path(),
        };
        match path {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_hz == 0 || self.tick_hz > MAX_TICK_HZ {
            bail!("tick_hz must be between 1 and {}, got {}", MAX_TICK_HZ, self.tick_hz);
        }
        if self.read_chunk == 0 {
            bail!("read_chunk must be greater than 0");
        }
        if self.input_queue == 0 {
            bail!("input_queue must be greater than 0");
        }
        Ok(())
    }
}
