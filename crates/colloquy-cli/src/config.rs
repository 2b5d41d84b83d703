use colloquy_agent::ProvidersConfig;
use colloquy_session::EngineOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Deserialize, Default)]
pub struct ColloquyConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dialog: DialogSettings,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory with a browser front end, served at `/`.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DialogSettings {
    #[serde(default = "default_inter_turn_delay_ms")]
    pub inter_turn_delay_ms: u64,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for DialogSettings {
    fn default() -> Self {
        Self {
            inter_turn_delay_ms: default_inter_turn_delay_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl DialogSettings {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            inter_turn_delay: Duration::from_millis(self.inter_turn_delay_ms),
            event_buffer: self.event_buffer,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_inter_turn_delay_ms() -> u64 {
    300
}
fn default_event_buffer() -> usize {
    64
}

impl ColloquyConfig {
    /// Read the config file, falling back to defaults when it does not exist,
    /// then apply environment overrides.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = match tokio::fs::read_to_string(path).await {
            Ok(raw) => Self::parse(&raw).map_err(|e| {
                anyhow::anyhow!("Failed to parse config file '{}': {e}", path.display())
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            }
        };
        config.providers.apply_env_overrides();
        Ok(config)
    }

    fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}
