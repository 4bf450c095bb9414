use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::paths::{get_config_path, get_default_data_file};

pub const ENV_PORT: &str = "PORT";
pub const ENV_HOST: &str = "ROSTER_HOST";
pub const ENV_DATA_FILE: &str = "ROSTER_DATA_FILE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_max_body_bytes() -> u64 {
    1024 * 1024 // 1MB
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "get_default_data_file")]
    pub data_file: PathBuf,
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: get_default_data_file(),
            create_if_missing: default_create_if_missing(),
        }
    }
}

fn default_create_if_missing() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads the config file at `path`, or the default location when `None`,
    /// then applies environment overrides. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None => Self::load_file(&get_config_path())?,
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Applies `PORT`, `ROSTER_HOST` and `ROSTER_DATA_FILE` as looked up by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_PORT).filter(|v| !v.trim().is_empty()) {
            self.server.port = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_PORT,
                value: value.clone(),
            })?;
        }
        if let Some(host) = lookup(ENV_HOST).filter(|v| !v.trim().is_empty()) {
            self.server.host = host;
        }
        if let Some(file) = lookup(ENV_DATA_FILE).filter(|v| !v.trim().is_empty()) {
            self.storage.data_file = PathBuf::from(file);
        }
        Ok(())
    }
}
