use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// The local identity documents are stored under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    pub id: String,
    pub email: String,
}

impl UserConfig {
    /// `$USER` (or "local") at localhost
    pub fn from_env() -> Self {
        let id = std::env::var("USER")
            .ok()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "local".to_string());
        let email = format!("{id}@localhost");
        Self { id, email }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the document store
    pub store_path: PathBuf,
    /// Directory for client-local state (caret position, logs)
    #[serde(default = "Config::default_state_path")]
    pub state_path: PathBuf,
    #[serde(default = "UserConfig::from_env")]
    pub user: UserConfig,
}

impl Config {
    /// Config for `store_path` with default state directory and user
    pub fn for_store(store_path: PathBuf) -> Self {
        Self {
            store_path,
            state_path: Self::default_state_path(),
            user: UserConfig::from_env(),
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded paths
        config.store_path = Self::expand_path(&config.store_path).unwrap_or(config.store_path);
        config.state_path = Self::expand_path(&config.state_path).unwrap_or(config.state_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/mirrorpad");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn default_state_path() -> PathBuf {
        let state_dir = shellexpand::tilde("~/.local/state/mirrorpad");
        PathBuf::from(state_dir.as_ref())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
