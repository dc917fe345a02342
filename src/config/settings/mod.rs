
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_NEIGHBOR_COUNT: usize = 11;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub recommend: RecommendConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Locations of the precomputed artifacts. Relative paths resolve against the config directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub metadata_path: PathBuf,
    pub features_path: PathBuf,
    pub title_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            metadata_path: PathBuf::from("books.json"),
            features_path: PathBuf::from("features.mtx"),
            title_column: "title".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecommendConfig {
    /// Neighbors requested from the index, the query row included.
    pub neighbor_count: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            neighbor_count: DEFAULT_NEIGHBOR_COUNT,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid title column: {0:?} (cannot be empty)")]
    InvalidTitleColumn(String),
    #[error("Invalid artifact path for {0} (cannot be empty)")]
    EmptyPath(&'static str),
    #[error("Invalid neighbor count: {0} (must be between 2 and 1000)")]
    InvalidNeighborCount(usize),
}

impl Config {
    /// Default configuration directory, `~/.bookmind`
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".bookmind"))
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join(CONFIG_FILE_NAME)
    }

    /// Absolute (or cwd-relative) path to the metadata table
    #[inline]
    pub fn metadata_path(&self) -> PathBuf {
        self.resolve(&self.data.metadata_path)
    }

    /// Absolute (or cwd-relative) path to the feature matrix
    #[inline]
    pub fn features_path(&self) -> PathBuf {
        self.resolve(&self.data.features_path)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.data.validate()?;
        self.recommend.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        let url_str = format!("http://{}:{}", self.host, self.port);
        match Url::parse(&url_str) {
            Ok(url) if url.host_str().is_some_and(|host| !host.is_empty()) => Ok(()),
            _ => Err(ConfigError::InvalidAddress(url_str)),
        }
    }

    /// `host:port` string accepted by `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        let temp_config = ServerConfig {
            host: host.clone(),
            ..self.clone()
        };
        temp_config.validate()?;
        self.host = host;
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }
}

impl DataConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metadata_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("metadata_path"));
        }
        if self.features_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("features_path"));
        }
        if self.title_column.trim().is_empty() {
            return Err(ConfigError::InvalidTitleColumn(self.title_column.clone()));
        }
        Ok(())
    }
}

impl RecommendConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=1000).contains(&self.neighbor_count) {
            return Err(ConfigError::InvalidNeighborCount(self.neighbor_count));
        }
        Ok(())
    }
}
