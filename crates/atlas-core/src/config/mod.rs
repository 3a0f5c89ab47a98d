//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::search::{DEFAULT_LIMIT, MAX_LIMIT, SearchDialect};
use crate::storage::{DatabaseConfig, default_database_path};

/// Atlas configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Only read when `search.dialect = "postgres"`
    pub postgres_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub dialect: SearchDialect,
    pub default_limit: usize,
    pub max_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: 5,
            acquire_timeout_secs: 10,
            postgres_url: None,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            dialect: SearchDialect::default(),
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8443".to_string(),
        }
    }
}

impl DatabaseSettings {
    /// Pool settings for the SQLite catalogue store
    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig::with_path(&self.path)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
    }
}

const KEYS: &[&str] = &[
    "database.path",
    "database.max_connections",
    "database.acquire_timeout_secs",
    "database.postgres_url",
    "search.dialect",
    "search.default_limit",
    "search.max_limit",
    "server.bind_address",
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("ATLAS_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("atlas")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            return Err(anyhow!("database.max_connections must be at least 1"));
        }
        if self.database.acquire_timeout_secs == 0 {
            return Err(anyhow!("database.acquire_timeout_secs must be at least 1"));
        }
        if self.search.max_limit == 0 {
            return Err(anyhow!("search.max_limit must be at least 1"));
        }
        if self.search.default_limit > self.search.max_limit {
            return Err(anyhow!(
                "search.default_limit ({}) exceeds search.max_limit ({})",
                self.search.default_limit,
                self.search.max_limit
            ));
        }
        if self.search.dialect == SearchDialect::Postgres && self.database.postgres_url.is_none() {
            return Err(anyhow!(
                "search.dialect = postgres requires database.postgres_url"
            ));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "database.path" => Ok(self.database.path.display().to_string()),
            "database.max_connections" => Ok(self.database.max_connections.to_string()),
            "database.acquire_timeout_secs" => Ok(self.database.acquire_timeout_secs.to_string()),
            "database.postgres_url" => Ok(self
                .database
                .postgres_url
                .clone()
                .unwrap_or_else(|| "(not set)".to_string())),

            "search.dialect" => Ok(self.search.dialect.to_string()),
            "search.default_limit" => Ok(self.search.default_limit.to_string()),
            "search.max_limit" => Ok(self.search.max_limit.to_string()),

            "server.bind_address" => Ok(self.server.bind_address.clone()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `atlas config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "database.path" => {
                self.database.path = PathBuf::from(value);
            }
            "database.max_connections" => {
                self.database.max_connections = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
            }
            "database.acquire_timeout_secs" => {
                self.database.acquire_timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid acquire_timeout_secs value: {}", value))?;
            }
            "database.postgres_url" => {
                self.database.postgres_url = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }

            "search.dialect" => {
                self.search.dialect = SearchDialect::parse(value).ok_or_else(|| {
                    let valid: Vec<&str> = SearchDialect::all().iter().map(|d| d.as_str()).collect();
                    anyhow!(
                        "Invalid search dialect: {}. Valid options: {}",
                        value,
                        valid.join(", ")
                    )
                })?;
            }
            "search.default_limit" => {
                self.search.default_limit = value
                    .parse()
                    .with_context(|| format!("Invalid default_limit value: {}", value))?;
            }
            "search.max_limit" => {
                self.search.max_limit = value
                    .parse()
                    .with_context(|| format!("Invalid max_limit value: {}", value))?;
            }

            "server.bind_address" => {
                value
                    .parse::<std::net::SocketAddr>()
                    .with_context(|| format!("Invalid bind address: {}", value))?;
                self.server.bind_address = value.to_string();
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `atlas config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// Supported configuration keys
    pub fn keys() -> &'static [&'static str] {
        KEYS
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
