use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::git::{GitRunner, RunnerOptions};
use crate::tools::ToolContext;
use crate::transport::SseOptions;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub git: GitConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub queue_capacity: usize,
    /// Events buffered for a slow SSE client before sends wait
    pub outbound_capacity: usize,
    /// Seconds between SSE keep-alive comments, 0 disables them
    pub keep_alive_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GitConfig {
    pub binary: String,
    pub timeout_seconds: u64,
    pub max_stderr_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub max_patch_lines: i64,
    pub default_log_count: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            queue_capacity: 16,
            outbound_capacity: 16,
            keep_alive_seconds: 15,
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            timeout_seconds: 30,
            max_stderr_bytes: 4096,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_patch_lines: 2000,
            default_log_count: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("gitbridge"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the default config file, falling back to built-in defaults when
    /// it does not exist
    pub fn load() -> Result<Self, ConfigError> {
        let path = match Self::config_path() {
            Ok(path) => path,
            Err(ConfigError::DirectoryNotFound) => return Ok(Self::default_config()),
            Err(e) => return Err(e),
        };

        if !path.exists() {
            return Ok(Self::default_config());
        }

        Self::load_from(&path)
    }

    /// Load configuration from an explicit file, which must exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;

        Ok(())
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            server: ServerConfig::default(),
            git: GitConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.parse::<IpAddr>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "bind must be an IP address, got '{}'",
                self.server.bind
            )));
        }

        if self.server.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }

        if self.server.outbound_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "outbound_capacity must be greater than 0".to_string(),
            ));
        }

        if self.git.binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue("git binary must not be empty".to_string()));
        }

        if self.git.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "Unknown log level: {}. Expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Address the SSE transport listens on
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .server
            .bind
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("bad bind address: {}", self.server.bind)))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            binary: self.git.binary.clone(),
            timeout: Duration::from_secs(self.git.timeout_seconds),
            max_stderr_bytes: self.git.max_stderr_bytes,
        }
    }

    pub fn sse_options(&self) -> SseOptions {
        SseOptions {
            queue_capacity: self.server.queue_capacity,
            outbound_capacity: self.server.outbound_capacity,
            keep_alive: (self.server.keep_alive_seconds > 0)
                .then(|| Duration::from_secs(self.server.keep_alive_seconds)),
        }
    }

    pub fn tool_context(&self) -> ToolContext {
        ToolContext {
            runner: GitRunner::new(self.runner_options()),
            max_patch_lines: self.output.max_patch_lines,
            default_log_count: self.output.default_log_count.max(1),
        }
    }
}
