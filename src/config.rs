//! Configuration module for the centroid finder server.
//!
//! Configuration is layered:
//!
//! 1. Built-in defaults (every section has them, so no file is required)
//! 2. `config.local.toml` or `config.toml` if present
//! 3. Environment variables (`HOST`, `PORT`, `VIDEOS_DIR`, `RESULTS_DIR`,
//!    `LOG_LEVEL`, `LOG_FORMAT`)
//!
//! # Example
//! ```rust,ignore
//! let config = Config::load_default()?;
//! let results = ResultsMount::resolve(config.storage.results_dir.as_deref());
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout in seconds
    pub request_timeout: u64,
    /// Maximum accepted request body in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout: 30,
            max_body_size: 1024 * 1024,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the input videos
    pub videos_dir: PathBuf,
    /// Directory served under `/results` and written to by jobs
    pub results_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            videos_dir: PathBuf::from("videos"),
            results_dir: None,
        }
    }
}

/// External programs the server delegates to
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Centroid analysis program, writes a CSV to `{output}`
    pub processor: CommandConfig,
    /// Frame extractor, writes a JPEG to stdout
    pub thumbnail: CommandConfig,
    /// Finished jobs older than this are forgotten; 0 keeps them forever
    pub job_retention_seconds: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            processor: CommandConfig::new(
                "java",
                &[
                    "-jar",
                    "processor.jar",
                    "{input}",
                    "{output}",
                    "{target_color}",
                    "{threshold}",
                ],
                3600,
            ),
            thumbnail: CommandConfig::new(
                "ffmpeg",
                &[
                    "-loglevel",
                    "error",
                    "-i",
                    "{input}",
                    "-vframes",
                    "1",
                    "-f",
                    "image2",
                    "-vcodec",
                    "mjpeg",
                    "pipe:1",
                ],
                30,
            ),
            job_retention_seconds: 24 * 60 * 60,
        }
    }
}

/// A program invocation template.
///
/// Arguments may contain `{input}`, `{output}`, `{target_color}`,
/// `{threshold}` and `{job_id}`, substituted per invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    60
}

impl CommandConfig {
    pub fn new(program: &str, args: &[&str], timeout_seconds: u64) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout_seconds,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Whether `/results` is served, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsMount {
    /// Serve files from this root
    Enabled(PathBuf),
    /// No results directory configured; the route is not mounted
    Disabled,
}

impl ResultsMount {
    /// Resolve the static mount from an optional results directory.
    ///
    /// An empty path counts as unset.
    pub fn resolve(results_dir: Option<&Path>) -> Self {
        match results_dir {
            Some(dir) if !dir.as_os_str().is_empty() => Self::Enabled(dir.to_path_buf()),
            _ => Self::Disabled,
        }
    }

    pub fn root(&self) -> Option<&Path> {
        match self {
            Self::Enabled(root) => Some(root),
            Self::Disabled => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// The startup warning for a disabled mount
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            Self::Enabled(_) => None,
            Self::Disabled => {
                Some("RESULTS_DIR environment variable not set. Static file serving disabled.")
            }
        }
    }
}

impl Config {
    /// Load configuration from a file path
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations, then apply the environment.
    ///
    /// Tries `config.local.toml`, then `config.toml`, then built-in defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        let mut config = if Path::new("config.local.toml").exists() {
            Self::load("config.local.toml")?
        } else if Path::new("config.toml").exists() {
            Self::load("config.toml")?
        } else {
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override settings from process environment variables
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Override settings from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(dir) = lookup("VIDEOS_DIR") {
            self.storage.videos_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("RESULTS_DIR") {
            self.storage.results_dir = if dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// The resolved `/results` mount
    pub fn results_mount(&self) -> ResultsMount {
        ResultsMount::resolve(self.storage.results_dir.as_deref())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "port must be greater than 0".to_string(),
            ));
        }

        for (name, command) in [
            ("processor", &self.processing.processor),
            ("thumbnail", &self.processing.thumbnail),
        ] {
            if command.program.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "processing.{}.program must not be empty",
                    name
                )));
            }
            if command.timeout_seconds == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "processing.{}.timeout_seconds must be greater than 0",
                    name
                )));
            }
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be one of: {:?}",
                valid_formats
            )));
        }

        Ok(())
    }
}
