//! Configuration management
//!
//! This module handles loading and parsing configuration for the newsdesk service.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Externally visible base URL, used as the prefix of every hypermedia link
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            public_url: default_public_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL or file path
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Upper bound of pooled connections (in-memory databases always use one)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "data/newsdesk.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

/// REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API versions accepted in the `/api/v{n}` path segment
    #[serde(default = "default_supported_versions")]
    pub supported_versions: Vec<u32>,
    /// Page size used when a list request does not give one
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Largest page size a client may request
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            supported_versions: default_supported_versions(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_supported_versions() -> Vec<u32> {
    vec![1, 2]
}

fn default_page_size() -> u32 {
    5
}

fn default_max_page_size() -> u32 {
    100
}

impl ApiConfig {
    /// Check whether a parsed API version is served
    pub fn supports(&self, version: u32) -> bool {
        self.supported_versions.contains(&version)
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        // Handle empty file - return defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - NEWSDESK_SERVER_HOST
    /// - NEWSDESK_SERVER_PORT
    /// - NEWSDESK_SERVER_CORS_ORIGIN
    /// - NEWSDESK_SERVER_PUBLIC_URL
    /// - NEWSDESK_DATABASE_URL
    /// - NEWSDESK_DATABASE_MAX_CONNECTIONS
    /// - NEWSDESK_API_DEFAULT_PAGE_SIZE
    ///
    /// The merged result is validated before it is returned.
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("NEWSDESK_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("NEWSDESK_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("NEWSDESK_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }
        if let Ok(public_url) = std::env::var("NEWSDESK_SERVER_PUBLIC_URL") {
            self.server.public_url = public_url;
        }

        // Database configuration
        if let Ok(url) = std::env::var("NEWSDESK_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(max) = std::env::var("NEWSDESK_DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse::<u32>() {
                self.database.max_connections = max;
            }
        }

        // API configuration
        if let Ok(size) = std::env::var("NEWSDESK_API_DEFAULT_PAGE_SIZE") {
            if let Ok(size) = size.parse::<u32>() {
                self.api.default_page_size = size;
            }
        }
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be greater than 0".to_string(),
            ));
        }
        if self.api.supported_versions.is_empty() {
            return Err(ConfigError::ValidationError(
                "api.supported_versions must list at least one version".to_string(),
            ));
        }
        if self.api.default_page_size == 0 {
            return Err(ConfigError::ValidationError(
                "api.default_page_size must be greater than 0".to_string(),
            ));
        }
        if self.api.default_page_size > self.api.max_page_size {
            return Err(ConfigError::ValidationError(format!(
                "api.default_page_size ({}) exceeds api.max_page_size ({})",
                self.api.default_page_size, self.api.max_page_size
            )));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "NEWSDESK_SERVER_HOST",
    "NEWSDESK_SERVER_PORT",
    "NEWSDESK_SERVER_CORS_ORIGIN",
    "NEWSDESK_SERVER_PUBLIC_URL",
    "NEWSDESK_DATABASE_URL",
    "NEWSDESK_DATABASE_MAX_CONNECTIONS",
    "NEWSDESK_API_DEFAULT_PAGE_SIZE",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}
