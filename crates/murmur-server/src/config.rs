//! Server configuration loading from file and environment variables.

use murmur_tts::{AzureSpeechConfig, OpenAiSpeechConfig};
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Access control for the speech endpoints.
    #[serde(default)]
    pub access: AccessConfig,

    /// Key-authenticated provider credentials.
    #[serde(default)]
    pub openai: OpenAiSpeechConfig,

    /// Token-authenticated provider credentials.
    #[serde(default)]
    pub azure: AzureSpeechConfig,

    /// Upstream call tuning.
    #[serde(default)]
    pub tts: TtsTuning,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "murmur_tts=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Shared access code guarding the speech endpoints.
#[derive(Clone, Default, Deserialize)]
pub struct AccessConfig {
    /// When set and non-empty, requests must present this code.
    #[serde(default)]
    pub code: Option<String>,
}

impl AccessConfig {
    /// The configured code, ignoring an empty value.
    pub fn required_code(&self) -> Option<&str> {
        self.code.as_deref().filter(|c| !c.is_empty())
    }
}

impl fmt::Debug for AccessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessConfig")
            .field("code", &self.code.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Timing for upstream provider calls.
#[derive(Debug, Clone, Deserialize)]
pub struct TtsTuning {
    /// How long an issued bearer token is reused.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Timeout applied to every upstream request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl TtsTuning {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_token_ttl_secs() -> u64 {
    murmur_tts::TOKEN_TTL.as_secs()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for TtsTuning {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `MURMUR_HOST` overrides `server.host`
/// - `MURMUR_PORT` overrides `server.port`
/// - `MURMUR_LOG_LEVEL` overrides `logging.level`
/// - `MURMUR_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `OPENAI_API_KEY` / `OPENAI_API_HOST` override `openai.api_key` / `openai.host`
/// - `AZURE_SUBKEY` / `AZURE_ORIGIN` override `azure.subscription_key` / `azure.region`
/// - `ACCESS_CODE` overrides `access.code`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = read_config_file(path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn read_config_file(path: Option<&str>) -> Result<Config, ConfigError> {
    match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Ok(Config::default())
            }
            Err(e) => Err(ConfigError::FileRead(e)),
        },
        None => Ok(Config::default()),
    }
}

/// Applies overrides read through `lookup`, so tests never touch the process environment.
fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup("MURMUR_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("MURMUR_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(level) = lookup("MURMUR_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("MURMUR_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(key) = lookup("OPENAI_API_KEY") {
        config.openai.api_key = key;
    }
    if let Some(host) = lookup("OPENAI_API_HOST").filter(|h| !h.is_empty()) {
        config.openai.host = host;
    }
    if let Some(key) = lookup("AZURE_SUBKEY") {
        config.azure.subscription_key = key;
    }
    if let Some(region) = lookup("AZURE_ORIGIN").filter(|r| !r.is_empty()) {
        config.azure.region = region;
    }
    if let Some(code) = lookup("ACCESS_CODE") {
        config.access.code = Some(code);
    }
}
