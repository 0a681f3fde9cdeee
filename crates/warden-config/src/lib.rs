//! Centralized configuration for the Warden service
//!
//! Configuration follows a simple hierarchy:
//! 1. Safe defaults (defined as constants)
//! 2. Optional TOML file
//! 3. Environment variable overrides
//! 4. Runtime validation
//!
//! The redirect allowlist is an ordinary configuration value. The host owns
//! its lifecycle: it is loaded at startup and may be reloaded later by running
//! the loader again and handing the result to the redirect guard.

pub mod error;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use source::{ConfigurationLoader, ConfigurationSource, EnvironmentSource, TomlFileSource};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

// =============================================================================
// SAFE DEFAULTS
// =============================================================================

// Quarantine storage
const DEFAULT_QUARANTINE_DIR: &str = "ftp/quarantine";

// Redirect allowlist - the shop's public outbound links
const DEFAULT_REDIRECT_ALLOWLIST: &[&str] = &[
    "https://github.com/juice-shop/juice-shop",
    "https://blockchain.info/address/1AbKfgvw9psQ41NbLi8kufDQTezwG8DRZm",
    "https://explorer.dash.org/address/Xr556RzuwX6hg5EGpkybbv5RanJoZN17kW",
    "https://etherscan.io/address/0x0f933ab9fcaaa782d0279c300d73750e1311eae6",
    "http://shop.spreadshirt.com/juiceshop",
    "http://shop.spreadshirt.de/juiceshop",
    "https://www.stickeryou.com/products/owasp-juice-shop/794",
    "http://leanpub.com/juice-shop",
];

// API Server Configuration
const DEFAULT_API_HOST: &str = "127.0.0.1"; // Localhost only for security
const DEFAULT_API_PORT: u16 = 3000;
const DEFAULT_API_TIMEOUT_SECONDS: u64 = 60;

// Telemetry Configuration
const DEFAULT_TRACING_LEVEL: &str = "info";
const DEFAULT_JSON_LOGS: bool = false;
const DEFAULT_TELEMETRY_SERVICE_NAME: &str = "warden";

/// Environment lookup used by the `apply_env` family
///
/// Production code passes `std::env::var`; tests pass a map so they never
/// touch the process environment.
pub trait EnvLookup {
    fn get(&self, key: &str) -> Option<String>;
}

impl<F> EnvLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Lookup backed by the real process environment
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_parse<T: FromStr>(env: &impl EnvLookup, key: &str) -> Option<T> {
    let raw = env.get(key)?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(key, value = %raw, "Ignoring unparseable environment override");
    }
    parsed
}

/// Core configuration for the whole service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Quarantine file serving
    pub quarantine: QuarantineConfig,

    /// Redirect allowlist
    pub redirect: RedirectConfig,

    /// API server configuration
    pub api: ApiConfig,

    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

/// Quarantine directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarantineConfig {
    /// Directory served by `/quarantine/{file}`; relative paths resolve
    /// against the working directory
    pub base_dir: PathBuf,
}

impl Default for QuarantineConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_QUARANTINE_DIR),
        }
    }
}

impl QuarantineConfig {
    /// Apply `WARDEN_QUARANTINE_DIR`
    pub fn apply_env(&mut self, env: &impl EnvLookup) {
        if let Some(dir) = env.get("WARDEN_QUARANTINE_DIR")
            && !dir.trim().is_empty()
        {
            self.base_dir = PathBuf::from(dir.trim());
        }
    }
}

impl validation::Validate for QuarantineConfig {
    fn validate(&self) -> ConfigResult<()> {
        // Existence is checked per request; a missing directory is a 500, not a boot failure
        validation::validate_non_empty(&self.base_dir.to_string_lossy(), "quarantine.base_dir")
    }
}

/// Redirect allowlist configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Full URLs; only their origins matter for permitting a redirect
    pub allowlist: Vec<String>,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            allowlist: DEFAULT_REDIRECT_ALLOWLIST
                .iter()
                .map(|url| (*url).to_string())
                .collect(),
        }
    }
}

impl RedirectConfig {
    /// Apply `WARDEN_REDIRECT_ALLOWLIST` (comma separated, replaces the list)
    pub fn apply_env(&mut self, env: &impl EnvLookup) {
        if let Some(raw) = env.get("WARDEN_REDIRECT_ALLOWLIST") {
            self.allowlist = raw
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(ToString::to_string)
                .collect();
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_API_HOST.to_string(),
            port: DEFAULT_API_PORT,
            timeout_seconds: DEFAULT_API_TIMEOUT_SECONDS,
        }
    }
}

impl ApiConfig {
    /// Apply `WARDEN_API_HOST`, `WARDEN_API_PORT` and `WARDEN_API_TIMEOUT_SECONDS`
    pub fn apply_env(&mut self, env: &impl EnvLookup) {
        if let Some(host) = env.get("WARDEN_API_HOST") {
            self.host = host;
        }
        if let Some(port) = env_parse(env, "WARDEN_API_PORT") {
            self.port = port;
        }
        if let Some(timeout) = env_parse(env, "WARDEN_API_TIMEOUT_SECONDS") {
            self.timeout_seconds = timeout;
        }
    }

    /// `host:port` for binding the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl validation::Validate for ApiConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.host, "api.host")?;
        validation::validate_port(self.port, "api.port")?;
        validation::validate_range(self.timeout_seconds, 1, 3600, "api.timeout_seconds")?;
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Tracing level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    pub tracing_level: String,

    /// Emit JSON log lines instead of the human-readable format
    pub json_logs: bool,

    /// Service name attached to the startup log line
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tracing_level: DEFAULT_TRACING_LEVEL.to_string(),
            json_logs: DEFAULT_JSON_LOGS,
            service_name: DEFAULT_TELEMETRY_SERVICE_NAME.to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Apply `WARDEN_TELEMETRY_*` overrides
    pub fn apply_env(&mut self, env: &impl EnvLookup) {
        if let Some(level) = env.get("WARDEN_TELEMETRY_TRACING_LEVEL") {
            self.tracing_level = level;
        }
        if let Some(json) = env_parse(env, "WARDEN_TELEMETRY_JSON_LOGS") {
            self.json_logs = json;
        }
        if let Some(name) = env.get("WARDEN_TELEMETRY_SERVICE_NAME") {
            self.service_name = name;
        }
    }
}

impl validation::Validate for TelemetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.service_name, "telemetry.service_name")?;

        match self.tracing_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::Generic {
                message: format!("Invalid tracing level: {}", self.tracing_level),
            }),
        }
    }
}

impl ApplicationConfig {
    /// Defaults with environment variable overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(&process_env);
        config
    }

    /// Layer environment overrides onto this configuration
    pub fn apply_env(&mut self, env: &impl EnvLookup) {
        self.quarantine.apply_env(env);
        self.redirect.apply_env(env);
        self.api.apply_env(env);
        self.telemetry.apply_env(env);
    }
}

impl validation::Validate for ApplicationConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.quarantine.validate()?;
        // Allowlist entries are checked, and malformed ones skipped, when the guard builds its allowlist
        self.api.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}
