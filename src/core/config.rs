//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.waypoint/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::failure::{Failure, FailureKind};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WaypointConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub containers: ContainerConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ContainerConfig {
    pub emit_loading: Option<bool>,
    pub use_case_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NavigationConfig {
    pub max_redirects: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RepositoryConfig {
    pub base_url: Option<String>,
    pub cache_dir: Option<String>,
    pub retry_attempts: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_LOG_LEVEL: &str = "debug";
pub const DEFAULT_USE_CASE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub log_level: String,
    pub emit_loading: bool,
    pub use_case_timeout: Duration,
    pub max_redirects: usize,
    pub base_url: String,
    pub cache_dir: PathBuf,
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
    pub request_timeout: Duration,
}

/// Values that came from CLI flags. `None` = not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub log_level: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Failure {
    fn from(e: ConfigError) -> Self {
        let kind = match e {
            ConfigError::Io(_) => FailureKind::Unknown,
            ConfigError::Parse(_) => FailureKind::MalformedData,
        };
        Failure::new(kind, e.to_string()).with_cause(e)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.waypoint`.
pub fn waypoint_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".waypoint"))
}

/// Returns the path to `~/.waypoint/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    waypoint_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.waypoint/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `WaypointConfig::default()`.
pub fn load_config() -> Result<WaypointConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(WaypointConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(WaypointConfig::default());
    }

    load_config_from(&path)
}

/// Load config from an explicit path. A malformed file is an error.
pub fn load_config_from(path: &Path) -> Result<WaypointConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: WaypointConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# Waypoint Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# log_level = "debug"              # "error", "warn", "info", "debug", "trace"

# [containers]
# emit_loading = false             # emit Loading before each use case runs
# use_case_timeout_ms = 10000

# [navigation]
# max_redirects = 5                # chained redirects before RedirectLoop

# [repository]
# base_url = "http://localhost:8080"   # Or set WAYPOINT_BASE_URL env var
# cache_dir = "/home/me/.waypoint/cache"  # Or set WAYPOINT_CACHE_DIR
# retry_attempts = 3
# retry_backoff_ms = 100
# request_timeout_ms = 5000
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Parses a configured log level (`off`, `error` ... `trace`, any case).
/// `None` means the value is not a level.
pub fn log_level_filter(level: &str) -> Option<LevelFilter> {
    level.trim().parse().ok()
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &WaypointConfig, cli: &CliOverrides) -> ResolvedConfig {
    // Log level: CLI → env → config → default
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("WAYPOINT_LOG_LEVEL").ok())
        .or_else(|| config.general.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    // Base URL: CLI → env → config → default
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| std::env::var("WAYPOINT_BASE_URL").ok())
        .or_else(|| config.repository.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Cache dir: env → config → ~/.waypoint/cache → ./.waypoint-cache
    let cache_dir = std::env::var("WAYPOINT_CACHE_DIR")
        .ok()
        .or_else(|| config.repository.cache_dir.clone())
        .map(PathBuf::from)
        .or_else(|| waypoint_dir().map(|d| d.join("cache")))
        .unwrap_or_else(|| PathBuf::from(".waypoint-cache"));

    let repository = &config.repository;
    ResolvedConfig {
        log_level,
        emit_loading: config.containers.emit_loading.unwrap_or(false),
        use_case_timeout: Duration::from_millis(
            config
                .containers
                .use_case_timeout_ms
                .unwrap_or(DEFAULT_USE_CASE_TIMEOUT_MS),
        ),
        max_redirects: config
            .navigation
            .max_redirects
            .unwrap_or(DEFAULT_MAX_REDIRECTS),
        base_url,
        cache_dir,
        retry_attempts: repository.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS),
        retry_backoff: Duration::from_millis(
            repository
                .retry_backoff_ms
                .unwrap_or(DEFAULT_RETRY_BACKOFF_MS),
        ),
        request_timeout: Duration::from_millis(
            repository
                .request_timeout_ms
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        ),
    }
}
