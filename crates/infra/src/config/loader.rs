//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `POSTDECK_BACKEND_URL` is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `POSTDECK_BACKEND_URL`: Backend base URL (required for env loading)
//! - `POSTDECK_BACKEND_TIMEOUT`: Request timeout in seconds
//! - `POSTDECK_DUE_SCAN_INTERVAL`: Due-scan tick interval in seconds
//! - `POSTDECK_PRUNE_INTERVAL`: Prune tick interval in seconds
//! - `POSTDECK_SCHEDULER_ENABLED`: Whether the background ticks run (true/false)
//! - `POSTDECK_STORAGE_BACKEND`: `file`, `sqlite` or `memory`
//! - `POSTDECK_STORAGE_PATH`: Store file path
//! - `POSTDECK_TIMEZONE`: IANA timezone for the calendar
//! - `POSTDECK_LOG_LEVEL`: Default log filter
//! - `POSTDECK_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes `postdeck.toml`, `postdeck.json`, `config.toml` and
//! `config.json` in the working directory, its two parents, and the same
//! three directories relative to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use postdeck_domain::{AppConfig, PostdeckError, Result, StorageBackend};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["postdeck.toml", "postdeck.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the backend URL is
/// not set, falls back to a config file. The result is validated either way.
///
/// # Errors
/// Returns `PostdeckError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value fails validation (unknown timezone, zero interval)
pub fn load() -> Result<AppConfig> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };
    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// Only `POSTDECK_BACKEND_URL` is required; every other value falls back to
/// its default.
///
/// # Errors
/// Returns `PostdeckError::Config` if the backend URL is missing or a value
/// cannot be parsed.
pub fn load_from_env() -> Result<AppConfig> {
    let mut config = AppConfig::default();
    config.backend.base_url = env_var("POSTDECK_BACKEND_URL")?;

    if let Some(timeout) = env_parse::<u64>("POSTDECK_BACKEND_TIMEOUT")? {
        config.backend.timeout_secs = timeout;
    }
    if let Some(interval) = env_parse::<u64>("POSTDECK_DUE_SCAN_INTERVAL")? {
        config.scheduler.due_scan_interval_secs = interval;
    }
    if let Some(interval) = env_parse::<u64>("POSTDECK_PRUNE_INTERVAL")? {
        config.scheduler.prune_interval_secs = interval;
    }
    config.scheduler.enabled = env_bool("POSTDECK_SCHEDULER_ENABLED", config.scheduler.enabled);

    if let Some(backend) = env_parse::<StorageBackend>("POSTDECK_STORAGE_BACKEND")? {
        config.storage.backend = backend;
    }
    if let Ok(path) = std::env::var("POSTDECK_STORAGE_PATH") {
        config.storage.path = path;
    }
    if let Ok(tz) = std::env::var("POSTDECK_TIMEZONE") {
        config.calendar.timezone = tz;
    }
    if let Ok(level) = std::env::var("POSTDECK_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("POSTDECK_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `PostdeckError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PostdeckError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PostdeckError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PostdeckError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PostdeckError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PostdeckError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(PostdeckError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Returns the first existing candidate, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots.iter().flat_map(|root| candidates_under(root)).find(|path| path.exists())
}

/// Candidate file paths under `root` and its two parents, nearest first.
fn candidates_under(root: &Path) -> Vec<PathBuf> {
    root.ancestors()
        .take(3)
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .collect()
}

/// Get required environment variable
///
/// # Errors
/// Returns `PostdeckError::Config` if the variable is not set or blank.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| PostdeckError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional environment variable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| PostdeckError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::TempDir;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ENV_KEYS: [&str; 10] = [
        "POSTDECK_BACKEND_URL",
        "POSTDECK_BACKEND_TIMEOUT",
        "POSTDECK_DUE_SCAN_INTERVAL",
        "POSTDECK_PRUNE_INTERVAL",
        "POSTDECK_SCHEDULER_ENABLED",
        "POSTDECK_STORAGE_BACKEND",
        "POSTDECK_STORAGE_PATH",
        "POSTDECK_TIMEZONE",
        "POSTDECK_LOG_LEVEL",
        "POSTDECK_LOG_JSON",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for (value, expected) in [("1", true), ("TRUE", true), ("on", true), ("no", false)] {
            std::env::set_var("POSTDECK_TEST_BOOL", value);
            assert_eq!(env_bool("POSTDECK_TEST_BOOL", !expected), expected, "value {value}");
        }
        std::env::remove_var("POSTDECK_TEST_BOOL");
        assert!(env_bool("POSTDECK_TEST_BOOL", true));
    }

    #[test]
    fn test_load_from_env_overrides_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("POSTDECK_BACKEND_URL", "http://backend:9000");
        std::env::set_var("POSTDECK_DUE_SCAN_INTERVAL", "15");
        std::env::set_var("POSTDECK_STORAGE_BACKEND", "sqlite");
        std::env::set_var("POSTDECK_STORAGE_PATH", "/tmp/postdeck.db");
        std::env::set_var("POSTDECK_TIMEZONE", "Asia/Tokyo");
        std::env::set_var("POSTDECK_SCHEDULER_ENABLED", "false");

        let config = load_from_env().expect("env config");
        clear_env();

        assert_eq!(config.backend.base_url, "http://backend:9000");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.scheduler.due_scan_interval_secs, 15);
        assert_eq!(config.scheduler.prune_interval_secs, 30);
        assert!(!config.scheduler.enabled);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.path, "/tmp/postdeck.db");
        assert_eq!(config.calendar.timezone, "Asia/Tokyo");
    }

    #[test]
    fn test_load_from_env_missing_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, PostdeckError::Config(msg) if msg.contains("POSTDECK_BACKEND_URL")));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("POSTDECK_BACKEND_URL", "http://backend:9000");
        std::env::set_var("POSTDECK_PRUNE_INTERVAL", "soon");
        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(PostdeckError::Config(msg)) if msg.contains("PRUNE")));
    }

    #[test]
    fn test_load_from_file_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("postdeck.toml");
        std::fs::write(
            &path,
            r#"
[backend]
base_url = "http://127.0.0.1:8000"

[calendar]
timezone = "Europe/Berlin"

[scheduler]
enabled = false
"#,
        )
        .unwrap();

        let config = load_from_file(Some(path)).expect("toml config");
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.calendar.timezone, "Europe/Berlin");
        assert!(!config.scheduler.enabled);
        assert_eq!(config.storage.backend, StorageBackend::File);
    }

    #[test]
    fn test_load_from_file_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"storage": {"backend": "memory"}, "logging": {"json": true}}"#)
            .unwrap();

        let config = load_from_file(Some(path)).expect("json config");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.logging.json);
        assert_eq!(config.backend.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/postdeck.toml")));
        assert!(matches!(result, Err(PostdeckError::Config(_))));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "backend": "#).unwrap();
        assert!(load_from_file(Some(path)).is_err());
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", Path::new("postdeck.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }

    #[test]
    fn test_candidates_prefer_nearest_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("a").join("config.json"), "{}").unwrap();
        std::fs::write(dir.path().join("postdeck.toml"), "").unwrap();

        let found = candidates_under(&nested).into_iter().find(|p| p.exists()).unwrap();
        assert_eq!(found, dir.path().join("a").join("config.json"));
    }
}
