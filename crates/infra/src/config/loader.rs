//! Configuration loader
//!
//! Loads the client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `PAYRUN_CONSUMER_KEY`: OAuth consumer key (required)
//! - `PAYRUN_CONSUMER_SECRET`: OAuth consumer secret (required)
//! - `PAYRUN_API_ENDPOINT`: Base URL of the API (required)
//! - `PAYRUN_CONTENT_TYPE`: Content type of request payloads
//! - `PAYRUN_ACCEPT`: Accept header value
//! - `PAYRUN_API_VERSION`: Token sent as the `Api-Version` header
//! - `PAYRUN_MAX_ATTEMPTS`: Attempt ceiling for refused connections
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./payrun.toml`, `./payrun.json`, `./config.toml`, `./config.json`
//!    (current working directory)
//! 2. The same names in the parent directory
//! 3. The same names next to the executable
//!
//! The loaded configuration is always passed through
//! [`ClientConfig::validate`].

use std::path::{Path, PathBuf};

use payrun_domain::{ClientConfig, Credentials, EndpointConfig, PayRunError, Result};

/// Config file names, in probe order.
const CONFIG_FILE_NAMES: [&str; 4] = ["payrun.toml", "payrun.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `PayRunError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or invalid
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `PayRunError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<ClientConfig> {
    let credentials =
        Credentials::new(env_var("PAYRUN_CONSUMER_KEY")?, env_var("PAYRUN_CONSUMER_SECRET")?);

    let mut endpoint = EndpointConfig::new(env_var("PAYRUN_API_ENDPOINT")?);
    if let Some(content_type) = optional_env_var("PAYRUN_CONTENT_TYPE") {
        endpoint.content_type = content_type;
    }
    if let Some(accept) = optional_env_var("PAYRUN_ACCEPT") {
        endpoint.accept = accept;
    }
    endpoint.api_version = optional_env_var("PAYRUN_API_VERSION");

    let mut config = ClientConfig::new(credentials, endpoint);
    if let Some(attempts) = optional_env_var("PAYRUN_MAX_ATTEMPTS") {
        config.retry.max_attempts = attempts
            .parse::<u32>()
            .map_err(|e| PayRunError::Config(format!("Invalid PAYRUN_MAX_ATTEMPTS: {e}")))?;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `PayRunError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The parsed configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                let message = format!("Config file not found: {}", p.display());
                return Err(PayRunError::Config(message));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PayRunError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PayRunError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PayRunError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PayRunError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(PayRunError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    let found = candidates_in(&roots).find(|path| path.exists());
    found
}

fn candidates_in(roots: &[PathBuf]) -> impl Iterator<Item = PathBuf> + '_ {
    roots.iter().flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        PayRunError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Optional variable; unset and blank are treated alike.
fn optional_env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 7] = [
        "PAYRUN_CONSUMER_KEY",
        "PAYRUN_CONSUMER_SECRET",
        "PAYRUN_API_ENDPOINT",
        "PAYRUN_CONTENT_TYPE",
        "PAYRUN_ACCEPT",
        "PAYRUN_API_VERSION",
        "PAYRUN_MAX_ATTEMPTS",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_env_required_vars() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("PAYRUN_CONSUMER_KEY", "key");
        std::env::set_var("PAYRUN_CONSUMER_SECRET", "secret");
        std::env::set_var("PAYRUN_API_ENDPOINT", "https://api.test.payrun.io");

        let config = load_from_env().expect("config from env");
        assert_eq!(config.credentials.consumer_key, "key");
        assert_eq!(config.endpoint.base_url, "https://api.test.payrun.io");
        assert_eq!(config.endpoint.content_type, "application/xml");
        assert_eq!(config.endpoint.api_version, None);
        assert_eq!(config.retry.max_attempts, 5);

        clear_env();
    }

    #[test]
    fn test_load_from_env_optional_vars() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("PAYRUN_CONSUMER_KEY", "key");
        std::env::set_var("PAYRUN_CONSUMER_SECRET", "secret");
        std::env::set_var("PAYRUN_API_ENDPOINT", "https://api.test.payrun.io");
        std::env::set_var("PAYRUN_CONTENT_TYPE", "application/json");
        std::env::set_var("PAYRUN_ACCEPT", "application/json");
        std::env::set_var("PAYRUN_API_VERSION", "18.19.1.481");
        std::env::set_var("PAYRUN_MAX_ATTEMPTS", "3");

        let config = load_from_env().expect("config from env");
        assert_eq!(config.endpoint.content_type, "application/json");
        assert_eq!(config.endpoint.accept, "application/json");
        assert_eq!(config.endpoint.api_version.as_deref(), Some("18.19.1.481"));
        assert_eq!(config.retry.max_attempts, 3);

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("PAYRUN_CONSUMER_KEY", "key");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, PayRunError::Config(_)), "Should be a Config error");

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("PAYRUN_CONSUMER_KEY", "key");
        std::env::set_var("PAYRUN_CONSUMER_SECRET", "secret");
        std::env::set_var("PAYRUN_API_ENDPOINT", "https://api.test.payrun.io");
        std::env::set_var("PAYRUN_MAX_ATTEMPTS", "many");

        let err = load_from_env().unwrap_err();
        let PayRunError::Config(message) = err else {
            panic!("expected a Config error, got {err:?}");
        };
        assert!(message.contains("PAYRUN_MAX_ATTEMPTS"));

        clear_env();
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_content = r#"
[credentials]
consumer_key = "key"
consumer_secret = "secret"

[endpoint]
base_url = "https://api.test.payrun.io"
content_type = "application/json"

[retry]
max_attempts = 4
base_delay_ms = 50
max_delay_ms = 800
"#;

        let config = parse_config(toml_content, Path::new("payrun.toml")).expect("valid TOML");
        assert_eq!(config.endpoint.content_type, "application/json");
        assert_eq!(config.endpoint.accept, "application/xml");
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.max_delay_ms, 800);
    }

    #[test]
    fn test_parse_config_partial_retry_section() {
        let toml_content = r#"
[credentials]
consumer_key = "key"
consumer_secret = "secret"

[endpoint]
base_url = "https://api.test.payrun.io"

[retry]
max_attempts = 3
"#;

        let config = parse_config(toml_content, Path::new("payrun.toml")).expect("valid TOML");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 100);
        assert_eq!(config.retry.max_delay_ms, 3_200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config_json() {
        let json_content = r#"{
            "credentials": { "consumer_key": "key", "consumer_secret": "secret" },
            "endpoint": { "base_url": "http://localhost:8080", "api_version": "18.19.1.481" }
        }"#;

        let config = parse_config(json_content, Path::new("payrun.json")).expect("valid JSON");
        assert_eq!(config.endpoint.api_version.as_deref(), Some("18.19.1.481"));
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", Path::new("payrun.yaml"));
        assert!(matches!(result, Err(PayRunError::Config(_))));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/payrun.toml")));
        assert!(matches!(result, Err(PayRunError::Config(_))));
    }

    #[test]
    fn test_candidates_follow_probe_order() {
        let roots = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        let candidates: Vec<_> = candidates_in(&roots).collect();

        assert_eq!(candidates.len(), 8);
        assert_eq!(candidates[0], PathBuf::from("/a/payrun.toml"));
        assert_eq!(candidates[3], PathBuf::from("/a/config.json"));
        assert_eq!(candidates[4], PathBuf::from("/b/payrun.toml"));
    }
}
