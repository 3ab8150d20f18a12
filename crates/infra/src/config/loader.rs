//! Configuration loader
//!
//! Loads sync configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables (anchored on
//!    `ERP_BASE_URL`)
//! 2. If that is absent, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//! 5. With neither source, boots on defaults; ERP operations then fail the
//!    configuration gate
//!
//! ## Environment Variables
//! - `ERP_BASE_URL`, `ERP_USERNAME`, `ERP_PASSWORD`: ERP endpoint and credentials
//! - `ERP_TOKEN_FILE`, `ERP_TOKEN_KEY`: bearer token side-channel file and key
//! - `ERP_TIMEOUT_SECS`: per-call timeout
//! - `ERP_ACCEPT_INVALID_CERTS`: accept self-signed certificates (true/false)
//! - `ERPSYNC_DB_PATH`, `ERPSYNC_DB_POOL_SIZE`: local SQLite database
//! - `ERP_DEFAULT_TYPE_CODE`, `ERP_DEFAULT_CARRIER_CODE`,
//!   `ERP_DEFAULT_PRICE_LIST_CODE`, `ERP_DEFAULT_BILLING_METHOD_CODE`,
//!   `ERP_DEFAULT_ACTIVITY_BRANCH_CODE`, `ERP_DEFAULT_PAYMENT_CONDITION_CODE`,
//!   `ERP_DEFAULT_COUNTRY_CODE`, `ERP_DEFAULT_SALES_REP_CODE`: mapper defaults
//! - `ERPSYNC_CATALOG_CARRIER_ID`, `ERPSYNC_CATALOG_PRICE_LIST_ID`,
//!   `ERPSYNC_CATALOG_BILLING_METHOD_ID`, `ERPSYNC_CATALOG_ACTIVITY_BRANCH_ID`:
//!   catalog ids stamped on reconciled registrations
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./erpsync.{json,toml}` then `./config.{json,toml}` (current directory)
//! 2. `../config.{json,toml}` and `../../config.{json,toml}`
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use erpsync_domain::{
    CatalogIds, Config, DatabaseConfig, ErpConfig, ErpDefaults, ErpSyncError, Result,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If `ERP_BASE_URL` is
/// not set, falls back to a config file; if no file exists either, returns
/// the defaults.
///
/// # Errors
/// Returns `ErpSyncError::Config` if an environment value or the config file
/// is present but invalid.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path)),
                None => {
                    tracing::warn!(
                        "No ERP configuration found; integration operations will be rejected"
                    );
                    Ok(Config::default())
                }
            }
        }
    }
}

/// Load configuration from environment variables
///
/// `ERP_BASE_URL` must be present; every other variable is optional and
/// falls back to its default.
///
/// # Errors
/// Returns `ErpSyncError::Config` if `ERP_BASE_URL` is missing or a numeric
/// variable cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    let base_url = env_var("ERP_BASE_URL")?;
    let base = ErpConfig::default();
    let base_defaults = ErpDefaults::default();
    let base_db = DatabaseConfig::default();

    let erp = ErpConfig {
        base_url: Some(base_url),
        username: env_opt("ERP_USERNAME"),
        password: env_opt("ERP_PASSWORD"),
        token_file: env_opt("ERP_TOKEN_FILE").map(PathBuf::from).unwrap_or(base.token_file),
        token_key: env_opt("ERP_TOKEN_KEY").unwrap_or(base.token_key),
        timeout_seconds: env_parse("ERP_TIMEOUT_SECS", base.timeout_seconds)?,
        accept_invalid_certs: env_bool("ERP_ACCEPT_INVALID_CERTS", base.accept_invalid_certs),
    };

    let database = DatabaseConfig {
        path: env_opt("ERPSYNC_DB_PATH").unwrap_or(base_db.path),
        pool_size: env_parse("ERPSYNC_DB_POOL_SIZE", base_db.pool_size)?,
    };

    let defaults = ErpDefaults {
        type_code: env_opt("ERP_DEFAULT_TYPE_CODE").unwrap_or(base_defaults.type_code),
        carrier_code: env_opt("ERP_DEFAULT_CARRIER_CODE").unwrap_or(base_defaults.carrier_code),
        price_list_code: env_opt("ERP_DEFAULT_PRICE_LIST_CODE")
            .unwrap_or(base_defaults.price_list_code),
        billing_method_code: env_opt("ERP_DEFAULT_BILLING_METHOD_CODE")
            .unwrap_or(base_defaults.billing_method_code),
        activity_branch_code: env_opt("ERP_DEFAULT_ACTIVITY_BRANCH_CODE")
            .unwrap_or(base_defaults.activity_branch_code),
        payment_condition_code: env_opt("ERP_DEFAULT_PAYMENT_CONDITION_CODE")
            .unwrap_or(base_defaults.payment_condition_code),
        country_code: env_opt("ERP_DEFAULT_COUNTRY_CODE").unwrap_or(base_defaults.country_code),
        sales_rep_code: env_opt("ERP_DEFAULT_SALES_REP_CODE")
            .unwrap_or(base_defaults.sales_rep_code),
    };

    let catalog_ids = CatalogIds {
        carrier_id: env_parse_opt("ERPSYNC_CATALOG_CARRIER_ID")?,
        price_list_id: env_parse_opt("ERPSYNC_CATALOG_PRICE_LIST_ID")?,
        billing_method_id: env_parse_opt("ERPSYNC_CATALOG_BILLING_METHOD_ID")?,
        activity_branch_id: env_parse_opt("ERPSYNC_CATALOG_ACTIVITY_BRANCH_ID")?,
    };

    Ok(Config { erp, database, defaults, catalog_ids })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ErpSyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ErpSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ErpSyncError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ErpSyncError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, detecting the format by
/// extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ErpSyncError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ErpSyncError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(ErpSyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

const CONFIG_FILE_NAMES: [&str; 4] = ["erpsync.json", "erpsync.toml", "config.json", "config.toml"];

/// Probe multiple paths for configuration files
///
/// Returns the first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.is_file())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)).collect();
    for parent in ["..", "../.."] {
        candidates.push(dir.join(parent).join("config.json"));
        candidates.push(dir.join(parent).join("config.toml"));
    }
    candidates
}

/// Get required environment variable
///
/// # Errors
/// Returns `ErpSyncError::Config` if the variable is not set or blank.
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        ErpSyncError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional environment variable; blank counts as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(env_parse_opt(key)?.unwrap_or(default))
}

fn env_parse_opt<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| ErpSyncError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
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
    use std::io::Write;
    use std::sync::Mutex;

    use erpsync_domain::constants::{DEFAULT_DB_PATH, DEFAULT_TOKEN_KEY};
    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ERP_VARS: &[&str] = &[
        "ERP_BASE_URL",
        "ERP_USERNAME",
        "ERP_PASSWORD",
        "ERP_TOKEN_FILE",
        "ERP_TOKEN_KEY",
        "ERP_TIMEOUT_SECS",
        "ERP_ACCEPT_INVALID_CERTS",
        "ERPSYNC_DB_PATH",
        "ERPSYNC_DB_POOL_SIZE",
        "ERP_DEFAULT_CARRIER_CODE",
        "ERPSYNC_CATALOG_CARRIER_ID",
    ];

    fn clear_vars() {
        for key in ERP_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("TEST_ERP_BOOL_YES", "yes");
        std::env::set_var("TEST_ERP_BOOL_UPPER", "TRUE");
        std::env::set_var("TEST_ERP_BOOL_OFF", "off");

        assert!(env_bool("TEST_ERP_BOOL_YES", false));
        assert!(env_bool("TEST_ERP_BOOL_UPPER", false));
        assert!(!env_bool("TEST_ERP_BOOL_OFF", true));

        std::env::remove_var("TEST_ERP_BOOL_MISSING");
        assert!(env_bool("TEST_ERP_BOOL_MISSING", true));

        std::env::remove_var("TEST_ERP_BOOL_YES");
        std::env::remove_var("TEST_ERP_BOOL_UPPER");
        std::env::remove_var("TEST_ERP_BOOL_OFF");
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_vars();

        std::env::set_var("ERP_BASE_URL", "https://erp.example.com");
        std::env::set_var("ERP_USERNAME", "portal");
        std::env::set_var("ERP_PASSWORD", "s3cret");
        std::env::set_var("ERP_TOKEN_FILE", "/tmp/erp-token");
        std::env::set_var("ERP_TIMEOUT_SECS", "12");
        std::env::set_var("ERP_ACCEPT_INVALID_CERTS", "on");
        std::env::set_var("ERPSYNC_DB_PATH", "/tmp/erpsync.db");
        std::env::set_var("ERPSYNC_DB_POOL_SIZE", "8");
        std::env::set_var("ERP_DEFAULT_CARRIER_CODE", "000042");
        std::env::set_var("ERPSYNC_CATALOG_CARRIER_ID", "3");

        let result = load_from_env();
        clear_vars();

        let config = result.expect("config from env");
        assert_eq!(config.erp.base_url.as_deref(), Some("https://erp.example.com"));
        assert!(config.erp.is_configured());
        assert_eq!(config.erp.token_file, PathBuf::from("/tmp/erp-token"));
        assert_eq!(config.erp.token_key, DEFAULT_TOKEN_KEY);
        assert_eq!(config.erp.timeout_seconds, 12);
        assert!(config.erp.accept_invalid_certs);
        assert_eq!(config.database.path, "/tmp/erpsync.db");
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.defaults.carrier_code, "000042");
        assert_eq!(config.defaults.price_list_code, "001");
        assert_eq!(config.catalog_ids.carrier_id, Some(3));
        assert_eq!(config.catalog_ids.price_list_id, None);
    }

    #[test]
    fn test_load_from_env_missing_base_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_vars();
        std::env::set_var("ERP_USERNAME", "portal");

        let result = load_from_env();
        clear_vars();

        assert!(matches!(result, Err(ErpSyncError::Config(msg)) if msg.contains("ERP_BASE_URL")));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_vars();
        std::env::set_var("ERP_BASE_URL", "https://erp.example.com");
        std::env::set_var("ERP_TIMEOUT_SECS", "soon");

        let result = load_from_env();
        clear_vars();

        assert!(matches!(result, Err(ErpSyncError::Config(msg)) if msg.contains("ERP_TIMEOUT_SECS")));
    }

    #[test]
    fn test_env_without_credentials_loads_but_fails_gate() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_vars();
        std::env::set_var("ERP_BASE_URL", "https://erp.example.com");

        let result = load_from_env();
        clear_vars();

        let config = result.expect("config from env");
        assert_eq!(config.database.path, DEFAULT_DB_PATH);
        assert!(matches!(config.erp.credentials(), Err(ErpSyncError::Config(_))));
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "erp": {
                "base_url": "https://erp.example.com",
                "username": "portal",
                "password": "s3cret",
                "timeout_seconds": 20
            },
            "database": { "path": "test.db", "pool_size": 2 }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(path).ok();

        let config = result.expect("config from JSON file");
        assert_eq!(config.erp.timeout_seconds, 20);
        assert_eq!(config.database.pool_size, 2);
        assert!(config.erp.is_configured());
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/erpsync.json")));
        assert!(matches!(result, Err(ErpSyncError::Config(_))));
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_content = r#"
[erp]
base_url = "https://erp.example.com"
timeout_seconds = 45

[defaults]
country_code = "1058"
"#;

        let config = parse_config(toml_content, &PathBuf::from("erpsync.toml")).unwrap();
        assert_eq!(config.erp.timeout_seconds, 45);
        assert_eq!(config.defaults.country_code, "1058");
        assert_eq!(config.defaults.type_code, "F");
    }

    #[test]
    fn test_parse_config_invalid_and_unsupported() {
        let invalid = parse_config(r#"{ "erp": "#, &PathBuf::from("erpsync.json"));
        assert!(matches!(invalid, Err(ErpSyncError::Config(msg)) if msg.contains("JSON")));

        let unsupported = parse_config("erp: {}", &PathBuf::from("erpsync.yaml"));
        assert!(unsupported.is_err());
    }

    #[test]
    fn test_probe_candidates_prefer_erpsync_names() {
        let dir = tempfile::tempdir().unwrap();
        let candidates = candidates_in(dir.path());

        assert_eq!(candidates[0], dir.path().join("erpsync.json"));
        assert_eq!(candidates[3], dir.path().join("config.toml"));
        assert!(candidates.iter().any(|p| p.ends_with("../config.json")));
    }
}
