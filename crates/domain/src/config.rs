//! Configuration structures
//!
//! The credential pair and base URL are optional at load time. They are
//! enforced by [`ErpConfig::credentials`] when an integration operation runs,
//! so a portal without ERP settings still boots and every sync short-circuits
//! with [`ErpSyncError::Config`].

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACTIVITY_BRANCH_CODE, DEFAULT_BILLING_METHOD_CODE, DEFAULT_CARRIER_CODE,
    DEFAULT_COUNTRY_CODE, DEFAULT_DB_PATH, DEFAULT_DB_POOL_SIZE, DEFAULT_PAYMENT_CONDITION_CODE,
    DEFAULT_PRICE_LIST_CODE, DEFAULT_SALES_REP_CODE, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_FILE,
    DEFAULT_TOKEN_KEY, DEFAULT_TYPE_CODE,
};
use crate::errors::{ErpSyncError, Result};

/// Top-level configuration for the sync core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub erp: ErpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub defaults: ErpDefaults,
    #[serde(default)]
    pub catalog_ids: CatalogIds,
}

/// Connection settings for the ERP REST API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErpConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Side-channel file holding the bearer token between runs.
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    #[serde(default = "default_token_key")]
    pub token_key: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Accept self-signed TLS certificates (on-premise test instances).
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            username: None,
            password: None,
            token_file: default_token_file(),
            token_key: default_token_key(),
            timeout_seconds: default_timeout_seconds(),
            accept_invalid_certs: false,
        }
    }
}

impl fmt::Debug for ErpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErpConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token_file", &self.token_file)
            .field("token_key", &self.token_key)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

impl ErpConfig {
    /// Configuration gate: returns the credential triple or a
    /// [`ErpSyncError::Config`] naming every missing value.
    pub fn credentials(&self) -> Result<ErpCredentials> {
        let base_url = non_blank(self.base_url.as_deref());
        let username = non_blank(self.username.as_deref());
        let password = non_blank(self.password.as_deref());

        match (base_url, username, password) {
            (Some(base_url), Some(username), Some(password)) => Ok(ErpCredentials {
                base_url: base_url.trim_end_matches('/').to_string(),
                username: username.to_string(),
                password: password.to_string(),
            }),
            (base_url, username, password) => {
                let missing: Vec<&str> = [
                    ("base_url", base_url.is_none()),
                    ("username", username.is_none()),
                    ("password", password.is_none()),
                ]
                .iter()
                .filter(|(_, is_missing)| *is_missing)
                .map(|(name, _)| *name)
                .collect();

                Err(ErpSyncError::Config(format!(
                    "ERP integration is not configured; missing {}",
                    missing.join(", ")
                )))
            }
        }
    }

    /// True when the configuration gate would pass.
    pub fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }
}

/// Validated credential triple produced by the configuration gate.
#[derive(Clone, PartialEq, Eq)]
pub struct ErpCredentials {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ErpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErpCredentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Local SQLite settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: DEFAULT_DB_PATH.to_string(), pool_size: DEFAULT_DB_POOL_SIZE }
    }
}

/// Environment-level defaults, the last link of the mapper's resolution chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErpDefaults {
    pub type_code: String,
    pub carrier_code: String,
    pub price_list_code: String,
    pub billing_method_code: String,
    pub activity_branch_code: String,
    pub payment_condition_code: String,
    pub country_code: String,
    pub sales_rep_code: String,
}

impl Default for ErpDefaults {
    fn default() -> Self {
        Self {
            type_code: DEFAULT_TYPE_CODE.to_string(),
            carrier_code: DEFAULT_CARRIER_CODE.to_string(),
            price_list_code: DEFAULT_PRICE_LIST_CODE.to_string(),
            billing_method_code: DEFAULT_BILLING_METHOD_CODE.to_string(),
            activity_branch_code: DEFAULT_ACTIVITY_BRANCH_CODE.to_string(),
            payment_condition_code: DEFAULT_PAYMENT_CONDITION_CODE.to_string(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            sales_rep_code: DEFAULT_SALES_REP_CODE.to_string(),
        }
    }
}

/// Local catalog ids stamped on registrations created by the reconciler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogIds {
    pub carrier_id: Option<i64>,
    pub price_list_id: Option<i64>,
    pub billing_method_id: Option<i64>,
    pub activity_branch_id: Option<i64>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn default_token_file() -> PathBuf {
    PathBuf::from(DEFAULT_TOKEN_FILE)
}

fn default_token_key() -> String {
    DEFAULT_TOKEN_KEY.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_pool_size() -> u32 {
    DEFAULT_DB_POOL_SIZE
}
