//! Credential exchange against the ERP login endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use erpsync_core::{Authenticator, TokenStore};
use erpsync_domain::{ErpSyncError, Result};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::errors::ErpErrorCategory;
use super::request::{ErpRequest, LOGIN_PATH};
use super::transport::ErpTransport;

const TOKEN_FIELDS: &[&str] = &["access_token", "token"];

/// Exchanges the configured username/password for a bearer token and writes
/// it to the token store.
///
/// Concurrent callers are not de-duplicated; each call performs its own login.
pub struct ErpAuthenticator {
    transport: Arc<ErpTransport>,
    tokens: Arc<dyn TokenStore>,
}

impl ErpAuthenticator {
    pub fn new(transport: Arc<ErpTransport>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { transport, tokens }
    }
}

#[async_trait]
impl Authenticator for ErpAuthenticator {
    #[instrument(skip(self), name = "erp.authenticate")]
    async fn authenticate(&self) -> Result<String> {
        let credentials = self.transport.credentials()?;

        let request = ErpRequest::post(LOGIN_PATH).json(json!({
            "username": credentials.username,
            "password": credentials.password,
        }));

        let response = self
            .transport
            .send(&credentials.base_url, &request, None)
            .await
            .map_err(|err| match err.category() {
                ErpErrorCategory::Configuration => err.into_domain_error(),
                _ => ErpSyncError::Auth(err.message().to_string()),
            })?;

        if let Some(fault) = self.transport.classifier().inspect(response.status, &response.body) {
            warn!(status = response.status, message = %fault.message, "ERP login rejected");
            return Err(ErpSyncError::Auth(fault.message));
        }

        let token = response.json().as_ref().and_then(extract_token).ok_or_else(|| {
            ErpSyncError::Auth("ERP login response did not contain a token".to_string())
        })?;

        self.tokens.set(&token);
        info!(username = %credentials.username, "authenticated with ERP");
        Ok(token)
    }
}

/// Token from `access_token`/`token`, at the top level or under `data`.
fn extract_token(body: &Value) -> Option<String> {
    fn token_field(object: &Value) -> Option<&str> {
        TOKEN_FIELDS.iter().find_map(|field| {
            object.get(field).and_then(Value::as_str).map(str::trim).filter(|t| !t.is_empty())
        })
    }

    token_field(body).or_else(|| body.get("data").and_then(token_field)).map(str::to_string)
}
