//! HTTP transport shared by the authenticator and the resilient client.

use std::time::Duration;

use erpsync_core::FaultClassifier;
use erpsync_domain::{ErpConfig, ErpCredentials, ErpSyncError, Result};
use serde_json::Value;
use tracing::debug;

use super::errors::ErpError;
use super::request::ErpRequest;
use crate::http::HttpClient;

const USER_AGENT: &str = concat!("erpsync/", env!("CARGO_PKG_VERSION"));

/// Raw response as received, before fault classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErpResponse {
    pub status: u16,
    pub body: String,
}

impl ErpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(self.body.trim()).ok()
    }

    /// True unless the body is blank text, JSON `null`, or an empty
    /// array/object.
    pub fn has_content(&self) -> bool {
        let text = self.body.trim();
        if text.is_empty() {
            return false;
        }
        match self.json() {
            Some(Value::Null) => false,
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::String(s)) => !s.trim().is_empty(),
            _ => true,
        }
    }
}

/// Configured connection to the ERP: HTTP client, settings, and the fault
/// classifier.
pub struct ErpTransport {
    http: HttpClient,
    config: ErpConfig,
    classifier: FaultClassifier,
}

impl ErpTransport {
    /// Build the transport. Credentials are not required here; they are
    /// checked per operation by [`ErpTransport::credentials`].
    pub fn from_config(config: &ErpConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .user_agent(USER_AGENT)
            .accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { http, config: config.clone(), classifier: FaultClassifier::default() })
    }

    pub fn with_classifier(mut self, classifier: FaultClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn classifier(&self) -> &FaultClassifier {
        &self.classifier
    }

    /// Configuration gate.
    pub fn credentials(&self) -> Result<ErpCredentials> {
        self.config.credentials()
    }

    /// Issue one request. Any HTTP status counts as a received response;
    /// only transport failures become an `ErpError` here.
    pub async fn send(
        &self,
        base_url: &str,
        request: &ErpRequest,
        token: Option<&str>,
    ) -> std::result::Result<ErpResponse, ErpError> {
        let url = request.url(base_url).map_err(|err| {
            ErpError::from(ErpSyncError::Config(format!("invalid ERP base URL: {err}")))
        })?;

        let mut builder = self.http.request(request.method().clone(), url);
        if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = self.http.send(builder).await.map_err(|err| self.transport_error(&err))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|err| {
            let message = format!("failed to read response body: {err}");
            ErpError::from_fault(&self.classifier.transport_fault(&message))
        })?;

        debug!(request = %request.describe(), status, bytes = body.len(), "ERP response received");
        Ok(ErpResponse { status, body })
    }

    fn transport_error(&self, err: &ErpSyncError) -> ErpError {
        match err {
            ErpSyncError::Network(message) => {
                ErpError::from_fault(&self.classifier.transport_fault(message))
            }
            other => ErpError::from(other.clone()),
        }
    }
}
