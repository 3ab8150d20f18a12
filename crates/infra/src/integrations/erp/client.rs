//! Resilient ERP client
//!
//! Wraps every ERP call in the token lifecycle:
//!
//! 1. No token in the store → authenticate once before the call.
//! 2. Issue the call; any HTTP status counts as a response.
//! 3. Classify the response for embedded faults.
//! 4. An auth fault on the first attempt clears the token, reauthenticates,
//!    and re-issues the identical request exactly once. A second auth fault
//!    is final.
//!
//! Only configuration problems escape as `Err`; every other failure is
//! returned as [`CallOutcome::Failure`].

use std::sync::Arc;

use erpsync_core::{Authenticator, TokenStore};
use erpsync_domain::{ErpCredentials, ErpSyncError, Result};
use tracing::{debug, info, instrument, warn};

use super::errors::{ErpError, ErpErrorCategory};
use super::request::ErpRequest;
use super::transport::{ErpResponse, ErpTransport};

/// Result of one logical ERP operation: a usable response or a classified failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Success(ErpResponse),
    Failure(ErpError),
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_result(self) -> std::result::Result<ErpResponse, ErpError> {
        match self {
            Self::Success(response) => Ok(response),
            Self::Failure(error) => Err(error),
        }
    }
}

/// ERP client that adds lazy authentication and one reauthenticated retry.
pub struct ResilientClient {
    transport: Arc<ErpTransport>,
    tokens: Arc<dyn TokenStore>,
    authenticator: Arc<dyn Authenticator>,
}

impl ResilientClient {
    /// Create a client over a shared transport and token store; `authenticator` performs logins.
    pub fn new(
        transport: Arc<ErpTransport>,
        tokens: Arc<dyn TokenStore>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self { transport, tokens, authenticator }
    }

    /// Configuration gate.
    pub fn credentials(&self) -> Result<ErpCredentials> {
        self.transport.credentials()
    }

    /// Execute `request` with lazy authentication and at most one
    /// reauthentication. `allow_reauth = false` disables both.
    ///
    /// # Errors
    /// `ErpSyncError::Config` when the integration is not configured.
    #[instrument(skip(self, request), fields(request = %request.describe()))]
    pub async fn execute(&self, request: &ErpRequest, allow_reauth: bool) -> Result<CallOutcome> {
        let credentials = self.transport.credentials()?;

        let mut token = self.tokens.get();
        if token.is_none() && allow_reauth {
            debug!("no cached ERP token, authenticating before first call");
            match self.authenticate().await? {
                Ok(fresh) => token = Some(fresh),
                Err(error) => return Ok(CallOutcome::Failure(error)),
            }
        }

        let mut reauthenticated = false;
        loop {
            let error = match self.attempt(&credentials.base_url, request, token.as_deref()).await? {
                CallOutcome::Success(response) => return Ok(CallOutcome::Success(response)),
                CallOutcome::Failure(error) => error,
            };

            if !error.is_auth() || !allow_reauth || reauthenticated {
                if error.is_auth() && reauthenticated {
                    warn!(message = %error.message(), "ERP rejected the token again after reauthentication");
                }
                return Ok(CallOutcome::Failure(error));
            }

            info!(message = %error.message(), "ERP token rejected, reauthenticating once");
            self.tokens.clear();
            reauthenticated = true;

            match self.authenticate().await? {
                Ok(fresh) => token = Some(fresh),
                Err(error) => return Ok(CallOutcome::Failure(error)),
            }
        }
    }

    /// Issue a single request and classify the response.
    async fn attempt(
        &self,
        base_url: &str,
        request: &ErpRequest,
        token: Option<&str>,
    ) -> Result<CallOutcome> {
        let response = match self.transport.send(base_url, request, token).await {
            Ok(response) => response,
            Err(error) if error.category() == ErpErrorCategory::Configuration => {
                return Err(error.into_domain_error());
            }
            Err(error) => {
                debug!(error = %error, "ERP call failed before a response was received");
                return Ok(CallOutcome::Failure(error));
            }
        };

        match self.transport.classifier().inspect(response.status, &response.body) {
            None => Ok(CallOutcome::Success(response)),
            Some(fault) => {
                let error = ErpError::from_fault(&fault);
                debug!(
                    status = response.status,
                    category = %error.category(),
                    auth = fault.auth,
                    "ERP response carried a fault"
                );
                Ok(CallOutcome::Failure(error))
            }
        }
    }

    /// Outer `Err` is a configuration failure; inner `Err` is an
    /// authentication failure to surface as the call's outcome.
    async fn authenticate(&self) -> Result<std::result::Result<String, ErpError>> {
        match self.authenticator.authenticate().await {
            Ok(token) => Ok(Ok(token)),
            Err(ErpSyncError::Config(message)) => Err(ErpSyncError::Config(message)),
            Err(err) => {
                warn!(error = %err, "ERP authentication failed");
                let message = match err {
                    ErpSyncError::Auth(message) => message,
                    other => other.to_string(),
                };
                Ok(Err(ErpError::authentication(message)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use erpsync_domain::ErpConfig;
    use parking_lot::Mutex;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Default)]
    struct MemoryTokens(Mutex<Option<String>>);

    impl TokenStore for MemoryTokens {
        fn get(&self) -> Option<String> {
            self.0.lock().clone()
        }
        fn set(&self, token: &str) {
            *self.0.lock() = Some(token.to_string());
        }
        fn clear(&self) {
            *self.0.lock() = None;
        }
    }

    /// Hands out `fresh-1`, `fresh-2`, ... and counts calls.
    struct CountingAuthenticator {
        tokens: Arc<MemoryTokens>,
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Authenticator for CountingAuthenticator {
        async fn authenticate(&self) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(ErpSyncError::Auth("Senha invalida".into()));
            }
            let token = format!("fresh-{n}");
            self.tokens.set(&token);
            Ok(token)
        }
    }

    struct Harness {
        client: ResilientClient,
        tokens: Arc<MemoryTokens>,
        auth: Arc<CountingAuthenticator>,
    }

    fn harness(base_url: &str, initial_token: Option<&str>, fail_auth: bool) -> Harness {
        let config = ErpConfig {
            base_url: Some(base_url.to_string()),
            username: Some("portal".into()),
            password: Some("s3cret".into()),
            ..ErpConfig::default()
        };
        let tokens = Arc::new(MemoryTokens::default());
        if let Some(token) = initial_token {
            tokens.set(token);
        }
        let auth = Arc::new(CountingAuthenticator {
            tokens: tokens.clone(),
            calls: AtomicUsize::new(0),
            fail: fail_auth,
        });
        let transport = Arc::new(ErpTransport::from_config(&config).unwrap());
        let client = ResilientClient::new(transport, tokens.clone(), auth.clone());
        Harness { client, tokens, auth }
    }

    fn lookup() -> ErpRequest {
        ErpRequest::customer_lookup("11222333000181", 'F')
    }

    #[tokio::test]
    async fn empty_store_authenticates_once_before_first_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/customers"))
            .and(header("authorization", "Bearer fresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri(), None, false);
        let outcome = h.client.execute(&lookup(), true).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(h.auth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cached_token_skips_authentication() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer cached"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri(), Some("cached"), false);
        assert!(h.client.execute(&lookup(), true).await.unwrap().is_success());
        assert_eq!(h.auth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn single_auth_fault_reauthenticates_and_retries_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(200).set_body_string("##ERROR## Token expirado"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer fresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id": "555"}]"#))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri(), Some("stale"), false);
        let response = h.client.execute(&lookup(), true).await.unwrap().into_result().unwrap();

        assert!(response.body.contains("555"));
        assert_eq!(h.auth.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.tokens.get().as_deref(), Some("fresh-1"));
    }

    #[tokio::test]
    async fn second_consecutive_auth_fault_is_final() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("##ERROR## Usuario conectado em outro terminal"),
            )
            .expect(2)
            .mount(&server)
            .await;

        let h = harness(&server.uri(), Some("stale"), false);
        let error = h.client.execute(&lookup(), true).await.unwrap().into_result().unwrap_err();

        assert!(error.is_auth());
        assert_eq!(error.message(), "Usuario conectado em outro terminal");
        assert_eq!(h.auth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_auth_faults_are_surfaced_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"errorMsg": "CNPJ com digito invalido"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri(), Some("ok"), false);
        let error = h.client.execute(&lookup(), true).await.unwrap().into_result().unwrap_err();

        assert_eq!(error.category(), ErpErrorCategory::Validation);
        assert_eq!(h.auth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn http_401_triggers_reauthentication() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer fresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri(), Some("stale"), false);
        assert!(h.client.execute(&lookup(), true).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn retry_disabled_surfaces_first_auth_fault() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri(), Some("stale"), false);
        let error = h.client.execute(&lookup(), false).await.unwrap().into_result().unwrap_err();

        assert!(error.is_auth());
        assert_eq!(h.auth.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.tokens.get().as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn failed_authentication_is_an_outcome_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let h = harness(&server.uri(), None, true);
        let error = h.client.execute(&lookup(), true).await.unwrap().into_result().unwrap_err();

        assert!(error.is_auth());
        assert_eq!(error.message(), "Senha invalida");
    }

    #[tokio::test]
    async fn unconfigured_client_returns_config_error() {
        let transport = Arc::new(ErpTransport::from_config(&ErpConfig::default()).unwrap());
        let tokens = Arc::new(MemoryTokens::default());
        let auth = Arc::new(CountingAuthenticator {
            tokens: tokens.clone(),
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let client = ResilientClient::new(transport, tokens, auth.clone());

        let result = client.execute(&lookup(), true).await;
        assert!(matches!(result, Err(ErpSyncError::Config(_))));
        assert_eq!(auth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn server_error_on_create_is_sent_exactly_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/customers"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server.uri(), Some("tok"), false);
        let create = ErpRequest::customer_create(serde_json::json!({"cnpjCpf": "11222333000181"}));
        let error = h.client.execute(&create, true).await.unwrap().into_result().unwrap_err();

        assert_eq!(error.category(), ErpErrorCategory::ServerUnavailable);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
        assert_eq!(h.auth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn connection_failure_is_transient_network_outcome() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let h = harness(&format!("http://{addr}"), Some("tok"), false);
        let error = h.client.execute(&lookup(), true).await.unwrap().into_result().unwrap_err();

        assert_eq!(error.category(), ErpErrorCategory::TransientNetwork);
        assert_eq!(h.auth.calls.load(Ordering::SeqCst), 0);
    }
}
