//! ERP request description
//!
//! A request is a plain value so the resilient client can re-issue an
//! identical call after reauthenticating.

use reqwest::Method;
use serde_json::Value;

pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const CUSTOMERS_PATH: &str = "/api/v1/customers";

#[derive(Debug, Clone, PartialEq)]
pub struct ErpRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ErpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// `GET /api/v1/customers?taxId=..&type=..`
    pub fn customer_lookup(tax_id: &str, type_code: char) -> Self {
        Self::get(CUSTOMERS_PATH).query("taxId", tax_id).query("type", type_code.to_string())
    }

    /// `POST /api/v1/customers`
    pub fn customer_create(payload: Value) -> Self {
        Self::post(CUSTOMERS_PATH).json(payload)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Absolute URL against `base_url` (no trailing slash expected).
    pub fn url(&self, base_url: &str) -> Result<url::Url, url::ParseError> {
        let path = self.path.trim_start_matches('/');
        let mut url = url::Url::parse(&format!("{}/{}", base_url.trim_end_matches('/'), path))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }

    /// Short form for logs: method and path, no query values.
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}
