//! ERP error types and classification
//!
//! Everything that goes wrong below the resilient client is turned into an
//! [`ErpError`] value. Only configuration problems leave the client as an
//! `Err`; callers convert the rest with [`ErpError::into_domain_error`] when
//! they need a domain error.

use std::fmt;

use erpsync_core::{Fault, FaultSource};
use erpsync_domain::ErpSyncError;
use reqwest::StatusCode;

/// ERP error category for external consumption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErpErrorCategory {
    /// Missing base URL or credentials.
    Configuration,

    /// Token rejected, expired, or credentials refused.
    Authentication,

    /// 404 from the ERP.
    NotFound,

    /// Request or payload refused (400, 409, 422, or an embedded non-auth
    /// fault on a 2xx response).
    Validation,

    /// Timeout or connection failure.
    TransientNetwork,

    /// 5xx from the ERP.
    ServerUnavailable,

    Unknown,
}

impl ErpErrorCategory {
    /// Returns user-friendly message for this category
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration => {
                "The ERP integration is not configured. Ask an administrator to set the ERP \
                 address and credentials."
            }
            Self::Authentication => {
                "The ERP rejected the integration credentials. The registration was kept and \
                 will be synchronised later."
            }
            Self::NotFound => "The customer was not found in the ERP.",
            Self::Validation => "The ERP refused the customer data. Please review the registration.",
            Self::TransientNetwork => {
                "The ERP could not be reached. The registration was saved and will be \
                 synchronised later."
            }
            Self::ServerUnavailable => {
                "The ERP is temporarily unavailable. The registration was saved and will be \
                 synchronised later."
            }
            Self::Unknown => "An unexpected ERP error occurred.",
        }
    }
}

impl fmt::Display for ErpErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration Error"),
            Self::Authentication => write!(f, "Authentication Failed"),
            Self::NotFound => write!(f, "Not Found"),
            Self::Validation => write!(f, "Validation Error"),
            Self::TransientNetwork => write!(f, "Network Error"),
            Self::ServerUnavailable => write!(f, "Server Unavailable"),
            Self::Unknown => write!(f, "Unknown Error"),
        }
    }
}

/// Structured ERP failure: category, upstream message, optional context
/// (status code, endpoint, raw body excerpt).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErpError {
    category: ErpErrorCategory,
    message: String,
    context: Option<String>,
}

impl ErpError {
    pub fn new(category: ErpErrorCategory, message: impl Into<String>) -> Self {
        Self { category, message: message.into(), context: None }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErpErrorCategory::Unknown, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErpErrorCategory::Authentication, message)
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn category(&self) -> ErpErrorCategory {
        self.category
    }

    /// Upstream message as extracted from the response.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn is_auth(&self) -> bool {
        self.category == ErpErrorCategory::Authentication
    }

    pub fn user_message(&self) -> String {
        let base = self.category.user_message();
        if self.message.is_empty() {
            base.to_string()
        } else {
            format!("{} Details: {}", base, self.message)
        }
    }

    /// Classify a fault found by the response classifier.
    pub fn from_fault(fault: &Fault) -> Self {
        let category = if fault.auth {
            ErpErrorCategory::Authentication
        } else if fault.source == FaultSource::Transport {
            ErpErrorCategory::TransientNetwork
        } else {
            match fault.status {
                Some(404) => ErpErrorCategory::NotFound,
                Some(400 | 409 | 422) => ErpErrorCategory::Validation,
                Some(200..=299) => ErpErrorCategory::Validation,
                Some(500..=599) => ErpErrorCategory::ServerUnavailable,
                _ => ErpErrorCategory::Unknown,
            }
        };

        let error = Self::new(category, fault.message.clone());
        match fault.status {
            Some(status) => error.with_context(format!("HTTP {status}")),
            None => error,
        }
    }

    /// Classify HTTP status code into error category
    pub fn from_status_code(status: StatusCode) -> Self {
        let category = match status.as_u16() {
            401 | 403 => ErpErrorCategory::Authentication,
            404 => ErpErrorCategory::NotFound,
            400 | 409 | 422 => ErpErrorCategory::Validation,
            500..=599 => ErpErrorCategory::ServerUnavailable,
            _ => ErpErrorCategory::Unknown,
        };

        Self::new(
            category,
            format!("HTTP {}: {}", status.as_u16(), status.canonical_reason().unwrap_or("Unknown")),
        )
    }

    /// Convert to domain error type
    pub fn into_domain_error(self) -> ErpSyncError {
        match self.category {
            ErpErrorCategory::Configuration => ErpSyncError::Config(self.message),
            ErpErrorCategory::Authentication => ErpSyncError::Auth(self.message),
            ErpErrorCategory::NotFound => ErpSyncError::NotFound(self.message),
            ErpErrorCategory::Validation => ErpSyncError::Validation(self.message),
            ErpErrorCategory::TransientNetwork | ErpErrorCategory::ServerUnavailable => {
                ErpSyncError::Network(self.message)
            }
            ErpErrorCategory::Unknown => ErpSyncError::Internal(self.message),
        }
    }
}

impl fmt::Display for ErpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErpError {}

impl From<reqwest::Error> for ErpError {
    fn from(err: reqwest::Error) -> Self {
        let (category, message) = if err.is_timeout() {
            (ErpErrorCategory::TransientNetwork, "Request timed out".to_string())
        } else if err.is_connect() {
            (ErpErrorCategory::TransientNetwork, "Failed to connect to the ERP".to_string())
        } else if let Some(status) = err.status() {
            return Self::from_status_code(status).with_context(err.to_string());
        } else if err.is_request() {
            (ErpErrorCategory::TransientNetwork, "Request failed".to_string())
        } else {
            (ErpErrorCategory::Unknown, "Network error".to_string())
        };

        Self::new(category, message).with_context(err.to_string())
    }
}

impl From<ErpSyncError> for ErpError {
    fn from(err: ErpSyncError) -> Self {
        match err {
            ErpSyncError::Config(msg) => Self::new(ErpErrorCategory::Configuration, msg),
            ErpSyncError::Auth(msg) => Self::new(ErpErrorCategory::Authentication, msg),
            ErpSyncError::NotFound(msg) => Self::new(ErpErrorCategory::NotFound, msg),
            ErpSyncError::Validation(msg) => Self::new(ErpErrorCategory::Validation, msg),
            ErpSyncError::Network(msg) => Self::new(ErpErrorCategory::TransientNetwork, msg),
            other => Self::unknown(other.to_string()),
        }
    }
}

impl From<ErpError> for ErpSyncError {
    fn from(err: ErpError) -> Self {
        err.into_domain_error()
    }
}
