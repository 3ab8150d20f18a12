//! Error types used throughout the sync core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the ERP sync core
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ErpSyncError {
    /// Integration is not configured (missing credentials or base URL).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The ERP rejected the credentials or the bearer token.
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed outbound payload or input; never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Timeouts, resets, and upstream unavailability.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ErpSyncError {
    /// True for local constraint violations that the reconciler recovers from.
    pub fn is_persistence_conflict(&self) -> bool {
        matches!(self, Self::UniqueViolation(_) | Self::ForeignKeyViolation(_))
    }

    /// Stable label suitable for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Auth(_) => "auth",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Network(_) => "network",
            Self::UniqueViolation(_) => "unique_violation",
            Self::ForeignKeyViolation(_) => "foreign_key_violation",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, ErpSyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_conflicts_are_flagged() {
        assert!(ErpSyncError::UniqueViolation("tax_id".into()).is_persistence_conflict());
        assert!(ErpSyncError::ForeignKeyViolation("carrier_id".into()).is_persistence_conflict());
        assert!(!ErpSyncError::Database("busy".into()).is_persistence_conflict());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(ErpSyncError::Config("missing base_url".into())).unwrap();
        assert_eq!(json["type"], "Config");
        assert_eq!(json["message"], "missing base_url");
    }
}
