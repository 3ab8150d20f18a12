//! Port interfaces for the ERP integration
//!
//! Infrastructure implements these; the core and the sync service depend only
//! on the traits.

use async_trait::async_trait;
use erpsync_domain::{CatalogTable, CustomerRegistration, NewRegistration, Result, SyncBinding};

/// Best-effort cache of the ERP bearer token.
///
/// Implementations swallow (and log) their own I/O failures: the ERP is the
/// authority on whether a token still works, so a lost write only costs one
/// extra authentication.
pub trait TokenStore: Send + Sync {
    /// Current token, or `None` when absent or blank.
    fn get(&self) -> Option<String>;

    /// Replace the stored token.
    fn set(&self, token: &str);

    /// Forget the stored token.
    fn clear(&self);
}

/// Exchanges configured credentials for a fresh bearer token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate and write the token to the token store.
    ///
    /// # Errors
    /// `ErpSyncError::Config` when credentials are missing,
    /// `ErpSyncError::Auth` with the upstream message otherwise.
    async fn authenticate(&self) -> Result<String>;
}

/// Storage surface the reconciler needs from the portal database.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn get_by_id(&self, id: i64) -> Result<Option<CustomerRegistration>>;

    async fn find_by_external_id(&self, external_id: &str)
        -> Result<Option<CustomerRegistration>>;

    /// Look up by digits-only tax id.
    async fn find_by_tax_id(&self, tax_id: &str) -> Result<Option<CustomerRegistration>>;

    /// Insert and return the new row id.
    async fn insert(&self, row: &NewRegistration) -> Result<i64>;

    async fn update(&self, id: i64, binding: &SyncBinding) -> Result<()>;

    /// `getById` against a catalog table.
    async fn catalog_contains(&self, table: CatalogTable, id: i64) -> Result<bool>;
}

/// Resolves a municipality code from a city name and state abbreviation.
pub trait MunicipalityResolver: Send + Sync {
    fn resolve(&self, city: &str, state: &str) -> Option<String>;
}
