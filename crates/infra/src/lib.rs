//! # ERP Sync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - SQLite registration storage (r2d2 pool)
//! - Single-request HTTP client with timeout
//! - The ERP integration: token store, authenticator, resilient client,
//!   customer locator, response reconciler
//! - Configuration loading
//! - The per-tax-id sync orchestration service
//!
//! ## Architecture
//! - Implements traits defined in `erpsync-core`
//! - Contains all "impure" code (network, filesystem, database)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod services;

// Re-export commonly used items
pub use database::{DbManager, SqliteRegistrationRepository};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::erp::{
    CallOutcome, CustomerLocator, ErpAuthenticator, ErpError, ErpErrorCategory, ErpRequest,
    ErpResponse, ErpTransport, FileTokenStore, LocatorResult, ReconcileAction,
    ResilientClient, ResponseReconciler,
};
pub use services::{CustomerSyncService, SyncReport, TaxIdGuard, TaxIdLocks};
