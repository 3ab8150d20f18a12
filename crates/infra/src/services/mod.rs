//! Service layer implementations.
//!
//! Services orchestrate the ERP integration and local storage for one
//! request-scoped operation.

pub mod customer_sync;
pub mod tax_id_locks;

pub use customer_sync::{CustomerSyncService, SyncReport};
pub use tax_id_locks::{TaxIdGuard, TaxIdLocks};
