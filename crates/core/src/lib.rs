//! # ERP Sync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (token store, authenticator, registration store,
//!   municipality lookup)
//! - Response fault classification
//! - The customer type-code catalog and its probe plan
//! - Outbound payload mapping
//!
//! ## Architecture Principles
//! - Only depends on `erpsync-domain`
//! - No database, HTTP, or filesystem code
//! - All external dependencies via traits

pub mod customer;
pub mod erp_ports;
pub mod fault;
pub mod mapping;

pub use customer::{CodeProbe, ProbeOutcome, ProbePlan, ProbeStep, TypeCodeCatalog};
pub use erp_ports::{Authenticator, MunicipalityResolver, RegistrationStore, TokenStore};
pub use fault::{Fault, FaultClassifier, FaultSource};
pub use mapping::{CustomerPayload, MunicipalityTable, PayloadMapper};
