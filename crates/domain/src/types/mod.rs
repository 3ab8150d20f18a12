//! Domain types and models

pub mod customer;
pub mod entity;
pub mod registration;

pub use customer::{ExternalCustomerRecord, SyncOutcome, TypeCode};
pub use entity::{
    AddressDetails, CatalogSelection, CompanyProfile, ConsolidatedBusinessEntity, ContactDetails,
    ExplicitOverrides, FormSelections,
};
pub use registration::{
    CatalogTable, CustomerRegistration, NewRegistration, SyncBinding, SyncStatus,
};
