//! Consolidated business entity
//!
//! Read-only aggregate assembled per request from the portal's company,
//! address, contact, and form-selection sources. It is never persisted and
//! exists only as input to the payload mapper.

use serde::{Deserialize, Serialize};

/// Everything the mapper needs to build an ERP customer payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidatedBusinessEntity {
    pub company: CompanyProfile,
    pub address: AddressDetails,
    pub contact: ContactDetails,
    pub selections: FormSelections,
    pub overrides: ExplicitOverrides,
}

impl ConsolidatedBusinessEntity {
    /// Raw tax id as entered (may contain punctuation).
    pub fn tax_id(&self) -> &str {
        &self.company.tax_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyProfile {
    pub tax_id: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub state_registration: Option<String>,
    pub municipal_registration: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressDetails {
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    /// Two-letter state abbreviation.
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A form selection pointing at a local catalog row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSelection {
    pub id: i64,
    /// ERP code configured on the catalog row, if any.
    #[serde(default)]
    pub code: Option<String>,
}

impl CatalogSelection {
    pub fn new(id: i64, code: impl Into<String>) -> Self {
        Self { id, code: Some(code.into()) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSelections {
    pub type_code: Option<String>,
    pub carrier: Option<CatalogSelection>,
    pub price_list: Option<CatalogSelection>,
    pub billing_method: Option<CatalogSelection>,
    pub activity_branch: Option<CatalogSelection>,
    pub payment_condition: Option<CatalogSelection>,
}

/// Values supplied explicitly on the request; they win over every other
/// source and are sent verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplicitOverrides {
    pub type_code: Option<String>,
    pub carrier_code: Option<String>,
    pub price_list_code: Option<String>,
    pub billing_method_code: Option<String>,
    pub activity_branch_code: Option<String>,
    pub payment_condition_code: Option<String>,
    pub municipality_code: Option<String>,
    pub country_code: Option<String>,
    pub sales_rep_code: Option<String>,
}
