//! Wire payload for customer creation
//!
//! Every field is always present. Missing values are sent as empty strings,
//! never omitted, because the ERP rejects bodies with absent keys.

use erpsync_domain::constants::{INDIVIDUAL_TAX_ID_DIGITS, ORGANIZATION_TAX_ID_DIGITS};
use erpsync_domain::utils::tax_id::has_valid_length;
use erpsync_domain::{ErpSyncError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire names of every [`CustomerPayload`] field, in declaration order.
pub const WIRE_FIELDS: [&str; 28] = [
    "personType",
    "taxId",
    "legalName",
    "tradeName",
    "typeCode",
    "stateRegistration",
    "hasStateRegistration",
    "municipalRegistration",
    "street",
    "number",
    "complement",
    "district",
    "city",
    "state",
    "postalCode",
    "municipalityCode",
    "countryCode",
    "email",
    "phone",
    "contactName",
    "contactEmail",
    "contactPhone",
    "carrierCode",
    "priceListCode",
    "billingMethodCode",
    "activityBranchCode",
    "paymentConditionCode",
    "salesRepCode",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    /// `F` individual, `J` organization.
    pub person_type: String,
    pub tax_id: String,
    pub legal_name: String,
    pub trade_name: String,
    pub type_code: String,
    pub state_registration: String,
    /// `1` when a state registration exists, `2` otherwise.
    pub has_state_registration: String,
    pub municipal_registration: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub district: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub municipality_code: String,
    pub country_code: String,
    pub email: String,
    pub phone: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub carrier_code: String,
    pub price_list_code: String,
    pub billing_method_code: String,
    pub activity_branch_code: String,
    pub payment_condition_code: String,
    pub sales_rep_code: String,
}

impl CustomerPayload {
    /// JSON body as posted to the ERP.
    pub fn to_wire(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Reject payloads the ERP would refuse outright.
    ///
    /// # Errors
    /// `ErpSyncError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let numeric = self.tax_id.chars().all(|c| c.is_ascii_digit());
        if !numeric || !has_valid_length(&self.tax_id) {
            return Err(ErpSyncError::Validation(format!(
                "taxId must have {INDIVIDUAL_TAX_ID_DIGITS} or {ORGANIZATION_TAX_ID_DIGITS} digits, got '{}'",
                self.tax_id
            )));
        }

        if self.legal_name.trim().is_empty() {
            return Err(ErpSyncError::Validation("legalName is required".into()));
        }

        Ok(())
    }
}
