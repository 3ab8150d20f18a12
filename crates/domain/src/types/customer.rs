//! ERP customer types
//!
//! The ERP has no lookup-by-key endpoint, so customers are found by probing
//! a closed catalog of [`TypeCode`]s. Records come back with loosely typed
//! fields; [`ExternalCustomerRecord::from_value`] normalises them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::tax_id::normalize_tax_id;

/// Immutable entry of the customer type-code catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TypeCode {
    pub code: char,
    pub label: &'static str,
}

impl TypeCode {
    pub const fn new(code: char, label: &'static str) -> Self {
        Self { code, label }
    }

    /// The code as sent on the wire.
    pub fn as_param(&self) -> String {
        self.code.to_string()
    }
}

/// Customer record as returned by the ERP lookup endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalCustomerRecord {
    pub external_id: String,
    pub tax_id: String,
    pub legal_name: String,
    pub trade_name: String,
    /// Type code as reported by the ERP (may differ from the probed code).
    pub raw_type: String,
    /// The full JSON object the record was parsed from.
    pub raw: Value,
}

const EXTERNAL_ID_KEYS: &[&str] = &["externalId", "external_id", "id", "code", "codigo"];
const TAX_ID_KEYS: &[&str] = &["taxId", "tax_id", "cgc", "cnpj", "cpf"];
const LEGAL_NAME_KEYS: &[&str] = &["legalName", "legal_name", "name", "nome"];
const TRADE_NAME_KEYS: &[&str] = &["tradeName", "trade_name", "nomeFantasia", "fantasyName"];
const TYPE_KEYS: &[&str] = &["type", "typeCode", "tipo"];

impl ExternalCustomerRecord {
    /// Parse a record from a JSON body. Arrays yield their first element.
    ///
    /// Returns `None` when the body carries no usable external id.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = match value {
            Value::Array(items) => items.first()?,
            other => other,
        };
        if !object.is_object() {
            return None;
        }

        let external_id = first_text(object, EXTERNAL_ID_KEYS)?;

        Some(Self {
            external_id,
            tax_id: first_text(object, TAX_ID_KEYS)
                .map(|t| normalize_tax_id(&t))
                .unwrap_or_default(),
            legal_name: first_text(object, LEGAL_NAME_KEYS).unwrap_or_default(),
            trade_name: first_text(object, TRADE_NAME_KEYS).unwrap_or_default(),
            raw_type: first_text(object, TYPE_KEYS).unwrap_or_default(),
            raw: object.clone(),
        })
    }
}

/// Reads the first key holding a non-blank string or a number.
fn first_text(object: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Transient result of one sync attempt, handed to the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub success: bool,
    pub external_id: Option<String>,
    pub raw_response: Option<String>,
    pub error_message: Option<String>,
    /// Matched or created record, used to seed names on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<ExternalCustomerRecord>,
}

impl SyncOutcome {
    pub fn succeeded(external_id: impl Into<String>, raw_response: Option<String>) -> Self {
        Self {
            success: true,
            external_id: Some(external_id.into()),
            raw_response,
            error_message: None,
            record: None,
        }
    }

    pub fn failed(error_message: impl Into<String>, raw_response: Option<String>) -> Self {
        Self {
            success: false,
            external_id: None,
            raw_response,
            error_message: Some(error_message.into()),
            record: None,
        }
    }

    /// Outcome for a customer found by the locator.
    pub fn from_record(record: ExternalCustomerRecord) -> Self {
        let raw = record.raw.to_string();
        Self {
            success: true,
            external_id: Some(record.external_id.clone()),
            raw_response: Some(raw),
            error_message: None,
            record: Some(record),
        }
    }

    pub fn with_record(mut self, record: ExternalCustomerRecord) -> Self {
        self.record = Some(record);
        self
    }
}
