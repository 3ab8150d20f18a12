//! Tax-id normalisation
//!
//! Tax ids arrive formatted (`11.222.333/0001-81`) from forms and unformatted
//! from the ERP. Every comparison and every storage key uses the digits-only
//! form.

use crate::constants::{INDIVIDUAL_TAX_ID_DIGITS, ORGANIZATION_TAX_ID_DIGITS};

/// Strips everything but ASCII digits.
pub fn normalize_tax_id(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Whether a tax id identifies a person or an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxIdKind {
    Individual,
    Organization,
}

impl TaxIdKind {
    /// Derives the kind from digit length: 11 or fewer digits is an
    /// individual, anything longer an organization.
    pub fn from_digits(digits: &str) -> Self {
        if digits.len() <= INDIVIDUAL_TAX_ID_DIGITS {
            Self::Individual
        } else {
            Self::Organization
        }
    }
}

/// True when the digits have the length of a valid individual or
/// organization tax id.
pub fn has_valid_length(digits: &str) -> bool {
    digits.len() == INDIVIDUAL_TAX_ID_DIGITS || digits.len() == ORGANIZATION_TAX_ID_DIGITS
}
