//! Domain constants
//!
//! Wire-level sentinels and environment defaults shared by the mapper and the
//! configuration layer.

/// Person flag sent for individuals (tax id with 11 digits or fewer).
pub const PERSON_INDIVIDUAL: &str = "F";
/// Person flag sent for organizations.
pub const PERSON_ORGANIZATION: &str = "J";
/// Digit count of an individual tax id.
pub const INDIVIDUAL_TAX_ID_DIGITS: usize = 11;
/// Digit count of an organization tax id.
pub const ORGANIZATION_TAX_ID_DIGITS: usize = 14;

/// Sentinel sent when the customer has a state registration.
pub const STATE_REGISTRATION_PRESENT: &str = "1";
/// Sentinel sent when the customer is exempt from state registration.
pub const STATE_REGISTRATION_ABSENT: &str = "2";
/// Placeholder state-registration value for exempt customers.
pub const STATE_REGISTRATION_EXEMPT: &str = "ISENTO";

// Catalog code widths (left-zero-padded)
pub const CARRIER_CODE_WIDTH: usize = 6;
pub const PRICE_LIST_CODE_WIDTH: usize = 3;
pub const BILLING_METHOD_CODE_WIDTH: usize = 3;
pub const ACTIVITY_BRANCH_CODE_WIDTH: usize = 6;
pub const PAYMENT_CONDITION_CODE_WIDTH: usize = 3;

// Environment-level defaults
pub const DEFAULT_TYPE_CODE: &str = "F";
pub const DEFAULT_CARRIER_CODE: &str = "000001";
pub const DEFAULT_PRICE_LIST_CODE: &str = "001";
pub const DEFAULT_BILLING_METHOD_CODE: &str = "001";
pub const DEFAULT_ACTIVITY_BRANCH_CODE: &str = "000001";
pub const DEFAULT_PAYMENT_CONDITION_CODE: &str = "001";
pub const DEFAULT_COUNTRY_CODE: &str = "105";
pub const DEFAULT_SALES_REP_CODE: &str = "";

// ERP client defaults
pub const DEFAULT_TOKEN_FILE: &str = ".erp-token";
pub const DEFAULT_TOKEN_KEY: &str = "ERP_ACCESS_TOKEN";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Local storage defaults
pub const DEFAULT_DB_PATH: &str = "erpsync.db";
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;
