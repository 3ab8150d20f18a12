//! Customer type-code catalog
//!
//! The ERP only answers lookups scoped by type code, so a customer whose type
//! is unknown must be probed code by code. Declaration order is probe order:
//! the most common types come first.

use std::collections::HashSet;

use erpsync_domain::{ErpSyncError, Result, TypeCode};

/// The 20 type codes known to the ERP, in probe order.
pub const STANDARD_TYPE_CODES: [TypeCode; 20] = [
    TypeCode::new('F', "Final consumer"),
    TypeCode::new('R', "Reseller"),
    TypeCode::new('S', "Tax substitution"),
    TypeCode::new('L', "Rural producer"),
    TypeCode::new('X', "Export"),
    TypeCode::new('J', "Legal entity"),
    TypeCode::new('I', "Industry"),
    TypeCode::new('D', "Distributor"),
    TypeCode::new('C', "Carrier"),
    TypeCode::new('G', "Government"),
    TypeCode::new('O', "Non-profit organisation"),
    TypeCode::new('M', "Micro-enterprise"),
    TypeCode::new('E', "Employee"),
    TypeCode::new('T', "Transfer/branch"),
    TypeCode::new('A', "Affiliate"),
    TypeCode::new('B', "Bank/financial"),
    TypeCode::new('H', "Healthcare"),
    TypeCode::new('N', "Non-taxpayer"),
    TypeCode::new('U', "Utility"),
    TypeCode::new('Z', "Other"),
];

/// Ordered, duplicate-free list of type codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCodeCatalog {
    entries: Vec<TypeCode>,
}

impl Default for TypeCodeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl TypeCodeCatalog {
    pub fn standard() -> Self {
        Self { entries: STANDARD_TYPE_CODES.to_vec() }
    }

    /// Build a custom catalog, e.g. a narrowed plan for a known customer type.
    ///
    /// # Errors
    /// `ErpSyncError::Validation` when the list is empty or repeats a code.
    pub fn custom(entries: Vec<TypeCode>) -> Result<Self> {
        if entries.is_empty() {
            return Err(ErpSyncError::Validation("type-code catalog cannot be empty".into()));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = entries.iter().find(|entry| !seen.insert(entry.code.to_ascii_uppercase())) {
            return Err(ErpSyncError::Validation(format!(
                "type code '{}' appears more than once",
                dup.code
            )));
        }

        Ok(Self { entries })
    }

    /// Case-insensitive lookup by code.
    pub fn find(&self, code: char) -> Option<TypeCode> {
        self.entries.iter().copied().find(|entry| entry.code.eq_ignore_ascii_case(&code))
    }

    /// Resolve a textual code (as stored on forms or sent by the ERP).
    pub fn find_str(&self, code: &str) -> Option<TypeCode> {
        let mut chars = code.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => self.find(c),
            _ => None,
        }
    }

    pub fn entries(&self) -> &[TypeCode] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
