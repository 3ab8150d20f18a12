//! Local registration rows and their ERP binding

use serde::{Deserialize, Serialize};

use crate::config::CatalogIds;
use crate::impl_domain_status_conversions;

/// Local customer registration as stored by the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRegistration {
    pub id: i64,
    /// Digits only.
    pub tax_id: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub carrier_id: Option<i64>,
    pub price_list_id: Option<i64>,
    pub billing_method_id: Option<i64>,
    pub activity_branch_id: Option<i64>,
    pub external_id: Option<String>,
    pub raw_response: Option<String>,
    pub synced_at: Option<i64>,
    pub last_error: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CustomerRegistration {
    pub fn catalog_ids(&self) -> CatalogIds {
        CatalogIds {
            carrier_id: self.carrier_id,
            price_list_id: self.price_list_id,
            billing_method_id: self.billing_method_id,
            activity_branch_id: self.activity_branch_id,
        }
    }
}

/// Binding fields written by the reconciler.
///
/// `None` in `external_id`, `raw_response`, or `synced_at` keeps the stored
/// value; `last_error` is always written (so `None` clears it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncBinding {
    pub external_id: Option<String>,
    pub raw_response: Option<String>,
    pub synced_at: Option<i64>,
    pub last_error: Option<String>,
}

/// Row inserted when no local registration matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRegistration {
    pub tax_id: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub catalog: CatalogIds,
    pub binding: SyncBinding,
}

/// Catalog tables referenced by registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogTable {
    Carriers,
    PriceLists,
    BillingMethods,
    ActivityBranches,
}

impl CatalogTable {
    pub const ALL: [CatalogTable; 4] =
        [Self::Carriers, Self::PriceLists, Self::BillingMethods, Self::ActivityBranches];

    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Carriers => "carriers",
            Self::PriceLists => "price_lists",
            Self::BillingMethods => "billing_methods",
            Self::ActivityBranches => "activity_branches",
        }
    }

    /// Reads this table's id out of a catalog-id set.
    pub fn id_in(&self, ids: &CatalogIds) -> Option<i64> {
        match self {
            Self::Carriers => ids.carrier_id,
            Self::PriceLists => ids.price_list_id,
            Self::BillingMethods => ids.billing_method_id,
            Self::ActivityBranches => ids.activity_branch_id,
        }
    }

    /// Clears this table's id in a catalog-id set.
    pub fn clear_in(&self, ids: &mut CatalogIds) {
        match self {
            Self::Carriers => ids.carrier_id = None,
            Self::PriceLists => ids.price_list_id = None,
            Self::BillingMethods => ids.billing_method_id = None,
            Self::ActivityBranches => ids.activity_branch_id = None,
        }
    }
}

/// User-visible state of a sync request.
///
/// `SavedLocallyNotSynced` is a warning, not a failure: the registration is
/// stored and will be bound on a later attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// An existing ERP customer was found and bound.
    Linked,
    /// The customer was created in the ERP and bound.
    Created,
    SavedLocallyNotSynced,
}

impl_domain_status_conversions!(SyncStatus {
    Linked => "linked",
    Created => "created",
    SavedLocallyNotSynced => "saved_locally_not_synced",
});

impl SyncStatus {
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::SavedLocallyNotSynced)
    }
}
