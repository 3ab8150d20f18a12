//! Writes sync outcomes back into local registrations.
//!
//! Match order: explicit local id, then the row already bound to the
//! outcome's external id, then the row with the same tax id, then insert.
//! An existing binding is never replaced by a different external id.

use std::sync::Arc;

use chrono::Utc;
use erpsync_core::RegistrationStore;
use erpsync_domain::{
    normalize_tax_id, CatalogIds, CatalogTable, CompanyProfile, CustomerRegistration,
    ErpSyncError, NewRegistration, Result, SyncBinding, SyncOutcome,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

/// What [`ResponseReconciler::persist`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReconcileAction {
    Updated { id: i64 },
    Created { id: i64 },
    /// The row stays bound to `existing`; `incoming` was recorded as a
    /// conflict in `last_error`.
    ConflictKept { id: i64, existing: String, incoming: String },
    Failed { reason: String },
}

impl ReconcileAction {
    /// Local row the outcome landed on, if any.
    pub fn local_id(&self) -> Option<i64> {
        match self {
            Self::Updated { id } | Self::Created { id } | Self::ConflictKept { id, .. } => {
                Some(*id)
            }
            Self::Failed { .. } => None,
        }
    }
}

/// Writes sync outcomes to the local registration store.
pub struct ResponseReconciler {
    store: Arc<dyn RegistrationStore>,
    catalog_ids: CatalogIds,
}

impl ResponseReconciler {
    /// Create a reconciler over `store`; new rows carry `catalog_ids`.
    pub fn new(store: Arc<dyn RegistrationStore>, catalog_ids: CatalogIds) -> Self {
        Self { store, catalog_ids }
    }

    /// Persist `outcome` for `tax_id`. Never fails; storage problems are
    /// logged and reported as [`ReconcileAction::Failed`].
    pub async fn persist(
        &self,
        tax_id: &str,
        outcome: &SyncOutcome,
        explicit_local_id: Option<i64>,
    ) -> ReconcileAction {
        self.persist_with_profile(tax_id, outcome, explicit_local_id, None).await
    }

    /// As [`ResponseReconciler::persist`], seeding names of a newly inserted
    /// row from `profile`.
    #[instrument(skip(self, outcome, profile), fields(success = outcome.success))]
    pub async fn persist_with_profile(
        &self,
        tax_id: &str,
        outcome: &SyncOutcome,
        explicit_local_id: Option<i64>,
        profile: Option<&CompanyProfile>,
    ) -> ReconcileAction {
        match self.reconcile(tax_id, outcome, explicit_local_id, profile).await {
            Ok(action) => action,
            Err(err) => {
                error!(error = %err, kind = err.label(), "failed to persist sync outcome");
                ReconcileAction::Failed { reason: err.to_string() }
            }
        }
    }

    async fn reconcile(
        &self,
        tax_id: &str,
        outcome: &SyncOutcome,
        explicit_local_id: Option<i64>,
        profile: Option<&CompanyProfile>,
    ) -> Result<ReconcileAction> {
        if let Some(id) = explicit_local_id {
            match self.store.get_by_id(id).await? {
                Some(row) => return self.update_row(&row, outcome).await,
                None => warn!(id, "explicit registration id not found, matching by keys"),
            }
        }

        if let Some(row) = self.find_existing(tax_id, outcome).await? {
            return self.update_row(&row, outcome).await;
        }

        self.insert_row(tax_id, outcome, profile).await
    }

    /// Tier 2 then tier 3.
    async fn find_existing(
        &self,
        tax_id: &str,
        outcome: &SyncOutcome,
    ) -> Result<Option<CustomerRegistration>> {
        if let Some(external_id) = outcome.external_id.as_deref().filter(|id| !id.is_empty()) {
            if let Some(row) = self.store.find_by_external_id(external_id).await? {
                return Ok(Some(row));
            }
        }

        let digits = normalize_tax_id(tax_id);
        if digits.is_empty() {
            return Ok(None);
        }
        self.store.find_by_tax_id(&digits).await
    }

    async fn update_row(
        &self,
        row: &CustomerRegistration,
        outcome: &SyncOutcome,
    ) -> Result<ReconcileAction> {
        if let (Some(existing), Some(incoming)) =
            (row.external_id.as_deref(), outcome.external_id.as_deref())
        {
            if outcome.success && existing != incoming {
                warn!(
                    id = row.id,
                    existing,
                    incoming,
                    "registration already bound to another ERP customer, keeping binding"
                );
                let conflict = SyncBinding {
                    last_error: Some(format!(
                        "ERP returned customer {incoming} but registration is bound to {existing}"
                    )),
                    ..SyncBinding::default()
                };
                self.store.update(row.id, &conflict).await?;
                return Ok(ReconcileAction::ConflictKept {
                    id: row.id,
                    existing: existing.to_string(),
                    incoming: incoming.to_string(),
                });
            }
        }

        self.store.update(row.id, &binding_for(outcome)).await?;
        debug!(id = row.id, "registration binding updated");
        Ok(ReconcileAction::Updated { id: row.id })
    }

    async fn insert_row(
        &self,
        tax_id: &str,
        outcome: &SyncOutcome,
        profile: Option<&CompanyProfile>,
    ) -> Result<ReconcileAction> {
        let digits = normalize_tax_id(tax_id);
        if digits.is_empty() {
            return Err(ErpSyncError::Validation(format!(
                "cannot store registration for tax id '{tax_id}'"
            )));
        }

        let (legal_name, trade_name) = names_for(&digits, outcome, profile);
        let mut row = NewRegistration {
            tax_id: digits,
            legal_name,
            trade_name,
            catalog: self.validated_catalog_ids().await?,
            binding: binding_for(outcome),
        };

        match self.store.insert(&row).await {
            Ok(id) => {
                info!(id, "registration created");
                Ok(ReconcileAction::Created { id })
            }
            Err(ErpSyncError::UniqueViolation(detail)) => {
                warn!(detail = %detail, "registration inserted concurrently, updating instead");
                match self.find_existing(&row.tax_id, outcome).await? {
                    Some(existing) => self.update_row(&existing, outcome).await,
                    None => Err(ErpSyncError::UniqueViolation(detail)),
                }
            }
            Err(ErpSyncError::ForeignKeyViolation(detail)) => {
                warn!(detail = %detail, "catalog reference vanished, inserting without catalog ids");
                row.catalog = CatalogIds::default();
                let id = self.store.insert(&row).await?;
                info!(id, "registration created without catalog references");
                Ok(ReconcileAction::Created { id })
            }
            Err(err) => Err(err),
        }
    }

    /// Configured catalog ids with every id missing from its table set to
    /// `None`.
    async fn validated_catalog_ids(&self) -> Result<CatalogIds> {
        let mut ids = self.catalog_ids;
        for table in CatalogTable::ALL {
            let Some(id) = table.id_in(&ids) else { continue };
            if !self.store.catalog_contains(table, id).await? {
                warn!(table = table.table_name(), id, "configured catalog id not found, using NULL");
                table.clear_in(&mut ids);
            }
        }
        Ok(ids)
    }
}

fn binding_for(outcome: &SyncOutcome) -> SyncBinding {
    if outcome.success {
        SyncBinding {
            external_id: outcome.external_id.clone().filter(|id| !id.is_empty()),
            raw_response: outcome.raw_response.clone(),
            synced_at: Some(Utc::now().timestamp()),
            last_error: None,
        }
    } else {
        SyncBinding {
            external_id: None,
            raw_response: outcome.raw_response.clone(),
            synced_at: None,
            last_error: Some(
                outcome.error_message.clone().unwrap_or_else(|| "ERP sync failed".to_string()),
            ),
        }
    }
}

fn names_for(
    digits: &str,
    outcome: &SyncOutcome,
    profile: Option<&CompanyProfile>,
) -> (String, Option<String>) {
    let non_blank = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    let legal_name = profile
        .and_then(|p| non_blank(&p.legal_name))
        .or_else(|| outcome.record.as_ref().and_then(|r| non_blank(&r.legal_name)))
        .unwrap_or_else(|| digits.to_string());
    let trade_name = profile
        .and_then(|p| p.trade_name.as_deref().and_then(non_blank))
        .or_else(|| outcome.record.as_ref().and_then(|r| non_blank(&r.trade_name)));

    (legal_name, trade_name)
}
