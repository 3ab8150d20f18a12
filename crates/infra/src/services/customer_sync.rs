//! Customer sync orchestration
//!
//! One call to [`CustomerSyncService::sync`] maps the entity, looks for an
//! existing ERP customer, creates one when none is found, and writes the
//! outcome back to the local registration. Syncs for the same tax id are
//! serialized through [`TaxIdLocks`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use erpsync_core::MunicipalityTable;
//! use erpsync_domain::{Config, ConsolidatedBusinessEntity};
//! use erpsync_infra::{CustomerSyncService, DbManager, SqliteRegistrationRepository};
//!
//! # async fn example(entity: ConsolidatedBusinessEntity) -> erpsync_domain::Result<()> {
//! let config = erpsync_infra::config::load()?;
//! let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
//! db.run_migrations()?;
//!
//! let store = Arc::new(SqliteRegistrationRepository::new(db));
//! let service =
//!     CustomerSyncService::from_config(&config, store, Arc::new(MunicipalityTable::new()))?;
//!
//! let report = service.sync(&entity, None).await?;
//! println!("{}", report.status);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use erpsync_core::{MunicipalityResolver, PayloadMapper, RegistrationStore, TokenStore};
use erpsync_domain::{
    normalize_tax_id, Config, ConsolidatedBusinessEntity, ErpSyncError, ExternalCustomerRecord,
    Result, SyncOutcome, SyncStatus,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::tax_id_locks::TaxIdLocks;
use crate::integrations::erp::{
    CallOutcome, CustomerLocator, ErpAuthenticator, ErpRequest, ErpTransport, FileTokenStore,
    LocatorResult, ReconcileAction, ResilientClient, ResponseReconciler,
};

/// Result of one sync, for the caller and for logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Digits-only tax id.
    pub tax_id: String,
    pub status: SyncStatus,
    pub external_id: Option<String>,
    pub action: ReconcileAction,
    /// ERP error text when the customer was only saved locally.
    pub message: Option<String>,
}

pub struct CustomerSyncService {
    mapper: PayloadMapper,
    client: Arc<ResilientClient>,
    locator: CustomerLocator,
    reconciler: ResponseReconciler,
    locks: TaxIdLocks,
}

impl CustomerSyncService {
    pub fn new(
        mapper: PayloadMapper,
        client: Arc<ResilientClient>,
        reconciler: ResponseReconciler,
    ) -> Self {
        let locator = CustomerLocator::new(Arc::clone(&client));
        Self { mapper, client, locator, reconciler, locks: TaxIdLocks::new() }
    }

    /// Wire the full stack from configuration: file token store, HTTP
    /// authenticator, resilient client, locator, and reconciler.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn RegistrationStore>,
        municipalities: Arc<dyn MunicipalityResolver>,
    ) -> Result<Self> {
        let transport = Arc::new(ErpTransport::from_config(&config.erp)?);
        let tokens: Arc<dyn TokenStore> =
            Arc::new(FileTokenStore::new(&config.erp.token_file, &config.erp.token_key));
        let authenticator =
            Arc::new(ErpAuthenticator::new(Arc::clone(&transport), Arc::clone(&tokens)));
        let client = Arc::new(ResilientClient::new(transport, tokens, authenticator));

        Ok(Self::new(
            PayloadMapper::new(config.defaults.clone(), municipalities),
            client,
            ResponseReconciler::new(store, config.catalog_ids),
        ))
    }

    /// Share a lock registry with other services touching the same rows.
    pub fn with_locks(mut self, locks: TaxIdLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn locks(&self) -> &TaxIdLocks {
        &self.locks
    }

    pub fn locator(&self) -> &CustomerLocator {
        &self.locator
    }

    /// Sync `entity` with the ERP and record the result locally.
    ///
    /// An ERP failure is not an error: the registration is saved and the
    /// report carries [`SyncStatus::SavedLocallyNotSynced`].
    ///
    /// # Errors
    /// `Validation` when the mapped payload is unusable, `Config` when the
    /// integration is not configured.
    #[instrument(skip(self, entity), fields(tax_id = tracing::field::Empty))]
    pub async fn sync(
        &self,
        entity: &ConsolidatedBusinessEntity,
        explicit_local_id: Option<i64>,
    ) -> Result<SyncReport> {
        let tax_id = normalize_tax_id(entity.tax_id());
        if tax_id.is_empty() {
            return Err(ErpSyncError::Validation("entity has no tax id".into()));
        }
        tracing::Span::current().record("tax_id", tax_id.as_str());

        self.client.credentials()?;
        let _guard = self.locks.acquire(&tax_id).await;

        let payload = self.mapper.map(entity);
        payload.validate()?;

        let (status, outcome) = match self.locator.search(&tax_id).await? {
            LocatorResult::Found { record, .. } => {
                (SyncStatus::Linked, SyncOutcome::from_record(record))
            }
            LocatorResult::NotFound { .. } => {
                let request = ErpRequest::customer_create(payload.to_wire());
                self.create(&request).await?
            }
        };

        let action = self
            .reconciler
            .persist_with_profile(&tax_id, &outcome, explicit_local_id, Some(&entity.company))
            .await;

        let report = SyncReport {
            tax_id,
            status,
            external_id: outcome.external_id.clone(),
            action,
            message: outcome.error_message.clone(),
        };

        if report.status.is_warning() {
            warn!(
                status = %report.status,
                message = report.message.as_deref().unwrap_or_default(),
                "customer saved locally but not synced"
            );
        } else {
            info!(
                status = %report.status,
                external_id = report.external_id.as_deref().unwrap_or_default(),
                "customer synced"
            );
        }
        Ok(report)
    }

    async fn create(&self, request: &ErpRequest) -> Result<(SyncStatus, SyncOutcome)> {
        match self.client.execute(request, true).await? {
            CallOutcome::Success(response) => {
                let record = response.json().as_ref().and_then(ExternalCustomerRecord::from_value);
                match record {
                    Some(record) => {
                        let outcome = SyncOutcome::succeeded(
                            record.external_id.clone(),
                            Some(response.body.clone()),
                        )
                        .with_record(record);
                        Ok((SyncStatus::Created, outcome))
                    }
                    None => Ok((
                        SyncStatus::SavedLocallyNotSynced,
                        SyncOutcome::failed(
                            "ERP accepted the customer but returned no id",
                            Some(response.body),
                        ),
                    )),
                }
            }
            CallOutcome::Failure(error) => {
                Ok((SyncStatus::SavedLocallyNotSynced, SyncOutcome::failed(error.to_string(), None)))
            }
        }
    }
}
