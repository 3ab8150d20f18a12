//! Customer lookup by type-code probing
//!
//! The ERP only answers lookups scoped to a single customer type code, so
//! finding a customer by tax id means walking the catalog until one code
//! returns a record.

use std::sync::Arc;

use async_trait::async_trait;
use erpsync_core::{CodeProbe, ProbeOutcome, ProbePlan, ProbeStep};
use erpsync_domain::{normalize_tax_id, ErpSyncError, ExternalCustomerRecord, Result, TypeCode};
use tracing::{debug, info, instrument, warn};

use super::client::{CallOutcome, ResilientClient};
use super::errors::ErpErrorCategory;
use super::request::ErpRequest;

/// Result of [`CustomerLocator::search`].
#[derive(Debug, Clone, PartialEq)]
pub enum LocatorResult {
    Found {
        record: ExternalCustomerRecord,
        code: TypeCode,
        probes: usize,
    },
    /// Every code answered empty or failed. A normal outcome.
    NotFound { probes: usize },
}

impl LocatorResult {
    pub fn record(&self) -> Option<&ExternalCustomerRecord> {
        match self {
            Self::Found { record, .. } => Some(record),
            Self::NotFound { .. } => None,
        }
    }

    pub fn into_record(self) -> Option<ExternalCustomerRecord> {
        match self {
            Self::Found { record, .. } => Some(record),
            Self::NotFound { .. } => None,
        }
    }

    pub fn probes(&self) -> usize {
        match self {
            Self::Found { probes, .. } | Self::NotFound { probes } => *probes,
        }
    }
}

/// Finds an existing ERP customer by tax id across the type-code plan.
pub struct CustomerLocator {
    client: Arc<ResilientClient>,
    plan: ProbePlan,
}

impl CustomerLocator {
    /// Create a locator that issues lookups through `client`.
    pub fn new(client: Arc<ResilientClient>) -> Self {
        Self::with_plan(client, ProbePlan::standard())
    }

    pub fn with_plan(client: Arc<ResilientClient>, plan: ProbePlan) -> Self {
        Self { client, plan }
    }

    pub fn plan(&self) -> &ProbePlan {
        &self.plan
    }

    /// Find the ERP customer for `tax_id`, stopping at the first type code
    /// that returns a record.
    ///
    /// # Errors
    /// `Validation` for a tax id without digits, `Config` when the
    /// integration is not configured.
    #[instrument(skip(self), fields(codes = self.plan.codes().len()))]
    pub async fn search(&self, tax_id: &str) -> Result<LocatorResult> {
        let digits = normalized(tax_id)?;
        let probe = LookupProbe { client: &self.client, tax_id: &digits };

        match self.plan.first_match(&probe).await? {
            ProbeOutcome::Found { code, hit, probes } => {
                info!(
                    external_id = %hit.external_id,
                    type_code = %code.code,
                    probes,
                    "existing ERP customer found"
                );
                Ok(LocatorResult::Found { record: hit, code, probes })
            }
            ProbeOutcome::Exhausted { probes, failures } => {
                if !failures.is_empty() {
                    warn!(
                        probes,
                        failed = failures.len(),
                        "customer lookup exhausted with failed probes"
                    );
                }
                info!(probes, "no ERP customer for tax id");
                Ok(LocatorResult::NotFound { probes })
            }
        }
    }

    /// Probe every type code and return all matches in catalog order.
    ///
    /// # Errors
    /// Same as [`CustomerLocator::search`].
    #[instrument(skip(self))]
    pub async fn search_all(&self, tax_id: &str) -> Result<Vec<(TypeCode, ExternalCustomerRecord)>> {
        let digits = normalized(tax_id)?;
        let probe = LookupProbe { client: &self.client, tax_id: &digits };

        let matches = self.plan.all_matches(&probe).await?;
        if matches.len() > 1 {
            warn!(matches = matches.len(), "tax id matches several ERP customers");
        }
        Ok(matches)
    }
}

fn normalized(tax_id: &str) -> Result<String> {
    let digits = normalize_tax_id(tax_id);
    if digits.is_empty() {
        return Err(ErpSyncError::Validation(format!(
            "tax id '{tax_id}' contains no digits"
        )));
    }
    Ok(digits)
}

/// One lookup call per type code.
struct LookupProbe<'a> {
    client: &'a ResilientClient,
    tax_id: &'a str,
}

#[async_trait]
impl CodeProbe for LookupProbe<'_> {
    type Hit = ExternalCustomerRecord;

    async fn probe(&self, code: TypeCode) -> Result<ProbeStep<Self::Hit>> {
        let request = ErpRequest::customer_lookup(self.tax_id, code.code);

        let response = match self.client.execute(&request, true).await? {
            CallOutcome::Success(response) => response,
            CallOutcome::Failure(error) if error.category() == ErpErrorCategory::NotFound => {
                return Ok(ProbeStep::Miss);
            }
            CallOutcome::Failure(error) => return Ok(ProbeStep::Failed(error.to_string())),
        };

        if !response.has_content() {
            return Ok(ProbeStep::Miss);
        }

        match response.json().as_ref().and_then(ExternalCustomerRecord::from_value) {
            Some(record) => Ok(ProbeStep::Hit(record)),
            None => {
                debug!(type_code = %code.code, "lookup body had content but no customer id");
                Ok(ProbeStep::Failed(format!(
                    "unrecognised lookup response for type {}",
                    code.code
                )))
            }
        }
    }
}
