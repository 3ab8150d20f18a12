//! Ordered type-code probing
//!
//! [`ProbePlan`] walks a [`TypeCodeCatalog`] in declared order and asks a
//! [`CodeProbe`] strategy about each code. A probe that fails is recorded and
//! the scan moves on; only an `Err` from the probe (configuration problems)
//! aborts the plan.

use async_trait::async_trait;
use erpsync_domain::{Result, TypeCode};
use tracing::debug;

use super::catalog::TypeCodeCatalog;

/// Result of probing a single type code.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeStep<H> {
    /// The ERP returned a non-empty match for this code.
    Hit(H),
    /// Definitive empty answer.
    Miss,
    /// The call failed; the scan continues with the next code.
    Failed(String),
}

/// One lookup per type code.
#[async_trait]
pub trait CodeProbe: Send + Sync {
    type Hit: Send;

    /// # Errors
    /// Returning `Err` aborts the whole plan.
    async fn probe(&self, code: TypeCode) -> Result<ProbeStep<Self::Hit>>;
}

/// Result of [`ProbePlan::first_match`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<H> {
    Found {
        code: TypeCode,
        hit: H,
        /// Lookups issued, including the matching one.
        probes: usize,
    },
    Exhausted {
        probes: usize,
        failures: Vec<(TypeCode, String)>,
    },
}

impl<H> ProbeOutcome<H> {
    pub fn probes(&self) -> usize {
        match self {
            Self::Found { probes, .. } | Self::Exhausted { probes, .. } => *probes,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProbePlan {
    catalog: TypeCodeCatalog,
}

impl ProbePlan {
    pub fn new(catalog: TypeCodeCatalog) -> Self {
        Self { catalog }
    }

    pub fn standard() -> Self {
        Self::new(TypeCodeCatalog::standard())
    }

    pub fn codes(&self) -> &[TypeCode] {
        self.catalog.entries()
    }

    /// Probe codes in order and stop at the first hit.
    pub async fn first_match<P>(&self, probe: &P) -> Result<ProbeOutcome<P::Hit>>
    where
        P: CodeProbe + ?Sized,
    {
        let mut failures = Vec::new();

        for (index, code) in self.codes().iter().copied().enumerate() {
            match probe.probe(code).await? {
                ProbeStep::Hit(hit) => {
                    debug!(code = %code.code, probes = index + 1, "type-code probe matched");
                    return Ok(ProbeOutcome::Found { code, hit, probes: index + 1 });
                }
                ProbeStep::Miss => {}
                ProbeStep::Failed(reason) => {
                    debug!(code = %code.code, reason = %reason, "type-code probe failed, continuing");
                    failures.push((code, reason));
                }
            }
        }

        Ok(ProbeOutcome::Exhausted { probes: self.codes().len(), failures })
    }

    /// Probe every code and collect all hits in catalog order.
    pub async fn all_matches<P>(&self, probe: &P) -> Result<Vec<(TypeCode, P::Hit)>>
    where
        P: CodeProbe + ?Sized,
    {
        let mut hits = Vec::new();

        for code in self.codes().iter().copied() {
            if let ProbeStep::Hit(hit) = probe.probe(code).await? {
                hits.push((code, hit));
            }
        }

        Ok(hits)
    }
}
