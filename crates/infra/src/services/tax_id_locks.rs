//! Per-tax-id serialization of sync operations.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of async locks keyed by normalized tax id.
///
/// Two syncs for the same tax id run one after the other; different tax ids
/// never wait on each other.
#[derive(Clone, Default)]
pub struct TaxIdLocks {
    inner: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl TaxIdLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `tax_id`. The lock is held until the
    /// returned guard is dropped; the last guard out removes the entry.
    pub async fn acquire(&self, tax_id: &str) -> TaxIdGuard {
        let lock = Arc::clone(
            self.inner.entry(tax_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).value(),
        );
        let guard = lock.lock_owned().await;
        TaxIdGuard { tax_id: tax_id.to_string(), locks: Arc::clone(&self.inner), guard: Some(guard) }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Exclusive hold on one tax id, released on drop.
pub struct TaxIdGuard {
    tax_id: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for TaxIdGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left: nobody holds or waits.
        self.locks.remove_if(&self.tax_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
