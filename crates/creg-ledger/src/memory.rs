use std::collections::HashMap;
use std::sync::RwLock;

use creg_types::{CertificateId, CertificateRecord};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::traits::CertificateLedger;

/// Record map plus insertion order. Shared by the in-memory and WAL ledgers.
#[derive(Default)]
pub(crate) struct LedgerState {
    records: HashMap<CertificateId, CertificateRecord>,
    order: Vec<CertificateId>,
}

impl LedgerState {
    pub(crate) fn contains(&self, id: &CertificateId) -> bool {
        self.records.contains_key(id)
    }

    pub(crate) fn get(&self, id: &CertificateId) -> Option<CertificateRecord> {
        self.records.get(id).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Insert-if-absent. The caller holds whatever lock makes this atomic.
    pub(crate) fn insert(&mut self, record: CertificateRecord) -> LedgerResult<()> {
        if self.records.contains_key(&record.id) {
            return Err(LedgerError::DuplicateId(record.id));
        }
        self.order.push(record.id);
        self.records.insert(record.id, record);
        Ok(())
    }

    pub(crate) fn records(&self) -> Vec<CertificateRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect()
    }
}

/// In-memory ledger for tests, local demos, and embedding.
pub struct InMemoryLedger {
    inner: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerState::default()),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl CertificateLedger for InMemoryLedger {
    fn insert(&self, record: CertificateRecord) -> LedgerResult<()> {
        let mut state = self.inner.write().map_err(|_| LedgerError::Poisoned)?;
        let id = record.id;
        state.insert(record)?;
        debug!(id = %id.short_id(), "certificate inserted");
        Ok(())
    }

    fn get(&self, id: &CertificateId) -> LedgerResult<Option<CertificateRecord>> {
        let state = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.get(id))
    }

    fn contains(&self, id: &CertificateId) -> LedgerResult<bool> {
        let state = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.contains(id))
    }

    fn len(&self) -> LedgerResult<usize> {
        let state = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.len())
    }

    fn records(&self) -> LedgerResult<Vec<CertificateRecord>> {
        let state = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.records())
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("record_count", &self.len().unwrap_or(0))
            .finish()
    }
}
