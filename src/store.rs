//! The document store boundary.
//!
//! The pipeline treats storage as an opaque collection keyed by invoice id.
//! [`DocumentStore`] is everything it relies on: one atomic insert per new
//! invoice, one atomic field replace for attaching impact metrics, exact-key
//! lookup, and a full scan for the read models in [`crate::reports`]. No
//! richer query capability is assumed, so any document database (or a flat
//! file) can sit behind this trait.
//!
//! [`MemoryStore`] is the in-process reference implementation; it backs the
//! integration tests and single-run CLI use.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::model::{ImpactEntry, InvoiceRecord};

/// Opaque document store for [`InvoiceRecord`]s.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a freshly assembled record, keyed by its id. One atomic write.
    async fn insert(&self, record: &InvoiceRecord) -> Result<(), PipelineError>;

    /// Exact-key lookup.
    async fn get(&self, id: Uuid) -> Result<Option<InvoiceRecord>, PipelineError>;

    /// Full-collection scan.
    async fn list(&self) -> Result<Vec<InvoiceRecord>, PipelineError>;

    /// Replace the record's impact entry wholesale (upsert — any previous
    /// entry is discarded, not merged).
    ///
    /// Returns `false` when no invoice with this id exists.
    async fn set_impact(
        &self,
        invoice_id: Uuid,
        impact: ImpactEntry,
    ) -> Result<bool, PipelineError>;
}

/// In-memory [`DocumentStore`].
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Uuid, InvoiceRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, record: &InvoiceRecord) -> Result<(), PipelineError> {
        self.records
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<InvoiceRecord>, PipelineError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<InvoiceRecord>, PipelineError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn set_impact(
        &self,
        invoice_id: Uuid,
        impact: ImpactEntry,
    ) -> Result<bool, PipelineError> {
        match self.records.write().await.get_mut(&invoice_id) {
            Some(record) => {
                record.impact_entry = Some(impact);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
