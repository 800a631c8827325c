//! Working set plus committed snapshot over a pluggable durable backend.
//!
//! A run mutates the working set through [`Store::upsert`]; nothing becomes
//! visible to readers until [`Store::commit`] has written it durably. The
//! [`ReadModel`] handles held by the HTTP layer only ever see the snapshot
//! published by the last successful commit.

mod json_file;
mod sqlite;

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use harvest_core::{most_recent, Record, RecordSet, Upsert};
use harvest_logging::{harvest_debug, harvest_info};

use crate::persist::PersistError;

pub use json_file::JsonFileBackend;
pub use sqlite::SqliteBackend;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Write(#[from] PersistError),
    #[error("invalid store contents: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable form of the record collection.
#[async_trait::async_trait]
pub trait StoreBackend: Send + Sync {
    /// Short human-readable location for logs.
    fn describe(&self) -> String;

    /// All stored records in insertion order. Missing state is empty.
    async fn load(&self) -> Result<Vec<Record>, StoreError>;

    /// Makes `all` the durable state. `changed` lists the records touched
    /// since the previous persist, for backends that write incrementally.
    /// Must leave the previous state intact on failure.
    async fn persist(&self, all: &[Record], changed: &[&Record]) -> Result<(), StoreError>;
}

type Snapshot = Arc<RwLock<Arc<Vec<Record>>>>;

pub struct Store {
    backend: Box<dyn StoreBackend>,
    working: RecordSet,
    changed: BTreeSet<String>,
    committed: Snapshot,
}

impl Store {
    pub async fn open(backend: Box<dyn StoreBackend>) -> Result<Self, StoreError> {
        let records = backend.load().await?;
        harvest_info!(
            "Loaded {} records from {}",
            records.len(),
            backend.describe()
        );
        let working = RecordSet::from_records(records);
        let committed = Arc::new(RwLock::new(Arc::new(working.as_slice().to_vec())));
        Ok(Self {
            backend,
            working,
            changed: BTreeSet::new(),
            committed,
        })
    }

    pub fn exists(&self, id: &str) -> bool {
        self.working.exists(id)
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.working.get(id)
    }

    pub fn upsert(&mut self, record: Record) -> Upsert {
        self.changed.insert(record.id.clone());
        self.working.upsert(record)
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    /// Records changed since the last successful commit.
    pub fn pending(&self) -> usize {
        self.changed.len()
    }

    /// Persists the working set, then publishes it to readers. On failure
    /// the durable state and the published snapshot are left as they were
    /// and the pending changes are kept for the next attempt.
    pub async fn commit(&mut self) -> Result<usize, StoreError> {
        let changed: Vec<&Record> = self
            .changed
            .iter()
            .filter_map(|id| self.working.get(id))
            .collect();
        self.backend.persist(self.working.as_slice(), &changed).await?;
        harvest_debug!(
            "Committed {} records ({} changed) to {}",
            self.working.len(),
            changed.len(),
            self.backend.describe()
        );

        self.changed.clear();
        let snapshot = Arc::new(self.working.as_slice().to_vec());
        *self
            .committed
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
        Ok(self.working.len())
    }

    pub fn read_model(&self) -> ReadModel {
        ReadModel {
            committed: Arc::clone(&self.committed),
        }
    }
}

/// Read-only view of the last committed state. Cheap to clone.
#[derive(Clone)]
pub struct ReadModel {
    committed: Snapshot,
}

impl ReadModel {
    pub fn snapshot(&self) -> Arc<Vec<Record>> {
        Arc::clone(&self.committed.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Up to `count` records, newest publication first.
    pub fn recent(&self, count: usize) -> Vec<Record> {
        most_recent(&self.snapshot(), count)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}
