//! In-process store with the same overwrite semantics as Firestore.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};

use crate::data::models::{LastUpdated, StandingsDocument};

use super::{DocumentPath, StandingsStore, StoreError};

/// A document as the store holds it, with the write time resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub standings: Vec<String>,
    pub last_updated: DateTime<FixedOffset>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<String, StoredDocument>,
    writes: usize,
    fail_with: Option<StoreError>,
}

/// Cloning shares the underlying documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every write fails with `error`.
    pub fn failing(error: StoreError) -> Self {
        let store = Self::default();
        if let Ok(mut inner) = store.inner.write() {
            inner.fail_with = Some(error);
        }
        store
    }

    pub fn get(&self, path: &DocumentPath) -> Option<StoredDocument> {
        self.inner
            .read()
            .ok()
            .and_then(|inner| inner.documents.get(&path.to_string()).cloned())
    }

    /// Number of documents held.
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.documents.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of write calls received, including failed ones.
    pub fn write_count(&self) -> usize {
        self.inner.read().map(|i| i.writes).unwrap_or(0)
    }
}

#[async_trait]
impl StandingsStore for MemoryStore {
    async fn write(
        &self,
        path: &DocumentPath,
        document: &StandingsDocument,
    ) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Network(format!("store lock poisoned: {e}")))?;
        inner.writes += 1;

        if let Some(err) = inner.fail_with.clone() {
            return Err(err);
        }

        let last_updated = match document.last_updated {
            LastUpdated::ServerTime => Utc::now().fixed_offset(),
            LastUpdated::Client(ts) => ts,
        };
        inner.documents.insert(
            path.to_string(),
            StoredDocument {
                standings: document.standings.names().to_vec(),
                last_updated,
            },
        );
        Ok(())
    }
}
