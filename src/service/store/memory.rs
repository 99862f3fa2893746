//! In-memory backend for the store document, used by tests and dry runs.

use std::sync::{Arc, Mutex};

use crate::base::types::{Res, Void};

use super::{GenericStore, StoreClient, StoreDocument};

impl StoreClient {
    /// Creates a store that only lives in memory.
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<StoreDocument>>,
}

impl MemoryStore {
    pub fn with_document(document: StoreDocument) -> Self {
        Self { document: Mutex::new(Some(document)) }
    }
}

impl GenericStore for MemoryStore {
    fn load(&self) -> Res<Option<StoreDocument>> {
        let guard = self.document.lock().map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, document: &StoreDocument) -> Void {
        let mut guard = self.document.lock().map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        *guard = Some(document.clone());
        Ok(())
    }
}
