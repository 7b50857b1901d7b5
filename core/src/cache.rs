use crate::error::Result;
use crate::handle::IndexHandle;
use crate::persist::IndexStore;
use parking_lot::RwLock;
use std::sync::Arc;

/// Shares one loaded generation between requests and reloads it as soon as
/// the store's `CURRENT` pointer moves. Each `get` re-reads the pointer, so a
/// handle never outlives the publish of its successor.
pub struct IndexCache {
    store: IndexStore,
    current: RwLock<Option<Arc<IndexHandle>>>,
}

impl IndexCache {
    pub fn new(store: IndexStore) -> Self {
        Self { store, current: RwLock::new(None) }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn get(&self) -> Result<Option<Arc<IndexHandle>>> {
        let Some(generation) = self.store.current_generation()? else {
            *self.current.write() = None;
            return Ok(None);
        };
        if let Some(handle) = self.current.read().as_ref() {
            if handle.generation() == generation {
                return Ok(Some(Arc::clone(handle)));
            }
        }
        let loaded = Arc::new(self.store.load_generation(generation)?);
        tracing::info!(generation, "index generation changed, reloaded");
        *self.current.write() = Some(Arc::clone(&loaded));
        Ok(Some(loaded))
    }

    /// Installs a handle that was just published, skipping the reload.
    pub fn replace(&self, handle: IndexHandle) -> Arc<IndexHandle> {
        let handle = Arc::new(handle);
        *self.current.write() = Some(Arc::clone(&handle));
        handle
    }
}
