//! Atomic model snapshot.
//!
//! Requests take a cheap `Arc` clone under a short read lock and keep using
//! that snapshot even if a reload lands mid-request. Reloads build the new
//! store outside the lock and swap the whole `Arc` in one write.

use crate::error::{RecommendError, Result};
use model_store::ModelStore;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::info;

#[derive(Debug, Default)]
pub struct ModelHandle {
    store: RwLock<Option<Arc<ModelStore>>>,
}

impl ModelHandle {
    /// An empty handle; requests fail with `ModelNotLoaded` until `install`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<ModelStore>) -> Self {
        Self {
            store: RwLock::new(Some(store)),
        }
    }

    /// Replace the current snapshot, returning the previous one
    pub fn install(&self, store: Arc<ModelStore>) -> Option<Arc<ModelStore>> {
        let mut guard = self.store.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.replace(store)
    }

    pub fn snapshot(&self) -> Result<Arc<ModelStore>> {
        let guard = self.store.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.as_ref().cloned().ok_or(RecommendError::ModelNotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_ok()
    }

    /// Load `model_dir` and swap it in. On failure the current snapshot stays.
    pub fn reload_from(&self, model_dir: &Path) -> Result<Arc<ModelStore>> {
        let store = Arc::new(ModelStore::load(model_dir)?);
        self.install(Arc::clone(&store));
        info!("Installed model store from {:?}", model_dir);
        Ok(store)
    }
}
