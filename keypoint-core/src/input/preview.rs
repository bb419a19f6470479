//! Local previews of the selected image.
//!
//! A [`PreviewHandle`] releases its preview in the owning [`PreviewStore`]
//! when dropped, so replacing or clearing a selection can never leak one.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

/// Backing storage for previews (object URLs in a browser, an in-memory map here).
pub trait PreviewStore: Send + Sync {
    /// Register a preview for `data` and return its locator.
    fn acquire(&self, display_name: &str, data: &[u8]) -> String;

    /// Release a locator previously returned by [`PreviewStore::acquire`].
    fn release(&self, locator: &str);
}

/// Scoped preview resource. Released exactly once, on drop.
pub struct PreviewHandle {
    locator: String,
    store: Arc<dyn PreviewStore>,
}

impl PreviewHandle {
    pub fn acquire(store: &Arc<dyn PreviewStore>, display_name: &str, data: &[u8]) -> Self {
        let locator = store.acquire(display_name, data);
        debug!(locator = %locator, "Acquired preview");
        Self {
            locator,
            store: Arc::clone(store),
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        debug!(locator = %self.locator, "Releasing preview");
        self.store.release(&self.locator);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("locator", &self.locator)
            .finish()
    }
}

/// In-memory preview store keyed by `preview://<uuid>` locators.
#[derive(Default)]
pub struct MemoryPreviewStore {
    previews: DashMap<String, Arc<[u8]>>,
}

impl MemoryPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, locator: &str) -> Option<Arc<[u8]>> {
        self.previews.get(locator).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of previews currently held.
    pub fn len(&self) -> usize {
        self.previews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previews.is_empty()
    }
}

impl PreviewStore for MemoryPreviewStore {
    fn acquire(&self, _display_name: &str, data: &[u8]) -> String {
        let locator = format!("preview://{}", Uuid::new_v4());
        self.previews.insert(locator.clone(), Arc::from(data));
        locator
    }

    fn release(&self, locator: &str) {
        self.previews.remove(locator);
    }
}
