//! In-memory selection for callers without their own selection model.

use async_trait::async_trait;
use pickprep_core::{MediaId, MediaItem, Selection};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct InMemorySelection {
    items: Mutex<Vec<MediaItem>>,
}

impl InMemorySelection {
    pub fn new(items: Vec<MediaItem>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    /// Copy of the current selection, in selection order.
    pub async fn items(&self) -> Vec<MediaItem> {
        self.items.lock().await.clone()
    }

    pub async fn contains(&self, id: &MediaId) -> bool {
        self.items.lock().await.iter().any(|item| &item.id == id)
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    pub async fn add(&self, item: MediaItem) {
        let mut items = self.items.lock().await;
        if !items.iter().any(|existing| existing.id == item.id) {
            items.push(item);
        }
    }
}

#[async_trait]
impl Selection for InMemorySelection {
    async fn remove_all(&self, items: &[MediaItem]) {
        let mut selected = self.items.lock().await;
        selected.retain(|item| !items.iter().any(|removed| removed.id == item.id));
    }

    async fn clear(&self) {
        self.items.lock().await.clear();
    }
}
