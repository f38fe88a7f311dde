use crate::{CoreError, ItemId, ItemKind, ItemRecord, ReviewLog, ReviewState};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<ItemId, ItemRecord>>,
    reviews: RwLock<HashMap<ItemId, Vec<ReviewLog>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl crate::repo::ReviewStore for MemoryStore {
    async fn add_item(&self, kind: ItemKind, label: &str) -> Result<ItemRecord, CoreError> {
        let item = ItemRecord::new(kind, label);
        let mut m = self.items.write();
        if m.values().any(|i| i.kind == kind && i.label.eq_ignore_ascii_case(label)) {
            return Err(CoreError::Conflict("item label already exists"));
        }
        m.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, id: ItemId) -> Result<ItemRecord, CoreError> {
        self.items
            .read()
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("item"))
    }

    async fn list_items(&self, kind: Option<ItemKind>) -> Result<Vec<ItemRecord>, CoreError> {
        let items = self.items.read();
        let mut v: Vec<ItemRecord> = items.values().cloned().collect();
        if let Some(k) = kind {
            v.retain(|i| i.kind == k);
        }
        Ok(v)
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), CoreError> {
        self.items
            .write()
            .remove(&id)
            .ok_or(CoreError::NotFound("item"))?;
        self.reviews.write().remove(&id);
        Ok(())
    }

    async fn save_state(&self, id: ItemId, state: &ReviewState) -> Result<(), CoreError> {
        let mut m = self.items.write();
        let Some(item) = m.get_mut(&id) else {
            return Err(CoreError::NotFound("item"));
        };
        item.state = state.clone();
        Ok(())
    }

    async fn insert_review(&self, review: &ReviewLog) -> Result<(), CoreError> {
        let mut m = self.reviews.write();
        m.entry(review.item_id).or_default().push(review.clone());
        Ok(())
    }

    async fn list_reviews_for_item(&self, item_id: ItemId) -> Result<Vec<ReviewLog>, CoreError> {
        Ok(self
            .reviews
            .read()
            .get(&item_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_reviews(&self) -> Result<Vec<ReviewLog>, CoreError> {
        Ok(self.reviews.read().values().flatten().cloned().collect())
    }

    async fn commit_review(&self, state: &ReviewState, review: &ReviewLog) -> Result<(), CoreError> {
        let mut items = self.items.write();
        let Some(item) = items.get_mut(&review.item_id) else {
            return Err(CoreError::NotFound("item"));
        };
        let mut reviews = self.reviews.write();
        item.state = state.clone();
        reviews.entry(review.item_id).or_default().push(review.clone());
        Ok(())
    }
}
