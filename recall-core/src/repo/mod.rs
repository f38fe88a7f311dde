use crate::{CoreError, ItemId, ItemKind, ItemRecord, ReviewLog, ReviewState};
use async_trait::async_trait;

pub mod memory;

/// Persists items and their scheduling state keyed by item id.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    // Items
    async fn add_item(&self, kind: ItemKind, label: &str) -> Result<ItemRecord, CoreError>;
    async fn get_item(&self, id: ItemId) -> Result<ItemRecord, CoreError>;
    async fn list_items(&self, kind: Option<ItemKind>) -> Result<Vec<ItemRecord>, CoreError>;
    async fn delete_item(&self, id: ItemId) -> Result<(), CoreError>;

    // Scheduling state
    async fn save_state(&self, id: ItemId, state: &ReviewState) -> Result<(), CoreError>;

    // Review log
    async fn insert_review(&self, review: &ReviewLog) -> Result<(), CoreError>;
    async fn list_reviews_for_item(&self, item_id: ItemId) -> Result<Vec<ReviewLog>, CoreError>;
    async fn list_reviews(&self) -> Result<Vec<ReviewLog>, CoreError>;

    /// Stores the new state and appends its log entry as one write. On error
    /// neither is visible.
    async fn commit_review(&self, state: &ReviewState, review: &ReviewLog) -> Result<(), CoreError>;
}
