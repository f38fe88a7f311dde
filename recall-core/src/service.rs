//! Read-modify-write of persisted review state, serialized per item.

use crate::repo::ReviewStore;
use crate::scheduler::{AttemptPolicy, QualityPolicy, ReviewResult};
use crate::{CoreError, EpochMillis, ItemId, ItemRecord, Quality, ReviewLog};
use chrono::TimeZone;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct RecordedReview {
    pub item: ItemRecord,
    pub result: ReviewResult,
    pub log: ReviewLog,
}

pub struct ReviewService<Tz: TimeZone> {
    store: Arc<dyn ReviewStore>,
    tz: Tz,
    policy: Box<dyn QualityPolicy + Send + Sync>,
    locks: Mutex<HashMap<ItemId, Arc<AsyncMutex<()>>>>,
}

impl<Tz: TimeZone> ReviewService<Tz> {
    pub fn new(store: Arc<dyn ReviewStore>, tz: Tz) -> Self {
        Self {
            store,
            tz,
            policy: Box::new(AttemptPolicy),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_policy(mut self, policy: impl QualityPolicy + Send + Sync + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn store(&self) -> &Arc<dyn ReviewStore> {
        &self.store
    }

    pub fn tz(&self) -> &Tz {
        &self.tz
    }

    fn lock_for(&self, id: ItemId) -> Arc<AsyncMutex<()>> {
        self.locks.lock().entry(id).or_default().clone()
    }

    /// Drops the map entry once no other task holds or waits on it. Clones
    /// are only handed out under the map lock, so a count of one is final.
    fn release(&self, id: ItemId, lock: Arc<AsyncMutex<()>>) {
        let mut locks = self.locks.lock();
        drop(lock);
        if locks.get(&id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&id);
        }
    }

    /// Records one review of `quality` for `item_id`. Nothing is written when
    /// the stored state fails validation.
    pub async fn record(
        &self,
        item_id: ItemId,
        quality: Quality,
        now: EpochMillis,
    ) -> Result<RecordedReview, CoreError> {
        let lock = self.lock_for(item_id);
        let out = {
            let _guard = lock.lock().await;
            self.record_locked(item_id, quality, now).await
        };
        self.release(item_id, lock);
        out
    }

    async fn record_locked(
        &self,
        item_id: ItemId,
        quality: Quality,
        now: EpochMillis,
    ) -> Result<RecordedReview, CoreError> {
        let mut item = self.store.get_item(item_id).await?;
        let mut state = item.state.clone();
        let result = state.record_review_in(&self.tz, quality, now)?;

        let log = ReviewLog::new(item_id, quality, now, result.next_interval, result.ease_factor);
        self.store.commit_review(&state, &log).await?;

        debug!(item = %item_id, quality = quality.as_score(), interval = result.next_interval, "review recorded");
        item.state = state;
        Ok(RecordedReview { item, result, log })
    }

    pub async fn record_score(
        &self,
        item_id: ItemId,
        quality: i32,
        now: EpochMillis,
    ) -> Result<RecordedReview, CoreError> {
        let quality = Quality::try_from(quality)?;
        self.record(item_id, quality, now).await
    }

    /// Records a raw outcome, scored by this service's quality policy.
    pub async fn record_outcome(
        &self,
        item_id: ItemId,
        is_correct: bool,
        attempt_count: u32,
        now: EpochMillis,
    ) -> Result<RecordedReview, CoreError> {
        let quality = self.policy.derive(is_correct, attempt_count);
        self.record(item_id, quality, now).await
    }

    pub async fn delete_item(&self, item_id: ItemId) -> Result<(), CoreError> {
        let lock = self.lock_for(item_id);
        let out = {
            let _guard = lock.lock().await;
            self.store.delete_item(item_id).await
        };
        self.release(item_id, lock);
        out
    }
}
