use crate::{DueStatus, EpochMillis, ItemKind, ItemRecord};

pub fn filter_by_text(items: &[ItemRecord], query: &str) -> Vec<ItemRecord> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|i| i.label.to_lowercase().contains(&q))
        .cloned()
        .collect()
}

pub fn filter_by_kind(items: &[ItemRecord], kind: ItemKind) -> Vec<ItemRecord> {
    items.iter().filter(|i| i.kind == kind).cloned().collect()
}

pub fn filter_by_due(items: &[ItemRecord], now: EpochMillis, want: DueStatus) -> Vec<ItemRecord> {
    items
        .iter()
        .filter(|i| i.state.due_status(now) == want)
        .cloned()
        .collect()
}

/// Items to show now: due and overdue first by due time, then new items by
/// creation time when `include_new` is set. `max` caps the result.
pub fn due_queue(
    items: &[ItemRecord],
    now: EpochMillis,
    include_new: bool,
    max: Option<usize>,
) -> Vec<ItemRecord> {
    let mut due: Vec<ItemRecord> = items
        .iter()
        .filter(|i| matches!(i.state.due_status(now), DueStatus::Due | DueStatus::Overdue))
        .cloned()
        .collect();
    due.sort_by_key(|i| (i.state.next_review_time, i.created_at));

    if include_new {
        let mut fresh = filter_by_due(items, now, DueStatus::New);
        fresh.sort_by_key(|i| i.created_at);
        due.extend(fresh);
    }
    if let Some(m) = max {
        due.truncate(m);
    }
    due
}
