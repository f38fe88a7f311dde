use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use recall_core::{repo::ReviewStore, CoreError, ItemId, ItemKind, ItemRecord, ReviewLog, ReviewState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task;
use tracing::{debug, info, warn};

pub mod paths;

const FILE_VERSION: u32 = 1;

#[derive(Clone, Serialize, Deserialize)]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    items: Vec<ItemRecord>,
    reviews: Vec<ReviewLog>,
}

#[derive(Clone)]
struct State {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    items: HashMap<ItemId, ItemRecord>,
    reviews: HashMap<ItemId, Vec<ReviewLog>>,
}

impl State {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            items: HashMap::new(),
            reviews: HashMap::new(),
        }
    }

    fn to_image(&self) -> FileImage {
        let mut items: Vec<ItemRecord> = self.items.values().cloned().collect();
        items.sort_by_key(|i| i.created_at);
        let mut reviews: Vec<ReviewLog> = self.reviews.values().flatten().cloned().collect();
        reviews.sort_by_key(|r| r.reviewed_at);
        FileImage {
            version: FILE_VERSION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
            reviews,
        }
    }

    fn from_image(img: FileImage) -> Self {
        let items = img.items.into_iter().map(|i| (i.id, i)).collect();
        let mut reviews: HashMap<ItemId, Vec<ReviewLog>> = HashMap::new();
        for r in img.reviews {
            reviews.entry(r.item_id).or_default().push(r);
        }
        Self {
            created_at: img.created_at,
            updated_at: img.updated_at,
            items,
            reviews,
        }
    }
}

/// Whole-file JSON store. Every mutation rewrites the file atomically and
/// drops a timestamped copy into the backups directory.
///
/// Mutations run one at a time under `writer`: each edits a copy of the
/// state, writes it, and only then swaps it in, so readers never see data
/// that is not on disk and the file always holds the latest commit.
pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<State>,
    writer: AsyncMutex<()>,
}

impl JsonStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let file = paths::default_store_file();
        let backups = paths::backups_dir_for(&file);
        Self::open_with(file, backups, 10).await
    }

    pub async fn open_with(path: PathBuf, backups_dir: PathBuf, max_backups: usize) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let max_backups = max_backups.max(1);
        let state = load_or_init(&path, &backups_dir, max_backups).await?;
        info!(path = %path.display(), items = state.items.len(), "opened json store");
        Ok(Self {
            path,
            backups_dir,
            max_backups,
            state: RwLock::new(state),
            writer: AsyncMutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn commit<T, F>(&self, edit: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut State) -> Result<T, CoreError> + Send,
        T: Send,
    {
        let _writer = self.writer.lock().await;
        let mut next = self.state.read().clone();
        let out = edit(&mut next)?;
        next.updated_at = Utc::now();

        let snapshot = next.to_image();
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;
        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &snapshot))
            .await
            .map_err(|_| CoreError::Storage("io"))?
            .map_err(|e| {
                warn!(path = %self.path.display(), error = %e, "json store write failed");
                CoreError::Storage("io")
            })?;

        *self.state.write() = next;
        debug!(path = %self.path.display(), "saved json store");
        Ok(out)
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|_| CoreError::Storage("io"))
}

async fn load_or_init(path: &Path, backups_dir: &Path, keep: usize) -> Result<State, CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let img: FileImage = task::spawn_blocking(move || {
            let mut f = fs::File::open(&p)?;
            let mut buf = String::new();
            f.read_to_string(&mut buf)?;
            let v = serde_json::from_str::<FileImage>(&buf)?;
            Ok::<FileImage, std::io::Error>(v)
        })
        .await
        .map_err(|_| CoreError::Storage("io"))?
        .map_err(|_| CoreError::Storage("corrupt store file"))?;
        if img.version > FILE_VERSION {
            return Err(CoreError::Storage("store file from a newer version"));
        }
        Ok(State::from_image(img))
    } else {
        let st = State::new_empty();
        let img = st.to_image();
        write_with_backup(path, backups_dir, keep, &img).map_err(|_| CoreError::Storage("io"))?;
        Ok(st)
    }
}

fn write_with_backup(path: &Path, backups_dir: &Path, max_backups: usize, img: &FileImage) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img)?;
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.persist(path)?;

    let backup_path = backups_dir.join(backup_name(Utc::now()));
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(&json)?;
    btmp.flush()?;
    btmp.persist(&backup_path)?;

    rotate_backups(backups_dir, max_backups)?;

    Ok(())
}

fn backup_name(at: DateTime<Utc>) -> String {
    format!("recall-{}.json", at.format("%Y%m%d-%H%M%S%.3fZ"))
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    // Names embed a UTC timestamp, so lexical order is chronological.
    entries.sort();
    if entries.len() > keep {
        for p in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(p);
        }
    }
    Ok(())
}

#[async_trait]
impl ReviewStore for JsonStore {
    async fn add_item(&self, kind: ItemKind, label: &str) -> Result<ItemRecord, CoreError> {
        let item = ItemRecord::new(kind, label);
        self.commit(|s| {
            if s.items.values().any(|i| i.kind == kind && i.label.eq_ignore_ascii_case(label)) {
                return Err(CoreError::Conflict("item label already exists"));
            }
            s.items.insert(item.id, item.clone());
            Ok(())
        })
        .await?;
        Ok(item)
    }

    async fn get_item(&self, id: ItemId) -> Result<ItemRecord, CoreError> {
        let s = self.state.read();
        s.items.get(&id).cloned().ok_or(CoreError::NotFound("item"))
    }

    async fn list_items(&self, kind: Option<ItemKind>) -> Result<Vec<ItemRecord>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<ItemRecord> = s.items.values().cloned().collect();
        if let Some(k) = kind {
            v.retain(|i| i.kind == k);
        }
        Ok(v)
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), CoreError> {
        self.commit(|s| {
            if s.items.remove(&id).is_none() {
                return Err(CoreError::NotFound("item"));
            }
            s.reviews.remove(&id);
            Ok(())
        })
        .await
    }

    async fn save_state(&self, id: ItemId, state: &ReviewState) -> Result<(), CoreError> {
        self.commit(|s| {
            let Some(item) = s.items.get_mut(&id) else {
                return Err(CoreError::NotFound("item"));
            };
            item.state = state.clone();
            Ok(())
        })
        .await
    }

    async fn insert_review(&self, review: &ReviewLog) -> Result<(), CoreError> {
        self.commit(|s| {
            s.reviews.entry(review.item_id).or_default().push(review.clone());
            Ok(())
        })
        .await
    }

    async fn list_reviews_for_item(&self, item_id: ItemId) -> Result<Vec<ReviewLog>, CoreError> {
        let s = self.state.read();
        Ok(s.reviews.get(&item_id).cloned().unwrap_or_default())
    }

    async fn list_reviews(&self) -> Result<Vec<ReviewLog>, CoreError> {
        let s = self.state.read();
        Ok(s.reviews.values().flatten().cloned().collect())
    }

    async fn commit_review(&self, state: &ReviewState, review: &ReviewLog) -> Result<(), CoreError> {
        self.commit(|s| {
            let Some(item) = s.items.get_mut(&review.item_id) else {
                return Err(CoreError::NotFound("item"));
            };
            item.state = state.clone();
            s.reviews.entry(review.item_id).or_default().push(review.clone());
            Ok(())
        })
        .await
    }
}
