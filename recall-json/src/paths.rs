use directories::ProjectDirs;
use std::path::PathBuf;

pub fn data_root() -> PathBuf {
    if let Some(pd) = ProjectDirs::from("com", "recall", "Recall") {
        pd.data_dir().to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

pub fn default_store_file() -> PathBuf {
    data_root().join("recall.json")
}

/// Backups live next to the store file.
pub fn backups_dir_for(file: &std::path::Path) -> PathBuf {
    match file.parent() {
        Some(parent) => parent.join("backups"),
        None => PathBuf::from("backups"),
    }
}
