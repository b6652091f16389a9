use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use minichat::storage::{SessionStore, SqliteKeyValueStore};

#[allow(dead_code)]
pub fn create_temp_store() -> (SessionStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("history.db");
    let backend =
        SqliteKeyValueStore::new_with_path(db_path).expect("failed to create sqlite store with path");
    (SessionStore::new(Arc::new(backend)), tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
