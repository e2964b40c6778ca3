use std::fs;

use ledger_storage::{file_store::FileIdStore, sled_store::SledIdStore};
use tempfile::{tempdir, TempDir};

pub fn create_temp_file_store() -> (TempDir, FileIdStore) {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("my_id.txt");
    (temp_dir, FileIdStore::new(path))
}

pub fn create_temp_sled_store() -> (TempDir, SledIdStore) {
    // Create a temporary directory for the sled database
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("db");
    (
        temp_dir,
        SledIdStore::open(db_path).expect("Failed to open SledIdStore"),
    )
}

pub fn remove_temp_dir(temp_dir: TempDir) {
    let path = temp_dir.path().to_path_buf();
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&path);
    assert!(!path.exists(), "Temp directory should be removed");
}
