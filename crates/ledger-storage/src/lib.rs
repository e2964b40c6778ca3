//! Single-slot storage for the identifier a node owner sets.
//!
//! The slot holds one string. `put` overwrites whatever was there and `get`
//! returns the latest value, or `None` before the first write.

pub mod file_store;
pub mod sled_store;

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("id file i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("sled failed: {0}")]
    Sled(#[from] sled::Error),

    #[error("stored id is not valid UTF-8")]
    NotUtf8,
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub trait IdStore: Send + Sync {
    fn put(&self, value: &str) -> Result<()>;
    fn get(&self) -> Result<Option<String>>;
}
