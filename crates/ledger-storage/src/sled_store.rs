use crate::{IdStore, Result, StoreError};
use sled::Db;
use std::path::Path;
use tracing::{debug, info};

const TREE_NODE: &str = "node";
const KEY_ID: &[u8] = b"id";

/// Keeps the id under a fixed key in a sled database.
#[derive(Clone)]
pub struct SledIdStore {
    db: Db,
}

impl SledIdStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        info!("sled id store opened");
        Ok(Self { db })
    }

    fn tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(TREE_NODE)?)
    }

    pub fn close(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl IdStore for SledIdStore {
    fn put(&self, value: &str) -> Result<()> {
        let tree = self.tree()?;
        tree.insert(KEY_ID, value.as_bytes())?;
        tree.flush()?;
        debug!("id written");
        Ok(())
    }

    fn get(&self) -> Result<Option<String>> {
        match self.tree()?.get(KEY_ID)? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|_| StoreError::NotUtf8),
            None => Ok(None),
        }
    }
}
