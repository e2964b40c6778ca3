use crate::{IdStore, Result};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::debug;

pub const DEFAULT_ID_FILE: &str = "my_id.txt";

/// Keeps the id as the whole content of one file.
///
/// Writes land in a sibling temp file that is renamed over the target, so a
/// reader sees either the old id or the new one, never a partial write.
#[derive(Clone, Debug)]
pub struct FileIdStore {
    path: PathBuf,
}

impl FileIdStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl IdStore for FileIdStore {
    fn put(&self, value: &str) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(self.dir())?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), "id written");
        Ok(())
    }

    fn get(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => Err(crate::StoreError::NotUtf8),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileIdStore::new(dir.path().join(DEFAULT_ID_FILE));
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn put_overwrites_longer_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileIdStore::new(dir.path().join(DEFAULT_ID_FILE));
        store.put("a-much-longer-identifier").unwrap();
        store.put("short").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("short"));
    }

    #[test]
    fn relative_path_without_directory_is_accepted() {
        let store = FileIdStore::new(DEFAULT_ID_FILE);
        assert_eq!(store.dir(), Path::new("."));
    }

    #[test]
    fn non_utf8_content_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_ID_FILE);
        fs::write(&path, [0xff, 0xfe, 0xfd]).unwrap();
        let store = FileIdStore::new(&path);
        assert!(matches!(store.get(), Err(crate::StoreError::NotUtf8)));
    }
}
