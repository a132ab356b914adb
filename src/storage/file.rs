//! File-backed slot store, one JSON document per key.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::{StorageError, StorageResult, StorageSlot};

/// Directory name under the platform data directory.
const APP_DIR: &str = "lexviet";

/// Slot store persisting each key as a file under one directory.
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open the default store under the platform data directory.
    ///
    /// # Errors
    /// Returns an error when no platform data directory exists or the
    /// application directory cannot be created.
    pub fn open_default() -> StorageResult<Self> {
        let base = dirs::data_dir().ok_or_else(|| {
            StorageError::WriteRejected("no platform data directory".to_string())
        })?;
        Self::new(base.join(APP_DIR))
    }

    /// Directory this store writes into.
    #[must_use]
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys embed identity ids from an external provider; keep file
        // names to a safe character set.
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl StorageSlot for FileSlotStore {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        // Write through a sibling temp file so a crashed write never leaves
        // a truncated slot behind.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_as_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileSlotStore::new(tmp.path()).unwrap();
        assert!(store.read("conversations_guest").unwrap().is_none());
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileSlotStore::new(tmp.path()).unwrap();
        store.write("conversations_u1", "[]").unwrap();
        assert_eq!(store.read("conversations_u1").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_keys_map_to_distinct_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileSlotStore::new(tmp.path()).unwrap();
        store.write("conversations_u1", "one").unwrap();
        store.write("conversations_u2", "two").unwrap();
        assert_eq!(store.read("conversations_u1").unwrap().as_deref(), Some("one"));
        assert_eq!(store.read("conversations_u2").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_unsafe_key_characters_are_sanitized() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileSlotStore::new(tmp.path()).unwrap();
        store.write("conversations_../../etc", "data").unwrap();
        // The write must land inside the store directory.
        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileSlotStore::new(tmp.path()).unwrap();
        store.write("k", "v").unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.read("k").unwrap().is_none());
    }
}
