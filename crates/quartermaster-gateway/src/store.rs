//! [`SessionStore`] implementations.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use crate::{SessionStore, StoreError};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// An in-process token slot.
///
/// Clones share the same slot, so a test (or an embedding UI) can keep one
/// clone to inspect what the coordinator persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `token`, as if a previous run
    /// had persisted it.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.into()))),
        }
    }
}

impl SessionStore for MemoryStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        let slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(slot.clone())
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// A token slot backed by a single file.
///
/// Writes go to a randomly named temp file in the same directory and are
/// renamed into place, so a crash mid-write leaves either the old token or
/// the new one, never half. On Unix the file is readable by its owner only
/// (mode `0600`).
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Uses `path` as the slot. Parent directories are created on first
    /// write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file backing this slot.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(token.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        tracing::trace!(path = %self.path.display(), "token persisted");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // =====================================================================
    // MemoryStore
    // =====================================================================

    #[test]
    fn test_memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_memory_store_clones_share_slot() {
        let store = MemoryStore::new();
        let observer = store.clone();

        store.set("abc").unwrap();

        assert_eq!(observer.get().unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_memory_store_clear_is_idempotent() {
        let store = MemoryStore::with_token("abc");

        store.clear().unwrap();
        store.clear().unwrap();

        assert_eq!(store.get().unwrap(), None);
    }

    // =====================================================================
    // FileStore
    // =====================================================================

    #[test]
    fn test_file_store_missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("token"));

        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_set_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested/deeper/token"));

        store.set("abc.def.ghi").unwrap();

        assert_eq!(store.get().unwrap().as_deref(), Some("abc.def.ghi"));
        let entries = fs::read_dir(dir.path().join("nested/deeper")).unwrap();
        assert_eq!(entries.count(), 1, "temp file should be renamed away");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_token_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("token"));

        store.set("abc").unwrap();
        store.set("def").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_store_overwrite_replaces_token() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("token"));

        store.set("first").unwrap();
        store.set("second").unwrap();

        assert_eq!(store.get().unwrap().as_deref(), Some("second"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_file_store_survives_new_instance() {
        // A second FileStore on the same path plays the part of the next
        // process start.
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        FileStore::new(&path).set("persisted").unwrap();

        let reopened = FileStore::new(&path);

        assert_eq!(reopened.get().unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_file_store_clear_removes_file_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("token"));
        store.set("abc").unwrap();

        store.clear().unwrap();
        store.clear().unwrap();

        assert!(!store.path().exists());
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_blank_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "  \n").unwrap();

        assert_eq!(FileStore::new(path).get().unwrap(), None);
    }
}
