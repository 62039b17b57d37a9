//! Runtime choice between the bundled token stores.

use quartermaster_gateway::{FileStore, MemoryStore, SessionStore, StoreError};

/// Either of the bundled [`SessionStore`]s, picked at runtime from
/// configuration.
#[derive(Debug, Clone)]
pub enum TokenStore {
    /// Forgotten when the process exits.
    Memory(MemoryStore),
    /// Survives restarts.
    File(FileStore),
}

impl SessionStore for TokenStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        match self {
            Self::Memory(store) => store.get(),
            Self::File(store) => store.get(),
        }
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.set(token),
            Self::File(store) => store.set(token),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.clear(),
            Self::File(store) => store.clear(),
        }
    }
}

impl From<MemoryStore> for TokenStore {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl From<FileStore> for TokenStore {
    fn from(store: FileStore) -> Self {
        Self::File(store)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_memory_variant_delegates() {
        let inner = MemoryStore::new();
        let store = TokenStore::from(inner.clone());

        store.set("abc").unwrap();

        assert_eq!(inner.get().unwrap().as_deref(), Some("abc"));
        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_variant_delegates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        let store = TokenStore::from(FileStore::new(&path));

        store.set("abc").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc");
        assert_eq!(store.get().unwrap().as_deref(), Some("abc"));
    }
}
