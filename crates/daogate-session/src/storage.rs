//! Persistence backends for the credential store.
//!
//! The browser build keeps credentials in local storage; everything else
//! plugs in through [`CredentialStorage`]. Two entries exist, both plain
//! strings, and absence of either is a valid "no session" state.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use daogate_protocol::{Codec, JsonCodec};

use crate::SessionError;

/// The persisted entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// The session token.
    Token,
    /// The address the token is bound to.
    Address,
}

impl StorageKey {
    /// The key name used by the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Token => "daogate.session.token",
            Self::Address => "daogate.session.address",
        }
    }
}

/// A string key/value store that survives reloads.
pub trait CredentialStorage: Send + Sync + 'static {
    /// Reads an entry. `Ok(None)` means the entry doesn't exist.
    fn read(&self, key: StorageKey) -> Result<Option<String>, SessionError>;

    /// Writes an entry. `None` removes it.
    fn write(&self, key: StorageKey, value: Option<&str>) -> Result<(), SessionError>;
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Keeps entries in process memory. Useful for tests and for hosts that
/// must not persist credentials at all.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage pre-populated with entries, as if left behind by
    /// a previous page load.
    pub fn with_entries(entries: impl IntoIterator<Item = (StorageKey, String)>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }
}

impl CredentialStorage for MemoryStorage {
    fn read(&self, key: StorageKey) -> Result<Option<String>, SessionError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(&key).cloned())
    }

    fn write(&self, key: StorageKey, value: Option<&str>) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match value {
            Some(v) => entries.insert(key, v.to_string()),
            None => entries.remove(&key),
        };
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonFileStorage
// ---------------------------------------------------------------------------

/// Keeps entries in a single JSON object on disk, keyed by
/// [`StorageKey::as_str`].
///
/// Every write rewrites the whole file. A missing file reads as empty.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(JsonCodec.decode(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(SessionError::Storage(e)),
        }
    }
}

impl CredentialStorage for JsonFileStorage {
    fn read(&self, key: StorageKey) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.remove(key.as_str()))
    }

    fn write(&self, key: StorageKey, value: Option<&str>) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        match value {
            Some(v) => entries.insert(key.as_str().to_string(), v.to_string()),
            None => entries.remove(key.as_str()),
        };
        let bytes = JsonCodec.encode(&entries)?;
        std::fs::write(&self.path, bytes).map_err(SessionError::Storage)
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    fn temp_path() -> PathBuf {
        let suffix: u64 = rand::rng().random();
        std::env::temp_dir().join(format!("daogate-storage-{suffix:016x}.json"))
    }

    #[test]
    fn test_memory_write_then_read_returns_value() {
        let storage = MemoryStorage::new();

        storage.write(StorageKey::Token, Some("abc")).unwrap();

        assert_eq!(storage.read(StorageKey::Token).unwrap().as_deref(), Some("abc"));
        assert_eq!(storage.read(StorageKey::Address).unwrap(), None);
    }

    #[test]
    fn test_memory_write_none_removes_entry() {
        let storage = MemoryStorage::with_entries([(StorageKey::Token, "abc".to_string())]);

        storage.write(StorageKey::Token, None).unwrap();

        assert_eq!(storage.read(StorageKey::Token).unwrap(), None);
    }

    #[test]
    fn test_file_missing_reads_as_empty() {
        let storage = JsonFileStorage::new(temp_path());

        assert_eq!(storage.read(StorageKey::Token).unwrap(), None);
    }

    #[test]
    fn test_file_entries_survive_new_instance() {
        let path = temp_path();
        {
            let storage = JsonFileStorage::new(&path);
            storage.write(StorageKey::Token, Some("tok")).unwrap();
            storage.write(StorageKey::Address, Some("0xabc")).unwrap();
            storage.write(StorageKey::Address, None).unwrap();
        }

        // A fresh instance stands in for a page reload.
        let reloaded = JsonFileStorage::new(&path);
        assert_eq!(reloaded.read(StorageKey::Token).unwrap().as_deref(), Some("tok"));
        assert_eq!(reloaded.read(StorageKey::Address).unwrap(), None);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_file_corrupt_contents_return_corrupt_error() {
        let path = temp_path();
        std::fs::write(&path, b"not json").unwrap();
        let storage = JsonFileStorage::new(&path);

        let result = storage.read(StorageKey::Token);

        assert!(matches!(result, Err(SessionError::Corrupt(_))));
        let _ = std::fs::remove_file(path);
    }
}
