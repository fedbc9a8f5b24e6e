//! Persistent key/value stores backing the offline mode.
//!
//! An offline store keeps complete copies of corpus resources, keyed by resource
//! name, so that a reader can work without the live store. Absence of an offline
//! store is legal: loads then always go to the live store.

use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

use ahash::AHashMap;
use bytes::Bytes;
use folio_io::{FileWriter, SealingWrite};

use crate::verify_resource_name;

/// A persistent byte-buffer store keyed by resource name.
pub trait OfflineStore: Send + Sync + 'static {
    /// Returns the stored copy of `name`, or `None` if it was never stored.
    fn get(&self, name: &str) -> std::io::Result<Option<Bytes>>;

    /// Stores a complete copy of `name`, replacing any previous one.
    fn put(&self, name: &str, data: Bytes) -> std::io::Result<()>;

    /// Whether a copy of `name` is stored.
    fn contains(&self, name: &str) -> std::io::Result<bool> {
        Ok(self.info(name)?.is_some())
    }

    /// Returns the size of the stored copy of `name`, if present.
    fn info(&self, name: &str) -> std::io::Result<Option<u64>> {
        Ok(self.get(name)?.map(|data| data.len() as u64))
    }
}

/// Offline store kept in process memory.
#[derive(Default)]
pub struct MemoryOfflineStore {
    entries: RwLock<AHashMap<String, Bytes>>,
}

impl MemoryOfflineStore {
    pub fn new() -> MemoryOfflineStore {
        Default::default()
    }
}

impl OfflineStore for MemoryOfflineStore {
    fn get(&self, name: &str) -> std::io::Result<Option<Bytes>> {
        Ok(self.entries.read().expect("read lock").get(name).cloned())
    }

    fn put(&self, name: &str, data: Bytes) -> std::io::Result<()> {
        verify_resource_name(name)?;
        self.entries
            .write()
            .expect("write lock")
            .insert(name.to_string(), data);
        Ok(())
    }
}

/// Offline store persisting each resource as a file under a root directory.
///
/// Writes go to a `.partial` sibling that is renamed into place after sealing,
/// so a reader never observes a half-written copy.
pub struct DirOfflineStore {
    root: PathBuf,
}

impl DirOfflineStore {
    /// Opens (creating if needed) an offline store rooted at `root`.
    pub fn new(root: &Path) -> std::io::Result<DirOfflineStore> {
        std::fs::create_dir_all(root)?;
        Ok(DirOfflineStore {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn name_to_path(&self, name: &str) -> std::io::Result<PathBuf> {
        verify_resource_name(name)?;
        Ok(name
            .split('/')
            .fold(self.root.clone(), |path, part| path.join(part)))
    }
}

impl OfflineStore for DirOfflineStore {
    fn get(&self, name: &str) -> std::io::Result<Option<Bytes>> {
        let path = self.name_to_path(name)?;
        match std::fs::read(&path) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put(&self, name: &str, data: Bytes) -> std::io::Result<()> {
        let path = self.name_to_path(name)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut partial = path.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        let mut writer = FileWriter::create(&partial)?;
        writer.write_all(&data)?;
        writer.seal()?;
        std::fs::rename(&partial, &path)
    }

    fn info(&self, name: &str) -> std::io::Result<Option<u64>> {
        let path = self.name_to_path(name)?;
        match std::fs::metadata(&path) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tempfile::TempDir;

    use super::{DirOfflineStore, MemoryOfflineStore, OfflineStore};

    #[test]
    fn test_memory_offline_store() {
        let store = MemoryOfflineStore::new();
        assert!(store.get("pages.idx").unwrap().is_none());
        store
            .put("pages.idx", Bytes::from_static(b"PGIX"))
            .unwrap();
        assert_eq!(store.get("pages.idx").unwrap().unwrap().as_ref(), b"PGIX");
        assert_eq!(store.info("pages.idx").unwrap(), Some(4));
        assert!(store.contains("pages.idx").unwrap());
        assert!(!store.contains("books.bin").unwrap());
        assert!(store.put("../x", Bytes::new()).is_err());
    }

    #[test]
    fn test_dir_offline_store() {
        let dir = TempDir::new().unwrap();
        let store = DirOfflineStore::new(&dir.path().join("offline")).unwrap();
        assert!(store.get("postings.bin").unwrap().is_none());
        assert_eq!(store.info("postings.bin").unwrap(), None);

        store
            .put("postings.bin", Bytes::from_static(b"PSTB0000"))
            .unwrap();
        store
            .put("fiqh/words.dict", Bytes::from_static(b"WDIX"))
            .unwrap();
        assert_eq!(
            store.get("postings.bin").unwrap().unwrap().as_ref(),
            b"PSTB0000"
        );
        assert_eq!(store.info("postings.bin").unwrap(), Some(8));
        assert_eq!(store.info("fiqh/words.dict").unwrap(), Some(4));
        assert!(store.contains("fiqh/words.dict").unwrap());
        assert!(!store.root().join("postings.bin.partial").exists());

        // A second store over the same directory sees the persisted copies.
        let reopened = DirOfflineStore::new(store.root()).unwrap();
        assert_eq!(
            reopened.get("fiqh/words.dict").unwrap().unwrap().as_ref(),
            b"WDIX"
        );
    }
}
