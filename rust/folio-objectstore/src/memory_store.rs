//! In-memory object store, used for embedding prebuilt corpora and in tests.

use std::sync::{Arc, RwLock};

use ahash::AHashMap;
use bytes::Bytes;
use folio_io::ReadAt;

use crate::{ObjectStore, verify_resource_name};

/// An `ObjectStore` holding named immutable buffers.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<AHashMap<String, Bytes>>,
}

impl MemoryObjectStore {
    pub fn new() -> MemoryObjectStore {
        Default::default()
    }

    /// Adds or replaces a resource.
    pub fn insert(&self, name: impl Into<String>, data: impl Into<Bytes>) {
        self.objects
            .write()
            .expect("write lock")
            .insert(name.into(), data.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.read().expect("read lock").contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.objects.read().expect("read lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryObjectStore {
    fn open(&self, name: &str) -> std::io::Result<Arc<dyn ReadAt>> {
        verify_resource_name(name)?;
        let data = self
            .objects
            .read()
            .expect("read lock")
            .get(name)
            .cloned()
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, format!("'{name}' not found"))
            })?;
        Ok(Arc::new(data))
    }
}

#[cfg(test)]
mod tests {
    use crate::ObjectStore;

    use super::MemoryObjectStore;

    #[test]
    fn test_memory_store() {
        let store = MemoryObjectStore::new();
        assert!(store.is_empty());
        store.insert("titles.bin", b"TTLB".to_vec());
        assert!(store.contains("titles.bin"));
        assert_eq!(store.len(), 1);

        let reader = store.open("titles.bin").unwrap();
        assert_eq!(reader.read_at(0..4).unwrap().as_ref(), b"TTLB");
        assert_eq!(
            store.open("books.bin").err().unwrap().kind(),
            std::io::ErrorKind::NotFound
        );
    }
}
