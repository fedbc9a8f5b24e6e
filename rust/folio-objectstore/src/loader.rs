//! The resource loader: single-flight, memoized access to corpus resources with an
//! optional offline store in front of the live [`ObjectStore`].
//!
//! Whole-resource loads are deduplicated through an in-flight registry: the first
//! caller for a name installs a shared [`OnceLock`] slot and performs the fetch,
//! concurrent callers for the same name park on that slot and receive the same
//! outcome. Successful outcomes stay in the registry until [`ResourceLoader::clear`];
//! failed ones are evicted once observed so that a later call fetches again.
//!
//! Range loads are never memoized. They are served from an already memoized whole
//! buffer when one exists, then from the offline store, then from the live store.

use std::sync::{Arc, Mutex, OnceLock, RwLock};

use ahash::AHashMap;
use bytes::Bytes;
use folio_common::{Result, error::Error};
use folio_io::ReadAt;

use crate::{ObjectStore, ResourceAccess, offline::OfflineStore};

type LoadOutcome = std::result::Result<Bytes, Arc<std::io::Error>>;
type LoadSlot = Arc<OnceLock<LoadOutcome>>;

/// Presence of one resource in the offline store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineInfo {
    pub name: String,
    /// Size of the stored copy, `None` when the resource is not stored offline.
    pub size: Option<u64>,
}

pub struct ResourceLoader {
    /// The live store.
    store: Arc<dyn ObjectStore>,
    /// Consulted before the live store when present.
    offline: Option<Arc<dyn OfflineStore>>,
    /// Whole-resource registry, in-flight and completed.
    whole: Mutex<AHashMap<String, LoadSlot>>,
    /// Opened live readers by resource name.
    readers: RwLock<AHashMap<String, Arc<dyn ReadAt>>>,
}

impl ResourceLoader {
    /// Creates a loader over a live store, without offline support.
    pub fn new(store: Arc<dyn ObjectStore>) -> ResourceLoader {
        ResourceLoader {
            store,
            offline: None,
            whole: Default::default(),
            readers: Default::default(),
        }
    }

    /// Creates a loader that consults `offline` before the live store.
    pub fn with_offline(
        store: Arc<dyn ObjectStore>,
        offline: Arc<dyn OfflineStore>,
    ) -> ResourceLoader {
        ResourceLoader {
            offline: Some(offline),
            ..ResourceLoader::new(store)
        }
    }

    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn offline_store(&self) -> Option<&Arc<dyn OfflineStore>> {
        self.offline.as_ref()
    }

    /// Returns the full contents of `name`, fetching it at most once per process
    /// (or per [`clear`](Self::clear)) regardless of the number of concurrent callers.
    ///
    /// # Errors
    ///
    /// A resource error wrapping the failure of the underlying fetch. Every caller
    /// waiting on the same in-flight fetch receives the same failure.
    pub fn load_whole(&self, name: &str) -> Result<Bytes> {
        let slot = {
            let mut slots = self.whole.lock().expect("lock");
            slots.entry(name.to_string()).or_default().clone()
        };
        let outcome = slot.get_or_init(|| self.fetch_whole(name)).clone();
        outcome.map_err(|e| {
            self.evict_failed(name, &slot);
            Error::resource(name, e)
        })
    }

    /// Returns exactly `len` bytes of `name` starting at `start`.
    pub fn load_range(&self, name: &str, start: u64, len: u64) -> Result<Bytes> {
        let end = start.checked_add(len).ok_or_else(|| {
            Error::invalid_arg("len", format!("range {start}+{len} overflows"))
        })?;

        if let Some(data) = self.memoized(name) {
            return slice_exact(name, &data, start, end);
        }

        if let Some(data) = self.get_offline(name) {
            return slice_exact(name, &data, start, end);
        }

        log::trace!("range fetch '{name}' {start}..{end}");
        let reader = self
            .open_reader(name)
            .map_err(|e| Error::resource(name, e))?;
        reader
            .read_exact_at(start..end)
            .map_err(|e| Error::resource(name, e))
    }

    /// Drops every memoized buffer and opened reader. In-flight loads complete
    /// normally for their current waiters.
    pub fn clear(&self) {
        let dropped = {
            let mut slots = self.whole.lock().expect("lock");
            let count = slots.len();
            slots.clear();
            count
        };
        self.readers.write().expect("write lock").clear();
        log::debug!("resource cache cleared ({dropped} entries)");
    }

    /// Number of resources currently memoized with a successful outcome.
    pub fn cached_count(&self) -> usize {
        self.whole
            .lock()
            .expect("lock")
            .values()
            .filter(|slot| matches!(slot.get(), Some(Ok(_))))
            .count()
    }

    /// Copies the named resources from the live store into the offline store.
    ///
    /// # Errors
    ///
    /// An invalid operation error when the loader has no offline store; otherwise the
    /// first resource or I/O error encountered. Resources copied before the failure
    /// remain stored.
    pub fn download(&self, names: &[&str]) -> Result<Vec<OfflineInfo>> {
        let offline = self
            .offline
            .as_ref()
            .ok_or_else(|| Error::invalid_operation("download without an offline store"))?;
        let mut infos = Vec::with_capacity(names.len());
        for &name in names {
            let data = self
                .fetch_live(name)
                .map_err(|e| Error::resource(name, e))?;
            let size = data.len() as u64;
            offline
                .put(name, data)
                .map_err(|e| Error::io(format!("offline put '{name}'"), e))?;
            log::debug!("downloaded '{name}' ({size} bytes)");
            infos.push(OfflineInfo {
                name: name.to_string(),
                size: Some(size),
            });
        }
        Ok(infos)
    }

    /// Reports which of the named resources are available offline.
    pub fn offline_info(&self, names: &[&str]) -> Result<Vec<OfflineInfo>> {
        names
            .iter()
            .map(|&name| {
                let size = match &self.offline {
                    Some(offline) => offline
                        .info(name)
                        .map_err(|e| Error::io(format!("offline info '{name}'"), e))?,
                    None => None,
                };
                Ok(OfflineInfo {
                    name: name.to_string(),
                    size,
                })
            })
            .collect()
    }

    fn fetch_whole(&self, name: &str) -> LoadOutcome {
        if let Some(data) = self.get_offline(name) {
            log::debug!("offline hit for '{name}'");
            return Ok(data);
        }
        log::debug!("fetching '{name}'");
        self.fetch_live(name).map_err(Arc::new)
    }

    fn fetch_live(&self, name: &str) -> std::io::Result<Bytes> {
        self.open_reader(name)?.read_all()
    }

    fn get_offline(&self, name: &str) -> Option<Bytes> {
        let offline = self.offline.as_ref()?;
        match offline.get(name) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("offline read of '{name}' failed, using live store: {e}");
                None
            }
        }
    }

    fn open_reader(&self, name: &str) -> std::io::Result<Arc<dyn ReadAt>> {
        if let Some(reader) = self.readers.read().expect("read lock").get(name) {
            return Ok(reader.clone());
        }
        let reader = self.store.open(name)?;
        self.readers
            .write()
            .expect("write lock")
            .insert(name.to_string(), reader.clone());
        Ok(reader)
    }

    fn memoized(&self, name: &str) -> Option<Bytes> {
        let slots = self.whole.lock().expect("lock");
        match slots.get(name)?.get() {
            Some(Ok(data)) => Some(data.clone()),
            _ => None,
        }
    }

    fn evict_failed(&self, name: &str, slot: &LoadSlot) {
        let mut slots = self.whole.lock().expect("lock");
        if slots
            .get(name)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            slots.remove(name);
        }
    }
}

impl ResourceAccess for ResourceLoader {
    fn load_whole(&self, name: &str) -> Result<Bytes> {
        ResourceLoader::load_whole(self, name)
    }

    fn load_range(&self, name: &str, start: u64, len: u64) -> Result<Bytes> {
        ResourceLoader::load_range(self, name, start, len)
    }
}

fn slice_exact(name: &str, data: &Bytes, start: u64, end: u64) -> Result<Bytes> {
    if end > data.len() as u64 {
        return Err(Error::resource(
            name,
            std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("range {start}..{end} beyond {} bytes", data.len()),
            ),
        ));
    }
    Ok(data.slice(start as usize..end as usize))
}
