//! *Object Store* abstraction for corpus resources: a "storage service" client
//! able to open a reader for a named corpus file, an optional offline key/value
//! store, and the [`ResourceLoader`] that binds both into the single capability
//! consumed by the query layer.

pub mod loader;
pub mod local_store;
pub mod memory_store;
pub mod null_store;
pub mod offline;

use std::sync::Arc;

use bytes::Bytes;
use folio_io::ReadAt;

pub use loader::ResourceLoader;
pub use offline::OfflineStore;

/// The `ObjectStore` trait represents a "storage service" holding the files of
/// one corpus, each addressed by a relative resource name such as `pages.idx`.
pub trait ObjectStore: Send + Sync + 'static {
    /// Opens a reader for an existing resource.
    fn open(&self, name: &str) -> std::io::Result<Arc<dyn ReadAt>>;
}

/// Byte access to named corpus resources.
///
/// This is the only way the query layer obtains bytes. Implementations decide
/// where the bytes come from (live store, offline copy, memo) and whether
/// concurrent identical requests are coalesced.
pub trait ResourceAccess: Send + Sync {
    /// Returns the full contents of the named resource.
    fn load_whole(&self, name: &str) -> folio_common::Result<Bytes>;

    /// Returns exactly `len` bytes of the named resource starting at `start`.
    ///
    /// # Errors
    ///
    /// A resource error if the underlying store fails or holds fewer than
    /// `start + len` bytes.
    fn load_range(&self, name: &str, start: u64, len: u64) -> folio_common::Result<Bytes>;
}

impl<T> ResourceAccess for Arc<T>
where
    T: ResourceAccess + ?Sized,
{
    fn load_whole(&self, name: &str) -> folio_common::Result<Bytes> {
        self.as_ref().load_whole(name)
    }

    fn load_range(&self, name: &str, start: u64, len: u64) -> folio_common::Result<Bytes> {
        self.as_ref().load_range(name, start, len)
    }
}

/// Checks that a resource name is a clean relative path: non-empty, `/`-separated,
/// without empty, `.` or `..` components and without backslashes or drive prefixes.
pub fn verify_resource_name(name: &str) -> std::io::Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('/')
        && !name.contains('\\')
        && !name.contains(':')
        && name
            .split('/')
            .all(|part| !part.is_empty() && part != "." && part != "..");
    if valid {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid resource name '{name}'"),
        ))
    }
}
