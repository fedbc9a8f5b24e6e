//! "null" object store: a store that holds nothing.

use std::sync::Arc;

use folio_io::ReadAt;

use crate::ObjectStore;

/// An `ObjectStore` with no resources; every `open` fails with `NotFound`.
///
/// Paired with an offline store it yields a loader that can only serve
/// previously downloaded resources.
pub struct NullObjectStore;

impl ObjectStore for NullObjectStore {
    fn open(&self, name: &str) -> std::io::Result<Arc<dyn ReadAt>> {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("'{name}' is not available without a live store"),
        ))
    }
}
