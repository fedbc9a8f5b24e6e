use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use folio_common::error::Error;
use folio_io::{FileReader, ReadAt};

use crate::{ObjectStore, verify_resource_name};

/// An `ObjectStore` serving the files of a corpus directory on the local filesystem.
///
/// Resource names are resolved relative to the container directory and may not
/// escape it.
pub struct LocalFsObjectStore {
    /// The top-level directory holding the corpus files.
    container_path: PathBuf,
}

impl LocalFsObjectStore {
    /// Creates a new `LocalFsObjectStore` over an existing directory.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error if `container_path` is not a directory.
    pub fn new(container_path: &Path) -> folio_common::Result<LocalFsObjectStore> {
        if !container_path.is_dir() {
            return Err(Error::invalid_arg(
                "container",
                format!("{container_path:?} is not a directory"),
            ));
        }
        Ok(LocalFsObjectStore {
            container_path: container_path.to_path_buf(),
        })
    }

    /// Returns the file system path of the store's top-level container.
    pub fn container_path(&self) -> &Path {
        &self.container_path
    }

    /// Converts a resource name to a path inside the container.
    pub fn name_to_path(&self, name: &str) -> std::io::Result<PathBuf> {
        verify_resource_name(name)?;
        Ok(name
            .split('/')
            .fold(self.container_path.clone(), |path, part| path.join(part)))
    }
}

impl ObjectStore for LocalFsObjectStore {
    /// Opens a corpus file for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or if the file cannot be opened.
    fn open(&self, name: &str) -> std::io::Result<Arc<dyn ReadAt>> {
        let path = self.name_to_path(name)?;
        log::trace!("opening {}", path.display());
        Ok(Arc::new(FileReader::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::ObjectStore;

    use super::LocalFsObjectStore;

    #[test]
    fn test_local_fs_open() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("books.bin"), b"BKSB\x01\x00\x00\x00").unwrap();
        std::fs::create_dir(dir.path().join("tafsir")).unwrap();
        std::fs::write(dir.path().join("tafsir").join("words.dict"), b"WDIX").unwrap();

        let fs = LocalFsObjectStore::new(dir.path()).unwrap();
        let reader = fs.open("books.bin").unwrap();
        assert_eq!(reader.size().unwrap(), 8);
        assert_eq!(reader.read_at(0..4).unwrap().as_ref(), b"BKSB");

        let reader = fs.open("tafsir/words.dict").unwrap();
        assert_eq!(reader.read_at(0..4).unwrap().as_ref(), b"WDIX");
    }

    #[test]
    fn test_local_fs_rejects_escapes() {
        let dir = TempDir::new().unwrap();
        let inner = dir.path().join("corpus");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(dir.path().join("secret.bin"), b"secret").unwrap();

        let fs = LocalFsObjectStore::new(&inner).unwrap();
        assert!(fs.open("../secret.bin").is_err());
        assert!(fs.open("/secret.bin").is_err());
        assert_eq!(
            fs.open("missing.bin").err().unwrap().kind(),
            std::io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_local_fs_requires_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("pages.idx");
        std::fs::write(&file, b"PGIX").unwrap();
        assert!(LocalFsObjectStore::new(&file).is_err());
        assert!(LocalFsObjectStore::new(&dir.path().join("nope")).is_err());
    }
}
