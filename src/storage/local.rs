//! Directory-backed object store

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::{ObjectStore, key_path};
use crate::error::{self, Result};

/// Objects are plain files below `root`
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join(key_path(key)?))
    }
}

impl ObjectStore for LocalStore {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(key)?;
        if !path.is_file() {
            return Err(error::storage::not_found(key));
        }
        std::fs::read(&path).map_err(|e| error::storage::get_failed(key, e.to_string()))
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| error::storage::put_failed(key, e.to_string()))?;
        }

        // Write beside the target and rename so readers never see a partial object
        let tmp = partial_path(&path);
        std::fs::write(&tmp, data).map_err(|e| error::storage::put_failed(key, e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| error::storage::put_failed(key, e.to_string()))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.object_path(key)?.is_file())
    }

    fn location(&self, key: &str) -> String {
        self.object_path(key)
            .unwrap_or_else(|_| self.root.join(key))
            .display()
            .to_string()
    }
}

/// `<name>.partial` next to `path`, keeping the full file name
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
