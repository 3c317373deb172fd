//! Object storage for analysis results
//!
//! A small key/value interface over either a local directory or an HTTP
//! bucket. Keys are `/`-separated relative paths; anything that would
//! escape the store root is rejected before any I/O happens.

mod http;
mod local;

use std::path::PathBuf;

use crate::config::{StorageBackend, StorageSettings};
use crate::error::{self, Result, RunnerError};
use crate::path_utils;

pub use http::HttpStore;
pub use local::LocalStore;

/// Minimal object store operations
pub trait ObjectStore: Send + Sync {
    /// Fetch the object stored under `key`
    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Store `data` under `key`, replacing any existing object
    fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    fn exists(&self, key: &str) -> Result<bool>;

    /// Where objects go, for log messages
    fn location(&self, key: &str) -> String;
}

/// Build the store configured in `settings`
pub fn from_settings(settings: &StorageSettings) -> Result<Box<dyn ObjectStore>> {
    match settings.backend {
        StorageBackend::None => Err(RunnerError::StorageNotConfigured),
        StorageBackend::Local => {
            let root = settings
                .root
                .clone()
                .ok_or(RunnerError::StorageNotConfigured)?;
            Ok(Box::new(LocalStore::new(root)))
        }
        StorageBackend::Http => {
            let base_url = settings
                .base_url
                .clone()
                .ok_or(RunnerError::StorageNotConfigured)?;
            let token = settings.token_env.as_deref().and_then(|var| {
                let token = std::env::var(var).ok().filter(|t| !t.trim().is_empty());
                if token.is_none() {
                    tracing::warn!(var = %var, "Storage token variable is unset; sending requests without a token");
                }
                token
            });
            Ok(Box::new(HttpStore::new(base_url, token)))
        }
    }
}

/// Check a key and turn it into a relative path
fn key_path(key: &str) -> Result<PathBuf> {
    path_utils::safe_relative_path(key).ok_or_else(|| error::storage::invalid_key(key))
}

/// Canonical `/`-separated form of a valid key
fn normalize_key(key: &str) -> Result<String> {
    key_path(key).map(|p| path_utils::to_forward_slashes(&p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("results/a.csv").unwrap(), "results/a.csv");
        assert_eq!(normalize_key("./results//a.csv").unwrap(), "results/a.csv");
        assert!(normalize_key("../escape.csv").is_err());
        assert!(normalize_key("/etc/passwd").is_err());
        assert!(normalize_key("").is_err());
    }

    #[test]
    fn test_from_settings_none_is_not_configured() {
        let settings = StorageSettings::default();
        assert!(matches!(
            from_settings(&settings),
            Err(RunnerError::StorageNotConfigured)
        ));
    }

    #[test]
    fn test_from_settings_local() {
        let temp = tempfile::TempDir::new().unwrap();
        let settings = StorageSettings {
            backend: StorageBackend::Local,
            root: Some(temp.path().to_path_buf()),
            ..StorageSettings::default()
        };
        let store = from_settings(&settings).unwrap();
        store.put("a/b.txt", b"hi").unwrap();
        assert_eq!(store.get("a/b.txt").unwrap(), b"hi");
    }

    #[test]
    fn test_from_settings_http_without_url() {
        let settings = StorageSettings {
            backend: StorageBackend::Http,
            base_url: None,
            root: Some(PathBuf::from("ignored")),
            ..StorageSettings::default()
        };
        assert!(from_settings(&settings).is_err());
    }
}
