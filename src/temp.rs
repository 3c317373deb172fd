//! Temporary directory base for downloads, never under the working directory
//! (e.g. when TMPDIR=tmp or TMPDIR=./tmp inside the application root).

use std::env;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::error::{self, Result};

/// Returns a directory path suitable for creating temporary directories.
/// Never returns a relative path, so a download never lands inside the
/// application root that is later put on the search path.
pub fn temp_dir_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        #[cfg(windows)]
        {
            env::var("TEMP")
                .or_else(|_| env::var("TMP"))
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
        }
        #[cfg(not(windows))]
        {
            PathBuf::from("/tmp")
        }
    }
}

/// Create a fresh scratch directory for one download
pub fn download_scratch_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("audioclip-download-")
        .tempdir_in(temp_dir_base())
        .map_err(|e| error::fs::io_error(format!("Failed to create download directory: {e}")))
}
