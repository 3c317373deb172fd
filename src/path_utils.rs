//! Cross-platform path utilities
//!
//! Archive entry names and object-store keys are always `/`-separated,
//! whatever the host platform. These helpers convert between them and local
//! paths and refuse anything that would leave its root.

use std::path::{Component, Path, PathBuf};

/// Convert path to use forward slashes
///
/// # Examples
///
/// ```ignore
/// let path = Path::new("C:\\Users\\file.txt");
/// assert_eq!(to_forward_slashes(path), "C:/Users/file.txt");
/// ```
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Turn an archive entry name or object key into a relative path that stays
/// inside its root.
///
/// Leading `./` segments are dropped. Returns `None` for absolute paths,
/// drive prefixes, `..` segments, and names that reduce to nothing.
pub fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    if normalized.starts_with('/') {
        return None;
    }

    let mut out = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Join a key prefix and a relative path into an object key
///
/// Empty segments are collapsed so `results/` + `a/b.csv` gives `results/a/b.csv`.
pub fn object_key(prefix: &str, relative: &Path) -> String {
    let relative = to_forward_slashes(relative);
    prefix
        .split('/')
        .chain(relative.split('/'))
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}
