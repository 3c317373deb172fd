//! BLAKE3 hashing utilities for asset integrity

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use blake3::Hasher;
use walkdir::WalkDir;

use crate::error::{RunnerError, Result};

/// Hash prefix for BLAKE3 hashes
pub const HASH_PREFIX: &str = "blake3:";

/// Files ignored when hashing an extracted asset tree
const TREE_EXCLUDES: &[&str] = &[crate::provision::STAMP_FILE];

/// Format a finished hasher as a prefixed digest
pub fn format_digest(hasher: &Hasher) -> String {
    format!("{}{}", HASH_PREFIX, hasher.finalize().to_hex())
}

/// Normalize a digest string to `blake3:<lowercase hex>`
///
/// Accepts the digest with or without prefix. Returns `None` unless the hex
/// part is exactly 64 hex characters.
pub fn parse_digest(digest: &str) -> Option<String> {
    let hex = digest.trim().strip_prefix(HASH_PREFIX).unwrap_or(digest.trim());
    if hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("{}{}", HASH_PREFIX, hex.to_ascii_lowercase()))
    } else {
        None
    }
}

fn update_from_file(hasher: &mut Hasher, path: &Path) -> Result<()> {
    let file = File::open(path).map_err(|e| RunnerError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut reader = BufReader::new(file);
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| RunnerError::FileReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(())
}

/// Calculate BLAKE3 hash of a file
pub fn hash_file(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    update_from_file(&mut hasher, path)?;
    Ok(format_digest(&hasher))
}

/// Calculate BLAKE3 hash of a directory's contents
///
/// This hashes all files in the directory recursively, sorted by path
/// for deterministic results. Excludes the provisioning stamp.
pub fn hash_directory(path: &Path) -> Result<String> {
    if !path.is_dir() {
        return Err(RunnerError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut hasher = Hasher::new();
    let mut files: Vec<_> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            !TREE_EXCLUDES.contains(&name.as_ref())
        })
        .collect();

    // Sort for deterministic hashing
    files.sort_by_key(|e| e.path().to_path_buf());

    for entry in files {
        let file_path = entry.path();

        // Forward slashes so the digest is the same on every platform
        let relative_path = file_path
            .strip_prefix(path)
            .unwrap_or(file_path)
            .to_string_lossy()
            .replace('\\', "/");
        hasher.update(relative_path.as_bytes());
        hasher.update(b"\0");

        update_from_file(&mut hasher, file_path)?;

        hasher.update(b"\0");
    }

    Ok(format_digest(&hasher))
}

/// Verify a hash matches the expected value
pub fn verify_hash(expected: &str, actual: &str) -> bool {
    match (parse_digest(expected), parse_digest(actual)) {
        (Some(expected), Some(actual)) => expected == actual,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hash_file() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("test.txt");
        std::fs::write(&file_path, "test content").unwrap();

        let hash = hash_file(&file_path).unwrap();
        assert!(hash.starts_with(HASH_PREFIX));
        assert_eq!(
            hash,
            format!("{}{}", HASH_PREFIX, blake3::hash(b"test content").to_hex())
        );
    }

    #[test]
    fn test_hash_file_not_found() {
        let result = hash_file(Path::new("/nonexistent/file.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn test_hash_directory_deterministic() {
        let temp = TempDir::new().unwrap();

        std::fs::write(temp.path().join("a.txt"), "aaa").unwrap();
        std::fs::create_dir(temp.path().join("subdir")).unwrap();
        std::fs::write(temp.path().join("subdir/b.txt"), "bbb").unwrap();

        let hash1 = hash_directory(temp.path()).unwrap();
        let hash2 = hash_directory(temp.path()).unwrap();
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_directory_detects_content_change() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("model.onnx"), "weights-v1").unwrap();
        let before = hash_directory(temp.path()).unwrap();

        std::fs::write(temp.path().join("model.onnx"), "weights-v2").unwrap();
        let after = hash_directory(temp.path()).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn test_hash_directory_excludes_stamp() {
        let temp = TempDir::new().unwrap();

        std::fs::write(temp.path().join("file.txt"), "content").unwrap();
        let hash1 = hash_directory(temp.path()).unwrap();

        std::fs::write(temp.path().join(crate::provision::STAMP_FILE), "{}").unwrap();
        let hash2 = hash_directory(temp.path()).unwrap();

        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_directory_requires_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(hash_directory(&file).is_err());
    }

    #[test]
    fn test_parse_digest() {
        let hex = "A".repeat(64);
        assert_eq!(
            parse_digest(&hex),
            Some(format!("{}{}", HASH_PREFIX, "a".repeat(64)))
        );
        assert_eq!(
            parse_digest(&format!("{HASH_PREFIX}{hex}")),
            Some(format!("{}{}", HASH_PREFIX, "a".repeat(64)))
        );
        assert_eq!(parse_digest("blake3:abc"), None);
        assert_eq!(parse_digest(&"g".repeat(64)), None);
    }

    #[test]
    fn test_verify_hash() {
        let hash1 = format!("{}{}", HASH_PREFIX, "ab".repeat(32));
        assert!(verify_hash(&hash1, &hash1.clone()));

        // With and without prefix, any case
        assert!(verify_hash(&hash1, &"AB".repeat(32)));

        let hash3 = format!("{}{}", HASH_PREFIX, "cd".repeat(32));
        assert!(!verify_hash(&hash1, &hash3));
        assert!(!verify_hash("garbage", "garbage"));
    }
}
