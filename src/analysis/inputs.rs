//! Input discovery

use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use wax::{CandidatePath, Glob, Pattern};

use crate::error::{self, Result};
use crate::path_utils;

/// Files to analyze under `input`
///
/// A file is returned as is. A directory is walked recursively; files whose
/// path relative to it matches one of `include` are kept, results
/// directories are skipped. The result is sorted.
pub fn collect_inputs(input: &Path, include: &[String], results_dir_name: &str) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(error::fs::not_found(input.display().to_string()));
    }

    let globs = include
        .iter()
        .map(|pattern| {
            Glob::new(pattern).map_err(|e| {
                error::config::invalid(format!("invalid analysis.include glob '{pattern}': {e}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && entry.file_name() == results_dir_name))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let relative = entry.path().strip_prefix(input).unwrap_or(entry.path());
            let normalized = path_utils::to_forward_slashes(relative);
            let candidate = CandidatePath::from(normalized.as_str());
            globs.iter().any(|glob| glob.matched(&candidate).is_some())
        })
        .map(walkdir::DirEntry::into_path)
        .collect();

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    fn default_include() -> Vec<String> {
        vec!["**/*.{wav,WAV,flac,mp3,ogg}".to_string()]
    }

    #[test]
    fn test_single_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("notes.txt");
        touch(&file);
        // An explicit file is analyzed whatever its extension
        assert_eq!(
            collect_inputs(&file, &default_include(), "SNOWMOBILE_RESULTS").unwrap(),
            vec![file]
        );
    }

    #[test]
    fn test_walks_directory_and_filters() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("a.wav"));
        touch(&temp.path().join("site/b.flac"));
        touch(&temp.path().join("site/deeper/c.WAV"));
        touch(&temp.path().join("site/readme.txt"));
        touch(&temp.path().join("site/SNOWMOBILE_RESULTS/old.wav"));

        let files = collect_inputs(temp.path(), &default_include(), "SNOWMOBILE_RESULTS").unwrap();
        let relative: Vec<String> = files
            .iter()
            .map(|f| path_utils::to_forward_slashes(f.strip_prefix(temp.path()).unwrap()))
            .collect();

        assert_eq!(relative, vec!["a.wav", "site/b.flac", "site/deeper/c.WAV"]);
    }

    #[test]
    fn test_missing_input() {
        let temp = TempDir::new().unwrap();
        let err = collect_inputs(&temp.path().join("nope"), &default_include(), "R").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_invalid_glob() {
        let temp = TempDir::new().unwrap();
        assert!(collect_inputs(temp.path(), &["**/[".to_string()], "R").is_err());
    }
}
