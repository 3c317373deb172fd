//! Archive extraction into a staging directory
//!
//! Entries are validated one by one: absolute paths, `..` segments and links
//! are rejected outright rather than skipped, since a bundle containing them
//! is not the bundle that was pinned.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::EntryType;

use crate::config::ArchiveFormat;
use crate::error::{self, Result};
use crate::path_utils::safe_relative_path;

const S_IFMT: u32 = 0o170_000;
const S_IFLNK: u32 = 0o120_000;

/// Resolve `Auto` from the downloaded file name
pub fn detect_format(configured: ArchiveFormat, file_name: &str) -> ArchiveFormat {
    if configured != ArchiveFormat::Auto {
        return configured;
    }

    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".zip") {
        ArchiveFormat::Zip
    } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
        ArchiveFormat::TarGz
    } else if lower.ends_with(".tar") {
        ArchiveFormat::Tar
    } else {
        ArchiveFormat::File
    }
}

/// Unpack `archive` into the empty directory `dest`, returning the number of files written
pub fn extract(archive: &Path, format: ArchiveFormat, file_name: &str, dest: &Path) -> Result<usize> {
    let format = detect_format(format, file_name);
    tracing::debug!(archive = %archive.display(), ?format, "Extracting asset bundle");

    match format {
        ArchiveFormat::Zip => extract_zip(archive, dest),
        ArchiveFormat::TarGz => {
            let file = open(archive)?;
            extract_tar(archive, GzDecoder::new(BufReader::new(file)), dest)
        }
        ArchiveFormat::Tar => {
            let file = open(archive)?;
            extract_tar(archive, BufReader::new(file), dest)
        }
        ArchiveFormat::File | ArchiveFormat::Auto => {
            let name = safe_relative_path(file_name)
                .ok_or_else(|| error::asset::unsafe_entry(file_name))?;
            let target = dest.join(name);
            fs::copy(archive, &target)
                .map_err(|e| error::fs::write_failed(target.display().to_string(), e.to_string()))?;
            Ok(1)
        }
    }
}

fn open(archive: &Path) -> Result<File> {
    File::open(archive)
        .map_err(|e| error::fs::read_failed(archive.display().to_string(), e.to_string()))
}

fn corrupt(archive: &Path, reason: impl ToString) -> crate::error::RunnerError {
    error::asset::archive_corrupt(archive.display().to_string(), reason.to_string())
}

/// Entry names like `./` or `/` that only denote the archive root
fn is_root_entry(name: &str) -> bool {
    name.replace('\\', "/")
        .split('/')
        .all(|segment| segment.is_empty() || segment == ".")
}

/// Map an entry name to its destination, or fail if it would escape `dest`
fn entry_target(dest: &Path, name: &str) -> Result<Option<PathBuf>> {
    if is_root_entry(name) && !name.starts_with('/') {
        return Ok(None);
    }
    safe_relative_path(name)
        .map(|relative| Some(dest.join(relative)))
        .ok_or_else(|| error::asset::unsafe_entry(name))
}

fn create_parent(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| error::fs::write_failed(parent.display().to_string(), e.to_string()))?;
    }
    Ok(())
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<usize> {
    let mut zip = zip::ZipArchive::new(BufReader::new(open(archive)?))
        .map_err(|e| corrupt(archive, e))?;

    let mut files = 0;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| corrupt(archive, e))?;
        let name = entry.name().to_string();
        let Some(target) = entry_target(dest, &name)? else {
            continue;
        };

        if entry
            .unix_mode()
            .is_some_and(|mode| mode & S_IFMT == S_IFLNK)
        {
            return Err(error::asset::unsafe_entry(name));
        }

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| error::fs::write_failed(target.display().to_string(), e.to_string()))?;
            continue;
        }

        create_parent(&target)?;
        let mut out = File::create(&target)
            .map_err(|e| error::fs::write_failed(target.display().to_string(), e.to_string()))?;
        io::copy(&mut entry, &mut out).map_err(|e| corrupt(archive, format!("{name}: {e}")))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode().filter(|m| m & 0o777 != 0) {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o777)).map_err(
                |e| error::fs::write_failed(target.display().to_string(), e.to_string()),
            )?;
        }

        files += 1;
    }

    Ok(files)
}

fn extract_tar(archive: &Path, reader: impl Read, dest: &Path) -> Result<usize> {
    let mut tar = tar::Archive::new(reader);
    tar.set_preserve_permissions(true);

    let mut files = 0;
    for entry in tar.entries().map_err(|e| corrupt(archive, e))? {
        let mut entry = entry.map_err(|e| corrupt(archive, e))?;
        let name = entry
            .path()
            .map_err(|e| corrupt(archive, e))?
            .to_string_lossy()
            .into_owned();
        let Some(target) = entry_target(dest, &name)? else {
            continue;
        };

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&target).map_err(|e| {
                    error::fs::write_failed(target.display().to_string(), e.to_string())
                })?;
            }
            EntryType::Regular | EntryType::Continuous => {
                create_parent(&target)?;
                entry
                    .unpack(&target)
                    .map_err(|e| corrupt(archive, format!("{name}: {e}")))?;
                files += 1;
            }
            EntryType::Symlink | EntryType::Link => {
                return Err(error::asset::unsafe_entry(name));
            }
            other => {
                tracing::debug!(entry = %name, kind = ?other, "Skipping special archive entry");
            }
        }
    }

    Ok(files)
}

/// Fail unless every expected entry exists below `dir`
pub fn check_layout(dir: &Path, expected: &[String]) -> Result<()> {
    for entry in expected {
        let present = safe_relative_path(entry)
            .map(|relative| dir.join(relative).exists())
            .unwrap_or(false);
        if !present {
            return Err(error::asset::missing_entry(entry.clone()));
        }
    }
    Ok(())
}
