//! Asset provisioning
//!
//! The bootstrap sequence is strictly ordered and fail-fast:
//!
//! 1. Runtime preflight (tools, writable directories)
//! 2. Download of the pinned archive into a scratch directory
//! 3. Digest check against the pin
//! 4. Extraction into a staging directory beside the asset directory
//! 5. Layout check, tree hash, stamp
//! 6. Rename of the staging directory into place
//!
//! Until step 6 the asset directory is untouched, so a failure at any point
//! leaves either the previous complete bundle or nothing.

pub mod download;
pub mod extract;
pub mod stamp;

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{self, Result};
use crate::hash;
use crate::runtime;
use crate::temp;

pub use stamp::ProvisionStamp;

/// Stamp file written inside the asset directory
pub const STAMP_FILE: &str = ".provisioned.json";

/// What `provision` did
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The stamp and the on-disk tree already matched the pin
    AlreadyProvisioned(ProvisionStamp),
    Provisioned(ProvisionStamp),
}

impl Outcome {
    pub fn stamp(&self) -> &ProvisionStamp {
        match self {
            Outcome::AlreadyProvisioned(stamp) | Outcome::Provisioned(stamp) => stamp,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisionOptions {
    /// Reprovision even when the stamp matches
    pub force: bool,
    pub show_progress: bool,
}

/// Run the full bootstrap for `settings`
pub fn provision(settings: &Settings, options: ProvisionOptions) -> Result<Outcome> {
    runtime::preflight(settings).into_result()?;

    let url = settings.asset_url();
    let dest = &settings.asset.dir;

    if !options.force {
        if let Some(stamp) = current_stamp(settings)? {
            tracing::info!(dir = %dest.display(), "Asset bundle already provisioned");
            return Ok(Outcome::AlreadyProvisioned(stamp));
        }
    }

    let scratch = temp::download_scratch_dir()?;
    let file_name = download::url_file_name(url);
    let downloaded = download::fetch(url, &scratch.path().join(&file_name), options.show_progress)?;

    match settings.asset.digest.as_deref() {
        Some(expected) => {
            if !hash::verify_hash(expected, &downloaded.digest) {
                return Err(error::asset::digest_mismatch(expected, downloaded.digest));
            }
            tracing::debug!(
                digest = %downloaded.digest,
                bytes = downloaded.bytes,
                "Archive digest verified"
            );
        }
        None => {
            tracing::warn!(
                digest = %downloaded.digest,
                bytes = downloaded.bytes,
                "No digest pinned; accepting archive without verification"
            );
        }
    }

    let parent = settings.asset_parent();
    std::fs::create_dir_all(&parent)
        .map_err(|e| error::fs::write_failed(parent.display().to_string(), e.to_string()))?;
    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(&parent)
        .map_err(|e| error::fs::write_failed(parent.display().to_string(), e.to_string()))?;

    let format = extract::detect_format(settings.asset.format, &file_name);
    let count = extract::extract(&downloaded.path, format, &file_name, staging.path())?;
    tracing::info!(entries = count, format = ?format, "Archive extracted");

    extract::check_layout(staging.path(), &settings.asset.expected_entries)?;

    let tree_digest = hash::hash_directory(staging.path())?;
    let stamp = ProvisionStamp::new(url, downloaded.digest, tree_digest);
    stamp.write(staging.path())?;

    install(staging.path(), dest)?;

    tracing::info!(
        dir = %dest.display(),
        tree_digest = %stamp.tree_digest,
        "Asset bundle provisioned"
    );
    Ok(Outcome::Provisioned(stamp))
}

/// The stamp, if it matches the pin and the tree on disk
fn current_stamp(settings: &Settings) -> Result<Option<ProvisionStamp>> {
    let dest = &settings.asset.dir;
    if !dest.is_dir() {
        return Ok(None);
    }
    let stamp = match ProvisionStamp::read(dest) {
        Ok(Some(stamp)) => stamp,
        Ok(None) => return Ok(None),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unreadable stamp");
            return Ok(None);
        }
    };
    if !stamp.matches_pin(settings.asset_url(), settings.asset.digest.as_deref()) {
        tracing::info!("Pin changed since last provisioning");
        return Ok(None);
    }
    let tree_digest = hash::hash_directory(dest)?;
    if !hash::verify_hash(&stamp.tree_digest, &tree_digest) {
        tracing::warn!("Asset tree modified since provisioning");
        return Ok(None);
    }
    Ok(Some(stamp))
}

/// Move a complete staging tree to `dest`, replacing any previous bundle
fn install(staging: &Path, dest: &Path) -> Result<()> {
    let backup = dest.exists().then(|| backup_path(dest));

    if let Some(backup) = &backup {
        std::fs::rename(dest, backup)
            .map_err(|e| error::fs::write_failed(dest.display().to_string(), e.to_string()))?;
    }

    if let Err(e) = std::fs::rename(staging, dest) {
        if let Some(backup) = &backup {
            if let Err(restore) = std::fs::rename(backup, dest) {
                tracing::error!(
                    backup = %backup.display(),
                    error = %restore,
                    "Failed to restore previous asset bundle"
                );
            }
        }
        return Err(error::fs::write_failed(
            dest.display().to_string(),
            e.to_string(),
        ));
    }

    if let Some(backup) = backup {
        if let Err(e) = std::fs::remove_dir_all(&backup) {
            tracing::warn!(backup = %backup.display(), error = %e, "Failed to remove previous bundle");
        }
    }
    Ok(())
}

fn backup_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "assets".to_string());
    dest.with_file_name(format!(".{name}.previous-{}", std::process::id()))
}

/// Quick check used before `launch` and `analyze`: the stamp exists and matches the pin
pub fn check_stamp(settings: &Settings) -> Result<ProvisionStamp> {
    let dest = &settings.asset.dir;
    let stamp = ProvisionStamp::read(dest)?
        .ok_or_else(|| error::asset::not_provisioned(dest.display().to_string()))?;

    if !stamp.matches_pin(settings.asset_url(), settings.asset.digest.as_deref()) {
        return Err(error::asset::stamp_mismatch(format!(
            "provisioned from {} ({}), configured pin differs",
            stamp.url, stamp.archive_digest
        )));
    }
    Ok(stamp)
}

/// Deep check: the stamp matches the pin and the tree still hashes to the recorded digest
pub fn verify(settings: &Settings) -> Result<ProvisionStamp> {
    let stamp = check_stamp(settings)?;
    let actual = hash::hash_directory(&settings.asset.dir)?;
    if !hash::verify_hash(&stamp.tree_digest, &actual) {
        return Err(error::asset::stamp_mismatch(format!(
            "tree digest is {actual}, stamp records {}",
            stamp.tree_digest
        )));
    }
    Ok(stamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn write_bundle(path: &Path, files: &[(&str, &[u8])]) {
        let encoder = flate2::write::GzEncoder::new(
            File::create(path).unwrap(),
            flate2::Compression::default(),
        );
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn settings_for(temp: &TempDir, archive: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.asset.url = Some(format!("file://{}", archive.display()));
        settings.asset.digest = Some(hash::hash_file(archive).unwrap());
        settings.asset.dir = temp.path().join("state").join("assets");
        settings.logging.dir = None;
        settings.runtime.required_tools = Vec::new();
        settings
    }

    fn bundle(temp: &TempDir) -> PathBuf {
        let archive = temp.path().join("bundle.tar.gz");
        write_bundle(
            &archive,
            &[
                ("snowmobile.onnx", b"weights"),
                ("utils/transforms.py", b"# helpers"),
            ],
        );
        archive
    }

    #[test]
    fn test_provision_then_noop() {
        let temp = TempDir::new().unwrap();
        let archive = bundle(&temp);
        let settings = settings_for(&temp, &archive);

        let first = provision(&settings, ProvisionOptions::default()).unwrap();
        assert!(matches!(first, Outcome::Provisioned(_)));
        assert!(settings.asset.dir.join("snowmobile.onnx").is_file());
        assert!(settings.asset.dir.join(STAMP_FILE).is_file());

        let second = provision(&settings, ProvisionOptions::default()).unwrap();
        assert!(matches!(second, Outcome::AlreadyProvisioned(_)));
        assert_eq!(first.stamp().tree_digest, second.stamp().tree_digest);
    }

    #[test]
    fn test_force_reprovisions_identically() {
        let temp = TempDir::new().unwrap();
        let archive = bundle(&temp);
        let settings = settings_for(&temp, &archive);

        let first = provision(&settings, ProvisionOptions::default()).unwrap();
        let forced = provision(
            &settings,
            ProvisionOptions {
                force: true,
                show_progress: false,
            },
        )
        .unwrap();
        assert!(matches!(forced, Outcome::Provisioned(_)));
        assert_eq!(first.stamp().tree_digest, forced.stamp().tree_digest);

        // No staging or backup directories left behind
        let leftovers: Vec<_> = std::fs::read_dir(settings.asset_parent())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with('.'))
            .collect();
        assert!(leftovers.is_empty(), "leftovers: {leftovers:?}");
    }

    #[test]
    fn test_modified_tree_triggers_reprovision() {
        let temp = TempDir::new().unwrap();
        let archive = bundle(&temp);
        let settings = settings_for(&temp, &archive);

        provision(&settings, ProvisionOptions::default()).unwrap();
        std::fs::write(settings.asset.dir.join("snowmobile.onnx"), b"tampered").unwrap();
        assert!(verify(&settings).is_err());

        let outcome = provision(&settings, ProvisionOptions::default()).unwrap();
        assert!(matches!(outcome, Outcome::Provisioned(_)));
        assert_eq!(
            std::fs::read(settings.asset.dir.join("snowmobile.onnx")).unwrap(),
            b"weights"
        );
        verify(&settings).unwrap();
    }

    #[test]
    fn test_digest_mismatch_leaves_nothing() {
        let temp = TempDir::new().unwrap();
        let archive = bundle(&temp);
        let mut settings = settings_for(&temp, &archive);
        settings.asset.digest = Some(format!("blake3:{}", "0".repeat(64)));

        let err = provision(&settings, ProvisionOptions::default()).unwrap_err();
        assert!(err.to_string().contains("digest mismatch"));
        assert!(!settings.asset.dir.exists());
    }

    #[test]
    fn test_missing_expected_entry_leaves_nothing() {
        let temp = TempDir::new().unwrap();
        let archive = bundle(&temp);
        let mut settings = settings_for(&temp, &archive);
        settings.asset.expected_entries = vec!["model/AudioCLIP.pt".to_string()];

        let err = provision(&settings, ProvisionOptions::default()).unwrap_err();
        assert!(err.to_string().contains("model/AudioCLIP.pt"));
        assert!(!settings.asset.dir.exists());
    }

    #[test]
    fn test_linked_entry_leaves_no_staging() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("bundle.tar");
        let mut builder = tar::Builder::new(File::create(&archive).unwrap());
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        builder
            .append_link(&mut header, "snowmobile.onnx", "/etc/passwd")
            .unwrap();
        builder.finish().unwrap();
        let settings = settings_for(&temp, &archive);

        let err = provision(&settings, ProvisionOptions::default()).unwrap_err();
        assert!(err.to_string().contains("escapes the asset directory"));
        assert!(!settings.asset.dir.exists());
        let left: Vec<_> = std::fs::read_dir(settings.asset_parent()).unwrap().collect();
        assert!(left.is_empty(), "left beside the asset dir: {left:?}");
    }

    #[test]
    fn test_failed_reprovision_keeps_previous_bundle() {
        let temp = TempDir::new().unwrap();
        let archive = bundle(&temp);
        let settings = settings_for(&temp, &archive);
        provision(&settings, ProvisionOptions::default()).unwrap();

        let mut broken = settings.clone();
        broken.asset.url = Some(format!("file://{}", temp.path().join("gone.tar.gz").display()));
        broken.asset.digest = None;
        broken.asset.allow_unpinned = true;
        assert!(provision(&broken, ProvisionOptions::default()).is_err());

        verify(&settings).unwrap();
    }

    #[test]
    fn test_missing_tool_fails_before_download() {
        let temp = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.asset.url = Some(format!(
            "file://{}",
            temp.path().join("never-created.tar.gz").display()
        ));
        settings.asset.allow_unpinned = true;
        settings.asset.dir = temp.path().join("state").join("assets");
        settings.logging.dir = None;
        settings.runtime.required_tools = vec!["definitely-not-a-real-tool-4f2a".to_string()];

        let err = provision(&settings, ProvisionOptions::default()).unwrap_err();
        assert!(err.to_string().contains("preflight failed"));
        assert!(!settings.asset.dir.exists());
    }

    #[test]
    fn test_check_stamp_requires_provisioning() {
        let temp = TempDir::new().unwrap();
        let archive = bundle(&temp);
        let settings = settings_for(&temp, &archive);

        let err = check_stamp(&settings).unwrap_err();
        assert!(err.to_string().contains("not provisioned"));

        provision(&settings, ProvisionOptions::default()).unwrap();
        check_stamp(&settings).unwrap();

        let mut repinned = settings.clone();
        repinned.asset.digest = Some(format!("blake3:{}", "f".repeat(64)));
        let err = check_stamp(&repinned).unwrap_err();
        assert!(err.to_string().contains("configured pin differs"));
    }
}
