//! Common test utilities for audioclip-runner integration tests

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Environment variables the runner reads; cleared so the host cannot leak in
const RUNNER_VARS: &[&str] = &[
    "AUDIOCLIP_CONFIG",
    "AUDIOCLIP_ASSET_URL",
    "AUDIOCLIP_ASSET_DIGEST",
    "AUDIOCLIP_ASSET_DIR",
    "AUDIOCLIP_LOG",
    "AUDIOCLIP_LOG_FORMAT",
];

/// A test workspace for integration tests
pub struct TestWorkspace {
    /// Temporary directory
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Runner command rooted in the workspace with a clean environment
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("audioclip-runner").expect("binary is built");
        cmd.current_dir(&self.path);
        for var in RUNNER_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from workspace
    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    /// Check if a file exists in workspace
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Build a `.tar.gz` asset bundle in the workspace
    pub fn write_bundle(&self, name: &str, entries: &[(&str, &str)]) -> PathBuf {
        let path = self.path.join(name);
        let file = File::create(&path).expect("Failed to create bundle");
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (entry, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, entry, content.as_bytes())
                .expect("Failed to append bundle entry");
        }
        builder
            .into_inner()
            .and_then(|encoder| encoder.finish())
            .expect("Failed to finish bundle");
        path
    }

    /// Build a plain tar whose single entry climbs out of the extraction root
    pub fn write_escaping_bundle(&self, name: &str) -> PathBuf {
        let path = self.path.join(name);
        let file = File::create(&path).expect("Failed to create bundle");
        let mut builder = tar::Builder::new(file);
        let entry = "../escaped.txt";
        let mut header = tar::Header::new_old();
        header.as_old_mut().name[..entry.len()].copy_from_slice(entry.as_bytes());
        header.set_size(4);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder
            .append(&header, &b"evil"[..])
            .expect("Failed to append bundle entry");
        builder.finish().expect("Failed to finish bundle");
        path
    }

    /// Write `audioclip.yaml` into the workspace root
    pub fn write_config(&self, yaml: &str) {
        self.write_file("audioclip.yaml", yaml);
    }

    /// Config pinning `archive` by URL and digest, with state kept inside the workspace
    pub fn pinned_config(&self, archive: &Path, extra: &str) -> String {
        self.config_for(&file_url(archive), Some(&digest_of(archive)), extra)
    }

    /// Config for an arbitrary URL and optional digest
    pub fn config_for(&self, url: &str, digest: Option<&str>, extra: &str) -> String {
        let pin = match digest {
            Some(digest) => format!("  digest: {digest}\n"),
            None => "  allow_unpinned: true\n".to_string(),
        };
        let mut yaml = format!(
            "asset:\n  url: '{url}'\n{pin}  dir: '{assets}'\n\
             runtime:\n  required_tools: []\n\
             logging:\n  dir: '{logs}'\n",
            assets = self.asset_dir().display(),
            logs = self.path.join("logs").display(),
        );
        yaml.push_str(extra);
        yaml
    }

    /// Where pinned configs extract the bundle
    pub fn asset_dir(&self) -> PathBuf {
        self.path.join("state").join("assets")
    }
}

/// `file://` URL standing in for a network location
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// `blake3:<hex>` digest of a file
pub fn digest_of(path: &Path) -> String {
    let bytes = std::fs::read(path).expect("Failed to read file for hashing");
    format!("blake3:{}", blake3::hash(&bytes).to_hex())
}

/// Entries of a small but complete asset bundle
pub fn sample_bundle() -> Vec<(&'static str, &'static str)> {
    vec![
        ("snowmobile.onnx", "not really a model"),
        ("utils/__init__.py", ""),
        ("model/config.json", "{\"classes\": 2}"),
    ]
}
