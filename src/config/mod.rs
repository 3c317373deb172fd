//! Runner configuration
//!
//! Settings are read from a single YAML file (`audioclip.yaml` by default),
//! then overridden from `AUDIOCLIP_*` environment variables, then validated.
//! Every field except the asset pin has a default, so a minimal file is:
//!
//! ```yaml
//! asset:
//!   url: https://example.org/audioclip-assets-v1.tar.gz
//!   digest: blake3:5f0c...
//! ```
//!
//! Relative paths are resolved against the working directory of the process.

mod env;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{self, Result};
use crate::hash;

pub use env::{ASSET_DIGEST_VAR, ASSET_DIR_VAR, ASSET_URL_VAR, CONFIG_VAR};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "audioclip.yaml";

/// Subdirectory of the platform config dir searched last
const CONFIG_DIR: &str = "audioclip-runner";

/// Complete, validated runner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub asset: AssetSettings,
    pub runtime: RuntimeSettings,
    pub launch: LaunchSettings,
    pub model: ModelSettings,
    pub analysis: AnalysisSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
    /// Where the values came from; filled by `load`
    #[serde(skip)]
    pub origin: ConfigOrigin,
}

/// Sources that contributed to a loaded configuration
///
/// Loading happens before the subscriber exists, so these are kept and
/// logged once logging is up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOrigin {
    /// Config file read, `None` when running on defaults
    pub file: Option<PathBuf>,
    /// Environment variables that replaced file values
    pub env_overrides: Vec<&'static str>,
}

/// The pinned asset bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetSettings {
    /// Pinned archive URL (http, https or file)
    pub url: Option<String>,
    /// Expected BLAKE3 digest of the downloaded archive, `blake3:<hex>`
    pub digest: Option<String>,
    /// Directory the bundle is extracted into
    pub dir: PathBuf,
    pub format: ArchiveFormat,
    /// Paths relative to `dir` that must exist after extraction
    pub expected_entries: Vec<String>,
    /// Accept an archive without a pinned digest
    pub allow_unpinned: bool,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            url: None,
            digest: None,
            dir: PathBuf::from("assets"),
            format: ArchiveFormat::Auto,
            expected_entries: Vec::new(),
            allow_unpinned: false,
        }
    }
}

/// Layout of the downloaded asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// Detect from the URL file name
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "tar")]
    Tar,
    #[serde(rename = "tar.gz", alias = "tgz")]
    TarGz,
    /// Not an archive: store the download as a single file
    #[serde(rename = "file")]
    File,
}

/// OS-level capabilities checked before provisioning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeSettings {
    /// Executables that must resolve on `PATH`
    pub required_tools: Vec<String>,
    /// Directories that must be creatable and writable
    pub writable_dirs: Vec<PathBuf>,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            required_tools: vec!["ffmpeg".to_string()],
            writable_dirs: Vec::new(),
        }
    }
}

/// The foreground process started by `launch`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchSettings {
    pub command: Option<String>,
    pub args: Vec<String>,
    /// Application root prepended to the search path
    pub app_root: PathBuf,
    /// Environment variable holding the module search path
    pub search_path_var: String,
    /// Subdirectories of `app_root` added after it
    pub search_subdirs: Vec<String>,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            app_root: PathBuf::from("."),
            search_path_var: "PYTHONPATH".to_string(),
            search_subdirs: vec!["utils".to_string(), "model".to_string()],
        }
    }
}

/// The segment classifier shipped in the asset bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelSettings {
    /// Model file, relative to the asset directory
    pub path: PathBuf,
    /// Name of the model's audio input tensor
    pub input_name: String,
    pub sample_rate: u32,
    /// Segment length fed to the model, in seconds
    pub segment_secs: f32,
    pub intra_threads: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("snowmobile.onnx"),
            input_name: "audio".to_string(),
            sample_rate: 44_100,
            segment_secs: 3.0,
            intra_threads: 1,
        }
    }
}

/// Detection filtering and output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisSettings {
    pub min_hr: f32,
    pub min_conf: f32,
    /// Harmonic ratio is only computed for segments at or above this confidence
    pub hr_threshold: f32,
    pub num_workers: usize,
    /// Created next to each analyzed file
    pub results_dir_name: String,
    /// Globs selecting audio files when a directory is analyzed
    pub include: Vec<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            min_hr: 0.1,
            min_conf: 0.99,
            hr_threshold: 0.99,
            num_workers: 1,
            results_dir_name: "SNOWMOBILE_RESULTS".to_string(),
            include: vec!["**/*.{wav,WAV,flac,mp3,ogg}".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    None,
    Local,
    Http,
}

/// Object storage used for result upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Root directory for the local backend
    pub root: Option<PathBuf>,
    /// Bucket URL for the http backend
    pub base_url: Option<String>,
    /// Environment variable holding a bearer token for the http backend
    pub token_env: Option<String>,
    pub upload_results: bool,
    /// Key prefix for uploaded results
    pub prefix: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::None,
            root: None,
            base_url: None,
            token_env: None,
            upload_results: false,
            prefix: "results".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Log file directory; no file logging when unset
    pub dir: Option<PathBuf>,
    pub file_name: String,
    /// Default filter when `AUDIOCLIP_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: Some(PathBuf::from("logs")),
            file_name: "logfile.log".to_string(),
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        Ok(settings)
    }

    /// Read settings from a file without applying overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(error::config::not_found(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| error::config::read_failed(path.display().to_string(), e.to_string()))?;
        Self::from_yaml(&content)
            .map_err(|e| error::config::parse_failed(path.display().to_string(), e.to_string()))
    }

    /// Load, override from the process environment, and validate
    ///
    /// An explicit path must exist. Without one, `./audioclip.yaml` and then the
    /// platform config directory are tried; if neither exists the defaults are used
    /// and validation decides whether the environment supplied enough.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(explicit);
        let mut settings = match &path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.origin.file = path;
        settings.apply_overrides(|name| std::env::var(name).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Log where the configuration came from
    pub fn log_origin(&self) {
        match &self.origin.file {
            Some(path) => tracing::debug!(path = %path.display(), "Configuration loaded"),
            None => tracing::debug!("No configuration file found, using defaults"),
        }
        for var in &self.origin.env_overrides {
            tracing::debug!(var = %var, "Setting overridden from environment");
        }
    }

    /// Apply `AUDIOCLIP_*` overrides using `lookup` to read variables
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        env::apply(self, lookup);
    }

    /// Reject missing or malformed settings
    pub fn validate(&self) -> Result<()> {
        self.validate_asset()?;
        self.validate_model()?;
        self.validate_analysis()?;
        self.validate_storage()?;
        Ok(())
    }

    fn validate_asset(&self) -> Result<()> {
        let Some(url) = self.asset.url.as_deref() else {
            return Err(error::config::invalid(format!(
                "asset.url is required (set it in the config file or {ASSET_URL_VAR})"
            )));
        };
        if !is_supported_url(url) {
            return Err(error::config::invalid(format!(
                "asset.url must be an http, https or file URL, got '{url}'"
            )));
        }

        match self.asset.digest.as_deref() {
            Some(digest) if hash::parse_digest(digest).is_none() => {
                return Err(error::config::invalid(format!(
                    "asset.digest must be '{}' followed by 64 hex characters, got '{digest}'",
                    hash::HASH_PREFIX
                )));
            }
            None if !self.asset.allow_unpinned => {
                return Err(error::config::invalid(
                    "asset.digest is required unless asset.allow_unpinned is set",
                ));
            }
            _ => {}
        }

        if self.asset.dir.as_os_str().is_empty() {
            return Err(error::config::invalid("asset.dir must not be empty"));
        }

        for entry in &self.asset.expected_entries {
            if !is_relative_inside(Path::new(entry)) {
                return Err(error::config::invalid(format!(
                    "asset.expected_entries must be relative paths inside the bundle, got '{entry}'"
                )));
            }
        }

        Ok(())
    }

    fn validate_model(&self) -> Result<()> {
        if self.model.sample_rate == 0 {
            return Err(error::config::invalid("model.sample_rate must be positive"));
        }
        if !self.model.segment_secs.is_finite() || self.model.segment_secs <= 0.0 {
            return Err(error::config::invalid(
                "model.segment_secs must be a positive number",
            ));
        }
        if self.model.input_name.trim().is_empty() {
            return Err(error::config::invalid("model.input_name must not be empty"));
        }
        if !is_relative_inside(&self.model.path) {
            return Err(error::config::invalid(
                "model.path must be relative to the asset directory",
            ));
        }
        Ok(())
    }

    fn validate_analysis(&self) -> Result<()> {
        let analysis = &self.analysis;
        for (name, value) in [
            ("analysis.min_hr", analysis.min_hr),
            ("analysis.min_conf", analysis.min_conf),
            ("analysis.hr_threshold", analysis.hr_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(error::config::invalid(format!(
                    "{name} must be between 0 and 1, got {value}"
                )));
            }
        }
        if analysis.num_workers == 0 {
            return Err(error::config::invalid(
                "analysis.num_workers must be at least 1",
            ));
        }
        if analysis.results_dir_name.is_empty() || analysis.results_dir_name.contains(['/', '\\'])
        {
            return Err(error::config::invalid(
                "analysis.results_dir_name must be a plain directory name",
            ));
        }
        for pattern in &analysis.include {
            wax::Glob::new(pattern).map_err(|e| {
                error::config::invalid(format!("invalid analysis.include glob '{pattern}': {e}"))
            })?;
        }
        Ok(())
    }

    fn validate_storage(&self) -> Result<()> {
        match self.storage.backend {
            StorageBackend::None => {
                if self.storage.upload_results {
                    return Err(error::config::invalid(
                        "storage.upload_results requires storage.backend",
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.root.is_none() {
                    return Err(error::config::invalid(
                        "storage.root is required for the local backend",
                    ));
                }
            }
            StorageBackend::Http => match self.storage.base_url.as_deref() {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
                Some(url) => {
                    return Err(error::config::invalid(format!(
                        "storage.base_url must be an http or https URL, got '{url}'"
                    )));
                }
                None => {
                    return Err(error::config::invalid(
                        "storage.base_url is required for the http backend",
                    ));
                }
            },
        }
        Ok(())
    }

    /// Pinned asset URL; present once validated
    pub fn asset_url(&self) -> &str {
        self.asset.url.as_deref().unwrap_or_default()
    }

    /// Directory holding the asset dir; staging happens here so the final rename stays on one filesystem
    pub fn asset_parent(&self) -> PathBuf {
        self.asset
            .dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    /// Path of the model file inside the asset directory
    pub fn model_path(&self) -> PathBuf {
        self.asset.dir.join(&self.model.path)
    }

    /// Log file path, if file logging is enabled
    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging
            .dir
            .as_ref()
            .map(|dir| dir.join(&self.logging.file_name))
    }
}

/// Pick the configuration file to read, if any
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR).join("config.yaml"))
        .filter(|path| path.is_file())
}

fn is_supported_url(url: &str) -> bool {
    ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| url.starts_with(scheme) && url.len() > scheme.len())
}

fn is_relative_inside(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_) | std::path::Component::CurDir))
}
