//! Runtime environment preflight
//!
//! Checks the OS-level capabilities the entrypoint depends on (audio codec
//! tools, writable state directories) before anything is downloaded. Nothing
//! is installed here; a missing capability is reported and the bootstrap stops.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{self, Result};

/// Result of resolving one required executable
#[derive(Debug, Clone)]
pub struct ToolCheck {
    pub name: String,
    pub resolved: Option<PathBuf>,
}

/// Result of probing one directory for write access
#[derive(Debug, Clone)]
pub struct DirCheck {
    pub path: PathBuf,
    pub error: Option<String>,
}

/// Everything the preflight looked at
#[derive(Debug, Clone, Default)]
pub struct PreflightReport {
    pub tools: Vec<ToolCheck>,
    pub dirs: Vec<DirCheck>,
}

impl PreflightReport {
    /// Human-readable list of failures, empty when the environment is usable
    pub fn problems(&self) -> Vec<String> {
        let tools = self
            .tools
            .iter()
            .filter(|t| t.resolved.is_none())
            .map(|t| format!("missing tool: {}", t.name));
        let dirs = self.dirs.iter().filter_map(|d| {
            d.error
                .as_ref()
                .map(|e| format!("not writable: {} ({e})", d.path.display()))
        });
        tools.chain(dirs).collect()
    }

    pub fn is_ok(&self) -> bool {
        self.problems().is_empty()
    }

    /// Turn a failed report into a single error naming every problem
    pub fn into_result(self) -> Result<Self> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(self)
        } else {
            Err(error::runtime::preflight_failed(&problems))
        }
    }
}

/// Run every check configured in `settings`
pub fn preflight(settings: &Settings) -> PreflightReport {
    let path_var = std::env::var_os("PATH");

    let tools = settings
        .runtime
        .required_tools
        .iter()
        .map(|name| {
            let resolved = find_executable(name, path_var.as_deref());
            match &resolved {
                Some(path) => tracing::debug!(tool = %name, path = %path.display(), "Tool found"),
                None => tracing::warn!(tool = %name, "Required tool not found on PATH"),
            }
            ToolCheck {
                name: name.clone(),
                resolved,
            }
        })
        .collect();

    let dirs = required_dirs(settings)
        .into_iter()
        .map(|path| {
            let error = probe_writable(&path).err();
            if let Some(reason) = &error {
                tracing::warn!(dir = %path.display(), reason = %reason, "Directory not writable");
            }
            DirCheck { path, error }
        })
        .collect();

    PreflightReport { tools, dirs }
}

/// Directories that must be writable: the asset parent, the log directory, and any extras
fn required_dirs(settings: &Settings) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    dirs.push(settings.asset_parent());

    if let Some(log_dir) = &settings.logging.dir {
        dirs.push(log_dir.clone());
    }

    dirs.extend(settings.runtime.writable_dirs.iter().cloned());
    dirs.dedup();
    dirs
}

fn probe_writable(dir: &Path) -> std::result::Result<(), String> {
    std::fs::create_dir_all(dir).map_err(|e| e.to_string())?;
    tempfile::tempfile_in(dir).map(|_| ()).map_err(|e| e.to_string())
}

/// Resolve `name` against a `PATH`-style list
///
/// Names containing a path separator are checked as given.
pub fn find_executable(name: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path_var = path_var?;
    std::env::split_paths(path_var)
        .flat_map(|dir| executable_names(name).into_iter().map(move |n| dir.join(n)))
        .find(|path| is_executable(path))
}

#[cfg(windows)]
fn executable_names(name: &str) -> Vec<String> {
    vec![name.to_string(), format!("{name}.exe"), format!("{name}.cmd")]
}

#[cfg(not(windows))]
fn executable_names(name: &str) -> Vec<String> {
    vec![name.to_string()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
