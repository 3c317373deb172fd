//! Process entrypoint
//!
//! Runs the configured foreground command once the bootstrap is complete.
//! The child inherits the environment with the module search path extended
//! and the asset directory exported.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::config::{ASSET_DIR_VAR, Settings};
use crate::error::{self, Result, RunnerError};

/// A fully resolved child process
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, OsString)>,
}

impl LaunchPlan {
    /// Resolve the command and environment for `settings`
    ///
    /// A non-empty `cli_command` replaces `launch.command` and `launch.args`.
    pub fn new(settings: &Settings, cli_command: &[String]) -> Result<Self> {
        let (program, args) = match cli_command.split_first() {
            Some((program, args)) => (program.clone(), args.to_vec()),
            None => {
                let program = settings
                    .launch
                    .command
                    .clone()
                    .filter(|c| !c.trim().is_empty())
                    .ok_or(RunnerError::NoLaunchCommand)?;
                (program, settings.launch.args.clone())
            }
        };

        let var = &settings.launch.search_path_var;
        let inherited = std::env::var_os(var);
        let search = search_path(settings, inherited.as_deref())?;

        Ok(Self {
            program,
            args,
            env: vec![
                (var.clone(), search),
                (
                    ASSET_DIR_VAR.to_string(),
                    absolute(&settings.asset.dir).into_os_string(),
                ),
            ],
        })
    }

    /// Run to completion and return the exit code to propagate
    pub fn run(&self) -> Result<i32> {
        tracing::info!(command = %self.program, args = ?self.args, "Starting entrypoint");
        for (name, value) in &self.env {
            tracing::debug!(var = %name, value = %value.to_string_lossy(), "Child environment");
        }

        let status = Command::new(&self.program)
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .status()
            .map_err(|e| error::launch::spawn_failed(&self.program, e.to_string()))?;

        let code = exit_code(status);
        if code == 0 {
            tracing::info!("Entrypoint exited successfully");
        } else {
            tracing::warn!(code, "Entrypoint exited with failure");
        }
        Ok(code)
    }
}

/// Application root, then its configured subdirectories, then `inherited`
pub fn search_path(settings: &Settings, inherited: Option<&OsStr>) -> Result<OsString> {
    let root = absolute(&settings.launch.app_root);

    let mut entries: Vec<PathBuf> = vec![root.clone()];
    entries.extend(settings.launch.search_subdirs.iter().map(|sub| root.join(sub)));
    if let Some(inherited) = inherited.filter(|v| !v.is_empty()) {
        entries.extend(std::env::split_paths(inherited));
    }

    std::env::join_paths(entries).map_err(|e| {
        error::config::invalid(format!(
            "cannot build {}: {e}",
            settings.launch.search_path_var
        ))
    })
}

fn absolute(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    })
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings_in(temp: &TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.launch.app_root = temp.path().to_path_buf();
        settings.asset.dir = temp.path().join("assets");
        settings
    }

    #[test]
    fn test_search_path_order() {
        let temp = TempDir::new().unwrap();
        let settings = settings_in(&temp);
        let root = dunce::canonicalize(temp.path()).unwrap();

        let inherited = std::env::join_paths(["/opt/lib/python"]).unwrap();
        let joined = search_path(&settings, Some(inherited.as_os_str())).unwrap();
        let entries: Vec<PathBuf> = std::env::split_paths(&joined).collect();

        assert_eq!(
            entries,
            vec![
                root.clone(),
                root.join("utils"),
                root.join("model"),
                PathBuf::from("/opt/lib/python"),
            ]
        );
    }

    #[test]
    fn test_search_path_without_inherited_value() {
        let temp = TempDir::new().unwrap();
        let mut settings = settings_in(&temp);
        settings.launch.search_subdirs.clear();

        let joined = search_path(&settings, Some(OsStr::new(""))).unwrap();
        assert_eq!(std::env::split_paths(&joined).count(), 1);
    }

    #[test]
    fn test_plan_prefers_cli_command() {
        let temp = TempDir::new().unwrap();
        let mut settings = settings_in(&temp);
        settings.launch.command = Some("python".to_string());
        settings.launch.args = vec!["predict.py".to_string()];

        let plan = LaunchPlan::new(&settings, &["sh".to_string(), "-c".to_string(), "true".to_string()])
            .unwrap();
        assert_eq!(plan.program, "sh");
        assert_eq!(plan.args, vec!["-c", "true"]);

        let plan = LaunchPlan::new(&settings, &[]).unwrap();
        assert_eq!(plan.program, "python");
        assert_eq!(plan.args, vec!["predict.py"]);
        assert!(plan.env.iter().any(|(k, _)| k == "PYTHONPATH"));
        assert!(plan.env.iter().any(|(k, _)| k == ASSET_DIR_VAR));
    }

    #[test]
    fn test_plan_without_command() {
        let temp = TempDir::new().unwrap();
        let err = LaunchPlan::new(&settings_in(&temp), &[]).unwrap_err();
        assert!(matches!(err, RunnerError::NoLaunchCommand));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_propagates_exit_code() {
        let temp = TempDir::new().unwrap();
        let settings = settings_in(&temp);
        let plan = LaunchPlan::new(
            &settings,
            &["sh".to_string(), "-c".to_string(), "exit 7".to_string()],
        )
        .unwrap();
        assert_eq!(plan.run().unwrap(), 7);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reports_signal() {
        let temp = TempDir::new().unwrap();
        let plan = LaunchPlan::new(
            &settings_in(&temp),
            &["sh".to_string(), "-c".to_string(), "kill -TERM $$".to_string()],
        )
        .unwrap();
        assert_eq!(plan.run().unwrap(), 128 + 15);
    }

    #[test]
    fn test_run_missing_program() {
        let temp = TempDir::new().unwrap();
        let plan = LaunchPlan::new(&settings_in(&temp), &["definitely-not-a-real-tool-4f2a".to_string()])
            .unwrap();
        let err = plan.run().unwrap_err();
        assert!(err.to_string().contains("Failed to start 'definitely-not-a-real-tool-4f2a'"));
    }
}
