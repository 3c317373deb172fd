//! Structured logging setup
//!
//! Logs go to stderr (plain or JSON) and, when `logging.dir` is set, to a
//! plain-text log file that survives the container.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Settings;
use crate::error::{self, Result};

/// Overrides the filter, e.g. `AUDIOCLIP_LOG=audioclip_runner=trace`
pub const LOG_FILTER_VAR: &str = "AUDIOCLIP_LOG";
/// `json` switches stderr output to JSON lines
pub const LOG_FORMAT_VAR: &str = "AUDIOCLIP_LOG_FORMAT";

/// Filter used when `AUDIOCLIP_LOG` is unset
fn default_filter(level: &str, verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        level.to_string()
    }
}

fn wants_json(configured: bool) -> bool {
    configured
        || std::env::var(LOG_FORMAT_VAR)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
}

/// Initialize the global subscriber
pub fn init(settings: &Settings, verbose: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_env(LOG_FILTER_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&settings.logging.level, verbose)));

    let json = wants_json(settings.logging.json);

    let file_layer = match settings.log_file() {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    error::fs::write_failed(parent.display().to_string(), e.to_string())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| error::fs::write_failed(path.display().to_string(), e.to_string()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| error::fs::io_error(format!("Failed to initialize logging: {e}")))?;

    tracing::debug!(
        log_file = ?settings.log_file(),
        json,
        "Logging initialized"
    );

    Ok(())
}
