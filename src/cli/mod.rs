//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - provision: Provision command arguments
//! - launch: Launch command arguments
//! - analyze: Analyze command arguments
//! - storage: Storage command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod analyze;
pub mod completions;
pub mod launch;
pub mod provision;
pub mod storage;

pub use analyze::AnalyzeArgs;
pub use completions::CompletionsArgs;
pub use launch::LaunchArgs;
pub use provision::ProvisionArgs;
pub use storage::{GetArgs, PutArgs, StorageArgs, StorageSubcommand};

/// AudioCLIP runner - bootstrap and analysis entrypoint
#[derive(Parser, Debug)]
#[command(
    name = "audioclip-runner",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Bootstrap and analysis entrypoint for a pretrained AudioCLIP sound-event detector",
    long_about = "audioclip-runner prepares the runtime environment (tool preflight, pinned and \
                  hash-verified asset bundle), launches the container entrypoint, and analyzes \
                  audio files for snowmobile noise with the provisioned classifier.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  audioclip-runner check                        \x1b[90m# Check required tools and directories\x1b[0m\n   \
                  audioclip-runner provision                    \x1b[90m# Fetch and verify the asset bundle\x1b[0m\n   \
                  audioclip-runner status                       \x1b[90m# Show the provisioning stamp\x1b[0m\n   \
                  audioclip-runner launch -- python app.py      \x1b[90m# Run the entrypoint\x1b[0m\n   \
                  audioclip-runner analyze --input /data        \x1b[90m# Analyze audio files\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Configuration file (defaults to ./audioclip.yaml)
    #[arg(long, short = 'c', global = true, env = crate::config::CONFIG_VAR)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check required tools and writable directories
    Check,

    /// Download, verify and extract the pinned asset bundle
    Provision(ProvisionArgs),

    /// Show the provisioning stamp
    Status,

    /// Re-hash the provisioned bundle against its stamp
    Verify,

    /// Run the entrypoint command with the module search path set
    Launch(LaunchArgs),

    /// Analyze audio files for detections
    Analyze(AnalyzeArgs),

    /// Get or put objects in the configured object store
    Storage(StorageArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Commands {
    /// Whether the command reads the configuration file
    pub fn needs_settings(&self) -> bool {
        !matches!(self, Commands::Version | Commands::Completions(_))
    }
}
