//! audioclip-runner - bootstrap and analysis entrypoint for AudioCLIP
//!
//! Prepares the runtime environment for a pretrained AudioCLIP sound-event
//! detector (tool preflight, pinned and hash-verified asset bundle), launches
//! the container entrypoint, and analyzes audio files with the provisioned
//! classifier.

use clap::Parser;

mod analysis;
mod audio;
mod cli;
mod commands;
mod config;
mod error;
mod hash;
mod launch;
mod logging;
mod model;
mod path_utils;
mod progress;
mod provision;
mod runtime;
mod storage;
mod temp;

use cli::{Cli, Commands};
use config::Settings;
use error::Result;

/// Dispatch a parsed command line; returns the process exit code
fn run(cli: Cli) -> Result<i32> {
    // Version and completions work without a configuration
    if !cli.command.needs_settings() {
        return match cli.command {
            Commands::Completions(args) => commands::completions::run(args).map(|()| 0),
            _ => commands::version::run().map(|()| 0),
        };
    }

    let settings = Settings::load(cli.config.as_deref())?;
    logging::init(&settings, cli.verbose)?;
    settings.log_origin();

    match cli.command {
        Commands::Check => commands::check::run(&settings).map(|()| 0),
        Commands::Provision(args) => commands::provision::run(&settings, args).map(|()| 0),
        Commands::Status => commands::status::run(&settings).map(|()| 0),
        Commands::Verify => commands::verify::run(&settings).map(|()| 0),
        Commands::Launch(args) => commands::launch::run(&settings, args),
        Commands::Analyze(args) => commands::analyze::run(&settings, args).map(|()| 0),
        Commands::Storage(args) => commands::storage::run(&settings, args).map(|()| 0),
        Commands::Version | Commands::Completions(_) => Ok(0),
    }
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
