use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Arguments for storage command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Download an object:\n    audioclip-runner storage get results/site1/clip_ANALYZED.csv\n\n\
                  Download to a file:\n    audioclip-runner storage get results/a.csv --output a.csv\n\n\
                  Upload a file:\n    audioclip-runner storage put results/a.csv ./a.csv")]
pub struct StorageArgs {
    #[command(subcommand)]
    pub command: StorageSubcommand,
}

/// Storage subcommands
#[derive(Subcommand, Debug)]
pub enum StorageSubcommand {
    /// Fetch an object (to stdout unless --output is given)
    Get(GetArgs),

    /// Store a local file as an object
    Put(PutArgs),
}

#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Object key
    pub key: String,

    /// Write to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct PutArgs {
    /// Object key
    pub key: String,

    /// Local file to upload
    pub file: PathBuf,
}
