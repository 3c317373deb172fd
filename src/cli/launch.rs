use clap::Parser;

/// Arguments for the launch command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Run the configured entrypoint:\n    audioclip-runner launch\n\n\
                  Run a specific command:\n    audioclip-runner launch -- python predict.py --input /data/clip.wav")]
pub struct LaunchArgs {
    /// Command and arguments to run instead of launch.command
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}
