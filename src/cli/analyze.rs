use clap::Parser;
use std::path::PathBuf;

/// Arguments for the analyze command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Analyze one file:\n    audioclip-runner analyze --input /data/site1/clip.wav\n\n\
                  Analyze a directory with four harmonic-ratio workers:\n    \
                  audioclip-runner analyze --input /data --num-workers 4\n\n\
                  Relax the thresholds:\n    audioclip-runner analyze --input /data --min-hr 0.05 --min-conf 0.9")]
pub struct AnalyzeArgs {
    /// Audio file or directory to analyze
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Threads computing harmonic ratios (default from analysis.num_workers)
    #[arg(long, alias = "num_workers")]
    pub num_workers: Option<usize>,

    /// Minimum harmonic ratio for a detection (default from analysis.min_hr)
    #[arg(long, alias = "min_hr")]
    pub min_hr: Option<f32>,

    /// Minimum model confidence for a detection (default from analysis.min_conf)
    #[arg(long, alias = "min_conf")]
    pub min_conf: Option<f32>,

    /// Hide the batch progress bar
    #[arg(long)]
    pub no_progress: bool,
}
