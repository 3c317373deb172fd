//! Analysis entrypoint
//!
//! Per file: decode to mono at the model rate, cut fixed-length segments,
//! classify each segment, compute the harmonic ratio of the confident ones,
//! keep the detections that pass the thresholds and write them as CSV next
//! to the input.

pub mod batch;
pub mod detection;
pub mod inputs;
pub mod output;

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use crate::audio::{self, HarmonicRatio};
use crate::config::Settings;
use crate::error::{self, Result};
use crate::model::{self, Classifier};

pub use batch::{BatchSummary, ResultUpload, run_batch};
pub use detection::{Detection, SegmentScore, select_detections};
pub use inputs::collect_inputs;
pub use output::{CSV_HEADER, output_path, write_csv};

/// Parameters of one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub sample_rate: u32,
    pub segment_secs: f32,
    pub hr_threshold: f32,
    pub min_hr: f32,
    pub min_conf: f32,
    pub num_workers: usize,
    pub results_dir_name: String,
}

impl AnalysisOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            sample_rate: settings.model.sample_rate,
            segment_secs: settings.model.segment_secs,
            hr_threshold: settings.analysis.hr_threshold,
            min_hr: settings.analysis.min_hr,
            min_conf: settings.analysis.min_conf,
            num_workers: settings.analysis.num_workers,
            results_dir_name: settings.analysis.results_dir_name.clone(),
        }
    }
}

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// A results file already existed
    Skipped { output: PathBuf },
    NoDetections,
    Written { output: PathBuf, detections: usize },
}

/// Segment classifier plus harmonic-ratio worker pool
pub struct Analyzer<C> {
    classifier: C,
    harmonic: HarmonicRatio,
    pool: rayon::ThreadPool,
    options: AnalysisOptions,
}

impl<C: Classifier> Analyzer<C> {
    pub fn new(classifier: C, options: AnalysisOptions) -> Result<Self> {
        let harmonic = HarmonicRatio::new(options.sample_rate)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.num_workers.max(1))
            .thread_name(|i| format!("hr-worker-{i}"))
            .build()
            .map_err(|e| error::fs::io_error(format!("Failed to start worker pool: {e}")))?;

        Ok(Self {
            classifier,
            harmonic,
            pool,
            options,
        })
    }

    /// Score every segment of a mono signal at the model rate
    pub fn score(&mut self, samples: &[f32]) -> Result<Vec<SegmentScore>> {
        let len = audio::segment_len(self.options.sample_rate, self.options.segment_secs);
        let segments = audio::split_segments(samples, len);

        let probabilities = segments
            .iter()
            .map(|segment| {
                self.classifier
                    .classify(segment)
                    .map(|log_probs| model::probabilities(&log_probs))
            })
            .collect::<Result<Vec<_>>>()?;

        let threshold = self.options.hr_threshold;
        let harmonic = &self.harmonic;
        let ratios: Vec<f32> = self.pool.install(|| {
            segments
                .par_iter()
                .zip(probabilities.par_iter())
                .map(|(segment, probs)| match model::best_class(probs) {
                    Some((_, confidence)) if confidence >= threshold => {
                        harmonic.segment_ratio(segment)
                    }
                    _ => 0.0,
                })
                .collect()
        });

        Ok(probabilities
            .into_iter()
            .zip(ratios)
            .map(|(probabilities, hr)| SegmentScore { probabilities, hr })
            .collect())
    }

    /// Analyze one file and write its results
    pub fn analyze_file(&mut self, path: &Path) -> Result<FileOutcome> {
        let started = Instant::now();

        let output = output_path(path, &self.options.results_dir_name)?;
        if output.exists() {
            tracing::info!("File {} already exists", output.display());
            return Ok(FileOutcome::Skipped { output });
        }

        let samples = audio::decode_file(path, self.options.sample_rate)?;
        let scores = self.score(&samples)?;
        let detections = select_detections(
            &scores,
            self.options.segment_secs,
            self.options.min_hr,
            self.options.min_conf,
        );
        tracing::debug!(
            file = %path.display(),
            segments = scores.len(),
            detections = detections.len(),
            "Segments scored"
        );

        let outcome = if detections.is_empty() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            tracing::info!("No detection has been made for {name}");
            FileOutcome::NoDetections
        } else {
            write_csv(&output, &detections)?;
            FileOutcome::Written {
                output,
                detections: detections.len(),
            }
        };

        tracing::info!(
            "Finished {} in {:.2} seconds",
            path.display(),
            started.elapsed().as_secs_f64()
        );
        Ok(outcome)
    }
}
