//! Batch analysis with per-file failure isolation and optional result upload

use std::path::{Path, PathBuf};

use super::{Analyzer, FileOutcome};
use crate::error::{self, Result, RunnerError};
use crate::model::Classifier;
use crate::path_utils;
use crate::progress::BatchProgress;
use crate::storage::ObjectStore;

/// Uploads written results files under `prefix`, keyed by their path relative to `base`
pub struct ResultUpload {
    pub store: Box<dyn ObjectStore>,
    pub prefix: String,
    pub base: PathBuf,
}

impl ResultUpload {
    fn key(&self, output: &Path) -> String {
        let relative = output.strip_prefix(&self.base).unwrap_or(output);
        path_utils::object_key(&self.prefix, relative)
    }

    fn upload(&self, output: &Path) -> Result<String> {
        let key = self.key(output);
        let data = std::fs::read(output)
            .map_err(|e| error::fs::read_failed(output.display().to_string(), e.to_string()))?;
        self.store.put(&key, &data)?;
        tracing::info!(key = %key, location = %self.store.location(&key), "Results uploaded");
        Ok(key)
    }

    /// Upload a results file from an earlier run unless the store already has it
    fn upload_missing(&self, output: &Path) -> Result<bool> {
        if self.store.exists(&self.key(output))? {
            return Ok(false);
        }
        self.upload(output)?;
        Ok(true)
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub written: usize,
    pub skipped: usize,
    pub without_detections: usize,
    pub uploaded: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    /// Fails when any file failed
    pub fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(RunnerError::AnalysisFailed {
                failed: self.failed.len(),
                total: self.total,
            })
        }
    }
}

/// Analyze every file in `inputs`; a failing file is logged and the batch continues
pub fn run_batch<C: Classifier>(
    analyzer: &mut Analyzer<C>,
    inputs: &[PathBuf],
    upload: Option<&ResultUpload>,
    show_progress: bool,
) -> BatchSummary {
    let mut summary = BatchSummary {
        total: inputs.len(),
        ..BatchSummary::default()
    };
    let progress = BatchProgress::new(inputs.len() as u64, show_progress);

    for path in inputs {
        progress.update_file(&path.display().to_string());
        tracing::info!("Analysing {}", path.display());

        let result = analyzer.analyze_file(path).and_then(|outcome| {
            match (&outcome, upload) {
                (FileOutcome::Written { output, .. }, Some(upload)) => {
                    upload.upload(output)?;
                    summary.uploaded += 1;
                }
                (FileOutcome::Skipped { output }, Some(upload)) => {
                    if upload.upload_missing(output)? {
                        summary.uploaded += 1;
                    }
                }
                _ => {}
            }
            Ok(outcome)
        });

        match result {
            Ok(FileOutcome::Written { .. }) => summary.written += 1,
            Ok(FileOutcome::Skipped { .. }) => summary.skipped += 1,
            Ok(FileOutcome::NoDetections) => summary.without_detections += 1,
            Err(e) => {
                tracing::error!("File {} failed to be analyzed: {e}", path.display());
                summary.failed.push((path.clone(), e.to_string()));
            }
        }
        progress.inc();
    }

    progress.finish();
    tracing::info!(
        total = summary.total,
        written = summary.written,
        skipped = summary.skipped,
        without_detections = summary.without_detections,
        failed = summary.failed.len(),
        "Batch finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::super::fakes::{ScriptedClassifier, options};
    use super::*;
    use crate::audio::{tone, write_wav};
    use crate::storage::LocalStore;
    use tempfile::TempDir;

    #[test]
    fn test_batch_continues_past_failures() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("a.wav");
        let bad = temp.path().join("b.wav");
        let quiet = temp.path().join("c.wav");
        write_wav(&good, 8_000, 1, &tone(200.0, 8_000, 1.0, 0.5));
        std::fs::write(&bad, b"not audio").unwrap();
        write_wav(&quiet, 8_000, 1, &tone(200.0, 8_000, 1.0, 0.5));

        // Detection for the first classified file, background for the second
        let mut analyzer = Analyzer::new(
            ScriptedClassifier::new(&[&[0.0, 1.0], &[1.0, 0.0]]),
            options(1.0),
        )
        .unwrap();
        let inputs = vec![good, bad.clone(), quiet];
        let summary = run_batch(&mut analyzer, &inputs, None, false);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.without_detections, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, bad);

        let err = summary.into_result().unwrap_err();
        assert_eq!(err.to_string(), "1 of 3 files failed to be analyzed");
    }

    #[test]
    fn test_batch_uploads_written_results() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("data");
        let input = data.join("site1").join("clip.wav");
        std::fs::create_dir_all(input.parent().unwrap()).unwrap();
        write_wav(&input, 8_000, 1, &tone(200.0, 8_000, 1.0, 0.5));

        let bucket = temp.path().join("bucket");
        let upload = ResultUpload {
            store: Box::new(LocalStore::new(&bucket)),
            prefix: "results".to_string(),
            base: data.clone(),
        };

        let mut analyzer =
            Analyzer::new(ScriptedClassifier::new(&[&[0.0, 1.0]]), options(1.0)).unwrap();
        let summary = run_batch(&mut analyzer, &[input], Some(&upload), false)
            .into_result()
            .unwrap();

        assert_eq!(summary.uploaded, 1);
        let uploaded = bucket.join("results/site1/SNOWMOBILE_RESULTS/clip_ANALYZED.csv");
        assert_eq!(
            std::fs::read(&uploaded).unwrap(),
            std::fs::read(data.join("site1/SNOWMOBILE_RESULTS/clip_ANALYZED.csv")).unwrap()
        );
    }

    #[test]
    fn test_failed_upload_is_retried_on_next_run() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("data");
        let input = data.join("clip.wav");
        std::fs::create_dir_all(&data).unwrap();
        write_wav(&input, 8_000, 1, &tone(200.0, 8_000, 1.0, 0.5));

        // A regular file where the bucket directory should be makes every put fail
        let bucket = temp.path().join("bucket");
        std::fs::write(&bucket, "not a directory").unwrap();
        let upload = ResultUpload {
            store: Box::new(LocalStore::new(&bucket)),
            prefix: "results".to_string(),
            base: data.clone(),
        };
        let output = data.join("SNOWMOBILE_RESULTS/clip_ANALYZED.csv");

        let mut analyzer =
            Analyzer::new(ScriptedClassifier::new(&[&[0.0, 1.0]]), options(1.0)).unwrap();
        let first = run_batch(&mut analyzer, &[input.clone()], Some(&upload), false);
        assert_eq!(first.failed.len(), 1);
        assert_eq!(first.uploaded, 0);
        assert!(output.is_file());

        std::fs::remove_file(&bucket).unwrap();
        let second = run_batch(&mut analyzer, &[input.clone()], Some(&upload), false)
            .into_result()
            .unwrap();
        assert_eq!(second.skipped, 1);
        assert_eq!(second.uploaded, 1);
        assert_eq!(
            std::fs::read(bucket.join("results/SNOWMOBILE_RESULTS/clip_ANALYZED.csv")).unwrap(),
            std::fs::read(&output).unwrap()
        );

        // Already in the store: nothing is sent again
        let third = run_batch(&mut analyzer, &[input], Some(&upload), false)
            .into_result()
            .unwrap();
        assert_eq!(third.skipped, 1);
        assert_eq!(third.uploaded, 0);
    }
}
