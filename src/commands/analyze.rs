//! Analyze command

use crate::analysis::{self, AnalysisOptions, Analyzer, ResultUpload};
use crate::cli::AnalyzeArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::model::OnnxClassifier;
use crate::{provision, storage};

pub fn run(settings: &Settings, args: AnalyzeArgs) -> Result<()> {
    let settings = with_overrides(settings, &args)?;
    provision::check_stamp(&settings)?;

    let inputs = analysis::collect_inputs(
        &args.input,
        &settings.analysis.include,
        &settings.analysis.results_dir_name,
    )?;
    if inputs.is_empty() {
        tracing::warn!(input = %args.input.display(), "No audio files found");
        return Ok(());
    }

    let upload = if settings.storage.upload_results {
        let base = if args.input.is_dir() {
            args.input.clone()
        } else {
            args.input
                .parent()
                .map(std::path::Path::to_path_buf)
                .unwrap_or_default()
        };
        Some(ResultUpload {
            store: storage::from_settings(&settings.storage)?,
            prefix: settings.storage.prefix.clone(),
            base,
        })
    } else {
        None
    };

    let classifier = OnnxClassifier::load(
        &settings.model_path(),
        &settings.model.input_name,
        settings.model.intra_threads,
    )?;
    let mut analyzer = Analyzer::new(classifier, AnalysisOptions::from_settings(&settings))?;

    let show_progress = !args.no_progress && inputs.len() > 1 && console::user_attended_stderr();
    let summary = analysis::run_batch(&mut analyzer, &inputs, upload.as_ref(), show_progress)
        .into_result()?;

    println!(
        "Analyzed {} file(s): {} with detections, {} without, {} skipped",
        summary.total, summary.written, summary.without_detections, summary.skipped
    );
    Ok(())
}

/// Apply command-line thresholds and revalidate
fn with_overrides(settings: &Settings, args: &AnalyzeArgs) -> Result<Settings> {
    let mut settings = settings.clone();
    if let Some(workers) = args.num_workers {
        settings.analysis.num_workers = workers;
    }
    if let Some(min_hr) = args.min_hr {
        settings.analysis.min_hr = min_hr;
    }
    if let Some(min_conf) = args.min_conf {
        settings.analysis.min_conf = min_conf;
    }
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.asset.url = Some("https://example.org/assets.tar.gz".to_string());
        settings.asset.allow_unpinned = true;
        settings
    }

    fn args(num_workers: Option<usize>, min_hr: Option<f32>, min_conf: Option<f32>) -> AnalyzeArgs {
        AnalyzeArgs {
            input: PathBuf::from("/data"),
            num_workers,
            min_hr,
            min_conf,
            no_progress: true,
        }
    }

    #[test]
    fn test_overrides_apply() {
        let settings = with_overrides(&valid_settings(), &args(Some(4), Some(0.2), None)).unwrap();
        assert_eq!(settings.analysis.num_workers, 4);
        assert_eq!(settings.analysis.min_hr, 0.2);
        assert_eq!(settings.analysis.min_conf, 0.99);
    }

    #[test]
    fn test_overrides_are_validated() {
        assert!(with_overrides(&valid_settings(), &args(Some(0), None, None)).is_err());
        assert!(with_overrides(&valid_settings(), &args(None, None, Some(1.5))).is_err());
    }
}
