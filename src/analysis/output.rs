//! Results file naming and CSV output

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::detection::Detection;
use crate::error::{self, Result};

pub const CSV_HEADER: &str = "start_detection,end_detection,label,confidence,hr";

/// Suffix appended to the input stem
const OUTPUT_SUFFIX: &str = "_ANALYZED.csv";

/// `<dir of input>/<results_dir_name>/<stem>_ANALYZED.csv`
///
/// Only the last extension is stripped, so `site.2024.wav` gives
/// `site.2024_ANALYZED.csv`.
pub fn output_path(input: &Path, results_dir_name: &str) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| error::fs::not_found(input.display().to_string()))?;
    let parent = input.parent().unwrap_or_else(|| Path::new(""));

    let mut name = stem.to_os_string();
    name.push(OUTPUT_SUFFIX);
    Ok(parent.join(results_dir_name).join(name))
}

/// Render detections as CSV, header included
pub fn render_csv(detections: &[Detection]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + detections.len() * 32);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for d in detections {
        let _ = writeln!(out, "{},{},{},{},{}", d.start, d.end, d.label, d.confidence, d.hr);
    }
    out
}

/// Write `detections` to `path`, creating its directory
///
/// The file appears only once complete, so an interrupted run never leaves
/// a results file that a rerun would skip.
pub fn write_csv(path: &Path, detections: &[Detection]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| error::fs::write_failed(dir.display().to_string(), e.to_string()))?;
    }

    let tmp = path.with_extension("csv.partial");
    std::fs::write(&tmp, render_csv(detections))
        .map_err(|e| error::fs::write_failed(tmp.display().to_string(), e.to_string()))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| error::fs::write_failed(path.display().to_string(), e.to_string()))
}
