//! Segment scores and detection filtering

use crate::model;

/// Model output and harmonic ratio for one segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentScore {
    /// Class probabilities (exp of the model's log-probabilities)
    pub probabilities: Vec<f32>,
    /// 0 unless the top probability reached the harmonic-ratio threshold
    pub hr: f32,
}

impl SegmentScore {
    /// Top class and its probability
    pub fn best(&self) -> Option<(usize, f32)> {
        model::best_class(&self.probabilities)
    }
}

/// One row of a results file
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub start: f32,
    pub end: f32,
    pub label: usize,
    pub confidence: f32,
    pub hr: f32,
}

/// Keep segments whose label is not background, with `hr > min_hr` and `confidence > min_conf`
pub fn select_detections(
    scores: &[SegmentScore],
    segment_secs: f32,
    min_hr: f32,
    min_conf: f32,
) -> Vec<Detection> {
    scores
        .iter()
        .enumerate()
        .filter_map(|(index, score)| {
            let (label, confidence) = score.best()?;
            let keep = label != 0 && score.hr > min_hr && confidence > min_conf;
            keep.then(|| Detection {
                start: index as f32 * segment_secs,
                end: (index + 1) as f32 * segment_secs,
                label,
                confidence,
                hr: score.hr,
            })
        })
        .collect()
}
