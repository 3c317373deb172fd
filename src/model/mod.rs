//! Segment classifier
//!
//! The classifier maps one mono segment at the model sample rate to
//! per-class log-probabilities. Class 0 is the background soundscape; every
//! other class is a detection candidate.

mod onnx;

use crate::error::Result;

pub use onnx::OnnxClassifier;

/// Scores one audio segment
pub trait Classifier {
    /// Per-class log-probabilities for `samples`
    fn classify(&mut self, samples: &[f32]) -> Result<Vec<f32>>;
}

/// Class probabilities from log-probabilities
pub fn probabilities(log_probs: &[f32]) -> Vec<f32> {
    log_probs.iter().map(|lp| lp.exp()).collect()
}

/// Index and value of the most probable class; ties resolve to the lowest index
pub fn best_class(probs: &[f32]) -> Option<(usize, f32)> {
    probs
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, p)| match best {
            Some((_, bp)) if bp >= p => best,
            _ => Some((i, p)),
        })
}
