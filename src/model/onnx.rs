//! ONNX Runtime classifier
//!
//! Input is a `[1, n]` float tensor of raw samples; the first output holds
//! the log-probabilities. `Session::run` needs `&mut self`, so a classifier
//! is driven from a single thread.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;

use super::Classifier;
use crate::error::{self, Result};

pub struct OnnxClassifier {
    session: Session,
    input_name: String,
    path: PathBuf,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("path", &self.path)
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl OnnxClassifier {
    pub fn load(path: &Path, input_name: &str, intra_threads: usize) -> Result<Self> {
        if !path.is_file() {
            return Err(error::analysis::model_load_failed(
                path.display().to_string(),
                "model file not found",
            ));
        }

        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(intra_threads.max(1)))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| error::analysis::model_load_failed(path.display().to_string(), e.to_string()))?;

        tracing::info!(model = %path.display(), "Model loaded");

        Ok(Self {
            session,
            input_name: input_name.to_string(),
            path: path.to_path_buf(),
        })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&mut self, samples: &[f32]) -> Result<Vec<f32>> {
        let input = Array2::from_shape_vec((1, samples.len()), samples.to_vec())
            .map_err(|e| error::analysis::inference_failed(format!("input shape: {e}")))?;
        let tensor = Tensor::from_array(input)
            .map_err(|e| error::analysis::inference_failed(format!("tensor creation: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| error::analysis::inference_failed(e.to_string()))?;

        let (_, value) = outputs
            .iter()
            .next()
            .ok_or_else(|| error::analysis::inference_failed("model produced no output"))?;
        let (_shape, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| error::analysis::inference_failed(format!("output extraction: {e}")))?;

        Ok(data.to_vec())
    }
}
