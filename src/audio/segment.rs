//! Fixed-length segmentation

use std::borrow::Cow;

/// Number of samples in a segment of `secs` seconds
pub fn segment_len(sample_rate: u32, secs: f32) -> usize {
    ((f64::from(sample_rate) * f64::from(secs)).round() as usize).max(1)
}

/// Split `samples` into windows of `len` samples
///
/// Full windows borrow from `samples`; only the last partial window is
/// copied, zero-padded to `len`.
pub fn split_segments(samples: &[f32], len: usize) -> Vec<Cow<'_, [f32]>> {
    let len = len.max(1);
    samples
        .chunks(len)
        .map(|chunk| {
            if chunk.len() == len {
                Cow::Borrowed(chunk)
            } else {
                let mut segment = chunk.to_vec();
                segment.resize(len, 0.0);
                Cow::Owned(segment)
            }
        })
        .collect()
}
