//! Harmonic ratio of a segment
//!
//! The segment is band-passed to 1-600 Hz, cut into one-second Hamming
//! windowed frames with a 100 ms hop, and each frame is scored by the peak of
//! its normalized autocorrelation between the first zero crossing and a
//! 16 ms lag. A sustained engine tone scores close to 1, broadband noise and
//! silence close to 0.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::filter::SosFilter;
use crate::error::Result;

const FILTER_ORDER: usize = 18;
const BAND_HZ: (f64, f64) = (1.0, 600.0);
const FRAME_SECS: f64 = 1.0;
const HOP_SECS: f64 = 0.1;
const MAX_LAG_SECS: f64 = 0.016;
/// Frames crossing zero more often than this are treated as unvoiced
const MAX_ZCR: f64 = 0.15;
/// Ratios below this are reported as 0
const MIN_RATIO: f64 = 0.1;

/// Harmonic ratio analyzer for one sample rate
///
/// Immutable once built, so one instance can score segments from several
/// threads at once.
pub struct HarmonicRatio {
    filter: SosFilter,
    frame_len: usize,
    hop_len: usize,
    max_lag: usize,
    window: Vec<f64>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    fft_len: usize,
}

impl std::fmt::Debug for HarmonicRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarmonicRatio")
            .field("frame_len", &self.frame_len)
            .field("hop_len", &self.hop_len)
            .field("max_lag", &self.max_lag)
            .finish_non_exhaustive()
    }
}

impl HarmonicRatio {
    pub fn new(sample_rate: u32) -> Result<Self> {
        let filter = SosFilter::butterworth_bandpass(FILTER_ORDER, BAND_HZ.0, BAND_HZ.1, sample_rate)?;
        let fs = f64::from(sample_rate);

        let frame_len = ((FRAME_SECS * fs) as usize).max(2);
        let hop_len = ((HOP_SECS * fs) as usize).max(1);
        let max_lag = ((MAX_LAG_SECS * fs).round() as usize).saturating_sub(1).max(1);

        let fft_len = (2 * frame_len).next_power_of_two();
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        Ok(Self {
            filter,
            frame_len,
            hop_len,
            max_lag,
            window: hamming(frame_len),
            forward,
            inverse,
            fft_len,
        })
    }

    /// Mean frame harmonic ratio of `samples`, in `[0, 1]`
    pub fn segment_ratio(&self, samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let input: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
        let filtered = self.filter.apply(&input);

        let ratios: Vec<f64> = self
            .frame_starts(filtered.len())
            .map(|start| {
                let end = (start + self.frame_len).min(filtered.len());
                let frame: Vec<f64> = filtered[start..end]
                    .iter()
                    .zip(&self.window)
                    .map(|(x, w)| x * w)
                    .collect();
                self.frame_ratio(&frame)
            })
            .collect();

        if ratios.is_empty() {
            return 0.0;
        }
        (ratios.iter().sum::<f64>() / ratios.len() as f64) as f32
    }

    fn frame_starts(&self, len: usize) -> impl Iterator<Item = usize> + use<> {
        let count = if len <= self.frame_len {
            1
        } else {
            1 + (len - self.frame_len) / self.hop_len
        };
        let hop = self.hop_len;
        (0..count).map(move |i| i * hop)
    }

    fn frame_ratio(&self, frame: &[f64]) -> f64 {
        if frame.len() < 2 || zero_crossing_rate(frame) > MAX_ZCR {
            return 0.0;
        }

        let max_lag = self.max_lag.min(frame.len() - 1);
        let r = self.autocorrelation(frame, max_lag);
        let energy = r[0];
        if energy <= f64::EPSILON {
            return 0.0;
        }

        let Some(first_crossing) = (1..=max_lag).find(|&k| r[k] <= 0.0) else {
            return 0.0;
        };

        // Energy of the first `len - k` samples, the part overlapping at lag k
        let mut tail = 0.0;
        let mut best: f64 = 0.0;
        for k in 1..=max_lag {
            tail += frame[frame.len() - k] * frame[frame.len() - k];
            if k < first_crossing {
                continue;
            }
            let overlap = (energy - tail).max(0.0);
            let gamma = r[k] / ((energy * overlap).sqrt() + f64::EPSILON);
            best = best.max(gamma);
        }

        let ratio = best.clamp(0.0, 1.0);
        if ratio < MIN_RATIO { 0.0 } else { ratio }
    }

    /// Autocorrelation for lags `0..=max_lag`
    fn autocorrelation(&self, frame: &[f64], max_lag: usize) -> Vec<f64> {
        let mut buffer: Vec<Complex<f64>> = frame
            .iter()
            .map(|&x| Complex::new(x, 0.0))
            .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
            .take(self.fft_len)
            .collect();

        self.forward.process(&mut buffer);
        for value in &mut buffer {
            *value = Complex::new(value.norm_sqr(), 0.0);
        }
        self.inverse.process(&mut buffer);

        let scale = self.fft_len as f64;
        buffer[..=max_lag].iter().map(|c| c.re / scale).collect()
    }
}

/// Fraction of adjacent sample pairs that change sign
pub fn zero_crossing_rate(frame: &[f64]) -> f64 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings: f64 = frame
        .windows(2)
        .map(|w| (sign(w[1]) - sign(w[0])).abs() / 2.0)
        .sum();
    crossings / (frame.len() - 1) as f64
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Periodic Hamming window
fn hamming(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 0.54 - 0.46 * (2.0 * std::f64::consts::PI * i as f64 / len as f64).cos())
        .collect()
}
