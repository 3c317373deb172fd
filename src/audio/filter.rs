//! Butterworth band-pass filter as cascaded second-order sections
//!
//! The analog low-pass prototype is transformed to a band-pass around the
//! prewarped band edges and mapped to the z-plane with the bilinear
//! transform. Every section has its zeros at z = 1 and z = -1 and is scaled
//! to unity gain at the geometric centre of the band.

use rustfft::num_complex::Complex;

use crate::error::{self, Result};

type C64 = Complex<f64>;

/// One biquad, `a[0]` is always 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Section {
    fn response(&self, omega: f64) -> C64 {
        let z1 = C64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        (self.b[0] + z1 * self.b[1] + z2 * self.b[2]) / (self.a[0] + z1 * self.a[1] + z2 * self.a[2])
    }
}

#[derive(Debug, Clone)]
pub struct SosFilter {
    sections: Vec<Section>,
    sample_rate: f64,
}

impl SosFilter {
    /// Design an order-`order` Butterworth band-pass for `low_hz..high_hz`
    ///
    /// The resulting filter has `order` sections (band-pass order `2 * order`).
    pub fn butterworth_bandpass(order: usize, low_hz: f64, high_hz: f64, sample_rate: u32) -> Result<Self> {
        let fs = f64::from(sample_rate);
        if order == 0 || !(0.0 < low_hz && low_hz < high_hz && high_hz < fs / 2.0) {
            return Err(error::config::invalid(format!(
                "cannot design a band-pass of order {order} for {low_hz}-{high_hz} Hz at {sample_rate} Hz"
            )));
        }

        let prewarp = |hz: f64| 2.0 * fs * (std::f64::consts::PI * hz / fs).tan();
        let (w_low, w_high) = (prewarp(low_hz), prewarp(high_hz));
        let bandwidth = w_high - w_low;
        let w0_sq = w_low * w_high;
        let centre = 2.0 * (w0_sq.sqrt() / (2.0 * fs)).atan();

        let bilinear = |s: C64| (2.0 * fs + s) / (2.0 * fs - s);

        // Band-pass roots s^2 - p*bw*s + w0^2 = 0 for one prototype pole
        let bandpass_roots = |p: C64| {
            let pb = p * bandwidth;
            let disc = (pb * pb - 4.0 * w0_sq).sqrt();
            ((pb + disc) / 2.0, (pb - disc) / 2.0)
        };

        let mut sections = Vec::with_capacity(order);
        let n = order as f64;

        // Upper-half prototype poles; each stands for a conjugate pair
        for k in 0..order / 2 {
            let theta = std::f64::consts::PI * (2.0 * k as f64 + n + 1.0) / (2.0 * n);
            let (s1, s2) = bandpass_roots(C64::from_polar(1.0, theta));
            for s in [s1, s2] {
                let z = bilinear(s);
                sections.push(section(z, z.conj()));
            }
        }

        // Odd orders keep the real prototype pole at -1
        if order % 2 == 1 {
            let (s1, s2) = bandpass_roots(C64::new(-1.0, 0.0));
            sections.push(section(bilinear(s1), bilinear(s2)));
        }

        for section in &mut sections {
            let gain = section.response(centre).norm();
            if gain > 0.0 {
                for b in &mut section.b {
                    *b /= gain;
                }
            }
        }

        Ok(Self { sections, sample_rate: fs })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Magnitude response at `hz`
    pub fn magnitude(&self, hz: f64) -> f64 {
        let omega = 2.0 * std::f64::consts::PI * hz / self.sample_rate;
        self.sections
            .iter()
            .map(|s| s.response(omega))
            .fold(C64::new(1.0, 0.0), |acc, h| acc * h)
            .norm()
    }

    /// Filter `input` forward, starting from rest
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        let mut signal = input.to_vec();
        for section in &self.sections {
            // Transposed direct form II
            let (mut d1, mut d2) = (0.0, 0.0);
            for x in &mut signal {
                let y = section.b[0] * *x + d1;
                d1 = section.b[1] * *x - section.a[1] * y + d2;
                d2 = section.b[2] * *x - section.a[2] * y;
                *x = y;
            }
        }
        signal
    }
}

/// Biquad with zeros at z = 1 and z = -1 and poles `z1`, `z2`
fn section(z1: C64, z2: C64) -> Section {
    Section {
        b: [1.0, 0.0, -1.0],
        a: [1.0, -(z1 + z2).re, (z1 * z2).re],
    }
}
