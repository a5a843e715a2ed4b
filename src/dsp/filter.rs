//! Biquad filter — matches WebAudio BiquadFilterNode coefficients.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Filter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
}

impl FilterType {
    pub const ALL: [FilterType; 4] = [
        FilterType::Lowpass,
        FilterType::Highpass,
        FilterType::Bandpass,
        FilterType::Notch,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FilterType::Lowpass => "lowpass",
            FilterType::Highpass => "highpass",
            FilterType::Bandpass => "bandpass",
            FilterType::Notch => "notch",
        }
    }

    pub fn parse(s: &str) -> Option<FilterType> {
        FilterType::ALL.into_iter().find(|t| t.name() == s)
    }
}

/// A stereo biquad IIR filter (2nd order).
///
/// Implements the standard Direct Form II Transposed structure.
/// Coefficient formulas from the Audio EQ Cookbook (Robert Bristow-Johnson).
/// Both channels share coefficients; coefficients are only recomputed when
/// the frequency or Q actually changes between samples.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    pub filter_type: FilterType,

    // Coefficients
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    // State per channel (Direct Form II Transposed)
    z1: [f64; 2],
    z2: [f64; 2],

    sample_rate: f64,
    last_frequency: f64,
    last_q: f64,
}

impl BiquadFilter {
    pub fn new(filter_type: FilterType, sample_rate: f64) -> Self {
        let mut f = BiquadFilter {
            filter_type,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: [0.0; 2],
            z2: [0.0; 2],
            sample_rate,
            last_frequency: f64::NAN,
            last_q: f64::NAN,
        };
        f.set_params(1000.0, 0.707);
        f
    }

    /// Update coefficients for `frequency` (Hz) and `q` if they changed.
    #[inline]
    pub fn set_params(&mut self, frequency: f64, q: f64) {
        if frequency == self.last_frequency && q == self.last_q {
            return;
        }
        self.last_frequency = frequency;
        self.last_q = q;
        self.update_coefficients(frequency, q);
    }

    /// Change the response type; coefficients are recomputed on next use.
    pub fn set_type(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
        self.last_frequency = f64::NAN;
    }

    fn update_coefficients(&mut self, frequency: f64, q: f64) {
        let nyquist = self.sample_rate / 2.0;
        let frequency = frequency.clamp(0.0, nyquist * 0.999);
        let q = q.max(1e-4);
        let w0 = 2.0 * PI * frequency / self.sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q);

        let (b0, b1, b2, a0, a1, a2) = match self.filter_type {
            FilterType::Lowpass => {
                let b1 = 1.0 - cos_w0;
                let b0 = b1 / 2.0;
                (b0, b1, b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
            FilterType::Highpass => {
                let b0 = (1.0 + cos_w0) / 2.0;
                let b1 = -(1.0 + cos_w0);
                (b0, b1, b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
            FilterType::Bandpass => (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha),
            FilterType::Notch => (
                1.0,
                -2.0 * cos_w0,
                1.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };

        // Normalize by a0
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    /// Process a single sample on `channel` (0 or 1).
    #[inline]
    pub fn process(&mut self, channel: usize, input: f64) -> f64 {
        let output = self.b0 * input + self.z1[channel];
        self.z1[channel] = self.b1 * input - self.a1 * output + self.z2[channel];
        self.z2[channel] = self.b2 * input - self.a2 * output;
        output
    }

    /// Reset filter state.
    pub fn reset(&mut self) {
        self.z1 = [0.0; 2];
        self.z2 = [0.0; 2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(f: &mut BiquadFilter, input: f64, n: usize) -> f64 {
        let mut output = 0.0;
        for _ in 0..n {
            output = f.process(0, input);
        }
        output
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 44100.0);
        f.set_params(5000.0, 0.707);
        let output = settle(&mut f, 1.0, 1000);
        assert!((output - 1.0).abs() < 0.001, "Lowpass should pass DC, got {output}");
    }

    #[test]
    fn highpass_blocks_dc() {
        let mut f = BiquadFilter::new(FilterType::Highpass, 44100.0);
        f.set_params(1000.0, 0.707);
        let output = settle(&mut f, 1.0, 1000);
        assert!(output.abs() < 0.001, "Highpass should block DC, got {output}");
    }

    #[test]
    fn notch_passes_dc() {
        let mut f = BiquadFilter::new(FilterType::Notch, 44100.0);
        f.set_params(1000.0, 1.0);
        let output = settle(&mut f, 1.0, 2000);
        assert!((output - 1.0).abs() < 0.001, "Notch should pass DC, got {output}");
    }

    #[test]
    fn lowpass_attenuates_high_freq() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 44100.0);
        f.set_params(200.0, 0.707);

        let freq = 10000.0;
        let mut max_out = 0.0_f64;
        for i in 0..4410 {
            let t = i as f64 / 44100.0;
            let out = f.process(0, (2.0 * PI * freq * t).sin());
            if i > 1000 {
                max_out = max_out.max(out.abs());
            }
        }
        assert!(
            max_out < 0.01,
            "Lowpass@200Hz should strongly attenuate 10kHz, got amplitude {max_out}"
        );
    }

    #[test]
    fn channels_are_independent() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 44100.0);
        f.set_params(500.0, 0.707);
        for _ in 0..100 {
            f.process(0, 1.0);
        }
        let right = f.process(1, 0.0);
        assert_eq!(right, 0.0);
    }

    #[test]
    fn output_finite_at_extremes() {
        for ty in FilterType::ALL {
            let mut f = BiquadFilter::new(ty, 44100.0);
            for (freq, q) in [(0.0, 0.0), (30000.0, 50.0), (20.0, 0.0001)] {
                f.set_params(freq, q);
                for i in 0..2000 {
                    let input = if i % 100 == 0 { 1.0 } else { 0.0 };
                    let out = f.process(0, input);
                    assert!(out.is_finite(), "{ty:?} output not finite at {freq}Hz q={q}");
                }
                f.reset();
            }
        }
    }
}
