//! Transfer-curve lookup with optional oversampling.
//!
//! Curve lookup follows WaveShaperNode: the curve spans inputs [-1, 1],
//! values in between are linearly interpolated, and inputs outside that
//! range take the end values.
//!
//! Oversampling upsamples by linear interpolation and downsamples by
//! averaging. Both are convex combinations, so the output can never leave
//! the range of the curve itself.

use std::f64::consts::PI;
use std::sync::Arc;

/// Number of points in generated curves.
pub const CURVE_LEN: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oversample {
    None,
    X2,
    X4,
}

impl Oversample {
    pub fn factor(&self) -> usize {
        match self {
            Oversample::None => 1,
            Oversample::X2 => 2,
            Oversample::X4 => 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WaveShaper {
    curve: Option<Arc<[f32]>>,
    oversample: Oversample,
    prev: [f32; 2],
}

impl WaveShaper {
    pub fn new(curve: Option<Arc<[f32]>>, oversample: Oversample) -> Self {
        WaveShaper {
            curve,
            oversample,
            prev: [0.0; 2],
        }
    }

    pub fn set_curve(&mut self, curve: Option<Arc<[f32]>>) {
        self.curve = curve;
    }

    pub fn curve(&self) -> Option<&[f32]> {
        self.curve.as_deref()
    }

    /// Shape one sample on `channel` (0 or 1).
    #[inline]
    pub fn process(&mut self, channel: usize, x: f32) -> f32 {
        let Some(curve) = self.curve.as_deref() else {
            return x;
        };
        let factor = self.oversample.factor();
        if factor == 1 {
            return shape(curve, x);
        }

        let prev = self.prev[channel];
        self.prev[channel] = x;
        let mut sum = 0.0;
        for j in 1..=factor {
            let t = j as f32 / factor as f32;
            sum += shape(curve, prev + (x - prev) * t);
        }
        sum / factor as f32
    }
}

/// Look `x` up in `curve` with linear interpolation.
#[inline]
pub fn shape(curve: &[f32], x: f32) -> f32 {
    match curve.len() {
        0 => return x,
        1 => return curve[0],
        _ => {}
    }
    if x.is_nan() {
        return 0.0;
    }
    let last = curve.len() - 1;
    let v = (x.clamp(-1.0, 1.0) + 1.0) * 0.5 * last as f32;
    let k = (v.floor() as usize).min(last);
    if k == last {
        return curve[last];
    }
    let f = v - k as f32;
    curve[k] + (curve[k + 1] - curve[k]) * f
}

/// Input value represented by curve index `i`.
#[inline]
fn curve_x(i: usize, len: usize) -> f64 {
    i as f64 * 2.0 / (len - 1) as f64 - 1.0
}

/// `y = x` sampled over [-1, 1].
pub fn identity_curve(len: usize) -> Vec<f32> {
    let len = len.max(2);
    (0..len).map(|i| curve_x(i, len) as f32).collect()
}

/// Saturation curve for `drive` in [0, 1].
///
/// Zero drive is the identity; otherwise `y = (3 + k)x / (π + k|x|)` with
/// `k = drive × 100`, which stays within [-1, 1] for inputs in [-1, 1].
pub fn distortion_curve(drive: f64, len: usize) -> Vec<f32> {
    let drive = if drive.is_finite() { drive.clamp(0.0, 1.0) } else { 0.0 };
    if drive == 0.0 {
        return identity_curve(len);
    }
    let len = len.max(2);
    let k = drive * 100.0;
    (0..len)
        .map(|i| {
            let x = curve_x(i, len);
            ((3.0 + k) * x / (PI + k * x.abs())) as f32
        })
        .collect()
}

/// Hard clip at ±`ceiling` (linear amplitude).
pub fn hard_clip_curve(ceiling: f32, len: usize) -> Vec<f32> {
    let len = len.max(2);
    let c = ceiling.abs();
    (0..len)
        .map(|i| (curve_x(i, len) as f32).clamp(-c, c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_drive_is_identity() {
        let curve = distortion_curve(0.0, CURVE_LEN);
        for i in 0..=200 {
            let x = i as f32 / 100.0 - 1.0;
            let y = shape(&curve, x);
            assert!((y - x).abs() < 1e-6, "identity violated at {x}: {y}");
        }
    }

    #[test]
    fn drive_adds_saturation() {
        let soft = distortion_curve(0.1, CURVE_LEN);
        let hard = distortion_curve(1.0, CURVE_LEN);
        // More drive pushes mid-level inputs closer to full scale.
        assert!(shape(&hard, 0.25) > shape(&soft, 0.25));
        for curve in [&soft, &hard] {
            assert!(curve.iter().all(|y| y.abs() <= 1.0 + 1e-6));
            assert!(curve.windows(2).all(|w| w[1] >= w[0]), "curve must be monotonic");
        }
    }

    #[test]
    fn shape_clamps_outside_range() {
        let curve = hard_clip_curve(0.5, 64);
        assert_eq!(shape(&curve, 3.0), 0.5);
        assert_eq!(shape(&curve, -3.0), -0.5);
        assert_eq!(shape(&curve, f32::NAN), 0.0);
    }

    #[test]
    fn oversampled_clip_never_exceeds_ceiling() {
        let ceiling = 0.7;
        let mut ws = WaveShaper::new(
            Some(Arc::from(hard_clip_curve(ceiling, CURVE_LEN))),
            Oversample::X4,
        );
        for i in 0..5000 {
            let x = ((i as f32 * 0.37).sin() * 4.0) + if i % 7 == 0 { 10.0 } else { 0.0 };
            let y = ws.process(0, x);
            assert!(y.abs() <= ceiling + 1e-6, "{y} exceeds {ceiling}");
        }
    }

    #[test]
    fn no_curve_passes_through() {
        let mut ws = WaveShaper::new(None, Oversample::X4);
        assert_eq!(ws.process(1, 1.7), 1.7);
    }
}
