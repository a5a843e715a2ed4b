//! Compressor — dynamics processing for audio leveling.
//!
//! Implements a feed-forward compressor with threshold, ratio, knee,
//! attack, and release parameters matching the WebAudio DynamicsCompressorNode.

/// Static compressor configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorSettings {
    /// Threshold in dB (typical: -50 to 0).
    pub threshold: f64,
    /// Compression ratio (e.g., 4.0 = 4:1 compression).
    pub ratio: f64,
    /// Knee width in dB (0 = hard knee, higher = softer transition).
    pub knee: f64,
    /// Attack time in seconds.
    pub attack: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            threshold: -24.0,
            ratio: 4.0,
            knee: 6.0,
            attack: 0.003,
            release: 0.25,
        }
    }
}

impl CompressorSettings {
    /// Clamp every field into the range the DynamicsCompressorNode accepts.
    pub fn clamped(self) -> Self {
        Self {
            threshold: self.threshold.clamp(-100.0, 0.0),
            ratio: self.ratio.clamp(1.0, 20.0),
            knee: self.knee.clamp(0.0, 40.0),
            attack: self.attack.clamp(0.0001, 1.0),
            release: self.release.clamp(0.001, 5.0),
        }
    }
}

/// A stereo-linked dynamics compressor.
#[derive(Debug, Clone)]
pub struct Compressor {
    sample_rate: f64,
    settings: CompressorSettings,
    attack_coef: f64,
    release_coef: f64,
    envelope: f64, // Current envelope level (linear)
}

impl Compressor {
    pub fn new(sample_rate: f64, settings: CompressorSettings) -> Self {
        let mut c = Self {
            sample_rate,
            settings: CompressorSettings::default(),
            attack_coef: 0.0,
            release_coef: 0.0,
            envelope: 0.0,
        };
        c.configure(settings);
        c
    }

    pub fn settings(&self) -> CompressorSettings {
        self.settings
    }

    /// Replace the settings, keeping the current envelope.
    pub fn configure(&mut self, settings: CompressorSettings) {
        self.settings = settings.clamped();
        self.attack_coef = (-1.0 / (self.settings.attack * self.sample_rate)).exp();
        self.release_coef = (-1.0 / (self.settings.release * self.sample_rate)).exp();
    }

    /// Convert linear amplitude to dB.
    #[inline]
    pub fn linear_to_db(linear: f64) -> f64 {
        if linear <= 0.0 {
            -120.0
        } else {
            20.0 * linear.log10()
        }
    }

    /// Convert dB to linear amplitude.
    #[inline]
    pub fn db_to_linear(db: f64) -> f64 {
        10.0_f64.powf(db / 20.0)
    }

    /// Compute gain reduction for a given input level (in dB).
    #[inline]
    fn compute_gain(&self, input_db: f64) -> f64 {
        let CompressorSettings {
            threshold,
            ratio,
            knee,
            ..
        } = self.settings;

        if knee <= 0.0 {
            if input_db <= threshold {
                0.0
            } else {
                (threshold - input_db) * (1.0 - 1.0 / ratio)
            }
        } else {
            let half_knee = knee / 2.0;
            let knee_start = threshold - half_knee;
            let knee_end = threshold + half_knee;

            if input_db <= knee_start {
                0.0
            } else if input_db >= knee_end {
                (threshold - input_db) * (1.0 - 1.0 / ratio)
            } else {
                // In the knee region - quadratic interpolation
                let x = input_db - knee_start;
                let knee_factor = x / knee;
                -knee_factor * knee_factor * (1.0 - 1.0 / ratio) * half_knee
            }
        }
    }

    /// Process a stereo sample pair.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let input_level = (left.abs()).max(right.abs()) as f64;

        // Peak envelope follower
        let coef = if input_level > self.envelope {
            self.attack_coef
        } else {
            self.release_coef
        };
        self.envelope = coef * self.envelope + (1.0 - coef) * input_level;

        let gain_reduction_db = self.compute_gain(Self::linear_to_db(self.envelope));
        let gain = Self::db_to_linear(gain_reduction_db) as f32;

        (left * gain, right * gain)
    }

    /// Reset the compressor state.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    /// Current gain reduction in dB (for metering).
    pub fn gain_reduction(&self) -> f64 {
        -self.compute_gain(Self::linear_to_db(self.envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(threshold: f64, ratio: f64, attack: f64, release: f64) -> CompressorSettings {
        CompressorSettings {
            threshold,
            ratio,
            knee: 6.0,
            attack,
            release,
        }
    }

    #[test]
    fn test_compressor_passthrough_below_threshold() {
        let mut comp = Compressor::new(44100.0, settings(-20.0, 4.0, 0.001, 0.1));

        for _ in 0..1000 {
            comp.process(0.05, 0.05); // -26 dB, below -20 threshold
        }

        let (out_l, out_r) = comp.process(0.05, 0.05);
        assert!(
            (out_l - 0.05).abs() < 0.01,
            "Below threshold, output should be close to input: got {out_l}"
        );
        assert!((out_r - 0.05).abs() < 0.01);
    }

    #[test]
    fn test_compressor_reduces_loud_signals() {
        let mut comp = Compressor::new(44100.0, settings(-12.0, 4.0, 0.001, 0.1));

        for _ in 0..5000 {
            comp.process(1.0, 1.0);
        }
        let (out_l, _) = comp.process(1.0, 1.0);

        // 4:1 ratio at 12dB above threshold should reduce by 9dB
        assert!(out_l < 0.5, "Compressor should reduce loud signals: got {out_l}");
        assert!(out_l > 0.1, "Compressor should not over-compress: got {out_l}");
        assert!((comp.gain_reduction() - 9.0).abs() < 0.5);
    }

    #[test]
    fn test_compressor_attack_time() {
        let mut comp = Compressor::new(44100.0, settings(-20.0, 10.0, 0.01, 0.5));

        let (first, _) = comp.process(1.0, 1.0);
        for _ in 0..500 {
            comp.process(1.0, 1.0);
        }
        let (later, _) = comp.process(1.0, 1.0);

        assert!(
            first > later,
            "First sample should be louder than after attack: first={first}, later={later}"
        );
    }

    #[test]
    fn test_compressor_release_time() {
        let mut comp = Compressor::new(44100.0, settings(-20.0, 10.0, 0.001, 0.05));

        for _ in 0..1000 {
            comp.process(1.0, 1.0);
        }
        let (compressed, _) = comp.process(0.1, 0.1);
        for _ in 0..5000 {
            comp.process(0.1, 0.1);
        }
        let (released, _) = comp.process(0.1, 0.1);

        assert!(
            released > compressed,
            "After release, gain should recover: compressed={compressed}, released={released}"
        );
    }

    #[test]
    fn hard_knee_limiter_settings() {
        let mut comp = Compressor::new(
            44100.0,
            CompressorSettings {
                threshold: -1.0,
                ratio: 20.0,
                knee: 0.0,
                attack: 0.001,
                release: 0.1,
            },
        );
        for _ in 0..10_000 {
            comp.process(2.0, 2.0);
        }
        let (out, _) = comp.process(2.0, 2.0);
        // +6 dB in, 7 dB over threshold, 20:1 leaves ~0.35 dB over.
        let out_db = Compressor::linear_to_db(out as f64);
        assert!((out_db - (-0.65)).abs() < 0.2, "got {out_db} dB");
    }
}
