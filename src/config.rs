//! Engine configuration.
//!
//! Every field has a default, so hosts only pass what they want to change:
//!
//! ```
//! use subsynth_core::config::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{ "sampleRate": 48000 }"#).unwrap();
//! assert_eq!(config.sample_rate, 48000.0);
//! assert_eq!(config.safety_timeout, 60.0);
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Hz.
    pub sample_rate: f64,
    /// Seconds after which a held note is released even without note-off.
    pub safety_timeout: f64,
    /// Extra time after a release ends before the voice's nodes are freed.
    pub cleanup_margin: f64,
    /// Ramp time for master/effect gain changes, seconds.
    pub gain_ramp: f64,
    /// Length of the shared looping noise buffer, seconds.
    pub noise_seconds: f64,
    /// Length of the synthetic reverb impulse response, seconds.
    pub reverb_seconds: f64,
    /// Samples kept by the analyser tap.
    pub analyser_size: usize,
    /// Longest echo delay time, seconds.
    pub max_delay: f64,
    /// Seed for the noise buffer and impulse response.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: 44100.0,
            safety_timeout: 60.0,
            cleanup_margin: 0.1,
            gain_ramp: 0.01,
            noise_seconds: 2.0,
            reverb_seconds: 2.0,
            analyser_size: 2048,
            max_delay: 2.0,
            seed: 0x5EED,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_sample_rate(sample_rate: f64) -> Self {
        EngineConfig {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sample_rate.is_finite() || !(1000.0..=768_000.0).contains(&self.sample_rate) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        let positive = [
            ("safetyTimeout", self.safety_timeout),
            ("noiseSeconds", self.noise_seconds),
            ("reverbSeconds", self.reverb_seconds),
            ("maxDelay", self.max_delay),
        ];
        let non_negative = [("cleanupMargin", self.cleanup_margin), ("gainRamp", self.gain_ramp)];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        if self.analyser_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analyserSize",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Seconds to frames, rounded up.
    pub fn frames(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate).ceil() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = EngineConfig::from_json(r#"{"cleanupMargin": 0.25, "analyserSize": 512}"#).unwrap();
        assert_eq!(c.cleanup_margin, 0.25);
        assert_eq!(c.analyser_size, 512);
        assert_eq!(c.sample_rate, 44100.0);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"sampleRate": 0}"#),
            Err(ConfigError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"reverbSeconds": -1}"#),
            Err(ConfigError::InvalidValue {
                field: "reverbSeconds",
                ..
            })
        ));
        assert!(matches!(EngineConfig::from_json("{"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn frames_round_up() {
        let c = EngineConfig::with_sample_rate(1000.0);
        assert_eq!(c.frames(0.0105), 11);
        assert_eq!(c.frames(-1.0), 0);
    }
}
