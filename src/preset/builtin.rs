//! Factory presets.

use super::snapshot::ParameterSnapshot;
use crate::dsp::filter::FilterType;
use crate::dsp::oscillator::Waveform;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bass,
    Lead,
    Pad,
    Fx,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Bass, Category::Lead, Category::Pad, Category::Fx];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Bass => "Bass",
            Category::Lead => "Lead",
            Category::Pad => "Pad",
            Category::Fx => "FX",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltinPreset {
    pub name: &'static str,
    pub category: Category,
    pub settings: ParameterSnapshot,
}

fn preset(name: &'static str, category: Category, settings: ParameterSnapshot) -> BuiltinPreset {
    BuiltinPreset {
        name,
        category,
        settings,
    }
}

/// All factory presets, grouped by category in display order.
pub fn builtin_presets() -> Vec<BuiltinPreset> {
    let base = ParameterSnapshot::default;
    vec![
        preset(
            "Sub Bass",
            Category::Bass,
            ParameterSnapshot {
                osc1_waveform: Waveform::Sine,
                osc1_level: 90.0,
                osc2_waveform: Waveform::Triangle,
                osc2_detune: 0.0,
                osc2_level: 40.0,
                octave: 2,
                filter_cutoff: 400.0,
                filter_resonance: 0.7,
                amp_attack: 0.005,
                amp_decay: 0.2,
                amp_sustain: 90.0,
                amp_release: 0.15,
                ..base()
            },
        ),
        preset(
            "Acid Bass",
            Category::Bass,
            ParameterSnapshot {
                osc1_waveform: Waveform::Sawtooth,
                osc1_level: 80.0,
                osc2_level: 0.0,
                octave: 2,
                filter_cutoff: 300.0,
                filter_resonance: 12.0,
                filter_env_amount: 2500.0,
                filter_attack: 0.01,
                filter_decay: 0.25,
                amp_attack: 0.002,
                amp_decay: 0.3,
                amp_sustain: 60.0,
                amp_release: 0.1,
                distortion_drive: 35.0,
                ..base()
            },
        ),
        preset(
            "Pluck Bass",
            Category::Bass,
            ParameterSnapshot {
                osc1_waveform: Waveform::Square,
                osc1_level: 70.0,
                osc2_waveform: Waveform::Sawtooth,
                osc2_detune: 5.0,
                osc2_level: 50.0,
                octave: 2,
                filter_cutoff: 600.0,
                filter_resonance: 4.0,
                filter_env_amount: 1800.0,
                filter_attack: 0.0,
                filter_decay: 0.15,
                amp_attack: 0.001,
                amp_decay: 0.25,
                amp_sustain: 0.0,
                amp_release: 0.1,
                ..base()
            },
        ),
        preset(
            "Supersaw Lead",
            Category::Lead,
            ParameterSnapshot {
                osc1_waveform: Waveform::Sawtooth,
                osc1_detune: -12.0,
                osc1_level: 70.0,
                osc2_waveform: Waveform::Sawtooth,
                osc2_detune: 12.0,
                osc2_level: 70.0,
                octave: 4,
                filter_cutoff: 6000.0,
                filter_resonance: 1.5,
                chorus_depth: 40.0,
                chorus_rate: 0.8,
                delay_mix: 20.0,
                delay_time: 0.375,
                delay_feedback: 35.0,
                reverb_mix: 20.0,
                ..base()
            },
        ),
        preset(
            "Square Lead",
            Category::Lead,
            ParameterSnapshot {
                osc1_waveform: Waveform::Square,
                osc1_level: 80.0,
                osc2_waveform: Waveform::Square,
                osc2_detune: 1200.0,
                osc2_level: 25.0,
                filter_cutoff: 3500.0,
                filter_resonance: 2.0,
                lfo_rate: 5.5,
                lfo_pitch_depth: 15.0,
                amp_attack: 0.01,
                amp_sustain: 80.0,
                amp_release: 0.2,
                delay_mix: 15.0,
                ..base()
            },
        ),
        preset(
            "Screamer",
            Category::Lead,
            ParameterSnapshot {
                osc1_waveform: Waveform::Sawtooth,
                osc1_level: 80.0,
                osc2_waveform: Waveform::Square,
                osc2_detune: 7.0,
                osc2_level: 60.0,
                filter_type: FilterType::Bandpass,
                filter_cutoff: 1800.0,
                filter_resonance: 6.0,
                filter_env_amount: 1200.0,
                filter_attack: 0.05,
                filter_decay: 0.4,
                distortion_drive: 70.0,
                limiter_gain: 3.0,
                ..base()
            },
        ),
        preset(
            "Warm Pad",
            Category::Pad,
            ParameterSnapshot {
                osc1_waveform: Waveform::Sawtooth,
                osc1_detune: -8.0,
                osc1_level: 50.0,
                osc2_waveform: Waveform::Triangle,
                osc2_detune: 8.0,
                osc2_level: 60.0,
                filter_cutoff: 1200.0,
                filter_resonance: 0.8,
                amp_attack: 0.8,
                amp_decay: 1.0,
                amp_sustain: 80.0,
                amp_release: 1.5,
                lfo_rate: 0.3,
                lfo_filter_depth: 300.0,
                chorus_depth: 60.0,
                chorus_rate: 0.5,
                reverb_mix: 45.0,
                ..base()
            },
        ),
        preset(
            "Glass Pad",
            Category::Pad,
            ParameterSnapshot {
                osc1_waveform: Waveform::Sine,
                osc1_level: 60.0,
                osc2_waveform: Waveform::Triangle,
                osc2_detune: 702.0,
                osc2_level: 30.0,
                octave: 5,
                filter_type: FilterType::Highpass,
                filter_cutoff: 250.0,
                amp_attack: 1.2,
                amp_decay: 0.5,
                amp_sustain: 70.0,
                amp_release: 2.5,
                flanger_depth: 30.0,
                flanger_rate: 0.2,
                flanger_feedback: 40.0,
                reverb_mix: 60.0,
                ..base()
            },
        ),
        preset(
            "Tremolo Strings",
            Category::Pad,
            ParameterSnapshot {
                osc1_waveform: Waveform::Sawtooth,
                osc1_level: 60.0,
                osc2_waveform: Waveform::Sawtooth,
                osc2_detune: 6.0,
                osc2_level: 60.0,
                filter_cutoff: 2500.0,
                amp_attack: 0.3,
                amp_sustain: 85.0,
                amp_release: 0.9,
                lfo_rate: 6.0,
                lfo_amp_depth: 25.0,
                reverb_mix: 35.0,
                ..base()
            },
        ),
        preset(
            "Wind",
            Category::Fx,
            ParameterSnapshot {
                osc1_level: 0.0,
                osc2_level: 0.0,
                noise_level: 80.0,
                filter_type: FilterType::Bandpass,
                filter_cutoff: 900.0,
                filter_resonance: 3.0,
                lfo_rate: 0.2,
                lfo_filter_depth: 700.0,
                amp_attack: 1.5,
                amp_sustain: 100.0,
                amp_release: 2.0,
                reverb_mix: 50.0,
                ..base()
            },
        ),
        preset(
            "Laser Zap",
            Category::Fx,
            ParameterSnapshot {
                osc1_waveform: Waveform::Square,
                osc1_level: 80.0,
                osc2_level: 0.0,
                octave: 6,
                filter_cutoff: 8000.0,
                filter_env_amount: -7500.0,
                filter_attack: 0.0,
                filter_decay: 0.3,
                lfo_waveform: Waveform::Sawtooth,
                lfo_rate: 12.0,
                lfo_pitch_depth: 100.0,
                amp_attack: 0.001,
                amp_decay: 0.3,
                amp_sustain: 0.0,
                amp_release: 0.05,
                delay_mix: 30.0,
                delay_time: 0.12,
                delay_feedback: 50.0,
                ..base()
            },
        ),
        preset(
            "Jet Sweep",
            Category::Fx,
            ParameterSnapshot {
                osc1_waveform: Waveform::Sawtooth,
                osc1_level: 40.0,
                osc2_level: 0.0,
                noise_level: 50.0,
                filter_cutoff: 5000.0,
                flanger_depth: 90.0,
                flanger_rate: 0.1,
                flanger_feedback: 85.0,
                amp_attack: 0.5,
                amp_sustain: 90.0,
                amp_release: 1.5,
                ..base()
            },
        ),
    ]
}
