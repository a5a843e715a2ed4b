use crate::dsp::filter::FilterType;
use crate::dsp::oscillator::Waveform;
use crate::params::{ParamTarget, ParameterModel};
use serde::{Deserialize, Serialize};

/// Persisted form of a [`ParameterModel`].
///
/// A flat camelCase record. Levels, depths, mixes and feedback amounts are
/// stored as percentages (0–100); rates, times and frequencies keep their
/// natural units. Missing fields take the default patch's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParameterSnapshot {
    pub osc1_waveform: Waveform,
    pub osc1_detune: f64,
    pub osc1_level: f64,
    pub osc2_waveform: Waveform,
    pub osc2_detune: f64,
    pub osc2_level: f64,
    pub noise_level: f64,
    pub octave: i32,
    pub filter_type: FilterType,
    pub filter_cutoff: f64,
    pub filter_resonance: f64,
    pub filter_env_amount: f64,
    pub filter_attack: f64,
    pub filter_decay: f64,
    pub amp_attack: f64,
    pub amp_decay: f64,
    pub amp_sustain: f64,
    pub amp_release: f64,
    pub lfo_waveform: Waveform,
    pub lfo_rate: f64,
    pub lfo_pitch_depth: f64,
    pub lfo_filter_depth: f64,
    pub lfo_amp_depth: f64,
    pub delay_time: f64,
    pub delay_feedback: f64,
    pub delay_mix: f64,
    pub reverb_mix: f64,
    pub distortion_drive: f64,
    pub chorus_rate: f64,
    pub chorus_depth: f64,
    pub flanger_rate: f64,
    pub flanger_depth: f64,
    pub flanger_feedback: f64,
    pub master_volume: f64,
    pub limiter_gain: f64,
    pub limiter_ceiling: f64,
    pub limiter_lookahead: f64,
    pub limiter_release: f64,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        ParameterSnapshot::from_model(&ParameterModel::default())
    }
}

impl ParameterSnapshot {
    /// Persisted value of a numeric field (percent where applicable).
    pub fn field(&self, target: ParamTarget) -> f64 {
        use ParamTarget::*;
        match target {
            Osc1Detune => self.osc1_detune,
            Osc1Level => self.osc1_level,
            Osc2Detune => self.osc2_detune,
            Osc2Level => self.osc2_level,
            NoiseLevel => self.noise_level,
            Octave => self.octave as f64,
            FilterCutoff => self.filter_cutoff,
            FilterResonance => self.filter_resonance,
            FilterEnvAmount => self.filter_env_amount,
            FilterAttack => self.filter_attack,
            FilterDecay => self.filter_decay,
            AmpAttack => self.amp_attack,
            AmpDecay => self.amp_decay,
            AmpSustain => self.amp_sustain,
            AmpRelease => self.amp_release,
            LfoRate => self.lfo_rate,
            LfoPitchDepth => self.lfo_pitch_depth,
            LfoFilterDepth => self.lfo_filter_depth,
            LfoAmpDepth => self.lfo_amp_depth,
            DelayTime => self.delay_time,
            DelayFeedback => self.delay_feedback,
            DelayMix => self.delay_mix,
            ReverbMix => self.reverb_mix,
            DistortionDrive => self.distortion_drive,
            ChorusRate => self.chorus_rate,
            ChorusDepth => self.chorus_depth,
            FlangerRate => self.flanger_rate,
            FlangerDepth => self.flanger_depth,
            FlangerFeedback => self.flanger_feedback,
            MasterVolume => self.master_volume,
            LimiterGain => self.limiter_gain,
            LimiterCeiling => self.limiter_ceiling,
            LimiterLookahead => self.limiter_lookahead,
            LimiterRelease => self.limiter_release,
        }
    }

    fn field_mut(&mut self, target: ParamTarget) -> Option<&mut f64> {
        use ParamTarget::*;
        Some(match target {
            Osc1Detune => &mut self.osc1_detune,
            Osc1Level => &mut self.osc1_level,
            Osc2Detune => &mut self.osc2_detune,
            Osc2Level => &mut self.osc2_level,
            NoiseLevel => &mut self.noise_level,
            Octave => return None,
            FilterCutoff => &mut self.filter_cutoff,
            FilterResonance => &mut self.filter_resonance,
            FilterEnvAmount => &mut self.filter_env_amount,
            FilterAttack => &mut self.filter_attack,
            FilterDecay => &mut self.filter_decay,
            AmpAttack => &mut self.amp_attack,
            AmpDecay => &mut self.amp_decay,
            AmpSustain => &mut self.amp_sustain,
            AmpRelease => &mut self.amp_release,
            LfoRate => &mut self.lfo_rate,
            LfoPitchDepth => &mut self.lfo_pitch_depth,
            LfoFilterDepth => &mut self.lfo_filter_depth,
            LfoAmpDepth => &mut self.lfo_amp_depth,
            DelayTime => &mut self.delay_time,
            DelayFeedback => &mut self.delay_feedback,
            DelayMix => &mut self.delay_mix,
            ReverbMix => &mut self.reverb_mix,
            DistortionDrive => &mut self.distortion_drive,
            ChorusRate => &mut self.chorus_rate,
            ChorusDepth => &mut self.chorus_depth,
            FlangerRate => &mut self.flanger_rate,
            FlangerDepth => &mut self.flanger_depth,
            FlangerFeedback => &mut self.flanger_feedback,
            MasterVolume => &mut self.master_volume,
            LimiterGain => &mut self.limiter_gain,
            LimiterCeiling => &mut self.limiter_ceiling,
            LimiterLookahead => &mut self.limiter_lookahead,
            LimiterRelease => &mut self.limiter_release,
        })
    }

    /// Capture `model`, scaling unit-interval fields up to percent.
    pub fn from_model(model: &ParameterModel) -> Self {
        let mut snapshot = ParameterSnapshot {
            osc1_waveform: model.osc1.waveform,
            osc2_waveform: model.osc2.waveform,
            filter_type: model.filter.filter_type,
            lfo_waveform: model.lfo.waveform,
            octave: model.octave,
            osc1_detune: 0.0,
            osc1_level: 0.0,
            osc2_detune: 0.0,
            osc2_level: 0.0,
            noise_level: 0.0,
            filter_cutoff: 0.0,
            filter_resonance: 0.0,
            filter_env_amount: 0.0,
            filter_attack: 0.0,
            filter_decay: 0.0,
            amp_attack: 0.0,
            amp_decay: 0.0,
            amp_sustain: 0.0,
            amp_release: 0.0,
            lfo_rate: 0.0,
            lfo_pitch_depth: 0.0,
            lfo_filter_depth: 0.0,
            lfo_amp_depth: 0.0,
            delay_time: 0.0,
            delay_feedback: 0.0,
            delay_mix: 0.0,
            reverb_mix: 0.0,
            distortion_drive: 0.0,
            chorus_rate: 0.0,
            chorus_depth: 0.0,
            flanger_rate: 0.0,
            flanger_depth: 0.0,
            flanger_feedback: 0.0,
            master_volume: 0.0,
            limiter_gain: 0.0,
            limiter_ceiling: 0.0,
            limiter_lookahead: 0.0,
            limiter_release: 0.0,
        };
        for target in ParamTarget::ALL {
            let value = model.get(target);
            if let Some(slot) = snapshot.field_mut(target) {
                *slot = if target.is_percent() { value * 100.0 } else { value };
            }
        }
        snapshot
    }

    /// Apply every field onto `model`, scaling percentages down and
    /// clamping to each field's range.
    pub fn apply_to(&self, model: &mut ParameterModel) {
        model.osc1.waveform = self.osc1_waveform;
        model.osc2.waveform = self.osc2_waveform;
        model.filter.filter_type = self.filter_type;
        model.lfo.waveform = self.lfo_waveform;
        for target in ParamTarget::ALL {
            let raw = self.field(target);
            model.set(target, if target.is_percent() { raw / 100.0 } else { raw });
        }
    }

    pub fn to_model(&self) -> ParameterModel {
        let mut model = ParameterModel::default();
        self.apply_to(&mut model);
        model
    }

    /// Field-wise comparison with tolerance `eps` on numeric fields.
    pub fn approx_eq(&self, other: &ParameterSnapshot, eps: f64) -> bool {
        self.osc1_waveform == other.osc1_waveform
            && self.osc2_waveform == other.osc2_waveform
            && self.filter_type == other.filter_type
            && self.lfo_waveform == other.lfo_waveform
            && ParamTarget::ALL
                .into_iter()
                .all(|t| (self.field(t) - other.field(t)).abs() <= eps)
    }
}
