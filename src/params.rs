//! The current patch and its per-field setters.
//!
//! Voices snapshot [`ParameterModel`] when they are created; only the
//! effect, master and limiter fields act on already-sounding notes (they
//! live in the shared chain).

use crate::dsp::envelope::Envelope;
use crate::dsp::filter::FilterType;
use crate::dsp::oscillator::Waveform;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorParams {
    pub waveform: Waveform,
    /// Cents.
    pub detune: f64,
    /// [0, 1]; zero disables the oscillator.
    pub level: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub filter_type: FilterType,
    /// Hz.
    pub cutoff: f64,
    pub resonance: f64,
    /// Signed Hz offset reached at the end of the filter attack.
    pub env_amount: f64,
    pub attack: f64,
    pub decay: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoParams {
    pub waveform: Waveform,
    /// Hz.
    pub rate: f64,
    /// Cents.
    pub pitch_depth: f64,
    /// Hz.
    pub filter_depth: f64,
    /// [0, 1], added on top of the amplitude envelope.
    pub amp_depth: f64,
}

impl LfoParams {
    pub fn is_active(&self) -> bool {
        self.pitch_depth != 0.0 || self.filter_depth != 0.0 || self.amp_depth != 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
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
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterParams {
    /// Makeup gain, dB.
    pub gain_db: f64,
    /// Output ceiling, dB (never above 0).
    pub ceiling_db: f64,
    pub lookahead_ms: f64,
    pub release_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterModel {
    pub osc1: OscillatorParams,
    pub osc2: OscillatorParams,
    pub noise_level: f64,
    pub octave: i32,
    pub filter: FilterParams,
    pub amp: Envelope,
    pub lfo: LfoParams,
    pub effects: EffectParams,
    pub master_volume: f64,
    pub limiter: LimiterParams,
}

impl Default for ParameterModel {
    fn default() -> Self {
        ParameterModel {
            osc1: OscillatorParams {
                waveform: Waveform::Sawtooth,
                detune: 0.0,
                level: 0.7,
            },
            osc2: OscillatorParams {
                waveform: Waveform::Square,
                detune: -7.0,
                level: 0.5,
            },
            noise_level: 0.0,
            octave: 4,
            filter: FilterParams {
                filter_type: FilterType::Lowpass,
                cutoff: 2000.0,
                resonance: 1.0,
                env_amount: 0.0,
                attack: 0.1,
                decay: 0.3,
            },
            amp: Envelope::default(),
            lfo: LfoParams {
                waveform: Waveform::Sine,
                rate: 5.0,
                pitch_depth: 0.0,
                filter_depth: 0.0,
                amp_depth: 0.0,
            },
            effects: EffectParams {
                delay_time: 0.3,
                delay_feedback: 0.3,
                delay_mix: 0.0,
                reverb_mix: 0.0,
                distortion_drive: 0.0,
                chorus_rate: 1.5,
                chorus_depth: 0.0,
                flanger_rate: 0.5,
                flanger_depth: 0.0,
                flanger_feedback: 0.5,
            },
            master_volume: 0.7,
            limiter: LimiterParams {
                gain_db: 0.0,
                ceiling_db: -0.5,
                lookahead_ms: 5.0,
                release_ms: 100.0,
            },
        }
    }
}

/// Every numeric field of [`ParameterModel`] that has a setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamTarget {
    Osc1Detune,
    Osc1Level,
    Osc2Detune,
    Osc2Level,
    NoiseLevel,
    Octave,
    FilterCutoff,
    FilterResonance,
    FilterEnvAmount,
    FilterAttack,
    FilterDecay,
    AmpAttack,
    AmpDecay,
    AmpSustain,
    AmpRelease,
    LfoRate,
    LfoPitchDepth,
    LfoFilterDepth,
    LfoAmpDepth,
    DelayTime,
    DelayFeedback,
    DelayMix,
    ReverbMix,
    DistortionDrive,
    ChorusRate,
    ChorusDepth,
    FlangerRate,
    FlangerDepth,
    FlangerFeedback,
    MasterVolume,
    LimiterGain,
    LimiterCeiling,
    LimiterLookahead,
    LimiterRelease,
}

impl ParamTarget {
    pub const ALL: [ParamTarget; 34] = [
        ParamTarget::Osc1Detune,
        ParamTarget::Osc1Level,
        ParamTarget::Osc2Detune,
        ParamTarget::Osc2Level,
        ParamTarget::NoiseLevel,
        ParamTarget::Octave,
        ParamTarget::FilterCutoff,
        ParamTarget::FilterResonance,
        ParamTarget::FilterEnvAmount,
        ParamTarget::FilterAttack,
        ParamTarget::FilterDecay,
        ParamTarget::AmpAttack,
        ParamTarget::AmpDecay,
        ParamTarget::AmpSustain,
        ParamTarget::AmpRelease,
        ParamTarget::LfoRate,
        ParamTarget::LfoPitchDepth,
        ParamTarget::LfoFilterDepth,
        ParamTarget::LfoAmpDepth,
        ParamTarget::DelayTime,
        ParamTarget::DelayFeedback,
        ParamTarget::DelayMix,
        ParamTarget::ReverbMix,
        ParamTarget::DistortionDrive,
        ParamTarget::ChorusRate,
        ParamTarget::ChorusDepth,
        ParamTarget::FlangerRate,
        ParamTarget::FlangerDepth,
        ParamTarget::FlangerFeedback,
        ParamTarget::MasterVolume,
        ParamTarget::LimiterGain,
        ParamTarget::LimiterCeiling,
        ParamTarget::LimiterLookahead,
        ParamTarget::LimiterRelease,
    ];

    /// Declared `(min, max)` of the field.
    pub fn range(&self) -> (f64, f64) {
        use ParamTarget::*;
        match self {
            Osc1Detune | Osc2Detune => (-1200.0, 1200.0),
            Osc1Level | Osc2Level | NoiseLevel => (0.0, 1.0),
            Octave => (0.0, 8.0),
            FilterCutoff => (20.0, 20000.0),
            FilterResonance => (0.1, 20.0),
            FilterEnvAmount => (-10000.0, 10000.0),
            FilterAttack | FilterDecay | AmpAttack | AmpDecay => (0.0, 5.0),
            AmpSustain => (0.0, 1.0),
            AmpRelease => (0.01, 5.0),
            LfoRate => (0.1, 20.0),
            LfoPitchDepth => (0.0, 100.0),
            LfoFilterDepth => (0.0, 5000.0),
            LfoAmpDepth => (0.0, 1.0),
            DelayTime => (0.01, 2.0),
            DelayFeedback | FlangerFeedback => (0.0, 0.95),
            DelayMix | ReverbMix | DistortionDrive | ChorusDepth | FlangerDepth => (0.0, 1.0),
            ChorusRate => (0.1, 10.0),
            FlangerRate => (0.05, 5.0),
            MasterVolume => (0.0, 1.0),
            LimiterGain => (-12.0, 12.0),
            LimiterCeiling => (-12.0, 0.0),
            LimiterLookahead => (0.0, 20.0),
            LimiterRelease => (10.0, 1000.0),
        }
    }

    /// Whether the field is stored as 0–100 in the persisted form.
    pub fn is_percent(&self) -> bool {
        use ParamTarget::*;
        matches!(
            self,
            Osc1Level
                | Osc2Level
                | NoiseLevel
                | AmpSustain
                | LfoAmpDepth
                | DelayFeedback
                | DelayMix
                | ReverbMix
                | DistortionDrive
                | ChorusDepth
                | FlangerDepth
                | FlangerFeedback
                | MasterVolume
        )
    }

    /// Whether the field acts on the shared chain (and therefore on notes
    /// that are already sounding).
    pub fn is_live(&self) -> bool {
        use ParamTarget::*;
        matches!(
            self,
            DelayTime
                | DelayFeedback
                | DelayMix
                | ReverbMix
                | DistortionDrive
                | ChorusRate
                | ChorusDepth
                | FlangerRate
                | FlangerDepth
                | FlangerFeedback
                | MasterVolume
                | LimiterGain
                | LimiterCeiling
                | LimiterLookahead
                | LimiterRelease
        )
    }

    pub fn name(&self) -> &'static str {
        use ParamTarget::*;
        match self {
            Osc1Detune => "osc1Detune",
            Osc1Level => "osc1Level",
            Osc2Detune => "osc2Detune",
            Osc2Level => "osc2Level",
            NoiseLevel => "noiseLevel",
            Octave => "octave",
            FilterCutoff => "filterCutoff",
            FilterResonance => "filterResonance",
            FilterEnvAmount => "filterEnvAmount",
            FilterAttack => "filterAttack",
            FilterDecay => "filterDecay",
            AmpAttack => "ampAttack",
            AmpDecay => "ampDecay",
            AmpSustain => "ampSustain",
            AmpRelease => "ampRelease",
            LfoRate => "lfoRate",
            LfoPitchDepth => "lfoPitchDepth",
            LfoFilterDepth => "lfoFilterDepth",
            LfoAmpDepth => "lfoAmpDepth",
            DelayTime => "delayTime",
            DelayFeedback => "delayFeedback",
            DelayMix => "delayMix",
            ReverbMix => "reverbMix",
            DistortionDrive => "distortionDrive",
            ChorusRate => "chorusRate",
            ChorusDepth => "chorusDepth",
            FlangerRate => "flangerRate",
            FlangerDepth => "flangerDepth",
            FlangerFeedback => "flangerFeedback",
            MasterVolume => "masterVolume",
            LimiterGain => "limiterGain",
            LimiterCeiling => "limiterCeiling",
            LimiterLookahead => "limiterLookahead",
            LimiterRelease => "limiterRelease",
        }
    }

    /// Map `normalized` in [0, 1] linearly onto the declared range.
    pub fn denormalize(&self, normalized: f64) -> f64 {
        let (min, max) = self.range();
        min + normalized.clamp(0.0, 1.0) * (max - min)
    }
}

impl fmt::Display for ParamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTarget(pub String);

impl fmt::Display for UnknownTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown parameter '{}'", self.0)
    }
}

impl std::error::Error for UnknownTarget {}

impl FromStr for ParamTarget {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamTarget::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| UnknownTarget(s.to_string()))
    }
}

impl ParameterModel {
    /// Clamp `value` to the target's range and store it. Non-finite values
    /// are ignored. Returns the stored value.
    pub fn set(&mut self, target: ParamTarget, value: f64) -> f64 {
        if !value.is_finite() {
            return self.get(target);
        }
        let (min, max) = target.range();
        let v = value.clamp(min, max);
        use ParamTarget::*;
        match target {
            Osc1Detune => self.osc1.detune = v,
            Osc1Level => self.osc1.level = v,
            Osc2Detune => self.osc2.detune = v,
            Osc2Level => self.osc2.level = v,
            NoiseLevel => self.noise_level = v,
            Octave => self.octave = v.round() as i32,
            FilterCutoff => self.filter.cutoff = v,
            FilterResonance => self.filter.resonance = v,
            FilterEnvAmount => self.filter.env_amount = v,
            FilterAttack => self.filter.attack = v,
            FilterDecay => self.filter.decay = v,
            AmpAttack => self.amp.attack = v,
            AmpDecay => self.amp.decay = v,
            AmpSustain => self.amp.sustain = v,
            AmpRelease => self.amp.release = v,
            LfoRate => self.lfo.rate = v,
            LfoPitchDepth => self.lfo.pitch_depth = v,
            LfoFilterDepth => self.lfo.filter_depth = v,
            LfoAmpDepth => self.lfo.amp_depth = v,
            DelayTime => self.effects.delay_time = v,
            DelayFeedback => self.effects.delay_feedback = v,
            DelayMix => self.effects.delay_mix = v,
            ReverbMix => self.effects.reverb_mix = v,
            DistortionDrive => self.effects.distortion_drive = v,
            ChorusRate => self.effects.chorus_rate = v,
            ChorusDepth => self.effects.chorus_depth = v,
            FlangerRate => self.effects.flanger_rate = v,
            FlangerDepth => self.effects.flanger_depth = v,
            FlangerFeedback => self.effects.flanger_feedback = v,
            MasterVolume => self.master_volume = v,
            LimiterGain => self.limiter.gain_db = v,
            LimiterCeiling => self.limiter.ceiling_db = v,
            LimiterLookahead => self.limiter.lookahead_ms = v,
            LimiterRelease => self.limiter.release_ms = v,
        }
        self.get(target)
    }

    pub fn get(&self, target: ParamTarget) -> f64 {
        use ParamTarget::*;
        match target {
            Osc1Detune => self.osc1.detune,
            Osc1Level => self.osc1.level,
            Osc2Detune => self.osc2.detune,
            Osc2Level => self.osc2.level,
            NoiseLevel => self.noise_level,
            Octave => self.octave as f64,
            FilterCutoff => self.filter.cutoff,
            FilterResonance => self.filter.resonance,
            FilterEnvAmount => self.filter.env_amount,
            FilterAttack => self.filter.attack,
            FilterDecay => self.filter.decay,
            AmpAttack => self.amp.attack,
            AmpDecay => self.amp.decay,
            AmpSustain => self.amp.sustain,
            AmpRelease => self.amp.release,
            LfoRate => self.lfo.rate,
            LfoPitchDepth => self.lfo.pitch_depth,
            LfoFilterDepth => self.lfo.filter_depth,
            LfoAmpDepth => self.lfo.amp_depth,
            DelayTime => self.effects.delay_time,
            DelayFeedback => self.effects.delay_feedback,
            DelayMix => self.effects.delay_mix,
            ReverbMix => self.effects.reverb_mix,
            DistortionDrive => self.effects.distortion_drive,
            ChorusRate => self.effects.chorus_rate,
            ChorusDepth => self.effects.chorus_depth,
            FlangerRate => self.effects.flanger_rate,
            FlangerDepth => self.effects.flanger_depth,
            FlangerFeedback => self.effects.flanger_feedback,
            MasterVolume => self.master_volume,
            LimiterGain => self.limiter.gain_db,
            LimiterCeiling => self.limiter.ceiling_db,
            LimiterLookahead => self.limiter.lookahead_ms,
            LimiterRelease => self.limiter.release_ms,
        }
    }
}
