//! Graph node types and their per-quantum processing.

use super::param::AudioParam;
use super::{Block, ParamKind, RENDER_QUANTUM};
use crate::dsp::analyser::Analyser;
use crate::dsp::compressor::{Compressor, CompressorSettings};
use crate::dsp::convolver::{Convolver, ImpulseResponse};
use crate::dsp::delay::{DelayLine, MAX_FEEDBACK};
use crate::dsp::filter::{BiquadFilter, FilterType};
use crate::dsp::noise::NoiseSource;
use crate::dsp::oscillator::{Oscillator, Waveform};
use crate::dsp::waveshaper::{Oversample, WaveShaper};
use std::sync::Arc;

/// Detune range in cents.
const DETUNE_LIMIT: f64 = 100_000.0;

/// Everything needed to create a node. Parameter fields are initial
/// intrinsic values.
#[derive(Debug, Clone)]
pub enum NodeSpec {
    Oscillator {
        waveform: Waveform,
        frequency: f64,
        detune: f64,
    },
    Noise {
        buffer: Arc<[f32]>,
    },
    Gain {
        gain: f64,
    },
    Filter {
        filter_type: FilterType,
        frequency: f64,
        q: f64,
    },
    Delay {
        delay_time: f64,
        feedback: f64,
        max_delay: f64,
    },
    Convolver {
        ir: Arc<ImpulseResponse>,
    },
    WaveShaper {
        curve: Option<Arc<[f32]>>,
        oversample: Oversample,
    },
    Compressor {
        settings: CompressorSettings,
    },
    Analyser {
        size: usize,
    },
}

impl NodeSpec {
    pub fn gain(gain: f64) -> Self {
        NodeSpec::Gain { gain }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeSpec::Oscillator { .. } => "oscillator",
            NodeSpec::Noise { .. } => "noise",
            NodeSpec::Gain { .. } => "gain",
            NodeSpec::Filter { .. } => "filter",
            NodeSpec::Delay { .. } => "delay",
            NodeSpec::Convolver { .. } => "convolver",
            NodeSpec::WaveShaper { .. } => "waveshaper",
            NodeSpec::Compressor { .. } => "compressor",
            NodeSpec::Analyser { .. } => "analyser",
        }
    }
}

/// The sample-level state behind a node.
#[derive(Debug)]
pub enum Processor {
    Oscillator(Oscillator),
    Noise(NoiseSource),
    Gain,
    Filter(BiquadFilter),
    Delay(DelayLine),
    Convolver(Box<Convolver>),
    WaveShaper(WaveShaper),
    Compressor(Compressor),
    Analyser(Analyser),
    Destination,
}

/// Start/stop window of a scheduled source, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceSchedule {
    pub start: Option<f64>,
    pub stop: Option<f64>,
}

impl SourceSchedule {
    #[inline]
    pub fn is_playing(&self, time: f64) -> bool {
        match self.start {
            Some(start) if time >= start => self.stop.is_none_or(|stop| time < stop),
            _ => false,
        }
    }
}

/// Frame position of the quantum being rendered.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    pub frame: u64,
    pub sample_rate: f64,
}

impl RenderContext {
    #[inline]
    pub fn time(&self, offset: usize) -> f64 {
        (self.frame + offset as u64) as f64 / self.sample_rate
    }
}

#[derive(Debug)]
pub struct Node {
    processor: Processor,
    params: Vec<(ParamKind, AudioParam)>,
    schedule: Option<SourceSchedule>,
}

impl Node {
    pub(crate) fn destination() -> Self {
        Node {
            processor: Processor::Destination,
            params: Vec::new(),
            schedule: None,
        }
    }

    pub(crate) fn from_spec(spec: NodeSpec, sample_rate: f64) -> Self {
        let nyquist = sample_rate / 2.0;
        let (processor, params, schedule) = match spec {
            NodeSpec::Oscillator {
                waveform,
                frequency,
                detune,
            } => (
                Processor::Oscillator(Oscillator::new(waveform, sample_rate)),
                vec![
                    (ParamKind::Frequency, AudioParam::new(frequency, 0.0, nyquist)),
                    (ParamKind::Detune, AudioParam::new(detune, -DETUNE_LIMIT, DETUNE_LIMIT)),
                ],
                Some(SourceSchedule::default()),
            ),
            NodeSpec::Noise { buffer } => (
                Processor::Noise(NoiseSource::new(buffer)),
                Vec::new(),
                Some(SourceSchedule::default()),
            ),
            NodeSpec::Gain { gain } => (
                Processor::Gain,
                vec![(ParamKind::Gain, AudioParam::new(gain, f64::MIN, f64::MAX))],
                None,
            ),
            NodeSpec::Filter {
                filter_type,
                frequency,
                q,
            } => (
                Processor::Filter(BiquadFilter::new(filter_type, sample_rate)),
                vec![
                    (ParamKind::Frequency, AudioParam::new(frequency, 0.0, nyquist)),
                    (ParamKind::Q, AudioParam::new(q, 1e-4, 1000.0)),
                ],
                None,
            ),
            NodeSpec::Delay {
                delay_time,
                feedback,
                max_delay,
            } => (
                Processor::Delay(DelayLine::new(sample_rate, max_delay)),
                vec![
                    (ParamKind::DelayTime, AudioParam::new(delay_time, 0.0, max_delay)),
                    (ParamKind::Feedback, AudioParam::new(feedback, 0.0, MAX_FEEDBACK)),
                ],
                None,
            ),
            NodeSpec::Convolver { ir } => (
                Processor::Convolver(Box::new(Convolver::new(&ir, RENDER_QUANTUM))),
                Vec::new(),
                None,
            ),
            NodeSpec::WaveShaper { curve, oversample } => {
                (Processor::WaveShaper(WaveShaper::new(curve, oversample)), Vec::new(), None)
            }
            NodeSpec::Compressor { settings } => (
                Processor::Compressor(Compressor::new(sample_rate, settings)),
                Vec::new(),
                None,
            ),
            NodeSpec::Analyser { size } => (Processor::Analyser(Analyser::new(size)), Vec::new(), None),
        };
        Node {
            processor,
            params,
            schedule,
        }
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut Processor {
        &mut self.processor
    }

    pub fn is_source(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn schedule(&self) -> Option<SourceSchedule> {
        self.schedule
    }

    pub(crate) fn schedule_mut(&mut self) -> Option<&mut SourceSchedule> {
        self.schedule.as_mut()
    }

    pub fn param(&self, kind: ParamKind) -> Option<&AudioParam> {
        self.params.iter().find(|(k, _)| *k == kind).map(|(_, p)| p)
    }

    pub fn param_mut(&mut self, kind: ParamKind) -> Option<&mut AudioParam> {
        self.params.iter_mut().find(|(k, _)| *k == kind).map(|(_, p)| p)
    }

    pub(crate) fn params(&self) -> &[(ParamKind, AudioParam)] {
        &self.params
    }

    pub(crate) fn params_mut(&mut self) -> impl Iterator<Item = &mut AudioParam> {
        self.params.iter_mut().map(|(_, p)| p)
    }

    /// Render one quantum. `values` holds the computed (automation plus
    /// modulation, clamped) values of each parameter in declaration order.
    pub(crate) fn process(
        &mut self,
        ctx: RenderContext,
        input: &Block,
        values: &[[f64; RENDER_QUANTUM]],
        out: &mut Block,
    ) {
        let schedule = self.schedule;
        match &mut self.processor {
            Processor::Oscillator(osc) => {
                for i in 0..RENDER_QUANTUM {
                    let s = if schedule.is_some_and(|s| s.is_playing(ctx.time(i))) {
                        osc.next_sample(values[0][i], values[1][i]) as f32
                    } else {
                        0.0
                    };
                    out.channels[0][i] = s;
                    out.channels[1][i] = s;
                }
            }
            Processor::Noise(noise) => {
                for i in 0..RENDER_QUANTUM {
                    let s = if schedule.is_some_and(|s| s.is_playing(ctx.time(i))) {
                        noise.next_sample()
                    } else {
                        0.0
                    };
                    out.channels[0][i] = s;
                    out.channels[1][i] = s;
                }
            }
            Processor::Gain => {
                for ch in 0..2 {
                    for i in 0..RENDER_QUANTUM {
                        out.channels[ch][i] = (input.channels[ch][i] as f64 * values[0][i]) as f32;
                    }
                }
            }
            Processor::Filter(filter) => {
                for i in 0..RENDER_QUANTUM {
                    filter.set_params(values[0][i], values[1][i]);
                    for ch in 0..2 {
                        out.channels[ch][i] = filter.process(ch, input.channels[ch][i] as f64) as f32;
                    }
                }
            }
            Processor::Delay(delay) => {
                for i in 0..RENDER_QUANTUM {
                    let (l, r) = delay.process(
                        input.channels[0][i],
                        input.channels[1][i],
                        values[0][i],
                        values[1][i],
                    );
                    out.channels[0][i] = l;
                    out.channels[1][i] = r;
                }
            }
            Processor::Convolver(conv) => {
                let [left, right] = &mut out.channels;
                conv.process(
                    [&input.channels[0][..], &input.channels[1][..]],
                    [&mut left[..], &mut right[..]],
                );
            }
            Processor::WaveShaper(shaper) => {
                for ch in 0..2 {
                    for i in 0..RENDER_QUANTUM {
                        out.channels[ch][i] = shaper.process(ch, input.channels[ch][i]);
                    }
                }
            }
            Processor::Compressor(comp) => {
                for i in 0..RENDER_QUANTUM {
                    let (l, r) = comp.process(input.channels[0][i], input.channels[1][i]);
                    out.channels[0][i] = l;
                    out.channels[1][i] = r;
                }
            }
            Processor::Analyser(analyser) => {
                for i in 0..RENDER_QUANTUM {
                    analyser.push(input.channels[0][i], input.channels[1][i]);
                }
                out.channels = input.channels;
            }
            Processor::Destination => out.channels = input.channels,
        }
    }
}
