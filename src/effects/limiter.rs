//! Output limiter: makeup gain → brick-wall compressor → hard clipper.
//!
//! The compressor does the smooth gain reduction; the oversampled clipper
//! after it holds the ceiling on every sample regardless of what the
//! compressor's attack lets through.

use crate::dsp::compressor::CompressorSettings;
use crate::dsp::waveshaper::{CURVE_LEN, Oversample, hard_clip_curve};
use crate::error::GraphError;
use crate::graph::node::{NodeSpec, Processor};
use crate::graph::patch::{Endpoint, Patch, PatchInstance, PatchNode};
use crate::graph::{Graph, ParamKind};
use crate::params::LimiterParams;
use std::sync::Arc;

pub const THRESHOLD_DB: f64 = -1.0;
pub const RATIO: f64 = 20.0;
/// Attack floor, seconds.
pub const MIN_ATTACK: f64 = 0.001;
pub const MAX_GAIN_DB: f64 = 12.0;

pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Makeup gain as a linear factor, clamped to ±12 dB.
pub fn input_gain(params: &LimiterParams) -> f64 {
    db_to_linear(params.gain_db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB))
}

/// Ceiling as linear amplitude; never above full scale.
pub fn ceiling(params: &LimiterParams) -> f32 {
    db_to_linear(params.ceiling_db.min(0.0)) as f32
}

pub fn compressor_settings(params: &LimiterParams) -> CompressorSettings {
    CompressorSettings {
        threshold: THRESHOLD_DB,
        ratio: RATIO,
        knee: 0.0,
        attack: (params.lookahead_ms / 1000.0).max(MIN_ATTACK),
        release: params.release_ms / 1000.0,
    }
}

fn clip_curve(params: &LimiterParams) -> Arc<[f32]> {
    Arc::from(hard_clip_curve(ceiling(params), CURVE_LEN))
}

/// The limiter's nodes inside the effects patch.
#[derive(Debug, Clone, Copy)]
pub struct Limiter {
    gain: PatchNode,
    compressor: PatchNode,
    clipper: PatchNode,
}

impl Limiter {
    /// Add the three stages to `patch`, fed from `input`.
    pub fn add_to(patch: &mut Patch, input: PatchNode, params: &LimiterParams) -> Self {
        let gain = patch.add("limiter_gain", NodeSpec::gain(input_gain(params)));
        let compressor = patch.add(
            "limiter_compressor",
            NodeSpec::Compressor {
                settings: compressor_settings(params),
            },
        );
        let clipper = patch.add(
            "limiter_clipper",
            NodeSpec::WaveShaper {
                curve: Some(clip_curve(params)),
                oversample: Oversample::X4,
            },
        );
        patch.connect(input, Endpoint::Input(gain));
        patch.chain(&[gain, compressor, clipper]);
        Limiter {
            gain,
            compressor,
            clipper,
        }
    }

    /// Last stage; connect this onwards.
    pub fn output(&self) -> PatchNode {
        self.clipper
    }

    /// Push new settings into the live nodes.
    pub fn apply(
        &self,
        graph: &mut Graph,
        nodes: &PatchInstance,
        params: &LimiterParams,
        ramp: f64,
    ) -> Result<(), GraphError> {
        let now = graph.current_time();
        let gain = graph.param_mut(nodes.id(self.gain), ParamKind::Gain)?;
        gain.cancel_and_hold_at_time(now);
        gain.linear_ramp_to_value_at_time(input_gain(params), now + ramp);

        if let Processor::Compressor(c) = graph.node_mut(nodes.id(self.compressor))?.processor_mut() {
            c.configure(compressor_settings(params));
        }
        if let Processor::WaveShaper(ws) = graph.node_mut(nodes.id(self.clipper))?.processor_mut() {
            ws.set_curve(Some(clip_curve(params)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::Waveform;
    use crate::graph::Port;

    fn params(gain_db: f64, ceiling_db: f64) -> LimiterParams {
        LimiterParams {
            gain_db,
            ceiling_db,
            lookahead_ms: 5.0,
            release_ms: 100.0,
        }
    }

    /// Square wave at `amplitude` through a limiter into the destination.
    fn rig(amplitude: f64, p: &LimiterParams) -> (Graph, Limiter, PatchInstance) {
        let mut graph = Graph::new(8000.0);
        let mut patch = Patch::new();
        let osc = patch.add(
            "osc",
            NodeSpec::Oscillator {
                waveform: Waveform::Square,
                frequency: 220.0,
                detune: 0.0,
            },
        );
        let boost = patch.add("boost", NodeSpec::gain(amplitude));
        patch.connect(osc, Endpoint::Input(boost));
        let limiter = Limiter::add_to(&mut patch, boost, p);
        patch.connect(limiter.output(), Endpoint::External(Port::Input(graph.destination())));
        let nodes = patch.instantiate(&mut graph).unwrap();
        graph.start(nodes.id(osc), 0.0).unwrap();
        (graph, limiter, nodes)
    }

    #[test]
    fn settings_pin_a_brick_wall() {
        let s = compressor_settings(&params(0.0, -1.0));
        assert_eq!((s.threshold, s.ratio, s.knee), (-1.0, 20.0, 0.0));
        assert_eq!(s.attack, 0.005);
        let fast = compressor_settings(&LimiterParams {
            lookahead_ms: 0.0,
            ..params(0.0, 0.0)
        });
        assert_eq!(fast.attack, MIN_ATTACK);
        assert_eq!(input_gain(&params(40.0, 0.0)), db_to_linear(12.0));
        assert_eq!(ceiling(&params(0.0, 6.0)), 1.0);
    }

    #[test]
    fn output_never_exceeds_ceiling() {
        for ceiling_db in [-12.0, -6.0, -1.0, 0.0] {
            for amplitude in [0.1, 1.0, 4.0, 50.0] {
                for gain_db in [-12.0, 0.0, 12.0] {
                    let p = params(gain_db, ceiling_db);
                    let limit = ceiling(&p) + 1e-6;
                    let (mut graph, _, _) = rig(amplitude, &p);
                    for _ in 0..40 {
                        let peak = graph.render_quantum().peak();
                        assert!(
                            peak <= limit,
                            "peak {peak} over ceiling {ceiling_db} dB (amp {amplitude}, gain {gain_db} dB)"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn quiet_signal_passes_nearly_unchanged() {
        let p = params(0.0, 0.0);
        let (mut graph, _, _) = rig(0.25, &p);
        let mut peak = 0.0f32;
        for _ in 0..40 {
            peak = peak.max(graph.render_quantum().peak());
        }
        assert!((peak - 0.25).abs() < 0.05, "peak {peak}");
    }

    #[test]
    fn apply_moves_the_ceiling() {
        let p = params(0.0, 0.0);
        let (mut graph, limiter, nodes) = rig(4.0, &p);
        graph.render_quantum();
        let lower = params(0.0, -12.0);
        limiter.apply(&mut graph, &nodes, &lower, 0.01).unwrap();
        for _ in 0..10 {
            assert!(graph.render_quantum().peak() <= ceiling(&lower) + 1e-6);
        }
    }
}
