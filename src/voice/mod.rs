//! One sounding note as a sub-graph.
//!
//! A voice is planned as a [`Patch`] from a snapshot of the parameter
//! model, then instantiated into the graph in one go:
//!
//! ```text
//! osc1 → osc1_gain ─┐
//! osc2 → osc2_gain ─┼→ filter → amp → master
//! noise → noise_gain┘
//! lfo → pitch depth gains → osc.detune
//!     → filter_depth      → filter.frequency
//!     → amp_depth         → amp.gain
//! ```
//!
//! Envelopes are scheduled only after every node and connection exists.

pub mod manager;

use crate::dsp::envelope::{Envelope, schedule_sweep};
use crate::error::GraphError;
use crate::graph::node::NodeSpec;
use crate::graph::patch::{Endpoint, Patch, PatchInstance, PatchNode};
use crate::graph::{Graph, NodeId, ParamKind, Port};
use crate::notation::{NoteName, midi_to_frequency, note_frequency};
use crate::params::{FilterParams, ParameterModel};
use crate::scheduler::TaskHandle;
use std::sync::Arc;
use tracing::trace;

pub use manager::VoiceManager;

/// Key of the active-voice map. Manual and MIDI notes never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteIdentity {
    /// On-screen or computer keyboard note, relative to the global octave.
    Manual { note: NoteName, octave_offset: i32 },
    Midi(u8),
}

impl NoteIdentity {
    /// Absolute frequency given the global `octave`. MIDI notes ignore it.
    pub fn frequency(&self, octave: i32) -> f64 {
        match *self {
            NoteIdentity::Manual { note, octave_offset } => note_frequency(note, octave + octave_offset),
            NoteIdentity::Midi(note) => midi_to_frequency(note),
        }
    }
}

/// Returned by `play_note`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceHandle {
    pub identity: NoteIdentity,
    /// Unique per voice; a retriggered identity gets a new serial.
    pub serial: u64,
    /// Audio-clock time the voice started, seconds.
    pub start_time: f64,
}

/// The per-voice LFO and its depth gains.
#[derive(Debug, Clone, PartialEq)]
pub struct LfoRig {
    pub osc: NodeId,
    pub pitch_depths: Vec<NodeId>,
    pub filter_depth: Option<NodeId>,
    pub amp_depth: Option<NodeId>,
}

#[derive(Debug, Clone)]
struct LfoPlan {
    osc: PatchNode,
    pitch_depths: Vec<PatchNode>,
    filter_depth: Option<PatchNode>,
    amp_depth: Option<PatchNode>,
}

/// A voice's topology, built from the model but not yet in the graph.
#[derive(Debug, Clone)]
pub struct VoicePlan {
    patch: Patch,
    sources: Vec<PatchNode>,
    filter: PatchNode,
    amp: PatchNode,
    lfo: Option<LfoPlan>,
    filter_params: FilterParams,
    envelope: Envelope,
}

impl VoicePlan {
    /// Plan a voice at `frequency`. Source gains are scaled by `velocity`;
    /// the amp gain feeds `master`.
    pub fn new(
        model: &ParameterModel,
        frequency: f64,
        velocity: f64,
        noise: &Arc<[f32]>,
        master: NodeId,
    ) -> Self {
        let mut patch = Patch::new();
        let velocity = velocity.clamp(0.0, 1.0);
        let f = &model.filter;

        let filter = patch.add(
            "filter",
            NodeSpec::Filter {
                filter_type: f.filter_type,
                frequency: f.cutoff,
                q: f.resonance,
            },
        );

        let lfo_params = &model.lfo;
        let lfo_osc = lfo_params.is_active().then(|| {
            patch.add(
                "lfo",
                NodeSpec::Oscillator {
                    waveform: lfo_params.waveform,
                    frequency: lfo_params.rate,
                    detune: 0.0,
                },
            )
        });

        let mut sources = Vec::new();
        let mut pitch_depths = Vec::new();
        for (label, gain_label, depth_label, osc) in [
            ("osc1", "osc1_gain", "osc1_pitch_depth", &model.osc1),
            ("osc2", "osc2_gain", "osc2_pitch_depth", &model.osc2),
        ] {
            if osc.level <= 0.0 {
                continue;
            }
            let node = patch.add(
                label,
                NodeSpec::Oscillator {
                    waveform: osc.waveform,
                    frequency,
                    detune: osc.detune,
                },
            );
            let gain = patch.add(gain_label, NodeSpec::gain(osc.level * velocity));
            patch.chain(&[node, gain, filter]);
            if let Some(lfo) = lfo_osc.filter(|_| lfo_params.pitch_depth != 0.0) {
                let depth = patch.add(depth_label, NodeSpec::gain(lfo_params.pitch_depth));
                patch.chain(&[lfo, depth]);
                patch.connect(depth, Endpoint::Param(node, ParamKind::Detune));
                pitch_depths.push(depth);
            }
            sources.push(node);
        }

        if model.noise_level > 0.0 {
            let node = patch.add(
                "noise",
                NodeSpec::Noise {
                    buffer: Arc::clone(noise),
                },
            );
            let gain = patch.add("noise_gain", NodeSpec::gain(model.noise_level * velocity));
            patch.chain(&[node, gain, filter]);
            sources.push(node);
        }

        let amp = patch.add("amp", NodeSpec::gain(0.0));
        patch.chain(&[filter, amp]);

        let lfo = lfo_osc.map(|osc| {
            let filter_depth = (lfo_params.filter_depth != 0.0).then(|| {
                let depth = patch.add("filter_depth", NodeSpec::gain(lfo_params.filter_depth));
                patch.chain(&[osc, depth]);
                patch.connect(depth, Endpoint::Param(filter, ParamKind::Frequency));
                depth
            });
            let amp_depth = (lfo_params.amp_depth != 0.0).then(|| {
                let depth = patch.add("amp_depth", NodeSpec::gain(lfo_params.amp_depth));
                patch.chain(&[osc, depth]);
                patch.connect(depth, Endpoint::Param(amp, ParamKind::Gain));
                depth
            });
            LfoPlan {
                osc,
                pitch_depths,
                filter_depth,
                amp_depth,
            }
        });

        patch.connect(amp, Endpoint::External(Port::Input(master)));

        VoicePlan {
            patch,
            sources,
            filter,
            amp,
            lfo,
            filter_params: *f,
            envelope: model.amp,
        }
    }

    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    /// Create the nodes and wires, then schedule the envelopes and start
    /// every source at the current audio time.
    pub fn instantiate(&self, graph: &mut Graph, identity: NoteIdentity, serial: u64) -> Result<Voice, GraphError> {
        let nodes = self.patch.instantiate(graph)?;
        let t0 = graph.current_time();
        let lfo = self.lfo.as_ref().map(|plan| LfoRig {
            osc: nodes.id(plan.osc),
            pitch_depths: plan.pitch_depths.iter().map(|n| nodes.id(*n)).collect(),
            filter_depth: plan.filter_depth.map(|n| nodes.id(n)),
            amp_depth: plan.amp_depth.map(|n| nodes.id(n)),
        });
        let voice = Voice {
            handle: VoiceHandle {
                identity,
                serial,
                start_time: t0,
            },
            sources: self.sources.iter().map(|n| nodes.id(*n)).collect(),
            filter: nodes.id(self.filter),
            amp: nodes.id(self.amp),
            lfo,
            envelope: self.envelope,
            nodes,
            safety: None,
            cleanup: None,
        };
        if let Err(e) = self.schedule(graph, &voice, t0) {
            voice.teardown(graph);
            return Err(e);
        }
        Ok(voice)
    }

    fn schedule(&self, graph: &mut Graph, voice: &Voice, t0: f64) -> Result<(), GraphError> {
        let f = &self.filter_params;
        schedule_sweep(
            graph.param_mut(voice.filter, ParamKind::Frequency)?,
            t0,
            f.cutoff,
            f.env_amount,
            f.attack,
            f.decay,
        );
        self.envelope
            .schedule_attack(graph.param_mut(voice.amp, ParamKind::Gain)?, t0);
        for source in voice.scheduled_sources() {
            graph.start(source, t0)?;
        }
        Ok(())
    }
}

/// A sounding or releasing note and the graph nodes it owns.
#[derive(Debug)]
pub struct Voice {
    handle: VoiceHandle,
    nodes: PatchInstance,
    sources: Vec<NodeId>,
    filter: NodeId,
    amp: NodeId,
    lfo: Option<LfoRig>,
    envelope: Envelope,
    pub(crate) safety: Option<TaskHandle>,
    pub(crate) cleanup: Option<TaskHandle>,
}

impl Voice {
    pub fn handle(&self) -> VoiceHandle {
        self.handle
    }

    pub fn identity(&self) -> NoteIdentity {
        self.handle.identity
    }

    pub fn serial(&self) -> u64 {
        self.handle.serial
    }

    /// Oscillators and noise, not the LFO.
    pub fn sources(&self) -> &[NodeId] {
        &self.sources
    }

    pub fn filter(&self) -> NodeId {
        self.filter
    }

    pub fn amp(&self) -> NodeId {
        self.amp
    }

    pub fn lfo(&self) -> Option<&LfoRig> {
        self.lfo.as_ref()
    }

    pub fn node_ids(&self) -> &[NodeId] {
        self.nodes.ids()
    }

    fn scheduled_sources(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.sources
            .iter()
            .copied()
            .chain(self.lfo.as_ref().map(|l| l.osc))
    }

    /// Ramp the amp gain to zero from its value at `now` and stop every
    /// source when the ramp ends. Returns the end time.
    pub fn release(&self, graph: &mut Graph, now: f64) -> f64 {
        let end = match graph.param_mut(self.amp, ParamKind::Gain) {
            Ok(gain) => self.envelope.schedule_release(gain, now),
            Err(e) => {
                trace!(voice = self.serial(), "release: {e}");
                now + self.envelope.release_time()
            }
        };
        self.stop_sources(graph, end);
        end
    }

    /// Stop every source at the current audio time.
    pub fn hard_stop(&self, graph: &mut Graph) {
        let now = graph.current_time();
        self.stop_sources(graph, now);
    }

    fn stop_sources(&self, graph: &mut Graph, when: f64) {
        for source in self.scheduled_sources() {
            if let Err(e) = graph.stop(source, when) {
                trace!(voice = self.serial(), node = %source, "stop ignored: {e}");
            }
        }
    }

    /// Disconnect and free every node. Each step is independent; a node
    /// that is already gone does not stop the rest.
    pub fn teardown(&self, graph: &mut Graph) {
        for &id in self.nodes.ids() {
            if let Err(e) = graph.disconnect(id) {
                trace!(voice = self.serial(), node = %id, "disconnect ignored: {e}");
            }
            if let Err(e) = graph.remove(id) {
                trace!(voice = self.serial(), node = %id, "remove ignored: {e}");
            }
        }
    }
}
