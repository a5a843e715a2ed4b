//! The top-level engine object.
//!
//! Owns the parameter model and preset bank from construction, and the
//! audio side (graph, effects chain, voices) from the first note event
//! onwards. Hosts drive it with note and control events and pull audio
//! with [`Synth::render`], which services voice timers between quanta.

use crate::config::EngineConfig;
use crate::dsp::filter::FilterType;
use crate::dsp::noise::noise_buffer;
use crate::dsp::oscillator::Waveform;
use crate::effects::EffectsChain;
use crate::error::SynthError;
use crate::graph::{Block, Graph, RENDER_QUANTUM};
use crate::midi::{InputEvent, MidiMessage, NoteEvent, map_cc, velocity_to_gain};
use crate::notation::NoteName;
use crate::params::{ParamTarget, ParameterModel};
use crate::preset::{ParameterSnapshot, PresetBank};
use crate::voice::{NoteIdentity, VoiceHandle, VoiceManager};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

/// The audio side, created lazily.
#[derive(Debug)]
struct Engine {
    graph: Graph,
    chain: EffectsChain,
    voices: VoiceManager,
}

impl Engine {
    fn new(config: &EngineConfig, params: &ParameterModel) -> Result<Self, SynthError> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let noise = noise_buffer(config.sample_rate, config.noise_seconds, &mut rng);
        let mut graph = Graph::new(config.sample_rate);
        let chain = EffectsChain::new(&mut graph, config, params, &mut rng)?;
        info!(
            sample_rate = config.sample_rate,
            nodes = graph.node_count(),
            "audio engine initialized"
        );
        Ok(Engine {
            graph,
            chain,
            voices: VoiceManager::new(config, noise),
        })
    }
}

#[derive(Debug)]
pub struct Synth {
    config: EngineConfig,
    params: ParameterModel,
    presets: PresetBank,
    engine: Option<Engine>,
    /// Last rendered quantum and how much of it has been handed out.
    pending: Block,
    pending_pos: usize,
}

impl Synth {
    pub fn new(config: EngineConfig) -> Result<Self, SynthError> {
        config.validate()?;
        Ok(Synth {
            config,
            params: ParameterModel::default(),
            presets: PresetBank::new(),
            engine: None,
            pending: Block::silent(),
            pending_pos: RENDER_QUANTUM,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn params(&self) -> &ParameterModel {
        &self.params
    }

    pub fn presets(&self) -> &PresetBank {
        &self.presets
    }

    pub fn presets_mut(&mut self) -> &mut PresetBank {
        &mut self.presets
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// Build the graph and effects chain if that has not happened yet.
    /// Note events call this on their own.
    pub fn initialize(&mut self) -> Result<(), SynthError> {
        self.engine()?;
        Ok(())
    }

    fn engine(&mut self) -> Result<&mut Engine, SynthError> {
        let engine = match self.engine.take() {
            Some(engine) => engine,
            None => Engine::new(&self.config, &self.params)?,
        };
        Ok(self.engine.insert(engine))
    }

    /// Audio-clock time in seconds; zero before initialization.
    pub fn current_time(&self) -> f64 {
        self.engine.as_ref().map_or(0.0, |e| e.graph.current_time())
    }

    pub fn active_voices(&self) -> usize {
        self.engine.as_ref().map_or(0, |e| e.voices.active_count())
    }

    pub fn releasing_voices(&self) -> usize {
        self.engine.as_ref().map_or(0, |e| e.voices.releasing_count())
    }

    // ── Notes ────────────────────────────────────────────────

    /// Start `identity` at `velocity` (a gain in [0, 1]).
    pub fn play(&mut self, identity: NoteIdentity, velocity: f64) -> Result<VoiceHandle, SynthError> {
        let frequency = identity.frequency(self.params.octave);
        let params = self.params;
        let Engine { graph, chain, voices } = self.engine()?;
        Ok(voices.play_note(graph, chain, &params, identity, frequency, velocity)?)
    }

    /// On-screen or computer keyboard note relative to the global octave.
    pub fn play_note(&mut self, note: NoteName, octave_offset: i32) -> Result<VoiceHandle, SynthError> {
        self.play(NoteIdentity::Manual { note, octave_offset }, 1.0)
    }

    /// Release `identity`. Returns whether a voice was sounding; stopping a
    /// silent identity is a no-op.
    pub fn stop_note(&mut self, identity: NoteIdentity) -> Result<bool, SynthError> {
        let Some(Engine { graph, chain, voices }) = self.engine.as_mut() else {
            return Ok(false);
        };
        Ok(voices.stop_note(graph, chain, identity)?)
    }

    /// Release everything, e.g. on focus loss.
    pub fn stop_all(&mut self) -> Result<(), SynthError> {
        if let Some(Engine { graph, chain, voices }) = self.engine.as_mut() {
            voices.stop_all(graph, chain)?;
        }
        Ok(())
    }

    /// MIDI note-on. Velocity 0 is a note-off.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Result<(), SynthError> {
        if velocity == 0 {
            return self.note_off(note);
        }
        self.play(NoteIdentity::Midi(note), velocity_to_gain(velocity))?;
        Ok(())
    }

    pub fn note_off(&mut self, note: u8) -> Result<(), SynthError> {
        self.stop_note(NoteIdentity::Midi(note))?;
        Ok(())
    }

    /// Apply a mapped controller. Returns the stored value, or `None` for
    /// controllers outside the table.
    pub fn control_change(&mut self, controller: u8, value: u8) -> Result<Option<f64>, SynthError> {
        match map_cc(controller, value) {
            Some(event) => self.set_parameter(event.target, event.value).map(Some),
            None => Ok(None),
        }
    }

    /// Parse and dispatch a raw MIDI message. Unsupported messages are
    /// ignored.
    pub fn midi_message(&mut self, bytes: &[u8]) -> Result<(), SynthError> {
        match MidiMessage::parse(bytes).and_then(|m| m.to_input_event()) {
            Some(event) => self.handle(event),
            None => Ok(()),
        }
    }

    pub fn handle(&mut self, event: InputEvent) -> Result<(), SynthError> {
        match event {
            InputEvent::Note(NoteEvent::On { identity, velocity }) => {
                self.play(identity, velocity)?;
            }
            InputEvent::Note(NoteEvent::Off { identity }) => {
                self.stop_note(identity)?;
            }
            InputEvent::Control(control) => {
                self.set_parameter(control.target, control.value)?;
            }
        }
        Ok(())
    }

    // ── Parameters ───────────────────────────────────────────

    /// Clamp and store a parameter. Effect, master and limiter values reach
    /// the running chain immediately; the rest apply from the next note.
    pub fn set_parameter(&mut self, target: ParamTarget, value: f64) -> Result<f64, SynthError> {
        let stored = self.params.set(target, value);
        if target.is_live() {
            if let Some(Engine { graph, chain, .. }) = self.engine.as_mut() {
                chain.apply_target(graph, &self.params, target)?;
            }
        }
        Ok(stored)
    }

    pub fn parameter(&self, target: ParamTarget) -> f64 {
        self.params.get(target)
    }

    pub fn set_osc1_waveform(&mut self, waveform: Waveform) {
        self.params.osc1.waveform = waveform;
    }

    pub fn set_osc2_waveform(&mut self, waveform: Waveform) {
        self.params.osc2.waveform = waveform;
    }

    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        self.params.filter.filter_type = filter_type;
    }

    pub fn set_lfo_waveform(&mut self, waveform: Waveform) {
        self.params.lfo.waveform = waveform;
    }

    // ── Presets ──────────────────────────────────────────────

    /// Replace every parameter with the snapshot's and push the shared
    /// chain's values into the running graph.
    pub fn load_preset(&mut self, snapshot: &ParameterSnapshot) -> Result<(), SynthError> {
        snapshot.apply_to(&mut self.params);
        if let Some(Engine { graph, chain, .. }) = self.engine.as_mut() {
            chain.apply(graph, &self.params)?;
        }
        debug!("preset loaded");
        Ok(())
    }

    /// Load a built-in or custom preset by name.
    pub fn load_named_preset(&mut self, name: &str) -> Result<(), SynthError> {
        let snapshot = self.presets.get(name)?.clone();
        self.load_preset(&snapshot)?;
        debug!(name = %name, "named preset loaded");
        Ok(())
    }

    /// Store the current settings as a custom preset.
    pub fn save_preset(&mut self, name: &str) -> Result<(), SynthError> {
        let snapshot = self.current_settings();
        self.presets.save(name, snapshot)?;
        Ok(())
    }

    pub fn current_settings(&self) -> ParameterSnapshot {
        ParameterSnapshot::from_model(&self.params)
    }

    // ── Audio ────────────────────────────────────────────────

    /// Fill `left` and `right` with the next frames of output. Before the
    /// first note event this writes silence without starting the engine.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let Some(engine) = self.engine.as_mut() else {
            left.fill(0.0);
            right.fill(0.0);
            return;
        };

        let mut written = 0;
        while written < frames {
            if self.pending_pos == RENDER_QUANTUM {
                let Engine { graph, chain, voices } = &mut *engine;
                let now = graph.current_frame();
                if let Err(e) = voices.run_due(graph, chain, now) {
                    warn!("voice timers: {e}");
                }
                self.pending = graph.render_quantum().clone();
                self.pending_pos = 0;
            }
            let n = (RENDER_QUANTUM - self.pending_pos).min(frames - written);
            let src = self.pending_pos..self.pending_pos + n;
            left[written..written + n].copy_from_slice(&self.pending.channels[0][src.clone()]);
            right[written..written + n].copy_from_slice(&self.pending.channels[1][src]);
            self.pending_pos += n;
            written += n;
        }
    }

    /// Latest post-limiter samples, oldest first. Zeros before
    /// initialization.
    pub fn analyser_data(&self, out: &mut [f32]) -> Result<(), SynthError> {
        match self.engine.as_ref() {
            Some(engine) => engine.chain.analyser_data(&engine.graph, out)?,
            None => out.fill(0.0),
        }
        Ok(())
    }
}
