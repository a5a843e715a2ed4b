//! Voice manager: owns every voice and its timers.
//!
//! Active voices are keyed by [`NoteIdentity`]. A released voice leaves the
//! active map immediately and waits in `releasing` until its cleanup task
//! frees its nodes. Safety and cleanup timers are [`Scheduler`] tasks on the
//! audio clock, serviced by [`VoiceManager::run_due`] between quanta.

use super::{NoteIdentity, Voice, VoiceHandle, VoicePlan};
use crate::config::EngineConfig;
use crate::effects::EffectsChain;
use crate::error::GraphError;
use crate::graph::Graph;
use crate::params::ParameterModel;
use crate::scheduler::Scheduler;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
enum VoiceTask {
    /// Release a note that never received its note-off.
    SafetyRelease { identity: NoteIdentity, serial: u64 },
    /// Free the nodes of a voice whose release has finished.
    Cleanup { serial: u64 },
}

/// First frame at or after `time` seconds.
fn frame_at(graph: &Graph, time: f64) -> u64 {
    (time.max(0.0) * graph.sample_rate()).ceil() as u64
}

#[derive(Debug)]
pub struct VoiceManager {
    safety_timeout: f64,
    cleanup_margin: f64,
    noise: Arc<[f32]>,
    active: HashMap<NoteIdentity, Voice>,
    releasing: HashMap<u64, Voice>,
    tasks: Scheduler<VoiceTask>,
    next_serial: u64,
}

impl VoiceManager {
    /// `noise` is the shared looping buffer every noise source plays.
    pub fn new(config: &EngineConfig, noise: Arc<[f32]>) -> Self {
        VoiceManager {
            safety_timeout: config.safety_timeout,
            cleanup_margin: config.cleanup_margin,
            noise,
            active: HashMap::new(),
            releasing: HashMap::new(),
            tasks: Scheduler::new(),
            next_serial: 1,
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn releasing_count(&self) -> usize {
        self.releasing.len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_active(&self, identity: NoteIdentity) -> bool {
        self.active.contains_key(&identity)
    }

    pub fn voice(&self, identity: NoteIdentity) -> Option<&Voice> {
        self.active.get(&identity)
    }

    pub fn active_identities(&self) -> impl Iterator<Item = NoteIdentity> + '_ {
        self.active.keys().copied()
    }

    /// Start a voice for `identity`. Any voice already sounding or
    /// releasing under the same identity is stopped first, immediately.
    pub fn play_note(
        &mut self,
        graph: &mut Graph,
        chain: &mut EffectsChain,
        model: &ParameterModel,
        identity: NoteIdentity,
        frequency: f64,
        velocity: f64,
    ) -> Result<VoiceHandle, GraphError> {
        self.supersede(graph, identity);

        let serial = self.next_serial;
        self.next_serial += 1;
        let plan = VoicePlan::new(model, frequency, velocity, &self.noise, chain.input());
        let mut voice = match plan.instantiate(graph, identity, serial) {
            Ok(voice) => voice,
            Err(e) => {
                // A superseded voice is gone even though its replacement is not.
                if let Err(poly) = chain.set_polyphony(graph, self.active.len()) {
                    warn!(%poly, "polyphony update failed");
                }
                return Err(e);
            }
        };

        let due = frame_at(graph, graph.current_time() + self.safety_timeout);
        voice.safety = Some(self.tasks.schedule(due, VoiceTask::SafetyRelease { identity, serial }));
        let handle = voice.handle();
        self.active.insert(identity, voice);
        debug!(?identity, serial, frequency, velocity, voices = self.active.len(), "voice started");

        chain.set_polyphony(graph, self.active.len())?;
        Ok(handle)
    }

    /// Hard-stop and free every voice using `identity`.
    fn supersede(&mut self, graph: &mut Graph, identity: NoteIdentity) {
        if let Some(voice) = self.active.remove(&identity) {
            self.kill(graph, voice);
        }
        let stale: Vec<u64> = self
            .releasing
            .iter()
            .filter(|(_, v)| v.identity() == identity)
            .map(|(serial, _)| *serial)
            .collect();
        for serial in stale {
            if let Some(voice) = self.releasing.remove(&serial) {
                self.kill(graph, voice);
            }
        }
    }

    fn kill(&mut self, graph: &mut Graph, voice: Voice) {
        for task in [voice.safety, voice.cleanup].into_iter().flatten() {
            self.tasks.cancel(task);
        }
        voice.hard_stop(graph);
        voice.teardown(graph);
        debug!(serial = voice.serial(), "voice superseded");
    }

    /// Release the voice for `identity`. Returns `false` (and does nothing)
    /// when no voice is active for it.
    pub fn stop_note(
        &mut self,
        graph: &mut Graph,
        chain: &mut EffectsChain,
        identity: NoteIdentity,
    ) -> Result<bool, GraphError> {
        let Some(mut voice) = self.active.remove(&identity) else {
            return Ok(false);
        };
        if let Some(task) = voice.safety.take() {
            self.tasks.cancel(task);
        }

        let now = graph.current_time();
        let end = voice.release(graph, now);
        let serial = voice.serial();
        let due = frame_at(graph, end + self.cleanup_margin);
        voice.cleanup = Some(self.tasks.schedule(due, VoiceTask::Cleanup { serial }));
        self.releasing.insert(serial, voice);
        debug!(?identity, serial, release_end = end, voices = self.active.len(), "voice released");

        chain.set_polyphony(graph, self.active.len())?;
        Ok(true)
    }

    /// Release every active voice.
    pub fn stop_all(&mut self, graph: &mut Graph, chain: &mut EffectsChain) -> Result<(), GraphError> {
        let identities: Vec<NoteIdentity> = self.active.keys().copied().collect();
        for identity in identities {
            self.stop_note(graph, chain, identity)?;
        }
        Ok(())
    }

    /// Run every task due at or before `now` (a frame count).
    pub fn run_due(&mut self, graph: &mut Graph, chain: &mut EffectsChain, now: u64) -> Result<(), GraphError> {
        while let Some(task) = self.tasks.pop_due(now) {
            match task {
                VoiceTask::SafetyRelease { identity, serial } => {
                    if self.active.get(&identity).is_some_and(|v| v.serial() == serial) {
                        warn!(?identity, serial, "note held past safety timeout, releasing");
                        if let Some(voice) = self.active.get_mut(&identity) {
                            voice.safety = None;
                        }
                        self.stop_note(graph, chain, identity)?;
                    }
                }
                VoiceTask::Cleanup { serial } => {
                    if let Some(voice) = self.releasing.remove(&serial) {
                        voice.teardown(graph);
                        debug!(serial, nodes = voice.node_ids().len(), "voice cleaned up");
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ParamKind, RENDER_QUANTUM};
    use crate::notation::NoteName;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const SR: f64 = 8000.0;

    struct Rig {
        graph: Graph,
        chain: EffectsChain,
        voices: VoiceManager,
        model: ParameterModel,
    }

    impl Rig {
        fn new(config: EngineConfig) -> Self {
            let mut graph = Graph::new(config.sample_rate);
            let model = ParameterModel::default();
            let mut rng = StdRng::seed_from_u64(9);
            let chain = EffectsChain::new(&mut graph, &config, &model, &mut rng).unwrap();
            let noise: Arc<[f32]> = Arc::from(vec![0.25f32; 256]);
            Rig {
                graph,
                chain,
                voices: VoiceManager::new(&config, noise),
                model,
            }
        }

        fn play(&mut self, identity: NoteIdentity) -> VoiceHandle {
            self.voices
                .play_note(&mut self.graph, &mut self.chain, &self.model, identity, 220.0, 1.0)
                .unwrap()
        }

        fn stop(&mut self, identity: NoteIdentity) -> bool {
            self.voices
                .stop_note(&mut self.graph, &mut self.chain, identity)
                .unwrap()
        }

        /// Render for at least `seconds`, servicing timers between quanta.
        fn run(&mut self, seconds: f64) {
            let quanta = (seconds * SR / RENDER_QUANTUM as f64).ceil() as usize;
            for _ in 0..quanta {
                self.graph.render_quantum();
                let now = self.graph.current_frame();
                self.voices
                    .run_due(&mut self.graph, &mut self.chain, now)
                    .unwrap();
            }
        }

        fn amp_at(&mut self, identity: NoteIdentity, time: f64) -> f64 {
            let amp = self.voices.voice(identity).unwrap().amp();
            self.graph.param_mut(amp, ParamKind::Gain).unwrap().value_at(time)
        }
    }

    fn config() -> EngineConfig {
        EngineConfig {
            sample_rate: SR,
            reverb_seconds: 0.05,
            ..EngineConfig::default()
        }
    }

    fn middle_c() -> NoteIdentity {
        NoteIdentity::Manual {
            note: NoteName::C,
            octave_offset: 0,
        }
    }

    #[test]
    fn stop_is_idempotent() {
        let mut rig = Rig::new(config());
        rig.play(middle_c());
        assert!(rig.stop(middle_c()));
        let tasks = rig.voices.pending_tasks();
        let releasing = rig.voices.releasing_count();

        assert!(!rig.stop(middle_c()));
        assert_eq!(rig.voices.pending_tasks(), tasks);
        assert_eq!(rig.voices.releasing_count(), releasing);
        assert!(!rig.stop(NoteIdentity::Midi(1)));
    }

    #[test]
    fn retrigger_keeps_one_voice() {
        let mut rig = Rig::new(config());
        let first = rig.play(NoteIdentity::Midi(60));
        rig.run(0.02);
        let second = rig.play(NoteIdentity::Midi(60));
        assert_ne!(first.serial, second.serial);
        assert_eq!(rig.voices.active_count(), 1);
        assert_eq!(rig.voices.voice(NoteIdentity::Midi(60)).unwrap().serial(), second.serial);
        // The old voice's safety timer went with it.
        assert_eq!(rig.voices.pending_tasks(), 1);
    }

    #[test]
    fn retrigger_during_release_supersedes_it() {
        let mut rig = Rig::new(config());
        let before = rig.graph.node_count();
        let first = rig.play(NoteIdentity::Midi(64));
        rig.run(0.05);
        rig.stop(NoteIdentity::Midi(64));
        assert_eq!(rig.voices.releasing_count(), 1);

        rig.play(NoteIdentity::Midi(64));
        assert_eq!(rig.voices.releasing_count(), 0);
        assert_eq!(rig.voices.active_count(), 1);
        assert_eq!(rig.voices.pending_tasks(), 1);
        let voice = rig.voices.voice(NoteIdentity::Midi(64)).unwrap();
        assert!(voice.node_ids().iter().all(|id| rig.graph.contains(*id)));
        assert_eq!(rig.graph.node_count(), before + voice.node_ids().len());
        assert_ne!(voice.serial(), first.serial);
    }

    #[test]
    fn manual_and_midi_keys_are_distinct() {
        let mut rig = Rig::new(config());
        rig.play(middle_c());
        rig.play(NoteIdentity::Midi(60));
        assert_eq!(rig.voices.active_count(), 2);
    }

    #[test]
    fn polyphony_compensation_tracks_voice_count() {
        let mut rig = Rig::new(config());
        for note in [60u8, 64, 67, 71] {
            rig.play(NoteIdentity::Midi(note));
        }
        assert_eq!(rig.chain.voices(), 4);
        assert!((rig.chain.master_gain() - 0.7 * 0.75).abs() < 1e-12);
        rig.stop(NoteIdentity::Midi(60));
        assert_eq!(rig.chain.voices(), 3);
        rig.voices.stop_all(&mut rig.graph, &mut rig.chain).unwrap();
        assert_eq!(rig.chain.voices(), 0);
        assert_eq!(rig.chain.master_gain(), 0.7);
    }

    #[test]
    fn envelope_holds_then_releases_from_sustain() {
        let mut rig = Rig::new(config());
        let id = NoteIdentity::Midi(69);
        rig.play(id);
        assert!((rig.amp_at(id, 0.01) - 1.0).abs() < 1e-12);
        assert!((rig.amp_at(id, 0.11) - 0.7).abs() < 1e-12);

        rig.run(1.0);
        let now = rig.graph.current_time();
        assert!((rig.amp_at(id, now) - 0.7).abs() < 1e-12);

        let amp = rig.voices.voice(id).unwrap().amp();
        rig.stop(id);
        let gain = rig.graph.param_mut(amp, ParamKind::Gain).unwrap();
        assert!((gain.value_at(now) - 0.7).abs() < 1e-12);
        assert!((gain.value_at(now + 0.15) - 0.35).abs() < 1e-9);
        assert!(gain.value_at(now + 0.3).abs() < 1e-12);
    }

    #[test]
    fn release_mid_attack_starts_from_current_gain() {
        let mut rig = Rig::new(config());
        rig.model.amp.attack = 0.5;
        let id = NoteIdentity::Midi(69);
        rig.play(id);
        rig.run(0.1);
        let now = rig.graph.current_time();
        let expected = now / 0.5;
        let amp = rig.voices.voice(id).unwrap().amp();
        rig.stop(id);
        let gain = rig.graph.param_mut(amp, ParamKind::Gain).unwrap();
        assert!((gain.value_at(now) - expected).abs() < 1e-9);
    }

    #[test]
    fn cleanup_frees_nodes_after_release() {
        let mut rig = Rig::new(config());
        let baseline = rig.graph.node_count();
        rig.play(NoteIdentity::Midi(48));
        rig.run(0.05);
        rig.stop(NoteIdentity::Midi(48));
        assert_eq!(rig.voices.active_count(), 0);
        assert!(rig.graph.node_count() > baseline);

        // Default release 0.3 s plus 0.1 s margin.
        rig.run(0.35);
        assert_eq!(rig.voices.releasing_count(), 1);
        rig.run(0.1);
        assert_eq!(rig.voices.releasing_count(), 0);
        assert_eq!(rig.graph.node_count(), baseline);
        assert_eq!(rig.voices.pending_tasks(), 0);
    }

    #[test]
    fn safety_timeout_releases_held_note() {
        let mut rig = Rig::new(EngineConfig {
            safety_timeout: 0.1,
            ..config()
        });
        rig.play(NoteIdentity::Midi(50));
        rig.run(0.05);
        assert_eq!(rig.voices.active_count(), 1);
        rig.run(0.1);
        assert_eq!(rig.voices.active_count(), 0);
        assert_eq!(rig.voices.releasing_count(), 1);
        assert_eq!(rig.chain.voices(), 0);
    }

    #[test]
    fn failed_retrigger_still_updates_polyphony() {
        let mut rig = Rig::new(config());
        rig.play(NoteIdentity::Midi(60));
        rig.play(NoteIdentity::Midi(64));
        assert_eq!(rig.chain.voices(), 2);

        // With the master gone the replacement voice cannot be wired.
        rig.graph.remove(rig.chain.input()).unwrap();
        let result = rig.voices.play_note(
            &mut rig.graph,
            &mut rig.chain,
            &rig.model,
            NoteIdentity::Midi(60),
            220.0,
            1.0,
        );
        assert!(matches!(result, Err(GraphError::UnknownNode(_))));
        assert_eq!(rig.voices.active_count(), 1);
        assert_eq!(rig.chain.voices(), 1);
    }
}
