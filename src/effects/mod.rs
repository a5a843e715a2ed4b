//! Shared effects chain.
//!
//! Built once, on first use, as a single patch:
//!
//! ```text
//! master → distortion → chorus → flanger → delay → reverb → limiter → analyser → destination
//! ```
//!
//! Chorus, flanger, delay and reverb are parallel dry/wet pairs summed on a
//! bus gain that feeds the next stage. Chorus and flanger each own a sine
//! LFO whose output, scaled by a depth gain, modulates their delay time.
//! After construction only parameters change: gains, delay times, feedback,
//! LFO frequencies, the distortion curve and the limiter settings.

pub mod limiter;

use crate::config::EngineConfig;
use crate::dsp::convolver::ImpulseResponse;
use crate::dsp::oscillator::Waveform;
use crate::dsp::waveshaper::{CURVE_LEN, Oversample, distortion_curve};
use crate::error::GraphError;
use crate::graph::node::{NodeSpec, Processor};
use crate::graph::patch::{Endpoint, Patch, PatchInstance, PatchNode};
use crate::graph::{Graph, NodeId, ParamKind, Port};
use crate::params::{EffectParams, ParamTarget, ParameterModel};
use limiter::Limiter;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

/// Longest chorus/flanger delay, seconds.
const MOD_DELAY_MAX: f64 = 0.05;
const CHORUS_BASE: f64 = 0.020;
const CHORUS_SWING: f64 = 0.005;
const FLANGER_BASE: f64 = 0.005;
const FLANGER_SWING: f64 = 0.003;

/// Master gain multiplier for `voices` simultaneous voices:
/// `min(1, 0.5 + 0.5 / √N)`, 1 when nothing is playing.
pub fn compensation_factor(voices: usize) -> f64 {
    if voices == 0 {
        return 1.0;
    }
    (0.5 + 0.5 / (voices as f64).sqrt()).min(1.0)
}

/// LFO-swept short delay mixed in parallel with the dry signal.
#[derive(Debug, Clone, Copy)]
struct ModulatedDelay {
    lfo: PatchNode,
    depth: PatchNode,
    line: PatchNode,
    wet: PatchNode,
    bus: PatchNode,
    base: f64,
    swing: f64,
}

impl ModulatedDelay {
    fn add_to(
        patch: &mut Patch,
        input: PatchNode,
        labels: [&'static str; 6],
        base: f64,
        swing: f64,
    ) -> Self {
        let [lfo_l, depth_l, line_l, dry_l, wet_l, bus_l] = labels;
        let lfo = patch.add(
            lfo_l,
            NodeSpec::Oscillator {
                waveform: Waveform::Sine,
                frequency: 1.0,
                detune: 0.0,
            },
        );
        let depth = patch.add(depth_l, NodeSpec::gain(0.0));
        let line = patch.add(
            line_l,
            NodeSpec::Delay {
                delay_time: base,
                feedback: 0.0,
                max_delay: MOD_DELAY_MAX,
            },
        );
        let dry = patch.add(dry_l, NodeSpec::gain(1.0));
        let wet = patch.add(wet_l, NodeSpec::gain(0.0));
        let bus = patch.add(bus_l, NodeSpec::gain(1.0));

        patch.connect(input, Endpoint::Input(dry));
        patch.connect(input, Endpoint::Input(line));
        patch.chain(&[line, wet, bus]);
        patch.connect(dry, Endpoint::Input(bus));
        patch.chain(&[lfo, depth]);
        patch.connect(depth, Endpoint::Param(line, ParamKind::DelayTime));

        ModulatedDelay {
            lfo,
            depth,
            line,
            wet,
            bus,
            base,
            swing,
        }
    }
}

/// Plain dry/wet split around one processing node.
#[derive(Debug, Clone, Copy)]
struct Blend {
    dry: PatchNode,
    wet: PatchNode,
    bus: PatchNode,
    node: PatchNode,
}

impl Blend {
    fn add_to(patch: &mut Patch, input: PatchNode, node: PatchNode, labels: [&'static str; 3]) -> Self {
        let [dry_l, wet_l, bus_l] = labels;
        let dry = patch.add(dry_l, NodeSpec::gain(1.0));
        let wet = patch.add(wet_l, NodeSpec::gain(0.0));
        let bus = patch.add(bus_l, NodeSpec::gain(1.0));
        patch.connect(input, Endpoint::Input(dry));
        patch.connect(input, Endpoint::Input(node));
        patch.chain(&[node, wet, bus]);
        patch.connect(dry, Endpoint::Input(bus));
        Blend { dry, wet, bus, node }
    }
}

#[derive(Debug)]
pub struct EffectsChain {
    patch: Patch,
    nodes: PatchInstance,
    master: PatchNode,
    distortion: PatchNode,
    chorus: ModulatedDelay,
    flanger: ModulatedDelay,
    echo: Blend,
    reverb: Blend,
    limiter: Limiter,
    analyser: PatchNode,
    gain_ramp: f64,
    master_volume: f64,
    voices: usize,
}

impl EffectsChain {
    /// Build the chain into `graph`, wire it to the destination and apply
    /// `model`.
    pub fn new<R: Rng>(
        graph: &mut Graph,
        config: &EngineConfig,
        model: &ParameterModel,
        rng: &mut R,
    ) -> Result<Self, GraphError> {
        let ir = ImpulseResponse::synthetic(graph.sample_rate(), config.reverb_seconds, rng);
        let mut patch = Patch::new();

        let master = patch.add("master", NodeSpec::gain(model.master_volume));
        let distortion = patch.add(
            "distortion",
            NodeSpec::WaveShaper {
                curve: None,
                oversample: Oversample::X2,
            },
        );
        patch.chain(&[master, distortion]);

        let chorus = ModulatedDelay::add_to(
            &mut patch,
            distortion,
            ["chorus_lfo", "chorus_depth", "chorus_delay", "chorus_dry", "chorus_wet", "chorus_bus"],
            CHORUS_BASE,
            CHORUS_SWING,
        );
        let flanger = ModulatedDelay::add_to(
            &mut patch,
            chorus.bus,
            [
                "flanger_lfo",
                "flanger_depth",
                "flanger_delay",
                "flanger_dry",
                "flanger_wet",
                "flanger_bus",
            ],
            FLANGER_BASE,
            FLANGER_SWING,
        );

        let echo_line = patch.add(
            "delay_line",
            NodeSpec::Delay {
                delay_time: model.effects.delay_time,
                feedback: model.effects.delay_feedback,
                max_delay: config.max_delay,
            },
        );
        let echo = Blend::add_to(&mut patch, flanger.bus, echo_line, ["delay_dry", "delay_wet", "delay_bus"]);

        let convolver = patch.add("reverb_convolver", NodeSpec::Convolver { ir: Arc::new(ir) });
        let reverb = Blend::add_to(&mut patch, echo.bus, convolver, ["reverb_dry", "reverb_wet", "reverb_bus"]);

        let limiter = Limiter::add_to(&mut patch, reverb.bus, &model.limiter);
        let analyser = patch.add(
            "analyser",
            NodeSpec::Analyser {
                size: config.analyser_size,
            },
        );
        patch.connect(limiter.output(), Endpoint::Input(analyser));
        patch.connect(analyser, Endpoint::External(Port::Input(graph.destination())));

        let nodes = patch.instantiate(graph)?;
        let now = graph.current_time();
        graph.start(nodes.id(chorus.lfo), now)?;
        graph.start(nodes.id(flanger.lfo), now)?;

        let mut chain = EffectsChain {
            patch,
            nodes,
            master,
            distortion,
            chorus,
            flanger,
            echo,
            reverb,
            limiter,
            analyser,
            gain_ramp: config.gain_ramp,
            master_volume: model.master_volume,
            voices: 0,
        };
        chain.apply(graph, model)?;
        debug!(nodes = chain.patch.len(), "effects chain built");
        Ok(chain)
    }

    /// Declarative description of the chain's topology.
    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    /// Entry point voices connect to.
    pub fn input(&self) -> NodeId {
        self.nodes.id(self.master)
    }

    pub fn analyser(&self) -> NodeId {
        self.nodes.id(self.analyser)
    }

    /// Copy the most recent post-limiter samples into `out`.
    pub fn analyser_data(&self, graph: &Graph, out: &mut [f32]) -> Result<(), GraphError> {
        if let Processor::Analyser(a) = graph.node(self.analyser())?.processor() {
            a.get_float_time_domain_data(out);
        }
        Ok(())
    }

    /// Every node the chain owns.
    pub fn node_ids(&self) -> &[NodeId] {
        self.nodes.ids()
    }

    pub fn voices(&self) -> usize {
        self.voices
    }

    /// Current master gain target (volume × compensation).
    pub fn master_gain(&self) -> f64 {
        self.master_volume * compensation_factor(self.voices)
    }

    /// Apply every effect, master and limiter field of `model`.
    pub fn apply(&mut self, graph: &mut Graph, model: &ParameterModel) -> Result<(), GraphError> {
        let fx = &model.effects;
        self.set_distortion_drive(graph, fx.distortion_drive)?;
        self.set_chorus(graph, fx.chorus_rate, fx.chorus_depth)?;
        self.set_flanger(graph, fx.flanger_rate, fx.flanger_depth, fx.flanger_feedback)?;
        self.set_delay(graph, fx.delay_time, fx.delay_feedback, fx.delay_mix)?;
        self.set_reverb_mix(graph, fx.reverb_mix)?;
        self.set_limiter(graph, model)?;
        self.set_master_volume(graph, model.master_volume)
    }

    /// Apply only the stage `target` belongs to. Per-voice targets are
    /// ignored.
    pub fn apply_target(
        &mut self,
        graph: &mut Graph,
        model: &ParameterModel,
        target: ParamTarget,
    ) -> Result<(), GraphError> {
        use ParamTarget::*;
        let fx: &EffectParams = &model.effects;
        match target {
            DistortionDrive => self.set_distortion_drive(graph, fx.distortion_drive),
            ChorusRate | ChorusDepth => self.set_chorus(graph, fx.chorus_rate, fx.chorus_depth),
            FlangerRate | FlangerDepth | FlangerFeedback => {
                self.set_flanger(graph, fx.flanger_rate, fx.flanger_depth, fx.flanger_feedback)
            }
            DelayTime | DelayFeedback | DelayMix => {
                self.set_delay(graph, fx.delay_time, fx.delay_feedback, fx.delay_mix)
            }
            ReverbMix => self.set_reverb_mix(graph, fx.reverb_mix),
            MasterVolume => self.set_master_volume(graph, model.master_volume),
            LimiterGain | LimiterCeiling | LimiterLookahead | LimiterRelease => {
                self.set_limiter(graph, model)
            }
            _ => Ok(()),
        }
    }

    pub fn set_master_volume(&mut self, graph: &mut Graph, volume: f64) -> Result<(), GraphError> {
        self.master_volume = volume.clamp(0.0, 1.0);
        self.ramp_master(graph)
    }

    /// Recompute polyphony compensation for `voices` active voices.
    pub fn set_polyphony(&mut self, graph: &mut Graph, voices: usize) -> Result<(), GraphError> {
        if voices == self.voices {
            return Ok(());
        }
        self.voices = voices;
        self.ramp_master(graph)
    }

    fn ramp_master(&self, graph: &mut Graph) -> Result<(), GraphError> {
        let target = self.master_gain();
        self.ramp(graph, self.master, ParamKind::Gain, target)
    }

    /// Replace the distortion curve. Zero drive removes the curve, which is
    /// an exact passthrough.
    pub fn set_distortion_drive(&mut self, graph: &mut Graph, drive: f64) -> Result<(), GraphError> {
        let drive = drive.clamp(0.0, 1.0);
        let id = self.nodes.id(self.distortion);
        if let Processor::WaveShaper(ws) = graph.node_mut(id)?.processor_mut() {
            let curve = (drive > 0.0).then(|| Arc::from(distortion_curve(drive, CURVE_LEN)));
            ws.set_curve(curve);
        }
        Ok(())
    }

    pub fn set_chorus(&mut self, graph: &mut Graph, rate: f64, depth: f64) -> Result<(), GraphError> {
        let stage = self.chorus;
        self.set_modulated(graph, &stage, rate, depth, 0.0)
    }

    pub fn set_flanger(
        &mut self,
        graph: &mut Graph,
        rate: f64,
        depth: f64,
        feedback: f64,
    ) -> Result<(), GraphError> {
        let stage = self.flanger;
        self.set_modulated(graph, &stage, rate, depth, feedback)
    }

    fn set_modulated(
        &self,
        graph: &mut Graph,
        stage: &ModulatedDelay,
        rate: f64,
        depth: f64,
        feedback: f64,
    ) -> Result<(), GraphError> {
        let depth = depth.clamp(0.0, 1.0);
        self.ramp(graph, stage.lfo, ParamKind::Frequency, rate.max(0.0))?;
        self.ramp(graph, stage.depth, ParamKind::Gain, stage.swing * depth)?;
        self.ramp(graph, stage.line, ParamKind::DelayTime, stage.base)?;
        self.ramp(graph, stage.line, ParamKind::Feedback, feedback)?;
        self.ramp(graph, stage.wet, ParamKind::Gain, 0.5 * depth)
    }

    pub fn set_delay(&mut self, graph: &mut Graph, time: f64, feedback: f64, mix: f64) -> Result<(), GraphError> {
        let mix = mix.clamp(0.0, 1.0);
        let echo = self.echo;
        self.ramp(graph, echo.node, ParamKind::DelayTime, time)?;
        self.ramp(graph, echo.node, ParamKind::Feedback, feedback)?;
        self.set_blend(graph, &echo, mix)
    }

    pub fn set_reverb_mix(&mut self, graph: &mut Graph, mix: f64) -> Result<(), GraphError> {
        let reverb = self.reverb;
        self.set_blend(graph, &reverb, mix.clamp(0.0, 1.0))
    }

    fn set_blend(&self, graph: &mut Graph, blend: &Blend, mix: f64) -> Result<(), GraphError> {
        self.ramp(graph, blend.dry, ParamKind::Gain, 1.0 - mix)?;
        self.ramp(graph, blend.wet, ParamKind::Gain, mix)
    }

    pub fn set_limiter(&mut self, graph: &mut Graph, model: &ParameterModel) -> Result<(), GraphError> {
        self.limiter.apply(graph, &self.nodes, &model.limiter, self.gain_ramp)
    }

    /// Glide a parameter of one of the chain's nodes to `value`.
    fn ramp(&self, graph: &mut Graph, node: PatchNode, kind: ParamKind, value: f64) -> Result<(), GraphError> {
        let now = graph.current_time();
        let param = graph.param_mut(self.nodes.id(node), kind)?;
        param.cancel_and_hold_at_time(now);
        param.linear_ramp_to_value_at_time(value, now + self.gain_ramp);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::noise::noise_buffer;
    use crate::graph::RENDER_QUANTUM;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build(model: &ParameterModel) -> (Graph, EffectsChain) {
        let config = EngineConfig {
            sample_rate: 8000.0,
            reverb_seconds: 0.1,
            ..EngineConfig::default()
        };
        let mut graph = Graph::new(config.sample_rate);
        let mut rng = StdRng::seed_from_u64(3);
        let chain = EffectsChain::new(&mut graph, &config, model, &mut rng).unwrap();
        (graph, chain)
    }

    /// Start `spec` at `start` (optionally stopping at `stop`) feeding the
    /// chain input.
    fn feed(graph: &mut Graph, chain: &EffectsChain, spec: NodeSpec, start: f64, stop: Option<f64>) {
        let id = graph.add(spec);
        graph.connect(id, Port::Input(chain.input())).unwrap();
        graph.start(id, start).unwrap();
        if let Some(stop) = stop {
            graph.stop(id, stop).unwrap();
        }
    }

    fn sine(frequency: f64) -> NodeSpec {
        NodeSpec::Oscillator {
            waveform: Waveform::Sine,
            frequency,
            detune: 0.0,
        }
    }

    /// Render whole quanta covering `seconds`; left channel only, since the
    /// reverb decorrelates left from right.
    fn render(graph: &mut Graph, seconds: f64) -> Vec<f32> {
        let quanta = (seconds * graph.sample_rate() / RENDER_QUANTUM as f64).ceil() as usize;
        let mut out = Vec::with_capacity(quanta * RENDER_QUANTUM);
        for _ in 0..quanta {
            out.extend_from_slice(&graph.render_quantum().channels[0]);
        }
        out
    }

    /// Peak over `[from, to)` seconds at the 8 kHz test rate.
    fn peak(out: &[f32], from: f64, to: f64) -> f32 {
        out[(from * 8000.0) as usize..(to * 8000.0) as usize]
            .iter()
            .fold(0.0f32, |m, s| m.max(s.abs()))
    }

    fn rms(out: &[f32], from: f64, to: f64) -> f32 {
        let window = &out[(from * 8000.0) as usize..(to * 8000.0) as usize];
        (window.iter().map(|s| s * s).sum::<f32>() / window.len() as f32).sqrt()
    }

    #[test]
    fn compensation_matches_formula() {
        assert_eq!(compensation_factor(0), 1.0);
        assert_eq!(compensation_factor(1), 1.0);
        for (n, expected) in [(2, 0.854), (4, 0.75), (9, 0.667)] {
            let got = compensation_factor(n);
            assert!((got - expected).abs() < 1e-3, "N={n}: {got}");
        }
    }

    #[test]
    fn topology_runs_in_order() {
        let (_, chain) = build(&ParameterModel::default());
        let labels = chain.patch().edge_labels();
        let expected = [
            ("master", "distortion"),
            ("distortion", "chorus_dry"),
            ("distortion", "chorus_delay"),
            ("chorus_delay", "chorus_wet"),
            ("chorus_wet", "chorus_bus"),
            ("chorus_dry", "chorus_bus"),
            ("chorus_lfo", "chorus_depth"),
            ("chorus_depth", "chorus_delay.delayTime"),
            ("chorus_bus", "flanger_dry"),
            ("chorus_bus", "flanger_delay"),
            ("flanger_depth", "flanger_delay.delayTime"),
            ("flanger_bus", "delay_dry"),
            ("flanger_bus", "delay_line"),
            ("delay_line", "delay_wet"),
            ("delay_bus", "reverb_dry"),
            ("delay_bus", "reverb_convolver"),
            ("reverb_convolver", "reverb_wet"),
            ("reverb_bus", "limiter_gain"),
            ("limiter_gain", "limiter_compressor"),
            ("limiter_compressor", "limiter_clipper"),
            ("limiter_clipper", "analyser"),
            ("analyser", "external"),
        ];
        for (from, to) in expected {
            assert!(
                labels.contains(&(from, to.to_string())),
                "missing edge {from} -> {to}"
            );
        }
        // Nothing bypasses the limiter on its way out.
        let outbound: Vec<_> = labels.iter().filter(|(_, to)| to == "external").collect();
        assert_eq!(outbound.len(), 1);
    }

    #[test]
    fn silence_in_silence_out() {
        let (mut graph, _) = build(&ParameterModel::default());
        for _ in 0..20 {
            assert!(graph.render_quantum().peak() < 1e-6);
        }
    }

    #[test]
    fn polyphony_ramps_master_gain() {
        let model = ParameterModel::default();
        let (mut graph, mut chain) = build(&model);
        chain.set_polyphony(&mut graph, 4).unwrap();
        assert!((chain.master_gain() - model.master_volume * 0.75).abs() < 1e-12);

        // 10 ms at 8 kHz is 80 frames; one quantum later the ramp is done.
        graph.render_quantum();
        let now = graph.current_time();
        let gain = graph
            .param_mut(chain.input(), ParamKind::Gain)
            .unwrap()
            .value_at(now);
        assert!((gain - model.master_volume * 0.75).abs() < 1e-9);
    }

    #[test]
    fn mix_controls_move_dry_and_wet() {
        let (mut graph, mut chain) = build(&ParameterModel::default());
        chain.set_reverb_mix(&mut graph, 0.3).unwrap();
        chain.set_chorus(&mut graph, 2.0, 0.8).unwrap();
        for _ in 0..2 {
            graph.render_quantum();
        }
        let now = graph.current_time();
        let mut value = |node: PatchNode, kind: ParamKind| {
            graph
                .param_mut(chain.nodes.id(node), kind)
                .unwrap()
                .value_at(now)
        };
        assert!((value(chain.reverb.dry, ParamKind::Gain) - 0.7).abs() < 1e-9);
        assert!((value(chain.reverb.wet, ParamKind::Gain) - 0.3).abs() < 1e-9);
        assert!((value(chain.chorus.wet, ParamKind::Gain) - 0.4).abs() < 1e-9);
        assert!((value(chain.chorus.depth, ParamKind::Gain) - 0.004).abs() < 1e-9);
        assert!((value(chain.chorus.lfo, ParamKind::Frequency) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_drive_removes_curve() {
        let (mut graph, mut chain) = build(&ParameterModel::default());
        chain.set_distortion_drive(&mut graph, 0.5).unwrap();
        let id = chain.nodes.id(chain.distortion);
        let has_curve = |g: &Graph| match g.node(id).unwrap().processor() {
            Processor::WaveShaper(ws) => ws.curve().is_some(),
            _ => false,
        };
        assert!(has_curve(&graph));
        chain.set_distortion_drive(&mut graph, 0.0).unwrap();
        assert!(!has_curve(&graph));
    }

    #[test]
    fn echo_arrives_after_delay_time() {
        let mut model = ParameterModel::default();
        model.effects.delay_time = 0.25;
        model.effects.delay_feedback = 0.0;
        model.effects.delay_mix = 0.5;
        let (mut graph, chain) = build(&model);
        feed(&mut graph, &chain, sine(400.0), 0.05, Some(0.1));
        let out = render(&mut graph, 0.5);

        let burst = peak(&out, 0.05, 0.1);
        assert!(burst > 0.2, "burst {burst}");
        assert!(peak(&out, 0.12, 0.28) < 1e-3, "gap should be silent");
        let echo = peak(&out, 0.3, 0.35);
        assert!((echo / burst - 1.0).abs() < 0.2, "echo {echo} vs burst {burst}");
        assert!(peak(&out, 0.37, 0.5) < 1e-3, "no feedback repeats");
    }

    #[test]
    fn flanger_feedback_decays() {
        let mut model = ParameterModel::default();
        model.effects.flanger_depth = 1.0;
        model.effects.flanger_feedback = 0.8;
        model.effects.flanger_rate = 0.5;
        let (mut graph, chain) = build(&model);
        feed(&mut graph, &chain, sine(400.0), 0.05, Some(0.06));
        let out = render(&mut graph, 1.5);

        assert!(out.iter().all(|s| s.is_finite()));
        let ring = peak(&out, 0.065, 0.1);
        assert!(ring > 1e-3, "comb should ring after the burst: {ring}");
        let settling = peak(&out, 0.2, 0.3);
        let late = peak(&out, 1.0, 1.5);
        assert!(settling < ring, "tail grew: {settling} >= {ring}");
        assert!(late <= settling + 1e-6, "tail grew: {late} > {settling}");
        assert!(late < 1e-4, "tail {late}");
    }

    #[test]
    fn chorus_depth_changes_output() {
        let render_with = |depth: f64| {
            let mut model = ParameterModel::default();
            model.effects.chorus_depth = depth;
            model.effects.chorus_rate = 2.0;
            let (mut graph, chain) = build(&model);
            feed(&mut graph, &chain, sine(330.0), 0.0, None);
            render(&mut graph, 0.5)
        };
        let dry = render_with(0.0);
        let chorused = render_with(0.8);
        let diff = dry[800..]
            .iter()
            .zip(&chorused[800..])
            .fold(0.0f32, |m, (a, b)| m.max((a - b).abs()));
        assert!(diff > 0.05, "chorus had no audible effect: {diff}");
        assert!(peak(&chorused, 0.1, 0.5) < 1.0);
    }

    #[test]
    fn reverb_wet_level_tracks_dry_level() {
        let render_with = |mix: f64| {
            let mut model = ParameterModel::default();
            model.master_volume = 0.3;
            model.effects.reverb_mix = mix;
            let (mut graph, chain) = build(&model);
            let mut rng = StdRng::seed_from_u64(11);
            let buffer = noise_buffer(8000.0, 1.0, &mut rng);
            feed(&mut graph, &chain, NodeSpec::Noise { buffer }, 0.0, None);
            render(&mut graph, 1.0)
        };
        let dry = rms(&render_with(0.0), 0.3, 1.0);
        let wet = rms(&render_with(1.0), 0.3, 1.0);
        let ratio_db = 20.0 * (wet / dry).log10();
        assert!(ratio_db.abs() < 3.0, "reverb wet/dry {ratio_db} dB");
    }
}
