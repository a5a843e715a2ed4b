//! Uniformly partitioned FFT convolution for the reverb stage.
//!
//! The impulse response is split into blocks of the render quantum size and
//! each block's spectrum is precomputed. Every quantum, the spectrum of the
//! last two input blocks is pushed into a frequency-domain delay line and
//! multiplied against the partitions (overlap-save), so a long impulse
//! response adds no latency beyond the quantum itself.

use rand::Rng;
use realfft::num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// A two-channel impulse response.
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
    pub channels: [Vec<f32>; 2],
}

impl ImpulseResponse {
    /// Procedural room: white noise under a `(1 - t/len)²` decay, one
    /// independent noise sequence per channel, normalized to unit energy.
    pub fn synthetic<R: Rng>(sample_rate: f64, seconds: f64, rng: &mut R) -> Self {
        let len = ((sample_rate * seconds) as usize).max(1);
        let left = decaying_noise(len, rng);
        let right = decaying_noise(len, rng);
        let mut ir = ImpulseResponse {
            channels: [left, right],
        };
        ir.normalize();
        ir
    }

    /// Per-channel energy `Σh²`.
    pub fn energy(&self) -> [f32; 2] {
        self.channels
            .each_ref()
            .map(|taps| taps.iter().map(|h| h * h).sum())
    }

    /// Scale both channels by one factor so their mean energy is 1. A
    /// broadband signal then leaves the convolver at its input level.
    pub fn normalize(&mut self) {
        let [left, right] = self.energy();
        let mean = 0.5 * (left + right);
        if mean <= f32::EPSILON {
            return;
        }
        let scale = mean.sqrt().recip();
        for taps in &mut self.channels {
            taps.iter_mut().for_each(|h| *h *= scale);
        }
    }

    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }
}

fn decaying_noise<R: Rng>(len: usize, rng: &mut R) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let decay = 1.0 - i as f32 / len as f32;
            rng.gen_range(-1.0f32..=1.0) * decay * decay
        })
        .collect()
}

/// Per-channel convolution state.
struct ChannelConvolver {
    partitions: Vec<Vec<Complex32>>,
    fdl: Vec<Vec<Complex32>>,
    fdl_pos: usize,
    window: Vec<f32>,
    scratch_time: Vec<f32>,
    scratch_freq: Vec<Complex32>,
    accum: Vec<Complex32>,
}

pub struct Convolver {
    block_size: usize,
    fft_size: usize,
    r2c: Arc<dyn RealToComplex<f32>>,
    c2r: Arc<dyn ComplexToReal<f32>>,
    channels: [ChannelConvolver; 2],
}

impl std::fmt::Debug for Convolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Convolver")
            .field("block_size", &self.block_size)
            .field("partitions", &self.channels[0].partitions.len())
            .finish()
    }
}

impl Convolver {
    pub fn new(ir: &ImpulseResponse, block_size: usize) -> Self {
        let fft_size = block_size * 2;
        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let c2r = planner.plan_fft_inverse(fft_size);

        let make_channel = |taps: &[f32]| -> ChannelConvolver {
            let count = taps.len().div_ceil(block_size).max(1);
            let mut partitions = Vec::with_capacity(count);
            for chunk in 0..count {
                let start = chunk * block_size;
                let end = (start + block_size).min(taps.len());
                let mut padded = r2c.make_input_vec();
                if start < end {
                    padded[..end - start].copy_from_slice(&taps[start..end]);
                }
                let mut spectrum = r2c.make_output_vec();
                if r2c.process(&mut padded, &mut spectrum).is_err() {
                    spectrum.fill(Complex32::new(0.0, 0.0));
                }
                partitions.push(spectrum);
            }
            let bins = fft_size / 2 + 1;
            ChannelConvolver {
                fdl: vec![vec![Complex32::new(0.0, 0.0); bins]; count],
                partitions,
                fdl_pos: 0,
                window: vec![0.0; fft_size],
                scratch_time: vec![0.0; fft_size],
                scratch_freq: vec![Complex32::new(0.0, 0.0); bins],
                accum: vec![Complex32::new(0.0, 0.0); bins],
            }
        };

        let left = make_channel(&ir.channels[0]);
        let right = make_channel(&ir.channels[1]);

        Convolver {
            block_size,
            fft_size,
            r2c,
            c2r,
            channels: [left, right],
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Convolve one block per channel. Slices must be `block_size` long.
    pub fn process(&mut self, input: [&[f32]; 2], output: [&mut [f32]; 2]) {
        let [out_l, out_r] = output;
        self.process_channel(0, input[0], out_l);
        self.process_channel(1, input[1], out_r);
    }

    fn process_channel(&mut self, channel: usize, input: &[f32], output: &mut [f32]) {
        let b = self.block_size;
        let scale = 1.0 / self.fft_size as f32;
        let state = &mut self.channels[channel];

        // Slide the two-block input window.
        state.window.copy_within(b.., 0);
        state.window[b..].copy_from_slice(&input[..b]);

        state.scratch_time.copy_from_slice(&state.window);
        if self
            .r2c
            .process(&mut state.scratch_time, &mut state.scratch_freq)
            .is_err()
        {
            output.fill(0.0);
            return;
        }

        let count = state.partitions.len();
        state.fdl_pos = (state.fdl_pos + count - 1) % count;
        state.fdl[state.fdl_pos].copy_from_slice(&state.scratch_freq);

        state.accum.fill(Complex32::new(0.0, 0.0));
        for (k, partition) in state.partitions.iter().enumerate() {
            let spectrum = &state.fdl[(state.fdl_pos + k) % count];
            for ((acc, x), h) in state.accum.iter_mut().zip(spectrum).zip(partition) {
                *acc += x * h;
            }
        }

        // A real signal's DC and Nyquist bins carry no imaginary part.
        if let Some(first) = state.accum.first_mut() {
            first.im = 0.0;
        }
        if let Some(last) = state.accum.last_mut() {
            last.im = 0.0;
        }

        if self
            .c2r
            .process(&mut state.accum, &mut state.scratch_time)
            .is_err()
        {
            output.fill(0.0);
            return;
        }

        for (o, s) in output[..b].iter_mut().zip(&state.scratch_time[b..]) {
            *o = s * scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    fn direct_convolution(x: &[f32], h: &[f32]) -> Vec<f32> {
        let mut y = vec![0.0; x.len()];
        for n in 0..x.len() {
            for (k, &hk) in h.iter().enumerate() {
                if k <= n {
                    y[n] += hk * x[n - k];
                }
            }
        }
        y
    }

    #[test]
    fn synthetic_ir_decays() {
        let mut rng = StdRng::seed_from_u64(1);
        let ir = ImpulseResponse::synthetic(1000.0, 2.0, &mut rng);
        assert_eq!(ir.len(), 2000);
        let head: f32 = ir.channels[0][..200].iter().map(|s| s.abs()).sum();
        let tail: f32 = ir.channels[0][1800..].iter().map(|s| s.abs()).sum();
        assert!(head > tail * 10.0, "IR should decay: head {head}, tail {tail}");
        assert_ne!(ir.channels[0], ir.channels[1], "channels should differ");
    }

    #[test]
    fn matches_direct_convolution() {
        let block = 16;
        let ir = ImpulseResponse {
            channels: [
                (0..40).map(|i| 1.0 / (i as f32 + 1.0)).collect(),
                (0..40).map(|i| if i == 3 { 1.0 } else { 0.0 }).collect(),
            ],
        };
        let mut conv = Convolver::new(&ir, block);

        let input: Vec<f32> = (0..96).map(|i| ((i * 7 % 11) as f32 - 5.0) / 5.0).collect();
        let expect_l = direct_convolution(&input, &ir.channels[0]);
        let expect_r = direct_convolution(&input, &ir.channels[1]);

        let mut got_l = Vec::new();
        let mut got_r = Vec::new();
        for chunk in input.chunks(block) {
            let mut l = vec![0.0; block];
            let mut r = vec![0.0; block];
            conv.process([chunk, chunk], [l.as_mut_slice(), r.as_mut_slice()]);
            got_l.extend(l);
            got_r.extend(r);
        }

        for i in 0..input.len() {
            assert!((got_l[i] - expect_l[i]).abs() < 1e-4, "left {i}: {} vs {}", got_l[i], expect_l[i]);
            assert!((got_r[i] - expect_r[i]).abs() < 1e-4, "right {i}: {} vs {}", got_r[i], expect_r[i]);
        }
    }

    #[test]
    fn synthetic_ir_has_unit_energy() {
        let mut rng = StdRng::seed_from_u64(9);
        let ir = ImpulseResponse::synthetic(44100.0, 2.0, &mut rng);
        let [left, right] = ir.energy();
        assert!((0.5 * (left + right) - 1.0).abs() < 1e-3, "energy {left} {right}");
        assert!((left / right).log10().abs() < 0.1, "channels unbalanced: {left} vs {right}");
    }

    #[test]
    fn wet_level_tracks_dry_level() {
        let sample_rate = 8000.0;
        let block = 128;
        let mut rng = StdRng::seed_from_u64(4);
        let ir = ImpulseResponse::synthetic(sample_rate, 0.5, &mut rng);
        let mut conv = Convolver::new(&ir, block);

        let input: Vec<f32> = (0..block * 125).map(|_| rng.gen_range(-0.5f32..=0.5)).collect();
        let mut wet_l = Vec::new();
        let mut wet_r = Vec::new();
        for chunk in input.chunks(block) {
            let mut l = vec![0.0; block];
            let mut r = vec![0.0; block];
            conv.process([chunk, chunk], [l.as_mut_slice(), r.as_mut_slice()]);
            wet_l.extend(l);
            wet_r.extend(r);
        }

        // Past the IR length the tail is fully engaged.
        let settled = sample_rate as usize;
        let dry = rms(&input[settled..]);
        for wet in [&wet_l, &wet_r] {
            let ratio_db = 20.0 * (rms(&wet[settled..]) / dry).log10();
            assert!(ratio_db.abs() < 3.0, "wet/dry {ratio_db} dB");
        }

        // A steady tone stays bounded as well.
        let mut conv = Convolver::new(&ir, block);
        let tone: Vec<f32> = (0..block * 125)
            .map(|i| 0.5 * (std::f32::consts::TAU * 220.0 * i as f32 / sample_rate as f32).sin())
            .collect();
        let mut peak = 0.0f32;
        for chunk in tone.chunks(block) {
            let mut l = vec![0.0; block];
            let mut r = vec![0.0; block];
            conv.process([chunk, chunk], [l.as_mut_slice(), r.as_mut_slice()]);
            peak = l.iter().chain(&r).fold(peak, |m, s| m.max(s.abs()));
        }
        assert!(peak < 2.0, "tone peak {peak}");
    }
}
