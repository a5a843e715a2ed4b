//! White-noise source backed by a pre-generated looping buffer.

use rand::Rng;
use std::sync::Arc;

/// Generate `seconds` of uniform white noise in [-1, 1].
///
/// The buffer is built once per engine and shared by every voice.
pub fn noise_buffer<R: Rng>(sample_rate: f64, seconds: f64, rng: &mut R) -> Arc<[f32]> {
    let len = ((sample_rate * seconds) as usize).max(1);
    (0..len).map(|_| rng.gen_range(-1.0f32..=1.0)).collect()
}

/// Looping playback over a shared noise buffer.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    buffer: Arc<[f32]>,
    position: usize,
}

impl NoiseSource {
    pub fn new(buffer: Arc<[f32]>) -> Self {
        NoiseSource { buffer, position: 0 }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        let s = self.buffer[self.position];
        self.position += 1;
        if self.position >= self.buffer.len() {
            self.position = 0;
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn buffer_in_range_and_not_silent() {
        let mut rng = StdRng::seed_from_u64(7);
        let buf = noise_buffer(8000.0, 0.5, &mut rng);
        assert_eq!(buf.len(), 4000);
        assert!(buf.iter().all(|s| (-1.0..=1.0).contains(s)));
        let energy: f32 = buf.iter().map(|s| s * s).sum::<f32>() / buf.len() as f32;
        // Uniform [-1, 1] has variance 1/3.
        assert!((energy - 1.0 / 3.0).abs() < 0.05, "energy {energy}");
    }

    #[test]
    fn source_loops() {
        let buf: Arc<[f32]> = Arc::from(vec![0.1, 0.2, 0.3]);
        let mut src = NoiseSource::new(buf);
        let out: Vec<f32> = (0..7).map(|_| src.next_sample()).collect();
        assert_eq!(out, vec![0.1, 0.2, 0.3, 0.1, 0.2, 0.3, 0.1]);
    }
}
