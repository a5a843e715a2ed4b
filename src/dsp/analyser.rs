//! Analyser tap. Keeps the most recent mono samples for visualization.

/// Ring buffer of the last `size` mono (L+R average) samples.
#[derive(Debug, Clone)]
pub struct Analyser {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl Analyser {
    pub fn new(size: usize) -> Self {
        Analyser {
            buffer: vec![0.0; size.max(1)],
            write_pos: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn push(&mut self, left: f32, right: f32) {
        self.buffer[self.write_pos] = 0.5 * (left + right);
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Copy the most recent samples, oldest first, into `out`. If `out` is
    /// shorter than the buffer the newest `out.len()` samples are returned.
    pub fn get_float_time_domain_data(&self, out: &mut [f32]) {
        let len = self.buffer.len();
        let n = out.len().min(len);
        let start = (self.write_pos + len - n) % len;
        for (i, slot) in out.iter_mut().take(n).enumerate() {
            *slot = self.buffer[(start + i) % len];
        }
        out[n..].fill(0.0);
    }
}
