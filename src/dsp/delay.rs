//! Delay line — stereo circular buffer with fractional read and feedback.
//!
//! The line outputs only the delayed (wet) signal; dry/wet blending happens
//! in the graph with gain nodes. Feedback is applied inside the line so the
//! comb/echo loop never has to be expressed as a graph cycle.

/// Feedback ceiling; keeps loop gain strictly below one.
pub const MAX_FEEDBACK: f64 = 0.95;

#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer_l: Vec<f32>,
    buffer_r: Vec<f32>,
    write_pos: usize,
    sample_rate: f64,
    max_delay: f64,
}

impl DelayLine {
    /// Create a delay line that can hold up to `max_delay_seconds`.
    pub fn new(sample_rate: f64, max_delay_seconds: f64) -> Self {
        let buffer_size = (sample_rate * max_delay_seconds) as usize + 2;
        Self {
            buffer_l: vec![0.0; buffer_size],
            buffer_r: vec![0.0; buffer_size],
            write_pos: 0,
            sample_rate,
            max_delay: max_delay_seconds,
        }
    }

    pub fn max_delay(&self) -> f64 {
        self.max_delay
    }

    /// Read from the delay buffer with fractional (linear interpolation) delay.
    #[inline]
    fn read_interpolated(buffer: &[f32], write_pos: usize, delay_samples: f64) -> f32 {
        let buffer_len = buffer.len();
        let delay_int = delay_samples as usize;
        let frac = (delay_samples - delay_int as f64) as f32;

        let read_pos_0 = if write_pos >= delay_int {
            write_pos - delay_int
        } else {
            buffer_len - (delay_int - write_pos)
        };

        let read_pos_1 = if read_pos_0 == 0 {
            buffer_len - 1
        } else {
            read_pos_0 - 1
        };

        let s0 = buffer[read_pos_0];
        let s1 = buffer[read_pos_1];

        s0 + frac * (s1 - s0)
    }

    /// Process one stereo frame with the given delay time (seconds) and
    /// feedback, returning the delayed signal.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32, delay_time: f64, feedback: f64) -> (f32, f32) {
        let buffer_len = self.buffer_l.len();
        let max_samples = (buffer_len - 1) as f64;
        let delay_samples = (delay_time * self.sample_rate).clamp(1.0, max_samples);
        let feedback = feedback.clamp(0.0, MAX_FEEDBACK) as f32;

        let delayed_l = Self::read_interpolated(&self.buffer_l, self.write_pos, delay_samples);
        let delayed_r = Self::read_interpolated(&self.buffer_r, self.write_pos, delay_samples);

        self.buffer_l[self.write_pos] = left + delayed_l * feedback;
        self.buffer_r[self.write_pos] = right + delayed_r * feedback;

        self.write_pos = (self.write_pos + 1) % buffer_len;

        (delayed_l, delayed_r)
    }

    /// Clear the delay buffers.
    pub fn clear(&mut self) {
        self.buffer_l.fill(0.0);
        self.buffer_r.fill(0.0);
        self.write_pos = 0;
    }
}
