//! Time-scheduled parameter automation.
//!
//! An [`AudioParam`] holds an intrinsic value plus a timeline of step and
//! linear-ramp events anchored to the audio clock (seconds). The render loop
//! samples the timeline once per frame (a-rate) and adds any modulation
//! signal connected to the parameter on top.

/// A single automation event on a parameter timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEvent {
    /// Jump to `value` at `time`.
    SetValue { time: f64, value: f64 },
    /// Arrive at `value` at `time`, interpolating linearly from the
    /// previous event.
    LinearRamp { time: f64, value: f64 },
}

impl ParamEvent {
    pub fn time(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { time, .. } | ParamEvent::LinearRamp { time, .. } => time,
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { value, .. } | ParamEvent::LinearRamp { value, .. } => value,
        }
    }
}

/// An automatable parameter with a nominal range.
#[derive(Debug, Clone)]
pub struct AudioParam {
    value: f64,
    min: f64,
    max: f64,
    events: Vec<ParamEvent>,
}

impl AudioParam {
    pub fn new(value: f64, min: f64, max: f64) -> Self {
        AudioParam {
            value: sanitize(value, 0.0).clamp(min, max),
            min,
            max,
            events: Vec::new(),
        }
    }

    /// Nominal range `(min, max)`; computed values are clamped to it.
    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn events(&self) -> &[ParamEvent] {
        &self.events
    }

    /// Set the intrinsic value immediately, dropping any scheduled events.
    pub fn set_value(&mut self, value: f64) {
        self.events.clear();
        self.value = sanitize(value, self.value).clamp(self.min, self.max);
    }

    pub fn set_value_at_time(&mut self, value: f64, time: f64) {
        let value = sanitize(value, self.value);
        self.insert(ParamEvent::SetValue { time, value });
    }

    /// Ramp linearly from the preceding event to `value`, arriving at `time`.
    /// With no preceding event the ramp starts from the intrinsic value at
    /// time zero.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64) {
        let value = sanitize(value, self.value);
        self.insert(ParamEvent::LinearRamp { time, value });
    }

    /// Remove every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Freeze the parameter at whatever value it has at `time` and drop the
    /// remainder of the timeline. Returns the held value.
    pub fn cancel_and_hold_at_time(&mut self, time: f64) -> f64 {
        let held = self.value_at(time);
        self.events.retain(|e| e.time() < time);
        if self.events.is_empty() {
            self.events.push(ParamEvent::SetValue { time, value: held });
        } else {
            // A ramp keeps the already-rendered segment before `time` intact.
            self.events.push(ParamEvent::LinearRamp { time, value: held });
        }
        held
    }

    /// Timeline value at `time`, before modulation and clamping.
    pub fn value_at(&self, time: f64) -> f64 {
        // Index of the first event strictly after `time`.
        let next = self.events.partition_point(|e| e.time() <= time);

        let (prev_time, prev_value) = if next == 0 {
            (0.0, self.value)
        } else {
            let e = self.events[next - 1];
            (e.time(), e.value())
        };

        match self.events.get(next) {
            Some(&ParamEvent::LinearRamp { time: end, value: target }) => {
                let span = end - prev_time;
                if span <= 0.0 {
                    target
                } else {
                    let t = ((time - prev_time) / span).clamp(0.0, 1.0);
                    prev_value + (target - prev_value) * t
                }
            }
            _ => prev_value,
        }
    }

    /// Fill `out` with per-frame timeline values starting at `start` seconds.
    pub fn fill(&self, start: f64, sample_rate: f64, out: &mut [f64]) {
        if self.events.is_empty() {
            out.fill(self.value);
            return;
        }
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.value_at(start + i as f64 / sample_rate);
        }
    }

    /// Clamp a modulated value to the nominal range.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.min.max(0.0).min(self.max)
        } else {
            value.clamp(self.min, self.max)
        }
    }

    /// Drop events that can no longer influence values at or after `time`,
    /// folding the last one into the intrinsic value.
    pub fn prune_before(&mut self, time: f64) {
        let next = self.events.partition_point(|e| e.time() <= time);
        if next == self.events.len() && next > 0 {
            self.value = self.events[next - 1].value().clamp(self.min, self.max);
            self.events.clear();
        } else if next > 1 {
            // Keep the event that anchors the segment we are inside.
            self.events.drain(..next - 1);
        }
    }

    fn insert(&mut self, event: ParamEvent) {
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }
}

/// Replace NaN/infinite inputs so they never reach the timeline.
fn sanitize(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn intrinsic_value_without_events() {
        let p = AudioParam::new(0.5, 0.0, 1.0);
        assert!(close(p.value_at(0.0), 0.5));
        assert!(close(p.value_at(100.0), 0.5));
    }

    #[test]
    fn step_then_ramp() {
        let mut p = AudioParam::new(0.0, 0.0, 1.0);
        p.set_value_at_time(0.0, 1.0);
        p.linear_ramp_to_value_at_time(1.0, 2.0);
        assert!(close(p.value_at(0.5), 0.0));
        assert!(close(p.value_at(1.0), 0.0));
        assert!(close(p.value_at(1.5), 0.5));
        assert!(close(p.value_at(2.0), 1.0));
        assert!(close(p.value_at(3.0), 1.0));
    }

    #[test]
    fn zero_length_ramp_jumps() {
        let mut p = AudioParam::new(0.0, 0.0, 1.0);
        p.set_value_at_time(0.0, 1.0);
        p.linear_ramp_to_value_at_time(1.0, 1.0);
        assert!(close(p.value_at(1.0), 1.0));
    }

    #[test]
    fn cancel_and_hold_mid_ramp() {
        let mut p = AudioParam::new(0.0, 0.0, 1.0);
        p.set_value_at_time(0.0, 0.0);
        p.linear_ramp_to_value_at_time(1.0, 1.0);
        p.linear_ramp_to_value_at_time(0.5, 2.0);

        let held = p.cancel_and_hold_at_time(0.25);
        assert!(close(held, 0.25));
        // Segment before the hold point is unchanged.
        assert!(close(p.value_at(0.1), 0.1));
        assert!(close(p.value_at(0.25), 0.25));
        assert!(close(p.value_at(5.0), 0.25));
    }

    #[test]
    fn cancel_scheduled_values_truncates() {
        let mut p = AudioParam::new(0.0, 0.0, 1.0);
        p.set_value_at_time(0.2, 1.0);
        p.set_value_at_time(0.9, 2.0);
        p.cancel_scheduled_values(1.5);
        assert_eq!(p.events().len(), 1);
        assert!(close(p.value_at(3.0), 0.2));
    }

    #[test]
    fn nan_is_never_scheduled() {
        let mut p = AudioParam::new(0.3, 0.0, 1.0);
        p.set_value_at_time(f64::NAN, 1.0);
        assert!(p.value_at(2.0).is_finite());
        p.set_value(f64::INFINITY);
        assert!(close(p.value_at(0.0), 0.3));
    }

    #[test]
    fn prune_keeps_future_shape() {
        let mut p = AudioParam::new(0.0, 0.0, 1.0);
        p.set_value_at_time(0.0, 0.0);
        p.linear_ramp_to_value_at_time(1.0, 1.0);
        p.linear_ramp_to_value_at_time(0.0, 2.0);
        let before = p.value_at(1.5);
        p.prune_before(1.2);
        assert!(close(p.value_at(1.5), before));

        p.prune_before(5.0);
        assert!(p.events().is_empty());
        assert!(close(p.value_at(6.0), 0.0));
    }

    #[test]
    fn fill_matches_value_at() {
        let mut p = AudioParam::new(0.0, 0.0, 1.0);
        p.set_value_at_time(0.0, 0.0);
        p.linear_ramp_to_value_at_time(1.0, 0.001);
        let mut out = [0.0; 64];
        p.fill(0.0, 48000.0, &mut out);
        for (i, v) in out.iter().enumerate() {
            assert!(close(*v, p.value_at(i as f64 / 48000.0)));
        }
    }
}
