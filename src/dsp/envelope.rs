//! ADSR envelopes expressed as parameter automation.
//!
//! Nothing here runs per sample. Note-on and note-off write step and ramp
//! events onto an [`AudioParam`] timeline; the render loop evaluates them
//! against the audio clock.

use crate::graph::param::AudioParam;

/// Shortest release ramp; an instant drop to zero clicks.
pub const MIN_RELEASE: f64 = 0.001;

/// ADSR Envelope with linear attack/decay/release segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level [0, 1].
    pub sustain: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

impl Envelope {
    /// Schedule the attack and decay segments starting at `t0`:
    /// 0 at `t0`, 1 at `t0 + attack`, sustain at `t0 + attack + decay`.
    pub fn schedule_attack(&self, param: &mut AudioParam, t0: f64) {
        let attack_end = t0 + self.attack.max(0.0);
        let decay_end = attack_end + self.decay.max(0.0);
        param.cancel_scheduled_values(t0);
        param.set_value_at_time(0.0, t0);
        param.linear_ramp_to_value_at_time(1.0, attack_end);
        param.linear_ramp_to_value_at_time(self.sustain.clamp(0.0, 1.0), decay_end);
    }

    /// Release from whatever value the envelope has at `now`, reaching zero
    /// at the returned time.
    pub fn schedule_release(&self, param: &mut AudioParam, now: f64) -> f64 {
        let end = now + self.release_time();
        param.cancel_and_hold_at_time(now);
        param.linear_ramp_to_value_at_time(0.0, end);
        end
    }

    pub fn release_time(&self) -> f64 {
        self.release.max(MIN_RELEASE)
    }
}

/// Filter sweep: `cutoff` at `t0`, `cutoff + amount` after `attack`, back to
/// `cutoff` after a further `decay`. A zero amount leaves the timeline alone.
pub fn schedule_sweep(param: &mut AudioParam, t0: f64, cutoff: f64, amount: f64, attack: f64, decay: f64) {
    if amount == 0.0 {
        return;
    }
    let peak = t0 + attack.max(0.0);
    param.set_value_at_time(cutoff, t0);
    param.linear_ramp_to_value_at_time(cutoff + amount, peak);
    param.linear_ramp_to_value_at_time(cutoff, peak + decay.max(0.0));
}
