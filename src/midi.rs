//! Normalized input events and MIDI translation.
//!
//! Keyboard, mouse and MIDI collaborators all reduce to [`InputEvent`]s.
//! Raw MIDI bytes are parsed here; the fixed CC table maps controllers onto
//! parameter targets with a linear 0–127 → range scaling.

use crate::params::ParamTarget;
use crate::voice::NoteIdentity;

/// Largest MIDI data byte.
pub const MIDI_MAX: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteEvent {
    /// `velocity` is a gain in [0, 1].
    On { identity: NoteIdentity, velocity: f64 },
    Off { identity: NoteIdentity },
}

impl NoteEvent {
    pub fn identity(&self) -> NoteIdentity {
        match *self {
            NoteEvent::On { identity, .. } | NoteEvent::Off { identity } => identity,
        }
    }
}

/// Set `target` to `value` (natural units, clamped by the model).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlEvent {
    pub target: ParamTarget,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Note(NoteEvent),
    Control(ControlEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

impl MidiMessage {
    /// Parse a channel voice message. Note-on with velocity 0 is a
    /// note-off. Anything else (system messages, running status, short
    /// packets) yields `None`.
    pub fn parse(bytes: &[u8]) -> Option<MidiMessage> {
        let [status, data1, data2, ..] = *bytes else {
            return None;
        };
        if data1 > MIDI_MAX || data2 > MIDI_MAX {
            return None;
        }
        let channel = status & 0x0F;
        match status & 0xF0 {
            0x90 if data2 > 0 => Some(MidiMessage::NoteOn {
                channel,
                note: data1,
                velocity: data2,
            }),
            0x90 | 0x80 => Some(MidiMessage::NoteOff { channel, note: data1 }),
            0xB0 => Some(MidiMessage::ControlChange {
                channel,
                controller: data1,
                value: data2,
            }),
            _ => None,
        }
    }

    /// Translate to the normalized interface. Unmapped controllers yield
    /// `None`.
    pub fn to_input_event(&self) -> Option<InputEvent> {
        match *self {
            MidiMessage::NoteOn { note, velocity, .. } => Some(InputEvent::Note(NoteEvent::On {
                identity: NoteIdentity::Midi(note),
                velocity: velocity_to_gain(velocity),
            })),
            MidiMessage::NoteOff { note, .. } => Some(InputEvent::Note(NoteEvent::Off {
                identity: NoteIdentity::Midi(note),
            })),
            MidiMessage::ControlChange {
                controller, value, ..
            } => map_cc(controller, value).map(InputEvent::Control),
        }
    }
}

/// `velocity / 127`.
pub fn velocity_to_gain(velocity: u8) -> f64 {
    velocity.min(MIDI_MAX) as f64 / MIDI_MAX as f64
}

/// The fixed controller table.
pub fn cc_target(controller: u8) -> Option<ParamTarget> {
    match controller {
        1 => Some(ParamTarget::LfoPitchDepth),
        7 => Some(ParamTarget::MasterVolume),
        71 => Some(ParamTarget::FilterResonance),
        72 => Some(ParamTarget::AmpRelease),
        73 => Some(ParamTarget::AmpAttack),
        74 => Some(ParamTarget::FilterCutoff),
        91 => Some(ParamTarget::ReverbMix),
        _ => None,
    }
}

/// Scale a controller value linearly onto its target's range.
pub fn map_cc(controller: u8, value: u8) -> Option<ControlEvent> {
    let target = cc_target(controller)?;
    let normalized = value.min(MIDI_MAX) as f64 / MIDI_MAX as f64;
    Some(ControlEvent {
        target,
        value: target.denormalize(normalized),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_note_messages() {
        assert_eq!(
            MidiMessage::parse(&[0x91, 60, 100]),
            Some(MidiMessage::NoteOn {
                channel: 1,
                note: 60,
                velocity: 100
            })
        );
        assert_eq!(
            MidiMessage::parse(&[0x80, 60, 64]),
            Some(MidiMessage::NoteOff { channel: 0, note: 60 })
        );
        assert_eq!(
            MidiMessage::parse(&[0x90, 60, 0]),
            Some(MidiMessage::NoteOff { channel: 0, note: 60 })
        );
    }

    #[test]
    fn rejects_short_and_unknown_messages() {
        assert_eq!(MidiMessage::parse(&[0x90, 60]), None);
        assert_eq!(MidiMessage::parse(&[0xF8, 0, 0]), None);
        assert_eq!(MidiMessage::parse(&[0xE0, 0, 64]), None);
        assert_eq!(MidiMessage::parse(&[0x90, 200, 1]), None);
    }

    #[test]
    fn velocity_scales_to_unit() {
        assert_eq!(velocity_to_gain(127), 1.0);
        assert_eq!(velocity_to_gain(0), 0.0);
        assert!((velocity_to_gain(64) - 64.0 / 127.0).abs() < 1e-12);
    }

    #[test]
    fn cutoff_cc_follows_linear_formula() {
        for value in [0u8, 1, 64, 127] {
            let ev = map_cc(74, value).unwrap();
            assert_eq!(ev.target, ParamTarget::FilterCutoff);
            let expected = 20.0 + value as f64 / 127.0 * 19980.0;
            assert!((ev.value - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn cc_table_covers_each_target_range() {
        for cc in [1u8, 7, 71, 72, 73, 74, 91] {
            let lo = map_cc(cc, 0).unwrap();
            let hi = map_cc(cc, 127).unwrap();
            let (min, max) = lo.target.range();
            assert!((lo.value - min).abs() < 1e-9, "CC{cc}");
            assert!((hi.value - max).abs() < 1e-9, "CC{cc}");
        }
        assert!(map_cc(2, 64).is_none());
    }

    #[test]
    fn messages_translate_to_input_events() {
        let on = MidiMessage::parse(&[0x90, 69, 127]).and_then(|m| m.to_input_event());
        assert_eq!(
            on,
            Some(InputEvent::Note(NoteEvent::On {
                identity: NoteIdentity::Midi(69),
                velocity: 1.0
            }))
        );
        let cc = MidiMessage::parse(&[0xB0, 7, 0]).and_then(|m| m.to_input_event());
        assert_eq!(
            cc,
            Some(InputEvent::Control(ControlEvent {
                target: ParamTarget::MasterVolume,
                value: 0.0
            }))
        );
        let unmapped = MidiMessage::parse(&[0xB0, 2, 0]).and_then(|m| m.to_input_event());
        assert_eq!(unmapped, None);
    }
}
