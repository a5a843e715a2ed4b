//! Note names, MIDI note numbers and equal-tempered frequencies.
//!
//! Both paths share the A4 = 440 Hz reference, so `note_frequency(A, 4)`
//! and `midi_to_frequency(69)` agree exactly.

use std::fmt;
use std::str::FromStr;

/// Reference pitch of A4 (MIDI 69).
pub const A4_FREQUENCY: f64 = 440.0;
/// Octave the base frequency table is defined in.
pub const REFERENCE_OCTAVE: i32 = 4;

/// One of the twelve pitch classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NoteName {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl NoteName {
    pub const ALL: [NoteName; 12] = [
        NoteName::C,
        NoteName::CSharp,
        NoteName::D,
        NoteName::DSharp,
        NoteName::E,
        NoteName::F,
        NoteName::FSharp,
        NoteName::G,
        NoteName::GSharp,
        NoteName::A,
        NoteName::ASharp,
        NoteName::B,
    ];

    /// Semitones above C.
    pub fn semitone(&self) -> i32 {
        *self as i32
    }

    pub fn from_semitone(semitone: i32) -> NoteName {
        Self::ALL[semitone.rem_euclid(12) as usize]
    }

    /// Frequency of this pitch class in the reference octave.
    pub fn base_frequency(&self) -> f64 {
        A4_FREQUENCY * 2f64.powf((self.semitone() - 9) as f64 / 12.0)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNoteError(pub String);

impl fmt::Display for ParseNoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid note name '{}'", self.0)
    }
}

impl std::error::Error for ParseNoteError {}

impl FromStr for NoteName {
    type Err = ParseNoteError;

    /// Accepts `C`..`B` with an optional `#` or `b`, staying within the
    /// octave (so `Cb` and `B#` are rejected).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseNoteError(s.to_string());
        let mut chars = s.chars();
        let letter = chars.next().ok_or_else(err)?;
        let natural = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(err()),
        };
        let semitone = match chars.as_str() {
            "" => natural,
            "#" | "s" => natural + 1,
            "b" => natural - 1,
            _ => return Err(err()),
        };
        if !(0..12).contains(&semitone) || matches!((natural, semitone), (4, 5) | (5, 4)) {
            return Err(err());
        }
        Ok(NoteName::from_semitone(semitone))
    }
}

/// `base_frequency(name) × 2^(octave − 4)`.
pub fn note_frequency(name: NoteName, octave: i32) -> f64 {
    name.base_frequency() * 2f64.powi(octave - REFERENCE_OCTAVE)
}

/// MIDI note number to Hz with A4 = 440.
pub fn midi_to_frequency(midi: u8) -> f64 {
    midi_to_frequency_with_tuning(midi as i32, A4_FREQUENCY)
}

/// `tuning_pitch × 2^((midi − 69) / 12)`.
pub fn midi_to_frequency_with_tuning(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * 2f64.powf((midi - 69) as f64 / 12.0)
}

/// MIDI number of a pitch class and octave (C4 = 60).
pub fn note_to_midi(name: NoteName, octave: i32) -> i32 {
    (octave + 1) * 12 + name.semitone()
}

/// Parse a full note like `"C4"`, `"F#3"` or `"Bb5"`.
pub fn parse_note(note: &str) -> Option<(NoteName, i32)> {
    let split = note
        .char_indices()
        .find(|(i, c)| *i > 0 && (c.is_ascii_digit() || *c == '-'))
        .map(|(i, _)| i)?;
    let name = note[..split].parse().ok()?;
    let octave = note[split..].parse().ok()?;
    Some((name, octave))
}
