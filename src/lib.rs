pub mod config;
pub mod dsp;
pub mod effects;
pub mod error;
pub mod graph;
pub mod midi;
pub mod notation;
pub mod params;
pub mod preset;
pub mod scheduler;
pub mod synth;
pub mod voice;
pub mod wasm;

pub use config::EngineConfig;
pub use error::SynthError;
pub use synth::Synth;

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the subsynth-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: frequency in Hz of a MIDI note number.
#[wasm_bindgen]
pub fn midi_note_frequency(note: u8) -> f64 {
    notation::midi_to_frequency(note)
}
