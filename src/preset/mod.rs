//! Presets: the persisted parameter snapshot, the factory bank and user
//! presets.

pub mod bank;
pub mod builtin;
pub mod snapshot;

pub use bank::PresetBank;
pub use builtin::{BuiltinPreset, Category, builtin_presets};
pub use snapshot::ParameterSnapshot;
