//! Built-in plus user presets, with JSON import/export of the user part.

use super::builtin::{BuiltinPreset, builtin_presets};
use super::snapshot::ParameterSnapshot;
use crate::error::PresetError;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PresetBank {
    builtin: Vec<BuiltinPreset>,
    custom: BTreeMap<String, ParameterSnapshot>,
}

impl Default for PresetBank {
    fn default() -> Self {
        PresetBank {
            builtin: builtin_presets(),
            custom: BTreeMap::new(),
        }
    }
}

impl PresetBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin(&self) -> &[BuiltinPreset] {
        &self.builtin
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtin.iter().any(|p| p.name == name)
    }

    /// Look a preset up by name; built-ins take precedence.
    pub fn get(&self, name: &str) -> Result<&ParameterSnapshot, PresetError> {
        self.builtin
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.settings)
            .or_else(|| self.custom.get(name))
            .ok_or_else(|| PresetError::NotFound(name.to_string()))
    }

    pub fn custom_names(&self) -> impl Iterator<Item = &str> {
        self.custom.keys().map(String::as_str)
    }

    /// Store (or overwrite) a user preset.
    pub fn save(&mut self, name: &str, snapshot: ParameterSnapshot) -> Result<(), PresetError> {
        if self.is_builtin(name) {
            return Err(PresetError::ReadOnly(name.to_string()));
        }
        debug!(name = %name, "saving custom preset");
        self.custom.insert(name.to_string(), snapshot);
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<ParameterSnapshot, PresetError> {
        if self.is_builtin(name) {
            return Err(PresetError::ReadOnly(name.to_string()));
        }
        self.custom
            .remove(name)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))
    }

    /// User presets as a JSON object keyed by name.
    pub fn export_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(&self.custom)?)
    }

    /// Merge user presets from JSON produced by [`export_json`](Self::export_json).
    /// Entries named like a built-in are skipped. Returns how many were imported.
    pub fn import_json(&mut self, json: &str) -> Result<usize, PresetError> {
        let incoming: BTreeMap<String, ParameterSnapshot> = serde_json::from_str(json)?;
        let mut imported = 0;
        for (name, snapshot) in incoming {
            if self.is_builtin(&name) {
                debug!(name = %name, "skipping import over built-in preset");
                continue;
            }
            self.custom.insert(name, snapshot);
            imported += 1;
        }
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_read_only() {
        let mut bank = PresetBank::new();
        let name = bank.builtin()[0].name;
        assert!(matches!(
            bank.save(name, ParameterSnapshot::default()),
            Err(PresetError::ReadOnly(_))
        ));
        assert!(matches!(bank.delete(name), Err(PresetError::ReadOnly(_))));
        assert!(bank.get(name).is_ok());
    }

    #[test]
    fn custom_presets_save_and_delete() {
        let mut bank = PresetBank::new();
        let snap = ParameterSnapshot {
            reverb_mix: 42.0,
            ..ParameterSnapshot::default()
        };
        bank.save("Mine", snap.clone()).unwrap();
        assert_eq!(bank.get("Mine").unwrap(), &snap);
        assert_eq!(bank.custom_names().collect::<Vec<_>>(), vec!["Mine"]);
        assert_eq!(bank.delete("Mine").unwrap(), snap);
        assert!(matches!(bank.get("Mine"), Err(PresetError::NotFound(_))));
        assert!(matches!(bank.delete("Mine"), Err(PresetError::NotFound(_))));
    }

    #[test]
    fn export_then_import() {
        let mut bank = PresetBank::new();
        bank.save("One", ParameterSnapshot::default()).unwrap();
        bank.save(
            "Two",
            ParameterSnapshot {
                filter_cutoff: 321.0,
                ..ParameterSnapshot::default()
            },
        )
        .unwrap();
        let json = bank.export_json().unwrap();

        let mut other = PresetBank::new();
        assert_eq!(other.import_json(&json).unwrap(), 2);
        assert_eq!(other.get("Two").unwrap().filter_cutoff, 321.0);
    }

    #[test]
    fn import_skips_builtin_names_and_rejects_garbage() {
        let mut bank = PresetBank::new();
        let builtin = bank.builtin()[0].name;
        let json = format!(r#"{{"{builtin}": {{}}, "Fresh": {{"octave": 3}}}}"#);
        assert_eq!(bank.import_json(&json).unwrap(), 1);
        assert_eq!(bank.get("Fresh").unwrap().octave, 3);
        assert!(matches!(bank.import_json("[1, 2"), Err(PresetError::Json(_))));
    }
}
