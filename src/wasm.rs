//! `wasm-bindgen` facade for AudioWorklet hosts.
//!
//! The worklet owns one [`WasmSynth`], forwards UI and MIDI events to it and
//! calls `render` from its `process` callback.

use crate::config::EngineConfig;
use crate::dsp::filter::FilterType;
use crate::dsp::oscillator::Waveform;
use crate::notation::NoteName;
use crate::params::ParamTarget;
use crate::preset::ParameterSnapshot;
use crate::synth::Synth;
use crate::voice::NoteIdentity;
use serde::Serialize;
use std::fmt::Display;
use wasm_bindgen::prelude::*;

fn js_error(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn manual(note: &str, octave_offset: i32) -> Result<NoteIdentity, JsValue> {
    let note: NoteName = note.parse().map_err(js_error)?;
    Ok(NoteIdentity::Manual { note, octave_offset })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PresetEntry<'a> {
    name: &'a str,
    category: &'static str,
    builtin: bool,
}

#[wasm_bindgen]
pub struct WasmSynth {
    inner: Synth,
}

#[wasm_bindgen]
impl WasmSynth {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> Result<WasmSynth, JsValue> {
        let inner = Synth::new(EngineConfig::with_sample_rate(sample_rate)).map_err(js_error)?;
        Ok(WasmSynth { inner })
    }

    /// Construct from a JSON `EngineConfig`; missing fields take defaults.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(json: &str) -> Result<WasmSynth, JsValue> {
        let config = EngineConfig::from_json(json).map_err(js_error)?;
        let inner = Synth::new(config).map_err(js_error)?;
        Ok(WasmSynth { inner })
    }

    pub fn initialize(&mut self) -> Result<(), JsValue> {
        self.inner.initialize().map_err(js_error)
    }

    #[wasm_bindgen(js_name = noteOn)]
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Result<(), JsValue> {
        self.inner.note_on(note, velocity).map_err(js_error)
    }

    #[wasm_bindgen(js_name = noteOff)]
    pub fn note_off(&mut self, note: u8) -> Result<(), JsValue> {
        self.inner.note_off(note).map_err(js_error)
    }

    #[wasm_bindgen(js_name = controlChange)]
    pub fn control_change(&mut self, controller: u8, value: u8) -> Result<(), JsValue> {
        self.inner.control_change(controller, value).map_err(js_error)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = midiMessage)]
    pub fn midi_message(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.inner.midi_message(bytes).map_err(js_error)
    }

    /// Keyboard note such as `"C#"` relative to the global octave.
    #[wasm_bindgen(js_name = playNote)]
    pub fn play_note(&mut self, note: &str, octave_offset: i32) -> Result<(), JsValue> {
        let identity = manual(note, octave_offset)?;
        self.inner.play(identity, 1.0).map_err(js_error)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = stopNote)]
    pub fn stop_note(&mut self, note: &str, octave_offset: i32) -> Result<(), JsValue> {
        let identity = manual(note, octave_offset)?;
        self.inner.stop_note(identity).map_err(js_error)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = stopAll)]
    pub fn stop_all(&mut self) -> Result<(), JsValue> {
        self.inner.stop_all().map_err(js_error)
    }

    /// Set a parameter by its camelCase name. Returns the clamped value.
    #[wasm_bindgen(js_name = setParameter)]
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<f64, JsValue> {
        let target: ParamTarget = name.parse().map_err(js_error)?;
        self.inner.set_parameter(target, value).map_err(js_error)
    }

    #[wasm_bindgen(js_name = getParameter)]
    pub fn get_parameter(&self, name: &str) -> Result<f64, JsValue> {
        let target: ParamTarget = name.parse().map_err(js_error)?;
        Ok(self.inner.parameter(target))
    }

    /// `osc` is 1 or 2.
    #[wasm_bindgen(js_name = setOscWaveform)]
    pub fn set_osc_waveform(&mut self, osc: u8, waveform: &str) -> Result<(), JsValue> {
        let waveform = Waveform::parse(waveform).ok_or_else(|| js_error(format!("Unknown waveform '{waveform}'")))?;
        match osc {
            1 => self.inner.set_osc1_waveform(waveform),
            2 => self.inner.set_osc2_waveform(waveform),
            _ => return Err(js_error(format!("No oscillator {osc}"))),
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = setLfoWaveform)]
    pub fn set_lfo_waveform(&mut self, waveform: &str) -> Result<(), JsValue> {
        let waveform = Waveform::parse(waveform).ok_or_else(|| js_error(format!("Unknown waveform '{waveform}'")))?;
        self.inner.set_lfo_waveform(waveform);
        Ok(())
    }

    #[wasm_bindgen(js_name = setFilterType)]
    pub fn set_filter_type(&mut self, filter_type: &str) -> Result<(), JsValue> {
        let filter_type =
            FilterType::parse(filter_type).ok_or_else(|| js_error(format!("Unknown filter type '{filter_type}'")))?;
        self.inner.set_filter_type(filter_type);
        Ok(())
    }

    /// Load a settings object (the persisted camelCase form).
    #[wasm_bindgen(js_name = loadPreset)]
    pub fn load_preset(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let snapshot: ParameterSnapshot = serde_wasm_bindgen::from_value(settings)?;
        self.inner.load_preset(&snapshot).map_err(js_error)
    }

    #[wasm_bindgen(js_name = loadNamedPreset)]
    pub fn load_named_preset(&mut self, name: &str) -> Result<(), JsValue> {
        self.inner.load_named_preset(name).map_err(js_error)
    }

    #[wasm_bindgen(js_name = savePreset)]
    pub fn save_preset(&mut self, name: &str) -> Result<(), JsValue> {
        self.inner.save_preset(name).map_err(js_error)
    }

    #[wasm_bindgen(js_name = deletePreset)]
    pub fn delete_preset(&mut self, name: &str) -> Result<(), JsValue> {
        self.inner.presets_mut().delete(name).map_err(js_error)?;
        Ok(())
    }

    /// Custom presets as a JSON object keyed by name.
    #[wasm_bindgen(js_name = exportPresets)]
    pub fn export_presets(&self) -> Result<String, JsValue> {
        self.inner.presets().export_json().map_err(js_error)
    }

    /// Merge custom presets from JSON. Returns how many were imported.
    #[wasm_bindgen(js_name = importPresets)]
    pub fn import_presets(&mut self, json: &str) -> Result<usize, JsValue> {
        self.inner.presets_mut().import_json(json).map_err(js_error)
    }

    /// `[{ name, category, builtin }]` for every preset.
    #[wasm_bindgen(js_name = listPresets)]
    pub fn list_presets(&self) -> Result<JsValue, JsValue> {
        let bank = self.inner.presets();
        let entries: Vec<PresetEntry> = bank
            .builtin()
            .iter()
            .map(|p| PresetEntry {
                name: p.name,
                category: p.category.name(),
                builtin: true,
            })
            .chain(bank.custom_names().map(|name| PresetEntry {
                name,
                category: "Custom",
                builtin: false,
            }))
            .collect();
        Ok(serde_wasm_bindgen::to_value(&entries)?)
    }

    #[wasm_bindgen(js_name = currentSettings)]
    pub fn current_settings(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.current_settings())?)
    }

    /// Fill one stereo output block.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.inner.render(left, right);
    }

    #[wasm_bindgen(js_name = analyserData)]
    pub fn analyser_data(&self, out: &mut [f32]) -> Result<(), JsValue> {
        self.inner.analyser_data(out).map_err(js_error)
    }

    #[wasm_bindgen(js_name = activeVoices)]
    pub fn active_voices(&self) -> usize {
        self.inner.active_voices()
    }
}
