// Demo polyphonic synth ("dsynth").
//
// Eight naive square/saw voices with a linear ADSR, a six-preset factory
// bank and binary preset storage.

use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::codec::{self, PresetRecord};
use crate::error::Result;
use crate::event::Message;
use crate::host::HostNotifier;
use crate::param::{ParamDef, ParamUnit};
use crate::preset::{ActivePreset, Bank, Preset};
use crate::unit::{PresetControls, PresetStorage, STEREO_NAMES, Unit, UnitControls};
use crate::voice_allocator::VoiceAllocator;

/// Identifier written into binary presets.
pub const UNIT_ID: &str = "dsynth";

/// Parameter indices, in declaration order.
pub mod param {
    pub const OSCTYPE: usize = 0;
    pub const PWM: usize = 1;
    pub const ATTACK: usize = 2;
    pub const DECAY: usize = 3;
    pub const SUSTAIN: usize = 4;
    pub const RELEASE: usize = 5;
    pub const COUNT: usize = 6;
}

pub static PARAMS: [ParamDef; param::COUNT] = [
    ParamDef::new("osctype").range(0.0, 1.0).choices(&["SQU", "SAW"]),
    ParamDef::new("pwm")
        .range(0.01, 0.99)
        .default(0.5)
        .unit(ParamUnit::Percent),
    ParamDef::new("attack")
        .range(0.01, 2.0)
        .default(0.25)
        .unit(ParamUnit::Seconds),
    ParamDef::new("decay")
        .range(0.01, 2.0)
        .default(0.25)
        .unit(ParamUnit::Seconds),
    ParamDef::new("sustain")
        .range(0.01, 1.0)
        .default(0.5)
        .unit(ParamUnit::Percent),
    ParamDef::new("release")
        .range(0.01, 2.0)
        .default(0.25)
        .unit(ParamUnit::Seconds),
];

/// The six factory presets.
pub fn factory_bank() -> Bank {
    let define = |values: [f32; param::COUNT], name: &str| Preset::define(&PARAMS, &values, name);
    Bank::new(vec![
        define([0.0, 0.10, 0.25, 0.25, 0.5, 2.0], "Square 1"),
        define([0.0, 0.35, 0.25, 0.25, 0.5, 2.0], "Square 2"),
        define([0.0, 0.50, 0.25, 0.25, 0.5, 2.0], "Square 3"),
        define([0.0, 0.75, 0.25, 0.25, 0.5, 2.0], "Square 4"),
        define([1.0, 0.10, 0.25, 0.25, 0.5, 2.0], "Sawtooth 1"),
        define([1.0, 0.10, 0.10, 0.25, 0.5, 1.0], "Sawtooth 2"),
    ])
}

// ═══════════════════════════════════════════════════════════════════
// Control facet
// ═══════════════════════════════════════════════════════════════════

struct BankState {
    bank: Bank,
    selected: usize,
}

/// Control-thread side of the synth: bank, selection and storage.
///
/// The bank lives behind a mutex the audio thread never touches; voices
/// read the published snapshot in [`ActivePreset`].
pub struct SynthControls {
    state: Mutex<BankState>,
    active: Arc<ActivePreset>,
    notifier: HostNotifier,
}

impl SynthControls {
    fn new(notifier: HostNotifier) -> Self {
        let bank = factory_bank();
        let first = bank.iter().next().cloned().unwrap_or_else(|| Preset::with_defaults(&PARAMS, ""));
        Self {
            state: Mutex::new(BankState { bank, selected: 0 }),
            active: Arc::new(ActivePreset::new(first)),
            notifier,
        }
    }

    /// Publish a copy of `index` as the live snapshot. Caller holds the lock.
    fn select_locked(&self, state: &mut BankState, index: usize) -> Result<()> {
        let preset = state.bank.get(index)?.clone();
        state.selected = index;
        debug!("{UNIT_ID}: selected preset {index} '{}'", preset.name());
        self.active.publish(preset);
        Ok(())
    }

    fn apply_record(preset: &mut Preset, record: &PresetRecord) {
        preset.set_all(&record.values);
        preset.set_name(record.name.as_str());
    }

    /// The snapshot shared with the voices.
    pub fn active(&self) -> &Arc<ActivePreset> {
        &self.active
    }
}

impl UnitControls for SynthControls {
    fn parameter_count(&self) -> usize {
        PARAMS.len()
    }

    fn parameter_def(&self, index: usize) -> Option<&ParamDef> {
        PARAMS.get(index)
    }

    fn parameter(&self, index: usize) -> f32 {
        let state = self.state.lock();
        state
            .bank
            .get(state.selected)
            .map_or(0.0, |preset| preset.get(index))
    }

    /// Edit the selected bank preset and the live snapshot in place.
    fn set_parameter(&self, index: usize, value: f32) {
        let state = self.state.lock();
        if let Ok(preset) = state.bank.get(state.selected) {
            preset.set(index, value);
        }
        self.active.load().set(index, value);
    }

    fn presets(&self) -> Option<&dyn PresetControls> {
        Some(self)
    }

    fn storage(&self) -> Option<&dyn PresetStorage> {
        Some(self)
    }
}

impl PresetControls for SynthControls {
    fn preset_count(&self) -> usize {
        self.state.lock().bank.len()
    }

    fn selected_preset(&self) -> usize {
        self.state.lock().selected
    }

    fn set_selected_preset(&self, index: usize) -> Result<()> {
        {
            let mut state = self.state.lock();
            self.select_locked(&mut state, index)?;
        }
        self.notifier.preset_selected(UNIT_ID);
        Ok(())
    }

    fn preset_name(&self, index: usize) -> Option<String> {
        let state = self.state.lock();
        state.bank.get(index).ok().map(|p| p.name().to_string())
    }

    fn set_preset_name(&self, index: usize, name: &str) -> Result<()> {
        self.state.lock().bank.get_mut(index)?.set_name(name);
        self.notifier.preset_renamed(UNIT_ID, index);
        Ok(())
    }
}

impl PresetStorage for SynthControls {
    fn preset_data(&self) -> Vec<u8> {
        let state = self.state.lock();
        match state.bank.get(state.selected) {
            Ok(preset) => codec::encode_preset(UNIT_ID, preset),
            Err(_) => Vec::new(),
        }
    }

    /// Decode fully, then overwrite the selected preset and republish it.
    fn set_preset_data(&self, data: &[u8]) -> Result<()> {
        let record = codec::decode_preset(UNIT_ID, data, PARAMS.len()).inspect_err(|e| {
            warn!("{UNIT_ID}: rejected preset payload: {e}");
        })?;

        let selected = {
            let mut state = self.state.lock();
            let selected = state.selected;
            Self::apply_record(state.bank.get_mut(selected)?, &record);
            self.select_locked(&mut state, selected)?;
            selected
        };

        self.notifier.preset_selected(UNIT_ID);
        self.notifier.preset_renamed(UNIT_ID, selected);
        Ok(())
    }

    fn bank_data(&self) -> Vec<u8> {
        codec::encode_bank(UNIT_ID, &self.state.lock().bank)
    }

    /// Decode fully, then overwrite the leading presets and select the first.
    fn set_bank_data(&self, data: &[u8]) -> Result<()> {
        let capacity = self.preset_count();
        let records = codec::decode_bank(UNIT_ID, data, PARAMS.len(), capacity).inspect_err(|e| {
            warn!("{UNIT_ID}: rejected bank payload: {e}");
        })?;

        {
            let mut state = self.state.lock();
            for (index, record) in records.iter().enumerate() {
                Self::apply_record(state.bank.get_mut(index)?, record);
            }
            self.select_locked(&mut state, 0)?;
        }
        debug!("{UNIT_ID}: loaded {} presets", records.len());

        self.notifier.bank_changed(UNIT_ID);
        self.notifier.preset_selected(UNIT_ID);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════
// Audio facet
// ═══════════════════════════════════════════════════════════════════

/// Polyphonic synth unit: no inputs, stereo out.
pub struct DemoSynth {
    voices: VoiceAllocator,
    controls: Arc<SynthControls>,
}

impl DemoSynth {
    pub fn new(max_voices: usize, notifier: HostNotifier) -> Self {
        let controls = Arc::new(SynthControls::new(notifier));
        Self {
            voices: VoiceAllocator::new(max_voices, controls.active().clone()),
            controls,
        }
    }

    /// Typed control facet, for callers that know they hold a synth.
    pub fn synth_controls(&self) -> Arc<SynthControls> {
        self.controls.clone()
    }

    pub fn active_voices(&self) -> usize {
        self.voices.active_count()
    }
}

impl Unit for DemoSynth {
    fn name(&self) -> &str {
        UNIT_ID
    }

    fn input_count(&self) -> usize {
        0
    }

    fn output_count(&self) -> usize {
        2
    }

    fn channel_name(&self, output: bool, index: usize) -> Option<&str> {
        if output { STEREO_NAMES.get(index).copied() } else { None }
    }

    fn configure(&mut self, sample_rate: f64, max_block: usize) {
        self.voices.configure(sample_rate, max_block);
    }

    fn activate(&mut self) {
        debug!("{UNIT_ID}: activate");
    }

    fn deactivate(&mut self) {
        debug!("{UNIT_ID}: deactivate");
    }

    fn process(&mut self, _frames: usize, _inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
        match outputs {
            [left, right, ..] => self.voices.render(left, right),
            _ => outputs.iter_mut().for_each(|out| out.fill(0.0)),
        }
        self.controls.active.end_render();
    }

    fn deliver_event(&mut self, data: &[u8]) {
        match Message::parse(data) {
            Message::NoteOn { note, velocity } => {
                self.voices.note_on(note, velocity);
            }
            Message::NoteOff { note, .. } => {
                self.voices.note_off(note);
            }
            _ => {}
        }
    }

    fn controls(&self) -> Arc<dyn UnitControls> {
        self.controls.clone()
    }
}
