// src/unit.rs

use std::sync::Arc;

use crate::error::Result;
use crate::param::ParamDef;

/// Channel names for a stereo pair, in channel order.
pub const STEREO_NAMES: [&str; 2] = ["left", "right"];

/// Audio-side facet of a processing unit.
///
/// A unit instance is owned by exactly one `ChannelAdapter` while attached.
/// Units:
/// - do NOT allocate in `process` or `deliver_event`
/// - do NOT block
/// - ONLY touch state shared with the control side through atomics
pub trait Unit: Send {
    /// Identifier used in logs and in the binary preset layout.
    fn name(&self) -> &str;

    /// Number of input channels.
    fn input_count(&self) -> usize;

    /// Number of output channels.
    fn output_count(&self) -> usize;

    /// Display name of an output channel, or of an input when `output` is
    /// false. `None` for unnamed or out-of-range channels.
    fn channel_name(&self, _output: bool, _index: usize) -> Option<&str> {
        None
    }

    /// Called by the control thread before the unit is attached.
    fn configure(&mut self, sample_rate: f64, max_block: usize);

    fn activate(&mut self) {}

    fn deactivate(&mut self) {}

    /// Process audio.
    ///
    /// The adapter guarantees:
    /// - `inputs.len() == input_count()` and `outputs.len() == output_count()`
    /// - every slice is exactly `frames` long
    /// - all events for this sub-block have already been delivered
    fn process(&mut self, frames: usize, inputs: &[&[f32]], outputs: &mut [&mut [f32]]);

    /// Receive one timed MIDI-like message.
    fn deliver_event(&mut self, _data: &[u8]) {}

    /// Control-side facet shared with the host.
    fn controls(&self) -> Arc<dyn UnitControls>;
}

/// Control-side facet of a processing unit.
///
/// Safe to call from any non-real-time thread while the audio facet renders.
pub trait UnitControls: Send + Sync {
    fn parameter_count(&self) -> usize;

    fn parameter_def(&self, index: usize) -> Option<&ParamDef>;

    fn parameter(&self, index: usize) -> f32;

    /// Store a value, clamped to the parameter's declared range.
    /// Unknown indices are ignored.
    fn set_parameter(&self, index: usize, value: f32);

    /// Preset selection capability, if the unit has a bank.
    fn presets(&self) -> Option<&dyn PresetControls> {
        None
    }

    /// Binary preset/bank storage capability.
    fn storage(&self) -> Option<&dyn PresetStorage> {
        None
    }
}

/// Bank navigation exposed by units with presets.
pub trait PresetControls {
    fn preset_count(&self) -> usize;

    fn selected_preset(&self) -> usize;

    fn set_selected_preset(&self, index: usize) -> Result<()>;

    fn preset_name(&self, index: usize) -> Option<String>;

    fn set_preset_name(&self, index: usize, name: &str) -> Result<()>;
}

/// Opaque byte-blob (de)serialization of presets and banks.
///
/// Loaders validate the whole payload before touching live state.
pub trait PresetStorage {
    /// Encode the selected preset.
    fn preset_data(&self) -> Vec<u8>;

    /// Replace the selected preset.
    fn set_preset_data(&self, data: &[u8]) -> Result<()>;

    /// Encode the whole bank.
    fn bank_data(&self) -> Vec<u8>;

    /// Replace the bank and select its first preset.
    fn set_bank_data(&self, data: &[u8]) -> Result<()>;
}
