//! Bundled demonstration units.

pub mod envelope;
pub mod gain;
pub mod oscillator;
pub mod synth;

pub use gain::{DemoGain, GainControls};
pub use synth::{DemoSynth, SynthControls};
