// Demo stereo gain effect ("demoGain").

use std::sync::Arc;
use std::sync::atomic::Ordering;

use atomic_float::AtomicF32;
use log::debug;

use crate::param::{ParamDef, ParamUnit};
use crate::unit::{STEREO_NAMES, Unit, UnitControls};

pub const UNIT_ID: &str = "demoGain";

/// Linear gain a fresh unit starts with (-20 dB).
pub const DEFAULT_GAIN: f32 = 0.1;

pub static PARAMS: [ParamDef; 1] = [ParamDef::new("gain")
    .range(-60.0, 12.0)
    .default(-20.0)
    .unit(ParamUnit::Db)];

#[inline]
fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

#[inline]
fn linear_to_db(linear: f32) -> f32 {
    20.0 * linear.log10()
}

/// Shared between the audio and control facets.
///
/// Gain is stored linear; the parameter is exposed in dB.
pub struct GainControls {
    gain: AtomicF32,
    peak_left: AtomicF32,
    peak_right: AtomicF32,
}

impl GainControls {
    /// Peak absolute output of the last processed block, per channel.
    pub fn peaks(&self) -> (f32, f32) {
        (
            self.peak_left.load(Ordering::Relaxed),
            self.peak_right.load(Ordering::Relaxed),
        )
    }

    pub fn linear_gain(&self) -> f32 {
        self.gain.load(Ordering::Relaxed)
    }
}

impl UnitControls for GainControls {
    fn parameter_count(&self) -> usize {
        PARAMS.len()
    }

    fn parameter_def(&self, index: usize) -> Option<&ParamDef> {
        PARAMS.get(index)
    }

    fn parameter(&self, index: usize) -> f32 {
        match index {
            0 => linear_to_db(self.linear_gain()),
            _ => 0.0,
        }
    }

    fn set_parameter(&self, index: usize, value: f32) {
        if index == 0 {
            let db = PARAMS[0].clamp(value);
            self.gain.store(db_to_linear(db), Ordering::Relaxed);
        }
    }
}

/// Stereo in, stereo out, one gain control and peak meters.
pub struct DemoGain {
    controls: Arc<GainControls>,
}

impl DemoGain {
    pub fn new() -> Self {
        Self {
            controls: Arc::new(GainControls {
                gain: AtomicF32::new(DEFAULT_GAIN),
                peak_left: AtomicF32::new(0.0),
                peak_right: AtomicF32::new(0.0),
            }),
        }
    }

    /// Typed control facet, for meters.
    pub fn gain_controls(&self) -> Arc<GainControls> {
        self.controls.clone()
    }
}

impl Default for DemoGain {
    fn default() -> Self {
        Self::new()
    }
}

impl Unit for DemoGain {
    fn name(&self) -> &str {
        UNIT_ID
    }

    fn input_count(&self) -> usize {
        2
    }

    fn output_count(&self) -> usize {
        2
    }

    fn channel_name(&self, _output: bool, index: usize) -> Option<&str> {
        STEREO_NAMES.get(index).copied()
    }

    fn configure(&mut self, _sample_rate: f64, _max_block: usize) {}

    fn activate(&mut self) {
        debug!("{UNIT_ID}: activate");
    }

    fn deactivate(&mut self) {
        debug!("{UNIT_ID}: deactivate");
    }

    fn process(&mut self, _frames: usize, inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
        let gain = self.controls.linear_gain();
        let meters = [&self.controls.peak_left, &self.controls.peak_right];

        for (ch, out) in outputs.iter_mut().enumerate() {
            let mut peak = 0.0f32;
            match inputs.get(ch) {
                Some(input) => {
                    for (o, i) in out.iter_mut().zip(input.iter()) {
                        *o = i * gain;
                        peak = peak.max(o.abs());
                    }
                }
                None => out.fill(0.0),
            }
            if let Some(meter) = meters.get(ch) {
                meter.store(peak, Ordering::Relaxed);
            }
        }
    }

    fn controls(&self) -> Arc<dyn UnitControls> {
        self.controls.clone()
    }
}
