// src/voice.rs

use crate::preset::Preset;
use crate::units::envelope::AdsrEnvelope;
use crate::units::oscillator::{Oscillator, Waveform, note_to_freq};
use crate::units::synth::param;

pub type VoiceId = usize;

/// Mean absolute output below which a released voice counts as silent.
pub const SILENCE_LEVEL: f32 = 0.000_001;

/// A voice represents one sounding note.
///
/// A voice is free when it is not held and its last rendered block was
/// silent. Envelope times are latched from the preset at note start;
/// waveform and pulse width are re-read on every render.
pub struct Voice {
    pub id: VoiceId,
    held: bool,
    note: u8,
    velocity: u8,

    /// Mean absolute value of the last rendered block.
    level: f32,

    osc: Oscillator,
    env: AdsrEnvelope,
}

impl Voice {
    pub fn new(id: VoiceId) -> Self {
        Self {
            id,
            held: false,
            note: 0,
            velocity: 0,
            level: 0.0,
            osc: Oscillator::new(),
            env: AdsrEnvelope::new(),
        }
    }

    pub fn configure(&mut self, sample_rate: f64) {
        self.osc.configure(sample_rate);
        self.env.configure(sample_rate);
    }

    /// Gate on with the given preset snapshot.
    pub fn start(&mut self, note: u8, velocity: u8, preset: &Preset) {
        self.env.set_shape(
            preset.get(param::ATTACK),
            preset.get(param::DECAY),
            preset.get(param::SUSTAIN),
            preset.get(param::RELEASE),
        );
        self.osc.set_frequency(note_to_freq(note));
        self.osc.reset();
        self.env.trigger();

        self.note = note;
        self.velocity = velocity;
        self.held = true;
    }

    /// Gate off; the voice keeps sounding through its release.
    pub fn release(&mut self) {
        self.env.release();
        self.held = false;
    }

    #[inline]
    pub fn is_held(&self) -> bool {
        self.held
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.level < SILENCE_LEVEL && !self.held
    }

    #[inline]
    pub fn note(&self) -> u8 {
        self.note
    }

    #[inline]
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Render one mono block into `out` and update the tracked level.
    pub fn process(&mut self, preset: &Preset, out: &mut [f32]) {
        if out.is_empty() {
            return;
        }

        let waveform = Waveform::from_param(preset.get(param::OSCTYPE));
        let pwm = preset.get(param::PWM);

        let mut sum = 0.0;
        for sample in out.iter_mut() {
            *sample = self.osc.next(waveform, pwm) * self.env.next();
            sum += sample.abs();
        }
        self.level = sum / out.len() as f32;
    }
}
