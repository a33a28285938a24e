// src/voice_allocator.rs

use std::sync::Arc;

use crate::config::DEFAULT_BLOCK_SIZE;
use crate::preset::ActivePreset;
use crate::voice::{Voice, VoiceId};

/// Allocates and renders a fixed pool of polyphonic voices.
///
/// Responsibilities:
/// - map notes to voices
/// - track voice lifetime (held, releasing, free)
/// - mix active voices, scaled by the pool size
///
/// Does NOT:
/// - steal voices: a note-on with no free voice is dropped
/// - allocate during processing
pub struct VoiceAllocator {
    voices: Vec<Voice>,
    preset: Arc<ActivePreset>,
    scratch: Vec<f32>,
}

impl VoiceAllocator {
    pub fn new(max_voices: usize, preset: Arc<ActivePreset>) -> Self {
        let voices = (0..max_voices).map(Voice::new).collect();
        Self {
            voices,
            preset,
            scratch: vec![0.0; DEFAULT_BLOCK_SIZE],
        }
    }

    /// Size internal buffers. Control thread only.
    pub fn configure(&mut self, sample_rate: f64, max_block: usize) {
        for voice in &mut self.voices {
            voice.configure(sample_rate);
        }
        self.scratch = vec![0.0; max_block.max(1)];
    }

    pub fn max_voices(&self) -> usize {
        self.voices.len()
    }

    /// Start the first free voice on `note`.
    ///
    /// Returns the voice id, or `None` when every voice is busy.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Option<VoiceId> {
        let voice = self.voices.iter_mut().find(|v| v.is_free())?;
        voice.start(note, velocity, &self.preset.load());
        Some(voice.id)
    }

    /// Release the first held voice playing `note`. No match is a no-op.
    pub fn note_off(&mut self, note: u8) -> Option<VoiceId> {
        let voice = self
            .voices
            .iter_mut()
            .find(|v| v.is_held() && v.note() == note)?;
        voice.release();
        Some(voice.id)
    }

    /// Render every non-free voice into both channels (voices are mono).
    ///
    /// Output is the voice sum divided by the pool size. `left` and `right`
    /// must have the same length.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);

        let preset = self.preset.load();
        let scale = 1.0 / self.voices.len().max(1) as f32;
        let frames = left.len().min(right.len());
        let chunk = self.scratch.len();

        let mut offset = 0;
        while offset < frames {
            let n = chunk.min(frames - offset);
            let scratch = &mut self.scratch[..n];

            for voice in self.voices.iter_mut().filter(|v| !v.is_free()) {
                voice.process(&preset, scratch);
                for ((l, r), s) in left[offset..offset + n]
                    .iter_mut()
                    .zip(&mut right[offset..offset + n])
                    .zip(scratch.iter())
                {
                    *l += s * scale;
                    *r += s * scale;
                }
            }

            offset += n;
        }
    }

    /// Number of voices that are held or still sounding.
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_free()).count()
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.get(id)
    }
}
