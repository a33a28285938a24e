// src/engine.rs

use crate::chain::SignalChain;
use crate::event::Event;
use crate::splitter::{EventSplitter, Step};

/// Real-time audio engine.
///
/// This struct runs exclusively on the audio thread.
/// It must be deterministic, allocation-free, and lock-free.
/// It does not do musical-time reasoning.
pub struct Engine {
    /// Synth and effect slots
    chain: SignalChain,

    /// Current sample position
    sample_pos: u64,
}

impl Engine {
    pub(crate) fn new(chain: SignalChain) -> Self {
        Self {
            chain,
            sample_pos: 0,
        }
    }

    /// Render one driver callback.
    ///
    /// Called once per audio block from the audio callback.
    /// It must not allocate or block.
    ///
    /// `events` must be sorted by offset; `left` and `right` must hold at
    /// least `frames` samples. Pending slot swaps are applied before any
    /// audio is produced, so the whole callback sees one configuration.
    pub fn process(&mut self, frames: usize, events: &[Event], left: &mut [f32], right: &mut [f32]) {
        self.chain.apply_pending_swaps();

        for step in EventSplitter::new(frames, events) {
            match step {
                Step::Deliver(event) => self.chain.deliver_event(event.data()),
                Step::Render { offset, frames } => {
                    let end = offset + frames;
                    self.chain
                        .render_sub_block(frames, &mut left[offset..end], &mut right[offset..end]);
                }
            }
        }

        self.sample_pos += frames as u64;
    }

    /// Samples rendered since the engine was created.
    pub fn sample_position(&self) -> u64 {
        self.sample_pos
    }

    pub fn chain(&self) -> &SignalChain {
        &self.chain
    }
}
