//! Signal chain: one synth slot followed by a fixed run of effect slots.
//!
//! The chain lives on the audio thread. It never sees a half-built adapter:
//! adapters are constructed and activated by the control thread (see
//! [`crate::bridge`]) and arrive here whole, through a bounded lock-free
//! queue. Swaps are applied at render boundaries only, so one render pass
//! observes either the complete old configuration or the complete new one.
//! Displaced adapters travel back to the control thread to be deactivated
//! and freed there.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::warn;

use crate::adapter::ChannelAdapter;

/// Position in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRole {
    /// The single synth slot at the head of the chain.
    Synth,
    /// Effect slot `n`, processed in ascending order after the synth.
    Effect(usize),
}

impl fmt::Display for SlotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotRole::Synth => write!(f, "synth"),
            SlotRole::Effect(n) => write!(f, "effect {n}"),
        }
    }
}

/// A fully constructed slot value published by the control thread.
pub struct SlotSwap {
    pub role: SlotRole,
    pub adapter: Option<ChannelAdapter>,
}

/// Where the audio for the next stage comes from during one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    None,
    Synth,
    Effect(usize),
}

/// Audio-thread side of the chain.
pub struct SignalChain {
    synth: Option<ChannelAdapter>,
    effects: Box<[Option<ChannelAdapter>]>,

    /// Published swaps from the control thread.
    swaps: Receiver<SlotSwap>,

    /// Displaced adapters going back for deferred reclamation.
    retired: Sender<ChannelAdapter>,

    /// Count of swaps applied so far, readable from the control side.
    generation: Arc<AtomicU64>,
}

impl SignalChain {
    pub(crate) fn new(
        effect_slots: usize,
        swaps: Receiver<SlotSwap>,
        retired: Sender<ChannelAdapter>,
        generation: Arc<AtomicU64>,
    ) -> Self {
        Self {
            synth: None,
            effects: (0..effect_slots).map(|_| None).collect(),
            swaps,
            retired,
            generation,
        }
    }

    /// Whether a slot currently holds an adapter.
    pub fn is_occupied(&self, role: SlotRole) -> bool {
        match role {
            SlotRole::Synth => self.synth.is_some(),
            SlotRole::Effect(n) => self.effects.get(n).is_some_and(Option::is_some),
        }
    }

    /// Apply every swap published so far.
    ///
    /// Called at render boundaries. Does not allocate or free: the displaced
    /// adapter is handed back to the control thread.
    pub fn apply_pending_swaps(&mut self) {
        while let Ok(swap) = self.swaps.try_recv() {
            let slot = match swap.role {
                SlotRole::Synth => Some(&mut self.synth),
                SlotRole::Effect(n) => self.effects.get_mut(n),
            };

            // An out-of-range swap is bounced straight back.
            let old = match slot {
                Some(slot) => {
                    let old = std::mem::replace(slot, swap.adapter);
                    self.generation.fetch_add(1, Ordering::Release);
                    old
                }
                None => swap.adapter,
            };

            if let Some(old) = old {
                if let Err(TrySendError::Full(old) | TrySendError::Disconnected(old)) =
                    self.retired.try_send(old)
                {
                    // Nowhere to send it; freeing here is the only option left.
                    warn!("retire queue unavailable, dropping '{}' on the audio thread", old.name());
                    drop(old);
                }
            }
        }
    }

    /// Forward an event to the synth slot. Effects do not receive events.
    #[inline]
    pub fn deliver_event(&mut self, data: &[u8]) {
        if let Some(synth) = self.synth.as_mut() {
            synth.deliver_event(data);
        }
    }

    /// Render `frames` frames of stereo output.
    ///
    /// The synth (if any) is the initial source; each occupied effect slot
    /// takes the current source as input and becomes the new source. With no
    /// source at all the output is silence. Work is split into chunks no
    /// larger than the smallest attached adapter's capacity.
    pub fn render(&mut self, frames: usize, left: &mut [f32], right: &mut [f32]) {
        self.apply_pending_swaps();
        self.render_sub_block(frames, left, right);
    }

    /// Render without picking up swaps; used between events of one callback.
    pub(crate) fn render_sub_block(&mut self, frames: usize, left: &mut [f32], right: &mut [f32]) {
        let chunk = self.min_capacity().unwrap_or(frames).max(1);
        let mut offset = 0;
        while offset < frames {
            let n = chunk.min(frames - offset);
            self.render_chunk(
                n,
                &mut left[offset..offset + n],
                &mut right[offset..offset + n],
            );
            offset += n;
        }
    }

    fn min_capacity(&self) -> Option<usize> {
        self.synth
            .iter()
            .chain(self.effects.iter().flatten())
            .map(ChannelAdapter::block_capacity)
            .min()
    }

    fn render_chunk(&mut self, frames: usize, left: &mut [f32], right: &mut [f32]) {
        let mut source = Source::None;

        if let Some(synth) = self.synth.as_mut() {
            synth.render(frames);
            source = Source::Synth;
        }

        for i in 0..self.effects.len() {
            let (before, rest) = self.effects.split_at_mut(i);
            let Some(target) = rest[0].as_mut() else {
                continue;
            };

            let upstream = match source {
                Source::None => None,
                Source::Synth => self.synth.as_ref(),
                Source::Effect(j) => before[j].as_ref(),
            };

            for ch in 0..target.input_count() {
                if let Some(input) = target.input_mut(ch) {
                    match upstream {
                        Some(up) => up.copy_output(frames, ch, input),
                        None => input[..frames].fill(0.0),
                    }
                }
            }

            target.render(frames);
            source = Source::Effect(i);
        }

        let last = match source {
            Source::None => None,
            Source::Synth => self.synth.as_ref(),
            Source::Effect(j) => self.effects[j].as_ref(),
        };

        match last {
            Some(adapter) => {
                adapter.copy_output(frames, 0, left);
                adapter.copy_output(frames, 1, right);
            }
            None => {
                left[..frames].fill(0.0);
                right[..frames].fill(0.0);
            }
        }
    }
}
