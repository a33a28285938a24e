//! Thread-safe bridge between the control thread and the audio engine.
//!
//! # Architecture
//!
//! - **Control thread** owns [`ControlHandle`]: builds adapters, publishes
//!   them, keeps the control facet of every attached unit, and frees
//!   displaced adapters
//! - **Audio thread** owns the [`Engine`] and its [`SignalChain`]
//! - Communication uses bounded lock-free queues; nothing here ever blocks
//!   the audio thread or waits on it
//!
//! # Usage
//!
//! ```ignore
//! let (mut control, mut engine) = create_bridge(&config);
//!
//! // Control thread: attach a unit
//! control.attach(SlotRole::Synth, Some(Box::new(synth)))?;
//!
//! // Audio thread: render one callback
//! engine.process(frames, &events, &mut left, &mut right);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::{debug, warn};

use crate::adapter::ChannelAdapter;
use crate::chain::{SignalChain, SlotRole, SlotSwap};
use crate::config::HostConfig;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::unit::{Unit, UnitControls};

/// What the control side remembers about an attached unit.
struct AttachedUnit {
    name: String,
    controls: Arc<dyn UnitControls>,
}

/// Handle for the control thread.
///
/// Not `Clone`: there is exactly one publisher per chain.
pub struct ControlHandle {
    /// Channel to publish slot swaps to the engine.
    swaps: Sender<SlotSwap>,

    /// Channel receiving adapters the engine no longer references.
    retired: Receiver<ChannelAdapter>,

    /// Swaps applied by the engine (written by the audio thread).
    generation: Arc<AtomicU64>,

    /// Swaps published from this side.
    published: u64,

    sample_rate: f64,
    block_size: usize,

    /// Slot 0 is the synth, slot n + 1 is effect n.
    attached: Vec<Option<AttachedUnit>>,
}

/// Create a linked pair of handles for control and audio.
///
/// The `Engine` goes to the audio thread; the `ControlHandle` stays with the
/// caller.
pub fn create_bridge(config: &HostConfig) -> (ControlHandle, Engine) {
    let queue = config.swap_queue.max(1);
    let (swap_tx, swap_rx) = bounded(queue);
    // Every applied swap yields at most one retired adapter.
    let (retire_tx, retire_rx) = bounded(queue * 2 + config.effect_slots + 1);
    let generation = Arc::new(AtomicU64::new(0));

    let chain = SignalChain::new(config.effect_slots, swap_rx, retire_tx, generation.clone());

    let control = ControlHandle {
        swaps: swap_tx,
        retired: retire_rx,
        generation,
        published: 0,
        sample_rate: config.sample_rate,
        block_size: config.block_size,
        attached: (0..config.effect_slots + 1).map(|_| None).collect(),
    };

    (control, Engine::new(chain))
}

// ═══════════════════════════════════════════════════════════════════
// ControlHandle - Control Thread API
// ═══════════════════════════════════════════════════════════════════

impl ControlHandle {
    /// Number of effect slots after the synth.
    pub fn max_effects(&self) -> usize {
        self.attached.len() - 1
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn slot_index(&self, role: SlotRole) -> Result<usize> {
        match role {
            SlotRole::Synth => Ok(0),
            SlotRole::Effect(n) if n < self.max_effects() => Ok(n + 1),
            SlotRole::Effect(_) => Err(Error::InvalidSlot(role)),
        }
    }

    /// Check a unit against the slot's channel policy without touching it.
    ///
    /// Outputs must be stereo everywhere. Effects need stereo inputs; a
    /// synth may also declare no inputs at all.
    pub fn check_unit(&self, role: SlotRole, unit: &dyn Unit) -> Result<()> {
        self.slot_index(role)?;

        let inputs = unit.input_count();
        let outputs = unit.output_count();
        let inputs_ok = match role {
            SlotRole::Synth => inputs == 0 || inputs == 2,
            SlotRole::Effect(_) => inputs == 2,
        };

        if inputs_ok && outputs == 2 {
            Ok(())
        } else {
            Err(Error::UnsupportedChannels {
                unit: unit.name().to_string(),
                role,
                inputs,
                outputs,
            })
        }
    }

    /// Attach `unit` to a slot, or clear the slot with `None`.
    ///
    /// The unit is configured, wrapped in a freshly allocated adapter and
    /// activated here, then published whole. The engine picks it up at the
    /// start of its next render; whatever it displaces comes back through
    /// [`collect_retired`](Self::collect_retired) and is deactivated on this
    /// thread.
    ///
    /// Rejections happen before any state changes.
    pub fn attach(&mut self, role: SlotRole, unit: Option<Box<dyn Unit>>) -> Result<()> {
        let index = self.slot_index(role)?;

        if let Some(unit) = unit.as_deref() {
            if let Err(e) = self.check_unit(role, unit) {
                warn!("rejected attach: {e}");
                return Err(e);
            }
        }

        if self.swaps.is_full() {
            self.collect_retired();
            return Err(Error::SwapQueueFull);
        }

        let adapter = unit.map(|mut unit| {
            unit.configure(self.sample_rate, self.block_size);
            ChannelAdapter::new(unit, self.block_size)
        });

        let attached = adapter.as_ref().map(|a| AttachedUnit {
            name: a.name().to_string(),
            controls: a.controls(),
        });

        match self.swaps.try_send(SlotSwap { role, adapter }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => return Err(Error::SwapQueueFull),
            Err(TrySendError::Disconnected(_)) => {
                // Engine is gone; nothing will ever render this slot again.
                debug!("engine dropped, {role} attach discarded");
                self.attached[index] = None;
                return Ok(());
            }
        }

        self.published += 1;
        match &attached {
            Some(unit) => debug!("published '{}' to {role}", unit.name),
            None => debug!("published empty {role}"),
        }
        self.attached[index] = attached;

        self.collect_retired();
        Ok(())
    }

    /// Clear a slot.
    pub fn detach(&mut self, role: SlotRole) -> Result<()> {
        self.attach(role, None)
    }

    /// Control facet of the unit most recently attached to `role`.
    pub fn controls(&self, role: SlotRole) -> Option<Arc<dyn UnitControls>> {
        let index = self.slot_index(role).ok()?;
        self.attached[index].as_ref().map(|u| u.controls.clone())
    }

    /// Name of the unit most recently attached to `role`.
    pub fn unit_name(&self, role: SlotRole) -> Option<&str> {
        let index = self.slot_index(role).ok()?;
        self.attached[index].as_ref().map(|u| u.name.as_str())
    }

    /// Swaps published but not yet applied by the engine.
    pub fn pending_swaps(&self) -> u64 {
        self.published
            .saturating_sub(self.generation.load(Ordering::Acquire))
    }

    /// True once the engine has applied every published swap.
    pub fn is_synced(&self) -> bool {
        self.pending_swaps() == 0
    }

    /// Deactivate and free adapters the engine has handed back.
    ///
    /// Returns how many were reclaimed.
    pub fn collect_retired(&self) -> usize {
        let mut count = 0;
        for adapter in self.retired.try_iter() {
            debug!("reclaiming '{}'", adapter.name());
            drop(adapter);
            count += 1;
        }
        count
    }

    /// Record a new driver configuration.
    ///
    /// Attached adapters keep their capacity (the engine chunks around it);
    /// units attached from now on get adapters sized for `block_size`.
    pub fn reset(&mut self, sample_rate: f64, block_size: usize) -> Result<()> {
        HostConfig::default()
            .with_sample_rate(sample_rate)
            .with_block_size(block_size)
            .validate()?;
        debug!("driver reset: {sample_rate} Hz, {block_size} frames");
        self.sample_rate = sample_rate;
        self.block_size = block_size;
        Ok(())
    }
}

impl Drop for ControlHandle {
    fn drop(&mut self) {
        self.collect_retired();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use crate::adapter::tests::MockUnit;

    fn bridge() -> (ControlHandle, Engine) {
        create_bridge(&HostConfig::default().with_block_size(64))
    }

    fn render(engine: &mut Engine, frames: usize) -> Vec<f32> {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        engine.process(frames, &[], &mut left, &mut right);
        left
    }

    #[test]
    fn attach_is_visible_at_next_render() {
        let (mut control, mut engine) = bridge();
        control
            .attach(SlotRole::Synth, Some(Box::new(MockUnit::source(0.5))))
            .unwrap();
        assert!(!control.is_synced());
        assert_eq!(control.unit_name(SlotRole::Synth), Some("mock"));

        let out = render(&mut engine, 64);
        assert!(out.iter().all(|s| *s == 0.5));
        assert!(control.is_synced());
    }

    #[test]
    fn non_stereo_units_are_rejected_without_side_effects() {
        let (mut control, mut engine) = bridge();

        let mono = MockUnit {
            inputs: 2,
            outputs: 1,
            level: 1.0,
            lifecycle: Default::default(),
        };
        let lifecycle = mono.lifecycle.clone();
        let err = control
            .attach(SlotRole::Synth, Some(Box::new(mono)))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedChannels { outputs: 1, .. }));
        assert_eq!(lifecycle.activations.load(Ordering::SeqCst), 0);
        assert!(control.controls(SlotRole::Synth).is_none());
        assert!(control.is_synced());

        // A source has no inputs, which an effect slot cannot accept.
        let err = control
            .attach(SlotRole::Effect(0), Some(Box::new(MockUnit::source(1.0))))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedChannels { inputs: 0, .. }));

        let out = render(&mut engine, 64);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn invalid_slot_is_rejected() {
        let (mut control, _engine) = bridge();
        let err = control
            .attach(SlotRole::Effect(4), Some(Box::new(MockUnit::effect(1.0))))
            .unwrap_err();
        assert_eq!(err, Error::InvalidSlot(SlotRole::Effect(4)));
    }

    #[test]
    fn displaced_adapter_is_freed_on_control_thread() {
        let (mut control, mut engine) = bridge();
        let first = MockUnit::source(0.5);
        let first_life = first.lifecycle.clone();
        control.attach(SlotRole::Synth, Some(Box::new(first))).unwrap();
        render(&mut engine, 64);

        control
            .attach(SlotRole::Synth, Some(Box::new(MockUnit::source(0.25))))
            .unwrap();
        // Not yet applied: the old unit is still live.
        assert_eq!(first_life.deactivations.load(Ordering::SeqCst), 0);

        let out = render(&mut engine, 64);
        assert!(out.iter().all(|s| *s == 0.25));
        assert_eq!(first_life.deactivations.load(Ordering::SeqCst), 0);

        assert_eq!(control.collect_retired(), 1);
        assert_eq!(first_life.deactivations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn full_queue_reports_back_pressure() {
        let (mut control, _engine) =
            create_bridge(&HostConfig::default().with_swap_queue(2).with_effect_slots(1));
        control.detach(SlotRole::Synth).unwrap();
        control.detach(SlotRole::Effect(0)).unwrap();

        let unit = MockUnit::source(1.0);
        let lifecycle = unit.lifecycle.clone();
        let err = control.attach(SlotRole::Synth, Some(Box::new(unit))).unwrap_err();
        assert_eq!(err, Error::SwapQueueFull);
        assert_eq!(lifecycle.activations.load(Ordering::SeqCst), 0);
        assert_eq!(control.pending_swaps(), 2);
    }

    #[test]
    fn attach_after_engine_dropped_is_harmless() {
        let (mut control, engine) = bridge();
        drop(engine);
        let unit = MockUnit::effect(1.0);
        let lifecycle = unit.lifecycle.clone();
        assert!(control.attach(SlotRole::Effect(0), Some(Box::new(unit))).is_ok());
        assert_eq!(lifecycle.deactivations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_changes_capacity_of_new_adapters_only() {
        let (mut control, mut engine) = bridge();
        control
            .attach(SlotRole::Synth, Some(Box::new(MockUnit::source(1.0))))
            .unwrap();
        control.reset(48_000.0, 256).unwrap();
        assert_eq!(control.block_size(), 256);
        control
            .attach(SlotRole::Effect(0), Some(Box::new(MockUnit::effect(0.5))))
            .unwrap();

        // Driver now hands 256-frame blocks; the 64-frame synth adapter is chunked.
        let out = render(&mut engine, 256);
        assert!(out.iter().all(|s| *s == 0.5));

        assert!(control.reset(48_000.0, 0).is_err());
    }

    fn attach_retrying(
        control: &mut ControlHandle,
        role: SlotRole,
        make: impl Fn() -> Option<Box<dyn Unit>>,
    ) {
        loop {
            match control.attach(role, make()) {
                Ok(()) => return,
                Err(Error::SwapQueueFull) => thread::yield_now(),
                Err(e) => panic!("attach to {role} failed: {e}"),
            }
        }
    }

    #[test]
    fn concurrent_swaps_render_whole_configurations() {
        let (mut control, mut engine) =
            create_bridge(&HostConfig::default().with_block_size(64).with_swap_queue(4));
        let done = Arc::new(AtomicBool::new(false));

        let audio = {
            let done = done.clone();
            thread::spawn(move || {
                let mut left = vec![0.0; 64];
                let mut right = vec![0.0; 64];
                let mut blocks = 0usize;
                while !done.load(Ordering::Acquire) {
                    engine.process(64, &[], &mut left, &mut right);
                    let level = left[0];
                    // Nothing, synth alone, or synth into the halving effect.
                    assert!(
                        [0.0, 0.5, 0.25].contains(&level),
                        "unexpected level {level}"
                    );
                    assert!(
                        left.iter().chain(&right).all(|s| *s == level),
                        "block mixes configurations"
                    );
                    blocks += 1;
                    thread::yield_now();
                }
                blocks
            })
        };

        for _ in 0..500 {
            attach_retrying(&mut control, SlotRole::Synth, || {
                Some(Box::new(MockUnit::source(0.5)))
            });
            attach_retrying(&mut control, SlotRole::Effect(0), || {
                Some(Box::new(MockUnit::effect(0.5)))
            });
            attach_retrying(&mut control, SlotRole::Effect(0), || None);
            attach_retrying(&mut control, SlotRole::Synth, || None);
        }

        while !control.is_synced() && !audio.is_finished() {
            thread::yield_now();
        }
        done.store(true, Ordering::Release);
        let blocks = audio.join().expect("audio thread panicked");
        assert!(blocks > 0);
        assert!(control.is_synced());
        control.collect_retired();
    }
}
