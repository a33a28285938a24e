// src/adapter.rs

use std::sync::Arc;

use log::debug;

use crate::audio_buffer::ChannelBuffers;
use crate::unit::{Unit, UnitControls};

/// Binds one unit instance to fixed-capacity I/O storage.
///
/// Owns the unit for its whole lifetime: activated on construction,
/// deactivated on drop. `block_capacity` never changes; a different driver
/// block size calls for a new adapter.
pub struct ChannelAdapter {
    unit: Box<dyn Unit>,
    buffers: ChannelBuffers,
}

impl ChannelAdapter {
    /// Allocate the combined I/O region once and activate the unit.
    ///
    /// Control thread only.
    pub fn new(mut unit: Box<dyn Unit>, block_capacity: usize) -> Self {
        let buffers = ChannelBuffers::new(unit.input_count(), unit.output_count(), block_capacity);
        unit.activate();
        debug!(
            "activated '{}' ({} in / {} out, capacity {})",
            unit.name(),
            buffers.inputs(),
            buffers.outputs(),
            block_capacity
        );
        Self { unit, buffers }
    }

    #[inline]
    pub fn block_capacity(&self) -> usize {
        self.buffers.capacity()
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.unit.name()
    }

    pub fn controls(&self) -> Arc<dyn UnitControls> {
        self.unit.controls()
    }

    /// Run the unit over the first `frames` samples of its buffers.
    ///
    /// `frames` must not exceed `block_capacity`.
    #[inline]
    pub fn render(&mut self, frames: usize) {
        let unit = &mut self.unit;
        self.buffers
            .with_io(frames, |inputs, outputs| unit.process(frames, inputs, outputs));
    }

    /// Copy one output channel's first `frames` samples into `destination`.
    #[inline]
    pub fn copy_output(&self, frames: usize, channel: usize, destination: &mut [f32]) {
        if channel < self.buffers.outputs() {
            destination[..frames].copy_from_slice(&self.buffers.output(channel)[..frames]);
        } else {
            destination[..frames].fill(0.0);
        }
    }

    /// Writable view of one input channel, used to feed the previous stage.
    #[inline]
    pub fn input_mut(&mut self, channel: usize) -> Option<&mut [f32]> {
        if channel < self.buffers.inputs() {
            Some(self.buffers.input_mut(channel))
        } else {
            None
        }
    }

    #[inline]
    pub fn input_count(&self) -> usize {
        self.buffers.inputs()
    }

    #[inline]
    pub fn deliver_event(&mut self, data: &[u8]) {
        self.unit.deliver_event(data);
    }
}

impl Drop for ChannelAdapter {
    fn drop(&mut self) {
        self.unit.deactivate();
        debug!("deactivated '{}'", self.unit.name());
    }
}
