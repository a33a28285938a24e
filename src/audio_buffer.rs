// src/audio_buffer.rs

/// Most channels a single adapter will wire up on either side.
pub const MAX_CHANNELS: usize = 8;

/// Fixed-capacity planar storage for one unit's inputs followed by its outputs.
///
/// The whole region is one allocation made at construction:
/// `[in0 .. inN, out0 .. outM]`, each channel `capacity` frames long.
/// Never resized afterwards.
#[derive(Debug)]
pub struct ChannelBuffers {
    inputs: usize,
    outputs: usize,
    capacity: usize,
    data: Box<[f32]>,
}

impl ChannelBuffers {
    /// Allocate zeroed storage. Channel counts are clamped to [`MAX_CHANNELS`].
    pub fn new(inputs: usize, outputs: usize, capacity: usize) -> Self {
        let inputs = inputs.min(MAX_CHANNELS);
        let outputs = outputs.min(MAX_CHANNELS);
        Self {
            inputs,
            outputs,
            capacity,
            data: vec![0.0; (inputs + outputs) * capacity].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    #[inline]
    pub fn outputs(&self) -> usize {
        self.outputs
    }

    #[inline]
    pub fn input_mut(&mut self, ch: usize) -> &mut [f32] {
        let start = ch * self.capacity;
        &mut self.data[start..start + self.capacity]
    }

    #[inline]
    pub fn output(&self, ch: usize) -> &[f32] {
        let start = (self.inputs + ch) * self.capacity;
        &self.data[start..start + self.capacity]
    }

    /// Borrow the first `frames` samples of every channel as separate
    /// input and output views and hand them to `f`.
    ///
    /// Does not allocate; views live in fixed-size stack arrays.
    #[inline]
    pub fn with_io<R>(
        &mut self,
        frames: usize,
        f: impl FnOnce(&[&[f32]], &mut [&mut [f32]]) -> R,
    ) -> R {
        let frames = frames.min(self.capacity);
        let capacity = self.capacity.max(1);
        let (ins, outs) = self.data.split_at_mut(self.inputs * self.capacity);

        let mut in_views: [&[f32]; MAX_CHANNELS] = [&[]; MAX_CHANNELS];
        for (view, chunk) in in_views.iter_mut().zip(ins.chunks_exact(capacity)) {
            *view = &chunk[..frames];
        }

        let mut out_views: [&mut [f32]; MAX_CHANNELS] = Default::default();
        for (view, chunk) in out_views.iter_mut().zip(outs.chunks_exact_mut(capacity)) {
            *view = &mut chunk[..frames];
        }

        f(&in_views[..self.inputs], &mut out_views[..self.outputs])
    }
}
