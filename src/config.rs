// src/config.rs
//
// Engine configuration shared by the host context, the control handle and
// the bundled units.

use crate::error::{Error, Result};

/// Default audio configuration
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;
pub const DEFAULT_BLOCK_SIZE: usize = 512;
pub const DEFAULT_EFFECT_SLOTS: usize = 4;
pub const DEFAULT_MAX_VOICES: usize = 8;
pub const DEFAULT_SWAP_QUEUE: usize = 16;

/// Largest block the driver may hand the engine in one callback.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Configuration for creating a host context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostConfig {
    /// Sample rate in Hz (e.g., 44100.0, 48000.0).
    pub sample_rate: f64,
    /// Driver block size in frames. Adapters are built with this capacity.
    pub block_size: usize,
    /// Number of effect slots after the synth slot.
    pub effect_slots: usize,
    /// Voice pool size for synth units built from this config.
    pub max_voices: usize,
    /// Slot swaps that may be in flight before `attach` reports back-pressure.
    pub swap_queue: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            effect_slots: DEFAULT_EFFECT_SLOTS,
            max_voices: DEFAULT_MAX_VOICES,
            swap_queue: DEFAULT_SWAP_QUEUE,
        }
    }
}

impl HostConfig {
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_effect_slots(mut self, effect_slots: usize) -> Self {
        self.effect_slots = effect_slots;
        self
    }

    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }

    pub fn with_swap_queue(mut self, swap_queue: usize) -> Self {
        self.swap_queue = swap_queue;
        self
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(Error::InvalidConfig(format!(
                "block size must be in 1..={MAX_BLOCK_SIZE}, got {}",
                self.block_size
            )));
        }
        if self.max_voices == 0 {
            return Err(Error::InvalidConfig("voice pool cannot be empty".into()));
        }
        if self.swap_queue == 0 {
            return Err(Error::InvalidConfig("swap queue cannot be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = HostConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.effect_slots, 4);
        assert_eq!(config.max_voices, 8);
    }

    #[test]
    fn rejects_zero_block_size() {
        let config = HostConfig::default().with_block_size(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_bad_sample_rate() {
        let config = HostConfig::default().with_sample_rate(f64::NAN);
        assert!(config.validate().is_err());
        let config = HostConfig::default().with_sample_rate(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_effect_slots_is_allowed() {
        let config = HostConfig::default().with_effect_slots(0);
        assert!(config.validate().is_ok());
    }
}
