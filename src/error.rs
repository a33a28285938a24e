//! Error types for the host engine.

use thiserror::Error;

use crate::chain::SlotRole;

/// Error type for control-path operations.
///
/// The audio path never produces these: rendering is infallible once a
/// configuration has been published.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unit '{unit}' has {inputs} inputs / {outputs} outputs; {role} slots require stereo I/O")]
    UnsupportedChannels {
        unit: String,
        role: SlotRole,
        inputs: usize,
        outputs: usize,
    },

    #[error("No such slot: {0}")]
    InvalidSlot(SlotRole),

    #[error("Slot swap queue is full; the audio thread has not caught up")]
    SwapQueueFull,

    #[error("Preset index {index} out of range (bank holds {count})")]
    PresetOutOfRange { index: usize, count: usize },

    #[error("Truncated payload: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Bad magic: expected \"plum\", found {0:?}")]
    BadMagic(String),

    #[error("Payload is for unit {found:?}, expected {expected:?}")]
    UnitMismatch { expected: String, found: String },

    #[error("Unsupported {what} version {major}.{minor} (expected 1.0)")]
    UnsupportedVersion {
        what: &'static str,
        major: u32,
        minor: u32,
    },

    #[error("Unexpected payload kind {found:?}, expected {expected:?}")]
    UnexpectedKind {
        expected: &'static str,
        found: String,
    },

    #[error("String at offset {0} is not valid UTF-8")]
    InvalidUtf8(usize),

    #[error("Bank payload holds {found} presets, unit bank holds {capacity}")]
    BankTooLarge { found: usize, capacity: usize },

    #[error("Parameter {index} has non-finite value {value}")]
    NonFiniteValue { index: usize, value: f32 },

    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
