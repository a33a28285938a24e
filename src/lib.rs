// src/lib.rs
//
// Library entry point: real-time host core for stereo synth/effect chains.

pub mod adapter;
pub mod audio_buffer;
pub mod bridge;
pub mod chain;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod host;
pub mod param;
pub mod preset;
pub mod splitter;
pub mod unit;
pub mod units;
pub mod voice;
pub mod voice_allocator;

// Re-export key types for Rust consumers
pub use bridge::{ControlHandle, create_bridge};
pub use chain::{SignalChain, SlotRole};
pub use config::HostConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use event::{Event, Message, RawMessage};
pub use host::{HostContext, HostNotification, HostNotifier};
pub use param::{ParamDef, ParamKind, ParamUnit};
pub use preset::{ActivePreset, Bank, Preset};
pub use unit::{PresetControls, PresetStorage, Unit, UnitControls};
