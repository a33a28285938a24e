// src/host.rs
//
// Host-side context: validated configuration plus the channel units use to
// tell the host that their preset state changed.

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, trace};

use crate::bridge::{ControlHandle, create_bridge};
use crate::config::HostConfig;
use crate::engine::Engine;
use crate::error::Result;

/// Preset-state changes reported by units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostNotification {
    /// The unit switched to another preset (or reloaded the current one).
    PresetSelected { unit: String },
    /// The unit's whole bank was replaced.
    BankChanged { unit: String },
    /// A preset was renamed.
    PresetRenamed { unit: String, index: usize },
}

/// Sending half handed to units. Cheap to clone.
///
/// Notifications are sent from control-thread code paths only.
#[derive(Debug, Clone, Default)]
pub struct HostNotifier {
    tx: Option<Sender<HostNotification>>,
}

impl HostNotifier {
    /// A notifier that discards everything; for units used without a host.
    pub fn detached() -> Self {
        Self { tx: None }
    }

    pub fn notify(&self, notification: HostNotification) {
        trace!("{notification:?}");
        if let Some(tx) = &self.tx {
            // Host context already gone: nobody left to tell.
            let _ = tx.send(notification);
        }
    }

    pub fn preset_selected(&self, unit: &str) {
        self.notify(HostNotification::PresetSelected { unit: unit.to_string() });
    }

    pub fn bank_changed(&self, unit: &str) {
        self.notify(HostNotification::BankChanged { unit: unit.to_string() });
    }

    pub fn preset_renamed(&self, unit: &str, index: usize) {
        self.notify(HostNotification::PresetRenamed {
            unit: unit.to_string(),
            index,
        });
    }
}

/// Owns the engine configuration and collects unit notifications.
pub struct HostContext {
    config: HostConfig,
    notify_tx: Sender<HostNotification>,
    notify_rx: Receiver<HostNotification>,
}

impl HostContext {
    pub fn new(config: HostConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "host context: {} Hz, block {}, {} effect slots",
            config.sample_rate, config.block_size, config.effect_slots
        );
        let (notify_tx, notify_rx) = unbounded();
        Ok(Self {
            config,
            notify_tx,
            notify_rx,
        })
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Notifier for a unit created under this context.
    pub fn notifier(&self) -> HostNotifier {
        HostNotifier {
            tx: Some(self.notify_tx.clone()),
        }
    }

    /// Build the control/audio pair for this context's configuration.
    pub fn create_bridge(&self) -> (ControlHandle, Engine) {
        create_bridge(&self.config)
    }

    /// Take every notification received so far, oldest first.
    pub fn drain_notifications(&self) -> Vec<HostNotification> {
        self.notify_rx.try_iter().collect()
    }
}
