// src/preset.rs
//
// Presets, banks, and the atomically published active preset.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::{ArcSwap, Guard};
use atomic_float::AtomicF32;
use log::debug;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::param::ParamDef;

// ═══════════════════════════════════════════════════════════════════
// Preset
// ═══════════════════════════════════════════════════════════════════

/// A named array of parameter values.
///
/// Each value is independently atomic: single reads and writes never tear,
/// but nothing ties two fields together. Writes through [`set`](Self::set)
/// are clamped to the parameter's declared range.
pub struct Preset {
    defs: &'static [ParamDef],
    values: Box<[AtomicF32]>,
    name: String,
}

impl Preset {
    /// Build a preset from declared values; missing values take the default.
    pub fn define(defs: &'static [ParamDef], values: &[f32], name: impl Into<String>) -> Self {
        let values = defs
            .iter()
            .enumerate()
            .map(|(i, def)| AtomicF32::new(def.clamp(values.get(i).copied().unwrap_or(def.default))))
            .collect();
        Self {
            defs,
            values,
            name: name.into(),
        }
    }

    /// A preset holding every parameter's default value.
    pub fn with_defaults(defs: &'static [ParamDef], name: impl Into<String>) -> Self {
        Self::define(defs, &[], name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn defs(&self) -> &'static [ParamDef] {
        self.defs
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read one value. Unknown indices read as 0.
    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.values
            .get(index)
            .map_or(0.0, |v| v.load(Ordering::Relaxed))
    }

    /// Store one value, clamped to its declared range. Unknown indices are ignored.
    #[inline]
    pub fn set(&self, index: usize, value: f32) {
        if let (Some(slot), Some(def)) = (self.values.get(index), self.defs.get(index)) {
            slot.store(def.clamp(value), Ordering::Relaxed);
        }
    }

    /// Store a full set of values in declaration order, clamping each.
    pub fn set_all(&self, values: &[f32]) {
        for (index, value) in values.iter().enumerate() {
            self.set(index, *value);
        }
    }

    /// Copy of every value, in declaration order.
    pub fn values(&self) -> Vec<f32> {
        self.values.iter().map(|v| v.load(Ordering::Relaxed)).collect()
    }
}

impl Clone for Preset {
    fn clone(&self) -> Self {
        Self {
            defs: self.defs,
            values: self
                .values
                .iter()
                .map(|v| AtomicF32::new(v.load(Ordering::Relaxed)))
                .collect(),
            name: self.name.clone(),
        }
    }
}

impl std::fmt::Debug for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preset")
            .field("name", &self.name)
            .field("values", &self.values())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════
// Bank
// ═══════════════════════════════════════════════════════════════════

/// Fixed-size ordered collection of presets.
#[derive(Debug, Clone)]
pub struct Bank {
    presets: Box<[Preset]>,
}

impl Bank {
    pub fn new(presets: Vec<Preset>) -> Self {
        Self {
            presets: presets.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Preset> {
        self.presets.get(index).ok_or(Error::PresetOutOfRange {
            index,
            count: self.presets.len(),
        })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Preset> {
        let count = self.presets.len();
        self.presets
            .get_mut(index)
            .ok_or(Error::PresetOutOfRange { index, count })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }
}

// ═══════════════════════════════════════════════════════════════════
// ActivePreset
// ═══════════════════════════════════════════════════════════════════

/// The snapshot voices read from, plus deferred reclamation of old ones.
///
/// - Control thread: [`publish`](Self::publish) a whole new snapshot, or edit
///   the current one in place through [`load`](Self::load) + [`Preset::set`]
/// - Audio thread: [`load`](Self::load) once per render, then
///   [`end_render`](Self::end_render)
///
/// A displaced snapshot is tagged with the render epoch at retirement and kept
/// alive until the audio thread has finished a later render or no reader
/// holds it any more, so the audio thread never drops the last reference.
pub struct ActivePreset {
    current: ArcSwap<Preset>,

    /// Completed renders.
    epoch: AtomicU64,

    /// Control thread only.
    retired: Mutex<Vec<(u64, Arc<Preset>)>>,
}

impl ActivePreset {
    pub fn new(initial: Preset) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
            epoch: AtomicU64::new(0),
            retired: Mutex::new(Vec::new()),
        }
    }

    /// Lock-free read of the current snapshot.
    #[inline]
    pub fn load(&self) -> Guard<Arc<Preset>> {
        self.current.load()
    }

    /// Replace the whole snapshot. Control thread only.
    pub fn publish(&self, preset: Preset) {
        let old = self.current.swap(Arc::new(preset));
        // Read after the swap: any render still holding `old` ends past this tag.
        let tag = self.epoch.load(Ordering::Acquire);
        debug!("published preset '{}', retiring '{}'", self.current.load().name(), old.name());
        self.retired.lock().push((tag, old));
        self.collect();
    }

    /// Mark the end of one render pass. Audio thread only.
    #[inline]
    pub fn end_render(&self) {
        self.epoch.fetch_add(1, Ordering::Release);
    }

    /// Drop snapshots no render can still be reading.
    ///
    /// `ArcSwap::swap` settles outstanding load guards into real references
    /// before returning, so a retired snapshot with a strong count of one is
    /// unreachable from the audio thread even if it never rendered again.
    ///
    /// Returns how many were freed.
    pub fn collect(&self) -> usize {
        let epoch = self.epoch.load(Ordering::Acquire);
        let mut retired = self.retired.lock();
        let before = retired.len();
        retired.retain(|(tag, preset)| *tag >= epoch && Arc::strong_count(preset) > 1);
        before - retired.len()
    }

    /// Snapshots waiting for a render boundary.
    pub fn retired_count(&self) -> usize {
        self.retired.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamUnit;

    static DEFS: [ParamDef; 2] = [
        ParamDef::new("pwm").range(0.01, 0.99).default(0.5),
        ParamDef::new("attack")
            .range(0.01, 2.0)
            .default(0.25)
            .unit(ParamUnit::Seconds),
    ];

    #[test]
    fn define_clamps_and_fills_defaults() {
        let p = Preset::define(&DEFS, &[5.0], "x");
        assert_eq!(p.values(), vec![0.99, 0.25]);
        assert_eq!(p.name(), "x");
    }

    #[test]
    fn set_clamps_and_ignores_unknown_index() {
        let p = Preset::with_defaults(&DEFS, "x");
        p.set(1, -3.0);
        p.set(7, 1.0);
        assert_eq!(p.get(1), 0.01);
        assert_eq!(p.get(7), 0.0);
    }

    #[test]
    fn clone_is_a_detached_snapshot() {
        let a = Preset::define(&DEFS, &[0.2, 1.0], "a");
        let b = a.clone();
        a.set(0, 0.8);
        assert_eq!(b.get(0), 0.2);
    }

    #[test]
    fn bank_index_is_checked() {
        let bank = Bank::new(vec![Preset::with_defaults(&DEFS, "only")]);
        assert!(bank.get(0).is_ok());
        assert_eq!(
            bank.get(1).unwrap_err(),
            Error::PresetOutOfRange { index: 1, count: 1 }
        );
    }

    #[test]
    fn retired_snapshot_outlives_the_render_that_may_read_it() {
        let active = ActivePreset::new(Preset::with_defaults(&DEFS, "first"));

        // Audio thread mid-render holding the first snapshot.
        let reading = active.load();
        active.publish(Preset::with_defaults(&DEFS, "second"));
        assert_eq!(active.retired_count(), 1);
        assert_eq!(reading.name(), "first");
        assert_eq!(active.load().name(), "second");
        assert_eq!(active.collect(), 0);
        active.end_render();
        assert_eq!(active.collect(), 1);
        assert_eq!(active.retired_count(), 0);
        assert_eq!(reading.name(), "first");
    }

    #[test]
    fn snapshot_released_by_reader_is_freed_without_a_render() {
        let active = ActivePreset::new(Preset::with_defaults(&DEFS, "first"));
        let reading = active.load();
        active.publish(Preset::with_defaults(&DEFS, "second"));
        assert_eq!(active.retired_count(), 1);

        drop(reading);
        assert_eq!(active.collect(), 1);
        assert_eq!(active.retired_count(), 0);
    }

    #[test]
    fn publishing_while_idle_keeps_no_backlog() {
        let active = ActivePreset::new(Preset::with_defaults(&DEFS, "start"));
        for i in 0..1000 {
            active.publish(Preset::with_defaults(&DEFS, format!("p{i}")));
        }
        assert_eq!(active.retired_count(), 0);
        assert_eq!(active.load().name(), "p999");
    }

    #[test]
    fn in_place_edit_is_visible_to_the_next_load() {
        let active = ActivePreset::new(Preset::with_defaults(&DEFS, "p"));
        active.load().set(0, 0.3);
        assert_eq!(active.load().get(0), 0.3);
    }
}
