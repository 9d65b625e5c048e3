//! Operator-adjustable thresholds, mirrored to persistent storage.
//!
//! Changes go through [`ThresholdStore::adjust`] (Edit submode) or
//! [`ThresholdStore::double_runtime_limit`] (trip recovery).  Both mark the
//! store dirty; the supervisor commits it when the operator leaves Edit,
//! when the UI times out, on a trip and on shutdown.  A failed write keeps
//! the dirty flag so the next commit retries.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::persist::{self, THRESHOLDS_KEY};
use crate::app::ports::{StorageError, StoragePort};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Fan stops below this (%RH).
    pub min_humidity: f32,
    /// Fan starts above this (%RH).
    pub max_humidity: f32,
    /// Longest single fan run before the safety trip (seconds).
    pub fan_runtime_limit_secs: u64,
}

impl Thresholds {
    pub fn fan_runtime_limit_ms(&self) -> u64 {
        self.fan_runtime_limit_secs.saturating_mul(1000)
    }

    /// `0 <= min < max <= 100` and a non-zero limit.
    pub fn is_valid(&self) -> bool {
        self.min_humidity >= 0.0
            && self.max_humidity <= 100.0
            && self.min_humidity < self.max_humidity
            && self.fan_runtime_limit_secs > 0
    }
}

/// Which threshold an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selected {
    Max,
    Min,
}

impl Selected {
    pub fn toggled(self) -> Self {
        match self {
            Self::Max => Self::Min,
            Self::Min => Self::Max,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThresholdStore {
    current: Thresholds,
    dirty: bool,
}

impl ThresholdStore {
    pub fn new(current: Thresholds) -> Self {
        Self {
            current,
            dirty: false,
        }
    }

    /// Load persisted thresholds, falling back to `defaults` when nothing is
    /// stored.  A stored value that fails validation is treated as corrupt.
    pub fn load(storage: &impl StoragePort, defaults: Thresholds) -> Result<Self, StorageError> {
        match persist::load_json::<Thresholds>(storage, THRESHOLDS_KEY)? {
            Some(t) if t.is_valid() => {
                info!(
                    "Thresholds: loaded min={:.1}% max={:.1}% limit={}s",
                    t.min_humidity, t.max_humidity, t.fan_runtime_limit_secs
                );
                Ok(Self::new(t))
            }
            Some(_) => Err(StorageError::Corrupted),
            None => {
                info!("Thresholds: none stored, using defaults");
                Ok(Self::new(defaults))
            }
        }
    }

    pub fn get(&self) -> Thresholds {
        self.current
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Move the selected threshold by `delta`, keeping `0 <= min < max <= 100`.
    /// Returns `true` if the value changed.
    pub fn adjust(&mut self, selected: Selected, delta: f32) -> bool {
        let t = &mut self.current;
        let changed = match selected {
            Selected::Max => {
                let next = (t.max_humidity + delta).min(100.0);
                if next > t.min_humidity && (next - t.max_humidity).abs() > f32::EPSILON {
                    t.max_humidity = next;
                    true
                } else {
                    false
                }
            }
            Selected::Min => {
                let next = (t.min_humidity + delta).max(0.0);
                if next < t.max_humidity && (next - t.min_humidity).abs() > f32::EPSILON {
                    t.min_humidity = next;
                    true
                } else {
                    false
                }
            }
        };
        self.dirty |= changed;
        changed
    }

    /// Double the runtime limit, capped at `ceiling_secs`.  Returns the new
    /// limit in seconds.
    pub fn double_runtime_limit(&mut self, ceiling_secs: u64) -> u64 {
        let t = &mut self.current;
        let next = t.fan_runtime_limit_secs.saturating_mul(2).min(ceiling_secs);
        if next != t.fan_runtime_limit_secs {
            t.fan_runtime_limit_secs = next;
            self.dirty = true;
        }
        next
    }

    /// Persist if dirty.  Returns `Ok(true)` when a write happened.
    pub fn commit(&mut self, storage: &mut impl StoragePort) -> Result<bool, StorageError> {
        if !self.dirty {
            return Ok(false);
        }
        match persist::store_json(storage, THRESHOLDS_KEY, &self.current) {
            Ok(()) => {
                self.dirty = false;
                info!(
                    "Thresholds saved: min={:.1}% max={:.1}% limit={}s",
                    self.current.min_humidity,
                    self.current.max_humidity,
                    self.current.fan_runtime_limit_secs
                );
                Ok(true)
            }
            Err(e) => {
                warn!("Thresholds save failed: {}", e);
                Err(e)
            }
        }
    }
}
