//! Running statistics: per-zone extrema and fan totals.
//!
//! Extrema only ever widen.  Every change marks the record dirty and the
//! supervisor persists it straight away, so a power cut loses at most the
//! sample in flight.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::persist::{self, STATISTICS_KEY};
use crate::app::ports::{StorageError, StoragePort};
use crate::control::fan::FanTotals;
use crate::sensors::{Reading, Zone};

/// Highs and lows seen in one zone.  `None` until the first reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneExtrema {
    pub high_temp: Option<f32>,
    pub low_temp: Option<f32>,
    pub high_humidity: Option<f32>,
    pub low_humidity: Option<f32>,
}

impl ZoneExtrema {
    /// Fold a reading in.  Returns `true` if any bound moved.
    pub fn observe(&mut self, r: Reading) -> bool {
        let mut changed = false;
        changed |= widen(&mut self.high_temp, r.temperature_c, |new, old| new > old);
        changed |= widen(&mut self.low_temp, r.temperature_c, |new, old| new < old);
        changed |= widen(&mut self.high_humidity, r.humidity, |new, old| new > old);
        changed |= widen(&mut self.low_humidity, r.humidity, |new, old| new < old);
        changed
    }
}

fn widen(slot: &mut Option<f32>, value: f32, beyond: impl Fn(f32, f32) -> bool) -> bool {
    match *slot {
        Some(old) if !beyond(value, old) => false,
        _ => {
            *slot = Some(value);
            true
        }
    }
}

/// The persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatisticsRecord {
    pub internal: ZoneExtrema,
    pub ambient: ZoneExtrema,
    pub fan: FanTotals,
}

#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    record: StatisticsRecord,
    dirty: bool,
}

impl RunStatistics {
    pub fn new(record: StatisticsRecord) -> Self {
        Self {
            record,
            dirty: false,
        }
    }

    pub fn load(storage: &impl StoragePort) -> Result<Self, StorageError> {
        match persist::load_json::<StatisticsRecord>(storage, STATISTICS_KEY)? {
            Some(record) => {
                info!(
                    "Statistics: loaded ({} fan cycles, {} ms total)",
                    record.fan.cycle_count, record.fan.total_duration_ms
                );
                Ok(Self::new(record))
            }
            None => {
                info!("Statistics: none stored, starting fresh");
                Ok(Self::default())
            }
        }
    }

    pub fn record(&self) -> StatisticsRecord {
        self.record
    }

    pub fn extrema(&self, zone: Zone) -> ZoneExtrema {
        match zone {
            Zone::Internal => self.record.internal,
            Zone::Ambient => self.record.ambient,
        }
    }

    pub fn fan_totals(&self) -> FanTotals {
        self.record.fan
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Update the zone's extrema.  Returns `true` on change.
    pub fn observe(&mut self, zone: Zone, reading: Reading) -> bool {
        let extrema = match zone {
            Zone::Internal => &mut self.record.internal,
            Zone::Ambient => &mut self.record.ambient,
        };
        let changed = extrema.observe(reading);
        if changed {
            debug!("Statistics: {} extrema now {:?}", zone, extrema);
        }
        self.dirty |= changed;
        changed
    }

    /// Copy the fan supervisor's totals in.  Returns `true` on change.
    pub fn sync_fan(&mut self, totals: FanTotals) -> bool {
        if self.record.fan == totals {
            return false;
        }
        self.record.fan = totals;
        self.dirty = true;
        true
    }

    /// Persist if dirty.  Returns `Ok(true)` when a write happened.
    pub fn persist(&mut self, storage: &mut impl StoragePort) -> Result<bool, StorageError> {
        if !self.dirty {
            return Ok(false);
        }
        match persist::store_json(storage, STATISTICS_KEY, &self.record) {
            Ok(()) => {
                self.dirty = false;
                Ok(true)
            }
            Err(e) => {
                warn!("Statistics save failed: {}", e);
                Err(e)
            }
        }
    }
}
