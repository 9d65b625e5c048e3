//! Read-only status snapshot shared with the animation thread.
//!
//! The supervisor publishes a fresh [`StatusSnapshot`] after every event.
//! Readers copy it out under the mutex and never see a half-written value.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::app::supervisor::Lifecycle;
use crate::control::fan::{FanState, FanTotals};
use crate::sensors::{Reading, Zone};
use crate::statistics::ZoneExtrema;
use crate::thresholds::Thresholds;
use crate::ui::Page;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub page: Page,
    pub lifecycle: Lifecycle,
    pub fan: FanState,
    pub totals: FanTotals,
    pub thresholds: Thresholds,
    /// Indexed by [`Zone::index`].
    pub extrema: [ZoneExtrema; 2],
    /// Latest reading per zone, `None` until the first successful sample.
    pub readings: [Option<Reading>; 2],
}

impl StatusSnapshot {
    pub fn reading(&self, zone: Zone) -> Option<Reading> {
        self.readings[zone.index()]
    }

    pub fn extrema(&self, zone: Zone) -> ZoneExtrema {
        self.extrema[zone.index()]
    }

    /// Length of the current fan run at `now_ms`.
    pub fn fan_elapsed_ms(&self, now_ms: u64) -> Option<u64> {
        match self.fan {
            FanState::Engaged { since_ms } => Some(now_ms.saturating_sub(since_ms)),
            _ => None,
        }
    }
}

/// Latest-value cell written by the supervisor loop.
pub struct SharedSnapshot {
    inner: Mutex<CriticalSectionRawMutex, Cell<Option<StatusSnapshot>>>,
}

impl SharedSnapshot {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(None)),
        }
    }

    pub fn publish(&self, snapshot: StatusSnapshot) {
        self.inner.lock(|cell| cell.set(Some(snapshot)));
    }

    /// `None` until the supervisor has published once.
    pub fn latest(&self) -> Option<StatusSnapshot> {
        self.inner.lock(Cell::get)
    }
}

impl Default for SharedSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide snapshot consumed by the spinner thread.
pub static SNAPSHOT: SharedSnapshot = SharedSnapshot::new();
