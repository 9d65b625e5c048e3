//! Fan engagement state machine with runtime accounting and safety trip.
//!
//! ```text
//!            engage(speed>0)                 disengage(), elapsed <= limit
//!   Idle ───────────────────▶ Engaged ─────────────────────────────▶ Idle
//!    ▲                          │
//!    │ clear_trip()             │ elapsed > limit (on disengage, or while
//!    │                          ▼ running on the internal-sample tick)
//!    └─────────────────────── Tripped
//! ```
//!
//! Every run that ends (normally, by trip, or forced off at shutdown) is
//! folded into [`FanTotals`].  Totals only ever grow.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::FanPort;
use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanState {
    Idle,
    Engaged { since_ms: u64 },
    Tripped,
}

/// Lifetime fan accounting, persisted with the run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FanTotals {
    pub total_duration_ms: u64,
    pub max_runtime_ms: u64,
    pub cycle_count: u32,
}

impl FanTotals {
    fn record(&mut self, elapsed_ms: u64) {
        self.total_duration_ms = self.total_duration_ms.saturating_add(elapsed_ms);
        self.max_runtime_ms = self.max_runtime_ms.max(elapsed_ms);
        self.cycle_count = self.cycle_count.saturating_add(1);
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunEnded {
    pub elapsed_ms: u64,
    /// The run exceeded the limit; the supervisor is now `Tripped`.
    pub tripped: bool,
}

pub struct FanSupervisor {
    state: FanState,
    totals: FanTotals,
}

impl FanSupervisor {
    /// Start `Idle` with totals carried over from a previous run.
    pub fn new(totals: FanTotals) -> Self {
        Self {
            state: FanState::Idle,
            totals,
        }
    }

    pub fn state(&self) -> FanState {
        self.state
    }

    pub fn totals(&self) -> FanTotals {
        self.totals
    }

    pub fn is_engaged(&self) -> bool {
        matches!(self.state, FanState::Engaged { .. })
    }

    /// `Idle → Engaged`.  Returns `Ok(true)` if the fan was started; a no-op
    /// (`Ok(false)`) when already running, tripped, or `speed == 0`.  If the
    /// controller rejects the speed the state stays `Idle`.
    pub fn engage(
        &mut self,
        speed: u8,
        now_ms: u64,
        fan: &mut impl FanPort,
    ) -> Result<bool, ActuatorError> {
        if self.state != FanState::Idle || speed == 0 {
            return Ok(false);
        }
        fan.set_fan_speed(speed)?;
        self.state = FanState::Engaged { since_ms: now_ms };
        info!("Fan: engaged at {}%", speed);
        Ok(true)
    }

    /// `Engaged → Idle`, or `Engaged → Tripped` when the run was longer than
    /// `limit_ms`.  `None` when the fan was not running.
    pub fn disengage(
        &mut self,
        now_ms: u64,
        limit_ms: u64,
        fan: &mut impl FanPort,
    ) -> Option<RunEnded> {
        let elapsed_ms = self.stop_run(now_ms, fan)?;
        let tripped = elapsed_ms > limit_ms;
        self.state = if tripped {
            FanState::Tripped
        } else {
            FanState::Idle
        };
        info!("Fan: disengaged after {} ms", elapsed_ms);
        Some(RunEnded {
            elapsed_ms,
            tripped,
        })
    }

    /// Ongoing-run check.  Forces the fan off and trips when the current
    /// run has already exceeded `limit_ms`.
    pub fn trip_if_exceeded(
        &mut self,
        now_ms: u64,
        limit_ms: u64,
        fan: &mut impl FanPort,
    ) -> Option<RunEnded> {
        let FanState::Engaged { since_ms } = self.state else {
            return None;
        };
        if now_ms.saturating_sub(since_ms) <= limit_ms {
            return None;
        }
        let elapsed_ms = self.stop_run(now_ms, fan)?;
        self.state = FanState::Tripped;
        Some(RunEnded {
            elapsed_ms,
            tripped: true,
        })
    }

    /// `Tripped → Idle` after the operator cleared the trip.
    pub fn clear_trip(&mut self) -> bool {
        if self.state == FanState::Tripped {
            self.state = FanState::Idle;
            true
        } else {
            false
        }
    }

    /// Shutdown path: stop the fan whatever the state.  Returns the elapsed
    /// time of a run that was still in progress.
    pub fn force_off(&mut self, now_ms: u64, fan: &mut impl FanPort) -> Option<u64> {
        let elapsed = self.stop_run(now_ms, fan);
        if elapsed.is_none() {
            if let Err(e) = fan.set_fan_speed(0) {
                warn!("Fan: stop at shutdown failed: {}", e);
            }
        }
        self.state = FanState::Idle;
        elapsed
    }

    /// Command speed 0 and account the run.  The stop is recorded even if
    /// the controller write fails.
    fn stop_run(&mut self, now_ms: u64, fan: &mut impl FanPort) -> Option<u64> {
        let FanState::Engaged { since_ms } = self.state else {
            return None;
        };
        if let Err(e) = fan.set_fan_speed(0) {
            warn!("Fan: stop command failed: {}", e);
        }
        let elapsed_ms = now_ms.saturating_sub(since_ms);
        self.totals.record(elapsed_ms);
        self.state = FanState::Idle;
        Some(elapsed_ms)
    }
}
