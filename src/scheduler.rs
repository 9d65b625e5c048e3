//! Fixed-plan job scheduler on a single logical clock.
//!
//! One [`Scheduler::tick`] per tick event, given the same `now_ms` the
//! supervisor uses for fan runtime.  A job is due once
//! `now - last_run >= interval`; due jobs are returned in the fixed order
//! of [`JobId::ALL`], and the supervisor runs them to completion in that
//! order.  A missed tick delays a job to the next tick, never by a whole
//! interval.
//!
//! ```text
//!  tick ──▶ ┌──────────────────────────────────────────────┐
//!           │ InternalSample → AmbientSample → PageRotation │ ──▶ due jobs
//!           │ → DisplayReset → SensorHeat                   │
//!           └──────────────────────────────────────────────┘
//! ```
//!
//! The safety trip calls [`Scheduler::clear`] from inside a job; the
//! supervisor re-checks [`Scheduler::is_registered`] before each due job
//! so nothing else in that tick runs.  [`Scheduler::restore`] puts the
//! original plan back.

use heapless::Vec;
use log::info;

use crate::config::SystemConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobId {
    /// Sample the chamber, update statistics, apply hysteresis, check runtime.
    InternalSample,
    /// Sample the room.
    AmbientSample,
    /// Re-render the current page from a fresh snapshot.
    PageRotation,
    /// Inactivity monitor: fall back to the default page.
    DisplayReset,
    /// Pulse the sensor heaters.
    SensorHeat,
}

pub const JOB_COUNT: usize = 5;

impl JobId {
    /// Execution order within a tick.
    pub const ALL: [JobId; JOB_COUNT] = [
        JobId::InternalSample,
        JobId::AmbientSample,
        JobId::PageRotation,
        JobId::DisplayReset,
        JobId::SensorHeat,
    ];

    const fn slot(self) -> usize {
        match self {
            Self::InternalSample => 0,
            Self::AmbientSample => 1,
            Self::PageRotation => 2,
            Self::DisplayReset => 3,
            Self::SensorHeat => 4,
        }
    }
}

/// Interval of every job; `0` leaves a job unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPlan {
    pub intervals_ms: [u64; JOB_COUNT],
}

impl JobPlan {
    pub fn from_config(config: &SystemConfig) -> Self {
        let secs = |s: u32| u64::from(s) * 1000;
        let ambient = if config.ambient_sensor_enabled {
            secs(config.ambient_sample_secs)
        } else {
            0
        };
        Self {
            intervals_ms: [
                secs(config.internal_sample_secs),
                ambient,
                secs(config.page_refresh_secs),
                secs(config.display_reset_secs),
                secs(config.sensor_heat_secs),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct JobSlot {
    interval_ms: u64,
    last_run_ms: u64,
}

pub type DueJobs = Vec<JobId, JOB_COUNT>;

pub struct Scheduler {
    plan: JobPlan,
    slots: [Option<JobSlot>; JOB_COUNT],
}

impl Scheduler {
    /// Build with every planned job registered at `now_ms`.
    pub fn new(plan: JobPlan, now_ms: u64) -> Self {
        let mut sched = Self {
            plan,
            slots: [None; JOB_COUNT],
        };
        sched.register_plan(now_ms);
        sched
    }

    /// Collect the jobs due at `now_ms`, in order.
    pub fn tick(&mut self, now_ms: u64) -> DueJobs {
        let mut due = Vec::new();
        for job in JobId::ALL {
            if let Some(slot) = &mut self.slots[job.slot()] {
                if now_ms.saturating_sub(slot.last_run_ms) >= slot.interval_ms {
                    slot.last_run_ms = now_ms;
                    let _ = due.push(job);
                }
            }
        }
        due
    }

    /// Drop every job at once.
    pub fn clear(&mut self) {
        self.slots = [None; JOB_COUNT];
        info!("Scheduler: all jobs cleared");
    }

    /// Re-register the original plan; intervals restart from `now_ms`.
    pub fn restore(&mut self, now_ms: u64) {
        self.register_plan(now_ms);
        info!("Scheduler: {} jobs restored", self.active_count());
    }

    pub fn is_registered(&self, job: JobId) -> bool {
        self.slots[job.slot()].is_some()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn register_plan(&mut self, now_ms: u64) {
        for job in JobId::ALL {
            let interval_ms = self.plan.intervals_ms[job.slot()];
            self.slots[job.slot()] = (interval_ms > 0).then_some(JobSlot {
                interval_ms,
                last_run_ms: now_ms,
            });
        }
    }
}
