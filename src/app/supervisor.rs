//! Supervisor: the hexagonal core.
//!
//! [`Supervisor`] owns the fan supervisor, statistics, thresholds, page
//! controller and scheduler, plus the driven ports.  Every [`Event`] is
//! applied by [`Supervisor::handle`] to completion before the next one is
//! taken, so each of those entities has exactly one writer.
//!
//! ```text
//!   Event queue ──▶ ┌──────────────────────────────────┐ ──▶ DisplayPort
//!                   │            Supervisor            │ ──▶ FanPort
//!    SensorPort ──▶ │ Scheduler · Fan · Stats · UI     │ ──▶ StoragePort
//!                   └──────────────────────────────────┘ ──▶ LogPort
//! ```
//!
//! Lifecycle: `Initializing → Running → (Tripped ↔ Running) → ShuttingDown
//! → Stopped`.

use core::ops::ControlFlow;

use log::{debug, error, info, warn};

use crate::app::ports::{
    ConfigError, DevicePort, DisplayPort, FanPort, LogPort, LogRecord, SensorPort, Severity,
    StoragePort,
};
use crate::config::SystemConfig;
use crate::control::fan::{FanState, FanSupervisor};
use crate::control::hysteresis::{self, FanDecision};
use crate::diagnostics;
use crate::display::{extrema_summary, format_duration};
use crate::error::StartupFault;
use crate::events::{ButtonEvent, Event};
use crate::scheduler::{JobId, JobPlan, Scheduler};
use crate::sensors::{Reading, Zone};
use crate::snapshot::StatusSnapshot;
use crate::statistics::RunStatistics;
use crate::thresholds::{ThresholdStore, Thresholds};
use crate::ui::{LimitChoice, Page, PageController, UiOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Initializing,
    Running,
    Tripped,
    ShuttingDown,
    Stopped,
}

impl Lifecycle {
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

pub struct Supervisor<H, S, L> {
    hw: H,
    storage: S,
    log: L,
    config: SystemConfig,
    lifecycle: Lifecycle,
    scheduler: Scheduler,
    fan: FanSupervisor,
    stats: RunStatistics,
    thresholds: ThresholdStore,
    ui: PageController,
    readings: [Option<Reading>; 2],
    /// Humidity of the last reading written to the event log, per zone.
    last_logged_humidity: [Option<f32>; 2],
}

impl<H, S, L> Supervisor<H, S, L>
where
    H: SensorPort + FanPort + DisplayPort,
    S: StoragePort,
    L: LogPort,
{
    /// Wire up the ports.  No I/O happens until [`start`](Self::start).
    pub fn new(config: SystemConfig, hw: H, storage: S, log: L) -> Self {
        let plan = JobPlan::from_config(&config);
        let ui = PageController::new(
            0,
            u64::from(config.inactivity_timeout_secs) * 1000,
            config.humidity_step,
        );
        Self {
            hw,
            storage,
            log,
            lifecycle: Lifecycle::Initializing,
            scheduler: Scheduler::new(plan, 0),
            fan: FanSupervisor::new(Default::default()),
            stats: RunStatistics::default(),
            thresholds: ThresholdStore::new(config.default_thresholds()),
            ui,
            readings: [None; 2],
            last_logged_humidity: [None; 2],
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// [`new`](Self::new) then [`start`](Self::start) at `now_ms`: a
    /// supervisor that is already `Running`, or the fault that stopped it.
    pub fn try_new(
        config: SystemConfig,
        hw: H,
        storage: S,
        log: L,
        now_ms: u64,
    ) -> Result<Self, StartupFault>
    where
        H: DevicePort,
    {
        let mut supervisor = Self::new(config, hw, storage, log);
        supervisor.start(now_ms)?;
        Ok(supervisor)
    }


    /// `Initializing → Running`.
    ///
    /// Probes every installed device, loads persisted thresholds and
    /// statistics (falling back to defaults on a storage fault), registers
    /// the jobs and takes a first ambient sample.  On error the supervisor
    /// stays `Initializing` and must not be driven further.
    pub fn start(&mut self, now_ms: u64) -> Result<(), StartupFault>
    where
        H: DevicePort,
    {
        if self.lifecycle != Lifecycle::Initializing {
            return Ok(());
        }
        self.config.validate().map_err(|e| match e {
            ConfigError::ValidationFailed(msg) => StartupFault::InvalidConfig(msg),
            _ => StartupFault::InvalidConfig("unreadable configuration"),
        })?;

        self.hw.render_border_message("Initializing...");
        self.record(now_ms, Severity::Info, "System", "", "Starting up".into());

        let report = diagnostics::check_installed_devices(&self.config.installed_devices, &mut self.hw);
        for status in &report.devices {
            let severity = if status.result.is_ok() {
                Severity::Info
            } else {
                Severity::Error
            };
            self.record(now_ms, severity, "Diagnostics", "", status.to_string());
        }
        if let Some(name) = report.first_failure() {
            let fault = StartupFault::DeviceNotDetected(name.to_string());
            error!("Startup failed: {}", fault);
            self.record(
                now_ms,
                Severity::Critical,
                "Diagnostics",
                "",
                "Overall Status: Fail".into(),
            );
            self.hw.render_border_message("Startup failed");
            return Err(fault);
        }
        self.record(
            now_ms,
            Severity::Info,
            "Diagnostics",
            "",
            "Overall Status: Pass".into(),
        );

        let defaults = self.config.default_thresholds();
        self.thresholds = match ThresholdStore::load(&self.storage, defaults) {
            Ok(store) => store,
            Err(e) => {
                warn!("Thresholds load failed ({}), using defaults", e);
                self.record_storage_fault(now_ms, "thresholds", "load", e);
                ThresholdStore::new(defaults)
            }
        };
        self.stats = match RunStatistics::load(&self.storage) {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Statistics load failed ({}), starting fresh", e);
                self.record_storage_fault(now_ms, "statistics", "load", e);
                RunStatistics::default()
            }
        };
        self.fan = FanSupervisor::new(self.stats.fan_totals());
        if let Err(e) = self.hw.set_fan_speed(0) {
            warn!("Fan: initial stop failed: {}", e);
        }

        self.ui = PageController::new(
            now_ms,
            u64::from(self.config.inactivity_timeout_secs) * 1000,
            self.config.humidity_step,
        );
        self.scheduler = Scheduler::new(JobPlan::from_config(&self.config), now_ms);
        self.lifecycle = Lifecycle::Running;
        info!(
            "Supervisor running with {} jobs",
            self.scheduler.active_count()
        );
        self.record(now_ms, Severity::Info, "System", "", "Running".into());

        if self.config.ambient_sensor_enabled {
            self.sample_zone(Zone::Ambient, now_ms);
        }
        self.render();
        Ok(())
    }

    /// Apply one event.  `Break` once the supervisor has stopped.
    pub fn handle(&mut self, event: Event, now_ms: u64) -> ControlFlow<()> {
        match (self.lifecycle, event) {
            (Lifecycle::Stopped, _) => return ControlFlow::Break(()),
            (Lifecycle::Initializing | Lifecycle::ShuttingDown, _) => {
                debug!("Event {:?} ignored while {:?}", event, self.lifecycle);
            }
            (_, Event::Shutdown) => {
                self.shutdown(now_ms);
                return ControlFlow::Break(());
            }
            (_, Event::Tick) => self.run_due_jobs(now_ms),
            (_, Event::Button(button)) => return self.on_button(button, now_ms),
        }
        ControlFlow::Continue(())
    }

    /// `→ ShuttingDown → Stopped`.  Stops the fan, flushes state and
    /// blanks the display.  Idempotent.
    pub fn shutdown(&mut self, now_ms: u64) {
        if matches!(
            self.lifecycle,
            Lifecycle::ShuttingDown | Lifecycle::Stopped
        ) {
            return;
        }
        self.lifecycle = Lifecycle::ShuttingDown;
        info!("Supervisor shutting down");

        if let Some(elapsed_ms) = self.fan.force_off(now_ms, &mut self.hw) {
            self.record(
                now_ms,
                Severity::Info,
                "Fan",
                "",
                format!("Fan run time: {}", format_duration(elapsed_ms)),
            );
        }
        self.stats.sync_fan(self.fan.totals());
        self.persist_statistics(now_ms);
        self.commit_thresholds(now_ms);
        for zone in Zone::ALL {
            info!("{}", extrema_summary(zone, &self.stats.extrema(zone)));
        }

        self.hw.render_border_message("Shutting down...");
        self.record(now_ms, Severity::Info, "System", "", "Shutting down".into());
        self.hw.clear();
        self.lifecycle = Lifecycle::Stopped;
    }

    // ── Scheduled jobs ────────────────────────────────────────

    fn run_due_jobs(&mut self, now_ms: u64) {
        for job in self.scheduler.tick(now_ms) {
            // A trip earlier in this tick clears the job set.
            if !self.scheduler.is_registered(job) {
                debug!("Job {:?} skipped, no longer registered", job);
                continue;
            }
            match job {
                JobId::InternalSample => self.internal_sample(now_ms),
                JobId::AmbientSample => {
                    self.sample_zone(Zone::Ambient, now_ms);
                }
                JobId::PageRotation => self.render(),
                JobId::DisplayReset => match self.ui.check_inactivity(now_ms) {
                    UiOutcome::Commit => {
                        self.commit_thresholds(now_ms);
                        self.render();
                    }
                    UiOutcome::Redraw => self.render(),
                    _ => {}
                },
                JobId::SensorHeat => self.heat_sensors(now_ms),
            }
        }
    }

    /// Sample the chamber, apply hysteresis, then check the runtime.  The
    /// runtime check does not need a reading and runs on a failed read too.
    fn internal_sample(&mut self, now_ms: u64) {
        let th = self.thresholds.get();
        let limit_ms = th.fan_runtime_limit_ms();
        let decision = self
            .sample_zone(Zone::Internal, now_ms)
            .map_or(FanDecision::Hold, |r| hysteresis::decide(r.humidity, &th));

        match decision {
            FanDecision::Engage => {
                match self.fan.engage(self.config.fan_engage_speed, now_ms, &mut self.hw) {
                    Ok(true) => {
                        self.record(
                            now_ms,
                            Severity::Info,
                            "Fan",
                            "",
                            format!(
                                "Fan started, exceeded MAX humidity of: {:.1}%",
                                th.max_humidity
                            ),
                        );
                        self.hw.render_border_message("Fan Started...");
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Fan: start failed: {}", e);
                        self.record(
                            now_ms,
                            Severity::Error,
                            "Fan",
                            "",
                            format!("Fan start failed: {}", e),
                        );
                    }
                }
            }
            FanDecision::Disengage => {
                if let Some(ended) = self.fan.disengage(now_ms, limit_ms, &mut self.hw) {
                    self.record(
                        now_ms,
                        Severity::Info,
                        "Fan",
                        "",
                        format!(
                            "Fan stopped, passed MIN humidity of: {:.1}%",
                            th.min_humidity
                        ),
                    );
                    self.close_run(now_ms, ended.elapsed_ms);
                    if ended.tripped {
                        self.enter_trip(now_ms, ended.elapsed_ms);
                        return;
                    }
                    self.hw.render_border_message("Fan Stopped...");
                }
            }
            FanDecision::Hold => {}
        }

        if let Some(ended) = self.fan.trip_if_exceeded(now_ms, limit_ms, &mut self.hw) {
            self.close_run(now_ms, ended.elapsed_ms);
            self.enter_trip(now_ms, ended.elapsed_ms);
        }
    }

    /// Read one zone, fold it into the statistics and the event log.
    /// `None` when the sensor failed; nothing is mutated then.
    fn sample_zone(&mut self, zone: Zone, now_ms: u64) -> Option<Reading> {
        let reading = match self.hw.read_reading(zone) {
            Ok(r) => r,
            Err(e) => {
                warn!("{} sensor read failed: {}", zone, e);
                self.record(
                    now_ms,
                    Severity::Warning,
                    "Sensors",
                    zone.name(),
                    format!("Read failed: {}", e),
                );
                return None;
            }
        };
        debug!(
            "{}: {:.1}C {:.1}%",
            zone, reading.temperature_c, reading.humidity
        );
        self.readings[zone.index()] = Some(reading);
        if self.stats.observe(zone, reading) {
            self.persist_statistics(now_ms);
        }

        let delta = self.config.humidity_log_delta;
        let worth_logging = self.last_logged_humidity[zone.index()]
            .is_none_or(|last| (reading.humidity - last).abs() > delta);
        if worth_logging {
            self.last_logged_humidity[zone.index()] = Some(reading.humidity);
            self.record(
                now_ms,
                Severity::Info,
                "Sensors",
                zone.name(),
                format!(
                    "Temperature: {:.1}C, Humidity: {:.1}%",
                    reading.temperature_c, reading.humidity
                ),
            );
        }
        Some(reading)
    }

    fn heat_sensors(&mut self, now_ms: u64) {
        for zone in Zone::ALL {
            if zone == Zone::Ambient && !self.config.ambient_sensor_enabled {
                continue;
            }
            match self.hw.heat(zone) {
                Ok(()) => debug!("{} sensor heater pulsed", zone),
                Err(e) => {
                    warn!("{} sensor heater failed: {}", zone, e);
                    self.record(
                        now_ms,
                        Severity::Warning,
                        "Sensors",
                        zone.name(),
                        format!("Heater failed: {}", e),
                    );
                }
            }
        }
    }

    // ── Fan run accounting and the safety trip ────────────────

    fn close_run(&mut self, now_ms: u64, elapsed_ms: u64) {
        self.record(
            now_ms,
            Severity::Info,
            "Fan",
            "",
            format!("Fan run time: {}", format_duration(elapsed_ms)),
        );
        if self.stats.sync_fan(self.fan.totals()) {
            self.persist_statistics(now_ms);
        }
    }

    /// `Running → Tripped`.  Drops every scheduled job and forces the
    /// acknowledgement page.
    fn enter_trip(&mut self, now_ms: u64, elapsed_ms: u64) {
        self.scheduler.clear();
        self.commit_thresholds(now_ms);
        self.ui.enter_limit_exceeded(now_ms);
        self.lifecycle = Lifecycle::Tripped;

        let limit_ms = self.thresholds.get().fan_runtime_limit_ms();
        error!(
            "Fan runtime {} exceeded limit {}",
            format_duration(elapsed_ms),
            format_duration(limit_ms)
        );
        self.record(
            now_ms,
            Severity::Critical,
            "Fan",
            "",
            format!(
                "Fan runtime limit of {} exceeded ({})",
                format_duration(limit_ms),
                format_duration(elapsed_ms)
            ),
        );
        self.render();
    }

    /// `Tripped → Running` after CLEAR: double the limit, persist it and
    /// put the job plan back.
    fn clear_trip(&mut self, now_ms: u64) {
        let limit_secs = self
            .thresholds
            .double_runtime_limit(self.config.fan_runtime_limit_ceiling_secs);
        self.commit_thresholds(now_ms);
        self.fan.clear_trip();
        self.scheduler.restore(now_ms);
        self.ui.reset_to_default(now_ms);
        self.lifecycle = Lifecycle::Running;

        info!("Trip cleared, runtime limit now {} s", limit_secs);
        self.record(
            now_ms,
            Severity::Warning,
            "Fan",
            "",
            format!(
                "Limit cleared, fan runtime limit now {}",
                format_duration(limit_secs.saturating_mul(1000))
            ),
        );
        self.render();
    }

    // ── Buttons ───────────────────────────────────────────────

    fn on_button(&mut self, button: ButtonEvent, now_ms: u64) -> ControlFlow<()> {
        debug!("Button {:?}", button);
        match self.ui.handle(button, now_ms, &mut self.thresholds) {
            UiOutcome::Unchanged => {}
            UiOutcome::Redraw => self.render(),
            UiOutcome::Commit => {
                self.commit_thresholds(now_ms);
                self.render();
            }
            UiOutcome::Acknowledged(LimitChoice::Ok) => {
                self.record(
                    now_ms,
                    Severity::Warning,
                    "Fan",
                    "",
                    "Limit acknowledged, shutting down".into(),
                );
                self.shutdown(now_ms);
                return ControlFlow::Break(());
            }
            UiOutcome::Acknowledged(LimitChoice::Clear) => self.clear_trip(now_ms),
        }
        ControlFlow::Continue(())
    }

    // ── Persistence ───────────────────────────────────────────

    fn persist_statistics(&mut self, now_ms: u64) {
        if let Err(e) = self.stats.persist(&mut self.storage) {
            self.record_storage_fault(now_ms, "statistics", "save", e);
        }
    }

    fn commit_thresholds(&mut self, now_ms: u64) {
        if let Err(e) = self.thresholds.commit(&mut self.storage) {
            self.record_storage_fault(now_ms, "thresholds", "save", e);
        }
    }

    fn record_storage_fault(
        &mut self,
        now_ms: u64,
        id: &'static str,
        op: &str,
        e: crate::app::ports::StorageError,
    ) {
        self.record(
            now_ms,
            Severity::Warning,
            "Persistence",
            id,
            format!("{} {} failed: {}", id, op, e),
        );
    }

    // ── Output ────────────────────────────────────────────────

    fn render(&mut self) {
        let snapshot = self.snapshot();
        self.hw.render(&snapshot);
    }

    fn record(
        &mut self,
        now_ms: u64,
        severity: Severity,
        subsystem: &'static str,
        id: &'static str,
        message: String,
    ) {
        self.log.append(&LogRecord {
            uptime_ms: now_ms,
            severity,
            subsystem,
            id,
            message,
        });
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            page: self.ui.page(),
            lifecycle: self.lifecycle,
            fan: self.fan.state(),
            totals: self.fan.totals(),
            thresholds: self.thresholds.get(),
            extrema: [
                self.stats.extrema(Zone::Internal),
                self.stats.extrema(Zone::Ambient),
            ],
            readings: self.readings,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn page(&self) -> Page {
        self.ui.page()
    }

    pub fn fan_state(&self) -> FanState {
        self.fan.state()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds.get()
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    /// Number of registered scheduler jobs.
    pub fn active_jobs(&self) -> usize {
        self.scheduler.active_count()
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn event_log(&self) -> &L {
        &self.log
    }
}
