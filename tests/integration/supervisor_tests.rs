//! Supervisor lifecycle, fan hysteresis and the runtime safety trip.

use std::ops::ControlFlow;

use drybox::app::ports::Severity;
use drybox::app::supervisor::{Lifecycle, Supervisor};
use drybox::config::SystemConfig;
use drybox::control::fan::FanState;
use drybox::error::StartupFault;
use drybox::events::{ButtonEvent, ButtonId, Event};
use drybox::ui::{LimitChoice, Page};

use crate::mock_hw::{
    HwCall, MemStore, MockHardware, RecordingLog, TICK_MS, TestSupervisor, run_ticks, started,
    test_config,
};

fn press(sup: &mut TestSupervisor, id: ButtonId, now_ms: u64) -> ControlFlow<()> {
    sup.handle(Event::Button(ButtonEvent::Pressed(id)), now_ms)
}

/// Internal sampling every 75 s with a 60 s limit: the run started at
/// t = 75 s is only looked at again at t = 150 s, when it ends.  The
/// chamber is humid again by the sample after that.
fn trip_on_disengage() -> TestSupervisor {
    let config = SystemConfig {
        internal_sample_secs: 75,
        fan_runtime_limit_secs: 60,
        ..test_config()
    };
    let mut sup = started(config, MockHardware::with_humidity(&[62.0, 38.0, 70.0]));
    run_ticks(&mut sup, 1, 150);
    sup
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_reaches_running_with_fan_stopped() {
    let sup = started(test_config(), MockHardware::new());

    assert_eq!(sup.lifecycle(), Lifecycle::Running);
    assert_eq!(sup.page(), Page::Default);
    assert_eq!(sup.fan_state(), FanState::Idle);
    assert_eq!(sup.active_jobs(), 4);
    assert_eq!(sup.hardware().fan_commands(), vec![0]);
    assert_eq!(sup.hardware().borders(), vec!["Initializing..."]);
    assert_eq!(sup.hardware().last_rendered_page(), Some(Page::Default));

    let log = sup.event_log();
    assert!(log.contains("Starting up"));
    assert!(log.contains("EMC2101: Detected"));
    assert!(log.contains("Overall Status: Pass"));
    // First ambient sample is taken before the jobs start ticking.
    assert!(sup.snapshot().readings[1].is_some());
}

#[test]
fn heater_job_counts_when_enabled() {
    let config = SystemConfig {
        sensor_heat_secs: 2,
        ..SystemConfig::default()
    };
    let mut sup = started(config, MockHardware::new());
    assert_eq!(sup.active_jobs(), 5);

    run_ticks(&mut sup, 1, 2);
    let heats: Vec<_> = sup
        .hardware()
        .calls
        .iter()
        .filter(|c| matches!(c, HwCall::Heat(_)))
        .collect();
    assert_eq!(heats.len(), 2, "both zones pulsed once");
}

#[test]
fn missing_device_is_a_startup_fault() {
    let mut hw = MockHardware::new();
    hw.missing_device = Some("EMC2101");
    let mut sup = Supervisor::new(test_config(), hw, MemStore::new(), RecordingLog::new());

    assert_eq!(
        sup.start(0),
        Err(StartupFault::DeviceNotDetected("EMC2101".into()))
    );
    assert_eq!(sup.lifecycle(), Lifecycle::Initializing);
    assert!(sup.event_log().contains("Overall Status: Fail"));
    assert!(sup.event_log().contains("SHT41_Internal: Detected"));
    assert!(sup.hardware().borders().contains(&"Startup failed"));

    // Nothing is driven before a successful start.
    assert_eq!(sup.handle(Event::Tick, TICK_MS), ControlFlow::Continue(()));
    assert!(sup.hardware().fan_commands().is_empty());
}

#[test]
fn fallible_constructor_returns_a_running_supervisor() {
    let sup = Supervisor::try_new(
        test_config(),
        MockHardware::new(),
        MemStore::new(),
        RecordingLog::new(),
        0,
    )
    .expect("devices present");
    assert_eq!(sup.lifecycle(), Lifecycle::Running);
    assert_eq!(sup.active_jobs(), 4);

    let mut hw = MockHardware::new();
    hw.missing_device = Some("SHT41_Internal");
    let fault = Supervisor::try_new(test_config(), hw, MemStore::new(), RecordingLog::new(), 0)
        .err()
        .expect("startup fault");
    assert_eq!(fault, StartupFault::DeviceNotDetected("SHT41_Internal".into()));
}

#[test]
fn invalid_config_is_rejected_before_any_io() {
    let config = SystemConfig {
        default_min_humidity: 70.0,
        ..test_config()
    };
    let mut sup = Supervisor::new(config, MockHardware::new(), MemStore::new(), RecordingLog::new());

    assert!(matches!(sup.start(0), Err(StartupFault::InvalidConfig(_))));
    assert!(sup.hardware().calls.is_empty());
    assert!(sup.event_log().records.is_empty());
}

// ── Hysteresis ────────────────────────────────────────────────

#[test]
fn fan_follows_the_dead_band() {
    let mut sup = started(
        test_config(),
        MockHardware::with_humidity(&[55.0, 62.0, 45.0, 38.0, 41.0]),
    );

    run_ticks(&mut sup, 1, 2);
    assert_eq!(sup.fan_state(), FanState::Engaged { since_ms: 2000 });
    run_ticks(&mut sup, 3, 3);
    assert!(matches!(sup.fan_state(), FanState::Engaged { .. }), "45% holds");
    run_ticks(&mut sup, 4, 5);
    assert_eq!(sup.fan_state(), FanState::Idle);

    assert_eq!(sup.hardware().fan_commands(), vec![0, 100, 0]);
    assert_eq!(
        sup.hardware().borders(),
        vec!["Initializing...", "Fan Started...", "Fan Stopped..."]
    );

    let totals = sup.statistics().fan_totals();
    assert_eq!(totals.cycle_count, 1);
    assert_eq!(totals.total_duration_ms, 2000);

    let log = sup.event_log();
    assert!(log.contains("Fan started, exceeded MAX humidity of: 60.0%"));
    assert!(log.contains("Fan stopped, passed MIN humidity of: 40.0%"));
    assert!(log.contains("Fan run time: 0:00:02"));
}

#[test]
fn repeated_high_readings_start_the_fan_once() {
    let mut sup = started(test_config(), MockHardware::with_humidity(&[65.0]));
    run_ticks(&mut sup, 1, 10);
    assert_eq!(sup.hardware().fan_commands(), vec![0, 100]);
    assert_eq!(sup.event_log().count("Fan started"), 1);
}

// ── Safety trip ───────────────────────────────────────────────

#[test]
fn overlong_run_trips_on_disengage() {
    let sup = trip_on_disengage();

    assert_eq!(sup.lifecycle(), Lifecycle::Tripped);
    assert_eq!(sup.fan_state(), FanState::Tripped);
    assert_eq!(sup.active_jobs(), 0);
    assert_eq!(
        sup.page(),
        Page::LimitExceeded {
            choice: LimitChoice::Ok
        }
    );
    assert_eq!(sup.statistics().fan_totals().max_runtime_ms, 75_000);
    assert_eq!(sup.hardware().fan_commands(), vec![0, 100, 0]);
    assert_eq!(
        sup.hardware().last_rendered_page(),
        Some(Page::LimitExceeded {
            choice: LimitChoice::Ok
        })
    );
    // The trip replaces the "Fan Stopped..." notice.
    assert!(!sup.hardware().borders().contains(&"Fan Stopped..."));

    let critical = sup.event_log().with_severity(Severity::Critical);
    assert_eq!(critical.len(), 1);
    assert_eq!(
        critical[0].message,
        "Fan runtime limit of 0:01:00 exceeded (0:01:15)"
    );
}

#[test]
fn ongoing_run_trips_once_past_the_limit() {
    let config = SystemConfig {
        fan_runtime_limit_secs: 60,
        ..test_config()
    };
    let mut sup = started(config, MockHardware::with_humidity(&[62.0]));

    // Engaged at t = 1 s; 60 s later the run is exactly at the limit.
    run_ticks(&mut sup, 1, 61);
    assert_eq!(sup.lifecycle(), Lifecycle::Running);
    assert!(matches!(sup.fan_state(), FanState::Engaged { .. }));

    run_ticks(&mut sup, 62, 62);
    assert_eq!(sup.lifecycle(), Lifecycle::Tripped);
    assert_eq!(sup.fan_state(), FanState::Tripped);
    assert_eq!(sup.statistics().fan_totals().max_runtime_ms, 61_000);
    assert!(!sup.hardware().fan_running());
}

#[test]
fn dead_sensor_does_not_keep_the_fan_running() {
    let config = SystemConfig {
        fan_runtime_limit_secs: 60,
        ..test_config()
    };
    let mut sup = started(config, MockHardware::with_humidity(&[62.0]));
    run_ticks(&mut sup, 1, 1);
    assert_eq!(sup.fan_state(), FanState::Engaged { since_ms: 1000 });

    sup.hardware_mut().sensor_offline = true;
    run_ticks(&mut sup, 2, 61);
    assert_eq!(sup.lifecycle(), Lifecycle::Running);

    run_ticks(&mut sup, 62, 62);
    assert_eq!(sup.lifecycle(), Lifecycle::Tripped);
    assert_eq!(sup.fan_state(), FanState::Tripped);
    assert!(!sup.hardware().fan_running());
    assert_eq!(sup.statistics().fan_totals().max_runtime_ms, 61_000);
    assert!(sup.event_log().contains("Read failed"));
}

#[test]
fn late_tick_still_runs_each_job_once() {
    let mut sup = started(test_config(), MockHardware::with_humidity(&[62.0, 62.0, 30.0]));
    run_ticks(&mut sup, 1, 1);
    let renders = sup.hardware().render_count();

    // Ticks 2..=6 are lost; the one at 7 s finds every job due.
    let _ = sup.handle(Event::Tick, 7 * TICK_MS);
    assert!(sup.hardware().render_count() > renders, "rotation ran");
    let _ = sup.handle(Event::Tick, 8 * TICK_MS);
    assert_eq!(sup.fan_state(), FanState::Idle);
    assert_eq!(sup.statistics().fan_totals().total_duration_ms, 7000);
}

#[test]
fn tripped_supervisor_runs_no_jobs() {
    let mut sup = trip_on_disengage();
    let calls_before = sup.hardware().calls.len();

    run_ticks(&mut sup, 151, 200);
    assert_eq!(sup.hardware().calls.len(), calls_before);
    assert_eq!(sup.lifecycle(), Lifecycle::Tripped);
}

#[test]
fn tripped_page_ignores_navigation() {
    let mut sup = trip_on_disengage();
    let now = 151 * TICK_MS;

    let _ = press(&mut sup, ButtonId::Up, now);
    let _ = press(&mut sup, ButtonId::B, now);
    assert_eq!(
        sup.page(),
        Page::LimitExceeded {
            choice: LimitChoice::Ok
        }
    );

    let _ = press(&mut sup, ButtonId::Left, now);
    assert_eq!(
        sup.page(),
        Page::LimitExceeded {
            choice: LimitChoice::Clear
        }
    );
}

#[test]
fn clear_doubles_the_limit_and_resumes() {
    let mut sup = trip_on_disengage();
    let now = 151 * TICK_MS;

    let _ = press(&mut sup, ButtonId::Right, now);
    assert_eq!(press(&mut sup, ButtonId::A, now), ControlFlow::Continue(()));

    assert_eq!(sup.lifecycle(), Lifecycle::Running);
    assert_eq!(sup.fan_state(), FanState::Idle);
    assert_eq!(sup.page(), Page::Default);
    assert_eq!(sup.active_jobs(), 4);
    assert_eq!(sup.thresholds().fan_runtime_limit_secs, 120);
    assert_eq!(
        sup.storage().json("thresholds").unwrap()["fan_runtime_limit_secs"],
        120
    );
    assert!(sup.event_log().contains("Limit cleared, fan runtime limit now 0:02:00"));

    // Intervals restart from the clear: the next internal sample is 75 s out.
    run_ticks(&mut sup, 152, 225);
    assert_eq!(sup.hardware().fan_commands(), vec![0, 100, 0]);
    run_ticks(&mut sup, 226, 226);
    assert_eq!(sup.hardware().fan_commands(), vec![0, 100, 0, 100]);
    assert_eq!(sup.fan_state(), FanState::Engaged { since_ms: 226_000 });
}

#[test]
fn clear_never_exceeds_the_ceiling() {
    let config = SystemConfig {
        fan_runtime_limit_secs: 60,
        fan_runtime_limit_ceiling_secs: 90,
        ..test_config()
    };
    let mut sup = started(config, MockHardware::with_humidity(&[62.0]));
    run_ticks(&mut sup, 1, 62);
    assert_eq!(sup.lifecycle(), Lifecycle::Tripped);

    let _ = press(&mut sup, ButtonId::Left, 63 * TICK_MS);
    let _ = press(&mut sup, ButtonId::A, 63 * TICK_MS);
    assert_eq!(sup.thresholds().fan_runtime_limit_secs, 90);
}

#[test]
fn ok_acknowledges_and_shuts_down() {
    let mut sup = trip_on_disengage();
    let now = 151 * TICK_MS;

    assert_eq!(press(&mut sup, ButtonId::A, now), ControlFlow::Break(()));
    assert_eq!(sup.lifecycle(), Lifecycle::Stopped);
    assert!(sup.event_log().contains("Limit acknowledged, shutting down"));
    assert!(sup.hardware().borders().contains(&"Shutting down..."));
    assert_eq!(sup.hardware().calls.last(), Some(&HwCall::Clear));

    // Stopped is final.
    assert_eq!(sup.handle(Event::Tick, now + TICK_MS), ControlFlow::Break(()));
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_mid_run_accounts_the_run() {
    let mut sup = started(test_config(), MockHardware::with_humidity(&[62.0]));
    run_ticks(&mut sup, 1, 10);

    assert_eq!(sup.handle(Event::Shutdown, 10_500), ControlFlow::Break(()));
    assert_eq!(sup.lifecycle(), Lifecycle::Stopped);
    assert_eq!(sup.fan_state(), FanState::Idle);
    assert!(!sup.hardware().fan_running());

    let totals = sup.statistics().fan_totals();
    assert_eq!(totals.cycle_count, 1);
    assert_eq!(totals.total_duration_ms, 9_500);

    let stored = sup.storage().json("statistics").unwrap();
    assert_eq!(stored["fan"]["cycle_count"], 1);
    assert_eq!(stored["fan"]["total_duration_ms"], 9_500);
    assert!(sup.event_log().contains("Fan run time: 0:00:09"));
    assert!(sup.event_log().contains("Shutting down"));
}

#[test]
fn shutdown_is_idempotent() {
    let mut sup = started(test_config(), MockHardware::new());
    sup.shutdown(1000);
    let calls = sup.hardware().calls.len();
    let records = sup.event_log().records.len();

    sup.shutdown(2000);
    assert_eq!(sup.handle(Event::Shutdown, 3000), ControlFlow::Break(()));
    assert_eq!(sup.hardware().calls.len(), calls);
    assert_eq!(sup.event_log().records.len(), records);
}

// ── Sensors ───────────────────────────────────────────────────

#[test]
fn sensor_failure_mutates_nothing() {
    let mut sup = started(test_config(), MockHardware::with_humidity(&[55.0]));
    run_ticks(&mut sup, 1, 1);
    let before = sup.snapshot();
    let stats_before = sup.statistics().record();

    sup.hardware_mut().sensor_offline = true;
    run_ticks(&mut sup, 2, 3);

    assert_eq!(sup.snapshot().readings, before.readings);
    assert_eq!(sup.statistics().record(), stats_before);
    assert_eq!(sup.fan_state(), FanState::Idle);
    assert_eq!(sup.lifecycle(), Lifecycle::Running);

    let failures: Vec<_> = sup
        .event_log()
        .records
        .iter()
        .filter(|r| r.message.starts_with("Read failed"))
        .collect();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|r| r.severity == Severity::Warning && r.id == "Internal"));
}

#[test]
fn readings_are_logged_on_meaningful_change() {
    let mut sup = started(
        test_config(),
        MockHardware::with_humidity(&[50.0, 50.1, 50.3, 50.6, 50.5]),
    );
    run_ticks(&mut sup, 1, 5);

    let logged: Vec<_> = sup
        .event_log()
        .records
        .iter()
        .filter(|r| r.id == "Internal" && r.message.starts_with("Temperature:"))
        .map(|r| r.message.as_str())
        .collect();
    assert_eq!(
        logged,
        vec![
            "Temperature: 24.0C, Humidity: 50.0%",
            "Temperature: 24.0C, Humidity: 50.3%",
            "Temperature: 24.0C, Humidity: 50.6%",
        ]
    );
}

#[test]
fn extrema_track_readings_and_persist() {
    let mut sup = started(
        test_config(),
        MockHardware::with_humidity(&[50.0, 44.0, 57.0, 52.0]),
    );
    run_ticks(&mut sup, 1, 4);

    let internal = sup.snapshot().extrema[0];
    assert_eq!(internal.low_humidity, Some(44.0));
    assert_eq!(internal.high_humidity, Some(57.0));

    let stored = sup.storage().json("statistics").unwrap();
    assert_eq!(stored["internal"]["high_humidity"], 57.0);
    assert_eq!(stored["ambient"]["high_humidity"], 45.0);
}
