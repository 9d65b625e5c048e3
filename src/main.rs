//! Dry box supervisor: entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                    │
//! │  HardwareAdapter / SimulatedHardware   FileStore   CsvEventLog │
//! │  (Sensor · Fan · Display · Device)     (Storage)   (Log)      │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ───────────────────     │
//! │                                                               │
//! │   tick thread ──┐                                             │
//! │   buttons ──────┼──▶ EVENTS ──▶ Supervisor ──▶ SNAPSHOT ──▶ spinner
//! │   SIGINT ───────┘                                             │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use std::ops::ControlFlow;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info};

use drybox::adapters::console_display::ConsoleDisplay;
use drybox::adapters::csv_log::CsvEventLog;
use drybox::adapters::file_store::FileStore;
use drybox::adapters::time::SystemClock;
use drybox::animation::Spinner;
use drybox::app::ports::{Clock, DisplayPort, FanPort, LogPort, SensorPort, StoragePort};
use drybox::app::supervisor::Supervisor;
use drybox::config::SystemConfig;
use drybox::diagnostics;
use drybox::events::{EVENTS, Event, SHUTDOWN_REQUESTED, next_event, push_event, request_shutdown};
use drybox::snapshot::SNAPSHOT;

/// Cleared once the supervisor has stopped; producer threads exit on it.
static RUNNING: AtomicBool = AtomicBool::new(true);

#[derive(Parser, Debug)]
#[command(name = "drybox", version, about)]
struct Cli {
    /// Configuration file (JSON).  Missing file = built-in defaults.
    #[arg(default_value = "drybox.json")]
    config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    debug: bool,
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(if cli.debug {
        "debug"
    } else {
        "info"
    }))
    .format_timestamp_millis()
    .init();
    diagnostics::install_panic_handler();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    info!("drybox v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Configuration and durable state ────────────────────
    let config = SystemConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let storage = FileStore::open(&config.state_dir).context("opening state directory")?;
    let event_log = CsvEventLog::open(&config.log_file)
        .with_context(|| format!("opening event log {}", config.log_file.display()))?;
    let clock = SystemClock::new();
    let display = ConsoleDisplay::new(config.temperature_unit);

    // ── 2. Hardware ───────────────────────────────────────────
    #[cfg(feature = "rpi")]
    let hw = drybox::adapters::hardware::rpi::open_hardware(&config)?;
    #[cfg(not(feature = "rpi"))]
    let hw = drybox::adapters::simulated::SimulatedHardware::new(
        display,
        config.ambient_sensor_enabled,
    );

    // ── 3. Supervisor ─────────────────────────────────────────
    let mut supervisor = Supervisor::try_new(config.clone(), hw, storage, event_log, clock.now_ms())
        .context("startup")?;
    SNAPSHOT.publish(supervisor.snapshot());

    ctrlc::set_handler(|| {
        info!("SIGINT received");
        request_shutdown(&EVENTS, &SHUTDOWN_REQUESTED);
    })
    .context("installing SIGINT handler")?;

    // ── 4. Producers ──────────────────────────────────────────
    let mut workers = vec![
        spawn_ticker(config.tick_interval_ms),
        spawn_spinner(config.animation_period_ms, clock, display),
    ];
    workers.extend(spawn_buttons(&config, clock)?);

    // ── 5. Event loop ─────────────────────────────────────────
    run_event_loop(&mut supervisor, &clock);

    RUNNING.store(false, Ordering::SeqCst);
    for worker in workers {
        let _ = worker.join();
    }
    info!("Stopped");
    Ok(())
}

/// Take events one at a time until the supervisor stops.  A panicking
/// handler is logged and its event dropped.
fn run_event_loop<H, S, L>(supervisor: &mut Supervisor<H, S, L>, clock: &impl Clock)
where
    H: SensorPort + FanPort + DisplayPort,
    S: StoragePort,
    L: LogPort,
{
    loop {
        let event = futures_lite::future::block_on(next_event(&EVENTS, &SHUTDOWN_REQUESTED));
        let now_ms = clock.now_ms();
        let flow = match catch_unwind(AssertUnwindSafe(|| supervisor.handle(event, now_ms))) {
            Ok(flow) => flow,
            Err(_) => {
                error!("Handler for {:?} panicked, event dropped", event);
                ControlFlow::Continue(())
            }
        };
        SNAPSHOT.publish(supervisor.snapshot());
        if flow.is_break() {
            break;
        }
    }
}

// ── Producer threads ──────────────────────────────────────────

fn spawn_ticker(interval_ms: u64) -> JoinHandle<()> {
    thread::spawn(move || {
        while RUNNING.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(interval_ms));
            push_event(&EVENTS, Event::Tick);
        }
    })
}

fn spawn_spinner(period_ms: u64, clock: SystemClock, mut display: ConsoleDisplay) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut spinner = Spinner::new();
        while RUNNING.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(period_ms));
            if let Some(snapshot) = SNAPSHOT.latest() {
                spinner.draw(&snapshot, clock.now_ms(), &mut display);
            }
        }
    })
}

#[cfg(feature = "rpi")]
fn spawn_buttons(config: &SystemConfig, clock: SystemClock) -> Result<Option<JoinHandle<()>>> {
    let mut source = drybox::adapters::hardware::rpi::open_buttons(config)?;
    let poll = Duration::from_millis(config.button_poll_ms);
    Ok(Some(thread::spawn(move || {
        while RUNNING.load(Ordering::SeqCst) {
            for button in source.poll(clock.now_ms()) {
                push_event(&EVENTS, Event::Button(button));
            }
            thread::sleep(poll);
        }
    })))
}

/// Keyboard stand-in for the buttons.  Blocks on stdin, so it is never
/// joined; end of input shuts the appliance down.
#[cfg(not(feature = "rpi"))]
fn spawn_buttons(_config: &SystemConfig, _clock: SystemClock) -> Result<Option<JoinHandle<()>>> {
    use std::io::BufRead;

    info!("Keys: l/r/u/d/a/b press, U/D hold, q quit (then Enter)");
    thread::spawn(|| {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            for event in line.chars().filter_map(Event::from_key) {
                if event == Event::Shutdown {
                    request_shutdown(&EVENTS, &SHUTDOWN_REQUESTED);
                } else {
                    push_event(&EVENTS, event);
                }
            }
        }
        if RUNNING.load(Ordering::SeqCst) {
            request_shutdown(&EVENTS, &SHUTDOWN_REQUESTED);
        }
    });
    Ok(None)
}
