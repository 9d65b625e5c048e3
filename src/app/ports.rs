//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Supervisor (domain)
//! ```
//!
//! Driven adapters (sensors, fan, display, storage, event log) implement these
//! traits.  The [`Supervisor`](super::supervisor::Supervisor) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! Ports never mutate supervisor state; they are invoked synchronously from
//! inside event handling and report failure through typed errors.

use core::fmt;

use crate::error::{ActuatorError, SensorError};
use crate::sensors::{Reading, Zone};
use crate::snapshot::StatusSnapshot;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain zone readings.
pub trait SensorPort {
    /// Take one fresh temperature/humidity reading from `zone`.
    fn read_reading(&mut self, zone: Zone) -> Result<Reading, SensorError>;

    /// Pulse the on-chip heater of the sensor in `zone`.
    fn heat(&mut self, zone: Zone) -> Result<(), SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Fan port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain commands the fan controller.
pub trait FanPort {
    /// Set fan speed, 0–100 %.  0 stops the fan.
    fn set_fan_speed(&mut self, percent: u8) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Display port
// ───────────────────────────────────────────────────────────────

/// Renders what the domain asks for.  Failures are the adapter's to log.
pub trait DisplayPort {
    /// Draw the page described by `snapshot.page`.
    fn render(&mut self, snapshot: &StatusSnapshot);

    /// Draw a single centred message inside a border.
    fn render_border_message(&mut self, text: &str);

    /// Blank the panel.
    fn clear(&mut self);
}

/// Spinner drawing for the animation task.  Only ever given snapshot data.
pub trait AnimationPort {
    fn draw_spinner(&mut self, frame: &crate::animation::SpinnerFrame);
}

// ───────────────────────────────────────────────────────────────
// Device probe port (startup detection)
// ───────────────────────────────────────────────────────────────

pub trait DevicePort {
    /// Probe an installed device by name.  Returns a short status detail
    /// (e.g. the first reading) when the device answered.
    fn probe(&mut self, device: &str) -> Result<String, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ disk)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for thresholds and statistics.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be durable and atomic before returning; a
///   power cut leaves either the old or the new value, never a mix.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event log port (domain → durable log)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        })
    }
}

/// One line of the appliance's event log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Monotonic milliseconds since startup.
    pub uptime_ms: u64,
    pub severity: Severity,
    /// Originating subsystem ("System", "Fan", "Sensors", ...).
    pub subsystem: &'static str,
    /// Sub-identifier within the subsystem (zone name, device), may be empty.
    pub id: &'static str,
    pub message: String,
}

/// Fire-and-forget event log.  Adapters swallow (and report) their own
/// write failures.
pub trait LogPort {
    fn append(&mut self, record: &LogRecord);
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from loading the configuration file.
#[derive(Debug)]
pub enum ConfigError {
    /// File exists but failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error reading the file.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Value does not fit the caller's buffer or the disk is full.
    Full,
    /// Generic I/O error.
    IoError,
    /// Stored bytes failed to decode.
    Corrupted,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "stored value corrupted"),
        }
    }
}

impl std::error::Error for StorageError {}
