//! Error types for sensors, the fan actuator and startup.
//!
//! Sensor and actuator errors are `Copy` so the supervisor can log them and
//! carry on without allocation.  A [`StartupFault`] is the only error that
//! ends the process: it is returned before the supervisor reaches `Running`.
//!
//! Persistence and configuration errors live next to their ports in
//! [`crate::app::ports`].

use core::fmt;

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The I2C transaction failed (NACK, arbitration loss, bus unavailable).
    BusFault,
    /// The frame arrived but its CRC did not match.
    CrcMismatch,
    /// The device did not answer its identification request.
    NotDetected,
    /// The zone has no sensor fitted.
    NotFitted,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusFault => write!(f, "I2C bus fault"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::NotDetected => write!(f, "device not detected"),
            Self::NotFitted => write!(f, "no sensor fitted"),
        }
    }
}

impl std::error::Error for SensorError {}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Writing the fan controller register failed.
    BusFault,
    /// Requested speed is outside 0–100 %.
    OutOfRange(u8),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusFault => write!(f, "fan controller write failed"),
            Self::OutOfRange(speed) => write!(f, "fan speed {speed}% out of range"),
        }
    }
}

impl std::error::Error for ActuatorError {}

// ---------------------------------------------------------------------------
// Startup faults
// ---------------------------------------------------------------------------

/// Fatal conditions detected while the supervisor is `Initializing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupFault {
    /// An installed device did not respond to its probe.
    DeviceNotDetected(String),
    /// The configuration failed range validation.
    InvalidConfig(&'static str),
}

impl fmt::Display for StartupFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotDetected(name) => write!(f, "device not detected: {name}"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for StartupFault {}
