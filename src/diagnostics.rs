//! Startup device checks and the process panic hook.
//!
//! Every configured device is probed once while the supervisor is
//! `Initializing`.  Each result is reported individually, then an overall
//! Pass/Fail; any failure keeps the supervisor from reaching `Running`.

use core::fmt;

use log::{error, info};

use crate::app::ports::DevicePort;
use crate::error::SensorError;

/// Outcome of probing one installed device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub name: String,
    pub result: Result<String, SensorError>,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(detail) if detail.is_empty() => write!(f, "{}: Detected", self.name),
            Ok(detail) => write!(f, "{}: Detected ({})", self.name, detail),
            Err(e) => write!(f, "{}: Error ({})", self.name, e),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsReport {
    pub devices: Vec<DeviceStatus>,
}

impl DiagnosticsReport {
    pub fn passed(&self) -> bool {
        self.devices.iter().all(|d| d.result.is_ok())
    }

    /// Name of the first device that did not answer.
    pub fn first_failure(&self) -> Option<&str> {
        self.devices
            .iter()
            .find(|d| d.result.is_err())
            .map(|d| d.name.as_str())
    }
}

/// Probe each device in order.  Does not stop at the first failure so the
/// log shows the state of every device.
pub fn check_installed_devices(devices: &[String], port: &mut impl DevicePort) -> DiagnosticsReport {
    let mut report = DiagnosticsReport::default();
    for name in devices {
        let status = DeviceStatus {
            name: name.clone(),
            result: port.probe(name),
        };
        if status.result.is_ok() {
            info!("Diagnostics: {}", status);
        } else {
            error!("Diagnostics: {}", status);
        }
        report.devices.push(status);
    }
    info!(
        "Diagnostics: overall {}",
        if report.passed() { "Pass" } else { "Fail" }
    );
    report
}

// ───────────────────────────────────────────────────────────────
// Panic hook
// ───────────────────────────────────────────────────────────────

/// Route panics through the log facade so they land next to the rest of
/// the run's output.  The supervisor loop catches handler panics; this
/// covers the producer threads too.
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        match info.location() {
            Some(loc) => error!("PANIC at {}:{}: {}", loc.file(), loc.line(), reason),
            None => error!("PANIC: {}", reason),
        }
    }));
}
