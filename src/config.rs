//! System configuration parameters
//!
//! All tunable parameters for the dry box.  Loaded once at startup from a
//! JSON file; every field has a default so a partial (or missing) file is
//! valid.  Runtime-editable values (humidity thresholds, fan runtime limit)
//! only seed the persisted [`Thresholds`](crate::thresholds::Thresholds)
//! on first boot.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::display::TemperatureUnit;
use crate::thresholds::Thresholds;

/// BCM pin numbers of the six bonnet buttons (active-low, pulled up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonPins {
    pub left: u32,
    pub right: u32,
    pub up: u32,
    pub down: u32,
    pub a: u32,
    pub b: u32,
}

impl Default for ButtonPins {
    fn default() -> Self {
        Self {
            left: 27,
            right: 23,
            up: 17,
            down: 22,
            a: 5,
            b: 6,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Timing ---
    /// Scheduler tick period (milliseconds)
    pub tick_interval_ms: u64,
    /// Internal zone sample + fan control interval (seconds)
    pub internal_sample_secs: u32,
    /// Ambient zone sample interval (seconds, 0 = disabled)
    pub ambient_sample_secs: u32,
    /// Page re-render interval (seconds)
    pub page_refresh_secs: u32,
    /// Inactivity check interval (seconds)
    pub display_reset_secs: u32,
    /// Sensor heater pulse interval (seconds, 0 = disabled)
    pub sensor_heat_secs: u32,
    /// Idle time before the UI falls back to the default page (seconds)
    pub inactivity_timeout_secs: u32,
    /// Spinner redraw period (milliseconds)
    pub animation_period_ms: u64,

    // --- Buttons ---
    pub debounce_ms: u64,
    pub hold_ms: u64,
    pub button_poll_ms: u64,
    pub buttons_active_low: bool,
    pub button_pins: ButtonPins,

    // --- Humidity control ---
    /// First-boot lower threshold (%RH)
    pub default_min_humidity: f32,
    /// First-boot upper threshold (%RH)
    pub default_max_humidity: f32,
    /// Amount one Up/Down press moves a threshold in Edit mode (%RH)
    pub humidity_step: f32,
    /// First-boot maximum single fan run (seconds)
    pub fan_runtime_limit_secs: u64,
    /// Upper bound for the runtime limit when CLEAR doubles it (seconds)
    pub fan_runtime_limit_ceiling_secs: u64,
    /// Fan speed commanded on engage (0-100%)
    pub fan_engage_speed: u8,
    /// Minimum humidity change before a reading is written to the event log
    pub humidity_log_delta: f32,

    // --- Display ---
    pub temperature_unit: TemperatureUnit,

    // --- Devices ---
    /// Devices that must answer their probe at startup.
    pub installed_devices: Vec<String>,
    pub ambient_sensor_enabled: bool,
    pub gpio_chip: String,
    pub internal_i2c_bus: String,
    pub ambient_i2c_bus: String,
    pub fan_i2c_bus: String,

    // --- Files ---
    /// Directory holding persisted thresholds and statistics.
    pub state_dir: PathBuf,
    /// CSV event log.
    pub log_file: PathBuf,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            tick_interval_ms: 1000, // 1 Hz
            internal_sample_secs: 1,
            ambient_sample_secs: 60,
            page_refresh_secs: 5,
            display_reset_secs: 1,
            sensor_heat_secs: 90,
            inactivity_timeout_secs: 8,
            animation_period_ms: 200,

            // Buttons
            debounce_ms: 200,
            hold_ms: 3000,
            button_poll_ms: 10,
            buttons_active_low: true,
            button_pins: ButtonPins::default(),

            // Humidity control
            default_min_humidity: 40.0,
            default_max_humidity: 60.0,
            humidity_step: 1.0,
            fan_runtime_limit_secs: 2 * 3600,
            fan_runtime_limit_ceiling_secs: 24 * 3600,
            fan_engage_speed: 100,
            humidity_log_delta: 0.2,

            // Display
            temperature_unit: TemperatureUnit::Celsius,

            // Devices
            installed_devices: vec![
                "SHT41_Internal".into(),
                "SHT41_Ambient".into(),
                "EMC2101".into(),
            ],
            ambient_sensor_enabled: true,
            gpio_chip: "/dev/gpiochip0".into(),
            internal_i2c_bus: "/dev/i2c-1".into(),
            ambient_i2c_bus: "/dev/i2c-3".into(),
            fan_i2c_bus: "/dev/i2c-1".into(),

            // Files
            state_dir: PathBuf::from("state"),
            log_file: PathBuf::from("drybox_log.csv"),
        }
    }
}

impl SystemConfig {
    /// Load the configuration file at `path`.
    ///
    /// A missing file is not an error: the defaults are used and a warning is
    /// logged.  A file that exists but cannot be parsed is `Corrupted`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config: {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                warn!("Config: cannot read {}: {}", path.display(), e);
                return Err(ConfigError::IoError);
            }
        };
        let config = Self::from_json_slice(&bytes)?;
        info!("Config: loaded {}", path.display());
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=10_000).contains(&self.tick_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "tick_interval_ms must be 100–10000",
            ));
        }
        if self.internal_sample_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "internal_sample_secs must be > 0",
            ));
        }
        if self.page_refresh_secs == 0 || self.display_reset_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "page_refresh_secs and display_reset_secs must be > 0",
            ));
        }
        if self.inactivity_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "inactivity_timeout_secs must be > 0",
            ));
        }
        if !(10..=1000).contains(&self.debounce_ms) {
            return Err(ConfigError::ValidationFailed("debounce_ms must be 10–1000"));
        }
        if self.hold_ms <= self.debounce_ms {
            return Err(ConfigError::ValidationFailed(
                "hold_ms must be longer than debounce_ms",
            ));
        }
        if self.button_poll_ms == 0 || self.button_poll_ms >= self.debounce_ms {
            return Err(ConfigError::ValidationFailed(
                "button_poll_ms must be > 0 and shorter than debounce_ms",
            ));
        }
        if !(0.0..100.0).contains(&self.default_min_humidity)
            || !(0.0..=100.0).contains(&self.default_max_humidity)
            || self.default_min_humidity >= self.default_max_humidity
        {
            return Err(ConfigError::ValidationFailed(
                "default humidity thresholds must satisfy 0 <= min < max <= 100",
            ));
        }
        if !(0.1..=10.0).contains(&self.humidity_step) {
            return Err(ConfigError::ValidationFailed("humidity_step must be 0.1–10.0"));
        }
        if self.fan_runtime_limit_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "fan_runtime_limit_secs must be > 0",
            ));
        }
        if self.fan_runtime_limit_ceiling_secs < self.fan_runtime_limit_secs {
            return Err(ConfigError::ValidationFailed(
                "fan_runtime_limit_ceiling_secs must be >= fan_runtime_limit_secs",
            ));
        }
        if !(1..=100).contains(&self.fan_engage_speed) {
            return Err(ConfigError::ValidationFailed(
                "fan_engage_speed must be 1–100",
            ));
        }
        if self.humidity_log_delta < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "humidity_log_delta must be >= 0",
            ));
        }
        if !(20..=2000).contains(&self.animation_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "animation_period_ms must be 20–2000",
            ));
        }
        Ok(())
    }

    /// Thresholds used when nothing has been persisted yet.
    pub fn default_thresholds(&self) -> Thresholds {
        Thresholds {
            min_humidity: self.default_min_humidity,
            max_humidity: self.default_max_humidity,
            fan_runtime_limit_secs: self.fan_runtime_limit_secs,
        }
    }
}
