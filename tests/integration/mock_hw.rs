//! Mock adapters for integration tests.
//!
//! Records every port call so tests can assert on the full history without
//! touching real I2C devices or the filesystem.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use drybox::app::persist::STATE_NAMESPACE;
use drybox::app::ports::{
    DevicePort, DisplayPort, FanPort, LogPort, LogRecord, SensorPort, Severity, StorageError,
    StoragePort,
};
use drybox::app::supervisor::Supervisor;
use drybox::config::SystemConfig;
use drybox::error::{ActuatorError, SensorError};
use drybox::events::Event;
use drybox::sensors::{Reading, Zone};
use drybox::snapshot::StatusSnapshot;
use drybox::ui::Page;

// ── Hardware call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    SetFan(u8),
    Render(Page),
    Border(String),
    Clear,
    Heat(Zone),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<HwCall>,
    /// Internal humidity per read, front first.  The last value repeats
    /// once the queue is empty.
    pub internal: VecDeque<f32>,
    last_internal: f32,
    pub ambient: Reading,
    pub sensor_offline: bool,
    pub missing_device: Option<&'static str>,
    pub last_snapshot: Option<StatusSnapshot>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            internal: VecDeque::new(),
            last_internal: 50.0,
            ambient: Reading {
                temperature_c: 20.0,
                humidity: 45.0,
            },
            sensor_offline: false,
            missing_device: None,
            last_snapshot: None,
        }
    }

    pub fn with_humidity(samples: &[f32]) -> Self {
        Self {
            internal: samples.iter().copied().collect(),
            ..Self::new()
        }
    }

    /// Speeds commanded, in order.
    pub fn fan_commands(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::SetFan(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn fan_running(&self) -> bool {
        self.fan_commands().last().is_some_and(|s| *s > 0)
    }

    pub fn borders(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::Border(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_rendered_page(&self) -> Option<Page> {
        self.calls.iter().rev().find_map(|c| match c {
            HwCall::Render(page) => Some(*page),
            _ => None,
        })
    }

    pub fn render_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HwCall::Render(_)))
            .count()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_reading(&mut self, zone: Zone) -> Result<Reading, SensorError> {
        if self.sensor_offline {
            return Err(SensorError::BusFault);
        }
        match zone {
            Zone::Internal => {
                if let Some(h) = self.internal.pop_front() {
                    self.last_internal = h;
                }
                Ok(Reading {
                    temperature_c: 24.0,
                    humidity: self.last_internal,
                })
            }
            Zone::Ambient => Ok(self.ambient),
        }
    }

    fn heat(&mut self, zone: Zone) -> Result<(), SensorError> {
        self.calls.push(HwCall::Heat(zone));
        Ok(())
    }
}

impl FanPort for MockHardware {
    fn set_fan_speed(&mut self, percent: u8) -> Result<(), ActuatorError> {
        self.calls.push(HwCall::SetFan(percent));
        Ok(())
    }
}

impl DisplayPort for MockHardware {
    fn render(&mut self, snapshot: &StatusSnapshot) {
        self.calls.push(HwCall::Render(snapshot.page));
        self.last_snapshot = Some(*snapshot);
    }

    fn render_border_message(&mut self, text: &str) {
        self.calls.push(HwCall::Border(text.to_string()));
    }

    fn clear(&mut self) {
        self.calls.push(HwCall::Clear);
    }
}

impl DevicePort for MockHardware {
    fn probe(&mut self, device: &str) -> Result<String, SensorError> {
        if self.missing_device == Some(device) {
            Err(SensorError::NotDetected)
        } else {
            Ok(String::new())
        }
    }
}

// ── MemStore ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MemStore {
    store: HashMap<String, Vec<u8>>,
    pub fail_writes: bool,
    pub writes: usize,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value under the appliance namespace.
    pub fn seed(&mut self, key: &str, bytes: &[u8]) {
        self.store
            .insert(format!("{}::{}", STATE_NAMESPACE, key), bytes.to_vec());
    }

    /// Stored value under the appliance namespace, parsed as JSON.
    pub fn json(&self, key: &str) -> Option<serde_json::Value> {
        self.store
            .get(&format!("{}::{}", STATE_NAMESPACE, key))
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
    }
}

impl StoragePort for MemStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let v = self
            .store
            .get(&format!("{}::{}", namespace, key))
            .ok_or(StorageError::NotFound)?;
        if v.len() > buf.len() {
            return Err(StorageError::Full);
        }
        buf[..v.len()].copy_from_slice(v);
        Ok(v.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.writes += 1;
        self.store
            .insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }
}

// ── RecordingLog ──────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingLog {
    pub records: Vec<LogRecord>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.records.iter().any(|r| r.message.contains(needle))
    }

    pub fn count(&self, needle: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.message.contains(needle))
            .count()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<&LogRecord> {
        self.records
            .iter()
            .filter(|r| r.severity == severity)
            .collect()
    }
}

impl LogPort for RecordingLog {
    fn append(&mut self, record: &LogRecord) {
        self.records.push(record.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

pub type TestSupervisor = Supervisor<MockHardware, MemStore, RecordingLog>;

pub const TICK_MS: u64 = 1000;

/// Default configuration with the sensor heater job disabled, so a running
/// supervisor has four jobs.
pub fn test_config() -> SystemConfig {
    SystemConfig {
        sensor_heat_secs: 0,
        ..SystemConfig::default()
    }
}

/// Supervisor started at t = 0 against an empty store.
pub fn started(config: SystemConfig, hw: MockHardware) -> TestSupervisor {
    started_with_store(config, hw, MemStore::new())
}

pub fn started_with_store(
    config: SystemConfig,
    hw: MockHardware,
    store: MemStore,
) -> TestSupervisor {
    let mut sup = Supervisor::new(config, hw, store, RecordingLog::new());
    sup.start(0).expect("startup with every device present");
    sup
}

/// Deliver ticks `from..=to`; tick `k` happens at `k * TICK_MS`.
pub fn run_ticks(sup: &mut TestSupervisor, from: u64, to: u64) {
    for k in from..=to {
        let _ = sup.handle(Event::Tick, k * TICK_MS);
    }
}
