//! Fuzz target: persisted thresholds and statistics
//!
//! Plants arbitrary bytes under both state keys and loads them back,
//! verifying:
//! - No panics under arbitrary stored bytes
//! - Loaded thresholds are always valid (corrupt ones are rejected)
//! - Loaded statistics can be written back and reloaded
//!
//! cargo fuzz run fuzz_persisted_state

#![no_main]

use std::collections::HashMap;

use drybox::app::persist::{self, STATE_NAMESPACE, STATISTICS_KEY, THRESHOLDS_KEY};
use drybox::app::ports::{StorageError, StoragePort};
use drybox::config::SystemConfig;
use drybox::statistics::RunStatistics;
use drybox::thresholds::ThresholdStore;
use libfuzzer_sys::fuzz_target;

// ── In-memory StoragePort for fuzz testing ────────────────────

#[derive(Default)]
struct MemStore {
    data: HashMap<String, Vec<u8>>,
}

impl StoragePort for MemStore {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let v = self
            .data
            .get(&format!("{ns}::{key}"))
            .ok_or(StorageError::NotFound)?;
        if v.len() > buf.len() {
            return Err(StorageError::Full);
        }
        buf[..v.len()].copy_from_slice(v);
        Ok(v.len())
    }

    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.data.insert(format!("{ns}::{key}"), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&format!("{ns}::{key}"));
        Ok(())
    }

    fn exists(&self, ns: &str, key: &str) -> bool {
        self.data.contains_key(&format!("{ns}::{key}"))
    }
}

fuzz_target!(|data: &[u8]| {
    let mut store = MemStore::default();
    let _ = store.write(STATE_NAMESPACE, THRESHOLDS_KEY, data);
    let _ = store.write(STATE_NAMESPACE, STATISTICS_KEY, data);

    let defaults = SystemConfig::default().default_thresholds();
    if let Ok(thresholds) = ThresholdStore::load(&store, defaults) {
        assert!(thresholds.get().is_valid());
    }

    if let Ok(stats) = RunStatistics::load(&store) {
        let mut fresh = MemStore::default();
        if persist::store_json(&mut fresh, STATISTICS_KEY, &stats.record()).is_ok() {
            assert!(RunStatistics::load(&fresh).is_ok());
        }
    }
});
