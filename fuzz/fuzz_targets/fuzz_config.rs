//! Fuzz target: configuration file parsing
//!
//! Feeds arbitrary bytes to `SystemConfig::from_json_slice` and verifies:
//! - No panics under arbitrary input
//! - Anything accepted also passes `validate`
//! - Accepted configs yield ordered default thresholds
//!
//! cargo fuzz run fuzz_config

#![no_main]

use drybox::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = SystemConfig::from_json_slice(data) {
        assert!(config.validate().is_ok());
        assert!(config.default_thresholds().is_valid());
        assert!(config.fan_runtime_limit_ceiling_secs >= config.fan_runtime_limit_secs);
    }
});
