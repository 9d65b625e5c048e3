//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter           | Implements                        | Connects to              |
//! |-------------------|-----------------------------------|--------------------------|
//! | `hardware`        | SensorPort, FanPort, DevicePort   | SHT4x + EMC2101 over I2C |
//! |                   | DisplayPort                       | panel (console stand-in) |
//! | `simulated`       | SensorPort, FanPort, DevicePort   | humidity model           |
//! |                   | DisplayPort                       | console                  |
//! | `console_display` | DisplayPort, AnimationPort        | `log` output             |
//! | `file_store`      | StoragePort                       | JSON files on disk       |
//! | `csv_log`         | LogPort                           | CSV event log            |
//! | `time`            | Clock                             | `std::time::Instant`     |

pub mod console_display;
pub mod csv_log;
pub mod file_store;
pub mod hardware;
pub mod simulated;
pub mod time;
