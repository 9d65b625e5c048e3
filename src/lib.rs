//! Dry box supervisor library.
//!
//! Exposes the pure-logic modules for integration testing.  Hardware
//! access is confined to `adapters` and `drivers`; the Raspberry Pi
//! wiring is behind the `rpi` feature.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod scheduler;

pub mod adapters;
pub mod animation;
pub mod control;
pub mod display;
pub mod drivers;
pub mod sensors;
pub mod snapshot;
pub mod statistics;
pub mod thresholds;
pub mod ui;
