//! Application core: domain orchestration behind port traits.
//!
//! The [`supervisor`] owns every piece of mutable appliance state and is
//! the only consumer of the event queue.  All interaction with hardware,
//! disk and the event log happens through the traits in [`ports`].

pub mod persist;
pub mod ports;
pub mod supervisor;
