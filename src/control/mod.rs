//! Fan control: the engagement state machine and the hysteresis rule
//! that drives it.

pub mod fan;
pub mod hysteresis;
