//! Humidity dead-band.
//!
//! Above `max` the fan should run, below `min` it should stop, and in
//! between nothing changes.  The decision is stateless; the fan
//! supervisor turns repeated `Engage`/`Disengage` into no-ops.

use crate::thresholds::Thresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanDecision {
    Engage,
    Disengage,
    Hold,
}

pub fn decide(humidity: f32, thresholds: &Thresholds) -> FanDecision {
    if humidity > thresholds.max_humidity {
        FanDecision::Engage
    } else if humidity < thresholds.min_humidity {
        FanDecision::Disengage
    } else {
        FanDecision::Hold
    }
}
