//! Input and actuator drivers built on the embedded-hal traits.

pub mod button;
pub mod emc2101;
