//! Polled, debounced button source with press and hold detection.
//!
//! ## Hardware
//!
//! Momentary switches on GPIO inputs, active-low with pull-ups on the
//! bonnet (configurable).  Any [`InputPin`] works; the poller thread calls
//! [`ButtonSource::poll`] every few milliseconds and forwards the returned
//! events without blocking.
//!
//! ## Gesture detection
//!
//! | Gesture | Condition                                         | Event           |
//! |---------|---------------------------------------------------|-----------------|
//! | Press   | Stable active then released before the hold time  | `Pressed(id)`   |
//! | Hold    | Stable active for >= hold time                     | `Held { id, .. }` |
//!
//! A raw level change only counts once it has been stable for the debounce
//! window.  A hold swallows the trailing press of the same activation, and
//! at most one press per button is emitted per debounce window.

use embedded_hal::digital::InputPin;
use heapless::Vec;
use log::warn;

use crate::events::{ButtonEvent, ButtonId, ButtonMask};

pub const MAX_BUTTONS: usize = 6;

/// Per-button gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Released,
    Pressed { since_ms: u64 },
    HeldReported,
}

struct Channel<P> {
    id: ButtonId,
    pin: P,
    /// Last raw level seen and when it last changed.
    raw: bool,
    raw_since_ms: u64,
    state: GestureState,
    last_press_ms: Option<u64>,
    read_error_logged: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ButtonTiming {
    pub debounce_ms: u64,
    pub hold_ms: u64,
    pub active_low: bool,
}

pub struct ButtonSource<P> {
    channels: Vec<Channel<P>, MAX_BUTTONS>,
    timing: ButtonTiming,
}

impl<P: InputPin> ButtonSource<P> {
    pub fn new(timing: ButtonTiming) -> Self {
        Self {
            channels: Vec::new(),
            timing,
        }
    }

    /// Attach a pin.  Returns the pin back if all slots are taken.
    pub fn add(&mut self, id: ButtonId, pin: P) -> Result<(), P> {
        self.channels
            .push(Channel {
                id,
                pin,
                raw: false,
                raw_since_ms: 0,
                state: GestureState::Released,
                last_press_ms: None,
                read_error_logged: false,
            })
            .map_err(|c| c.pin)
    }

    /// Sample every pin once and run the gesture machines.
    pub fn poll(&mut self, now_ms: u64) -> Vec<ButtonEvent, MAX_BUTTONS> {
        let mut events = Vec::new();
        let mut holds: Vec<ButtonId, MAX_BUTTONS> = Vec::new();
        let ButtonTiming {
            debounce_ms,
            hold_ms,
            active_low,
        } = self.timing;

        for ch in &mut self.channels {
            let active = match ch.pin.is_high() {
                Ok(high) => {
                    ch.read_error_logged = false;
                    high != active_low
                }
                Err(_) => {
                    if !ch.read_error_logged {
                        warn!("Button {}: pin read failed, treating as released", ch.id);
                        ch.read_error_logged = true;
                    }
                    false
                }
            };

            if active != ch.raw {
                ch.raw = active;
                ch.raw_since_ms = now_ms;
            }
            let stable = now_ms.saturating_sub(ch.raw_since_ms) >= debounce_ms;

            match ch.state {
                GestureState::Released => {
                    if ch.raw && stable {
                        ch.state = GestureState::Pressed {
                            since_ms: ch.raw_since_ms,
                        };
                    }
                }
                GestureState::Pressed { since_ms } => {
                    if !ch.raw && stable {
                        ch.state = GestureState::Released;
                        let spaced = ch
                            .last_press_ms
                            .is_none_or(|t| now_ms.saturating_sub(t) >= debounce_ms);
                        if spaced {
                            ch.last_press_ms = Some(now_ms);
                            let _ = events.push(ButtonEvent::Pressed(ch.id));
                        }
                    } else if ch.raw && now_ms.saturating_sub(since_ms) >= hold_ms {
                        ch.state = GestureState::HeldReported;
                        let _ = holds.push(ch.id);
                    }
                }
                GestureState::HeldReported => {
                    if !ch.raw && stable {
                        ch.state = GestureState::Released;
                    }
                }
            }
        }

        if !holds.is_empty() {
            let active = self.active_mask();
            for id in holds {
                let _ = events.push(ButtonEvent::Held { id, active });
            }
        }
        events
    }

    /// Buttons currently in a debounced active state.
    pub fn active_mask(&self) -> ButtonMask {
        let mut mask = ButtonMask::EMPTY;
        for ch in &self.channels {
            if !matches!(ch.state, GestureState::Released) {
                mask.insert(ch.id);
            }
        }
        mask
    }
}
