//! Event system: the single serialization point of the appliance.
//!
//! Events are produced by:
//! - the tick thread (1 Hz scheduler clock)
//! - the button poller (debounced presses and holds)
//! - the SIGINT handler (graceful shutdown)
//!
//! Events are consumed by the supervisor loop, one at a time, each handler
//! running to completion before the next event is taken.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Tick thread │────▶│              │     │              │
//! │ Buttons     │────▶│  Event Queue │────▶│  Supervisor  │
//! │ SIGINT      │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, warn};

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 32;

/// Bounded MPSC queue shared by every producer thread.
pub type EventChannel = Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_CAP>;

/// The process-wide event queue.
pub static EVENTS: EventChannel = Channel::new();

/// Set once shutdown is requested.  Survives a full queue.
pub static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Scheduler clock tick.
    Tick,
    /// Debounced user input.
    Button(ButtonEvent),
    /// Stop the appliance (SIGINT or end of input).
    Shutdown,
}

// ── Buttons ───────────────────────────────────────────────────

/// The six bonnet buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ButtonId {
    Left = 0,
    Right = 1,
    Up = 2,
    Down = 3,
    A = 4,
    B = 5,
}

impl ButtonId {
    pub const ALL: [ButtonId; 6] = [
        ButtonId::Left,
        ButtonId::Right,
        ButtonId::Up,
        ButtonId::Down,
        ButtonId::A,
        ButtonId::B,
    ];

    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "L",
            Self::Right => "R",
            Self::Up => "U",
            Self::Down => "D",
            Self::A => "A",
            Self::B => "B",
        })
    }
}

/// Set of buttons that were active at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonMask(u8);

impl ButtonMask {
    pub const EMPTY: Self = Self(0);

    pub fn from_ids(ids: &[ButtonId]) -> Self {
        Self(ids.iter().fold(0, |acc, id| acc | id.mask()))
    }

    pub fn insert(&mut self, id: ButtonId) {
        self.0 |= id.mask();
    }

    pub fn contains(self, id: ButtonId) -> bool {
        self.0 & id.mask() != 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    /// Short activation, emitted on release.
    Pressed(ButtonId),
    /// Continuously active past the hold time.  `active` is every button
    /// held down at that instant, so combinations can be detected.
    Held { id: ButtonId, active: ButtonMask },
}

impl ButtonEvent {
    pub fn id(self) -> ButtonId {
        match self {
            Self::Pressed(id) | Self::Held { id, .. } => id,
        }
    }
}

impl Event {
    /// Keyboard stand-in for the bonnet on the simulated build.
    ///
    /// `l r u d a b` press a button, `U`/`D` hold Up/Down, `q` shuts down.
    pub fn from_key(key: char) -> Option<Event> {
        let press = |id| Some(Event::Button(ButtonEvent::Pressed(id)));
        let hold = |id| {
            Some(Event::Button(ButtonEvent::Held {
                id,
                active: ButtonMask::from_ids(&[id]),
            }))
        };
        match key {
            'l' => press(ButtonId::Left),
            'r' => press(ButtonId::Right),
            'u' => press(ButtonId::Up),
            'd' => press(ButtonId::Down),
            'a' => press(ButtonId::A),
            'b' => press(ButtonId::B),
            'U' => hold(ButtonId::Up),
            'D' => hold(ButtonId::Down),
            'q' => Some(Event::Shutdown),
            _ => None,
        }
    }
}

/// Non-blocking enqueue for producer threads.
///
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(channel: &EventChannel, event: Event) -> bool {
    match channel.try_send(event) {
        Ok(()) => true,
        Err(_) => {
            warn!("Event queue full, dropping {:?}", event);
            false
        }
    }
}

/// Ask the consumer to stop.  Never lost: the flag is latched first, and
/// the queued `Shutdown` only wakes a consumer that is waiting.
pub fn request_shutdown(channel: &EventChannel, flag: &AtomicBool) {
    flag.store(true, Ordering::SeqCst);
    if channel.try_send(Event::Shutdown).is_err() {
        debug!("Event queue full, shutdown latched");
    }
}

/// Next event for the consumer.  A latched shutdown request jumps the
/// queue.
pub async fn next_event(channel: &EventChannel, flag: &AtomicBool) -> Event {
    if flag.load(Ordering::SeqCst) {
        return Event::Shutdown;
    }
    channel.receive().await
}
