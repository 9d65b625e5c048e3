//! Default-page spinner.
//!
//! Runs on its own thread at `animation_period_ms`.  It never touches
//! supervisor state: each step works from the latest published
//! [`StatusSnapshot`] and computes the live fan run time from
//! `engaged_since` itself.

use crate::app::ports::AnimationPort;
use crate::snapshot::StatusSnapshot;
use crate::ui::Page;

const FRAMES: [char; 4] = ['|', '/', '-', '\\'];

/// What the display draws in the spinner corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinnerFrame {
    pub glyph: char,
    /// Length of the current fan run, when the fan is running.
    pub fan_elapsed_ms: Option<u64>,
}

#[derive(Debug, Default)]
pub struct Spinner {
    frame: usize,
}

impl Spinner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one frame.  `None` off the default page or once the
    /// supervisor has left `Running`; the frame index holds still then.
    pub fn step(&mut self, snapshot: &StatusSnapshot, now_ms: u64) -> Option<SpinnerFrame> {
        if snapshot.page != Page::Default || !snapshot.lifecycle.is_running() {
            return None;
        }
        let glyph = FRAMES[self.frame];
        self.frame = (self.frame + 1) % FRAMES.len();
        Some(SpinnerFrame {
            glyph,
            fan_elapsed_ms: snapshot.fan_elapsed_ms(now_ms),
        })
    }

    /// Step and draw in one go.  Returns `true` if something was drawn.
    pub fn draw(
        &mut self,
        snapshot: &StatusSnapshot,
        now_ms: u64,
        port: &mut impl AnimationPort,
    ) -> bool {
        match self.step(snapshot, now_ms) {
            Some(frame) => {
                port.draw_spinner(&frame);
                true
            }
            None => false,
        }
    }
}
