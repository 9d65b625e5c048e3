//! Page state machine driven by debounced button events.
//!
//! | Page               | Left / Right       | Up / Down               | A          | B                 |
//! |--------------------|--------------------|-------------------------|------------|-------------------|
//! | rotation pages     | previous / next    | –                       | –          | –                 |
//! | Thresholds, select | previous / next    | toggle Max/Min          | enter Edit | –                 |
//! | Thresholds, edit   | –                  | ± one step on selection | –          | commit, to select |
//! | Limit exceeded     | toggle OK/CLEAR    | –                       | activate   | –                 |
//!
//! Holding Up or Down on the threshold page jumps straight into editing
//! Max or Min; holding both is ignored.  The controller never formats text
//! and never touches storage: it reports what happened and the supervisor
//! renders and persists.

use log::{debug, info};

use super::{EditMode, LimitChoice, Page};
use crate::events::{ButtonEvent, ButtonId};
use crate::thresholds::{Selected, ThresholdStore};

/// What a UI step asks of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiOutcome {
    /// Nothing visible changed.
    Unchanged,
    /// Re-render the current page.
    Redraw,
    /// Thresholds left Edit mode: persist them, then re-render.
    Commit,
    /// The trip acknowledgement was activated.
    Acknowledged(LimitChoice),
}

pub struct PageController {
    page: Page,
    last_activity_ms: u64,
    inactivity_timeout_ms: u64,
    humidity_step: f32,
}

impl PageController {
    pub fn new(now_ms: u64, inactivity_timeout_ms: u64, humidity_step: f32) -> Self {
        Self {
            page: Page::Default,
            last_activity_ms: now_ms,
            inactivity_timeout_ms,
            humidity_step,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms
    }

    pub fn handle(
        &mut self,
        event: ButtonEvent,
        now_ms: u64,
        thresholds: &mut ThresholdStore,
    ) -> UiOutcome {
        self.last_activity_ms = now_ms;
        match event {
            ButtonEvent::Pressed(id) => self.on_press(id, thresholds),
            ButtonEvent::Held { id, active } => {
                if active.count() > 1 {
                    info!("UI: {} buttons held together, ignored", active.count());
                    return UiOutcome::Unchanged;
                }
                self.on_hold(id)
            }
        }
    }

    fn on_press(&mut self, id: ButtonId, thresholds: &mut ThresholdStore) -> UiOutcome {
        match (self.page, id) {
            (Page::LimitExceeded { choice }, ButtonId::Left | ButtonId::Right) => {
                self.page = Page::LimitExceeded {
                    choice: choice.toggled(),
                };
                UiOutcome::Redraw
            }
            (Page::LimitExceeded { choice }, ButtonId::A) => UiOutcome::Acknowledged(choice),
            (Page::LimitExceeded { .. }, _) => UiOutcome::Unchanged,

            (
                Page::ThresholdEdit {
                    mode: EditMode::Edit,
                    selected,
                },
                ButtonId::Up | ButtonId::Down,
            ) => {
                let delta = if id == ButtonId::Up {
                    self.humidity_step
                } else {
                    -self.humidity_step
                };
                if thresholds.adjust(selected, delta) {
                    UiOutcome::Redraw
                } else {
                    debug!("UI: {:?} threshold at its bound", selected);
                    UiOutcome::Unchanged
                }
            }
            (
                Page::ThresholdEdit {
                    mode: EditMode::Edit,
                    selected,
                },
                ButtonId::B,
            ) => {
                self.page = Page::ThresholdEdit {
                    mode: EditMode::Selection,
                    selected,
                };
                UiOutcome::Commit
            }
            (
                Page::ThresholdEdit {
                    mode: EditMode::Edit,
                    ..
                },
                _,
            ) => UiOutcome::Unchanged,

            (
                Page::ThresholdEdit {
                    mode: EditMode::Selection,
                    selected,
                },
                ButtonId::Up | ButtonId::Down,
            ) => {
                self.page = Page::ThresholdEdit {
                    mode: EditMode::Selection,
                    selected: selected.toggled(),
                };
                UiOutcome::Redraw
            }
            (
                Page::ThresholdEdit {
                    mode: EditMode::Selection,
                    selected,
                },
                ButtonId::A,
            ) => {
                self.page = Page::ThresholdEdit {
                    mode: EditMode::Edit,
                    selected,
                };
                UiOutcome::Redraw
            }

            (page, ButtonId::Right) => self.go_to(page.next()),
            (page, ButtonId::Left) => self.go_to(page.previous()),
            _ => UiOutcome::Unchanged,
        }
    }

    fn on_hold(&mut self, id: ButtonId) -> UiOutcome {
        let selected = match id {
            ButtonId::Up => Selected::Max,
            ButtonId::Down => Selected::Min,
            _ => return UiOutcome::Unchanged,
        };
        match self.page {
            Page::ThresholdEdit { .. } => {
                self.page = Page::ThresholdEdit {
                    mode: EditMode::Edit,
                    selected,
                };
                info!("UI: editing {:?} threshold", selected);
                UiOutcome::Redraw
            }
            _ => UiOutcome::Unchanged,
        }
    }

    fn go_to(&mut self, page: Page) -> UiOutcome {
        if page == self.page {
            return UiOutcome::Unchanged;
        }
        debug!("UI: {} -> {}", self.page.title(), page.title());
        self.page = page;
        UiOutcome::Redraw
    }

    /// Inactivity monitor.  Falls back to Default once the idle time is
    /// strictly past the timeout, except from Default itself and from LimitExceeded.  Leaving
    /// Edit this way asks for a commit.
    pub fn check_inactivity(&mut self, now_ms: u64) -> UiOutcome {
        if matches!(self.page, Page::Default | Page::LimitExceeded { .. }) {
            return UiOutcome::Unchanged;
        }
        if now_ms.saturating_sub(self.last_activity_ms) <= self.inactivity_timeout_ms {
            return UiOutcome::Unchanged;
        }
        let was_editing = matches!(
            self.page,
            Page::ThresholdEdit {
                mode: EditMode::Edit,
                ..
            }
        );
        info!("UI: inactive, back to default page");
        self.page = Page::Default;
        if was_editing {
            UiOutcome::Commit
        } else {
            UiOutcome::Redraw
        }
    }

    /// Safety trip: force the acknowledgement page.
    pub fn enter_limit_exceeded(&mut self, now_ms: u64) {
        self.page = Page::LimitExceeded {
            choice: LimitChoice::Ok,
        };
        self.last_activity_ms = now_ms;
    }

    /// Trip cleared: back to the default page.
    pub fn reset_to_default(&mut self, now_ms: u64) {
        self.page = Page::Default;
        self.last_activity_ms = now_ms;
    }
}
