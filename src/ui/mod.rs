//! Paged status/configuration UI.
//!
//! Pages carry their own submode, so an edit selection can only exist while
//! the threshold page is showing and the trip acknowledgement can only
//! exist on the limit page.

pub mod controller;

pub use controller::{PageController, UiOutcome};

use crate::thresholds::Selected;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// Up/Down move the selection between Max and Min.
    Selection,
    /// Up/Down change the selected threshold.
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitChoice {
    /// Acknowledge and shut down.
    Ok,
    /// Double the runtime limit and resume.
    Clear,
}

impl LimitChoice {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ok => Self::Clear,
            Self::Clear => Self::Ok,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Default,
    FanStats,
    Internal,
    Ambient,
    ThresholdEdit { mode: EditMode, selected: Selected },
    LimitExceeded { choice: LimitChoice },
}

impl Page {
    /// Threshold page as first entered.
    pub const THRESHOLD_ENTRY: Page = Page::ThresholdEdit {
        mode: EditMode::Selection,
        selected: Selected::Max,
    };

    /// Position in the Left/Right rotation.  `None` for LimitExceeded.
    fn rotation_index(self) -> Option<usize> {
        match self {
            Self::Default => Some(0),
            Self::FanStats => Some(1),
            Self::Internal => Some(2),
            Self::Ambient => Some(3),
            Self::ThresholdEdit { .. } => Some(4),
            Self::LimitExceeded { .. } => None,
        }
    }

    fn from_rotation_index(index: usize) -> Self {
        match index % ROTATION_LEN {
            0 => Self::Default,
            1 => Self::FanStats,
            2 => Self::Internal,
            3 => Self::Ambient,
            _ => Self::THRESHOLD_ENTRY,
        }
    }

    /// Next page to the right, wrapping.
    pub fn next(self) -> Self {
        self.rotation_index()
            .map_or(self, |i| Self::from_rotation_index(i + 1))
    }

    /// Next page to the left, wrapping.
    pub fn previous(self) -> Self {
        self.rotation_index()
            .map_or(self, |i| Self::from_rotation_index(i + ROTATION_LEN - 1))
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Default => "Status",
            Self::FanStats => "Fan",
            Self::Internal => "Internal",
            Self::Ambient => "Ambient",
            Self::ThresholdEdit { .. } => "Thresholds",
            Self::LimitExceeded { .. } => "Limit exceeded",
        }
    }
}

const ROTATION_LEN: usize = 5;
