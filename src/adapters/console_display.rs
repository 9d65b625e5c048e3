//! Console stand-in for the 128x64 panel.
//!
//! Pages are logged as one `info!` line per text row.  The real panel
//! driver would replace the body of [`DisplayPort::render`]; the text
//! itself comes from [`crate::display::page_lines`] either way.

use log::{debug, info};

use crate::animation::SpinnerFrame;
use crate::app::ports::{AnimationPort, DisplayPort};
use crate::display::{TemperatureUnit, format_duration, page_lines};
use crate::snapshot::StatusSnapshot;

#[derive(Debug, Clone, Copy)]
pub struct ConsoleDisplay {
    unit: TemperatureUnit,
}

impl ConsoleDisplay {
    pub fn new(unit: TemperatureUnit) -> Self {
        Self { unit }
    }
}

impl DisplayPort for ConsoleDisplay {
    fn render(&mut self, snapshot: &StatusSnapshot) {
        info!("┌─ {} ─", snapshot.page.title());
        for line in page_lines(snapshot, self.unit) {
            info!("│ {}", line);
        }
        info!("└─");
    }

    fn render_border_message(&mut self, text: &str) {
        info!("╔═ {} ═╗", text);
    }

    fn clear(&mut self) {
        info!("(display cleared)");
    }
}

impl AnimationPort for ConsoleDisplay {
    fn draw_spinner(&mut self, frame: &SpinnerFrame) {
        match frame.fan_elapsed_ms {
            Some(ms) => debug!("{} fan {}", frame.glyph, format_duration(ms)),
            None => debug!("{}", frame.glyph),
        }
    }
}
