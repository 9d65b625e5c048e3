//! Page text.
//!
//! Pure formatting from a [`StatusSnapshot`] to at most four short lines,
//! the shape of the 128x64 panel.  Temperatures are stored in °C and only
//! converted here.

use core::fmt::Write;

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::sensors::{Reading, Zone};
use crate::snapshot::StatusSnapshot;
use crate::statistics::ZoneExtrema;
use crate::thresholds::Selected;
use crate::ui::{EditMode, LimitChoice, Page};

pub const MAX_LINES: usize = 4;
pub const LINE_LEN: usize = 32;

pub type Line = String<LINE_LEN>;
pub type PageLines = Vec<Line, MAX_LINES>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn convert(self, celsius: f32) -> f32 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

/// `H:MM:SS`, hours unbounded.
pub fn format_duration(ms: u64) -> String<16> {
    let secs = ms / 1000;
    let mut s = String::new();
    let _ = write!(s, "{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60);
    s
}

/// Lines for `snapshot.page`.  Text that overflows a line is truncated.
pub fn page_lines(snapshot: &StatusSnapshot, unit: TemperatureUnit) -> PageLines {
    let mut lines = PageLines::new();
    macro_rules! push {
        ($($arg:tt)*) => {
            push_line(&mut lines, format_args!($($arg)*))
        };
    }

    match snapshot.page {
        Page::Default => {
            for zone in Zone::ALL {
                push!("{}:", zone);
                match snapshot.reading(zone) {
                    Some(r) => push!("{}", ReadingText(r, unit)),
                    None => push!("reading..."),
                }
            }
        }
        Page::FanStats => {
            let t = snapshot.totals;
            push!("Fan cycles: {}", t.cycle_count);
            push!("Total: {}", format_duration(t.total_duration_ms));
            push!("Longest: {}", format_duration(t.max_runtime_ms));
            push!(
                "Limit: {}",
                format_duration(snapshot.thresholds.fan_runtime_limit_ms())
            );
        }
        Page::Internal | Page::Ambient => {
            let zone = if snapshot.page == Page::Internal {
                Zone::Internal
            } else {
                Zone::Ambient
            };
            let e = snapshot.extrema(zone);
            push!("{}", zone);
            push!(
                "Max T:{} H:{}",
                Opt(e.high_temp.map(|c| unit.convert(c))),
                Opt(e.high_humidity)
            );
            push!(
                "Min T:{} H:{}",
                Opt(e.low_temp.map(|c| unit.convert(c))),
                Opt(e.low_humidity)
            );
            if let Some(r) = snapshot.reading(zone) {
                push!("Now {}", ReadingText(r, unit));
            }
        }
        Page::ThresholdEdit { mode, selected } => {
            let th = snapshot.thresholds;
            push!("Humidity limits");
            push!(
                "{} Max: {:.1}%",
                marker(mode, selected == Selected::Max),
                th.max_humidity
            );
            push!(
                "{} Min: {:.1}%",
                marker(mode, selected == Selected::Min),
                th.min_humidity
            );
            push!("Run limit {}", format_duration(th.fan_runtime_limit_ms()));
        }
        Page::LimitExceeded { choice } => {
            push!("FAN LIMIT EXCEEDED");
            push!(
                "Run limit {}",
                format_duration(snapshot.thresholds.fan_runtime_limit_ms())
            );
            match choice {
                LimitChoice::Ok => push!("[OK]   CLEAR "),
                LimitChoice::Clear => push!(" OK   [CLEAR]"),
            }
        }
    }
    lines
}

fn push_line(lines: &mut PageLines, args: core::fmt::Arguments<'_>) {
    let mut line = Line::new();
    // A full line just stops growing.
    let _ = line.write_fmt(args);
    let _ = lines.push(line);
}

fn marker(mode: EditMode, is_selected: bool) -> &'static str {
    match (is_selected, mode) {
        (false, _) => " ",
        (true, EditMode::Selection) => ">",
        (true, EditMode::Edit) => "*",
    }
}

/// `55.0% - 21.3°C`
struct ReadingText(Reading, TemperatureUnit);

impl core::fmt::Display for ReadingText {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let Self(r, unit) = *self;
        write!(
            f,
            "{:.1}% - {:.1}{}",
            r.humidity,
            unit.convert(r.temperature_c),
            unit.symbol()
        )
    }
}

/// One decimal, or `--` when nothing was recorded yet.
struct Opt(Option<f32>);

impl core::fmt::Display for Opt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.1}", v),
            None => f.write_str("--"),
        }
    }
}

/// One-line extrema summary for the shutdown log.
pub fn extrema_summary(zone: Zone, e: &ZoneExtrema) -> String<64> {
    let mut s = String::new();
    let _ = write!(
        s,
        "{} T {}..{} H {}..{}",
        zone,
        Opt(e.low_temp),
        Opt(e.high_temp),
        Opt(e.low_humidity),
        Opt(e.high_humidity)
    );
    s
}
