//! Durable CSV event log.
//!
//! Appends one row per [`LogRecord`] with columns
//! `Timestamp,Level,Name,ID,Message`; the header is written only when the
//! file is new or empty.  Each row is flushed straight away and mirrored
//! to the `log` facade at the matching level.

use std::fs::{File, OpenOptions};
use std::path::Path;

use chrono::Local;
use log::{debug, error, info, warn};

use crate::app::ports::{LogPort, LogRecord, Severity};

const HEADER: [&str; 5] = ["Timestamp", "Level", "Name", "ID", "Message"];

pub struct CsvEventLog {
    writer: csv::Writer<File>,
    write_failed: bool,
}

impl CsvEventLog {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_new = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }
        info!("Event log: {}", path.display());
        Ok(Self {
            writer,
            write_failed: false,
        })
    }

    fn write_row(&mut self, record: &LogRecord) -> Result<(), csv::Error> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let level = record.severity.to_string();
        self.writer.write_record([
            timestamp.as_str(),
            level.as_str(),
            record.subsystem,
            record.id,
            record.message.as_str(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}

impl LogPort for CsvEventLog {
    fn append(&mut self, record: &LogRecord) {
        match record.severity {
            Severity::Debug => debug!("[{}] {}", record.subsystem, record.message),
            Severity::Info => info!("[{}] {}", record.subsystem, record.message),
            Severity::Warning => warn!("[{}] {}", record.subsystem, record.message),
            Severity::Error | Severity::Critical => {
                error!("[{}] {}", record.subsystem, record.message);
            }
        }
        match self.write_row(record) {
            Ok(()) => self.write_failed = false,
            Err(e) => {
                // Report once per outage.
                if !self.write_failed {
                    warn!("Event log write failed: {}", e);
                }
                self.write_failed = true;
            }
        }
    }
}
