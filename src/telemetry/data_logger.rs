//! Delta-encoded session log.
//!
//! The first line is a header, the second a baseline row at time zero. After a
//! short settle interval every update is compared with the last written row and
//! only changes are appended. Quiescent labels (NOGESTURE, GRAB) are written
//! once when they begin, not on every frame they persist.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::LogError;
use crate::models::events::{LogEntry, LoggingEnvironment};

pub const DEFAULT_SETTLE_SECS: f64 = 1.0 / 6.0;

const BASE_HEADER: &str = "timestamp, xpos, ypos, flag";

pub struct DataLogger<W: Write> {
    writer: Option<W>,
    titles: Vec<String>,
    settle_secs: f64,
    last: LogEntry,
    rows_written: usize,
}

impl DataLogger<BufWriter<File>> {
    /// Creates `path`, writing the header and the baseline row.
    pub fn create(path: &Path, titles: &[String], settle_secs: f64) -> Result<Self, LogError> {
        let file = File::create(path)?;
        log::info!("create_logger: path={} titles={}", path.display(), titles.len());
        Self::from_writer(BufWriter::new(file), titles, settle_secs)
    }
}

impl<W: Write> DataLogger<W> {
    pub fn from_writer(mut writer: W, titles: &[String], settle_secs: f64) -> Result<Self, LogError> {
        writeln!(writer, "{}", header_line(titles))?;
        let baseline = LogEntry::baseline(titles.len());
        writeln!(writer, "{}", baseline.to_row())?;
        writer.flush()?;

        Ok(Self {
            writer: Some(writer),
            titles: titles.to_vec(),
            settle_secs: settle_secs.max(0.0),
            last: baseline,
            rows_written: 1,
        })
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Rows written so far, the baseline included.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn last_entry(&self) -> &LogEntry {
        &self.last
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Records one frame. Returns whether a row was written.
    ///
    /// `elapsed` is seconds since the logger was created. Missing custom values
    /// are written as empty columns.
    pub fn update(
        &mut self,
        elapsed: f64,
        cursor: (f64, f64),
        environment: LoggingEnvironment,
        custom_values: &[String],
    ) -> Result<bool, LogError> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(LogError::Closed);
        };
        if elapsed < self.settle_secs {
            return Ok(false);
        }
        if environment.is_quiescent() && self.last.environment == environment {
            return Ok(false);
        }

        let mut values = custom_values.to_vec();
        values.resize(self.titles.len().max(values.len()), String::new());
        let entry = LogEntry {
            elapsed,
            x: cursor.0,
            y: cursor.1,
            environment,
            custom_values: values,
        };
        if entry.same_state(&self.last) {
            return Ok(false);
        }

        writeln!(writer, "{}", entry.to_row())?;
        writer.flush()?;
        log::debug!("log_row: t={:.3} flag={}", entry.elapsed, entry.environment);
        self.last = entry;
        self.rows_written += 1;
        Ok(true)
    }

    /// Flushes and releases the stream. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<(), LogError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            log::info!("close_logger: rows={}", self.rows_written);
        }
        Ok(())
    }

    /// Releases the underlying writer, flushing it first.
    #[cfg(test)]
    pub fn into_inner(mut self) -> Result<Option<W>, LogError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(self.writer.take())
    }
}

pub fn header_line(titles: &[String]) -> String {
    let mut header = BASE_HEADER.to_string();
    for title in titles {
        header.push_str(", ");
        header.push_str(title);
    }
    header
}

/// Parses a log file back into its rows, baseline included.
pub fn read_log(path: &Path) -> Result<Vec<LogEntry>, LogError> {
    let reader = BufReader::new(File::open(path)?);
    parse_log(reader)
}

pub fn parse_log<R: BufRead>(reader: R) -> Result<Vec<LogEntry>, LogError> {
    let mut lines = reader.lines();
    let header = lines.next().transpose()?.ok_or(LogError::MissingHeader)?;
    if !header.starts_with(BASE_HEADER) {
        return Err(LogError::MissingHeader);
    }

    let mut entries = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = LogEntry::parse_row(&line).map_err(|reason| LogError::Malformed {
            line: i + 2,
            reason,
        })?;
        entries.push(entry);
    }
    Ok(entries)
}
