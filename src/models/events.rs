//! Gesture and session-log event types.
//! The log file itself is plain delimited text (see `telemetry::data_logger`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unified manipulation mode derived from whichever device is active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManipulationMode {
    #[default]
    None,
    Select,
    Grab,
    SelectGrab,
}

impl ManipulationMode {
    /// True for SELECT and SELECTGRAB.
    pub fn is_selecting(self) -> bool {
        matches!(self, ManipulationMode::Select | ManipulationMode::SelectGrab)
    }

    /// True for GRAB and SELECTGRAB.
    pub fn is_grabbing(self) -> bool {
        matches!(self, ManipulationMode::Grab | ManipulationMode::SelectGrab)
    }
}

/// Label written into the `flag` column of every log row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LoggingEnvironment {
    #[default]
    #[serde(rename = "NOGESTURE")]
    NoGesture,
    #[serde(rename = "YESSELECT")]
    YesSelect,
    #[serde(rename = "NOSELECT")]
    NoSelect,
    #[serde(rename = "GRAB")]
    Grab,
    #[serde(rename = "YESDRAG")]
    YesDrag,
    #[serde(rename = "YESDROP")]
    YesDrop,
    #[serde(rename = "NODROP")]
    NoDrop,
}

impl LoggingEnvironment {
    pub const ALL: [LoggingEnvironment; 7] = [
        LoggingEnvironment::NoGesture,
        LoggingEnvironment::YesSelect,
        LoggingEnvironment::NoSelect,
        LoggingEnvironment::Grab,
        LoggingEnvironment::YesDrag,
        LoggingEnvironment::YesDrop,
        LoggingEnvironment::NoDrop,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LoggingEnvironment::NoGesture => "NOGESTURE",
            LoggingEnvironment::YesSelect => "YESSELECT",
            LoggingEnvironment::NoSelect => "NOSELECT",
            LoggingEnvironment::Grab => "GRAB",
            LoggingEnvironment::YesDrag => "YESDRAG",
            LoggingEnvironment::YesDrop => "YESDROP",
            LoggingEnvironment::NoDrop => "NODROP",
        }
    }

    /// Quiescent labels are not re-logged while they persist.
    pub fn is_quiescent(self) -> bool {
        matches!(self, LoggingEnvironment::NoGesture | LoggingEnvironment::Grab)
    }

    /// The label implied by the raw gesture before trial logic runs.
    /// SELECT keeps whatever outcome the trial reported last.
    pub fn for_gesture(mode: ManipulationMode, current: LoggingEnvironment) -> LoggingEnvironment {
        match mode {
            ManipulationMode::None => LoggingEnvironment::NoGesture,
            ManipulationMode::Grab | ManipulationMode::SelectGrab => LoggingEnvironment::Grab,
            ManipulationMode::Select => current,
        }
    }
}

impl fmt::Display for LoggingEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LoggingEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        LoggingEnvironment::ALL
            .into_iter()
            .find(|env| env.label() == trimmed)
            .ok_or_else(|| format!("Unknown logging environment: {trimmed}"))
    }
}

/// One row of the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Seconds since the logger was initialised.
    pub elapsed: f64,
    pub x: f64,
    pub y: f64,
    pub environment: LoggingEnvironment,
    pub custom_values: Vec<String>,
}

impl LogEntry {
    pub fn baseline(custom_fields: usize) -> Self {
        Self {
            elapsed: 0.0,
            x: 0.0,
            y: 0.0,
            environment: LoggingEnvironment::NoGesture,
            custom_values: vec![String::new(); custom_fields],
        }
    }

    /// Spreadsheet-importable row.
    pub fn to_row(&self) -> String {
        let mut row = format!("{},{},{},{}", self.elapsed, self.x, self.y, self.environment);
        for value in &self.custom_values {
            row.push(',');
            row.push_str(value);
        }
        row
    }

    pub fn parse_row(line: &str) -> Result<Self, String> {
        let mut fields = line.split(',');
        let mut next = |name: &str| {
            fields
                .next()
                .map(str::trim)
                .ok_or_else(|| format!("Missing {name} column in row: {line}"))
        };

        let elapsed = next("timestamp")?
            .parse::<f64>()
            .map_err(|e| format!("Bad timestamp in row {line}: {e}"))?;
        let x = next("xpos")?
            .parse::<f64>()
            .map_err(|e| format!("Bad xpos in row {line}: {e}"))?;
        let y = next("ypos")?
            .parse::<f64>()
            .map_err(|e| format!("Bad ypos in row {line}: {e}"))?;
        let environment = next("flag")?.parse::<LoggingEnvironment>()?;
        let custom_values = fields.map(|value| value.to_string()).collect();

        Ok(Self {
            elapsed,
            x,
            y,
            environment,
            custom_values,
        })
    }

    /// Field-wise comparison that ignores the timestamp.
    pub fn same_state(&self, other: &LogEntry) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.environment == other.environment
            && self.custom_values == other.custom_values
    }
}
