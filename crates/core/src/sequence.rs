//! Scan cadence and background (slow) sequences.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::logic::indent;

/// Time units accepted by `Scan` and `DataInterval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    #[serde(rename = "uSec", alias = "usec")]
    USec,
    #[serde(rename = "mSec", alias = "msec")]
    MSec,
    #[serde(rename = "Sec", alias = "sec")]
    Sec,
    #[serde(rename = "Min", alias = "min")]
    Min,
    #[serde(rename = "Hr", alias = "hr")]
    Hr,
    #[serde(rename = "Day", alias = "day")]
    Day,
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeUnit::USec => "uSec",
            TimeUnit::MSec => "mSec",
            TimeUnit::Sec => "Sec",
            TimeUnit::Min => "Min",
            TimeUnit::Hr => "Hr",
            TimeUnit::Day => "Day",
        })
    }
}

/// `Scan(interval, unit, buffer, count)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scan {
    pub interval: u32,
    pub unit: TimeUnit,
    pub buffer: u32,
    pub count: u32,
}

impl Scan {
    pub fn new(interval: u32, unit: TimeUnit) -> Self {
        Self {
            interval,
            unit,
            buffer: 0,
            count: 0,
        }
    }
}

impl Default for Scan {
    fn default() -> Self {
        Self::new(5, TimeUnit::Sec)
    }
}

impl fmt::Display for Scan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scan({},{},{},{})",
            self.interval, self.unit, self.buffer, self.count
        )
    }
}

/// A background routine with its own cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlowSequence {
    pub id: String,
    pub scan: Scan,
    logic: Vec<String>,
}

impl SlowSequence {
    pub fn new(id: impl Into<String>, scan: Scan) -> Self {
        Self {
            id: id.into(),
            scan,
            logic: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl ToString) -> Self {
        self.logic.push(line.to_string());
        self
    }

    /// The body as it will be rendered, before indentation.
    pub fn logic(&self) -> String {
        self.logic.join("\n")
    }

    /// Append another sequence's body to this one. The cadence is kept.
    pub fn absorb(&mut self, other: SlowSequence) {
        self.logic.extend(other.logic);
    }
}

impl fmt::Display for SlowSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SlowSequence '{}", self.id)?;
        writeln!(f, "{}", self.scan)?;
        let body = indent(&self.logic(), 1);
        if !body.is_empty() {
            writeln!(f, "{body}")?;
        }
        f.write_str("NextScan")
    }
}
