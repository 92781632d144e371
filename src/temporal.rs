use crate::error::{EngineError, Result};
use crate::records::TextRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(EngineError::InvalidOptions(format!(
                "time window end {end} is not after start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Window of the same length ending where this one starts.
    pub fn preceding(&self) -> Self {
        Self { start: self.start - self.duration(), end: self.start }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }

    pub fn select(&self, records: &[TextRecord]) -> Vec<TextRecord> {
        records.iter().filter(|r| self.contains(r.timestamp)).cloned().collect()
    }
}

/// Splits one batch into (base, selection) records; records outside both windows are dropped.
pub fn split_windows(
    records: &[TextRecord],
    base: &TimeWindow,
    selection: &TimeWindow,
) -> (Vec<TextRecord>, Vec<TextRecord>) {
    (base.select(records), selection.select(records))
}
