use crate::error::BoxError;
use crate::records::TextRecord;
use crate::temporal::TimeWindow;

/// Retrieval seam: whatever fetches log records for a time window.
///
/// Implementations own retries and timeouts; the engine surfaces their errors as-is.
pub trait RecordSource {
    fn fetch(&self, window: &TimeWindow) -> Result<Vec<TextRecord>, BoxError>;
}

/// An already-materialized batch, windowed in memory.
impl RecordSource for Vec<TextRecord> {
    fn fetch(&self, window: &TimeWindow) -> Result<Vec<TextRecord>, BoxError> {
        Ok(window.select(self))
    }
}

impl RecordSource for [TextRecord] {
    fn fetch(&self, window: &TimeWindow) -> Result<Vec<TextRecord>, BoxError> {
        Ok(window.select(self))
    }
}
