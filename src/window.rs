//! Lookback window computation.

use chrono::{Months, NaiveDate};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("months must be non-negative, got {0}")]
    InvalidArgument(i64),
    #[error("{months} months before {today} is out of the supported date range")]
    OutOfRange { today: NaiveDate, months: i64 },
}

/// Earliest publication date, inclusive, that is still inside the window.
///
/// Months are subtracted on the calendar, not as 30-day blocks: the day of
/// month is kept when the target month has it and clamped to that month's
/// last day otherwise (`2024-03-31` minus one month is `2024-02-29`).
/// `months == 0` returns `today` unchanged.
pub fn cutoff(today: NaiveDate, months: i64) -> Result<NaiveDate, WindowError> {
    if months < 0 {
        return Err(WindowError::InvalidArgument(months));
    }
    u32::try_from(months)
        .ok()
        .and_then(|m| today.checked_sub_months(Months::new(m)))
        .ok_or(WindowError::OutOfRange { today, months })
}
