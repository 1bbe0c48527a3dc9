// Calendar-day clock and due date parsing

use chrono::{Local, NaiveDate};

/// Date format used for due dates everywhere (input, storage, display of raw values)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of the current calendar day
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Reads the local timezone of the running process
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same day
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Parse an ISO `YYYY-MM-DD` due date.
///
/// Returns `None` for blank or malformed input; callers treat that as a missing date.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}
