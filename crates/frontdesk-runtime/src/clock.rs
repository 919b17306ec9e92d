//! Clock seam.
//!
//! The business-hours gate and the date validators depend on "now"; the
//! trait keeps them deterministic under test.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current UTC instant (audit timestamps).
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current business-local date and time (gates and validators).
    fn now_local(&self) -> NaiveDateTime;

    /// Business-local date.
    fn today(&self) -> NaiveDate {
        self.now_local().date()
    }

    /// Business-local time of day.
    fn time_of_day(&self) -> NaiveTime {
        self.now_local().time()
    }
}

/// Wall-clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Fixed-instant clock for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: NaiveDateTime,
}

impl FixedClock {
    /// Pin the clock to the given local datetime.
    #[must_use]
    pub fn at(instant: NaiveDateTime) -> Self {
        Self { instant }
    }

    /// Pin the clock to a date at noon.
    #[must_use]
    pub fn at_noon(date: NaiveDate) -> Self {
        Self {
            instant: date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()),
        }
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.instant.and_utc()
    }

    fn now_local(&self) -> NaiveDateTime {
        self.instant
    }
}
