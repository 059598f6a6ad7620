use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current time. Calendar dates are UTC dates.
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}
