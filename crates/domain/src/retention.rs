use chrono::{DateTime, TimeDelta, Utc};

/// Positive number of days a package version is kept before it may be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow {
    days: i64,
}

impl RetentionWindow {
    /// Builds a window from a day count. Returns `None` for zero or negative values.
    #[must_use]
    pub fn from_days(days: i64) -> Option<Self> {
        (days > 0).then_some(Self { days })
    }

    /// Returns the number of retained days.
    #[must_use]
    pub fn days(&self) -> i64 {
        self.days
    }

    /// Returns the window as a duration, or `None` when it exceeds the representable range.
    #[must_use]
    fn max_age(&self) -> Option<TimeDelta> {
        TimeDelta::try_days(self.days)
    }

    /// Returns whether a version published at `published_time` is older than the window.
    ///
    /// The comparison is strict: a version exactly `days` old is retained.
    #[must_use]
    pub fn is_expired(&self, published_time: DateTime<Utc>, invocation_time: DateTime<Utc>) -> bool {
        match self.max_age() {
            Some(max_age) => invocation_time.signed_duration_since(published_time) > max_age,
            None => false,
        }
    }
}
