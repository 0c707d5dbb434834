//! Time-bucket granularity and bucket enumeration
//!
//! Buckets are computed in UTC. Weeks start on Monday.

use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, Utc};

use crate::data::sql::TimeBucket;

/// Requested granularity, `Auto` resolves from the window length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Auto,
}

impl Granularity {
    /// Parse a caller token, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" => Some(Self::Minute),
            "hour" => Some(Self::Hour),
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }

    /// Concrete bucket for a window
    pub fn resolve(self, from: DateTime<Utc>, to: DateTime<Utc>) -> TimeBucket {
        match self {
            Self::Minute => TimeBucket::Minute,
            Self::Hour => TimeBucket::Hour,
            Self::Day => TimeBucket::Day,
            Self::Week => TimeBucket::Week,
            Self::Month => TimeBucket::Month,
            Self::Auto => auto_bucket(from, to),
        }
    }
}

/// Pick a bucket that keeps the series readable
///
/// - up to 2 hours: minute
/// - up to 2 days: hour
/// - up to 60 days: day
/// - up to a year: week
/// - otherwise: month
pub fn auto_bucket(from: DateTime<Utc>, to: DateTime<Utc>) -> TimeBucket {
    let span = to - from;
    if span <= Duration::hours(2) {
        TimeBucket::Minute
    } else if span <= Duration::hours(48) {
        TimeBucket::Hour
    } else if span <= Duration::days(60) {
        TimeBucket::Day
    } else if span <= Duration::days(365) {
        TimeBucket::Week
    } else {
        TimeBucket::Month
    }
}

/// Start of the bucket containing `dt`
pub fn truncate(dt: DateTime<Utc>, bucket: TimeBucket) -> DateTime<Utc> {
    let date = dt.date_naive();
    let naive = match bucket {
        TimeBucket::Minute => {
            let secs = dt.timestamp().div_euclid(60) * 60;
            return DateTime::from_timestamp(secs, 0).unwrap_or(dt);
        }
        TimeBucket::Hour => {
            let secs = dt.timestamp().div_euclid(3600) * 3600;
            return DateTime::from_timestamp(secs, 0).unwrap_or(dt);
        }
        TimeBucket::Day => date.and_time(NaiveTime::MIN),
        TimeBucket::Week => {
            let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
            monday.and_time(NaiveTime::MIN)
        }
        TimeBucket::Month => date
            .with_day(1)
            .unwrap_or(date)
            .and_time(NaiveTime::MIN),
    };
    naive.and_utc()
}

/// Start of the bucket after the one starting at `start`
fn next_start(start: DateTime<Utc>, bucket: TimeBucket) -> Option<DateTime<Utc>> {
    match bucket {
        TimeBucket::Minute => start.checked_add_signed(Duration::minutes(1)),
        TimeBucket::Hour => start.checked_add_signed(Duration::hours(1)),
        TimeBucket::Day => start.checked_add_signed(Duration::days(1)),
        TimeBucket::Week => start.checked_add_signed(Duration::weeks(1)),
        TimeBucket::Month => start.checked_add_months(Months::new(1)),
    }
}

/// Every bucket start in `[truncate(from), truncate(to)]`
///
/// Returns `None` when the window needs more than `max` buckets.
pub fn bucket_starts(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    bucket: TimeBucket,
    max: usize,
) -> Option<Vec<DateTime<Utc>>> {
    let last = truncate(to, bucket);
    let mut current = truncate(from, bucket);
    let mut starts = Vec::new();
    while current <= last {
        if starts.len() == max {
            return None;
        }
        starts.push(current);
        current = next_start(current, bucket)?;
    }
    Some(starts)
}
