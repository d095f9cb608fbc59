//! Date range for selecting which events to sync.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::error::{CalSyncError, CalSyncResult};

/// Half-open UTC range `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// Today (UTC midnight) through the end of the day `days` from now.
    pub fn upcoming(days: i64) -> Self {
        let today = Utc::now().date_naive();
        DateRange {
            from: start_of(today),
            to: start_of(today) + Duration::days(days.max(0) + 1),
        }
    }

    /// Build a range from optional YYYY-MM-DD bounds.
    /// - `from` defaults to today
    /// - `to` defaults to `default_days` after `from`, and is inclusive of that whole day
    pub fn from_args(
        from: Option<&str>,
        to: Option<&str>,
        default_days: i64,
    ) -> CalSyncResult<Self> {
        let from_dt = match from {
            Some(s) => start_of(parse_date(s)?),
            None => start_of(Utc::now().date_naive()),
        };

        let to_dt = match to {
            Some(s) => start_of(parse_date(s)?) + Duration::days(1),
            None => from_dt + Duration::days(default_days.max(0) + 1),
        };

        if to_dt <= from_dt {
            return Err(CalSyncError::InvalidInput(format!(
                "Range end {} is before range start {}",
                to_dt.date_naive(),
                from_dt.date_naive()
            )));
        }

        Ok(DateRange {
            from: from_dt,
            to: to_dt,
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.from && instant < self.to
    }

    /// `from` in the `YYYY-MM-DDTHH:MM:SSZ` form Graph's calendarView expects.
    pub fn from_rfc3339(&self) -> String {
        self.from.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    pub fn to_rfc3339(&self) -> String {
        self.to.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn parse_date(s: &str) -> CalSyncResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        CalSyncError::InvalidInput(format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn explicit_bounds_cover_whole_days() {
        let range = DateRange::from_args(Some("2025-03-01"), Some("2025-03-02"), 7).unwrap();
        assert_eq!(range.from, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(range.to, Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap());
        assert!(range.contains(Utc.with_ymd_and_hms(2025, 3, 2, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap()));
    }

    #[test]
    fn missing_end_uses_default_window() {
        let range = DateRange::from_args(Some("2025-03-01"), None, 7).unwrap();
        assert_eq!(range.to, Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_bad_dates_and_inverted_ranges() {
        assert!(matches!(
            DateRange::from_args(Some("03/01/2025"), None, 7),
            Err(CalSyncError::InvalidInput(_))
        ));
        assert!(matches!(
            DateRange::from_args(Some("2025-03-05"), Some("2025-03-01"), 7),
            Err(CalSyncError::InvalidInput(_))
        ));
    }

    #[test]
    fn upcoming_matches_default_window_from_today() {
        let upcoming = DateRange::upcoming(7);
        let defaulted = DateRange::from_args(None, None, 7).unwrap();
        assert_eq!(upcoming, defaulted);
        assert_eq!(upcoming.to - upcoming.from, Duration::days(8));
    }

    #[test]
    fn rfc3339_formatting_is_utc_zulu() {
        let range = DateRange::from_args(Some("2025-03-01"), Some("2025-03-01"), 7).unwrap();
        assert_eq!(range.from_rfc3339(), "2025-03-01T00:00:00Z");
        assert_eq!(range.to_rfc3339(), "2025-03-02T00:00:00Z");
    }
}
