//! Calendar helpers for bucketing instants into local dates.
//!
//! All windows are expressed as inclusive ranges of calendar dates rather than
//! instants. An instant belongs to a window when its local date does, which
//! sidesteps DST gaps and ambiguous local midnights.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone, Utc};

/// Project an instant onto its calendar date in the given time zone.
#[must_use]
pub fn date_key<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Short weekday label ("Mon", "Tue", ...) for chart axes.
#[must_use]
pub fn weekday_label(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// A range from `start` to `end`, both inclusive.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The range containing only `date`.
    #[must_use]
    pub const fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// The Sunday to Saturday week containing `date`.
    #[must_use]
    pub fn week_containing(date: NaiveDate) -> Self {
        let start = date - Days::new(u64::from(date.weekday().num_days_from_sunday()));
        Self::new(start, start + Days::new(6))
    }

    /// The calendar month containing `date`.
    #[must_use]
    pub fn month_containing(date: NaiveDate) -> Self {
        let start = date - Days::new(u64::from(date.day0()));
        let end = start + Months::new(1) - Days::new(1);
        Self::new(start, end)
    }

    /// The `count` days ending at `end`, inclusive.
    ///
    /// `count` must be at least one.
    #[must_use]
    pub fn trailing(end: NaiveDate, count: u64) -> Self {
        Self::new(end - Days::new(count.saturating_sub(1)), end)
    }

    /// The same range shifted one week earlier.
    #[must_use]
    pub fn previous_week(self) -> Self {
        Self::new(self.start - Days::new(7), self.end - Days::new(7))
    }

    /// First date of the range.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date of the range.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` falls within the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Iterate over every date in the range, oldest first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_runs_sunday_to_saturday() {
        // 2024-05-15 is a Wednesday
        let week = DateRange::week_containing(date(2024, 5, 15));
        assert_eq!(week.start(), date(2024, 5, 12));
        assert_eq!(week.end(), date(2024, 5, 18));
    }

    #[test]
    fn sunday_starts_its_own_week() {
        let week = DateRange::week_containing(date(2024, 5, 12));
        assert_eq!(week.start(), date(2024, 5, 12));
    }

    #[test]
    fn previous_week_is_seven_days_earlier() {
        let week = DateRange::week_containing(date(2024, 5, 15)).previous_week();
        assert_eq!(week, DateRange::new(date(2024, 5, 5), date(2024, 5, 11)));
    }

    #[test]
    fn month_handles_leap_february() {
        let month = DateRange::month_containing(date(2024, 2, 10));
        assert_eq!(month, DateRange::new(date(2024, 2, 1), date(2024, 2, 29)));
    }

    #[test]
    fn month_handles_december() {
        let month = DateRange::month_containing(date(2023, 12, 31));
        assert_eq!(month, DateRange::new(date(2023, 12, 1), date(2023, 12, 31)));
    }

    #[test]
    fn trailing_days_are_oldest_first() {
        let days: Vec<_> = DateRange::trailing(date(2024, 3, 2), 7).days().collect();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], date(2024, 2, 25));
        assert_eq!(days[6], date(2024, 3, 2));
    }

    #[test]
    fn date_key_uses_local_time_zone() {
        let instant = DateTime::parse_from_rfc3339("2024-05-15T23:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let east = FixedOffset::east_opt(2 * 3600).unwrap();
        let west = FixedOffset::west_opt(2 * 3600).unwrap();

        assert_eq!(date_key(instant, &Utc), date(2024, 5, 15));
        assert_eq!(date_key(instant, &east), date(2024, 5, 16));
        assert_eq!(date_key(instant, &west), date(2024, 5, 15));
    }

    #[test]
    fn weekday_label_is_abbreviated() {
        assert_eq!(weekday_label(date(2024, 5, 15)), "Wed");
    }
}
