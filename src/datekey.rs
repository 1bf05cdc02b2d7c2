use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Closed calendar-date range, inclusive on both ends.
///
/// Callers are expected to pass `start <= end`; an inverted range is treated
/// everywhere as an empty selection, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateInterval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Inclusive day count; 0 for an inverted range.
    pub fn day_count(&self) -> i64 {
        let span = (self.end - self.start).num_days();
        if span < 0 {
            0
        } else {
            span + 1
        }
    }
}

/// Formats a date as the compact `dd-mm-yy` key used by stored absence
/// records. Total: every valid date has a representation (years outside
/// 2000-2099 collapse onto their last two digits, which `decode_key` will
/// then read back as 20xx; see the fixed-window note there).
pub fn encode_key(date: NaiveDate) -> String {
    use chrono::Datelike;
    format!(
        "{:02}-{:02}-{:02}",
        date.day(),
        date.month(),
        date.year().rem_euclid(100)
    )
}

/// Parses a `dd-mm-yy` key. Returns `None` when the string does not split
/// into exactly three numeric dash-parts or the day/month pair is not a
/// plausible calendar date (e.g. `31-02-25`).
///
/// The two-digit year expands by +2000. This is a fixed assumption of the
/// stored data format, valid for 2000-2099; there is deliberately no
/// century-rollover rule.
pub fn decode_key(key: &str) -> Option<NaiveDate> {
    let mut parts = key.split('-');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year + 2000, month, day)
}

/// Every calendar day from `start` to `end` inclusive, ascending.
/// Empty when `end < start`.
pub fn days_in_interval(interval: &DateInterval) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut d = interval.start;
    while d <= interval.end {
        days.push(d);
        let Some(next) = d.checked_add_days(Days::new(1)) else {
            break;
        };
        d = next;
    }
    days
}

/// Day-granularity inclusive membership test.
pub fn in_inclusive_range(date: NaiveDate, interval: &DateInterval) -> bool {
    date >= interval.start && date <= interval.end
}

/// The immediately preceding interval of identical length, shifted back by
/// the smallest whole number of weeks that clears the current interval.
/// Keeping the shift week-sized preserves day-of-week alignment, so a
/// Mon-Fri selection is always compared against the preceding Mon-Fri block
/// (e.g. `[2025-09-01, 2025-09-05]` -> `[2025-08-25, 2025-08-29]`) instead
/// of a baseline that straddles a weekend. Used for percent-change displays.
pub fn previous_period(interval: &DateInterval) -> DateInterval {
    let len = interval.day_count().max(1) as u64;
    let shift = len.div_ceil(7) * 7;
    let start = interval
        .start
        .checked_sub_days(Days::new(shift))
        .unwrap_or(interval.start);
    let end = interval
        .end
        .checked_sub_days(Days::new(shift))
        .unwrap_or(interval.end);
    DateInterval { start, end }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("valid test date")
    }

    #[test]
    fn encode_pads_day_month_and_year() {
        assert_eq!(encode_key(d(2025, 9, 1)), "01-09-25");
        assert_eq!(encode_key(d(2003, 12, 31)), "31-12-03");
    }

    #[test]
    fn decode_round_trips_valid_window() {
        for date in [d(2000, 1, 1), d(2025, 9, 2), d(2099, 12, 31), d(2024, 2, 29)] {
            assert_eq!(decode_key(&encode_key(date)), Some(date));
        }
    }

    #[test]
    fn decode_rejects_malformed_keys() {
        assert_eq!(decode_key(""), None);
        assert_eq!(decode_key("01-09"), None);
        assert_eq!(decode_key("01-09-25-07"), None);
        assert_eq!(decode_key("aa-09-25"), None);
        assert_eq!(decode_key("01/09/25"), None);
    }

    #[test]
    fn decode_rejects_implausible_calendar_dates() {
        // Feb 31 must come back as None, not an overflowed date.
        assert_eq!(decode_key("31-02-25"), None);
        assert_eq!(decode_key("29-02-25"), None); // 2025 is not a leap year
        assert_eq!(decode_key("00-09-25"), None);
        assert_eq!(decode_key("01-13-25"), None);
    }

    #[test]
    fn single_day_interval_enumerates_one_day() {
        let day = d(2025, 9, 3);
        let days = days_in_interval(&DateInterval::new(day, day));
        assert_eq!(days, vec![day]);
    }

    #[test]
    fn inverted_interval_is_empty() {
        let interval = DateInterval::new(d(2025, 9, 5), d(2025, 9, 1));
        assert!(days_in_interval(&interval).is_empty());
        assert_eq!(interval.day_count(), 0);
    }

    #[test]
    fn inclusive_range_covers_both_endpoints() {
        let interval = DateInterval::new(d(2025, 9, 1), d(2025, 9, 5));
        assert!(in_inclusive_range(d(2025, 9, 1), &interval));
        assert!(in_inclusive_range(d(2025, 9, 5), &interval));
        assert!(!in_inclusive_range(d(2025, 8, 31), &interval));
        assert!(!in_inclusive_range(d(2025, 9, 6), &interval));
    }

    #[test]
    fn previous_period_is_the_preceding_school_week_block() {
        // Mon-Fri selection compares against the preceding Mon-Fri.
        let current = DateInterval::new(d(2025, 9, 1), d(2025, 9, 5));
        let previous = previous_period(&current);
        assert_eq!(previous.start, d(2025, 8, 25));
        assert_eq!(previous.end, d(2025, 8, 29));
        assert_eq!(previous.day_count(), current.day_count());
    }

    #[test]
    fn previous_period_preserves_weekday_alignment() {
        use chrono::Datelike;
        // 10 days spanning two weeks shift back by a full fortnight.
        let current = DateInterval::new(d(2025, 9, 3), d(2025, 9, 12));
        let previous = previous_period(&current);
        assert_eq!(previous.start, d(2025, 8, 20));
        assert_eq!(previous.end, d(2025, 8, 29));
        assert_eq!(previous.day_count(), current.day_count());
        assert_eq!(previous.start.weekday(), current.start.weekday());

        // A whole-week selection sits immediately before the current one.
        let week = DateInterval::new(d(2025, 9, 1), d(2025, 9, 7));
        let prior = previous_period(&week);
        assert_eq!(prior.start, d(2025, 8, 25));
        assert_eq!(prior.end, d(2025, 8, 31));
    }

    #[test]
    fn previous_period_never_overlaps_current() {
        for len in 1..=15u64 {
            let start = d(2025, 9, 1);
            let end = start
                .checked_add_days(chrono::Days::new(len - 1))
                .expect("valid end");
            let current = DateInterval::new(start, end);
            let previous = previous_period(&current);
            assert!(previous.end < current.start, "len {} overlaps", len);
            assert_eq!(previous.day_count(), current.day_count());
        }
    }
}
