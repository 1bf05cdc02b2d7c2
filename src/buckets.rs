use crate::datekey::DateInterval;
use crate::roster::Roster;
use crate::select::{select_in_range, Selected};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    /// Fixed fallback preference order.
    pub const PREFERENCE: [Granularity; 4] = [
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Year,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Granularity::Day),
            "week" => Some(Granularity::Week),
            "month" => Some(Granularity::Month),
            "year" => Some(Granularity::Year),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesMode {
    /// Raw per-bucket sums.
    Each,
    /// Per-bucket averages, denominator = count of calendar days whose
    /// per-day record folded into the bucket (not the record count).
    Average,
}

impl SeriesMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "each" => Some(SeriesMode::Each),
            "average" => Some(SeriesMode::Average),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeriesMode::Each => "each",
            SeriesMode::Average => "average",
        }
    }
}

/// Label tables for bucket formatting. The source domain is a Spanish
/// school, hence the defaults; callers swap the tables rather than the
/// formatter.
#[derive(Debug, Clone)]
pub struct BucketLocale {
    /// Monday..Friday three-letter abbreviations.
    pub weekdays: [&'static str; 5],
    /// January..December short month names.
    pub months: [&'static str; 12],
}

impl Default for BucketLocale {
    fn default() -> Self {
        Self {
            weekdays: ["lun", "mar", "mié", "jue", "vie"],
            months: [
                "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub label: String,
    pub total: f64,
    pub justified: f64,
    pub unjustified: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketedSeries {
    pub granularity: Granularity,
    pub mode: SeriesMode,
    pub buckets: Vec<Bucket>,
    /// Granularities that yield at least one bucket for this selection,
    /// in preference order.
    pub available: Vec<Granularity>,
}

#[derive(Debug, Clone, Copy, Default)]
struct DayTally {
    total: i64,
    justified: i64,
}

/// One pass over the selection keyed by exact date. BTreeMap keeps the days
/// chronological so bucket output is deterministic.
fn per_day_tallies(selection: &[Selected]) -> BTreeMap<NaiveDate, DayTally> {
    let mut days: BTreeMap<NaiveDate, DayTally> = BTreeMap::new();
    for s in selection {
        let entry = days.entry(s.date).or_default();
        entry.total += 1;
        if s.justified {
            entry.justified += 1;
        }
    }
    days
}

fn weekday_index(date: NaiveDate) -> Option<usize> {
    match date.weekday() {
        Weekday::Mon => Some(0),
        Weekday::Tue => Some(1),
        Weekday::Wed => Some(2),
        Weekday::Thu => Some(3),
        Weekday::Fri => Some(4),
        // School attendance: weekend dates never form a weekday bucket.
        Weekday::Sat | Weekday::Sun => None,
    }
}

/// Composite sort key per granularity. Day uses the fixed Mon..Fri slot,
/// the calendar granularities sort chronologically.
fn bucket_key(granularity: Granularity, date: NaiveDate) -> Option<(i32, u32)> {
    match granularity {
        Granularity::Day => weekday_index(date).map(|i| (0, i as u32)),
        Granularity::Week => {
            let iso = date.iso_week();
            Some((iso.year(), iso.week()))
        }
        Granularity::Month => Some((date.year(), date.month())),
        Granularity::Year => Some((date.year(), 0)),
    }
}

fn bucket_label(granularity: Granularity, key: (i32, u32), locale: &BucketLocale) -> String {
    match granularity {
        Granularity::Day => locale
            .weekdays
            .get(key.1 as usize)
            .copied()
            .unwrap_or("?")
            .to_string(),
        Granularity::Week => format!("{}-W{:02}", key.0, key.1),
        Granularity::Month => {
            let month = locale
                .months
                .get(key.1 as usize - 1)
                .copied()
                .unwrap_or("?");
            format!("{} {:02}", month, key.0.rem_euclid(100))
        }
        Granularity::Year => key.0.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct BucketAccum {
    total: i64,
    justified: i64,
    day_count: i64,
}

fn fold_buckets(
    per_day: &BTreeMap<NaiveDate, DayTally>,
    granularity: Granularity,
) -> BTreeMap<(i32, u32), BucketAccum> {
    let mut buckets: BTreeMap<(i32, u32), BucketAccum> = BTreeMap::new();
    for (date, tally) in per_day {
        let Some(key) = bucket_key(granularity, *date) else {
            continue;
        };
        let entry = buckets.entry(key).or_default();
        entry.total += tally.total;
        entry.justified += tally.justified;
        entry.day_count += 1;
    }
    buckets
}

fn render_buckets(
    folded: &BTreeMap<(i32, u32), BucketAccum>,
    granularity: Granularity,
    mode: SeriesMode,
    locale: &BucketLocale,
) -> Vec<Bucket> {
    folded
        .iter()
        .map(|(key, acc)| {
            let unjustified = acc.total - acc.justified;
            let (total, justified, unjustified) = match mode {
                SeriesMode::Each => (acc.total as f64, acc.justified as f64, unjustified as f64),
                SeriesMode::Average => {
                    // A bucket only exists because at least one day folded
                    // into it, so the denominator is never zero.
                    let days = acc.day_count as f64;
                    (
                        acc.total as f64 / days,
                        acc.justified as f64 / days,
                        unjustified as f64 / days,
                    )
                }
            };
            Bucket {
                label: bucket_label(granularity, *key, locale),
                total,
                justified,
                unjustified,
            }
        })
        .collect()
}

/// Granularities yielding at least one bucket for this selection, in the
/// fixed preference order Day > Week > Month > Year.
pub fn available_granularities(selection: &[Selected]) -> Vec<Granularity> {
    let per_day = per_day_tallies(selection);
    Granularity::PREFERENCE
        .into_iter()
        .filter(|g| !fold_buckets(&per_day, *g).is_empty())
        .collect()
}

/// Builds the charting series for one interval. If the requested
/// granularity yields no buckets the series silently falls back to the
/// first available granularity; the returned `granularity` field reports
/// which one was actually used. The result has zero buckets only when no
/// granularity is valid for the selection (e.g. empty selection).
pub fn bucketed_series(
    roster: &Roster,
    interval: Option<&DateInterval>,
    requested: Granularity,
    mode: SeriesMode,
    locale: &BucketLocale,
) -> BucketedSeries {
    let selection = select_in_range(roster, interval);
    let per_day = per_day_tallies(&selection);
    let available = available_granularities(&selection);

    let effective = if available.contains(&requested) {
        requested
    } else {
        available.first().copied().unwrap_or(requested)
    };

    let folded = fold_buckets(&per_day, effective);
    BucketedSeries {
        granularity: effective,
        mode,
        buckets: render_buckets(&folded, effective, mode, locale),
        available,
    }
}
