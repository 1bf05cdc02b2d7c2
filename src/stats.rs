use crate::datekey::{previous_period, DateInterval};
use crate::roster::Roster;
use crate::select::{select_in_range, Selected};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub total: i64,
    pub justified: i64,
    pub unjustified: i64,
}

/// Pure reduction over an already-validated selection.
/// `unjustified` is derived as `total - justified`.
pub fn summarize(selection: &[Selected]) -> Tally {
    let total = selection.len() as i64;
    let justified = selection.iter().filter(|s| s.justified).count() as i64;
    Tally {
        total,
        justified,
        unjustified: total - justified,
    }
}

/// Generic grouping reducer. Keys come back in first-encounter order so that
/// [`top_of`] has a stable, deterministic tie-break (first seen wins) even
/// though the counts themselves live in a HashMap during the fold.
pub fn count_by<T, K, F>(items: &[T], key_fn: F) -> Vec<(K, i64)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> Option<K>,
{
    let mut counts: HashMap<K, i64> = HashMap::new();
    let mut order: Vec<K> = Vec::new();
    for item in items {
        let Some(key) = key_fn(item) else {
            continue;
        };
        let entry = counts.entry(key.clone()).or_insert(0);
        if *entry == 0 {
            order.push(key);
        }
        *entry += 1;
    }
    order
        .into_iter()
        .map(|k| {
            let n = counts[&k];
            (k, n)
        })
        .collect()
}

/// Top entry of an aggregate map, or the empty sentinel. Serialized with a
/// null key so the display layer renders "no data" instead of a fake name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEntry {
    pub key: Option<String>,
    pub count: i64,
}

impl TopEntry {
    pub fn empty() -> Self {
        Self { key: None, count: 0 }
    }
}

/// Linear max scan. Ties break to the first entry encountered; that is a
/// documented policy, not a reflection of any ordering in the source data.
pub fn top_of(counts: &[(String, i64)]) -> TopEntry {
    let mut best: Option<(&str, i64)> = None;
    for (key, count) in counts {
        match best {
            Some((_, n)) if *count <= n => {}
            _ => best = Some((key.as_str(), *count)),
        }
    }
    match best {
        Some((key, count)) => TopEntry {
            key: Some(key.to_string()),
            count,
        },
        None => TopEntry::empty(),
    }
}

pub const SHIFT_MORNING: &str = "Morning";
pub const SHIFT_AFTERNOON: &str = "Afternoon";

/// Fixed partition rule inherited from the source school system: the
/// classroom label's last alphabetic character decides the shift, with
/// {A, B, C} meaning Morning and any other letter Afternoon. Deliberately
/// naive (single-letter membership test, nothing more) and not configurable.
pub fn shift_of_classroom(classroom: &str) -> &'static str {
    let last_letter = classroom.chars().rev().find(|c| c.is_alphabetic());
    match last_letter {
        Some('A') | Some('B') | Some('C') => SHIFT_MORNING,
        _ => SHIFT_AFTERNOON,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub total_absences: i64,
    pub justified_count: i64,
    pub unjustified_count: i64,
    /// Inclusive calendar-day count of the interval; 0 for no selection.
    pub day_count: i64,
    /// Capacity denominator for attendance-rate displays:
    /// `day_count * student_count`.
    pub total_possible: i64,
    pub top_student: TopEntry,
    pub top_classroom: TopEntry,
    pub top_shift: TopEntry,
}

/// Builds the full summary for one interval. An absent interval, an empty
/// roster, or a range with no matching records all produce the all-zero
/// summary with empty sentinels; none of those are errors.
pub fn period_summary(roster: &Roster, interval: Option<&DateInterval>) -> PeriodSummary {
    let selection = select_in_range(roster, interval);
    let tally = summarize(&selection);

    let by_student = count_by(&selection, |s: &Selected| {
        roster.students.get(s.student_idx).map(|st| st.id.clone())
    });
    let by_classroom = count_by(&selection, |s: &Selected| {
        roster
            .students
            .get(s.student_idx)
            .and_then(|st| st.classroom.clone())
    });
    let by_shift = count_by(&selection, |s: &Selected| {
        roster
            .students
            .get(s.student_idx)
            .and_then(|st| st.classroom.as_deref())
            .map(|c| shift_of_classroom(c).to_string())
    });

    let day_count = interval.map(|i| i.day_count()).unwrap_or(0);
    let total_possible = day_count * roster.len() as i64;

    PeriodSummary {
        total_absences: tally.total,
        justified_count: tally.justified,
        unjustified_count: tally.unjustified,
        day_count,
        total_possible,
        top_student: top_of(&by_student),
        top_classroom: top_of(&by_classroom),
        top_shift: top_of(&by_shift),
    }
}

/// Caller-supplied precomputed summary fields. Merge policy is explicit:
/// a field present in the override replaces the computed value, absent
/// fields keep it. This replaces the source system's silent fallback chain
/// between an external summary file and recomputation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOverride {
    pub total_absences: Option<i64>,
    pub justified_count: Option<i64>,
    pub unjustified_count: Option<i64>,
    pub top_student: Option<TopEntry>,
    pub top_classroom: Option<TopEntry>,
    pub top_shift: Option<TopEntry>,
}

pub fn apply_override(mut summary: PeriodSummary, over: &SummaryOverride) -> PeriodSummary {
    if let Some(v) = over.total_absences {
        summary.total_absences = v;
    }
    if let Some(v) = over.justified_count {
        summary.justified_count = v;
    }
    if let Some(v) = over.unjustified_count {
        summary.unjustified_count = v;
    }
    if let Some(v) = &over.top_student {
        summary.top_student = v.clone();
    }
    if let Some(v) = &over.top_classroom {
        summary.top_classroom = v.clone();
    }
    if let Some(v) = &over.top_shift {
        summary.top_shift = v.clone();
    }
    summary
}

/// Rounded percent change against a baseline. A zero baseline has no
/// meaningful percentage: the result is `None` ("no baseline"), never an
/// infinity or NaN.
pub fn percent_change(current: i64, previous: i64) -> Option<i64> {
    if previous == 0 {
        return None;
    }
    let change = ((current - previous) as f64 / previous as f64) * 100.0;
    Some(change.round() as i64)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodComparison {
    pub current: Tally,
    pub previous: Tally,
    pub previous_interval: DateInterval,
    pub percent_change: Option<i64>,
}

/// Compares an interval against the equal-length, weekday-aligned period
/// before it (see [`previous_period`]).
pub fn compare_periods(roster: &Roster, interval: &DateInterval) -> PeriodComparison {
    let previous_interval = previous_period(interval);
    let current = summarize(&select_in_range(roster, Some(interval)));
    let previous = summarize(&select_in_range(roster, Some(&previous_interval)));
    PeriodComparison {
        current,
        previous,
        previous_interval,
        percent_change: percent_change(current.total, previous.total),
    }
}
