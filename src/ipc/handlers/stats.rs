use crate::buckets::{bucketed_series, Granularity, SeriesMode};
use crate::datekey::DateInterval;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::Roster;
use crate::stats::{apply_override, compare_periods, period_summary, SummaryOverride, Tally};
use chrono::NaiveDate;
use serde_json::json;

struct HandlerErr {
    code: &'static str,
    message: String,
}

impl HandlerErr {
    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, None)
    }
}

fn parse_iso_date(params: &serde_json::Value, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => {
            let Some(s) = v.as_str() else {
                return Err(HandlerErr {
                    code: "bad_params",
                    message: format!("{} must be a YYYY-MM-DD string or null", key),
                });
            };
            let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| HandlerErr {
                code: "bad_params",
                message: format!("{} must be a YYYY-MM-DD string", key),
            })?;
            Ok(Some(date))
        }
    }
}

/// A half-specified or absent range means "no selection": the stats methods
/// answer with all-zero output rather than an error.
fn parse_interval(params: &serde_json::Value) -> Result<Option<DateInterval>, HandlerErr> {
    let from = parse_iso_date(params, "from")?;
    let to = parse_iso_date(params, "to")?;
    match (from, to) {
        (Some(start), Some(end)) => Ok(Some(DateInterval::new(start, end))),
        _ => Ok(None),
    }
}

fn require_roster<'a>(state: &'a AppState, req: &Request) -> Result<&'a Roster, serde_json::Value> {
    state
        .roster
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_roster", "load a roster first", None))
}

fn handle_stats_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let roster = match require_roster(state, req) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let interval = match parse_interval(&req.params) {
        Ok(i) => i,
        Err(error) => return error.response(&req.id),
    };
    let over: SummaryOverride = match req.params.get("override") {
        None => SummaryOverride::default(),
        Some(v) if v.is_null() => SummaryOverride::default(),
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(o) => o,
            Err(e) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("invalid override: {}", e),
                    None,
                )
            }
        },
    };
    let summary = apply_override(period_summary(roster, interval.as_ref()), &over);
    match serde_json::to_value(&summary) {
        Ok(result) => ok(&req.id, result),
        Err(e) => err(&req.id, "serialize_failed", e.to_string(), None),
    }
}

fn handle_stats_compare(state: &mut AppState, req: &Request) -> serde_json::Value {
    let roster = match require_roster(state, req) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let interval = match parse_interval(&req.params) {
        Ok(i) => i,
        Err(error) => return error.response(&req.id),
    };
    let Some(interval) = interval else {
        // No selection: zero tallies on both sides and no baseline.
        return ok(
            &req.id,
            json!({
                "current": Tally::default(),
                "previous": Tally::default(),
                "previousInterval": serde_json::Value::Null,
                "percentChange": serde_json::Value::Null
            }),
        );
    };
    let comparison = compare_periods(roster, &interval);
    match serde_json::to_value(&comparison) {
        Ok(result) => ok(&req.id, result),
        Err(e) => err(&req.id, "serialize_failed", e.to_string(), None),
    }
}

fn handle_stats_series(state: &mut AppState, req: &Request) -> serde_json::Value {
    let roster = match require_roster(state, req) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let interval = match parse_interval(&req.params) {
        Ok(i) => i,
        Err(error) => return error.response(&req.id),
    };
    let granularity = match req.params.get("granularity").and_then(|v| v.as_str()) {
        None => Granularity::Day,
        Some(s) => match Granularity::parse(s) {
            Some(g) => g,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "granularity must be one of day, week, month, year",
                    None,
                )
            }
        },
    };
    let mode = match req.params.get("mode").and_then(|v| v.as_str()) {
        None => SeriesMode::Each,
        Some(s) => match SeriesMode::parse(s) {
            Some(m) => m,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "mode must be each or average",
                    None,
                )
            }
        },
    };
    let series = bucketed_series(roster, interval.as_ref(), granularity, mode, &state.locale);
    match serde_json::to_value(&series) {
        Ok(result) => ok(&req.id, result),
        Err(e) => err(&req.id, "serialize_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.summary" => Some(handle_stats_summary(state, req)),
        "stats.compare" => Some(handle_stats_compare(state, req)),
        "stats.series" => Some(handle_stats_series(state, req)),
        _ => None,
    }
}
