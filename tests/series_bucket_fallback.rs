
use serde_json::json;
use test_support::{request_ok, spawn_sidecar};

fn school_week_students() -> serde_json::Value {
    // 2025-09-01 is a Monday; all dates are weekdays.
    json!([
        {
            "id": "s1",
            "classroom": "7A",
            "absences": [
                { "date": "01-09-25", "justified": true },
                { "date": "01-09-25", "justified": false },
                { "date": "03-09-25", "justified": false }
            ]
        },
        {
            "id": "s2",
            "classroom": "7F",
            "absences": [{ "date": "05-09-25", "justified": false }]
        }
    ])
}

#[test]
fn weekday_series_conserves_totals_and_uses_spanish_labels() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.set",
        json!({ "students": school_week_students() }),
    );
    let series = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "stats.series",
        json!({ "from": "2025-09-01", "to": "2025-09-05", "granularity": "day", "mode": "each" }),
    );
    assert_eq!(series.get("granularity"), Some(&json!("day")));
    let buckets = series
        .get("buckets")
        .and_then(|v| v.as_array())
        .cloned()
        .expect("buckets");
    let labels: Vec<&str> = buckets
        .iter()
        .filter_map(|b| b.get("label").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(labels, vec!["lun", "mié", "vie"]);

    let bucket_sum: f64 = buckets
        .iter()
        .filter_map(|b| b.get("total").and_then(|v| v.as_f64()))
        .sum();
    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "stats.summary",
        json!({ "from": "2025-09-01", "to": "2025-09-05" }),
    );
    let total = summary
        .get("totalAbsences")
        .and_then(|v| v.as_f64())
        .expect("totalAbsences");
    assert_eq!(bucket_sum, total);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn average_mode_divides_by_contributing_days() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    // Two Mondays: one with two records, one with a single record.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.set",
        json!({ "students": [{
            "id": "s1",
            "classroom": "7A",
            "absences": [
                { "date": "01-09-25", "justified": false },
                { "date": "01-09-25", "justified": false },
                { "date": "08-09-25", "justified": false }
            ]
        }] }),
    );
    let series = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "stats.series",
        json!({ "from": "2025-09-01", "to": "2025-09-14", "granularity": "day", "mode": "average" }),
    );
    let buckets = series
        .get("buckets")
        .and_then(|v| v.as_array())
        .cloned()
        .expect("buckets");
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].get("label"), Some(&json!("lun")));
    // 3 records over 2 contributing Mondays, not 3/3.
    assert_eq!(buckets[0].get("total").and_then(|v| v.as_f64()), Some(1.5));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn unavailable_granularity_falls_back_in_preference_order() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    // 06-09-25 is a Saturday: no weekday bucket can form.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.set",
        json!({ "students": [{
            "id": "s1",
            "classroom": "7A",
            "absences": [{ "date": "06-09-25", "justified": false }]
        }] }),
    );
    let series = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "stats.series",
        json!({ "from": "2025-09-06", "to": "2025-09-07", "granularity": "day" }),
    );
    assert_eq!(series.get("granularity"), Some(&json!("week")));
    let available = series
        .get("available")
        .and_then(|v| v.as_array())
        .cloned()
        .expect("available");
    assert!(!available.contains(&json!("day")));
    assert!(available.contains(&json!("week")));
    let buckets = series
        .get("buckets")
        .and_then(|v| v.as_array())
        .map(|a| a.len());
    assert_eq!(buckets, Some(1));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn month_and_year_series_group_chronologically() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.set",
        json!({ "students": [{
            "id": "s1",
            "classroom": "7A",
            "absences": [
                { "date": "01-09-25", "justified": false },
                { "date": "01-10-25", "justified": false },
                { "date": "02-10-25", "justified": true }
            ]
        }] }),
    );
    let months = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "stats.series",
        json!({ "from": "2025-09-01", "to": "2025-10-31", "granularity": "month" }),
    );
    let labels: Vec<String> = months
        .get("buckets")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
        .iter()
        .filter_map(|b| b.get("label").and_then(|v| v.as_str()).map(String::from))
        .collect();
    assert_eq!(labels, vec!["sep 25", "oct 25"]);

    let years = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "stats.series",
        json!({ "from": "2025-09-01", "to": "2025-10-31", "granularity": "year" }),
    );
    let year_buckets = years
        .get("buckets")
        .and_then(|v| v.as_array())
        .cloned()
        .expect("year buckets");
    assert_eq!(year_buckets.len(), 1);
    assert_eq!(year_buckets[0].get("label"), Some(&json!("2025")));
    assert_eq!(
        year_buckets[0].get("total").and_then(|v| v.as_f64()),
        Some(3.0)
    );
    assert_eq!(
        year_buckets[0].get("justified").and_then(|v| v.as_f64()),
        Some(1.0)
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn empty_selection_yields_empty_series() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.set",
        json!({ "students": school_week_students() }),
    );
    let series = request_ok(&mut stdin, &mut reader, "2", "stats.series", json!({}));
    assert_eq!(
        series
            .get("buckets")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(0)
    );
    assert_eq!(
        series
            .get("available")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(0)
    );

    drop(stdin);
    let _ = child.wait();
}
