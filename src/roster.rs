use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One recorded absence for one student. The raw `dd-mm-yy` key is kept as
/// stored; decoding happens at selection time so a malformed key degrades to
/// "no data for this record" instead of poisoning the whole roster.
///
/// Duplicate (student, date) pairs are preserved and counted independently.
/// The upstream data source occasionally emits them; collapsing them here
/// would silently change reported totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceRecord {
    pub date_key: String,
    pub justified: bool,
}

/// Canonical student shape. Produced once by [`normalize_students`]; the
/// aggregation engine never probes alternate field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    /// Grade + letter label, e.g. "7F". Absent when the source row carries
    /// no classroom assignment.
    pub classroom: Option<String>,
    pub absences: Vec<AbsenceRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub students: Vec<Student>,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

fn probe_str(obj: &serde_json::Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = obj.get(key).and_then(|v| v.as_str()) {
            let t = s.trim();
            if !t.is_empty() {
                return Some(t.to_string());
            }
        }
        // Numeric ids are common in exported rosters.
        if let Some(n) = obj.get(key).and_then(|v| v.as_i64()) {
            return Some(n.to_string());
        }
    }
    None
}

fn normalize_record(raw: &serde_json::Value) -> Option<AbsenceRecord> {
    let date_key = probe_str(raw, &["date", "fecha"])?;
    let justified = ["justified", "justificada"]
        .iter()
        .find_map(|k| raw.get(*k).and_then(|v| v.as_bool()))
        .unwrap_or(false);
    Some(AbsenceRecord {
        date_key,
        justified,
    })
}

fn normalize_student(raw: &serde_json::Value) -> Option<Student> {
    // Identifier fallback chain from the source exports: id, then national
    // id, then email. Rows with none of the three are dropped.
    let id = probe_str(raw, &["id", "dni", "email"])?;
    let classroom = probe_str(raw, &["classroom", "curso", "division"]);
    let absences = raw
        .get("absences")
        .or_else(|| raw.get("inasistencias"))
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(normalize_record).collect())
        .unwrap_or_default();
    Some(Student {
        id,
        classroom,
        absences,
    })
}

/// One-shot normalization of raw roster rows into the canonical shape.
/// Rows that are not objects or carry no usable identifier are skipped.
pub fn normalize_students(raw: &[serde_json::Value]) -> Roster {
    let students = raw
        .iter()
        .filter(|v| v.is_object())
        .filter_map(normalize_student)
        .collect();
    Roster { students }
}

/// Loads a roster from a JSON file holding either a top-level array of
/// student rows or an object with a `students` array.
pub fn load_roster_file(path: &Path) -> Result<Roster> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read roster file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parse roster json {}", path.display()))?;
    let rows = value
        .as_array()
        .or_else(|| value.get("students").and_then(|v| v.as_array()))
        .context("roster json must be an array or an object with a students array")?;
    Ok(normalize_students(rows))
}
