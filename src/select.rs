use crate::datekey::{decode_key, in_inclusive_range, DateInterval};
use crate::roster::Roster;
use chrono::NaiveDate;

/// One absence record that fell inside the selected interval, flattened out
/// of its student. `student_idx` indexes into the roster the selection was
/// built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selected {
    pub student_idx: usize,
    pub date: NaiveDate,
    pub justified: bool,
}

/// Flattens the roster into the records whose decoded date falls inside the
/// interval. `None` means "no selection" and yields an empty output, as does
/// an inverted interval. Records with undecodable keys are skipped silently;
/// dirty entries must degrade to "no data", never abort a report.
///
/// Output preserves roster order (students in roster order, each student's
/// records in stored order) so downstream first-seen tie-breaks are
/// deterministic.
pub fn select_in_range(roster: &Roster, interval: Option<&DateInterval>) -> Vec<Selected> {
    let Some(interval) = interval else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (student_idx, student) in roster.students.iter().enumerate() {
        for record in &student.absences {
            let Some(date) = decode_key(&record.date_key) else {
                continue;
            };
            if in_inclusive_range(date, interval) {
                out.push(Selected {
                    student_idx,
                    date,
                    justified: record.justified,
                });
            }
        }
    }
    out
}
