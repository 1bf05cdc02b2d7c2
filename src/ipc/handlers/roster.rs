use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::{load_roster_file, normalize_students};
use serde_json::json;
use std::path::PathBuf;

struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl HandlerErr {
    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: format!("missing {}", key),
            details: None,
        })
}

fn handle_roster_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match get_required_str(&req.params, "path") {
        Ok(p) => PathBuf::from(p),
        Err(error) => return error.response(&req.id),
    };
    match load_roster_file(&path) {
        Ok(roster) => {
            let count = roster.len();
            state.roster = Some(roster);
            ok(&req.id, json!({ "studentCount": count }))
        }
        Err(e) => err(
            &req.id,
            "roster_load_failed",
            format!("{e:#}"),
            Some(json!({ "path": path.to_string_lossy() })),
        ),
    }
}

fn handle_roster_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(rows) = req.params.get("students").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing students array", None);
    };
    let roster = normalize_students(rows);
    let count = roster.len();
    state.roster = Some(roster);
    ok(&req.id, json!({ "studentCount": count }))
}

fn handle_roster_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_ref() else {
        return err(&req.id, "no_roster", "load a roster first", None);
    };
    let students = serde_json::to_value(&roster.students).unwrap_or_else(|_| json!([]));
    ok(&req.id, json!({ "students": students }))
}

fn handle_roster_filter(state: &mut AppState, req: &Request) -> serde_json::Value {
    let query = match get_required_str(&req.params, "query") {
        Ok(q) => q,
        Err(error) => return error.response(&req.id),
    };
    let Some(roster) = state.roster.as_ref() else {
        return err(&req.id, "no_roster", "load a roster first", None);
    };
    let request_id = state.filter.submit(&query, &roster.students);
    // Superseded only when a newer request finishes first; within one IPC
    // turn we issued the newest id, so an empty match list is the safe
    // degradation.
    let matches = state.filter.wait_for(request_id).unwrap_or_default();
    let students: Vec<serde_json::Value> = matches
        .iter()
        .filter_map(|&idx| roster.students.get(idx))
        .map(|s| serde_json::to_value(s).unwrap_or_else(|_| json!({})))
        .collect();
    ok(
        &req.id,
        json!({
            "requestId": request_id,
            "students": students
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.load" => Some(handle_roster_load(state, req)),
        "roster.set" => Some(handle_roster_set(state, req)),
        "roster.list" => Some(handle_roster_list(state, req)),
        "roster.filter" => Some(handle_roster_filter(state, req)),
        _ => None,
    }
}
