use crate::buckets::BucketLocale;
use crate::roster::Roster;
use crate::worker::FilterWorker;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    /// The session's loaded roster. The engine itself stays pure and takes
    /// roster + interval as arguments; this is the caller-side cache of the
    /// current selection inputs.
    pub roster: Option<Roster>,
    pub locale: BucketLocale,
    pub filter: FilterWorker,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            roster: None,
            locale: BucketLocale::default(),
            filter: FilterWorker::spawn(),
        }
    }
}
