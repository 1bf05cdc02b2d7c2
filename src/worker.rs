use crate::roster::Student;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

/// Case-insensitive free-text match over the fields the roster table shows.
/// An empty query matches everything.
pub fn filter_students(students: &[Student], query: &str) -> Vec<usize> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return (0..students.len()).collect();
    }
    students
        .iter()
        .enumerate()
        .filter(|(_, s)| {
            s.id.to_lowercase().contains(&needle)
                || s.classroom
                    .as_deref()
                    .map(|c| c.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        })
        .map(|(idx, _)| idx)
        .collect()
}

struct FilterRequest {
    id: u64,
    query: String,
    students: Vec<Student>,
}

#[derive(Debug)]
pub struct FilterResult {
    pub id: u64,
    pub matches: Vec<usize>,
}

/// Offloads row filtering to a dedicated thread so a large roster cannot
/// stall the caller. Requests carry a monotonically increasing id; any
/// result tagged older than the newest issued id is stale and gets dropped
/// (last-request-wins, there is no true cancellation). The worker also
/// drains its inbox before computing, so superseded requests may never be
/// evaluated at all.
pub struct FilterWorker {
    tx: Option<Sender<FilterRequest>>,
    rx: Receiver<FilterResult>,
    next_id: u64,
    handle: Option<JoinHandle<()>>,
}

impl FilterWorker {
    pub fn spawn() -> Self {
        let (req_tx, req_rx) = mpsc::channel::<FilterRequest>();
        let (res_tx, res_rx) = mpsc::channel::<FilterResult>();
        let handle = std::thread::spawn(move || {
            while let Ok(mut req) = req_rx.recv() {
                // Keep only the newest queued request.
                while let Ok(newer) = req_rx.try_recv() {
                    req = newer;
                }
                let matches = filter_students(&req.students, &req.query);
                if res_tx.send(FilterResult { id: req.id, matches }).is_err() {
                    break;
                }
            }
        });
        Self {
            tx: Some(req_tx),
            rx: res_rx,
            next_id: 0,
            handle: Some(handle),
        }
    }

    /// Queues a filter pass over a snapshot of the roster and returns the
    /// issued request id.
    pub fn submit(&mut self, query: &str, students: &[Student]) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        if let Some(tx) = &self.tx {
            let _ = tx.send(FilterRequest {
                id,
                query: query.to_string(),
                students: students.to_vec(),
            });
        }
        id
    }

    /// Blocks until the result for `id` arrives, discarding stale results
    /// along the way. Returns `None` if the worker has gone away or the
    /// request was superseded before it was evaluated.
    pub fn wait_for(&self, id: u64) -> Option<Vec<usize>> {
        while let Ok(result) = self.rx.recv() {
            if result.id == id {
                return Some(result.matches);
            }
            if result.id > id {
                // A newer request already finished; ours was superseded.
                return None;
            }
            // result.id < id: stale, drop and keep waiting.
        }
        None
    }
}

impl Drop for FilterWorker {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
