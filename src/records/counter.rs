//! Sequential id allocation for reports and reviews.
//!
//! Two independent counters, checkpointed to `counters.json` in the data
//! directory. A missing or unreadable checkpoint falls back to starting at 1
//! with a logged warning; it never takes the allocator down.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const COUNTERS_FILE: &str = "counters.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CounterState {
    next_report_id: u64,
    next_review_id: u64,
}

impl Default for CounterState {
    fn default() -> Self {
        Self {
            next_report_id: 1,
            next_review_id: 1,
        }
    }
}

/// Issues strictly increasing report and review ids.
pub struct IdAllocator {
    path: PathBuf,
    state: Mutex<CounterState>,
}

impl IdAllocator {
    /// Load the checkpoint from `data_dir`, defaulting both counters to 1.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(COUNTERS_FILE);
        let state = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<CounterState>(&bytes) {
                Ok(state) => state,
                Err(e) => {
                    log::warn!(
                        "Counter checkpoint {:?} is unreadable ({}); starting from 1",
                        path,
                        e
                    );
                    CounterState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CounterState::default(),
            Err(e) => {
                log::warn!(
                    "Could not open counter checkpoint {:?} ({}); starting from 1",
                    path,
                    e
                );
                CounterState::default()
            }
        };
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    /// A previously-unused report id.
    pub fn next_report_id(&self) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_report_id;
        state.next_report_id += 1;
        id
    }

    /// A previously-unused review id.
    pub fn next_review_id(&self) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_review_id;
        state.next_review_id += 1;
        id
    }

    /// Write the current next-values to the checkpoint file.
    ///
    /// Called on clean shutdown; calling it more often only narrows the
    /// window in which a crash skips ids.
    pub fn flush(&self) -> std::io::Result<()> {
        let state = self.state.lock().unwrap().clone();
        let json = serde_json::to_vec_pretty(&state)?;
        std::fs::write(&self.path, json)
    }
}
