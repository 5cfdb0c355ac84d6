//! Toggleable, append-only log of received requests.

use crate::request::Request;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// One received request and its arrival order.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Arrival order within the session, starting at 0
    pub sequence: u64,
    pub received_at: DateTime<Utc>,
    pub request: Arc<Request>,
}

#[derive(Debug)]
struct HistoryState {
    entries: Vec<RecordedRequest>,
    recording: bool,
    /// Set once recording is switched off; cleared only by `reset`
    disabled_once: bool,
    next_sequence: u64,
}

/// Request history shared by every dispatching thread.
///
/// A single mutex guards the entries and the recording flag together, so a
/// request is either fully recorded or not at all relative to a toggle.
#[derive(Debug)]
pub struct RequestHistory {
    state: Mutex<HistoryState>,
}

impl Default for RequestHistory {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RequestHistory {
    pub fn new(recording: bool) -> Self {
        Self {
            state: Mutex::new(HistoryState {
                entries: Vec::new(),
                recording,
                disabled_once: !recording,
                next_sequence: 0,
            }),
        }
    }

    /// Append `request` if recording is enabled. Returns whether it was recorded.
    pub fn record(&self, request: Arc<Request>) -> bool {
        let mut state = self.state.lock();
        if !state.recording {
            return false;
        }
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.entries.push(RecordedRequest {
            sequence,
            received_at: Utc::now(),
            request,
        });
        true
    }

    pub fn set_recording_enabled(&self, enabled: bool) {
        let mut state = self.state.lock();
        if state.recording != enabled {
            info!(
                "Request recording {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        state.recording = enabled;
        if !enabled {
            state.disabled_once = true;
        }
    }

    pub fn is_recording_enabled(&self) -> bool {
        self.state.lock().recording
    }

    /// Whether recording has been off at any point since creation or the last reset.
    pub fn was_ever_disabled(&self) -> bool {
        self.state.lock().disabled_once
    }

    /// Consistent point-in-time copy of the entries, in arrival order.
    pub fn snapshot(&self) -> Vec<RecordedRequest> {
        self.state.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and re-arm verification.
    ///
    /// The recording flag is kept; if it is currently off, verification stays
    /// unavailable until recording is enabled and the history reset again.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        state.next_sequence = 0;
        state.disabled_once = !state.recording;
        info!("Request history reset ({} entries dropped)", dropped);
    }
}
