//! Shared health state for the /health endpoint.
//! Updated by the analysis pipeline, read by the API.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Shared health metrics.
#[derive(Default)]
pub struct HealthState {
    /// True while an analysis run is in flight.
    pub analysis_running: AtomicBool,
    /// Millisecond timestamp of the last completed run (0 = none).
    pub last_run_at_ms: AtomicU64,
    pub runs_completed: AtomicU64,
    pub runs_failed: AtomicU64,
    /// Runs that fell back to the sample dataset.
    pub sample_fallbacks: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_analysis_running(&self, v: bool) {
        self.analysis_running.store(v, Ordering::Relaxed);
    }

    pub fn record_success(&self, at_ms: u64, used_sample: bool) {
        self.last_run_at_ms.store(at_ms, Ordering::Relaxed);
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        if used_sample {
            self.sample_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
        if let Ok(mut e) = self.last_error.lock() {
            *e = None;
        }
    }

    pub fn record_failure(&self, message: String) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut e) = self.last_error.lock() {
            *e = Some(message);
        }
    }

    pub fn analysis_running(&self) -> bool {
        self.analysis_running.load(Ordering::Relaxed)
    }

    pub fn last_run_at_ms(&self) -> u64 {
        self.last_run_at_ms.load(Ordering::Relaxed)
    }

    pub fn runs_completed(&self) -> u64 {
        self.runs_completed.load(Ordering::Relaxed)
    }

    pub fn runs_failed(&self) -> u64 {
        self.runs_failed.load(Ordering::Relaxed)
    }

    pub fn sample_fallbacks(&self) -> u64 {
        self.sample_fallbacks.load(Ordering::Relaxed)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|e| e.clone())
    }
}
