//! Round-trip timing of webhook triggers, served on `/stats/latency`.

use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;

use crate::error::{AppError, Result};

/// Point-in-time view of the recorded trigger round trips, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LatencySnapshot {
    pub p50_ms: Option<u64>,
    pub p95_ms: Option<u64>,
    pub p99_ms: Option<u64>,
    pub max_ms: Option<u64>,
    pub sample_count: u64,
}

pub struct WebhookLatency {
    histogram: Mutex<Histogram<u64>>,
}

impl WebhookLatency {
    /// `ceiling_ms` is the longest trackable round trip; the analysis
    /// timeout bounds it. Longer samples are clamped.
    pub fn new(ceiling_ms: u64) -> Result<Self> {
        let histogram = Histogram::new_with_max(ceiling_ms.max(2), 3)
            .map_err(|e| AppError::Config(format!("latency histogram: {e:?}")))?;
        Ok(Self {
            histogram: Mutex::new(histogram),
        })
    }

    pub fn record(&self, elapsed: Duration) {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX).max(1);
        if let Ok(mut h) = self.histogram.lock() {
            let clamped = ms.min(h.high());
            let _ = h.record(clamped);
        }
    }

    pub fn snapshot(&self) -> LatencySnapshot {
        let Ok(h) = self.histogram.lock() else {
            return LatencySnapshot::default();
        };
        if h.is_empty() {
            return LatencySnapshot::default();
        }
        LatencySnapshot {
            p50_ms: Some(h.value_at_quantile(0.5)),
            p95_ms: Some(h.value_at_quantile(0.95)),
            p99_ms: Some(h.value_at_quantile(0.99)),
            max_ms: Some(h.max()),
            sample_count: h.len(),
        }
    }
}
