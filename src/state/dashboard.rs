use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::{error, info, warn};

use crate::api::health::HealthState;
use crate::api::latency::WebhookLatency;
use crate::config::Config;
use crate::db::ResultStore;
use crate::error::Result;
use crate::normalizer::normalize_or_sample;
use crate::trigger::WebhookTrigger;
use crate::types::{AnalysisResult, ResultOrigin};

/// Outcome of a run request.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed {
        origin: ResultOrigin,
        result: Arc<AnalysisResult>,
    },
    /// Another run was already in flight; nothing was done.
    AlreadyRunning,
}

/// Application state owned by the API layer: the current result, its
/// persisted copy, and the single in-flight guard.
pub struct Dashboard {
    cfg: Config,
    trigger: WebhookTrigger,
    store: ResultStore,
    current: RwLock<Option<Arc<AnalysisResult>>>,
    in_flight: AtomicBool,
    pub health: HealthState,
    pub latency: WebhookLatency,
}

/// Clears the in-flight flag on every exit path of a run.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    health: &'a HealthState,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.health.set_analysis_running(false);
    }
}

impl Dashboard {
    pub fn new(cfg: Config, store: ResultStore) -> Result<Self> {
        let trigger = WebhookTrigger::new(&cfg)?;
        let latency = WebhookLatency::new(cfg.analysis_timeout_ms)?;
        Ok(Self {
            cfg,
            trigger,
            store,
            current: RwLock::new(None),
            in_flight: AtomicBool::new(false),
            health: HealthState::new(),
            latency,
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn current(&self) -> Option<Arc<AnalysisResult>> {
        self.current.read().ok().and_then(|c| c.clone())
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Load the persisted result, if any, as the current one.
    pub async fn restore(&self) -> Result<bool> {
        match self.store.load().await? {
            Some(result) => {
                info!(
                    variants = result.total_variants,
                    last_run = %result.last_run,
                    "Restored stored analysis with {} variants",
                    result.total_variants,
                );
                self.replace(Arc::new(result));
                Ok(true)
            }
            None => {
                info!("No stored analysis to restore");
                Ok(false)
            }
        }
    }

    /// Trigger, normalize, persist and swap in a new result.
    ///
    /// A second call while one is pending returns `AlreadyRunning` without
    /// queueing. Trigger failures leave the previous result in place.
    pub async fn run_analysis(&self) -> Result<RunOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Analysis already in progress - ignoring request");
            return Ok(RunOutcome::AlreadyRunning);
        }
        self.health.set_analysis_running(true);
        let _guard = InFlightGuard {
            flag: &self.in_flight,
            health: &self.health,
        };

        info!(url = %self.trigger.url(), "Starting analysis run");
        let resp = match self.trigger.trigger_analysis().await {
            Ok(r) => r,
            Err(e) => {
                error!(
                    event = "ANALYSIS_FAILED",
                    retryable = e.is_retryable(),
                    "Analysis run failed: {e}"
                );
                self.health.record_failure(e.to_string());
                return Err(e);
            }
        };
        self.latency.record(resp.elapsed);

        let (result, origin) = normalize_or_sample(&resp.body);
        if let Err(e) = self.store.save(&result).await {
            warn!(key = %self.store.key(), "Failed to persist analysis result: {e}");
        }

        let result = Arc::new(result);
        self.replace(Arc::clone(&result));
        self.health.record_success(
            Utc::now().timestamp_millis().max(0) as u64,
            origin == ResultOrigin::Sample,
        );

        info!(
            event = "ANALYSIS_COMPLETE",
            origin = %origin,
            campaigns = result.total_campaigns,
            variants = result.total_variants,
            total_sent = result.total_sent,
            "ANALYSIS COMPLETE | origin: {} | campaigns: {} | variants: {} | avg open: {}% | avg reply: {}%",
            origin,
            result.total_campaigns,
            result.total_variants,
            result.average_open_rate,
            result.average_reply_rate,
        );

        Ok(RunOutcome::Completed { origin, result })
    }

    fn replace(&self, result: Arc<AnalysisResult>) {
        match self.current.write() {
            Ok(mut current) => *current = Some(result),
            Err(poisoned) => *poisoned.into_inner() = Some(result),
        }
    }
}
