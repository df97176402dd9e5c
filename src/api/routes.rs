use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::latency::LatencySnapshot;
use crate::charts::{chart_set, ChartSet};
use crate::config::ChartColors;
use crate::error::AppError;
use crate::export::{export_filename, to_csv};
use crate::search;
use crate::state::{Dashboard, RunOutcome};
use crate::types::{AnalysisResult, CampaignVariantRecord, ResultOrigin};

#[derive(Clone)]
pub struct ApiState {
    pub dashboard: Arc<Dashboard>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/analysis", get(get_analysis))
        .route("/analysis/run", post(run_analysis))
        .route("/analysis/campaigns", get(get_campaigns))
        .route("/analysis/charts", get(get_charts))
        .route("/analysis/export", get(export_campaigns))
        .route("/config", get(get_config))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CampaignsQuery {
    pub q: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct RunResponse {
    pub status: &'static str,
    pub origin: ResultOrigin,
    pub result: AnalysisResult,
}

#[derive(Serialize)]
pub struct CampaignsResponse {
    pub total: usize,
    pub matched: usize,
    pub campaigns: Vec<CampaignVariantRecord>,
}

#[derive(Serialize)]
pub struct ConfigResponse {
    pub chart_colors: ChartColors,
    pub analysis_timeout_ms: u64,
    pub storage_key: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub analysis_running: bool,
    pub has_result: bool,
    pub last_run_at_ms: Option<u64>,
    pub runs_completed: u64,
    pub runs_failed: u64,
    pub sample_fallbacks: u64,
    pub last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn current(state: &ApiState) -> Result<Arc<AnalysisResult>, AppError> {
    state.dashboard.current().ok_or(AppError::NoResult)
}

async fn get_analysis(State(state): State<ApiState>) -> Result<Json<AnalysisResult>, AppError> {
    let result = current(&state)?;
    Ok(Json(result.as_ref().clone()))
}

/// The run is detached from the request so a dropped client cannot cancel it.
async fn run_analysis(State(state): State<ApiState>) -> Result<Json<RunResponse>, AppError> {
    let dashboard = Arc::clone(&state.dashboard);
    let outcome = tokio::spawn(async move { dashboard.run_analysis().await }).await??;

    match outcome {
        RunOutcome::Completed { origin, result } => Ok(Json(RunResponse {
            status: "completed",
            origin,
            result: result.as_ref().clone(),
        })),
        RunOutcome::AlreadyRunning => Err(AppError::AnalysisInProgress),
    }
}

async fn get_campaigns(
    State(state): State<ApiState>,
    Query(params): Query<CampaignsQuery>,
) -> Result<Json<CampaignsResponse>, AppError> {
    let result = current(&state)?;
    let query = params.q.unwrap_or_default();
    let campaigns: Vec<CampaignVariantRecord> = search::filter(&result.campaigns, &query)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(CampaignsResponse {
        total: result.campaigns.len(),
        matched: campaigns.len(),
        campaigns,
    }))
}

async fn get_charts(State(state): State<ApiState>) -> Result<Json<ChartSet>, AppError> {
    let result = current(&state)?;
    Ok(Json(chart_set(&result, &state.dashboard.config().chart_colors)))
}

async fn export_campaigns(State(state): State<ApiState>) -> Result<impl IntoResponse, AppError> {
    let result = current(&state)?;
    let filename = export_filename(chrono::Utc::now().date_naive());
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, to_csv(&result)))
}

async fn get_config(State(state): State<ApiState>) -> Json<ConfigResponse> {
    let cfg = state.dashboard.config();
    Json(ConfigResponse {
        chart_colors: cfg.chart_colors.clone(),
        analysis_timeout_ms: cfg.analysis_timeout_ms,
        storage_key: cfg.storage_key.clone(),
    })
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let dashboard = &state.dashboard;
    let health = &dashboard.health;
    let last_run = health.last_run_at_ms();
    Json(HealthResponse {
        analysis_running: health.analysis_running(),
        has_result: dashboard.current().is_some(),
        last_run_at_ms: (last_run > 0).then_some(last_run),
        runs_completed: health.runs_completed(),
        runs_failed: health.runs_failed(),
        sample_fallbacks: health.sample_fallbacks(),
        last_error: health.last_error(),
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencySnapshot> {
    Json(state.dashboard.latency.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::store::memory_pool;
    use crate::db::ResultStore;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn api_with_webhook(hook: Router) -> String {
        let hook_base = serve(hook).await;
        let cfg = Config {
            webhook_url: format!("{hook_base}/hook"),
            analysis_timeout_ms: 5_000,
            ..Config::default()
        };
        let store = ResultStore::new(memory_pool().await, cfg.storage_key.clone());
        let dashboard = Arc::new(Dashboard::new(cfg, store).unwrap());
        serve(router(ApiState { dashboard })).await
    }

    fn rows() -> Value {
        json!([
            {"Campaign": "spring", "Variant": "A", "Subject_Line": "Quick, question", "Sent": 100, "Opened": 60, "Verdict": "winner"},
            {"Campaign": "spring", "Variant": "B", "Subject_Line": "Hello there", "Sent": 100, "Opened": 40, "Verdict": "loser"}
        ])
    }

    #[tokio::test]
    async fn analysis_is_404_before_first_run() {
        let base = api_with_webhook(Router::new()).await;
        let resp = reqwest::get(format!("{base}/analysis")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let health: Value = reqwest::get(format!("{base}/health")).await.unwrap().json().await.unwrap();
        assert_eq!(health["has_result"], false);
        assert_eq!(health["last_run_at_ms"], Value::Null);
    }

    #[tokio::test]
    async fn run_then_read_back() {
        let hook = Router::new().route("/hook", post(|| async { Json(rows()) }));
        let base = api_with_webhook(hook).await;
        let client = reqwest::Client::new();

        let run: Value = client
            .post(format!("{base}/analysis/run"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(run["status"], "completed");
        assert_eq!(run["origin"], "webhook");
        assert_eq!(run["result"]["totalVariants"], 2);
        assert_eq!(run["result"]["averageOpenRate"], 50.0);

        let current: Value = client.get(format!("{base}/analysis")).send().await.unwrap().json().await.unwrap();
        assert_eq!(current, run["result"]);

        let filtered: Value = client
            .get(format!("{base}/analysis/campaigns?q=hello"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(filtered["total"], 2);
        assert_eq!(filtered["matched"], 1);
        assert_eq!(filtered["campaigns"][0]["variant"], "B");

        let charts: Value = client.get(format!("{base}/analysis/charts")).send().await.unwrap().json().await.unwrap();
        assert_eq!(charts["verdicts"].as_array().unwrap().len(), 2);
        assert_eq!(charts["verdicts"][0]["label"], "Winner");

        let latency: Value = client.get(format!("{base}/stats/latency")).send().await.unwrap().json().await.unwrap();
        assert_eq!(latency["sample_count"], 1);
        assert!(latency["p50_ms"].is_u64());
    }

    #[tokio::test]
    async fn export_is_csv_attachment() {
        let hook = Router::new().route("/hook", post(|| async { Json(rows()) }));
        let base = api_with_webhook(hook).await;
        let client = reqwest::Client::new();
        client.post(format!("{base}/analysis/run")).send().await.unwrap();

        let resp = client.get(format!("{base}/analysis/export")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment; filename=\"campaign-analysis-"));
        assert!(disposition.ends_with(".csv\""));
        let body = resp.text().await.unwrap();
        assert_eq!(body.lines().count(), 3);
        assert!(body.lines().nth(1).unwrap().contains(",\"Quick, question\","));
    }

    #[tokio::test]
    async fn webhook_failure_is_bad_gateway() {
        let hook = Router::new().route("/hook", post(|| async { StatusCode::NOT_FOUND }));
        let base = api_with_webhook(hook).await;
        let client = reqwest::Client::new();

        let resp = client.post(format!("{base}/analysis/run")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let health: Value = client.get(format!("{base}/health")).send().await.unwrap().json().await.unwrap();
        assert_eq!(health["analysis_running"], false);
        assert_eq!(health["runs_failed"], 1);
        assert!(health["last_error"].as_str().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn config_exposes_chart_colors() {
        let base = api_with_webhook(Router::new()).await;
        let cfg: Value = reqwest::get(format!("{base}/config")).await.unwrap().json().await.unwrap();
        assert_eq!(cfg["chart_colors"]["success"], "#22c55e");
        assert_eq!(cfg["analysis_timeout_ms"], 5_000);
    }
}
