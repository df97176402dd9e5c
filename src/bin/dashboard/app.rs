use chrono::{DateTime, Local, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::oneshot;

// ---------------------------------------------------------------------------
// API response types (mirror routes.rs shapes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub total_campaigns: u64,
    pub total_variants: u64,
    pub average_open_rate: f64,
    pub average_reply_rate: f64,
    pub total_sent: u64,
    pub last_run: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct RecordResponse {
    pub source: String,
    pub platform: String,
    pub campaign: String,
    pub variable_tested: String,
    pub variant: String,
    pub subject_line: String,
    pub sent: u64,
    pub opened: u64,
    pub replies: u64,
    pub open_rate: f64,
    pub reply_rate: f64,
    pub wilson_low: f64,
    pub wilson_high: f64,
    pub prob_above_70: f64,
    pub prob_best: f64,
    pub verdict: String,
    pub action: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CampaignsResponse {
    pub total: usize,
    pub matched: usize,
    pub campaigns: Vec<RecordResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct VerdictSlice {
    pub verdict: String,
    pub label: String,
    pub count: usize,
    pub color: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChartsResponse {
    pub verdicts: Vec<VerdictSlice>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[allow(dead_code)]
pub struct HealthResponse {
    pub analysis_running: bool,
    pub has_result: bool,
    pub last_run_at_ms: Option<u64>,
    pub runs_completed: u64,
    pub runs_failed: u64,
    pub sample_fallbacks: u64,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunResponse {
    pub origin: String,
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Error(String),
    Connecting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Banner {
    Success(String),
    Info(String),
    /// Retryable failure; the user can press `a` again.
    Error(String),
}

/// Result of a detached run request, delivered back to the event loop.
pub type RunResult = Result<RunResponse, RunFailure>;

#[derive(Debug, Clone, PartialEq)]
pub enum RunFailure {
    AlreadyRunning,
    Failed(String),
}

pub struct AppState {
    pub status: ConnectionStatus,
    pub analysis: Option<AnalysisResponse>,
    pub campaigns: CampaignsResponse,
    pub verdicts: Vec<VerdictSlice>,
    pub health: HealthResponse,
    pub search: String,
    pub search_mode: bool,
    pub banner: Option<Banner>,
    /// Set while our own run request is outstanding.
    pub pending_run: Option<oneshot::Receiver<RunResult>>,
    pub base_url: String,
}

impl AppState {
    pub fn new(base_url: String) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            analysis: None,
            campaigns: CampaignsResponse::default(),
            verdicts: Vec::new(),
            health: HealthResponse::default(),
            search: String::new(),
            search_mode: false,
            banner: None,
            pending_run: None,
            base_url,
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending_run.is_some() || self.health.analysis_running
    }

    pub async fn refresh(&mut self, client: &reqwest::Client) {
        let analysis_url = format!("{}/analysis", self.base_url);
        let health_url = format!("{}/health", self.base_url);

        let (analysis_res, health_res) = tokio::join!(
            client.get(&analysis_url).send(),
            client.get(&health_url).send(),
        );

        let analysis_res = match analysis_res {
            Ok(r) => r,
            Err(e) => {
                self.status = ConnectionStatus::Error(format!("{e}"));
                return;
            }
        };

        if analysis_res.status() == StatusCode::NOT_FOUND {
            self.analysis = None;
            self.campaigns = CampaignsResponse::default();
            self.verdicts.clear();
        } else {
            match analysis_res.json::<AnalysisResponse>().await {
                Ok(a) => self.analysis = Some(a),
                Err(e) => {
                    self.status = ConnectionStatus::Error(format!("parse error: {e}"));
                    return;
                }
            }
            self.refresh_table(client).await;
            let charts_url = format!("{}/analysis/charts", self.base_url);
            if let Ok(resp) = client.get(&charts_url).send().await {
                if let Ok(charts) = resp.json::<ChartsResponse>().await {
                    self.verdicts = charts.verdicts;
                }
            }
        }

        if let Ok(h) = health_res {
            if let Ok(health) = h.json::<HealthResponse>().await {
                self.health = health;
            }
        }
        self.status = ConnectionStatus::Connected;
    }

    /// Re-fetch the campaigns table with the current search filter.
    pub async fn refresh_table(&mut self, client: &reqwest::Client) {
        let url = format!("{}/analysis/campaigns", self.base_url);
        let resp = client.get(&url).query(&[("q", self.search.as_str())]).send().await;
        if let Ok(resp) = resp {
            if resp.status().is_success() {
                if let Ok(campaigns) = resp.json::<CampaignsResponse>().await {
                    self.campaigns = campaigns;
                }
            }
        }
    }

    /// Fire a run request in the background. Ignored while one is pending.
    pub fn start_run(&mut self, client: &reqwest::Client) {
        if self.is_running() {
            return;
        }
        let (tx, rx) = oneshot::channel();
        let client = client.clone();
        let url = format!("{}/analysis/run", self.base_url);
        tokio::spawn(async move {
            let _ = tx.send(request_run(&client, &url).await);
        });
        self.pending_run = Some(rx);
        self.banner = Some(Banner::Info("Running analysis…".to_string()));
    }

    /// Collect a finished run, if any. Returns true when one completed.
    pub fn poll_run(&mut self) -> bool {
        let Some(rx) = self.pending_run.as_mut() else {
            return false;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return false,
            Err(oneshot::error::TryRecvError::Closed) => {
                Err(RunFailure::Failed("run task ended unexpectedly".to_string()))
            }
        };
        self.pending_run = None;
        self.banner = Some(run_banner(&outcome));
        true
    }

    /// Download the CSV export into `dir` under the server-chosen file name.
    pub async fn export(
        &mut self,
        client: &reqwest::Client,
        dir: &std::path::Path,
    ) -> Result<String, String> {
        let url = format!("{}/analysis/export", self.base_url);
        let resp = client.get(&url).send().await.map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("export failed: HTTP {}", resp.status().as_u16()));
        }
        let filename = resp
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_filename)
            .ok_or_else(|| "export response carried no file name".to_string())?;
        let body = resp.text().await.map_err(|e| e.to_string())?;
        tokio::fs::write(dir.join(&filename), body)
            .await
            .map_err(|e| e.to_string())?;
        Ok(filename)
    }
}

async fn request_run(client: &reqwest::Client, url: &str) -> RunResult {
    let resp = client
        .post(url)
        .send()
        .await
        .map_err(|e| RunFailure::Failed(e.to_string()))?;
    match resp.status() {
        s if s.is_success() => resp
            .json::<RunResponse>()
            .await
            .map_err(|e| RunFailure::Failed(e.to_string())),
        StatusCode::CONFLICT => Err(RunFailure::AlreadyRunning),
        s => {
            let detail = resp.text().await.unwrap_or_default();
            Err(RunFailure::Failed(format!("HTTP {}: {detail}", s.as_u16())))
        }
    }
}

pub fn run_banner(outcome: &RunResult) -> Banner {
    match outcome {
        Ok(run) if run.origin == "sample" => Banner::Info(
            "Analysis complete - webhook returned no usable data, showing sample data".to_string(),
        ),
        Ok(_) => Banner::Success("Analysis complete".to_string()),
        Err(RunFailure::AlreadyRunning) => {
            Banner::Info("An analysis is already running".to_string())
        }
        Err(RunFailure::Failed(detail)) => Banner::Error(format!(
            "Failed to run analysis. Please check your connection and try again. ({detail})"
        )),
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// `Sep 30, 2025 2:05 PM` in local time.
pub fn format_last_run(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%b %-d, %Y %-I:%M %p")
        .to_string()
}

/// Thousands-separated count: `12345` → `12,345`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_percent(v: f64) -> String {
    format!("{v}%")
}

pub fn truncate_text(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}

/// File name from `attachment; filename="x.csv"`, stripped of any path.
pub fn attachment_filename(disposition: &str) -> Option<String> {
    let raw = disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?
        .trim_matches('"');
    let name = std::path::Path::new(raw).file_name()?.to_str()?;
    (!name.is_empty()).then(|| name.to_string())
}

/// `#22c55e` → (0x22, 0xc5, 0x5e).
pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_get_thousands_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(202), "202");
        assert_eq!(format_count(1234), "1,234");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn subject_lines_truncate_with_ellipsis() {
        assert_eq!(truncate_text("short", 30), "short");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        assert_eq!(truncate_text("ééé", 2), "éé...");
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(parse_hex_color("#22c55e"), Some((0x22, 0xc5, 0x5e)));
        assert_eq!(parse_hex_color("22c55e"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }

    #[test]
    fn percent_keeps_shortest_form() {
        assert_eq!(format_percent(78.7), "78.7%");
        assert_eq!(format_percent(70.0), "70%");
    }

    #[test]
    fn run_banners() {
        let ok: RunResult = Ok(RunResponse { origin: "webhook".to_string() });
        assert_eq!(run_banner(&ok), Banner::Success("Analysis complete".to_string()));
        let sample: RunResult = Ok(RunResponse { origin: "sample".to_string() });
        assert!(matches!(run_banner(&sample), Banner::Info(_)));
        let failed: RunResult = Err(RunFailure::Failed("HTTP 502".to_string()));
        assert!(matches!(run_banner(&failed), Banner::Error(m) if m.contains("try again")));
    }

    #[test]
    fn export_name_comes_from_disposition() {
        assert_eq!(
            attachment_filename("attachment; filename=\"campaign-analysis-2025-01-02.csv\"").as_deref(),
            Some("campaign-analysis-2025-01-02.csv")
        );
        assert_eq!(attachment_filename("attachment; filename=report.csv").as_deref(), Some("report.csv"));
        assert_eq!(attachment_filename("attachment; filename=\"../../etc/x.csv\"").as_deref(), Some("x.csv"));
        assert_eq!(attachment_filename("attachment"), None);
    }
}
