use serde::Serialize;

use crate::error::{AppError, Result};

pub const WEBHOOK_URL: &str = "http://localhost:5678/webhook/start-analysis";

/// Fixed tag sent in every trigger request body.
pub const SOURCE_TAG: &str = "campaign-analyzer";

/// Intended deadline for one analysis run (5 minutes).
pub const ANALYSIS_TIMEOUT_MS: u64 = 300_000;

pub const STORAGE_KEY: &str = "campaign_analysis_data";

/// Goal percentage assumed when a record does not carry one.
pub const DEFAULT_GOAL: f64 = 70.0;

pub const EXPORT_FILE_PREFIX: &str = "campaign-analysis";

/// Colour used for verdicts outside winner / loser / needs-more-data.
pub const NEUTRAL_COLOR: &str = "#6b7280";

/// Presentation-only palette, exposed to dashboard clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartColors {
    pub primary: String,
    pub secondary: String,
    pub success: String,
    pub warning: String,
    pub danger: String,
    pub info: String,
}

impl Default for ChartColors {
    fn default() -> Self {
        Self {
            primary: "#667eea".to_string(),
            secondary: "#764ba2".to_string(),
            success: "#22c55e".to_string(),
            warning: "#fbbf24".to_string(),
            danger: "#ef4444".to_string(),
            info: "#3b82f6".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub webhook_url: String,
    /// Total deadline for the trigger request (ANALYSIS_TIMEOUT_MS).
    pub analysis_timeout_ms: u64,
    /// Key the current result is persisted under (STORAGE_KEY).
    pub storage_key: String,
    pub chart_colors: ChartColors,
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url: WEBHOOK_URL.to_string(),
            analysis_timeout_ms: ANALYSIS_TIMEOUT_MS,
            storage_key: STORAGE_KEY.to_string(),
            chart_colors: ChartColors::default(),
            log_level: "info".to_string(),
            db_path: "analyzer.db".to_string(),
            api_port: 3000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = ChartColors::default();
        Ok(Self {
            webhook_url: std::env::var("WEBHOOK_URL").unwrap_or_else(|_| WEBHOOK_URL.to_string()),
            analysis_timeout_ms: std::env::var("ANALYSIS_TIMEOUT_MS")
                .unwrap_or_else(|_| ANALYSIS_TIMEOUT_MS.to_string())
                .parse::<u64>()
                .unwrap_or(ANALYSIS_TIMEOUT_MS),
            storage_key: std::env::var("STORAGE_KEY").unwrap_or_else(|_| STORAGE_KEY.to_string()),
            chart_colors: ChartColors {
                primary: color_var("CHART_COLOR_PRIMARY", defaults.primary),
                secondary: color_var("CHART_COLOR_SECONDARY", defaults.secondary),
                success: color_var("CHART_COLOR_SUCCESS", defaults.success),
                warning: color_var("CHART_COLOR_WARNING", defaults.warning),
                danger: color_var("CHART_COLOR_DANGER", defaults.danger),
                info: color_var("CHART_COLOR_INFO", defaults.info),
            },
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "analyzer.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
        })
    }
}

fn color_var(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
}
