use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Categorical outcome of a variant, as labelled by the upstream workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    Winner,
    Loser,
    NeedsMoreData,
    /// Any other label, lowercased and trimmed.
    Other(String),
}

impl Verdict {
    pub fn label(&self) -> &str {
        match self {
            Verdict::Winner => "winner",
            Verdict::Loser => "loser",
            Verdict::NeedsMoreData => "needs-more-data",
            Verdict::Other(s) => s,
        }
    }
}

/// Exact label mapping, used when reading back already-normalized data.
impl From<String> for Verdict {
    fn from(s: String) -> Self {
        match s.as_str() {
            "winner" => Verdict::Winner,
            "loser" => Verdict::Loser,
            "needs-more-data" => Verdict::NeedsMoreData,
            _ => Verdict::Other(s),
        }
    }
}

impl From<Verdict> for String {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Other(s) => s,
            other => other.label().to_string(),
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One row per tested variant. Percentages are on a 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignVariantRecord {
    pub source: String,
    pub platform: String,
    pub outreach_channel: String,
    pub campaign: String,
    pub variable_tested: String,
    pub what_is_measured: String,
    pub angles: String,
    pub variant: String,
    pub subject_line: String,
    pub sent: u64,
    pub opened: u64,
    pub replies: u64,
    pub open_rate: f64,
    pub goal: f64,
    pub reply_rate: f64,
    pub wilson_low: f64,
    pub wilson_high: f64,
    pub prob_above_70: f64,
    pub prob_best: f64,
    pub verdict: Verdict,
    pub action: String,
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// The single current result. Replaced wholesale, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub total_campaigns: usize,
    pub total_variants: usize,
    pub average_open_rate: f64,
    pub average_reply_rate: f64,
    pub total_sent: u64,
    pub last_run: DateTime<Utc>,
    pub campaigns: Vec<CampaignVariantRecord>,
}

/// Where the current result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrigin {
    Webhook,
    /// Payload was unusable; the built-in sample dataset was substituted.
    Sample,
}

impl std::fmt::Display for ResultOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultOrigin::Webhook => write!(f, "webhook"),
            ResultOrigin::Sample => write!(f, "sample"),
        }
    }
}
