//! Chart series derived from the current result. Presentation only: nothing
//! here feeds back into the stored data.

use serde::Serialize;

use crate::config::{ChartColors, NEUTRAL_COLOR};
use crate::types::{AnalysisResult, Verdict};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRateBar {
    pub label: String,
    pub open_rate: f64,
    pub goal: f64,
    pub wilson_low: f64,
    pub wilson_high: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictSlice {
    pub verdict: Verdict,
    pub label: String,
    pub count: usize,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePoint {
    /// Probability of being best.
    pub x: f64,
    /// Open rate.
    pub y: f64,
    pub label: String,
    pub verdict: Verdict,
    pub sent: u64,
    pub wilson_low: f64,
    pub wilson_high: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WilsonBand {
    pub variant: String,
    pub low: f64,
    pub open_rate: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSet {
    pub open_rates: Vec<OpenRateBar>,
    pub verdicts: Vec<VerdictSlice>,
    pub performance: Vec<PerformancePoint>,
    pub wilson: Vec<WilsonBand>,
}

pub fn verdict_color(verdict: &Verdict, colors: &ChartColors) -> String {
    match verdict {
        Verdict::Winner => colors.success.clone(),
        Verdict::Loser => colors.danger.clone(),
        Verdict::NeedsMoreData => colors.warning.clone(),
        Verdict::Other(_) => NEUTRAL_COLOR.to_string(),
    }
}

/// `needs-more-data` → `Needs More Data`. Only the first dash becomes a space.
pub fn verdict_display(verdict: &Verdict) -> String {
    let spaced = verdict.label().replacen('-', " ", 1);
    let mut out = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for c in spaced.chars() {
        if at_word_start && c.is_alphanumeric() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_');
    }
    out
}

pub fn open_rate_series(result: &AnalysisResult, colors: &ChartColors) -> Vec<OpenRateBar> {
    result
        .campaigns
        .iter()
        .map(|c| OpenRateBar {
            label: format!("{} ({})", c.variant, c.angles),
            open_rate: c.open_rate,
            goal: c.goal,
            wilson_low: c.wilson_low,
            wilson_high: c.wilson_high,
            color: verdict_color(&c.verdict, colors),
        })
        .collect()
}

/// Counts per verdict, in order of first appearance.
pub fn verdict_distribution(result: &AnalysisResult, colors: &ChartColors) -> Vec<VerdictSlice> {
    let mut slices: Vec<VerdictSlice> = Vec::new();
    for c in &result.campaigns {
        match slices.iter_mut().find(|s| s.verdict == c.verdict) {
            Some(slice) => slice.count += 1,
            None => slices.push(VerdictSlice {
                verdict: c.verdict.clone(),
                label: verdict_display(&c.verdict),
                count: 1,
                color: verdict_color(&c.verdict, colors),
            }),
        }
    }
    slices
}

pub fn performance_points(result: &AnalysisResult, colors: &ChartColors) -> Vec<PerformancePoint> {
    result
        .campaigns
        .iter()
        .map(|c| PerformancePoint {
            x: c.prob_best,
            y: c.open_rate,
            label: format!("{} - {}", c.variant, c.angles),
            verdict: c.verdict.clone(),
            sent: c.sent,
            wilson_low: c.wilson_low,
            wilson_high: c.wilson_high,
            color: verdict_color(&c.verdict, colors),
        })
        .collect()
}

pub fn wilson_bands(result: &AnalysisResult) -> Vec<WilsonBand> {
    result
        .campaigns
        .iter()
        .map(|c| WilsonBand {
            variant: c.variant.clone(),
            low: c.wilson_low,
            open_rate: c.open_rate,
            high: c.wilson_high,
        })
        .collect()
}

pub fn chart_set(result: &AnalysisResult, colors: &ChartColors) -> ChartSet {
    ChartSet {
        open_rates: open_rate_series(result, colors),
        verdicts: verdict_distribution(result, colors),
        performance: performance_points(result, colors),
        wilson: wilson_bands(result),
    }
}
