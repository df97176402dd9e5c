use chrono::Utc;

use crate::normalizer::aggregate::summarize;
use crate::types::{AnalysisResult, CampaignVariantRecord, Verdict};

const SAMPLE_CAMPAIGN: &str =
    "MC -Job Board - LinkedIn -Lead Generation- Subject Lines - variants -paincuriperso - P1 - 09/30/2025";

/// Built-in two-variant dataset shown when the webhook payload is unusable.
/// Aggregates go through the same `summarize` as real data.
pub fn sample_result() -> AnalysisResult {
    let variant = |variant: &str,
                   subject_line: &str,
                   opened: u64,
                   open_rate: f64,
                   wilson: (f64, f64),
                   prob_above_70: f64,
                   prob_best: f64| CampaignVariantRecord {
        source: "LinkedIn".to_string(),
        platform: "Instantly".to_string(),
        outreach_channel: "Cold Email".to_string(),
        campaign: SAMPLE_CAMPAIGN.to_string(),
        variable_tested: "Subject Line".to_string(),
        what_is_measured: "Open rate".to_string(),
        angles: "paincuriperso".to_string(),
        variant: variant.to_string(),
        subject_line: subject_line.to_string(),
        sent: 101,
        opened,
        replies: 1,
        open_rate,
        goal: 70.0,
        reply_rate: 0.99,
        wilson_low: wilson.0,
        wilson_high: wilson.1,
        prob_above_70,
        prob_best,
        verdict: Verdict::Winner,
        action: "Lock it as your control subject line.".to_string(),
    };

    let records = vec![
        variant("A", "Email Subject 1", 81, 80.20, (71.38, 86.89), 98.53, 33.18),
        variant("B", "Email Subject 2", 78, 77.23, (68.14, 84.32), 92.95, 11.01),
    ];
    summarize(records, Utc::now())
}
