//! Turns an arbitrary webhook payload into the canonical `AnalysisResult`.
//! Pure functions: nothing here touches the network, storage or clock state
//! beyond stamping `lastRun`.

pub mod aggregate;
pub mod fields;
pub mod sample;
pub mod verdict;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DEFAULT_GOAL;
use crate::types::{AnalysisResult, CampaignVariantRecord, ResultOrigin};

use aggregate::{derive_rate, summarize};
use fields::{count, percent, text, Field};
pub use sample::sample_result;
pub use verdict::normalize_verdict;

/// Why a payload could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusablePayload {
    /// Not a list, and no `campaigns` or `data` list inside.
    UnrecognizedShape,
    /// A record list was found but holds no records.
    Empty,
}

impl std::fmt::Display for UnusablePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnusablePayload::UnrecognizedShape => write!(f, "unrecognized payload shape"),
            UnusablePayload::Empty => write!(f, "empty record list"),
        }
    }
}

/// Locate the record list: the payload itself, then `campaigns`, then `data`.
pub fn extract_records(raw: &Value) -> Result<&[Value], UnusablePayload> {
    let list = raw
        .as_array()
        .or_else(|| raw.get("campaigns").and_then(Value::as_array))
        .or_else(|| raw.get("data").and_then(Value::as_array))
        .ok_or(UnusablePayload::UnrecognizedShape)?;
    if list.is_empty() {
        return Err(UnusablePayload::Empty);
    }
    Ok(list.as_slice())
}

/// Map one upstream row onto the canonical record.
pub fn map_record(raw: &Value) -> CampaignVariantRecord {
    let sent = count(raw, Field::Sent);
    let opened = count(raw, Field::Opened);
    let replies = count(raw, Field::Replies);

    let open_rate = derive_rate(percent(raw, Field::OpenRate, 0.0), opened, sent);
    let reply_rate = derive_rate(percent(raw, Field::ReplyRate, 0.0), replies, sent);

    CampaignVariantRecord {
        source: text(raw, Field::Source),
        platform: text(raw, Field::Platform),
        outreach_channel: text(raw, Field::OutreachChannel),
        campaign: text(raw, Field::Campaign),
        variable_tested: text(raw, Field::VariableTested),
        what_is_measured: text(raw, Field::WhatIsMeasured),
        angles: text(raw, Field::Angles),
        variant: text(raw, Field::Variant),
        subject_line: text(raw, Field::SubjectLine),
        sent,
        opened,
        replies,
        open_rate,
        goal: percent(raw, Field::Goal, DEFAULT_GOAL),
        reply_rate,
        wilson_low: percent(raw, Field::WilsonLow, 0.0),
        wilson_high: percent(raw, Field::WilsonHigh, 0.0),
        prob_above_70: percent(raw, Field::ProbAbove70, 0.0),
        prob_best: percent(raw, Field::ProbBest, 0.0),
        verdict: normalize_verdict(&text(raw, Field::Verdict)),
        action: text(raw, Field::Action),
    }
}

/// `None` signals an unusable payload.
pub fn normalize(raw: &Value) -> Option<AnalysisResult> {
    try_normalize(raw).ok()
}

pub fn try_normalize(raw: &Value) -> Result<AnalysisResult, UnusablePayload> {
    let rows = extract_records(raw)?;
    let records: Vec<CampaignVariantRecord> = rows.iter().map(map_record).collect();
    debug!(records = records.len(), "normalized webhook payload");
    Ok(summarize(records, Utc::now()))
}

/// Normalize, substituting the sample dataset for unusable payloads.
pub fn normalize_or_sample(raw: &Value) -> (AnalysisResult, ResultOrigin) {
    if let Some(result) = normalize(raw) {
        return (result, ResultOrigin::Webhook);
    }
    let reason = extract_records(raw).err().unwrap_or(UnusablePayload::Empty);
    warn!(
        event = "SAMPLE_FALLBACK",
        reason = %reason,
        "Webhook payload unusable ({reason}) - showing sample data, check the workflow output",
    );
    (sample_result(), ResultOrigin::Sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Verdict;
    use serde_json::json;

    fn rows() -> Value {
        json!([
            {
                "Source": "LinkedIn",
                "Campaign": "spring",
                "Variant": "A",
                "Subject_Line": "Hello, friend",
                "Sent": 101,
                "Opened": 81,
                "Replies": 1,
                "Open_Rate (%)": 0,
                "Verdict": "Strong Winner"
            },
            {
                "source": "LinkedIn",
                "campaign": "spring",
                "variant": "B",
                "sent": "101",
                "opened": "78",
                "openRate": 77.23,
                "Goal (%)": 60,
                "verdict": "keep testing"
            },
            {
                "Campaign": "autumn",
                "Sent": 50,
                "Opened": 10,
                "Open Rate (%)": "55.5",
                "Wilson_Low (%)": 40.1,
                "Prob Best (%)": "12.5"
            }
        ])
    }

    fn without_timestamp(mut r: AnalysisResult) -> AnalysisResult {
        r.last_run = chrono::DateTime::<Utc>::UNIX_EPOCH;
        r
    }

    #[test]
    fn unusable_shapes_return_none() {
        assert!(normalize(&json!([])).is_none());
        assert!(normalize(&json!({"unrelated": 1})).is_none());
        assert!(normalize(&json!({"campaigns": []})).is_none());
        assert!(normalize(&json!("text")).is_none());
        assert!(normalize(&json!({"campaigns": {"not": "a list"}})).is_none());
    }

    #[test]
    fn unusable_reasons_are_distinguished() {
        assert_eq!(extract_records(&json!({"x": 1})), Err(UnusablePayload::UnrecognizedShape));
        assert_eq!(extract_records(&json!({"data": []})), Err(UnusablePayload::Empty));
    }

    #[test]
    fn campaigns_key_wins_over_data() {
        let raw = json!({"campaigns": [{"Campaign": "c"}], "data": [{}, {}]});
        assert_eq!(extract_records(&raw).unwrap().len(), 1);
    }

    #[test]
    fn all_wrappers_aggregate_identically() {
        let bare = normalize(&rows()).unwrap();
        let campaigns = normalize(&json!({"campaigns": rows()})).unwrap();
        let data = normalize(&json!({"data": rows()})).unwrap();
        assert_eq!(without_timestamp(bare.clone()), without_timestamp(campaigns));
        assert_eq!(without_timestamp(bare), without_timestamp(data));
    }

    #[test]
    fn aggregates_hold_invariants() {
        let result = normalize(&rows()).unwrap();
        assert_eq!(result.total_variants, result.campaigns.len());
        assert_eq!(result.total_variants, 3);
        assert_eq!(result.total_campaigns, 2);
        assert!(result.total_campaigns <= result.total_variants);
        assert_eq!(result.total_sent, 252);
    }

    #[test]
    fn maps_aliases_and_derives_rates() {
        let result = normalize(&rows()).unwrap();
        let a = &result.campaigns[0];
        assert_eq!(a.open_rate, 80.2);
        assert_eq!(a.reply_rate, 0.99);
        assert_eq!(a.subject_line, "Hello, friend");
        assert_eq!(a.goal, 70.0);
        assert_eq!(a.verdict, Verdict::Winner);

        let b = &result.campaigns[1];
        assert_eq!(b.sent, 101);
        assert_eq!(b.open_rate, 77.23);
        assert_eq!(b.goal, 60.0);
        assert_eq!(b.reply_rate, 0.0);
        assert_eq!(b.verdict, Verdict::NeedsMoreData);

        let c = &result.campaigns[2];
        assert_eq!(c.open_rate, 55.5);
        assert_eq!(c.wilson_low, 40.1);
        assert_eq!(c.prob_best, 12.5);
        assert_eq!(c.source, "");
        assert_eq!(c.verdict, Verdict::NeedsMoreData);
    }

    #[test]
    fn averages_use_mapped_rates() {
        let result = normalize(&rows()).unwrap();
        // (80.2 + 77.23 + 55.5) / 3 = 70.976..
        assert_eq!(result.average_open_rate, 71.0);
        // (0.99 + 0 + 0) / 3 = 0.33
        assert_eq!(result.average_reply_rate, 0.3);
    }

    #[test]
    fn unusable_payload_falls_back_to_sample() {
        let (result, origin) = normalize_or_sample(&json!({"status": "queued"}));
        assert_eq!(origin, ResultOrigin::Sample);
        assert_eq!(result.total_variants, 2);

        let (result, origin) = normalize_or_sample(&rows());
        assert_eq!(origin, ResultOrigin::Webhook);
        assert_eq!(result.total_variants, 3);
    }

    #[test]
    fn huge_sent_counts_do_not_overflow_the_total() {
        let result = normalize(&json!([
            {"Campaign": "a", "Sent": 1e20},
            {"Campaign": "a", "Sent": 1e20}
        ]))
        .unwrap();
        assert_eq!(result.campaigns[0].sent, u64::MAX);
        assert_eq!(result.total_sent, u64::MAX);
    }
}
