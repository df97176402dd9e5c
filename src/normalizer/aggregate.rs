use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::types::{AnalysisResult, CampaignVariantRecord};

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Fill in a rate from its counts when the supplied rate is exactly zero.
///
/// A genuinely-zero supplied rate with nonzero counts cannot be told apart
/// from a missing one and is overwritten too. Upstream behaves the same way.
///
/// The derived rate is not clamped: `numerator > sent` yields a value above
/// 100, which surfaces inconsistent upstream counts instead of hiding them.
pub fn derive_rate(supplied: f64, numerator: u64, sent: u64) -> f64 {
    if supplied == 0.0 && sent > 0 && numerator > 0 {
        round_to(numerator as f64 / sent as f64 * 100.0, 2)
    } else {
        supplied
    }
}

/// Mean of `rate` over `records`, rounded to one decimal. Empty → 0.
pub fn average_rate<F>(records: &[CampaignVariantRecord], rate: F) -> f64
where
    F: Fn(&CampaignVariantRecord) -> f64,
{
    if records.is_empty() {
        return 0.0;
    }
    let sum: f64 = records.iter().map(rate).sum();
    round_to(sum / records.len() as f64, 1)
}

/// Build the aggregate over `records`, preserving their order.
pub fn summarize(records: Vec<CampaignVariantRecord>, last_run: DateTime<Utc>) -> AnalysisResult {
    let total_campaigns = records
        .iter()
        .map(|r| r.campaign.as_str())
        .collect::<HashSet<_>>()
        .len();

    AnalysisResult {
        total_campaigns,
        total_variants: records.len(),
        average_open_rate: average_rate(&records, |r| r.open_rate),
        average_reply_rate: average_rate(&records, |r| r.reply_rate),
        total_sent: records.iter().fold(0u64, |acc, r| acc.saturating_add(r.sent)),
        last_run,
        campaigns: records,
    }
}
