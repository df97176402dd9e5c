use crate::types::CampaignVariantRecord;

/// Case-insensitive substring match over the record's table columns.
/// An empty or blank query matches everything.
pub fn matches(record: &CampaignVariantRecord, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    row_text(record).to_lowercase().contains(&query)
}

pub fn filter<'a>(
    records: &'a [CampaignVariantRecord],
    query: &str,
) -> Vec<&'a CampaignVariantRecord> {
    records.iter().filter(|r| matches(r, query)).collect()
}

fn row_text(r: &CampaignVariantRecord) -> String {
    [
        r.source.clone(),
        r.platform.clone(),
        r.campaign.clone(),
        r.variable_tested.clone(),
        r.variant.clone(),
        r.subject_line.clone(),
        r.sent.to_string(),
        r.opened.to_string(),
        r.replies.to_string(),
        format!("{}%", r.open_rate),
        format!("{}%", r.reply_rate),
        format!("{}%", r.wilson_low),
        format!("{}%", r.wilson_high),
        format!("{}%", r.prob_above_70),
        format!("{}%", r.prob_best),
        r.verdict.label().replacen('-', " ", 1),
        r.action.clone(),
    ]
    .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::sample_result;

    #[test]
    fn blank_query_matches_all() {
        let result = sample_result();
        assert_eq!(filter(&result.campaigns, "").len(), 2);
        assert_eq!(filter(&result.campaigns, "   ").len(), 2);
    }

    #[test]
    fn matches_case_insensitively() {
        let result = sample_result();
        let hits = filter(&result.campaigns, "email SUBJECT 2");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].variant, "B");
    }

    #[test]
    fn matches_numeric_columns() {
        let result = sample_result();
        assert_eq!(filter(&result.campaigns, "80.2%").len(), 1);
        assert!(filter(&result.campaigns, "no such campaign").is_empty());
    }
}
