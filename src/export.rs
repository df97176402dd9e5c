use chrono::NaiveDate;

use crate::config::EXPORT_FILE_PREFIX;
use crate::types::{AnalysisResult, CampaignVariantRecord};

pub const CSV_HEADERS: [&str; 17] = [
    "Source",
    "Platform",
    "Campaign",
    "Variable",
    "Variant",
    "Subject Line",
    "Sent",
    "Opened",
    "Replies",
    "Open Rate",
    "Reply Rate",
    "Wilson Low",
    "Wilson High",
    "Prob ≥ 70%",
    "Prob Best",
    "Verdict",
    "Action",
];

/// Comma-separated rendering of the campaigns table, header row first.
pub fn to_csv(result: &AnalysisResult) -> String {
    std::iter::once(CSV_HEADERS.join(","))
        .chain(result.campaigns.iter().map(csv_row))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `campaign-analysis-2025-09-30.csv`
pub fn export_filename(date: NaiveDate) -> String {
    format!("{EXPORT_FILE_PREFIX}-{}.csv", date.format("%Y-%m-%d"))
}

fn csv_row(r: &CampaignVariantRecord) -> String {
    [
        field(&r.source),
        field(&r.platform),
        field(&r.campaign),
        field(&r.variable_tested),
        field(&r.variant),
        quoted(&r.subject_line),
        r.sent.to_string(),
        r.opened.to_string(),
        r.replies.to_string(),
        r.open_rate.to_string(),
        r.reply_rate.to_string(),
        r.wilson_low.to_string(),
        r.wilson_high.to_string(),
        r.prob_above_70.to_string(),
        r.prob_best.to_string(),
        field(r.verdict.label()),
        field(&r.action),
    ]
    .join(",")
}

/// Subject lines always go out quoted; they routinely contain commas.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        quoted(s)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::sample_result;

    #[test]
    fn header_row_is_fixed() {
        let csv = to_csv(&sample_result());
        let header = csv.lines().next().unwrap();
        assert_eq!(
            header,
            "Source,Platform,Campaign,Variable,Variant,Subject Line,Sent,Opened,Replies,\
             Open Rate,Reply Rate,Wilson Low,Wilson High,Prob ≥ 70%,Prob Best,Verdict,Action"
        );
    }

    #[test]
    fn one_line_per_record_in_order() {
        let result = sample_result();
        let csv = to_csv(&result);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 1 + result.campaigns.len());
        assert_eq!(
            lines[1],
            "LinkedIn,Instantly,MC -Job Board - LinkedIn -Lead Generation- Subject Lines - variants -paincuriperso - P1 - 09/30/2025,\
             Subject Line,A,\"Email Subject 1\",101,81,1,80.2,0.99,71.38,86.89,98.53,33.18,winner,\
             Lock it as your control subject line."
        );
        assert!(lines[2].contains(",B,\"Email Subject 2\","));
    }

    #[test]
    fn embedded_commas_and_quotes_are_escaped() {
        let mut result = sample_result();
        result.campaigns[0].subject_line = "Hi, \"you\"".to_string();
        result.campaigns[0].action = "Pause, then retest".to_string();
        let csv = to_csv(&result);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains(",\"Hi, \"\"you\"\"\","), "row={row}");
        assert!(row.ends_with(",\"Pause, then retest\""), "row={row}");
    }

    #[test]
    fn whole_numbers_print_without_fraction() {
        let mut result = sample_result();
        result.campaigns[0].open_rate = 70.0;
        let csv = to_csv(&result);
        assert!(csv.lines().nth(1).unwrap().contains(",101,81,1,70,0.99,"));
    }

    #[test]
    fn filename_is_date_stamped() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 30).unwrap();
        assert_eq!(export_filename(date), "campaign-analysis-2025-09-30.csv");
    }
}
