//! Alias table and lenient value parsing for upstream campaign rows.
//!
//! The upstream workflow is not consistent about key names (`Sent` vs `sent`,
//! `Open_Rate (%)` vs `openRate` vs `Open Rate (%)`). Each canonical field owns
//! an ordered alias list; the first alias holding a present value wins.

use serde_json::Value;

/// Canonical fields of a campaign-variant record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Source,
    Platform,
    OutreachChannel,
    Campaign,
    VariableTested,
    WhatIsMeasured,
    Angles,
    Variant,
    SubjectLine,
    Sent,
    Opened,
    Replies,
    OpenRate,
    Goal,
    ReplyRate,
    WilsonLow,
    WilsonHigh,
    ProbAbove70,
    ProbBest,
    Verdict,
    Action,
}

/// Alias keys per field, in probe priority order.
pub const FIELD_ALIASES: &[(Field, &[&str])] = &[
    (Field::Source, &["Source", "source"]),
    (Field::Platform, &["Platform", "platform"]),
    (Field::OutreachChannel, &["Outreach Channel", "outreachChannel"]),
    (Field::Campaign, &["Campaign", "campaign"]),
    (Field::VariableTested, &["Variable Tested", "variableTested"]),
    (Field::WhatIsMeasured, &["What is measured", "whatIsMeasured"]),
    (Field::Angles, &["Angles", "angles"]),
    (Field::Variant, &["Variant", "variant"]),
    (Field::SubjectLine, &["Subject_Line", "subjectLine", "Subject Line"]),
    (Field::Sent, &["Sent", "sent"]),
    (Field::Opened, &["Opened", "opened"]),
    (Field::Replies, &["Replies", "replies"]),
    (Field::OpenRate, &["Open_Rate (%)", "openRate", "Open Rate (%)"]),
    (Field::Goal, &["Goal (%)", "goal"]),
    (Field::ReplyRate, &["Reply_Rate (%)", "replyRate", "Reply Rate (%)"]),
    (Field::WilsonLow, &["Wilson_Low (%)", "wilsonLow", "Wilson Low (%)"]),
    (Field::WilsonHigh, &["Wilson_High (%)", "wilsonHigh", "Wilson High (%)"]),
    (Field::ProbAbove70, &["Prob ≥ 70% (%)", "probAbove70"]),
    (Field::ProbBest, &["Prob_Best (%)", "probBest", "Prob Best (%)"]),
    (Field::Verdict, &["Verdict", "verdict"]),
    (Field::Action, &["Action", "action"]),
];

impl Field {
    pub fn aliases(self) -> &'static [&'static str] {
        FIELD_ALIASES
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }
}

/// Whether a raw value counts as supplied. Null, `false`, `""` and numeric
/// zero are treated as absent and fall through to the next alias.
pub fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First present value among the field's aliases. Non-object records have none.
pub fn probe(record: &Value, field: Field) -> Option<&Value> {
    let obj = record.as_object()?;
    field
        .aliases()
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| is_present(v))
}

/// Non-negative count; 0 when absent, negative or unparseable.
pub fn count(record: &Value, field: Field) -> u64 {
    probe(record, field).and_then(parse_count).unwrap_or(0)
}

/// Percentage value; `default` when absent or unparseable.
pub fn percent(record: &Value, field: Field, default: f64) -> f64 {
    probe(record, field).and_then(parse_percent).unwrap_or(default)
}

/// Free-form text; empty when absent.
pub fn text(record: &Value, field: Field) -> String {
    match probe(record, field) {
        Some(Value::String(s)) => s.clone(),
        // `2.0` renders as `2`, the way the workflow's JS would print it
        Some(Value::Number(n)) if n.is_f64() => n.as_f64().map(|f| f.to_string()).unwrap_or_default(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn parse_count(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Some(u);
            }
            let f = n.as_f64()?;
            (f.is_finite() && f >= 0.0).then(|| f.trunc() as u64)
        }
        Value::String(s) => leading_int(s),
        _ => None,
    }
}

fn parse_percent(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => leading_float(s),
        _ => None,
    }
}

/// Integer prefix of `s` after leading whitespace (`"12 sent"` → 12).
/// Negative values are rejected.
fn leading_int(s: &str) -> Option<u64> {
    let s = s.trim_start();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let value: u64 = s[..end].parse().ok()?;
    (!negative || value == 0).then_some(value)
}

/// Decimal prefix of `s` after leading whitespace (`"80.2%"` → 80.2).
fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        mantissa_digits += j - frac_start;
        i = j;
    }
    if mantissa_digits == 0 {
        return None;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    s[..i].parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn every_field_has_aliases_and_none_are_shared() {
        let mut seen = HashSet::new();
        for (field, aliases) in FIELD_ALIASES {
            assert!(!aliases.is_empty(), "{field:?} has no aliases");
            for alias in *aliases {
                assert!(seen.insert(*alias), "alias {alias:?} listed twice");
            }
        }
        assert_eq!(FIELD_ALIASES.len(), 21);
    }

    #[test]
    fn probe_respects_alias_priority() {
        let rec = json!({"openRate": 40, "Open_Rate (%)": 55.5, "Open Rate (%)": 10});
        assert_eq!(probe(&rec, Field::OpenRate), Some(&json!(55.5)));
    }

    #[test]
    fn absent_values_fall_through_to_next_alias() {
        let rec = json!({"Sent": 0, "sent": "42"});
        assert_eq!(count(&rec, Field::Sent), 42);
        let rec = json!({"Campaign": "", "campaign": "spring"});
        assert_eq!(text(&rec, Field::Campaign), "spring");
        let rec = json!({"Verdict": null, "verdict": "Winner"});
        assert_eq!(text(&rec, Field::Verdict), "Winner");
    }

    #[test]
    fn counts_parse_leniently() {
        assert_eq!(count(&json!({"sent": "101 emails"}), Field::Sent), 101);
        assert_eq!(count(&json!({"sent": 80.9}), Field::Sent), 80);
        assert_eq!(count(&json!({"sent": "n/a"}), Field::Sent), 0);
        assert_eq!(count(&json!({"sent": -4}), Field::Sent), 0);
        assert_eq!(count(&json!({"sent": "-4"}), Field::Sent), 0);
        assert_eq!(count(&json!({"sent": true}), Field::Sent), 0);
        assert_eq!(count(&json!({}), Field::Sent), 0);
    }

    #[test]
    fn percents_parse_leniently() {
        assert_eq!(percent(&json!({"openRate": "80.2%"}), Field::OpenRate, 0.0), 80.2);
        assert_eq!(percent(&json!({"openRate": " .5"}), Field::OpenRate, 0.0), 0.5);
        assert_eq!(percent(&json!({"openRate": "1e1x"}), Field::OpenRate, 0.0), 10.0);
        assert_eq!(percent(&json!({"openRate": "high"}), Field::OpenRate, 0.0), 0.0);
        assert_eq!(percent(&json!({}), Field::Goal, 70.0), 70.0);
        assert_eq!(percent(&json!({"goal": "abc"}), Field::Goal, 70.0), 70.0);
        assert_eq!(percent(&json!({"Goal (%)": "65"}), Field::Goal, 70.0), 65.0);
    }

    #[test]
    fn non_object_records_yield_defaults() {
        let rec = json!(17);
        assert_eq!(count(&rec, Field::Sent), 0);
        assert_eq!(text(&rec, Field::Source), "");
        assert_eq!(percent(&rec, Field::Goal, 70.0), 70.0);
    }

    #[test]
    fn numeric_text_is_rendered() {
        assert_eq!(text(&json!({"Variant": 2}), Field::Variant), "2");
        assert_eq!(text(&json!({"Variant": 2.0}), Field::Variant), "2");
        assert_eq!(text(&json!({"Variant": 2.5}), Field::Variant), "2.5");
        assert_eq!(text(&json!({"Variant": true}), Field::Variant), "true");
    }
}
