use crate::types::Verdict;

/// Map free-form upstream verdict text onto the canonical labels.
///
/// Matching is by substring on the lowercased, trimmed text, checked in the
/// order winner, loser, needs-more-data. Unrecognised text passes through in
/// its lowercased form; empty text means there is not enough data yet.
pub fn normalize_verdict(raw: &str) -> Verdict {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return Verdict::NeedsMoreData;
    }
    if normalized.contains("winner") {
        Verdict::Winner
    } else if normalized.contains("loser") {
        Verdict::Loser
    } else if normalized.contains("needs more data") || normalized.contains("keep testing") {
        Verdict::NeedsMoreData
    } else {
        // Already-canonical labels ("needs-more-data") map back to their variant.
        Verdict::from(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_testing_needs_more_data() {
        assert_eq!(normalize_verdict("Keep Testing"), Verdict::NeedsMoreData);
        assert_eq!(normalize_verdict("  needs more data "), Verdict::NeedsMoreData);
    }

    #[test]
    fn winner_substring() {
        assert_eq!(normalize_verdict("STRONG WINNER"), Verdict::Winner);
    }

    #[test]
    fn winner_checked_before_loser() {
        assert_eq!(normalize_verdict("winner over loser"), Verdict::Winner);
        assert_eq!(normalize_verdict("Clear Loser"), Verdict::Loser);
    }

    #[test]
    fn empty_needs_more_data() {
        assert_eq!(normalize_verdict(""), Verdict::NeedsMoreData);
        assert_eq!(normalize_verdict("   "), Verdict::NeedsMoreData);
    }

    #[test]
    fn unknown_passes_through_lowercased() {
        assert_eq!(
            normalize_verdict("inconclusive"),
            Verdict::Other("inconclusive".to_string())
        );
        assert_eq!(
            normalize_verdict(" Tied "),
            Verdict::Other("tied".to_string())
        );
    }

    #[test]
    fn canonical_label_is_stable() {
        assert_eq!(normalize_verdict("needs-more-data"), Verdict::NeedsMoreData);
        assert_eq!(normalize_verdict("Needs-More-Data"), Verdict::NeedsMoreData);
    }
}
