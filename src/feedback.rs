use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::frame::{Cell, DataFrame};

/// Literal marker opening each feedback block.
pub const ENTRY_MARKER: &str = "Feedback #";

/// Rating line inside a block: `- <Branch Name> Branch ~ <digit>⭐`
static RATING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"- ([A-Za-z\s]+ Branch) ~ (\d)⭐").expect("rating line pattern"));

/// Extraction result for one feedback log.
///
/// `entries_found` counts block markers, while `pairs` holds only the
/// lines that matched the rating pattern; a block without a parseable
/// rating line counts as an entry but contributes no pair, so the two
/// numbers can legitimately differ.
#[derive(Debug)]
pub struct FeedbackReport {
    pub entries_found: usize,
    pub pairs: DataFrame,
    pub summary: DataFrame,
}

/// Extracts (branch, rating) pairs from a raw feedback log and groups them
/// into per-(branch, rating) counts.
pub fn extract_feedback(content: &str) -> Result<FeedbackReport> {
    let entries_found = content.matches(ENTRY_MARKER).count();

    let mut pairs = DataFrame::new(vec!["branch".to_string(), "rating".to_string()]);
    let mut counts: BTreeMap<(String, i64), i64> = BTreeMap::new();
    for captures in RATING_LINE.captures_iter(content) {
        let branch = captures[1].to_string();
        let rating: i64 = captures[2].parse().expect("pattern captures one digit");
        pairs.push_row(vec![Cell::Str(branch.clone()), Cell::Int(rating)])?;
        *counts.entry((branch, rating)).or_insert(0) += 1;
    }

    let mut summary = DataFrame::new(vec![
        "branch".to_string(),
        "rating".to_string(),
        "count".to_string(),
    ]);
    for ((branch, rating), count) in counts {
        summary.push_row(vec![Cell::Str(branch), Cell::Int(rating), Cell::Int(count)])?;
    }

    debug!(
        entries = entries_found,
        extracted = pairs.row_count(),
        "extracted feedback"
    );
    Ok(FeedbackReport {
        entries_found,
        pairs,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Feedback #1
Great selection of new releases.
- Central Branch ~ 5⭐

Feedback #2
Queue at the front desk was too long.
- Riverside Branch ~ 2⭐

Feedback #3
(no rating given)
";

    #[test]
    fn test_entry_count_and_pair_count_diverge() {
        let report = extract_feedback(SAMPLE).unwrap();
        assert_eq!(report.entries_found, 3);
        assert_eq!(report.pairs.row_count(), 2);
    }

    #[test]
    fn test_extracted_pairs() {
        let report = extract_feedback(SAMPLE).unwrap();
        assert_eq!(
            report.pairs.cell(0, "branch"),
            Some(&Cell::Str("Central Branch".to_string()))
        );
        assert_eq!(report.pairs.cell(0, "rating"), Some(&Cell::Int(5)));
        assert_eq!(
            report.pairs.cell(1, "branch"),
            Some(&Cell::Str("Riverside Branch".to_string()))
        );
        assert_eq!(report.pairs.cell(1, "rating"), Some(&Cell::Int(2)));
    }

    #[test]
    fn test_summary_groups_and_sorts() {
        let content = "\
Feedback #1
- Riverside Branch ~ 4⭐
Feedback #2
- Central Branch ~ 5⭐
Feedback #3
- Riverside Branch ~ 4⭐
Feedback #4
- Riverside Branch ~ 1⭐
";
        let report = extract_feedback(content).unwrap();
        assert_eq!(report.summary.row_count(), 3);
        // Grouped counts come out sorted by branch, then rating
        assert_eq!(
            report.summary.cell(0, "branch"),
            Some(&Cell::Str("Central Branch".to_string()))
        );
        assert_eq!(report.summary.cell(0, "count"), Some(&Cell::Int(1)));
        assert_eq!(report.summary.cell(1, "rating"), Some(&Cell::Int(1)));
        assert_eq!(report.summary.cell(2, "rating"), Some(&Cell::Int(4)));
        assert_eq!(report.summary.cell(2, "count"), Some(&Cell::Int(2)));
    }

    #[test]
    fn test_empty_input() {
        let report = extract_feedback("").unwrap();
        assert_eq!(report.entries_found, 0);
        assert!(report.pairs.is_empty());
        assert!(report.summary.is_empty());
    }
}
