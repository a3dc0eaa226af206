//! Evidence gate.
//!
//! Decides whether retrieval produced enough material to attempt an answer
//! at all. The check is deliberately cheap: no model call, just character
//! counting over the strongest hits.

use crate::passage::Passage;

/// Minimum combined character count across the evidence window.
pub const MIN_EVIDENCE_CHARS: usize = 200;

/// How many of the strongest non-empty passages the gate inspects.
pub const EVIDENCE_WINDOW: usize = 5;

/// Returns `true` when the retrieved passages carry enough text to ground
/// an answer.
///
/// Whitespace-only passages are ignored. The gate sums the character
/// counts of the first [`EVIDENCE_WINDOW`] non-empty passages (in ranked
/// order) and requires at least [`MIN_EVIDENCE_CHARS`] total.
pub fn has_sufficient_evidence(passages: &[Passage]) -> bool {
    let total: usize = passages
        .iter()
        .map(|p| p.text.trim())
        .filter(|t| !t.is_empty())
        .take(EVIDENCE_WINDOW)
        .map(|t| t.chars().count())
        .sum();
    total >= MIN_EVIDENCE_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passage::PassageMeta;

    fn passage(text: &str) -> Passage {
        Passage {
            text: text.to_string(),
            meta: PassageMeta::default(),
        }
    }

    #[test]
    fn empty_retrieval_is_insufficient() {
        assert!(!has_sufficient_evidence(&[]));
    }

    #[test]
    fn whitespace_only_is_insufficient() {
        let ws = passage("   \n\t  ");
        assert!(!has_sufficient_evidence(&[ws.clone(), ws]));
    }

    #[test]
    fn short_evidence_is_insufficient() {
        assert!(!has_sufficient_evidence(&[passage(&"a".repeat(199))]));
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(has_sufficient_evidence(&[passage(&"a".repeat(200))]));
    }

    #[test]
    fn window_skips_blank_passages() {
        // Blanks do not consume window slots: five real 40-char passages
        // after a blank still reach the threshold.
        let mut passages = vec![passage("  ")];
        passages.extend((0..5).map(|_| passage(&"b".repeat(40))));
        assert!(has_sufficient_evidence(&passages));
    }

    #[test]
    fn passages_beyond_window_do_not_count() {
        // Six 39-char passages: only the first five count (195 < 200).
        let passages: Vec<_> = (0..6).map(|_| passage(&"c".repeat(39))).collect();
        assert!(!has_sufficient_evidence(&passages));
    }
}
