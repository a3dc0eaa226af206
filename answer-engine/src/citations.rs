//! Citation extraction.
//!
//! Turns the ranked retrieval results into the compact citation list
//! returned to clients, preserving the retrieval order so citation `n`
//! corresponds to the `n`-th context passage.

use serde::Serialize;

use crate::passage::Passage;

/// Maximum snippet length in characters, before the ellipsis.
pub const SNIPPET_MAX_CHARS: usize = 240;

/// One source reference attached to an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    /// Source document label.
    pub source: String,
    /// Page number; `0` when unknown.
    pub page: u32,
    /// Short excerpt of the cited passage.
    pub snippet: String,
    /// Relevance score as reported by the store.
    pub score: f32,
}

/// Builds citations from scored passages, one per passage, in order.
pub fn build_citations(hits: &[(Passage, f32)]) -> Vec<Citation> {
    hits.iter()
        .map(|(p, score)| Citation {
            source: p.meta.source_label().to_string(),
            page: p.meta.page.unwrap_or(0),
            snippet: make_snippet(&p.text),
            score: *score,
        })
        .collect()
}

/// Clamps text to [`SNIPPET_MAX_CHARS`] characters, appending `"..."`
/// only when something was cut. Counts characters, not bytes, so
/// multi-byte text is never split.
fn make_snippet(text: &str) -> String {
    let trimmed = text.trim();
    let mut out: String = trimmed.chars().take(SNIPPET_MAX_CHARS).collect();
    if trimmed.chars().count() > SNIPPET_MAX_CHARS {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passage::PassageMeta;

    fn hit(text: &str, source: Option<&str>, page: Option<u32>, score: f32) -> (Passage, f32) {
        (
            Passage {
                text: text.to_string(),
                meta: PassageMeta {
                    tenant_id: "demo".to_string(),
                    file_id: "f1".to_string(),
                    source: source.map(str::to_string),
                    page,
                    chunk_index: None,
                },
            },
            score,
        )
    }

    #[test]
    fn preserves_order_and_provenance() {
        let citations = build_citations(&[
            hit("first", Some("a.pdf"), Some(2), 0.9),
            hit("second", None, None, 0.5),
        ]);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].source, "a.pdf");
        assert_eq!(citations[0].page, 2);
        assert_eq!(citations[0].snippet, "first");
        assert_eq!(citations[1].source, "doc");
        assert_eq!(citations[1].page, 0);
    }

    #[test]
    fn short_snippet_has_no_ellipsis() {
        let citations = build_citations(&[hit(&"a".repeat(240), None, None, 0.0)]);
        assert_eq!(citations[0].snippet.chars().count(), 240);
        assert!(!citations[0].snippet.ends_with("..."));
    }

    #[test]
    fn long_snippet_is_clamped_with_ellipsis() {
        let citations = build_citations(&[hit(&"b".repeat(500), None, None, 0.0)]);
        assert_eq!(citations[0].snippet.chars().count(), 243);
        assert!(citations[0].snippet.ends_with("..."));
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundary() {
        let text = "é".repeat(300);
        let citations = build_citations(&[hit(&text, None, None, 0.0)]);
        assert_eq!(citations[0].snippet.chars().count(), 243);
    }
}
