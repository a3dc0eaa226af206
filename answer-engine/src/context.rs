//! Context assembly.
//!
//! Concatenates retrieved passages into a bounded context string. Passages
//! are whole units: one that would push the running total past the budget
//! is skipped entirely and assembly stops, so a partial chunk never
//! misleads the model.

use crate::passage::Passage;

/// Character budget for the assembled context.
pub const MAX_CONTEXT_CHARS: usize = 3000;

/// Builds the context block from ranked passages, preserving their order.
///
/// Each passage is rendered as a provenance header followed by its text:
///
/// ```text
/// [source=report.pdf page=3]
/// <chunk text>
/// ```
///
/// Unknown pages render as `page=?`. Rendered passages are joined with a
/// blank line. The result never exceeds [`MAX_CONTEXT_CHARS`] characters.
pub fn build_context(passages: &[Passage]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut used = 0usize;

    for p in passages {
        let text = p.text.trim();
        if text.is_empty() {
            continue;
        }
        let page = p
            .meta
            .page
            .map_or_else(|| "?".to_string(), |n| n.to_string());
        let rendered = format!(
            "[source={} page={}]\n{}\n",
            p.meta.source_label(),
            page,
            text
        );
        // Separator between parts counts against the budget too.
        let sep = if parts.is_empty() { 0 } else { 1 };
        let cost = sep + rendered.chars().count();
        if used + cost > MAX_CONTEXT_CHARS {
            break;
        }
        used += cost;
        parts.push(rendered);
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passage::PassageMeta;

    fn passage(text: &str, source: Option<&str>, page: Option<u32>) -> Passage {
        Passage {
            text: text.to_string(),
            meta: PassageMeta {
                tenant_id: "demo".to_string(),
                file_id: "f1".to_string(),
                source: source.map(str::to_string),
                page,
                chunk_index: None,
            },
        }
    }

    #[test]
    fn renders_header_and_joins_with_blank_line() {
        let ctx = build_context(&[
            passage("first", Some("a.pdf"), Some(1)),
            passage("second", Some("a.pdf"), Some(2)),
        ]);
        assert_eq!(
            ctx,
            "[source=a.pdf page=1]\nfirst\n\n[source=a.pdf page=2]\nsecond\n"
        );
    }

    #[test]
    fn unknown_provenance_renders_placeholders() {
        let ctx = build_context(&[passage("body", None, None)]);
        assert_eq!(ctx, "[source=doc page=?]\nbody\n");
    }

    #[test]
    fn empty_input_yields_empty_context() {
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn blank_passages_are_skipped() {
        let ctx = build_context(&[
            passage("   \n ", Some("a.pdf"), Some(1)),
            passage("body", Some("a.pdf"), Some(2)),
        ]);
        assert_eq!(ctx, "[source=a.pdf page=2]\nbody\n");
    }

    #[test]
    fn passages_are_whole_units_and_budget_holds() {
        let big = "x".repeat(2000);
        let ctx = build_context(&[
            passage(&big, Some("a.pdf"), Some(1)),
            passage(&big, Some("a.pdf"), Some(2)),
        ]);
        // Second passage would exceed the budget and is dropped whole.
        assert!(ctx.chars().count() <= MAX_CONTEXT_CHARS);
        assert!(ctx.contains("page=1"));
        assert!(!ctx.contains("page=2"));
    }

    #[test]
    fn first_oversized_passage_yields_empty_context() {
        let huge = "x".repeat(MAX_CONTEXT_CHARS + 1);
        assert_eq!(build_context(&[passage(&huge, None, None)]), "");
    }
}
