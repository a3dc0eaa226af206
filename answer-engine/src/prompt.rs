//! Prompt composition.
//!
//! Pure string assembly: the fixed system block, the retrieved context,
//! the question, and an optional summary-mode instruction, always in that
//! order. No I/O happens here.

/// The exact sentence the model must emit when it cannot answer. Also used
/// verbatim by the orchestrator for gate refusals and synthetic refusals.
pub const REFUSAL: &str =
    "I don't have enough information in the uploaded document(s) to answer that.";

/// Effective minimum top-k when summary intent is detected.
pub const SUMMARY_TOP_K: usize = 16;

const SYSTEM: &str = r#"You are a PDF question-answering assistant.

Hard rules:
- Use ONLY the provided CONTEXT. Do NOT use filenames or outside knowledge.
- If the answer is not present in the context, say exactly:
  "I don't have enough information in the uploaded document(s) to answer that."
- Never respond with 1 vague sentence. Be detailed and specific.

Answer style:
- Default: 1 paragraph, 6–9 sentences.
- For questions like "tell me about this pdf", "what is in this pdf", "summarize", "brief", "overview":
  produce a structured brief with these sections (even if some are missing):
  1) What this document is
  2) Key entities (people/companies/IDs/dates)
  3) Main topics / sections covered
  4) Notable numbers / metrics (if any)
  5) What is NOT mentioned / unclear (if relevant)
- If the user asks for bullets/list: use bullet points.

All claims must be supported by the context.
Output must be plain text.
"#;

const SUMMARY_KEYS: &[&str] = &[
    "tell me about",
    "what is in",
    "what information",
    "summarize",
    "summary",
    "brief",
    "overview",
    "describe this pdf",
    "what does this pdf contain",
    "what is this doc about",
];

const SUMMARY_EXTRA: &str =
    "\nIMPORTANT: Write a structured brief with the 5 sections listed in the instructions.";

const EXPAND_ONCE: &str =
    "\n\nIMPORTANT: Expand the answer. Minimum 6 sentences OR 8 bullet points. Be specific.";

const EXPAND_STREAM: &str =
    "\n\nIMPORTANT: Expand. Minimum 6–9 sentences OR 10 bullet points. Be specific and grounded.";

/// Detects whole-document summary intent by keyword match.
pub fn is_summary_question(question: &str) -> bool {
    let q = question.to_lowercase();
    SUMMARY_KEYS.iter().any(|k| q.contains(k))
}

/// Raises the requested top-k to [`SUMMARY_TOP_K`] for summary questions.
pub fn effective_top_k(requested: usize, summary_mode: bool) -> usize {
    if summary_mode {
        requested.max(SUMMARY_TOP_K)
    } else {
        requested
    }
}

/// Composes the full prompt: system block, context, question, optional
/// summary instruction, answer cue.
pub fn compose(context: &str, question: &str, summary_mode: bool) -> String {
    let extra = if summary_mode { SUMMARY_EXTRA } else { "" };
    format!("{SYSTEM}\n\nCONTEXT:\n{context}\n\nQUESTION:\n{question}\n{extra}\n\nANSWER:")
}

/// Appends the expand instruction used by the one-shot retry.
pub fn with_expand_once(prompt: &str) -> String {
    format!("{prompt}{EXPAND_ONCE}")
}

/// Appends the expand instruction used by the incremental retry.
pub fn with_expand_stream(prompt: &str) -> String {
    format!("{prompt}{EXPAND_STREAM}")
}
