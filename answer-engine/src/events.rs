//! Typed event protocol for incremental answers.
//!
//! Events serialize as single JSON objects tagged by `type`, one per NDJSON
//! line on the wire. The emission contract is: exactly one `meta` first,
//! then either `refused`+`final` or zero-or-more `token`s followed by
//! `final`, then exactly one `done`.

use serde::Serialize;

use crate::citations::Citation;

/// One event in an incremental answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerEvent {
    /// Always first: citations plus backend identity.
    Meta {
        citations: Vec<Citation>,
        provider: String,
        model: String,
    },
    /// One text increment.
    Token { token: String },
    /// The pipeline refused to answer; `answer` carries the refusal text.
    Refused { answer: String },
    /// The complete answer text, authoritative over concatenated tokens.
    Final { answer: String },
    /// Always last.
    Done,
}
