//! Retrieved passages and their metadata.

use serde::{Deserialize, Serialize};

/// One retrieved chunk of a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Chunk text as stored at ingestion time.
    pub text: String,
    /// Provenance metadata.
    pub meta: PassageMeta,
}

/// Provenance carried alongside every stored chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassageMeta {
    /// Owning tenant.
    pub tenant_id: String,
    /// Document the chunk belongs to.
    pub file_id: String,
    /// Original file name, when known.
    pub source: Option<String>,
    /// 1-based page number, when known.
    pub page: Option<u32>,
    /// Position of the chunk within its document.
    pub chunk_index: Option<u32>,
}

impl PassageMeta {
    /// Display label for the source document. Falls back to `"doc"` when
    /// the file name was not recorded.
    pub fn source_label(&self) -> &str {
        self.source.as_deref().unwrap_or("doc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_label_falls_back() {
        let mut meta = PassageMeta::default();
        assert_eq!(meta.source_label(), "doc");
        meta.source = Some("report.pdf".to_string());
        assert_eq!(meta.source_label(), "report.pdf");
    }
}
