//! Qdrant REST client implementing the `Retriever` seam.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use answer_engine::{Passage, PassageMeta, RetrieveError, Retriever};
use llm_service::error_handler::{env_or, make_snippet};
use llm_service::services::ollama_service::OllamaService;

use crate::error::SearchError;

const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";
const DEFAULT_COLLECTION: &str = "pdf_chunks";

/// Similarity search over one Qdrant collection.
///
/// Stored points follow the ingestion convention: the chunk text lives in
/// `payload.page_content` and provenance under `payload.metadata`.
pub struct QdrantRetriever {
    client: Client,
    base_url: String,
    collection: String,
    embedder: OllamaService,
    embedding_model: String,
}

impl QdrantRetriever {
    /// Creates the retriever and its HTTP client.
    ///
    /// # Errors
    /// Returns an error when the client cannot be constructed.
    pub fn new(
        base_url: String,
        collection: String,
        embedder: OllamaService,
        embedding_model: String,
    ) -> Result<Self, SearchError> {
        // Search is interactive; keep the whole call tight.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url,
            collection,
            embedder,
            embedding_model,
        })
    }

    /// Builds the retriever from `QDRANT_URL`, `COLLECTION_NAME`, and the
    /// embedding environment.
    ///
    /// # Errors
    /// Returns an error when the Ollama endpoint is invalid or the HTTP
    /// client cannot be constructed.
    pub fn from_env() -> Result<Self, SearchError> {
        let (embedder, embedding_model) = llm_service::build_embedder_from_env()?;
        Self::new(
            env_or("QDRANT_URL", DEFAULT_QDRANT_URL),
            env_or("COLLECTION_NAME", DEFAULT_COLLECTION),
            embedder,
            embedding_model,
        )
    }

    async fn embed_query(&self, question: &str) -> Result<Vec<f32>, SearchError> {
        let mut vectors = self
            .embedder
            .embeddings(&self.embedding_model, &[question.to_string()])
            .await?;
        if vectors.is_empty() {
            return Err(SearchError::MissingEmbedding);
        }
        Ok(vectors.swap_remove(0))
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        file_ids: Option<&[String]>,
        tenant_id: &str,
    ) -> Result<Vec<(Passage, f32)>, SearchError> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url.trim_end_matches('/'),
            self.collection
        );
        let body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
            "filter": build_filter(tenant_id, file_ids),
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(SearchError::HttpStatus {
                status,
                url,
                snippet: make_snippet(&text),
            });
        }

        let parsed: SearchResponse = resp.json().await?;
        debug!(hits = parsed.result.len(), collection = %self.collection, "qdrant search done");
        Ok(parsed.result.into_iter().map(point_to_hit).collect())
    }
}

#[async_trait]
impl Retriever for QdrantRetriever {
    async fn retrieve(
        &self,
        question: &str,
        top_k: usize,
        file_ids: Option<&[String]>,
        tenant_id: &str,
    ) -> Result<Vec<(Passage, f32)>, RetrieveError> {
        let vector = self
            .embed_query(question)
            .await
            .map_err(|e| RetrieveError(e.to_string()))?;
        self.search(vector, top_k, file_ids, tenant_id)
            .await
            .map_err(|e| RetrieveError(e.to_string()))
    }
}

/// Tenant scoping is always enforced; document scoping only when asked.
fn build_filter(tenant_id: &str, file_ids: Option<&[String]>) -> Value {
    let mut must = vec![json!({
        "key": "metadata.tenant_id",
        "match": { "value": tenant_id },
    })];
    if let Some(ids) = file_ids {
        if !ids.is_empty() {
            must.push(json!({
                "key": "metadata.file_id",
                "match": { "any": ids },
            }));
        }
    }
    json!({ "must": must })
}

fn point_to_hit(point: ScoredPoint) -> (Passage, f32) {
    let meta = point.payload.metadata;
    let passage = Passage {
        text: point.payload.page_content,
        meta: PassageMeta {
            tenant_id: meta.tenant_id.unwrap_or_default(),
            file_id: meta.file_id.unwrap_or_default(),
            source: meta.source,
            page: meta.page.as_ref().and_then(value_to_u32),
            chunk_index: meta.chunk.as_ref().and_then(value_to_u32),
        },
    };
    (passage, point.score)
}

/// Ingested metadata is loosely typed; pages arrive as numbers or numeric
/// strings depending on the loader.
fn value_to_u32(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// HTTP payloads & options
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(serde::Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    payload: PointPayload,
}

#[derive(serde::Deserialize, Default)]
struct PointPayload {
    #[serde(default)]
    page_content: String,
    #[serde(default)]
    metadata: PointMetadata,
}

#[derive(serde::Deserialize, Default)]
struct PointMetadata {
    #[serde(default)]
    tenant_id: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    page: Option<Value>,
    #[serde(default)]
    chunk: Option<Value>,
}
