//! Client for the hosted nearest-neighbour index.
//!
//! Requests twice the number of final results so the re-ranker has a wider
//! pool than the answer needs.
use std::sync::Arc;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::CandidateMatch;
use crate::embedder::{Embedder, EmbedderError};
use crate::http::{HttpPolicy, error_body};

const QUERY_SUFFIX: &str = "/query";

/// Errors from one search call. All of them degrade to "no results".
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("embedding unavailable: {0}")]
    Embedding(#[from] EmbedderError),

    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("index API error ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Append `/query` to the index base URL unless it is already there.
pub fn normalize_query_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.ends_with(QUERY_SUFFIX) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{QUERY_SUFFIX}")
    }
}

/// Vector search against one index, embedding queries on the way in.
#[derive(Clone)]
pub struct VectorSearch {
    client: Client,
    query_url: String,
    embedder: Arc<dyn Embedder>,
    policy: HttpPolicy,
}

impl VectorSearch {
    /// Build a search client; the key is sent in an `Api-Key` header.
    pub fn new(
        base_url: &str,
        api_key: &str,
        embedder: Arc<dyn Embedder>,
        policy: HttpPolicy,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing vector index API key");
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key.trim())
            .map_err(|_| anyhow::anyhow!("invalid vector index API key"))?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static("api-key"), key);
        let client = policy
            .client(headers)
            .map_err(|e| anyhow::anyhow!("failed to build search HTTP client: {e}"))?;
        Ok(Self {
            client,
            query_url: normalize_query_url(base_url),
            embedder,
            policy,
        })
    }

    /// Up to `2 · top_k` raw candidates for `query`, in index order.
    pub async fn try_search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<CandidateMatch>, SearchError> {
        let vector = self.embedder.embed(query).await?;

        let request = QueryRequest {
            vector: &vector,
            top_k: top_k.saturating_mul(2),
            include_metadata: true,
        };
        let resp = self
            .policy
            .send(|| self.client.post(&self.query_url).json(&request))
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = error_body(resp).await;
            return Err(SearchError::Status { status, body });
        }

        let parsed: QueryResponse = resp.json().await?;
        debug!(candidates = parsed.matches.len(), "index returned matches");
        Ok(parsed.matches)
    }

    /// Like [`try_search`](Self::try_search), but any failure is logged
    /// and reported as an empty result.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<CandidateMatch> {
        match self.try_search(query, top_k).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Search error: {e}");
                Vec::new()
            }
        }
    }
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<CandidateMatch>,
}
