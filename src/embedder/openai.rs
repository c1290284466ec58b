//! OpenAI-compatible embedding client.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Embedder, EmbedderError};
use crate::http::{HttpPolicy, error_body};

/// Embeddings client for `{base_url}/embeddings`.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    policy: HttpPolicy,
}

impl OpenAiEmbedder {
    /// Builds a new embeddings client authenticated with a bearer token.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        policy: HttpPolicy,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing OpenAI API key");
        anyhow::ensure!(!model.trim().is_empty(), "missing embedding model name");
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        let mut auth = HeaderValue::from_str(&auth)
            .map_err(|_| anyhow::anyhow!("invalid OpenAI API key"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        let client = policy
            .client(headers)
            .map_err(|e| anyhow::anyhow!("failed to build embedding HTTP client: {e}"))?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            policy,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let request = EmbeddingRequest {
            input: text,
            model: &self.model,
        };
        let resp = self
            .policy
            .send(|| self.client.post(&self.endpoint).json(&request))
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = error_body(resp).await;
            return Err(EmbedderError::Status { status, body });
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| EmbedderError::MalformedResponse(e.to_string()))?;
        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .ok_or_else(|| EmbedderError::MalformedResponse("empty `data` array".to_string()))?;
        if embedding.is_empty() {
            return Err(EmbedderError::MalformedResponse(
                "empty embedding vector".to_string(),
            ));
        }
        debug!(dimensions = embedding.len(), "query embedded");
        Ok(embedding)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
