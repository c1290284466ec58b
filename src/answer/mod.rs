//! Grounded answer generation via a hosted chat-completion model.
pub mod context;
pub mod prompt;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{BrandingConfig, ChatConfig};
use crate::http::{HttpPolicy, error_body};

pub use context::{ContextDocument, Source};

/// Returned in place of an answer whenever generation fails.
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't generate an answer.";

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed chat response: {0}")]
    MalformedResponse(String),
}

/// Chat-completion client bound to one institution's system instruction.
#[derive(Clone)]
pub struct AnswerGenerator {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    system_instruction: String,
    policy: HttpPolicy,
}

impl AnswerGenerator {
    pub fn new(
        api_key: &str,
        chat: &ChatConfig,
        branding: &BrandingConfig,
        policy: HttpPolicy,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing OpenAI API key");
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| anyhow::anyhow!("invalid OpenAI API key"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        let client = policy
            .client(headers)
            .map_err(|e| anyhow::anyhow!("failed to build chat HTTP client: {e}"))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", chat.base_url.trim_end_matches('/')),
            model: chat.model.clone(),
            temperature: chat.temperature,
            system_instruction: prompt::system_instruction(branding),
            policy,
        })
    }

    /// Ask the model to answer `question` from `context` only.
    pub async fn try_generate(&self, question: &str, context: &str) -> Result<String, ChatError> {
        let user = prompt::user_message(question, context);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: self.temperature,
        };
        debug!(context_chars = context.len(), "requesting answer");

        let resp = self
            .policy
            .send(|| self.client.post(&self.endpoint).json(&body))
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = error_body(resp).await;
            return Err(ChatError::Status { status, body });
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ChatError::MalformedResponse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ChatError::MalformedResponse("no choices returned".to_string()))
    }

    /// Like [`try_generate`](Self::try_generate), but never fails: errors
    /// are logged and [`FALLBACK_ANSWER`] is returned.
    pub async fn generate(&self, question: &str, context: &str) -> String {
        match self.try_generate(question, context).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("{e}");
                FALLBACK_ANSWER.to_string()
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}
