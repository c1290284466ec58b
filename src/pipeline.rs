/// Question → search → rerank → context → answer, strictly in sequence.
///
/// Every stage degrades instead of failing: a broken search yields
/// `NoResults`, a broken generation yields the fallback answer, and the
/// upstream error text is kept as a notice for the page.
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::answer::{AnswerGenerator, ContextDocument, FALLBACK_ANSWER, Source};
use crate::config::{Config, Credentials, MAX_SEARCH_TOP_K};
use crate::embedder::Embedder;
use crate::embedder::openai::OpenAiEmbedder;
use crate::search::{VectorSearch, extract_keywords, rerank};

pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question or select an example.";
pub const NO_RESULTS_MESSAGE: &str = "No relevant information found.";

/// What one interaction produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    EmptyQuestion,
    NoResults,
    Answered {
        answer: String,
        sources: Vec<Source>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Upstream errors to show inline, in the order they happened.
    pub notices: Vec<String>,
}

impl Reply {
    fn new(outcome: Outcome, notices: Vec<String>) -> Self {
        Self { outcome, notices }
    }

    /// The warning to show instead of an answer, if any.
    pub fn warning(&self) -> Option<&'static str> {
        match self.outcome {
            Outcome::EmptyQuestion => Some(EMPTY_QUESTION_MESSAGE),
            Outcome::NoResults => Some(NO_RESULTS_MESSAGE),
            Outcome::Answered { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct QaPipeline {
    search: VectorSearch,
    answers: AnswerGenerator,
    top_k: usize,
    text_field: String,
}

impl QaPipeline {
    pub fn new(
        search: VectorSearch,
        answers: AnswerGenerator,
        top_k: usize,
        text_field: impl Into<String>,
    ) -> Self {
        Self {
            search,
            answers,
            top_k,
            text_field: text_field.into(),
        }
    }

    /// Wire the HTTP clients for a deployment.
    pub fn from_config(config: &Config, credentials: &Credentials) -> anyhow::Result<Self> {
        let policy = config.http_policy();
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(
            &credentials.openai_api_key,
            &config.embedding.base_url,
            &config.embedding.model,
            policy,
        )?);
        info!(model = embedder.model(), "embedding client ready");
        let search = VectorSearch::new(
            &config.index.url,
            &credentials.index_api_key,
            embedder,
            policy,
        )?;
        let answers = AnswerGenerator::new(
            &credentials.openai_api_key,
            &config.chat,
            &config.branding,
            policy,
        )?;
        Ok(Self::new(
            search,
            answers,
            config.search_top_k,
            config.index.text_field.clone(),
        ))
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer one question with the configured number of results.
    pub async fn ask(&self, question: &str) -> Reply {
        self.ask_with_top_k(question, self.top_k).await
    }

    /// `top_k` is clamped into `[1, MAX_SEARCH_TOP_K]`.
    pub async fn ask_with_top_k(&self, question: &str, top_k: usize) -> Reply {
        let top_k = top_k.clamp(1, MAX_SEARCH_TOP_K);
        let question = question.trim();
        if question.is_empty() {
            return Reply::new(Outcome::EmptyQuestion, Vec::new());
        }
        info!(top_k, "answering question: {question}");

        let mut notices = Vec::new();
        let matches = match self.search.try_search(question, top_k).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Search error: {e}");
                notices.push(e.to_string());
                Vec::new()
            }
        };
        if matches.is_empty() {
            return Reply::new(Outcome::NoResults, notices);
        }

        let keywords = extract_keywords(question);
        let ranked = rerank(matches, &keywords, top_k, &self.text_field);
        if ranked.is_empty() {
            return Reply::new(Outcome::NoResults, notices);
        }
        let context = ContextDocument::from_ranked(&ranked, &self.text_field);

        let answer = match self.answers.try_generate(question, &context.text).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("{e}");
                notices.push(e.to_string());
                FALLBACK_ANSWER.to_string()
            }
        };

        Reply::new(
            Outcome::Answered {
                answer,
                sources: context.sources,
            },
            notices,
        )
    }
}
