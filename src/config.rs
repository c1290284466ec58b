/// Configuration module for campus-qa.
///
/// Handles loading, validating, and providing default configuration values
/// for one deployment (branding, upstream endpoints, retrieval settings),
/// plus the two API credentials that must be present before any call.
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::http::HttpPolicy;

/// Upper bound for any requested number of passages.
pub const MAX_SEARCH_TOP_K: usize = 50;

// ── Default value functions ──────────────────────────────────────────

fn default_institution() -> String {
    "Merced College".to_string()
}

fn default_short_name() -> String {
    "Merced".to_string()
}

fn default_description() -> String {
    "a California community college".to_string()
}

fn default_title() -> String {
    "Merced College Q&A".to_string()
}

fn default_tagline() -> String {
    "Ask questions about Merced College's programs, services, and more.".to_string()
}

fn default_logo_url() -> Option<String> {
    Some(
        "https://coursedog-images-public.s3.us-east-2.amazonaws.com/undefined/MC-primary-logo.png"
            .to_string(),
    )
}

fn default_backdrop_color() -> String {
    "#C38F00".to_string()
}

fn default_button_color() -> String {
    "#00205C".to_string()
}

fn default_index_url() -> String {
    "https://mccd-docs-h3y3rrq.svc.aped-4627-b74a.pinecone.io".to_string()
}

fn default_text_field() -> String {
    "text_content".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_chat_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_search_top_k() -> usize {
    5
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

fn default_examples() -> Vec<ExampleQuestion> {
    [
        (
            "Who provides wellness services?",
            "Who provides wellness services at Merced?",
        ),
        ("What is tuition at Merced?", "What is tuition at Merced?"),
        ("What programs are offered?", "What programs does Merced offer?"),
        (
            "How long to complete a program?",
            "How long does it take to complete a program?",
        ),
    ]
    .into_iter()
    .map(|(label, question)| ExampleQuestion {
        label: label.to_string(),
        question: question.to_string(),
    })
    .collect()
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default)]
    pub branding: BrandingConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub http: HttpConfig,

    /// Preset questions shown as buttons above the text field.
    #[serde(default = "default_examples")]
    pub examples: Vec<ExampleQuestion>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BrandingConfig {
    /// Full institution name, used in the page and the system instruction.
    #[serde(default = "default_institution")]
    pub institution: String,

    #[serde(default = "default_short_name")]
    pub short_name: String,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_tagline")]
    pub tagline: String,

    #[serde(default = "default_logo_url", skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    #[serde(default = "default_backdrop_color")]
    pub backdrop_color: String,

    #[serde(default = "default_button_color")]
    pub button_color: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexConfig {
    /// Base URL of the hosted index; `/query` is appended when missing.
    #[serde(default = "default_index_url")]
    pub url: String,

    /// Metadata field holding the passage text (`text` or `text_content`).
    #[serde(default = "default_text_field")]
    pub text_field: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_openai_base")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_openai_base")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// Outbound request policy shared by all three upstream clients.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after the first; 0 disables retrying.
    #[serde(default)]
    pub max_retries: usize,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ExampleQuestion {
    pub label: String,
    pub question: String,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            search_top_k: default_search_top_k(),
            bind: default_bind(),
            branding: BrandingConfig::default(),
            index: IndexConfig::default(),
            embedding: EmbeddingConfig::default(),
            chat: ChatConfig::default(),
            http: HttpConfig::default(),
            examples: default_examples(),
        }
    }
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            institution: default_institution(),
            short_name: default_short_name(),
            description: default_description(),
            title: default_title(),
            tagline: default_tagline(),
            logo_url: default_logo_url(),
            backdrop_color: default_backdrop_color(),
            button_color: default_button_color(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: default_index_url(),
            text_field: default_text_field(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base(),
            model: default_embedding_model(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base(),
            model: default_chat_model(),
            temperature: default_temperature(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON or TOML file.
    ///
    /// The format is picked from the extension (`.toml`, anything else is
    /// JSON). A missing file yields the default deployment.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = if is_toml(path) {
            toml::from_str(&data).with_context(|| format!("invalid TOML in {path}"))?
        } else {
            serde_json::from_str(&data).with_context(|| format!("invalid JSON in {path}"))?
        };

        info!("Loaded configuration from {path}");

        if cfg.examples.is_empty() {
            warn!("{path} defines no example questions");
        }

        Ok(cfg)
    }

    /// Save configuration to a JSON or TOML file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = if is_toml(path) {
            toml::to_string_pretty(self).context("failed to marshal config")?
        } else {
            serde_json::to_string_pretty(self).context("failed to marshal config")?
        };
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (1..=MAX_SEARCH_TOP_K).contains(&self.search_top_k),
            "search_top_k must be within [1, {MAX_SEARCH_TOP_K}]"
        );
        anyhow::ensure!(
            is_hex_color(&self.branding.backdrop_color),
            "branding.backdrop_color must be #RRGGBB"
        );
        anyhow::ensure!(
            is_hex_color(&self.branding.button_color),
            "branding.button_color must be #RRGGBB"
        );
        anyhow::ensure!(
            !self.index.url.trim().is_empty(),
            "index.url must not be empty"
        );
        anyhow::ensure!(
            !self.index.text_field.trim().is_empty(),
            "index.text_field must not be empty"
        );
        anyhow::ensure!(
            !self.embedding.model.trim().is_empty(),
            "embedding.model must not be empty"
        );
        anyhow::ensure!(
            !self.chat.model.trim().is_empty(),
            "chat.model must not be empty"
        );
        anyhow::ensure!(
            (0.0..=2.0).contains(&self.chat.temperature),
            "chat.temperature must be within [0, 2]"
        );
        anyhow::ensure!(self.http.timeout_secs > 0, "http.timeout_secs must be positive");
        Ok(())
    }

    /// Outbound request policy derived from the `http` section.
    #[must_use]
    pub fn http_policy(&self) -> HttpPolicy {
        HttpPolicy {
            timeout: Duration::from_secs(self.http.timeout_secs),
            max_retries: self.http.max_retries,
            retry_backoff: Duration::from_millis(self.http.retry_backoff_ms),
        }
    }
}

/// Clamp a requested passage count into `[1, MAX_SEARCH_TOP_K]`, using
/// `default` when nothing (or zero) was asked for.
pub fn effective_top_k(requested: Option<usize>, default: usize) -> usize {
    requested
        .filter(|k| *k > 0)
        .unwrap_or(default)
        .clamp(1, MAX_SEARCH_TOP_K)
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_toml(path: &str) -> bool {
    Path::new(path).extension().and_then(|e| e.to_str()) == Some("toml")
}

// ── Credentials ──────────────────────────────────────────────────────

/// Missing secrets. Fatal: nothing is sent upstream without both keys.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing API key: {0}")]
    MissingCredential(&'static str),
}

/// API keys for the embedding/generation provider and the vector index.
#[derive(Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub index_api_key: String,
}

impl Credentials {
    /// Build credentials, rejecting absent or blank keys.
    pub fn new(
        openai_api_key: Option<String>,
        index_api_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let openai_api_key = non_blank(openai_api_key)
            .ok_or(ConfigError::MissingCredential("OPENAI_API_KEY"))?;
        let index_api_key = non_blank(index_api_key)
            .ok_or(ConfigError::MissingCredential("PINECONE_API_KEY"))?;
        Ok(Self {
            openai_api_key,
            index_api_key,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &"<redacted>")
            .field("index_api_key", &"<redacted>")
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ── Tests ────────────────────────────────────────────────────────────
