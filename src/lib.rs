//! # campus-qa — college Q&A over a hosted vector index
//!
//! Answers natural-language questions about a college's programs and
//! services. A question is embedded, matched against a hosted vector
//! index, re-ranked with a keyword boost, and answered by a chat model that
//! is told to stay within the retrieved passages.
//!
//! ## Architecture
//!
//! - **[`config`]** — Deployment configuration (branding, endpoints, retrieval) and credentials
//! - **[`http`]** — Uniform timeout/retry policy for every upstream call
//! - **[`embedder`]** — Text embedding via an OpenAI-compatible API
//! - **[`search`]** — Index queries, keyword extraction and re-ranking
//! - **[`answer`]** — Context assembly and grounded answer generation
//! - **[`pipeline`]** — The sequential question → answer flow
//! - **[`web`]** — axum front end (page, JSON API, health)

pub mod answer;
pub mod config;
pub mod embedder;
pub mod http;
pub mod pipeline;
pub mod search;
pub mod web;
