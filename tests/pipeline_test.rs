/// End-to-end tests for the question pipeline against mocked upstreams.
///
/// Tests the complete flow:
///   Config → Embedder → Index → Rerank → Context → Chat
mod common;

use campus_qa::answer::FALLBACK_ANSWER;
use campus_qa::pipeline::{EMPTY_QUESTION_MESSAGE, NO_RESULTS_MESSAGE, Outcome, QaPipeline};
use campus_qa::search::{VectorSearch, extract_keywords, rerank};
use common::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{any, body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WELLNESS_Q: &str = "Who provides wellness services?";

fn timelycare_match() -> serde_json::Value {
    json!([{
        "id": "wellness-1",
        "score": 0.5,
        "metadata": {
            "text_content": "Students get free 24/7 virtual care through TimelyCare.",
            "title": "Student Wellness",
            "url": "https://www.mccd.edu/wellness"
        }
    }])
}

/// A single TimelyCare match is boosted and answered from.
#[tokio::test]
async fn test_wellness_question_answered() {
    let server = MockServer::start().await;
    mount(&server, "/embeddings", embeddings_ok(), 1).await;
    mount(&server, "/query", matches(timelycare_match()), 1).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("TimelyCare"))
        .and(body_string_contains("Merced College"))
        .respond_with(chat_ok("Wellness services are provided by **TimelyCare**."))
        .expect(1)
        .mount(&server)
        .await;

    let reply = pipeline_for(&server).ask(WELLNESS_Q).await;
    assert!(reply.notices.is_empty(), "{:?}", reply.notices);
    match reply.outcome {
        Outcome::Answered { answer, sources } => {
            assert!(answer.contains("TimelyCare"));
            assert_eq!(sources.len(), 1);
            assert_eq!(sources[0].title, "Student Wellness");
            assert_eq!(sources[0].url, "https://www.mccd.edu/wellness");
        }
        other => panic!("expected an answer, got {other:?}"),
    }
}

/// The boosted score of the TimelyCare match is at least raw + 0.1.
#[tokio::test]
async fn test_wellness_match_boosted() {
    let server = MockServer::start().await;
    mount(&server, "/embeddings", embeddings_ok(), 1).await;
    mount(&server, "/query", matches(timelycare_match()), 1).await;

    let config = config_for(&server);
    let embedder = Arc::new(
        campus_qa::embedder::openai::OpenAiEmbedder::new(
            "sk-test",
            &config.embedding.base_url,
            &config.embedding.model,
            config.http_policy(),
        )
        .unwrap(),
    );
    let search = VectorSearch::new(&config.index.url, "pc-test", embedder, config.http_policy())
        .unwrap();

    let candidates = search.search(WELLNESS_Q, 5).await;
    let ranked = rerank(candidates, &extract_keywords(WELLNESS_Q), 5, "text_content");
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].candidate.id.as_deref(), Some("wellness-1"));
    assert!(ranked[0].boosted_score >= 0.6 - 1e-6, "{:?}", ranked[0]);
}

/// Embedding failure: no search, no generation, "no relevant information".
#[tokio::test]
async fn test_embedding_failure_shows_no_results() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/embeddings",
        ResponseTemplate::new(500).set_body_string("upstream down"),
        1,
    )
    .await;
    mount(&server, "/query", matches(timelycare_match()), 0).await;
    mount(&server, "/chat/completions", chat_ok("never"), 0).await;

    let reply = pipeline_for(&server).ask(WELLNESS_Q).await;
    assert_eq!(reply.outcome, Outcome::NoResults);
    assert_eq!(reply.warning(), Some(NO_RESULTS_MESSAGE));
    assert_eq!(reply.notices.len(), 1);
    assert!(reply.notices[0].contains("upstream down"), "{:?}", reply.notices);
}

/// Empty question: prompt for input, nothing sent upstream.
#[tokio::test]
async fn test_empty_question_makes_no_calls() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline_for(&server);
    for question in ["", "   \n"] {
        let reply = pipeline.ask(question).await;
        assert_eq!(reply.outcome, Outcome::EmptyQuestion);
        assert_eq!(reply.warning(), Some(EMPTY_QUESTION_MESSAGE));
        assert!(reply.notices.is_empty());
    }
}

/// Generation failure: fixed fallback answer, sources still listed.
#[tokio::test]
async fn test_generation_failure_uses_fallback() {
    let server = MockServer::start().await;
    mount(&server, "/embeddings", embeddings_ok(), 1).await;
    mount(&server, "/query", matches(timelycare_match()), 1).await;
    mount(
        &server,
        "/chat/completions",
        ResponseTemplate::new(429).set_body_string("rate limited"),
        1,
    )
    .await;

    let reply = pipeline_for(&server).ask(WELLNESS_Q).await;
    match &reply.outcome {
        Outcome::Answered { answer, sources } => {
            assert_eq!(answer, FALLBACK_ANSWER);
            assert_eq!(sources.len(), 1);
        }
        other => panic!("expected fallback answer, got {other:?}"),
    }
    assert!(reply.notices[0].contains("rate limited"));
}

/// Search failure degrades to no results without calling the chat model.
#[tokio::test]
async fn test_index_failure_shows_no_results() {
    let server = MockServer::start().await;
    mount(&server, "/embeddings", embeddings_ok(), 1).await;
    mount(
        &server,
        "/query",
        ResponseTemplate::new(401).set_body_string("bad api key"),
        1,
    )
    .await;
    mount(&server, "/chat/completions", chat_ok("never"), 0).await;

    let reply = pipeline_for(&server).ask("What is tuition?").await;
    assert_eq!(reply.outcome, Outcome::NoResults);
    assert!(reply.notices[0].contains("bad api key"));
}

/// An index with no matches is "no results" and skips generation.
#[tokio::test]
async fn test_no_matches_skips_generation() {
    let server = MockServer::start().await;
    mount(&server, "/embeddings", embeddings_ok(), 1).await;
    mount(&server, "/query", matches(json!([])), 1).await;
    mount(&server, "/chat/completions", chat_ok("never"), 0).await;

    let reply = pipeline_for(&server).ask("What is tuition?").await;
    assert_eq!(reply.outcome, Outcome::NoResults);
    assert!(reply.notices.is_empty());
}

/// The keyword boost decides which passages become context.
#[tokio::test]
async fn test_rerank_order_reaches_context() {
    let server = MockServer::start().await;
    mount(&server, "/embeddings", embeddings_ok(), 1).await;
    mount(
        &server,
        "/query",
        matches(json!([
            {"score": 0.82, "metadata": {"text_content": "Campus parking permits", "title": "Parking", "url": "u1"}},
            {"score": 0.80, "metadata": {"text_content": "Tuition is free for first-year students with financial aid", "title": "Promise", "url": "u2"}},
            {"score": 0.78, "metadata": {"text_content": "Library hours", "title": "Library", "url": "u3"}}
        ])),
        1,
    )
    .await;
    mount(&server, "/chat/completions", chat_ok("Tuition can be free."), 1).await;

    let reply = pipeline_for(&server).ask_with_top_k("Is it free?", 2).await;
    match reply.outcome {
        Outcome::Answered { sources, .. } => {
            let titles: Vec<&str> = sources.iter().map(|s| s.title.as_str()).collect();
            assert_eq!(titles, vec!["Promise", "Parking"]);
        }
        other => panic!("expected an answer, got {other:?}"),
    }
}

fn slow_pipeline(server: &MockServer) -> QaPipeline {
    let mut config = config_for(server);
    config.http.timeout_secs = 1;
    QaPipeline::from_config(&config, &credentials()).unwrap()
}

/// An index slower than the timeout is reported and means no results.
#[tokio::test]
async fn test_index_timeout_is_no_results() {
    let server = MockServer::start().await;
    mount(&server, "/embeddings", embeddings_ok(), 1).await;
    mount(
        &server,
        "/query",
        matches(timelycare_match()).set_delay(Duration::from_secs(2)),
        1,
    )
    .await;
    mount(&server, "/chat/completions", chat_ok("unused"), 0).await;

    let reply = slow_pipeline(&server).ask(WELLNESS_Q).await;
    assert_eq!(reply.outcome, Outcome::NoResults);
    assert_eq!(reply.notices.len(), 1, "{:?}", reply.notices);
}

/// The same timeout applies to the embedding call.
#[tokio::test]
async fn test_embedding_timeout_is_no_results() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/embeddings",
        embeddings_ok().set_delay(Duration::from_secs(2)),
        1,
    )
    .await;
    mount(&server, "/query", matches(timelycare_match()), 0).await;
    mount(&server, "/chat/completions", chat_ok("unused"), 0).await;

    let reply = slow_pipeline(&server).ask(WELLNESS_Q).await;
    assert_eq!(reply.outcome, Outcome::NoResults);
    assert_eq!(reply.notices.len(), 1, "{:?}", reply.notices);
    assert!(reply.notices[0].contains("embedding"), "{:?}", reply.notices);
}

/// A chat model slower than the timeout yields the fallback answer.
#[tokio::test]
async fn test_chat_timeout_is_fallback() {
    let server = MockServer::start().await;
    mount(&server, "/embeddings", embeddings_ok(), 1).await;
    mount(&server, "/query", matches(timelycare_match()), 1).await;
    mount(
        &server,
        "/chat/completions",
        chat_ok("too late").set_delay(Duration::from_secs(2)),
        1,
    )
    .await;

    let reply = slow_pipeline(&server).ask(WELLNESS_Q).await;
    assert_eq!(reply.notices.len(), 1, "{:?}", reply.notices);
    match reply.outcome {
        Outcome::Answered { answer, sources } => {
            assert_eq!(answer, FALLBACK_ANSWER);
            assert_eq!(sources.len(), 1);
        }
        other => panic!("expected the fallback answer, got {other:?}"),
    }
}

/// An oversized `top_k` is clamped before it reaches the index.
#[tokio::test]
async fn test_huge_top_k_is_clamped() {
    let server = MockServer::start().await;
    mount(&server, "/embeddings", embeddings_ok(), 1).await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_partial_json(json!({"top_k": 100})))
        .respond_with(matches(timelycare_match()))
        .expect(1)
        .mount(&server)
        .await;
    mount(&server, "/chat/completions", chat_ok("TimelyCare."), 1).await;

    let reply = pipeline_for(&server)
        .ask_with_top_k(WELLNESS_Q, usize::MAX)
        .await;
    assert!(reply.notices.is_empty(), "{:?}", reply.notices);
    assert!(matches!(reply.outcome, Outcome::Answered { .. }));
}
