#![allow(dead_code)]
//! Shared fixtures: a deployment config whose three upstreams all point at
//! one wiremock server.
use campus_qa::config::{Config, Credentials};
use campus_qa::pipeline::QaPipeline;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.embedding.base_url = server.uri();
    config.chat.base_url = server.uri();
    config.index.url = server.uri();
    config.http.retry_backoff_ms = 1;
    config
}

pub fn credentials() -> Credentials {
    Credentials::new(Some("sk-test".into()), Some("pc-test".into())).unwrap()
}

pub fn pipeline_for(server: &MockServer) -> QaPipeline {
    QaPipeline::from_config(&config_for(server), &credentials()).unwrap()
}

pub fn embeddings_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": [{"embedding": [0.01, 0.02, 0.03, 0.04], "index": 0}]
    }))
}

pub fn matches(matches: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "matches": matches }))
}

pub fn chat_ok(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

pub async fn mount(server: &MockServer, route: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}
