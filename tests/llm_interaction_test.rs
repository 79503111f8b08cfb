use qupal::catalog::SYSTEM_PROMPT;
use qupal::llm_interaction::{LlmClient, LlmConfig};
use qupal::{ModelCaller, ModelError};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> LlmConfig {
    LlmConfig {
        api_url: format!("{}/v1/chat/completions", server.uri()),
        model: "test-model".to_string(),
        max_tokens: 64,
        timeout: Duration::from_secs(5),
    }
}

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

#[test_log::test(tokio::test)]
async fn test_chat_sends_system_and_user_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  Check the seams.  ")))
        .expect(1)
        .mount(&server)
        .await;

    let client = LlmClient::new(config_for(&server)).unwrap();
    let reply = client
        .chat("sk-test", SYSTEM_PROMPT, "how do I check a jacket?")
        .await
        .unwrap();
    assert_eq!(reply, "Check the seams.");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["max_tokens"], 64);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "how do I check a jacket?");
}

#[tokio::test]
async fn test_error_status_is_reported_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let client = LlmClient::new(config_for(&server)).unwrap();
    match client.chat("sk-bad", SYSTEM_PROMPT, "hello").await {
        Err(ModelError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = LlmClient::new(config_for(&server)).unwrap();
    assert!(matches!(
        client.chat("sk-test", SYSTEM_PROMPT, "hello").await,
        Err(ModelError::EmptyResponse)
    ));
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = LlmClient::new(config_for(&server)).unwrap();
    assert!(matches!(
        client.chat("sk-test", SYSTEM_PROMPT, "hello").await,
        Err(ModelError::Decode(_))
    ));
}

#[tokio::test]
async fn test_slow_model_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.timeout = Duration::from_millis(200);
    let client = LlmClient::new(config).unwrap();
    assert!(matches!(
        client.chat("sk-test", SYSTEM_PROMPT, "hello").await,
        Err(ModelError::Request(_))
    ));
}

#[tokio::test]
async fn test_keyed_model_without_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let client = LlmClient::new(config_for(&server)).unwrap();
    let model = client.with_key(None);
    assert!(matches!(
        model.complete(SYSTEM_PROMPT, "hello").await,
        Err(ModelError::MissingApiKey)
    ));

    let model = client.with_key(Some("sk-test".to_string()));
    server.reset().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("vintage finds")))
        .expect(1)
        .mount(&server)
        .await;
    assert_eq!(model.complete(SYSTEM_PROMPT, "hello").await.unwrap(), "vintage finds");
}
