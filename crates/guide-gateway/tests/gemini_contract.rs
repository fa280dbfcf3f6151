//! HTTP contract tests for the Gemini gateway against a local mock server.

use futures_util::StreamExt;
use guide_core::config::{FactsConfig, ModelConfig, DEFAULT_FACT_PROMPT};
use guide_core::UploadedArtifact;
use guide_gateway::{ChatSession, GatewayError, GeminiConfig, GeminiGateway, ModelGateway};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash-latest:generateContent";
const STREAM_PATH: &str = "/v1beta/models/gemini-1.5-flash-latest:streamGenerateContent";

fn gateway(server: &MockServer) -> GeminiGateway {
    let config = GeminiConfig::new("test-key", &ModelConfig::default(), &FactsConfig::default())
        .with_base_url(format!("{}/v1beta", server.uri()));
    GeminiGateway::new(config).unwrap()
}

fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn sse_body(chunks: &[&str]) -> String {
    chunks
        .iter()
        .map(|c| {
            let payload = json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": c }] } }] });
            format!("data: {}\r\n\r\n", payload)
        })
        .collect()
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_insight_sends_question_then_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("A Ming vase.")))
        .expect(1)
        .mount(&server)
        .await;

    let image = b"\xFF\xD8\xFF\xE0jpeg-bytes".to_vec();
    let artifact = UploadedArtifact::new(image, Some("Which dynasty?".into())).unwrap();
    let text = gateway(&server).generate_insight(&artifact).await.unwrap();
    assert_eq!(text, "A Ming vase.");

    let bodies = request_bodies(&server).await;
    let parts = &bodies[0]["contents"][0]["parts"];
    assert_eq!(parts[0]["text"], "Which dynasty?");
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
    assert!(parts[1]["inlineData"]["data"].as_str().unwrap().len() > 0);
    assert!(bodies[0].get("systemInstruction").is_none());
}

#[tokio::test]
async fn test_insight_without_question_sends_image_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("A bronze bell.")))
        .mount(&server)
        .await;

    let artifact = UploadedArtifact::new(b"\x89PNG\r\n\x1a\ndata".to_vec(), None).unwrap();
    gateway(&server).generate_insight(&artifact).await.unwrap();

    let bodies = request_bodies(&server).await;
    let parts = bodies[0]["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
}

#[tokio::test]
async fn test_fact_uses_fixed_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Fact1")))
        .mount(&server)
        .await;

    let fact = gateway(&server).generate_fact().await.unwrap();
    assert_eq!(fact, "Fact1");

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0]["contents"][0]["parts"][0]["text"], DEFAULT_FACT_PROMPT);
    assert_eq!(bodies[0]["contents"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_rate_limit_maps_to_quota_exceeded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
        })))
        .mount(&server)
        .await;

    let err = gateway(&server).generate_fact().await.unwrap_err();
    assert_eq!(
        err,
        GatewayError::QuotaExceeded("Resource has been exhausted".into())
    );
}

#[tokio::test]
async fn test_server_error_maps_to_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": 500, "message": "Internal error", "status": "INTERNAL" }
        })))
        .mount(&server)
        .await;

    let err = gateway(&server).generate_fact().await.unwrap_err();
    assert_eq!(err, GatewayError::Service("HTTP 500: Internal error".into()));
}

#[tokio::test]
async fn test_blocked_response_is_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "promptFeedback": { "blockReason": "SAFETY" } })),
        )
        .mount(&server)
        .await;

    let err = gateway(&server).generate_fact().await.unwrap_err();
    assert!(!err.is_quota());
    assert!(err.to_string().contains("SAFETY"));
}

#[tokio::test]
async fn test_chat_streams_and_carries_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_body(&["The ", "pharaohs ", "did."])),
        )
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let mut chat = gateway.start_chat();
    assert_eq!(chat.history_len(), 0);

    let stream = chat.send_turn("Who built the pyramids?").await.unwrap();
    let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;
    assert_eq!(chunks, vec!["The ", "pharaohs ", "did."]);
    assert_eq!(chat.history_len(), 2);

    let stream = chat.send_turn("When?").await.unwrap();
    let _: Vec<_> = stream.collect().await;
    assert_eq!(chat.history_len(), 4);

    let bodies = request_bodies(&server).await;
    assert!(bodies[0]["systemInstruction"]["parts"][0]["text"].is_string());
    let second = bodies[1]["contents"].as_array().unwrap();
    assert_eq!(second.len(), 3);
    assert_eq!(second[0]["role"], "user");
    assert_eq!(second[1]["role"], "model");
    assert_eq!(second[1]["parts"][0]["text"], "The pharaohs did.");
    assert_eq!(second[2]["parts"][0]["text"], "When?");
}

#[tokio::test]
async fn test_chat_partial_read_records_partial_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_body(&["First ", "second"])),
        )
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let mut chat = gateway.start_chat();
    let mut stream = chat.send_turn("Tell me a story").await.unwrap();
    assert_eq!(stream.next().await, Some(Ok("First ".to_string())));
    drop(stream);
    assert_eq!(chat.history_len(), 2);
}

#[tokio::test]
async fn test_chat_http_failure_commits_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "slow down", "status": "RESOURCE_EXHAUSTED" }
        })))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let mut chat = gateway.start_chat();
    let err = match chat.send_turn("Hello").await {
        Ok(_) => panic!("expected the send to fail"),
        Err(e) => e,
    };
    assert!(err.is_quota());
    assert_eq!(chat.history_len(), 0);
}

#[tokio::test]
async fn test_chat_in_band_error_surfaces_after_chunks() {
    let server = MockServer::start().await;
    let mut body = sse_body(&["Partial"]);
    body.push_str("data: {\"error\":{\"code\":503,\"message\":\"overloaded\",\"status\":\"UNAVAILABLE\"}}\n\n");
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let mut chat = gateway.start_chat();
    let items: Vec<_> = chat.send_turn("Hi").await.unwrap().collect().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], Ok("Partial".to_string()));
    assert_eq!(items[1], Err(GatewayError::Service("overloaded".into())));
}
