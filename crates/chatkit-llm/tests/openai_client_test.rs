use chatkit_llm::{ChatClient, ChatRequest, LlmError, Message, OpenAIClient, StreamEvent};
use chatkit_types::ModelConfig;
use futures::StreamExt;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SSE_BODY: &str = concat!(
    "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"}}]}\n\n",
    "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel\"}}]}\n\n",
    "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"}}]}\n\n",
    "data: [DONE]\n\n",
);

fn model(server: &MockServer) -> ModelConfig {
    ModelConfig::new("test-model", format!("{}/v1/chat/completions", server.uri()))
}

async fn collect_text(client: &OpenAIClient, request: ChatRequest) -> String {
    let mut stream = client.chat_stream(request).await.unwrap();
    let mut text = String::new();
    while let Some(event) = stream.next().await {
        if let StreamEvent::Message { content } = event.unwrap() {
            text.push_str(&content);
        }
    }
    text
}

#[tokio::test]
async fn test_stream_with_bearer_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "stream": true,
            "messages": [{"role": "user", "content": "Hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SSE_BODY, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAIClient::new().unwrap();
    let request = ChatRequest::for_model(
        &model(&server).with_api_key("sk-test"),
        vec![Message::human("Hi")],
    );

    assert_eq!(collect_text(&client, request).await, "Hello");
}

#[tokio::test]
async fn test_no_authorization_header_without_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SSE_BODY, "text/event-stream"))
        .mount(&server)
        .await;

    let client = OpenAIClient::new().unwrap();
    let request = ChatRequest::for_model(&model(&server), vec![Message::human("Hi")]);
    assert_eq!(collect_text(&client, request).await, "Hello");

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let client = OpenAIClient::new().unwrap();
    let request = ChatRequest::for_model(&model(&server), vec![Message::human("Hi")]);

    match client.chat_stream(request).await {
        Err(LlmError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        Err(other) => panic!("Expected status error, got {other}"),
        Ok(_) => panic!("Expected status error, got a stream"),
    }
}

#[tokio::test]
async fn test_status_error_message() {
    let err = LlmError::Status {
        status: 500,
        body: String::new(),
    };
    assert_eq!(err.to_string(), "HTTP error! status: 500");
}

#[tokio::test]
async fn test_timeout_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(SSE_BODY, "text/event-stream")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = OpenAIClient::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let request = ChatRequest::for_model(&model(&server), vec![Message::human("Hi")]);

    assert!(matches!(
        client.chat_stream(request).await,
        Err(LlmError::Network(_))
    ));
}

#[tokio::test]
async fn test_connection_refused_is_a_network_error() {
    let client = OpenAIClient::new().unwrap();
    let request = ChatRequest::new(
        "http://127.0.0.1:9/v1/chat/completions",
        "m",
        vec![Message::human("Hi")],
    );

    assert!(matches!(
        client.chat_stream(request).await,
        Err(LlmError::Network(_))
    ));
}
