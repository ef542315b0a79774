use chatkit_cli::commands::{AttachSource, Command};
use chatkit_cli::config::Config;
use chatkit_cli::handlers::{execute, Reply};
use chatkit_cli::state::AppState;
use chatkit_llm::OpenAIClient;
use chatkit_persist::InMemoryModelStorage;
use chatkit_session::{SessionEvent, StreamOutcome};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SSE_BODY: &str = concat!(
    "data: {\"choices\":[{\"delta\":{\"content\":\"A\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"B\"}}]}\n\n",
    "data: [DONE]\n\n",
);

async fn start() -> (Arc<AppState>, mpsc::Receiver<SessionEvent>) {
    let config: Config = toml::from_str("[session]\ngreeting = \"\"").unwrap();
    AppState::start(
        config,
        Arc::new(InMemoryModelStorage::new()),
        Arc::new(OpenAIClient::new().unwrap()),
    )
    .await
    .unwrap()
}

async fn run(state: &Arc<AppState>, line: &str) -> Reply {
    let command = Command::parse(line).unwrap().unwrap();
    execute(state, command).await.unwrap()
}

async fn text(state: &Arc<AppState>, line: &str) -> String {
    match run(state, line).await {
        Reply::Text(text) => text,
        _ => panic!("expected a text reply for {}", line),
    }
}

async fn send(state: &Arc<AppState>, line: &str) -> StreamOutcome {
    match run(state, line).await {
        Reply::Streaming(task) => tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap(),
        _ => panic!("expected a streaming reply for {}", line),
    }
}

async fn mock_completions(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SSE_BODY, "text/event-stream"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_send_streams_into_history() {
    let server = MockServer::start().await;
    mock_completions(&server).await;
    let (state, _events) = start().await;

    let added = text(
        &state,
        &format!("/add test-model {}/v1/chat/completions sk-test", server.uri()),
    )
    .await;
    assert!(added.starts_with("Saved; now using test-model-"));

    assert_eq!(send(&state, "Hello").await, StreamOutcome::Completed);

    let history = text(&state, "/history").await;
    assert_eq!(history, "1. user> Hello\n2. assistant> AB\n");
}

#[tokio::test]
async fn test_send_without_model_reports_error() {
    let (state, _events) = start().await;

    let outcome = send(&state, "Hello").await;

    assert!(matches!(outcome, StreamOutcome::Failed { .. }));
    assert_eq!(
        text(&state, "/history").await,
        "1. error> Please configure and select an AI model first\n"
    );
}

#[tokio::test]
async fn test_http_error_becomes_error_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    let (state, _events) = start().await;
    text(&state, &format!("/add m {}/v1/chat/completions", server.uri())).await;

    let outcome = send(&state, "Hello").await;

    assert_eq!(
        outcome,
        StreamOutcome::Failed {
            message: "Error: HTTP error! status: 500".to_string()
        }
    );
    let history = text(&state, "/history").await;
    assert!(history.ends_with("3. error> Error: HTTP error! status: 500\n"));
}

#[tokio::test]
async fn test_attached_file_is_sent_as_fenced_code() {
    let server = MockServer::start().await;
    mock_completions(&server).await;
    let (state, _events) = start().await;
    text(
        &state,
        &format!("/add m {}/v1/chat/completions sk-test", server.uri()),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("main.py");
    std::fs::write(&file, "print(1)").unwrap();

    let queued = execute(
        &state,
        Command::Attach(AttachSource::Code {
            language: "python".to_string(),
            path: file.display().to_string(),
        }),
    )
    .await
    .unwrap();
    assert!(matches!(queued, Reply::Text(ref t) if t == "Queued code attachment (1 pending)"));

    send(&state, "What does this print?").await;

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body["messages"],
        json!([{
            "role": "user",
            "content": "What does this print?\n\n```python\nprint(1)\n```"
        }])
    );
    assert_eq!(text(&state, "/pending").await, "No pending attachments");
}

#[tokio::test]
async fn test_host_events_reach_pending_queue() {
    let (state, _events) = start().await;

    text(
        &state,
        r#"/event {"id": 1, "type": "chart", "data": "https://img/1.png", "output": {"id": "cell-1", "title": "Cell 1"}, "initialMessage": "Describe the chart"}"#,
    )
    .await;
    text(&state, r#"/event {"id": "1", "type": "chart", "data": "again"}"#).await;

    let mut attempts = 0;
    while state.session.pending().is_empty() && attempts < 100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        attempts += 1;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(state.session.pending().len(), 1);
    assert_eq!(state.session.draft(), "Describe the chart");
    assert!(text(&state, "/pending").await.starts_with("Cell 1 [cell-1]\n"));

    assert_eq!(
        text(&state, "/group cell-1").await,
        "Removed 1 attachments from [cell-1]"
    );

    text(&state, "/attach chart https://img/2.png").await;
    let id = state.session.pending()[0].id.clone();
    assert_eq!(
        text(&state, "/pending").await,
        format!("Attachments (ungrouped)\n  {} chart 2.png\n", id.as_str())
    );
    assert_eq!(
        text(&state, "/group").await,
        "Removed 1 attachments from (ungrouped)"
    );
}

#[tokio::test]
async fn test_prefilled_draft_can_be_sent() {
    let server = MockServer::start().await;
    mock_completions(&server).await;
    let (state, _events) = start().await;
    text(
        &state,
        &format!("/add m {}/v1/chat/completions sk-test", server.uri()),
    )
    .await;
    assert_eq!(text(&state, "/draft").await, "Draft is empty");

    text(
        &state,
        r#"/event {"id": "t1", "type": "table", "data": "<table></table>", "initialMessage": "Explain this table"}"#,
    )
    .await;
    let mut attempts = 0;
    while state.session.draft().is_empty() && attempts < 100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        attempts += 1;
    }
    assert_eq!(text(&state, "/draft").await, "Explain this table");

    assert_eq!(send(&state, "/send").await, StreamOutcome::Completed);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body["messages"],
        json!([{
            "role": "user",
            "content": "Explain this table\n\n<table></table>"
        }])
    );
    assert_eq!(text(&state, "/draft").await, "Draft is empty");
    assert_eq!(text(&state, "/send").await, "Draft is empty");
}

#[tokio::test]
async fn test_model_management() {
    let (state, _events) = start().await;

    text(&state, "/add a http://a").await;
    text(&state, "/add b http://b").await;
    assert_eq!(text(&state, "/use 2").await, "Using b");
    assert_eq!(
        text(&state, "/models").await,
        "  1. a http://a\n* 2. b http://b\n"
    );

    assert_eq!(text(&state, "/remove 2").await, "Saved; now using a-http://a");
    assert_eq!(text(&state, "/use 5").await, "No model 5");
    assert_eq!(text(&state, "/remove 1").await, "Saved; no model selected");
}

#[tokio::test]
async fn test_turn_commands() {
    let (state, _events) = start().await;
    send(&state, "Hello").await;

    assert_eq!(text(&state, "/raw 1").await, "Turn 1 raw display on");
    assert_eq!(text(&state, "/raw 9").await, "No turn 9");
    assert_eq!(text(&state, "/delete 1").await, "Deleted turn 1");
    assert_eq!(text(&state, "/history").await, "");
    assert_eq!(text(&state, "/stop").await, "Nothing is streaming");
}
