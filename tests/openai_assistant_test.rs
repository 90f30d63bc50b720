// ABOUTME: Integration tests for the OpenAI Assistants v2 client against a mock HTTP server
// ABOUTME: Verifies request paths, headers, and bodies plus upstream error mapping
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use anyhow::Result;
use serde_json::json;
use std::time::Duration;
use support_relay::assistant::{
    AssistantService, ListMessagesQuery, MessageRole, NewMessage, OpenAiAssistantClient,
    RunStatus, ToolOutput,
};
use support_relay::config::AssistantConfig;
use support_relay::errors::ErrorCode;
use url::Url;
use wiremock::matchers::{bearer_token, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client pointed at the mock server's `/v1` root
fn create_test_client(server: &MockServer, organization: Option<&str>) -> OpenAiAssistantClient {
    let config = AssistantConfig {
        api_key: "sk-test".to_owned(),
        assistant_id: "asst_1".to_owned(),
        base_url: Url::parse(&format!("{}/v1", server.uri())).unwrap(),
        organization: organization.map(ToOwned::to_owned),
        request_timeout: Duration::from_secs(5),
    };
    OpenAiAssistantClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_create_thread_sends_auth_and_beta_headers() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/threads"))
        .and(bearer_token("sk-test"))
        .and(header("OpenAI-Beta", "assistants=v2"))
        .and(header("OpenAI-Organization", "org_42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "thread_abc",
            "object": "thread",
            "created_at": 1_700_000_000,
            "metadata": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, Some("org_42"));
    let thread = client.create_thread().await?;

    assert_eq!(thread.id, "thread_abc");
    assert_eq!(thread.created_at, 1_700_000_000);
    Ok(())
}

#[tokio::test]
async fn test_add_message_posts_role_and_content() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_abc/messages"))
        .and(body_json(json!({"role": "user", "content": "Where is my order?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "object": "thread.message",
            "thread_id": "thread_abc",
            "role": "user",
            "content": [{"type": "text", "text": {"value": "Where is my order?", "annotations": []}}],
            "created_at": 1_700_000_001
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, None);
    let message = client
        .add_message("thread_abc", NewMessage::user("Where is my order?"))
        .await?;

    assert_eq!(message.role, MessageRole::User);
    assert_eq!(message.first_text(), Some("Where is my order?"));
    Ok(())
}

#[tokio::test]
async fn test_run_lifecycle_requests() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_abc/runs"))
        .and(body_json(json!({"assistant_id": "asst_1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "run_1",
            "object": "thread.run",
            "thread_id": "thread_abc",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "run_1",
            "thread_id": "thread_abc",
            "status": "requires_action",
            "required_action": {
                "type": "submit_tool_outputs",
                "submit_tool_outputs": {
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "create_support_ticket",
                            "arguments": "{\"issue_summary\":\"Lost parcel\"}"
                        }
                    }]
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/threads/thread_abc/runs/run_1/submit_tool_outputs"))
        .and(body_json(json!({
            "tool_outputs": [{"tool_call_id": "call_1", "output": "{\"success\":true}"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "run_1",
            "thread_id": "thread_abc",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, None);

    let run = client.create_run("thread_abc", "asst_1").await?;
    assert_eq!(run.status, RunStatus::Queued);

    let run = client.retrieve_run("thread_abc", "run_1").await?;
    assert_eq!(run.status, RunStatus::RequiresAction);
    let calls = run.pending_tool_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].function.name, "create_support_ticket");

    let run = client
        .submit_tool_outputs(
            "thread_abc",
            "run_1",
            vec![ToolOutput {
                tool_call_id: "call_1".to_owned(),
                output: r#"{"success":true}"#.to_owned(),
            }],
        )
        .await?;
    assert_eq!(run.status, RunStatus::Queued);
    Ok(())
}

#[tokio::test]
async fn test_list_messages_sends_query() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_abc/messages"))
        .and(query_param("order", "desc"))
        .and(query_param("limit", "1"))
        .and(query_param("run_id", "run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{
                "id": "msg_2",
                "thread_id": "thread_abc",
                "role": "assistant",
                "run_id": "run_1",
                "content": [
                    {"type": "image_file", "image_file": {"file_id": "file_1"}},
                    {"type": "text", "text": {"value": "Your parcel is on its way.", "annotations": []}}
                ],
                "created_at": 1_700_000_010
            }],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, None);
    let messages = client
        .list_messages("thread_abc", &ListMessagesQuery::latest(Some("run_1".to_owned())))
        .await?;

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::Assistant);
    assert_eq!(messages[0].first_text(), Some("Your parcel is on its way."));
    Ok(())
}

#[tokio::test]
async fn test_error_responses_map_to_error_codes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/unauthorized/runs/run_1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/limited/runs/run_1"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached", "type": "requests"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/threads/missing/runs/run_1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "No thread found with id 'missing'.", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let client = create_test_client(&server, None);

    let error = client.retrieve_run("unauthorized", "run_1").await.unwrap_err();
    assert_eq!(error.code, ErrorCode::ExternalAuthFailed);
    assert!(error.message.contains("Incorrect API key"));

    let error = client.retrieve_run("limited", "run_1").await.unwrap_err();
    assert_eq!(error.code, ErrorCode::ExternalRateLimited);

    let error = client.retrieve_run("missing", "run_1").await.unwrap_err();
    assert_eq!(error.code, ErrorCode::ExternalServiceError);
    assert!(error.message.contains("404"));
}

#[tokio::test]
async fn test_malformed_success_body_is_service_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = create_test_client(&server, None);
    let error = client.create_thread().await.unwrap_err();

    assert_eq!(error.code, ErrorCode::ExternalServiceError);
    assert!(error.message.contains("Failed to parse"));
}
