//! Integration tests for the streaming chat client against a local mock server.

mod common;

use common::{MockServer, Reply, sse_body, sse_frame};
use medha::config::Credential;
use medha::groq::{ChatMessage, ChatRequest, ChatStreamClient, GroqClient, GroqClientBuilder, GroqError};

fn client_for(server: &MockServer) -> GroqClient {
    GroqClientBuilder::new()
        .base_url(format!("{}/openai/v1", server.base_url()))
        .build()
        .expect("failed to build client")
}

fn request() -> ChatRequest {
    ChatRequest {
        model: "llama-3.1-8b-instant".to_string(),
        messages: vec![
            ChatMessage::system("Summarize in bullet points."),
            ChatMessage::user("Rust is a systems programming language."),
        ],
        temperature: 0.5,
        max_tokens: 600,
        stream: true,
    }
}

fn credential() -> Credential {
    Credential::new("gsk_integration").expect("non-empty key")
}

#[test]
fn streams_fragments_in_order() {
    let server = MockServer::start(|_| {
        Reply::event_stream(sse_body(&["• Systems", " language", "\n• Memory safe"]))
    });

    let fragments: Vec<String> = client_for(&server)
        .stream_chat(&request(), &credential())
        .expect("stream should open")
        .collect::<Result<_, _>>()
        .expect("stream should complete");

    assert_eq!(fragments, vec!["• Systems", " language", "\n• Memory safe"]);
}

#[test]
fn request_carries_bearer_credential_and_streaming_body() {
    let server = MockServer::start(|_| Reply::event_stream(sse_body(&["ok"])));

    let _ = client_for(&server)
        .stream_chat(&request(), &credential())
        .expect("stream should open")
        .count();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/openai/v1/chat/completions");
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer gsk_integration")
    );

    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["stream"], true);
    assert_eq!(body["max_tokens"], 600);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "Rust is a systems programming language.");
}

#[test]
fn rejected_credential_fails_before_streaming() {
    let server = MockServer::start(|_| {
        Reply::status(
            401,
            r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error","code":"invalid_api_key"}}"#,
        )
    });

    let result = client_for(&server).stream_chat(&request(), &credential());

    match result {
        Err(GroqError::Http { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API Key");
        }
        Err(other) => panic!("expected Http error, got {other:?}"),
        Ok(_) => panic!("expected Http error, got a stream"),
    }
}

#[test]
fn mid_stream_error_frame_ends_stream() {
    let server = MockServer::start(|_| {
        Reply::event_stream(format!(
            "{}data: {}\n\n{}",
            sse_frame("• First point"),
            r#"{"error":{"message":"Service overloaded","type":"server_error"}}"#,
            sse_frame("never delivered")
        ))
    });

    let items: Vec<Result<String, GroqError>> = client_for(&server)
        .stream_chat(&request(), &credential())
        .expect("stream should open")
        .collect();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), "• First point");
    assert!(matches!(&items[1], Err(GroqError::Api { message }) if message == "Service overloaded"));
}

#[test]
fn empty_stream_yields_no_fragments() {
    let server = MockServer::start(|_| Reply::event_stream("data: [DONE]\n\n"));

    let count = client_for(&server)
        .stream_chat(&request(), &credential())
        .expect("stream should open")
        .count();

    assert_eq!(count, 0);
}
