//! Local HTTP server serving canned responses for integration tests.

#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use tiny_http::{Header, Response, Server};

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// Canned reply: status, content type and body.
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn event_stream(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/event-stream",
            body: body.into(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.into(),
        }
    }
}

/// Mock server answering every request with `handler`.
pub struct MockServer {
    server: Arc<Server>,
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Reply + Send + 'static,
    {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("failed to bind mock server"));
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .expect("mock server has no port");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let worker = Arc::clone(&server);
        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for mut request in worker.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let authorization = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Authorization"))
                    .map(|h| h.value.as_str().to_string());

                let seen = RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    authorization,
                    body,
                };
                let reply = handler(&seen);
                recorded.lock().unwrap().push(seen);

                let header = Header::from_bytes("Content-Type", reply.content_type)
                    .expect("valid header");
                let response = Response::from_string(reply.body)
                    .with_status_code(reply.status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            server,
            base_url: format!("http://127.0.0.1:{port}"),
            requests,
        }
    }

    /// Returns `http://127.0.0.1:<port>`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Returns the requests whose URL contains `needle`.
    pub fn requests_matching(&self, needle: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.contains(needle))
            .collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

/// Builds one SSE frame carrying `content`.
pub fn sse_frame(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion.chunk",
            "model": "llama-3.1-8b-instant",
            "choices": [{ "index": 0, "delta": { "content": content }, "finish_reason": null }]
        })
    )
}

/// Builds a complete SSE body from fragments, ending with `[DONE]`.
pub fn sse_body(fragments: &[&str]) -> String {
    let mut body: String = fragments.iter().map(|f| sse_frame(f)).collect();
    body.push_str("data: [DONE]\n\n");
    body
}

/// MediaWiki search response with an optional suggestion and hits.
pub fn search_response(suggestion: Option<&str>, hits: &[&str]) -> serde_json::Value {
    let mut query = serde_json::json!({
        "searchinfo": { "totalhits": hits.len() },
        "search": hits.iter().map(|t| serde_json::json!({ "ns": 0, "title": t })).collect::<Vec<_>>()
    });
    if let Some(suggestion) = suggestion {
        query["searchinfo"]["suggestion"] = serde_json::json!(suggestion);
    }
    serde_json::json!({ "batchcomplete": true, "query": query })
}

/// MediaWiki page response for an ordinary article.
pub fn article_response(title: &str, extract: &str) -> serde_json::Value {
    serde_json::json!({
        "batchcomplete": true,
        "query": {
            "pages": [{ "pageid": 1, "ns": 0, "title": title, "extract": extract }]
        }
    })
}

/// MediaWiki page response for a disambiguation page.
pub fn disambiguation_response(title: &str) -> serde_json::Value {
    serde_json::json!({
        "batchcomplete": true,
        "query": {
            "pages": [{
                "pageid": 2,
                "ns": 0,
                "title": title,
                "pageprops": { "disambiguation": "" },
                "extract": format!("{title} may refer to:")
            }]
        }
    })
}

/// MediaWiki parse response wrapping `html`.
pub fn parse_response(title: &str, html: &str) -> serde_json::Value {
    serde_json::json!({ "parse": { "title": title, "pageid": 2, "text": html } })
}

/// Disambiguation HTML for "Mercury".
pub const MERCURY_HTML: &str = r#"<div class="mw-parser-output">
<p><b>Mercury</b> commonly refers to:</p>
<ul>
<li><a href="/wiki/Mercury_(planet)" title="Mercury (planet)">Mercury (planet)</a>, the closest planet to the Sun</li>
<li><a href="/wiki/Mercury_(element)" title="Mercury (element)">Mercury (element)</a>, a chemical element</li>
<li><a href="/wiki/Mercury_(mythology)" title="Mercury (mythology)">Mercury (mythology)</a>, a Roman god</li>
<li><a href="/wiki/Mercury_Records" title="Mercury Records">Mercury Records</a>, a record label</li>
</ul>
</div>"#;
