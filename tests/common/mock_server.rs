//! Scripted stand-in for the profiles HTTP API.
//!
//! Replies are served in the order they were queued. With nothing queued
//! the server answers `200` with an empty body. Every request is recorded.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }
}

/// A queued reply.
#[derive(Debug, Clone)]
pub struct Canned {
    status: StatusCode,
    content_type: Option<&'static str>,
    body: String,
    delay: Duration,
}

impl Canned {
    pub fn json(body: &str) -> Self {
        Self {
            content_type: Some("application/json"),
            body: body.to_string(),
            ..Self::status(200)
        }
    }

    /// Bare status with an empty body.
    pub fn status(code: u16) -> Self {
        Self {
            status: StatusCode::from_u16(code).expect("invalid status code"),
            content_type: None,
            body: String::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn text(code: u16, message: &str) -> Self {
        Self {
            content_type: Some("text/plain"),
            body: message.to_string(),
            ..Self::status(code)
        }
    }

    /// Hold the whole reply back for `delay`.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl IntoResponse for Canned {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        match self.content_type {
            Some(content_type) => {
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
            None => {
                response.headers_mut().remove(CONTENT_TYPE);
            }
        }
        response
    }
}

#[derive(Default)]
struct Script {
    replies: Mutex<VecDeque<Canned>>,
    requests: Mutex<Vec<Recorded>>,
}

pub struct MockServer {
    addr: SocketAddr,
    script: Arc<Script>,
    task: JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        let script = Arc::new(Script::default());
        let app = Router::new().fallback(answer).with_state(script.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("mock server has no address");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, script, task }
    }

    pub fn reply(&self, canned: Canned) {
        self.script.replies.lock().push_back(canned);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.script.requests.lock().clone()
    }

    pub fn last(&self) -> Recorded {
        self.script
            .requests
            .lock()
            .last()
            .cloned()
            .expect("no request recorded")
    }

    /// API root served by this mock, ending in `/api`.
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn answer(
    State(script): State<Arc<Script>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Canned {
    script.requests.lock().push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });

    let canned = script
        .replies
        .lock()
        .pop_front()
        .unwrap_or_else(|| Canned::status(200));
    if !canned.delay.is_zero() {
        tokio::time::sleep(canned.delay).await;
    }
    canned
}
