//! Mock transport for testing.
//!
//! Responses are queued and handed out in order; every request is captured
//! for verification.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    sent: Vec<HttpRequest>,
    responses: VecDeque<Result<HttpResponse, String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next request.
    pub fn queue_response(&self, response: HttpResponse) {
        self.lock().responses.push_back(Ok(response));
    }

    /// Shorthand for queueing a JSON body with the given status.
    pub fn queue_json(&self, status: u16, body: serde_json::Value) {
        self.queue_response(HttpResponse::new(status, body.to_string()));
    }

    /// Make the next request fail as if the connection dropped.
    pub fn fail_next(&self, error: &str) {
        self.lock().responses.push_back(Err(error.to_string()));
    }

    pub fn sent_requests(&self) -> Vec<HttpRequest> {
        self.lock().sent.clone()
    }

    pub fn last_sent(&self) -> Option<HttpRequest> {
        self.lock().sent.last().cloned()
    }

    /// Paths of every request sent so far, in order.
    pub fn sent_paths(&self) -> Vec<String> {
        self.lock().sent.iter().map(|r| r.path.clone()).collect()
    }

    pub fn pending_responses(&self) -> usize {
        self.lock().responses.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockTransportInner> {
        // Poisoning is ignored; the captured requests stay valid.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut inner = self.lock();
        inner.sent.push(request);
        match inner.responses.pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(error)) => Err(ApiError::Transport(error)),
            None => Err(ApiError::Transport("no response queued".to_string())),
        }
    }
}
