//! Test doubles for code that talks to the backend.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, Transport};

#[derive(Default)]
struct StubState {
    responses: VecDeque<Result<HttpResponse, TransportError>>,
    calls: Vec<HttpRequest>,
}

/// A [`Transport`] that replays queued responses in order and records every
/// request it receives. Clones share the same queue and call log.
#[derive(Clone, Default)]
pub struct StubTransport {
    state: Arc<Mutex<StubState>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn push_raw(&self, status: u16, body: &str) {
        self.push(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn push_failure(&self, message: &str) {
        self.push(Err(TransportError(message.to_string())));
    }

    fn push(&self, response: Result<HttpResponse, TransportError>) {
        self.lock().responses.push_back(response);
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transport for StubTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.lock();
        state.calls.push(request);
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("no stubbed response queued".to_string())))
    }
}
