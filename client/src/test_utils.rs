//! Test doubles for the transport and notification seams.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::ApiError;
use crate::notifications::{Notifier, Toast, ToastKind};
use crate::services::api::{ApiRequest, ApiResponse, HttpTransport, Method};

struct Reply {
    result: Result<ApiResponse, ApiError>,
    gate: Option<Arc<Notify>>,
}

/// Transport that records every request and answers from a per-route script.
///
/// Replies queued for the same (method, path) are consumed in order. Once a
/// route's queue is empty its last delivered reply answers every further call.
/// Unscripted routes fail with a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    /// Last reply delivered per route, repeated once the queue runs dry
    sticky: Mutex<HashMap<(Method, String), Result<ApiResponse, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: &str) {
        self.push(method, path, Ok(ApiResponse::new(status, body)), None);
    }

    pub fn respond_json(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
        self.respond(method, path, status, &body.to_string());
    }

    pub fn fail(&self, method: Method, path: &str, error: ApiError) {
        self.push(method, path, Err(error), None);
    }

    /// Queue a reply that is only delivered once `gate` is notified
    pub fn respond_gated(&self, method: Method, path: &str, status: u16, body: &str, gate: Arc<Notify>) {
        self.push(method, path, Ok(ApiResponse::new(status, body)), Some(gate));
    }

    fn push(&self, method: Method, path: &str, result: Result<ApiResponse, ApiError>, gate: Option<Arc<Notify>>) {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Reply { result, gate });
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// `"METHOD /path"` for every request sent, in order
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method.as_str(), r.path))
            .collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn last(&self, method: Method, path: &str) -> Option<ApiRequest> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let key = (request.method, request.path.clone());
        self.requests.lock().unwrap().push(request);

        let (result, gate) = {
            let mut replies = self.replies.lock().unwrap();
            let mut sticky = self.sticky.lock().unwrap();
            match replies.get_mut(&key).and_then(|queue| queue.pop_front()) {
                Some(reply) => {
                    sticky.insert(key.clone(), reply.result.clone());
                    (reply.result, reply.gate)
                }
                None => match sticky.get(&key) {
                    Some(result) => (result.clone(), None),
                    None => (
                        Err(ApiError::Transport(format!(
                            "no scripted reply for {} {}",
                            key.0.as_str(),
                            key.1
                        ))),
                        None,
                    ),
                },
            }
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }
        result
    }
}

/// Notifier that keeps every toast for later assertions
#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(ToastKind::Error)
    }

    pub fn successes(&self) -> Vec<String> {
        self.messages(ToastKind::Success)
    }

    fn messages(&self, kind: ToastKind) -> Vec<String> {
        self.toasts()
            .into_iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}
