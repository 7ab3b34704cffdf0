//! Chat-completion backends.
//!
//! [`ChatBackend`] is the single seam between the summarizer and the network.
//! [`RigBackend`] talks to any OpenAI-compatible chat-completion endpoint
//! (OpenAI, Groq, gateways) through rig-core. Messages are sent with plain
//! string `content`. [`MockBackend`] answers from a script and records every
//! request, for tests and offline runs.
//!
//! # Example
//! ```ignore
//! use ringkas::llm::RigBackend;
//! use std::time::Duration;
//!
//! let backend = RigBackend::new(&api_key, "https://api.groq.com/openai/v1", Duration::from_secs(60));
//! ```

use async_trait::async_trait;
use regex::Regex;
use rig::{
    client::CompletionClient,
    completion::{AssistantContent, CompletionModel},
    providers::groq,
    OneOrMany,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::config::SummarizerConfig;
use crate::error::{RemoteError, RingkasError};
use crate::model::ModelRequest;

/// Sends one request to a text-generation service.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Return the generated text, or a classified failure.
    async fn complete(&self, request: &ModelRequest) -> Result<String, RemoteError>;
}

/// Type alias for a backend shared across the pipeline
pub type SharedBackend = Arc<dyn ChatBackend>;

/// Backend for OpenAI-compatible `/chat/completions` endpoints.
///
/// Every call is bounded by `timeout`; running out of time is reported as a
/// transport failure.
pub struct RigBackend {
    client: groq::Client,
    timeout: Duration,
}

impl RigBackend {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let client = groq::Client::builder(api_key)
            .base_url(base_url)
            .build();

        Self { client, timeout }
    }

    /// Build from the summarizer configuration. Fails without a credential.
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, RingkasError> {
        let api_key = config.api_key().ok_or(RemoteError::MissingCredential)?;
        Ok(Self::new(api_key, config.base_url(), config.timeout()))
    }
}

#[async_trait]
impl ChatBackend for RigBackend {
    async fn complete(&self, request: &ModelRequest) -> Result<String, RemoteError> {
        let model = self.client.completion_model(&request.model);

        let mut builder = model
            .completion_request(request.user_content.as_str())
            .preamble(request.system_prompt.clone())
            .temperature(request.temperature);
        // rig only forwards `max_tokens` through the extra body parameters.
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.additional_params(serde_json::json!({ "max_tokens": max_tokens }));
        }

        debug!(model = %request.model, chars = request.user_content.len(), "sending completion request");

        let response = tokio::time::timeout(self.timeout, model.completion(builder.build()))
            .await
            .map_err(|_| {
                RemoteError::Transport(format!(
                    "request timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| classify_failure(None, &e.to_string(), &request.model))?;

        let text = extract_text_from_response(&response.choice);
        if text.is_empty() {
            return Err(RemoteError::Failed {
                status: None,
                body: format!("model '{}' returned an empty response", request.model),
            });
        }

        Ok(text)
    }
}

/// Extract text content from assistant response
fn extract_text_from_response(content: &OneOrMany<AssistantContent>) -> String {
    content
        .iter()
        .filter_map(|c| match c {
            AssistantContent::Text(text) => Some(text.text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

const MODEL_UNAVAILABLE_MARKERS: &[&str] = &[
    "decommissioned",
    "model_not_found",
    "model not found",
    "does not exist",
];

const AUTHENTICATION_MARKERS: &[&str] = &[
    "invalid api key",
    "invalid_api_key",
    "incorrect api key",
    "invalid authentication",
    "unauthorized",
];

const QUOTA_MARKERS: &[&str] = &[
    "quota",
    "rate limit",
    "rate_limit",
    "too many requests",
];

const TRANSPORT_MARKERS: &[&str] = &[
    "error sending request",
    "connection refused",
    "connection reset",
    "connection closed",
    "failed to lookup address",
    "dns error",
    "timed out",
];

/// Matches the status rig reports for a non-success response, e.g.
/// "Invalid status code 401 Unauthorized with message: ...".
static STATUS_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bstatus code:?\s*([1-5]\d{2})\b").unwrap());

/// Classify a failed call from its HTTP status (when known) and error text.
///
/// The error body is searched for the provider's signals for a retired
/// model, a rejected credential and an exhausted quota. When no status is
/// given, one is parsed from the text if it reports one.
pub fn classify_failure(status: Option<u16>, body: &str, model: &str) -> RemoteError {
    let status = status.or_else(|| parse_status(body));
    let lower = body.to_lowercase();
    let mentions = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    if mentions(MODEL_UNAVAILABLE_MARKERS) {
        return RemoteError::ModelUnavailable {
            model: model.to_string(),
            message: body.to_string(),
        };
    }
    if matches!(status, Some(401) | Some(403)) || mentions(AUTHENTICATION_MARKERS) {
        return RemoteError::Authentication(body.to_string());
    }
    if status == Some(429) || mentions(QUOTA_MARKERS) {
        return RemoteError::QuotaExceeded(body.to_string());
    }
    if status.is_none() && mentions(TRANSPORT_MARKERS) {
        return RemoteError::Transport(body.to_string());
    }

    RemoteError::Failed {
        status,
        body: body.to_string(),
    }
}

fn parse_status(text: &str) -> Option<u16> {
    STATUS_CODE_PATTERN
        .captures(text)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

type Responder = dyn Fn(&ModelRequest) -> Result<String, RemoteError> + Send + Sync;

/// A scripted backend for testing.
///
/// Responses queued for a model are returned first, in order; once a
/// model's queue is empty the responder answers.
pub struct MockBackend {
    queued: Mutex<HashMap<String, VecDeque<Result<String, RemoteError>>>>,
    responder: Box<Responder>,
    calls: Mutex<Vec<ModelRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::replying(|_| Ok("A mock summary".to_string()))
    }

    /// Answer every request with `responder`.
    pub fn replying<F>(responder: F) -> Self
    where
        F: Fn(&ModelRequest) -> Result<String, RemoteError> + Send + Sync + 'static,
    {
        Self {
            queued: Mutex::new(HashMap::new()),
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response for the next request to `model`.
    pub fn with_response(
        self,
        model: impl Into<String>,
        response: Result<String, RemoteError>,
    ) -> Self {
        self.queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(model.into())
            .or_default()
            .push_back(response);
        self
    }

    /// Requests received so far, in order.
    pub fn calls(&self) -> Vec<ModelRequest> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Models requested so far, in order.
    pub fn models_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|r| r.model).collect()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn complete(&self, request: &ModelRequest) -> Result<String, RemoteError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let queued = self
            .queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&request.model)
            .and_then(|queue| queue.pop_front());

        match queued {
            Some(response) => response,
            None => (self.responder)(request),
        }
    }
}
