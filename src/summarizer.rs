//! Summarization client with primary/fallback model handling.
//!
//! A request first goes to the primary model. Only a "model retired" answer
//! moves it to the fallback model, and only when that model differs from the
//! primary. Every other failure is final, so a piece of text costs at most
//! two remote calls.

use tracing::{debug, info, warn};

use crate::config::SummarizerConfig;
use crate::error::RemoteError;
use crate::fallback::local_summary;
use crate::llm::SharedBackend;
use crate::model::{ModelRequest, SummaryResult};

/// Where a summarization attempt currently stands.
#[derive(Debug)]
enum Attempt {
    Primary(ModelRequest),
    Fallback(ModelRequest),
    Failed(RemoteError),
}

pub struct Summarizer {
    config: SummarizerConfig,
    backend: Option<SharedBackend>,
}

impl Summarizer {
    pub fn new(config: SummarizerConfig, backend: SharedBackend) -> Self {
        Self {
            config,
            backend: Some(backend),
        }
    }

    /// A summarizer with no remote backend; every call is answered locally
    /// or fails with [`RemoteError::MissingCredential`].
    pub fn offline(config: SummarizerConfig) -> Self {
        Self {
            config,
            backend: None,
        }
    }

    /// Summarize one chunk of text. Never fails; failures are recorded in the
    /// result.
    pub async fn summarize(&self, text: &str) -> SummaryResult {
        match self.summarize_remote(text).await {
            Ok(result) => result,
            Err(error) => self.recover(error, text),
        }
    }

    /// Summarize already-summarized text into a single consolidated summary.
    ///
    /// Failures are returned as `Failed`; no local summary is produced.
    pub async fn consolidate(&self, joined: &str) -> SummaryResult {
        let request = self.config.request(&self.config.consolidation_prompt, joined);
        match self.run_attempts(request).await {
            Ok(result) => result,
            Err(error) => {
                warn!(%error, "consolidation failed, keeping partial summaries");
                SummaryResult::Failed { error }
            }
        }
    }

    /// Run the remote attempts for `text` without any local fallback.
    pub async fn summarize_remote(&self, text: &str) -> Result<SummaryResult, RemoteError> {
        let request = self.config.request(&self.config.summary_prompt, text);
        self.run_attempts(request).await
    }

    fn recover(&self, error: RemoteError, source: &str) -> SummaryResult {
        if self.config.local_fallback {
            warn!(%error, "using local summary");
            return SummaryResult::Local {
                text: local_summary(source),
                reason: error.to_string(),
            };
        }

        warn!(%error, "summarization failed");
        SummaryResult::Failed { error }
    }

    async fn run_attempts(&self, request: ModelRequest) -> Result<SummaryResult, RemoteError> {
        let backend = match (&self.backend, self.config.has_credential()) {
            (Some(backend), true) => backend,
            _ => return Err(RemoteError::MissingCredential),
        };

        let mut attempt = Attempt::Primary(request);
        loop {
            attempt = match attempt {
                Attempt::Primary(request) => match backend.complete(&request).await {
                    Ok(text) => return Ok(generated(text, request)),
                    Err(error) if error.is_model_unavailable() => {
                        match self.fallback_request(&request) {
                            Some(next) => {
                                info!(
                                    from = %request.model,
                                    to = %next.model,
                                    "primary model unavailable, switching to fallback"
                                );
                                Attempt::Fallback(next)
                            }
                            None => Attempt::Failed(error),
                        }
                    }
                    Err(error) => Attempt::Failed(error),
                },
                Attempt::Fallback(request) => match backend.complete(&request).await {
                    Ok(text) => return Ok(generated(text, request)),
                    Err(error) => Attempt::Failed(error),
                },
                Attempt::Failed(error) => return Err(error),
            };
        }
    }

    /// The fallback copy of `request`, unless it would hit the same model.
    fn fallback_request(&self, request: &ModelRequest) -> Option<ModelRequest> {
        let fallback = self.config.fallback_model()?;
        if fallback == request.model {
            debug!(model = fallback, "fallback model equals primary, not retrying");
            return None;
        }
        Some(request.with_model(fallback))
    }
}

fn generated(text: String, request: ModelRequest) -> SummaryResult {
    SummaryResult::Generated {
        text,
        model: request.model,
    }
}
