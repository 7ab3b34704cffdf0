use serde::Serialize;
use std::io;
use thiserror::Error;

/// Failure of a single call to the remote text-generation service.
///
/// The variants mirror the branches a caller renders differently: model
/// retirement (handled by the fallback model), credential problems and quota
/// exhaustion (actionable by the user), transport problems, and everything
/// else.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RemoteError {
    #[error("Model '{model}' is no longer available: {message}")]
    ModelUnavailable { model: String, message: String },

    #[error("Authentication failed: {0} - Please check your API key")]
    Authentication(String),

    #[error("Quota exceeded: {0} - Please check your plan and billing details or retry later")]
    QuotaExceeded(String),

    #[error("Network error: {0} - Please check your internet connection")]
    Transport(String),

    #[error("Remote call failed{}: {body}", status_suffix(.status))]
    Failed { status: Option<u16>, body: String },

    #[error("No API key configured")]
    MissingCredential,
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" with status {}", code))
        .unwrap_or_default()
}

impl RemoteError {
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, RemoteError::ModelUnavailable { .. })
    }

    /// Whether the user can fix this themselves (new key, more quota).
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            RemoteError::Authentication(_)
                | RemoteError::QuotaExceeded(_)
                | RemoteError::MissingCredential
        )
    }
}

#[derive(Debug, Error)]
pub enum RingkasError {
    #[error("IO error: {0} - Please check file permissions and path")]
    Io(#[from] io::Error),

    #[error("Failed to read PDF: {0} - The document may be corrupted or encrypted")]
    Extraction(String),

    #[error("Text too short to summarize: {length} characters (minimum {minimum})")]
    InsufficientText { length: usize, minimum: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chunk {} could not be summarized: {source}", .index + 1)]
    ChunkFailed {
        index: usize,
        #[source]
        source: RemoteError,
    },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl RingkasError {
    /// Warnings stop the run before any remote call but are not failures of
    /// the tool itself.
    pub fn is_warning(&self) -> bool {
        matches!(self, RingkasError::InsufficientText { .. })
    }
}

impl From<toml::de::Error> for RingkasError {
    fn from(error: toml::de::Error) -> Self {
        RingkasError::Config(error.to_string())
    }
}
