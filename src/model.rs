use serde::Serialize;
use std::path::Path;

use crate::error::RemoteError;

/// File name offered for the summary when the source name is unknown.
pub const DEFAULT_ARTIFACT_FILE_NAME: &str = "ringkasan_ai.txt";

/// Suffix appended to the source file stem for the summary artifact.
pub const ARTIFACT_SUFFIX: &str = "_ringkasan.txt";

pub const SUMMARY_MIME_TYPE: &str = "text/plain";

/// Text pulled out of a document, pages joined in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    text: String,
    /// Number of pages seen by the extractor
    pub page_count: usize,
    /// Pages that produced no text (scanned images, blank pages)
    pub blank_pages: usize,
}

impl ExtractedText {
    /// Assemble page texts. Pages without text contribute nothing; every
    /// other page is followed by a newline.
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extracted = ExtractedText::default();
        for page in pages {
            extracted.page_count += 1;
            let page = page.as_ref();
            if page.trim().is_empty() {
                extracted.blank_pages += 1;
                continue;
            }
            extracted.text.push_str(page);
            extracted.text.push('\n');
        }
        extracted
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Length in characters, which is what thresholds and chunk sizes count.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A contiguous, bounded slice of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position in the chunk sequence (0-indexed)
    pub index: usize,
    pub text: String,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One request to the chat-completion service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_content: String,
    pub temperature: f64,
    pub max_tokens: Option<u64>,
}

impl ModelRequest {
    /// Same request aimed at another model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }
}

/// Outcome of summarizing one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryResult {
    /// Produced by a remote model
    Generated { text: String, model: String },
    /// Produced by the offline summarizer
    Local { text: String, reason: String },
    Failed { error: RemoteError },
}

impl SummaryResult {
    /// Text usable in the final summary, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            SummaryResult::Generated { text, .. } | SummaryResult::Local { text, .. } => {
                Some(text)
            }
            SummaryResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            SummaryResult::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SummaryResult::Failed { .. })
    }

    pub fn is_local(&self) -> bool {
        matches!(self, SummaryResult::Local { .. })
    }
}

/// Per-chunk status kept for progress and reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkReport {
    pub index: usize,
    pub chars: usize,
    pub result: SummaryResult,
}

/// Progress after a chunk completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }
}

/// Everything produced by one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineRun {
    pub source_chars: usize,
    pub chunks: Vec<ChunkReport>,
    /// Usable partial summaries joined with a blank line, in chunk order
    pub combined: String,
    /// Second-pass result, when consolidation ran
    pub consolidation: Option<SummaryResult>,
    pub final_text: String,
}

impl PipelineRun {
    pub fn summary(&self) -> &str {
        &self.final_text
    }

    pub fn failed_chunks(&self) -> usize {
        self.chunks.iter().filter(|c| c.result.is_failed()).count()
    }

    pub fn local_chunks(&self) -> usize {
        self.chunks.iter().filter(|c| c.result.is_local()).count()
    }

    /// The downloadable form of the summary.
    pub fn to_artifact(&self, source: Option<&Path>) -> SummaryArtifact {
        SummaryArtifact {
            file_name: artifact_file_name(source),
            mime_type: SUMMARY_MIME_TYPE.to_string(),
            contents: self.final_text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryArtifact {
    pub file_name: String,
    pub mime_type: String,
    pub contents: String,
}

pub fn artifact_file_name(source: Option<&Path>) -> String {
    source
        .and_then(|path| path.file_stem())
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(|stem| format!("{}{}", stem, ARTIFACT_SUFFIX))
        .unwrap_or_else(|| DEFAULT_ARTIFACT_FILE_NAME.to_string())
}
