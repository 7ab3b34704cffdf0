use std::sync::Arc;
use tracing::{info, warn};

use crate::chunker::split_text;
use crate::config::{FailurePolicy, PipelineOptions, Settings};
use crate::error::RingkasError;
use crate::llm::{RigBackend, SharedBackend};
use crate::model::{ChunkReport, PipelineRun, Progress, SummaryResult};
use crate::pdf;
use crate::summarizer::Summarizer;

/// Separator between partial summaries in the combined text.
pub const SUMMARY_SEPARATOR: &str = "\n\n";

/// Sequences extraction, chunking and per-chunk summarization.
///
/// Chunks are summarized one at a time, in order.
pub struct Pipeline {
    summarizer: Summarizer,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(summarizer: Summarizer, options: PipelineOptions) -> Self {
        Self {
            summarizer,
            options,
        }
    }

    /// Build a pipeline talking to the configured provider. Without an API
    /// key the pipeline runs offline.
    pub fn from_settings(settings: Settings) -> Result<Self, RingkasError> {
        settings.validate()?;
        let Settings {
            summarizer: config,
            pipeline: options,
        } = settings;

        let summarizer = if config.has_credential() {
            let backend: SharedBackend = Arc::new(RigBackend::from_config(&config)?);
            Summarizer::new(config, backend)
        } else {
            warn!("no API key configured, summaries will be produced locally");
            Summarizer::offline(config)
        };

        Ok(Self::new(summarizer, options))
    }

    /// Build a pipeline over an explicit backend.
    pub fn with_backend(settings: Settings, backend: SharedBackend) -> Self {
        Self::new(
            Summarizer::new(settings.summarizer, backend),
            settings.pipeline,
        )
    }

    /// Extract the text of a PDF and summarize it.
    pub async fn run_document(&self, bytes: &[u8]) -> Result<PipelineRun, RingkasError> {
        let extracted = pdf::extract_text(bytes)?;
        if extracted.is_empty() {
            return Err(RingkasError::InsufficientText {
                length: 0,
                minimum: self.options.min_length,
            });
        }
        info!(chars = extracted.char_len(), "PDF read");
        self.run(extracted.as_str()).await
    }

    pub async fn run(&self, text: &str) -> Result<PipelineRun, RingkasError> {
        self.run_with_progress(text, |_| {}).await
    }

    /// Summarize `text`, calling `on_progress` after each chunk.
    pub async fn run_with_progress<F>(
        &self,
        text: &str,
        mut on_progress: F,
    ) -> Result<PipelineRun, RingkasError>
    where
        F: FnMut(Progress),
    {
        let source_chars = text.chars().count();
        if source_chars < self.options.min_length {
            return Err(RingkasError::InsufficientText {
                length: source_chars,
                minimum: self.options.min_length,
            });
        }

        let chunks = split_text(text, self.options.chunk_size);
        let total = chunks.len();
        info!(chunks = total, chunk_size = self.options.chunk_size, "text split");

        let mut reports = Vec::with_capacity(total);
        for chunk in chunks {
            let result = self.summarizer.summarize(&chunk.text).await;

            if let SummaryResult::Failed { error } = &result {
                warn!(chunk = chunk.index + 1, %error, "chunk failed");
                if self.options.failure_policy == FailurePolicy::Abort {
                    return Err(RingkasError::ChunkFailed {
                        index: chunk.index,
                        source: error.clone(),
                    });
                }
            }

            reports.push(ChunkReport {
                index: chunk.index,
                chars: chunk.char_len(),
                result,
            });

            let progress = Progress {
                completed: reports.len(),
                total,
            };
            info!(
                "chunk {}/{} done ({:.0}%)",
                progress.completed,
                progress.total,
                progress.fraction() * 100.0
            );
            on_progress(progress);
        }

        let partials: Vec<&str> = reports.iter().filter_map(|r| r.result.text()).collect();
        let combined = partials.join(SUMMARY_SEPARATOR);

        let consolidation = if self.options.consolidate && partials.len() > 1 {
            Some(self.summarizer.consolidate(&combined).await)
        } else {
            None
        };

        let final_text = match consolidation.as_ref().and_then(|c| c.text()) {
            Some(text) => text.to_string(),
            None => combined.clone(),
        };

        Ok(PipelineRun {
            source_chars,
            chunks: reports,
            combined,
            consolidation,
            final_text,
        })
    }
}
