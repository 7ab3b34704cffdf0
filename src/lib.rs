//! Chunked PDF summarization over OpenAI-compatible chat models.
//!
//! The pipeline extracts a PDF's text, splits it into fixed-size chunks,
//! summarizes each chunk with a primary model (switching once to a fallback
//! model when the primary is retired), joins the partial summaries and can
//! consolidate them in a second pass. Without an API key, or when a call
//! fails, a local summarizer keeps the pipeline producing output.

pub mod chunker;
pub mod config;
pub mod error;
pub mod fallback;
pub mod llm;
pub mod model;
pub mod pdf;
pub mod pipeline;
pub mod prompts;
pub mod summarizer;

// Re-export key types
pub use config::{FailurePolicy, PipelineOptions, Provider, Settings, SummarizerConfig};
pub use error::{RemoteError, RingkasError};
pub use fallback::{local_summary, LOCAL_SUMMARY_MARKER};
pub use llm::{classify_failure, ChatBackend, MockBackend, RigBackend, SharedBackend};
pub use model::{
    Chunk, ChunkReport, ExtractedText, ModelRequest, PipelineRun, Progress, SummaryArtifact,
    SummaryResult,
};
pub use pipeline::Pipeline;
pub use summarizer::Summarizer;
