//! Orchestrator tests using the scripted backend
use std::sync::Arc;

use ringkas::{
    FailurePolicy, MockBackend, Pipeline, PipelineOptions, RemoteError, RingkasError, Settings,
    Summarizer, SummarizerConfig, SummaryResult, LOCAL_SUMMARY_MARKER,
};

fn text_of_len(len: usize) -> String {
    "Dokumen ini membahas banyak hal penting. "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

fn online_config() -> SummarizerConfig {
    SummarizerConfig::default()
        .with_api_key("test-key")
        .with_model("primary")
        .with_fallback_model("secondary")
        .with_local_fallback(false)
}

/// Answers with the position of the chunk inside the source text.
fn numbering_backend(source: &str) -> MockBackend {
    let source = source.to_string();
    MockBackend::replying(move |req| {
        let chunk = req.user_content.split("\n\n").last().unwrap_or_default();
        let offset = source.find(chunk).unwrap_or(usize::MAX);
        Ok(format!("summary@{}", offset))
    })
}

#[tokio::test]
async fn test_three_chunks_joined_in_order() {
    let text = "a".repeat(2000) + &"b".repeat(2000) + &"c".repeat(500);
    let backend = Arc::new(numbering_backend(&text));
    let pipeline = Pipeline::new(
        Summarizer::new(online_config(), backend.clone()),
        PipelineOptions::default().with_chunk_size(2000),
    );

    let run = pipeline.run(&text).await.unwrap();

    assert_eq!(run.chunks.len(), 3);
    assert_eq!(backend.call_count(), 3);
    assert_eq!(run.summary(), "summary@0\n\nsummary@2000\n\nsummary@4000");
    assert_eq!(run.failed_chunks(), 0);
    assert_eq!(run.source_chars, 4500);
    assert!(run.consolidation.is_none());
}

#[tokio::test]
async fn test_short_text_makes_no_remote_call() {
    let backend = Arc::new(MockBackend::new());
    let pipeline = Pipeline::new(
        Summarizer::new(online_config(), backend.clone()),
        PipelineOptions::default(),
    );

    let result = pipeline.run(&text_of_len(499)).await;

    let err = result.unwrap_err();
    assert!(err.is_warning());
    assert!(matches!(
        err,
        RingkasError::InsufficientText {
            length: 499,
            minimum: 500
        }
    ));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_custom_minimum_length() {
    let backend = Arc::new(MockBackend::new());
    let pipeline = Pipeline::new(
        Summarizer::new(online_config(), backend.clone()),
        PipelineOptions::default().with_min_length(10),
    );

    let run = pipeline.run("Cukup panjang.").await.unwrap();
    assert_eq!(run.summary(), "A mock summary");
}

#[tokio::test]
async fn test_empty_key_produces_local_summary_offline() {
    let backend = Arc::new(MockBackend::new());
    let settings = Settings {
        summarizer: SummarizerConfig::default().with_api_key(""),
        pipeline: PipelineOptions::default(),
    };
    let pipeline = Pipeline::with_backend(settings, backend.clone());

    let run = pipeline.run(&text_of_len(1000)).await.unwrap();

    assert!(run.summary().starts_with(LOCAL_SUMMARY_MARKER));
    assert_eq!(run.local_chunks(), 1);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_from_settings_without_key_runs_offline() {
    let pipeline = Pipeline::from_settings(Settings::default()).unwrap();

    let run = pipeline.run(&text_of_len(1000)).await.unwrap();

    assert!(run.summary().starts_with(LOCAL_SUMMARY_MARKER));
}

#[tokio::test]
async fn test_skip_policy_keeps_remaining_chunks() {
    let backend = Arc::new(
        MockBackend::new()
            .with_response("primary", Ok("first".to_string()))
            .with_response(
                "primary",
                Err(RemoteError::Failed {
                    status: Some(500),
                    body: "boom".to_string(),
                }),
            )
            .with_response("primary", Ok("third".to_string())),
    );
    let pipeline = Pipeline::new(
        Summarizer::new(online_config(), backend.clone()),
        PipelineOptions::default().with_chunk_size(2000),
    );

    let run = pipeline.run(&text_of_len(4500)).await.unwrap();

    assert_eq!(run.summary(), "first\n\nthird");
    assert_eq!(run.failed_chunks(), 1);
    assert!(run.chunks[1].result.is_failed());
    assert_eq!(backend.call_count(), 3);
}

#[tokio::test]
async fn test_abort_policy_stops_at_first_failure() {
    let backend = Arc::new(
        MockBackend::new()
            .with_response("primary", Ok("first".to_string()))
            .with_response(
                "primary",
                Err(RemoteError::QuotaExceeded("Rate limit reached".to_string())),
            ),
    );
    let pipeline = Pipeline::new(
        Summarizer::new(online_config(), backend.clone()),
        PipelineOptions::default()
            .with_chunk_size(2000)
            .with_failure_policy(FailurePolicy::Abort),
    );

    let result = pipeline.run(&text_of_len(4500)).await;

    match result {
        Err(RingkasError::ChunkFailed { index, source }) => {
            assert_eq!(index, 1);
            assert!(matches!(source, RemoteError::QuotaExceeded(_)));
        }
        other => panic!("expected chunk failure, got {:?}", other),
    }
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn test_progress_reported_after_each_chunk() {
    let backend = Arc::new(MockBackend::new());
    let pipeline = Pipeline::new(
        Summarizer::new(online_config(), backend),
        PipelineOptions::default().with_chunk_size(1000),
    );
    let mut seen = Vec::new();

    pipeline
        .run_with_progress(&text_of_len(3500), |p| {
            seen.push((p.completed, p.total, p.fraction()))
        })
        .await
        .unwrap();

    assert_eq!(
        seen,
        vec![(1, 4, 0.25), (2, 4, 0.5), (3, 4, 0.75), (4, 4, 1.0)]
    );
}

#[tokio::test]
async fn test_consolidation_pass() {
    let backend = Arc::new(
        MockBackend::new()
            .with_response("primary", Ok("one".to_string()))
            .with_response("primary", Ok("two".to_string()))
            .with_response("primary", Ok("final".to_string())),
    );
    let pipeline = Pipeline::new(
        Summarizer::new(online_config(), backend.clone()),
        PipelineOptions::default()
            .with_chunk_size(600)
            .with_consolidation(true),
    );

    let run = pipeline.run(&text_of_len(1000)).await.unwrap();

    assert_eq!(run.combined, "one\n\ntwo");
    assert_eq!(run.summary(), "final");
    let calls = backend.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[2].user_content.ends_with("one\n\ntwo"));
    assert!(calls[2]
        .user_content
        .starts_with(ringkas::prompts::DEFAULT_CONSOLIDATION_PROMPT));
}

#[tokio::test]
async fn test_consolidation_uses_fallback_model() {
    let backend = Arc::new(
        MockBackend::new()
            .with_response("primary", Ok("one".to_string()))
            .with_response("primary", Ok("two".to_string()))
            .with_response(
                "primary",
                Err(RemoteError::ModelUnavailable {
                    model: "primary".to_string(),
                    message: "model_decommissioned".to_string(),
                }),
            )
            .with_response("secondary", Ok("final".to_string())),
    );
    let pipeline = Pipeline::new(
        Summarizer::new(online_config(), backend.clone()),
        PipelineOptions::default()
            .with_chunk_size(600)
            .with_consolidation(true),
    );

    let run = pipeline.run(&text_of_len(1000)).await.unwrap();

    assert_eq!(run.summary(), "final");
    assert_eq!(
        run.consolidation,
        Some(SummaryResult::Generated {
            text: "final".to_string(),
            model: "secondary".to_string(),
        })
    );
}

#[tokio::test]
async fn test_failed_consolidation_keeps_partials() {
    let backend = Arc::new(
        MockBackend::new()
            .with_response("primary", Ok("one".to_string()))
            .with_response("primary", Ok("two".to_string()))
            .with_response(
                "primary",
                Err(RemoteError::Transport("timed out".to_string())),
            ),
    );
    let pipeline = Pipeline::new(
        Summarizer::new(online_config().with_local_fallback(true), backend),
        PipelineOptions::default()
            .with_chunk_size(600)
            .with_consolidation(true),
    );

    let run = pipeline.run(&text_of_len(1000)).await.unwrap();

    assert_eq!(run.summary(), "one\n\ntwo");
    assert!(run.consolidation.unwrap().is_failed());
}

#[tokio::test]
async fn test_single_chunk_skips_consolidation() {
    let backend = Arc::new(MockBackend::new());
    let pipeline = Pipeline::new(
        Summarizer::new(online_config(), backend.clone()),
        PipelineOptions::default().with_consolidation(true),
    );

    let run = pipeline.run(&text_of_len(800)).await.unwrap();

    assert!(run.consolidation.is_none());
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let backend = Arc::new(MockBackend::new());
    let pipeline = Pipeline::new(
        Summarizer::new(online_config(), backend),
        PipelineOptions::default(),
    );

    let run = pipeline.run(&text_of_len(800)).await.unwrap();
    let json = serde_json::to_value(&run).unwrap();

    assert_eq!(json["chunks"][0]["result"]["status"], "generated");
    assert_eq!(json["chunks"][0]["result"]["model"], "primary");
    assert_eq!(json["final_text"], "A mock summary");
}
