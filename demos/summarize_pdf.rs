//! Summarize a PDF through Groq with progress output.
//!
//! Run with:
//!   cargo run --example summarize_pdf -- path/to/document.pdf
//!
//! Reads GROQ_API_KEY from the environment (or `.env`). Without it the
//! summary is produced locally.

use ringkas::{Pipeline, Provider, Settings, SummarizerConfig};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: summarize_pdf <FILE.pdf>")?;

    let mut settings = Settings {
        summarizer: SummarizerConfig::new(Provider::Groq).with_temperature(0.2),
        ..Settings::default()
    };
    settings.pipeline.chunk_size = 3000;
    settings.pipeline.consolidate = true;
    settings.apply_env(|key| std::env::var(key).ok());

    let pipeline = Pipeline::from_settings(settings)?;
    let text = ringkas::pdf::extract_file(&path)?;
    println!("PDF read: {} characters", text.char_len());

    let run = pipeline
        .run_with_progress(text.as_str(), |p| {
            println!("progress: {:.0}%", p.fraction() * 100.0)
        })
        .await?;

    println!("\n=== Summary ===\n{}", run.summary());

    let artifact = run.to_artifact(Some(Path::new(&path)));
    std::fs::write(&artifact.file_name, &artifact.contents)?;
    println!("\nSaved as {} ({})", artifact.file_name, artifact.mime_type);

    Ok(())
}
