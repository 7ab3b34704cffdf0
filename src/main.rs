use clap::Parser;
use secrecy::SecretString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ringkas::{FailurePolicy, Pipeline, PipelineRun, Provider, RingkasError, Settings};

/// Sentinel for `--output` given without a path.
const AUTO_OUTPUT: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "ringkas", version, about = "Summarize a PDF with a chat model")]
struct Cli {
    #[arg(value_name = "FILE", index = 1)]
    input: PathBuf,

    /// Write the summary to a file (default name derived from the input)
    #[arg(short, long, num_args = 0..=1, default_missing_value = AUTO_OUTPUT)]
    output: Option<PathBuf>,

    /// Write a JSON report of the run
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    provider: Option<Provider>,

    #[arg(short, long)]
    model: Option<String>,

    /// Model used when the primary one is retired ("" disables)
    #[arg(long)]
    fallback_model: Option<String>,

    /// API key (overrides the provider's environment variable)
    #[arg(long)]
    api_key: Option<String>,

    #[arg(long)]
    base_url: Option<String>,

    /// Maximum chunk length in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Minimum text length in characters
    #[arg(long)]
    min_length: Option<usize>,

    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Stop at the first chunk that cannot be summarized
    #[arg(long)]
    abort_on_failure: bool,

    /// Summarize the partial summaries once more into a single summary
    #[arg(long)]
    consolidate: bool,

    /// Fail instead of producing a local summary
    #[arg(long)]
    no_local_fallback: bool,
}

impl Cli {
    fn settings(&self) -> Result<Settings, RingkasError> {
        let mut settings = Settings::load(self.config.as_deref())?;

        // The provider decides which environment variable holds the key.
        if let Some(provider) = self.provider {
            settings.summarizer.provider = provider;
        }
        settings.apply_env(|key| std::env::var(key).ok());

        let summarizer = &mut settings.summarizer;
        if let Some(key) = &self.api_key {
            summarizer.api_key = Some(SecretString::from(key.clone()));
        }
        if let Some(model) = &self.model {
            summarizer.model = Some(model.clone());
        }
        if let Some(model) = &self.fallback_model {
            summarizer.fallback_model = Some(model.clone());
        }
        if let Some(url) = &self.base_url {
            summarizer.base_url = Some(url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            summarizer.timeout_secs = secs;
        }
        if self.no_local_fallback {
            summarizer.local_fallback = false;
        }

        let pipeline = &mut settings.pipeline;
        if let Some(size) = self.chunk_size {
            pipeline.chunk_size = size;
        }
        if let Some(min) = self.min_length {
            pipeline.min_length = min;
        }
        if self.abort_on_failure {
            pipeline.failure_policy = FailurePolicy::Abort;
        }
        if self.consolidate {
            pipeline.consolidate = true;
        }

        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ringkas=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_warning() => {
            warn!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            error!("Unable to summarize '{}': {}", cli.input.display(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<(), RingkasError> {
    if !cli.input.exists() {
        return Err(RingkasError::Config(format!(
            "file '{}' not found",
            cli.input.display()
        )));
    }

    let settings = cli.settings()?;
    let pipeline = Pipeline::from_settings(settings)?;

    let bytes = fs::read(&cli.input)?;
    let run = pipeline.run_document(&bytes).await?;

    report(&run);
    println!("{}", run.summary());

    if let Some(output) = &cli.output {
        let artifact = run.to_artifact(Some(&cli.input));
        let path = if output.as_os_str() == AUTO_OUTPUT {
            cli.input
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(&artifact.file_name)
        } else {
            output.clone()
        };
        fs::write(&path, &artifact.contents)?;
        info!("Summary written to: {}", path.display());
    }

    if let Some(json_path) = &cli.json {
        let json = serde_json::to_string_pretty(&run)
            .map_err(|e| RingkasError::Config(format!("cannot encode report: {}", e)))?;
        fs::write(json_path, json)?;
        info!("Report written to: {}", json_path.display());
    }

    Ok(())
}

fn report(run: &PipelineRun) {
    for chunk in &run.chunks {
        if let Some(e) = chunk.result.error() {
            if e.is_user_actionable() {
                error!("Chunk {}: {}", chunk.index + 1, e);
            } else {
                warn!("Chunk {}: {}", chunk.index + 1, e);
            }
        }
    }

    let local = run.local_chunks();
    if local > 0 {
        warn!("{} of {} chunks were summarized locally", local, run.chunks.len());
    }
    if let Some(e) = run.consolidation.as_ref().and_then(|c| c.error()) {
        warn!("Consolidation skipped: {}", e);
    }

    info!(
        "Summary ready: {} chunks, {} failed, {} characters in, {} out",
        run.chunks.len(),
        run.failed_chunks(),
        run.source_chars,
        run.final_text.chars().count()
    );
}
