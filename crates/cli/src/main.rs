//! Fencecheck - Main Entry Point
//! Validates fenced code blocks in Markdown documents with external commands

mod documents;
mod markdown;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use documents::{collect_documents, Document};
use fencecheck_core::application::Coordinator;
use fencecheck_core::config::EngineConfig;
use fencecheck_core::port::time_provider::SystemTimeProvider;
use fencecheck_core::port::TracingReporter;
use fencecheck_infra_system::SubprocessRunner;
use markdown::extract_fences;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_CONFIG: &str = "fencecheck.yml";

#[derive(Parser)]
#[command(name = "fencecheck")]
#[command(about = "Run validator commands against fenced code blocks", long_about = None)]
#[command(version)]
struct Cli {
    /// Markdown files or directories to check
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Configuration file (YAML, or JSON with a .json extension)
    #[arg(short, long, env = "FENCECHECK_CONFIG", default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Override the worker pool size
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    workers: Option<u64>,

    /// Exit with an error when any validation failed
    #[arg(long)]
    strict: bool,

    /// Log format: "json" or "pretty"
    #[arg(long, env = "FENCECHECK_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

fn init_logging(format: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("fencecheck=info"))
        .context("Failed to create env filter")?;

    match format {
        "json" => {
            // Machine-readable: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
    Ok(())
}

/// Feed every document through the engine, checkpointing between documents
async fn process(engine: &mut Coordinator, documents: &[Document]) -> Result<usize> {
    for document in documents {
        let text = tokio::fs::read_to_string(&document.path)
            .await
            .with_context(|| format!("Failed to read {}", document.path.display()))?;

        let mut queued = 0;
        for fence in extract_fences(&text) {
            tracing::trace!(
                document = %document.id,
                line = fence.line,
                kind = %fence.kind,
                "Fenced block found"
            );
            queued += engine.on_snippet_encountered(
                document.id.as_str(),
                fence.content,
                &fence.kind,
                fence.attributes.as_slice(),
            )?;
        }
        tracing::debug!(document = %document.id, queued, "Document processed");

        engine.on_document_boundary()?;
    }
    Ok(engine.on_run_complete().await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    init_logging(&cli.log_format)?;
    info!("Fencecheck v{} starting...", VERSION);

    // 2. Load configuration (fatal on error, before any processing)
    let mut config = EngineConfig::from_path(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(workers) = cli.workers {
        config.workers = usize::try_from(workers).context("Invalid worker count")?;
    }

    let documents = collect_documents(&cli.paths)?;
    info!(documents = documents.len(), "Documents discovered");

    // 3. Setup dependencies (DI wiring)
    let runner = Arc::new(SubprocessRunner::new(Arc::new(SystemTimeProvider)));
    let mut engine = Coordinator::from_config(&config, runner, Arc::new(TracingReporter))?;

    // 4. Run until done or interrupted
    let finished = tokio::select! {
        result = process(&mut engine, &documents) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    match finished {
        Some(result) => {
            result?;
        }
        None => {
            let discarded = engine.cancel()?;
            warn!(discarded, "Interrupted, pending validations discarded");
            anyhow::bail!("interrupted");
        }
    }

    // 5. Summary
    let failures = engine.failure_count();
    if failures == 0 {
        println!(
            "{}",
            format!("✓ {} document(s) checked, no failures", documents.len())
                .green()
                .bold()
        );
    } else {
        println!(
            "{}",
            format!(
                "✗ {} validation failure(s) in {} document(s)",
                failures,
                documents.len()
            )
            .yellow()
            .bold()
        );
    }

    if cli.strict && failures > 0 {
        anyhow::bail!("{} validation failure(s) with --strict", failures);
    }

    Ok(())
}
