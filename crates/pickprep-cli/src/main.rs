//! pickprep: run a media preparation batch against a local storage tree.
//!
//! Configuration comes from PICKPREP_* environment variables (a `.env` file is
//! honored); flags override them.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pickprep_cli::{load_manifest, CopyTranscoder, OutcomeReport};
use pickprep_core::{Locator, PrepareConfig};
use pickprep_infra::{init_tracing, TracingEventSink};
use pickprep_storage::{create_storage, LocalStorage};
use pickprep_worker::{
    InMemorySelection, MimeTypeCapabilityChecker, PrepareCollaborators, PrepareOrchestrator,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "pickprep", about = "Prepare picked media for a requesting application")]
struct Cli {
    /// Emit logs as JSON (always on when PICKPREP_ENVIRONMENT is production)
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one batch described by a JSON manifest
    Prepare {
        /// Path to the manifest
        manifest: PathBuf,
        /// Storage root (overrides PICKPREP_STORAGE_ROOT)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Preload concurrency (overrides PICKPREP_PRELOAD_CONCURRENCY)
        #[arg(long)]
        concurrency: Option<usize>,
        /// Skip transcoding regardless of the manifest
        #[arg(long)]
        no_transcode: bool,
    },
    /// Print the transcoded locator for a picker locator
    Rewrite {
        /// Locator of the form scheme://authority/s1/s2/s3/s4/s5
        locator: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let mut config = PrepareConfig::from_env().context("Load configuration")?;
    init_tracing("info", cli.json_logs || config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    match cli.command {
        Commands::Prepare {
            manifest,
            root,
            concurrency,
            no_transcode,
        } => {
            if let Some(root) = root {
                config.storage_root = Some(root.display().to_string());
            }
            if let Some(concurrency) = concurrency {
                config.preload_concurrency = concurrency;
            }
            if no_transcode {
                config.transcode_enabled = false;
            }
            config.validate()?;

            let report = run_prepare(config, &manifest).await?;
            print_json(&report)?;
        }
        Commands::Rewrite { locator } => {
            let locator: Locator = locator.parse().context("Parse locator")?;
            let rewritten = locator.to_transcoded().context("Rewrite locator")?;
            print_json(&serde_json::json!({
                "locator": locator,
                "transcoded": rewritten,
            }))?;
        }
    }

    Ok(())
}

async fn run_prepare(
    config: PrepareConfig,
    manifest_path: &std::path::Path,
) -> anyhow::Result<OutcomeReport> {
    let manifest = load_manifest(manifest_path).await?;
    let root = config
        .storage_root
        .clone()
        .context("Storage root not set. Pass --root or set PICKPREP_STORAGE_ROOT")?;

    let storage = create_storage(&config).await.context("Create storage")?;
    let transcoder = CopyTranscoder::new(
        LocalStorage::new(root)
            .await
            .context("Open storage root for transcoding")?,
    );
    let selection = Arc::new(InMemorySelection::new(manifest.items.clone()));
    let collaborators = PrepareCollaborators::new(
        storage,
        Arc::new(MimeTypeCapabilityChecker),
        Arc::new(transcoder),
        selection.clone(),
    )
    .with_events(Arc::new(TracingEventSink));

    let orchestrator = PrepareOrchestrator::new(config, collaborators)?;
    let mut handle = orchestrator
        .start_prepare(manifest.items.clone(), manifest.transcode_request())
        .await?;

    let outcome = tokio::select! {
        outcome = handle.outcome() => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, cancelling batch");
            orchestrator.cancel_prepare().await;
            handle.outcome().await
        }
    };
    orchestrator.wait_for_workers().await;

    Ok(OutcomeReport::new(
        handle.batch_id(),
        outcome,
        selection.items().await,
    ))
}
