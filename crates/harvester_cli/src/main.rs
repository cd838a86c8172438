mod cli;
mod config;
mod logging;
mod output;
mod progress;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use engine_logging::{engine_error, engine_info, engine_warn};
use harvester_engine::{CheckpointStore, DataTablesSource, ExtractionSession, FileCheckpointStore};
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::config::HarvestConfig;
use crate::output::{OutputPaths, RunOutcome};
use crate::progress::StdoutProgressSink;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(cli.verbose, cli.log_file.as_deref());

    // Single thread: the session label used in log lines is thread-local.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            engine_error!("Could not start runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunOutcome> {
    let config = match &cli.config {
        Some(path) => HarvestConfig::load(path)?,
        None => HarvestConfig::default(),
    }
    .with_cli_overrides(&cli);

    let endpoint = config
        .endpoint
        .clone()
        .context("no endpoint: pass --endpoint or set it in the config file")?;
    let paths = OutputPaths::new(cli.output.as_deref(), &cli.source_id)?;
    let store = FileCheckpointStore::new(paths.dir().to_path_buf());

    let resume_from = if cli.no_resume {
        None
    } else {
        store.read(&cli.source_id).with_context(|| {
            format!(
                "could not load checkpoint {:?} (use --no-resume to start over)",
                store.path_for(&cli.source_id)
            )
        })?
    };

    let mut source =
        DataTablesSource::new(&endpoint, cli.source_id.clone(), config.datatables_settings())
            .with_context(|| format!("could not set up source at {endpoint}"))?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            engine_warn!("Interrupted; finishing after the current page");
            on_interrupt.cancel();
        }
    });

    engine_info!("Harvesting {} from {}", cli.source_id, endpoint);
    let sink = StdoutProgressSink;
    let result = ExtractionSession::new(cli.source_id.clone(), &store, &sink)
        .with_settings(config.walk_settings())
        .with_cancellation(cancel)
        .run(&mut source, resume_from)
        .await;

    output::finish(
        &paths,
        &cli.source_id,
        &result,
        &store,
        cli.format,
        cli.keep_checkpoint,
    )
}
