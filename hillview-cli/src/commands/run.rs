//! Run command - serve the message protocol over stdin/stdout.
//!
//! Each line on stdin is one inbound JSON message (`config`, `area`,
//! `abort`, `cleanup`). Every outbound message is written to stdout as one
//! JSON line. Logs go to stderr and the log file so stdout stays parseable.
//!
//! On end of input the command waits for running jobs to finish, flushes
//! their updates and exits.

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use hillview::orchestrator::{Orchestrator, OrchestratorSettings};
use hillview::publisher::{UpdatePublisher, UpdateReceiver};
use hillview::source::{SourceLoader, TimeoutLoader};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the run command.
#[derive(Default)]
pub struct RunArgs {
    pub catalog: Option<PathBuf>,
    pub debug: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(args.debug)?;
    runner.log_startup("run");

    let loader = runner.load_catalog(args.catalog.as_deref())?;
    let settings = runner.config().orchestrator_settings();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    match settings.load_timeout {
        Some(timeout) => runtime.block_on(serve(TimeoutLoader::new(loader, timeout), settings)),
        None => runtime.block_on(serve(loader, settings)),
    }
}

async fn serve<L: SourceLoader>(loader: L, settings: OrchestratorSettings) -> Result<(), CliError> {
    let (publisher, updates) = UpdatePublisher::channel();
    let orchestrator = Orchestrator::new(loader, publisher, settings);
    let writer = tokio::spawn(write_updates(updates));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut received = 0usize;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        received += 1;
        if let Err(e) = orchestrator.handle_message(line).await {
            // Already reported on stdout as an error message.
            debug!(error = %e, "Message rejected");
        }
    }

    info!(received, active = orchestrator.active_count(), "Input closed, draining jobs");
    let stats = orchestrator.stats();
    // Jobs hold their own handles; the writer ends once the last one drops.
    drop(orchestrator);

    match writer.await {
        Ok(result) => result?,
        Err(e) => warn!(error = %e, "Update writer task failed"),
    }
    info!(?stats, "Run finished");
    Ok(())
}

/// Writes each outbound message as one JSON line.
async fn write_updates(mut updates: UpdateReceiver) -> Result<(), CliError> {
    let mut stdout = tokio::io::stdout();
    while let Some(message) = updates.recv().await {
        let line = match message.to_json() {
            Ok(line) => line,
            Err(e) => {
                warn!(kind = message.kind(), error = %e, "Dropping unserializable message");
                continue;
            }
        };
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }
    Ok(())
}
