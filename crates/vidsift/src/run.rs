// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vidsift run` command implementation.
//!
//! Wires the store and the ingestion runner to a chat transport and runs
//! one full pass. The transport is linked at the [`ChatClient`] seam;
//! builds of this binary without one refuse to run rather than pretending
//! to.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use vidsift_config::VidsiftConfig;
use vidsift_core::{ChatClient, VidsiftError};
use vidsift_ingest::{normalized_name, IngestionRunner, RunSummary};
use vidsift_storage::Store;

/// Run the `vidsift run` command.
pub async fn run_command(config: VidsiftConfig) -> Result<(), VidsiftError> {
    let client = build_client(&config)?;
    let summary = run_with_client(config, client).await?;
    print_summary(&summary);
    Ok(())
}

/// Full wiring: open store, import legacy state, install the signal
/// handler, and drive one ingestion run against `client`.
pub async fn run_with_client(
    config: VidsiftConfig,
    client: Arc<dyn ChatClient>,
) -> Result<RunSummary, VidsiftError> {
    let store = Arc::new(Store::open(&config.storage).await?);
    let normalize_flag = config.dedup.normalize_filenames;
    let imported = store
        .import_legacy(&config.storage, &move |name| {
            normalized_name(name, normalize_flag)
        })
        .await?;
    if imported.messages > 0 || imported.videos > 0 {
        info!(
            messages = imported.messages,
            videos = imported.videos,
            "legacy state imported"
        );
    }

    let cancel = install_signal_handler();
    let runner = IngestionRunner::new(client, store.clone(), config);
    let summary = runner.run(cancel).await?;

    store.close().await?;
    Ok(summary)
}

/// Construct the chat transport for this build.
///
/// The ingestion core is transport-agnostic; a deployment links a
/// [`ChatClient`] implementation here. This build ships none.
fn build_client(_config: &VidsiftConfig) -> Result<Arc<dyn ChatClient>, VidsiftError> {
    Err(VidsiftError::Config(
        "no chat transport is compiled into this build; \
         link a ChatClient implementation and wire it in build_client()"
            .to_string(),
    ))
}

/// Cancellation token triggered by Ctrl-C.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let handler_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            handler_token.cancel();
        }
    });
    token
}

fn print_summary(summary: &RunSummary) {
    println!(
        "scanned {} sources, processed {} messages, forwarded {} videos",
        summary.sources_scanned, summary.messages_processed, summary.forwarded
    );
    for (topic, count) in &summary.per_topic {
        println!("  {topic}: {count}");
    }
}
