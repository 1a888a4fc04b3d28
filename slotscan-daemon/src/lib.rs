pub mod cli;
pub mod config;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::{load_config, DaemonConfig};
use slotscan_core::{
    workers::{WatchedEvent, WatcherManager},
    LedgerClient, RpcLedger,
};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use std::{
    io::{self, Write},
    sync::Arc,
};
use tokio::signal;

/// The main entry point for running the daemon.
/// This function handles CLI parsing, configuration, and watcher startup.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let Commands::Run(run_cmd) = cli.command;
    let config = load_config_from_cli(run_cmd)?;
    slotscan_logger::init(&config.daemon.log)?;
    tracing::info!("Configuration loaded: {:#?}", &config);
    run_watchers(config).await
}

// Stdout carries events only, so status messages go to stderr.
fn load_config_from_cli(run_cmd: cli::RunCmd) -> Result<DaemonConfig> {
    if let Some(config_path) = run_cmd.config {
        eprintln!("Loading configuration from '{}'", &config_path);
        load_config(&config_path)
    } else {
        eprintln!("No config file provided, using default settings.");
        Ok(DaemonConfig::default())
    }
}

/// Runs every configured watcher until Ctrl+C, printing events as they arrive.
async fn run_watchers(config: DaemonConfig) -> Result<()> {
    let DaemonConfig { scanner, daemon } = config;
    let commitment = scanner.solana.commitment;

    let rpc_client = Arc::new(RpcClient::new_with_commitment(
        scanner.solana.rpc_url.clone(),
        CommitmentConfig { commitment },
    ));
    let client: Arc<dyn LedgerClient> = Arc::new(RpcLedger::new(rpc_client, commitment));

    let (manager, mut handle) = WatcherManager::new(Arc::new(scanner), client, &daemon.watchers)
        .context("Failed to start watchers")?;
    let manager_task = tokio::spawn(manager.run());

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => print_event(&event)?,
                None => {
                    tracing::warn!("All watchers exited.");
                    break;
                }
            },
            res = signal::ctrl_c() => {
                match res {
                    Ok(()) => tracing::info!("Received Ctrl+C, initiating graceful shutdown..."),
                    Err(err) => tracing::error!(error = %err, "Failed to listen for shutdown signal."),
                }
                handle.stop();
                break;
            }
        }
    }

    // Events of scans that finished before the stop are already committed.
    while let Some(event) = handle.next_event().await {
        print_event(&event)?;
    }
    manager_task
        .await
        .context("Watcher manager task failed")?;
    tracing::info!("Shutdown complete.");
    Ok(())
}

fn print_event(event: &WatchedEvent) -> Result<()> {
    let line = serde_json::to_string(event).context("Failed to serialize event")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
}
