// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

mod config;
mod control;
mod listener;
mod logging;
mod nodes;
mod poll;

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

use hvacd_core::{ControlRequest, ControlState, DynResult};
use hvacd_hw::{build_line_driver, RelayBank, SharedRelayBank};

use config::ServerConfig;
use control::ControlTaskConfig;
use logging::init_logging;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - climate control daemon");
const CONTROL_CHANNEL_BUFFER: usize = 32;

#[derive(Debug, Parser)]
#[command(version = env!("CARGO_PKG_VERSION"), about = PKG_DESCRIPTION)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// IP address for the JSON TCP listener
    #[arg(short = 'l', long = "listen")]
    listen: Option<IpAddr>,
    /// Port for the JSON TCP listener
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", ServerConfig::example_toml());
        return Ok(());
    }

    let (cfg, config_path) = if let Some(ref path) = cli.config {
        (ServerConfig::load_from_file(path)?, Some(path.clone()))
    } else {
        ServerConfig::load_from_default_paths()?
    };
    cfg.validate()
        .map_err(|e| format!("Invalid server configuration: {}", e))?;

    init_logging(cfg.general.log_level.as_deref());

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    info!(
        "Starting hvacd-server (bus: {} {} @ {} baud, relays: {})",
        cfg.bus.driver, cfg.bus.port, cfg.bus.baud, cfg.relays.driver
    );

    // Fatal-Startup: without the hardware interface the daemon must not
    // serve traffic that implies relay control.
    let driver = build_line_driver(&cfg.relays.driver)?;
    let bank: SharedRelayBank = Arc::new(Mutex::new(RelayBank::new(driver, &cfg.relays.lines)?));

    let task_cfg = ControlTaskConfig::from_config(&cfg)?;

    let (control_tx, control_rx) = mpsc::channel::<ControlRequest>(CONTROL_CHANNEL_BUFFER);
    let (state_tx, state_rx) = watch::channel(ControlState::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task_handles: Vec<JoinHandle<()>> = Vec::new();

    {
        let bank = Arc::clone(&bank);
        let ctl_shutdown_rx = shutdown_rx.clone();
        task_handles.push(tokio::spawn(async move {
            control::run_control_task(task_cfg, bank, control_rx, state_tx, ctl_shutdown_rx).await;
        }));
    }

    if cfg.listen.enabled {
        let listen_ip = cli.listen.unwrap_or(cfg.listen.listen);
        let listen_port = cli.port.unwrap_or(cfg.listen.port);
        let listen_addr = SocketAddr::from((listen_ip, listen_port));
        let auth_tokens: HashSet<String> = cfg
            .listen
            .auth
            .tokens
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect();
        let tx = control_tx.clone();
        let listener_state_rx = state_rx.clone();
        let listener_shutdown_rx = shutdown_rx.clone();
        task_handles.push(tokio::spawn(async move {
            if let Err(e) = listener::run_listener(
                listen_addr,
                tx,
                auth_tokens,
                listener_state_rx,
                listener_shutdown_rx,
            )
            .await
            {
                error!("Listener error: {:?}", e);
            }
        }));
    }

    signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down");
    let _ = shutdown_tx.send(true);
    drop(control_tx);
    tokio::time::sleep(Duration::from_millis(400)).await;

    for handle in &task_handles {
        if !handle.is_finished() {
            handle.abort();
        }
    }
    for handle in task_handles {
        let _ = handle.await;
    }

    // Dropping the bank releases every claimed output line.
    drop(bank);
    Ok(())
}
