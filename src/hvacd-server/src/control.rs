// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The control task: single owner of the climate state and poll session.
//!
//! All mutation funnels through one task fed by an mpsc request channel, so
//! `start`/`stop`/`adjust` are linearized by construction. Actuator and
//! remote-node work triggered by a request runs as fire-and-forget spawns;
//! request handlers never wait on hardware sleeps.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use hvacd_core::{ControlCommand, ControlRequest, ControlResult, ControlState, SensorReading};
use hvacd_hw::{run_timed_on, SharedRelayBank};

use crate::config::ServerConfig;
use crate::nodes::NodeMessenger;
use crate::poll::{PollSession, PollSettings};

/// The AC pair follows the session on-state; the rest stay manual-only.
const AC_DEVICES: [&str; 2] = ["ac1", "ac2"];
const E_FAN_DEVICES: [&str; 1] = ["e_fan"];
const BLOWER: &str = "blower";
const EXHAUST: &str = "exhaust";

/// Configuration for the control task.
#[derive(Debug, Clone)]
pub struct ControlTaskConfig {
    pub poll: PollSettings,
    pub nodes: NodeMessenger,
    pub blower_duration: Duration,
    pub exhaust_duration: Duration,
    /// Bound on waiting for the poll loop to observe cancellation.
    pub session_grace: Duration,
}

impl ControlTaskConfig {
    pub fn from_config(cfg: &ServerConfig) -> Result<Self, String> {
        let access = match cfg.bus.driver.as_str() {
            "modbus" => hvacd_hw::BusAccess::Modbus {
                path: cfg.bus.port.clone(),
                baud: cfg.bus.baud,
            },
            "memory" => hvacd_hw::BusAccess::Memory,
            other => return Err(format!("unknown bus driver: {}", other)),
        };
        Ok(Self {
            poll: PollSettings {
                access,
                local_slave: cfg.bus.local_slave,
                outside_slave: cfg.bus.outside_slave,
                interval: Duration::from_secs(cfg.bus.poll_interval_secs),
            },
            nodes: NodeMessenger::new(&cfg.nodes),
            blower_duration: Duration::from_secs(cfg.relays.blower_secs),
            exhaust_duration: Duration::from_secs(cfg.relays.exhaust_secs),
            session_grace: Duration::from_secs(2),
        })
    }
}

/// Run the control task until the request channel closes or shutdown is
/// signalled. Publishes every state change on `state_tx`.
pub async fn run_control_task(
    cfg: ControlTaskConfig,
    bank: SharedRelayBank,
    mut rx: mpsc::Receiver<ControlRequest>,
    state_tx: watch::Sender<ControlState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut state = ControlState::new();
    let mut session: Option<PollSession> = None;
    let (readings_tx, mut readings_rx) = mpsc::channel::<SensorReading>(32);
    let _ = state_tx.send(state.clone());

    loop {
        tokio::select! {
            maybe_req = rx.recv() => {
                let Some(ControlRequest { cmd, respond_to }) = maybe_req else { break; };
                let result =
                    handle_command(cmd, &cfg, &bank, &mut state, &mut session, &readings_tx).await;
                let _ = state_tx.send(state.clone());
                let _ = respond_to.send(result);
            }

            Some(reading) = readings_rx.recv() => {
                if reading.slave == cfg.poll.local_slave {
                    state.local = Some(reading);
                } else if reading.slave == cfg.poll.outside_slave {
                    state.outside = Some(reading);
                }
                let _ = state_tx.send(state.clone());
            }

            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    if let Some(session) = session.take() {
        session.cancel(cfg.session_grace).await;
    }
    info!("Control task shutting down");
}

async fn handle_command(
    cmd: ControlCommand,
    cfg: &ControlTaskConfig,
    bank: &SharedRelayBank,
    state: &mut ControlState,
    session: &mut Option<PollSession>,
    readings_tx: &mpsc::Sender<SensorReading>,
) -> ControlResult<ControlState> {
    match cmd {
        ControlCommand::GetSnapshot => Ok(state.clone()),

        ControlCommand::Start => {
            if session.is_some() {
                debug!("Start ignored: poll session already active");
                return Ok(state.clone());
            }
            state.power_status = 1;
            let new = PollSession::spawn(cfg.poll.clone(), readings_tx.clone());
            state.session_id = Some(new.id);
            *session = Some(new);

            // Local AC pair follows the on-state; failures are logged, not
            // returned, like every hardware effect of start.
            if let Err(e) = switch(bank, &AC_DEVICES, true).await {
                warn!("Local AC switch-on failed: {}", e);
            }
            let msg = state.message();
            let nodes = cfg.nodes.clone();
            tokio::spawn(async move { nodes.push_on_start(msg).await });
            Ok(state.clone())
        }

        ControlCommand::Stop => {
            if let Some(active) = session.take() {
                active.cancel(cfg.session_grace).await;
            } else {
                debug!("Stop on idle controller");
            }
            state.power_status = 0;
            state.session_id = None;

            if let Err(e) = switch(bank, &AC_DEVICES, false).await {
                warn!("Local AC switch-off failed: {}", e);
            }
            let msg = state.message();
            let nodes = cfg.nodes.clone();
            tokio::spawn(async move { nodes.push_on_stop(msg).await });
            Ok(state.clone())
        }

        ControlCommand::AdjustTemperature(direction) => {
            let target = state.adjust(direction);
            debug!("Target temperature now {} °C", target);
            // Standard push regardless of session state, single send.
            let msg = state.message();
            let nodes = cfg.nodes.clone();
            tokio::spawn(async move { nodes.push(msg).await });
            Ok(state.clone())
        }

        ControlCommand::AcOn => relay_command(bank, state, &AC_DEVICES, true).await,
        ControlCommand::AcOff => relay_command(bank, state, &AC_DEVICES, false).await,
        ControlCommand::EFansOn => relay_command(bank, state, &E_FAN_DEVICES, true).await,
        ControlCommand::EFansOff => relay_command(bank, state, &E_FAN_DEVICES, false).await,

        ControlCommand::BlowerOn => {
            spawn_timed(bank, BLOWER, cfg.blower_duration);
            Ok(state.clone())
        }
        ControlCommand::BlowerOff => relay_command(bank, state, &[BLOWER], false).await,

        ControlCommand::ExhaustOn => {
            spawn_timed(bank, EXHAUST, cfg.exhaust_duration);
            Ok(state.clone())
        }
        ControlCommand::ExhaustOff => relay_command(bank, state, &[EXHAUST], false).await,
    }
}

async fn switch(bank: &SharedRelayBank, devices: &[&str], on: bool) -> ControlResult<()> {
    let mut bank = bank.lock().await;
    if on {
        bank.turn_on(devices)
    } else {
        bank.turn_off(devices)
    }
}

/// Direct relay commands report invalid input (unknown device) to the
/// caller; nothing was driven in that case.
async fn relay_command(
    bank: &SharedRelayBank,
    state: &ControlState,
    devices: &[&str],
    on: bool,
) -> ControlResult<ControlState> {
    switch(bank, devices, on).await?;
    Ok(state.clone())
}

/// Timed runs occupy a task for the full duration, so they always go
/// through `tokio::spawn`; errors are logged, not returned.
fn spawn_timed(bank: &SharedRelayBank, device: &'static str, duration: Duration) {
    let bank = std::sync::Arc::clone(bank);
    tokio::spawn(async move {
        if let Err(e) = run_timed_on(bank, device, duration).await {
            warn!("Timed {} run failed: {}", device, e);
        }
    });
}
