// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The sensor poll session: one background loop per `start`.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use hvacd_core::SensorReading;
use hvacd_hw::{open_sensor_bus, BusAccess, SensorBus};

/// Everything a poll session needs to run.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub access: BusAccess,
    pub local_slave: u8,
    pub outside_slave: u8,
    pub interval: Duration,
}

/// An owned background poll loop plus its cancellation signal.
pub struct PollSession {
    pub id: Uuid,
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PollSession {
    /// Launch a poll session. The bus is opened inside the spawned task so
    /// the caller returns immediately even when the serial open is slow.
    pub fn spawn(settings: PollSettings, readings_tx: mpsc::Sender<SensorReading>) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let id = Uuid::new_v4();
        let handle = tokio::spawn(async move {
            let bus = match open_sensor_bus(&settings.access) {
                Ok(bus) => Some(bus),
                Err(e) => {
                    error!("Field bus open failed: {}", e);
                    None
                }
            };
            run_poll_loop(id, bus, settings, readings_tx, cancel_rx).await;
        });
        info!(session = %id, "Poll session started");
        Self {
            id,
            cancel_tx,
            handle,
        }
    }

    /// Raise the cancellation signal and wait for the loop to exit.
    ///
    /// The loop wakes from its sleep as soon as the signal changes, so the
    /// wait normally completes immediately; `grace` only bounds the case of
    /// a bus read still in flight.
    pub async fn cancel(mut self, grace: Duration) {
        let _ = self.cancel_tx.send(true);
        if tokio::time::timeout(grace, &mut self.handle).await.is_err() {
            warn!(session = %self.id, "Poll loop still busy after {:?}, aborting", grace);
            self.handle.abort();
            let _ = self.handle.await;
        }
        info!(session = %self.id, "Poll session stopped");
    }
}

/// Poll both slaves, forward the readings, sleep, repeat until cancelled.
///
/// A failed read is logged and skipped; nothing here ever tears the loop
/// down. An unopened bus stays unopened for the whole session — the next
/// `start` is responsible for re-establishing the connection.
async fn run_poll_loop(
    id: Uuid,
    mut bus: Option<Box<dyn SensorBus>>,
    settings: PollSettings,
    readings_tx: mpsc::Sender<SensorReading>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    loop {
        if *cancel_rx.borrow() {
            break;
        }

        match bus.as_mut() {
            Some(bus) => {
                for slave in [settings.local_slave, settings.outside_slave] {
                    match bus.read_registers(slave, 0, 2).await {
                        Ok(registers) => match SensorReading::from_registers(slave, &registers) {
                            Ok(reading) => {
                                info!(
                                    "Slave {}: {:.1} °C (status {})",
                                    slave, reading.temperature, reading.status
                                );
                                let _ = readings_tx.send(reading).await;
                            }
                            Err(e) => warn!("Poll decode failed: {}", e),
                        },
                        Err(e) => warn!("Poll failed for slave {}: {}", slave, e),
                    }
                }
            }
            None => warn!("Field bus unavailable, skipping poll cycle"),
        }

        // Cancellable sleep: wakes as soon as stop raises the signal.
        tokio::select! {
            _ = tokio::time::sleep(settings.interval) => {}
            _ = cancel_rx.changed() => {}
        }
    }
    info!(session = %id, "Poll loop exited");
}
