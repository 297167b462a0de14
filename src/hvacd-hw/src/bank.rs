// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The relay bank: named devices mapped onto output lines.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};

use hvacd_core::{ControlError, ControlResult};

use crate::{Level, LineDriver};

// Active-low relay boards.
const ON_LEVEL: Level = Level::Low;
const OFF_LEVEL: Level = Level::High;

/// Relay bank shared between the control task and spawned timed runs.
pub type SharedRelayBank = Arc<Mutex<RelayBank>>;

/// A fixed set of named relays on claimed output lines.
///
/// Claims every bound line at construction and drives it to the OFF level
/// before any command is accepted. Lines are released when the bank drops.
pub struct RelayBank {
    driver: Box<dyn LineDriver>,
    lines: BTreeMap<String, u8>,
}

impl RelayBank {
    pub fn new(
        mut driver: Box<dyn LineDriver>,
        bindings: &BTreeMap<String, u8>,
    ) -> ControlResult<Self> {
        for (name, line) in bindings {
            driver.claim(*line).map_err(|e| {
                ControlError::Startup(format!("claiming line {} for {}: {}", line, name, e))
            })?;
        }
        // Fail-safe default: everything off before the first command.
        for (name, line) in bindings {
            driver.drive(*line, OFF_LEVEL).map_err(|e| {
                ControlError::Startup(format!("clearing line {} for {}: {}", line, name, e))
            })?;
        }
        info!("Relay bank ready ({} devices, all off)", bindings.len());
        Ok(Self {
            driver,
            lines: bindings.clone(),
        })
    }

    /// Resolve every name before any line is driven, so one unknown device
    /// leaves the whole bank untouched.
    fn resolve(&self, devices: &[&str]) -> ControlResult<Vec<u8>> {
        devices
            .iter()
            .map(|name| {
                self.lines
                    .get(*name)
                    .copied()
                    .ok_or_else(|| ControlError::UnknownDevice((*name).to_string()))
            })
            .collect()
    }

    pub fn turn_on(&mut self, devices: &[&str]) -> ControlResult<()> {
        self.drive_all(devices, ON_LEVEL)
    }

    pub fn turn_off(&mut self, devices: &[&str]) -> ControlResult<()> {
        self.drive_all(devices, OFF_LEVEL)
    }

    fn drive_all(&mut self, devices: &[&str], level: Level) -> ControlResult<()> {
        let lines = self.resolve(devices)?;
        for (name, line) in devices.iter().zip(lines) {
            self.driver
                .drive(line, level)
                .map_err(|e| ControlError::Internal(format!("driving {}: {}", name, e)))?;
            debug!("{} -> {:?}", name, level);
        }
        Ok(())
    }
}

impl Drop for RelayBank {
    fn drop(&mut self) {
        self.driver.release_all();
        info!("Relay lines released");
    }
}

/// Drive `device` on, hold for `duration`, then drive it off again.
///
/// Occupies its task for the full duration; always call via `tokio::spawn`
/// so no request handler waits on it. The lock is never held across the
/// sleep, so other relay commands proceed during the run.
pub async fn run_timed_on(
    bank: SharedRelayBank,
    device: &str,
    duration: Duration,
) -> ControlResult<()> {
    bank.lock().await.turn_on(&[device])?;
    tokio::time::sleep(duration).await;
    bank.lock().await.turn_off(&[device])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryLineDriver;

    fn bindings() -> BTreeMap<String, u8> {
        BTreeMap::from([
            ("ac1".to_string(), 4),
            ("ac2".to_string(), 17),
            ("blower".to_string(), 18),
        ])
    }

    #[test]
    fn test_configure_drives_every_line_off() {
        let driver = MemoryLineDriver::new();
        let levels = driver.levels();
        let _bank = RelayBank::new(Box::new(driver), &bindings()).unwrap();
        for line in [4u8, 17, 18] {
            assert_eq!(levels.get(line), Some(Level::High));
        }
    }

    #[test]
    fn test_turn_on_drives_low() {
        let driver = MemoryLineDriver::new();
        let levels = driver.levels();
        let mut bank = RelayBank::new(Box::new(driver), &bindings()).unwrap();
        bank.turn_on(&["ac1", "ac2"]).unwrap();
        assert_eq!(levels.get(4), Some(Level::Low));
        assert_eq!(levels.get(17), Some(Level::Low));
        assert_eq!(levels.get(18), Some(Level::High));

        bank.turn_off(&["ac1"]).unwrap();
        assert_eq!(levels.get(4), Some(Level::High));
        assert_eq!(levels.get(17), Some(Level::Low));
    }

    #[test]
    fn test_unknown_device_leaves_lines_untouched() {
        let driver = MemoryLineDriver::new();
        let levels = driver.levels();
        let mut bank = RelayBank::new(Box::new(driver), &bindings()).unwrap();
        let err = bank.turn_on(&["ac1", "heater"]).unwrap_err();
        assert_eq!(err, ControlError::UnknownDevice("heater".to_string()));
        // ac1 precedes the unknown name but must not have been driven.
        assert_eq!(levels.get(4), Some(Level::High));
    }

    #[test]
    fn test_drop_releases_lines() {
        let driver = MemoryLineDriver::new();
        let levels = driver.levels();
        let bank = RelayBank::new(Box::new(driver), &bindings()).unwrap();
        drop(bank);
        assert_eq!(levels.get(4), None);
    }

    #[tokio::test]
    async fn test_timed_on_holds_then_releases() {
        let driver = MemoryLineDriver::new();
        let levels = driver.levels();
        let bank: SharedRelayBank =
            Arc::new(Mutex::new(RelayBank::new(Box::new(driver), &bindings()).unwrap()));

        let handle = tokio::spawn(run_timed_on(
            Arc::clone(&bank),
            "blower",
            Duration::from_millis(80),
        ));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(levels.get(18), Some(Level::Low));

        handle.await.unwrap().unwrap();
        assert_eq!(levels.get(18), Some(Level::High));
    }
}
