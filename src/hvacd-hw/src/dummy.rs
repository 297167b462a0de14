// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! In-memory hardware backends for development and testing.
//!
//! Hold line levels and register values in memory and respond to all calls
//! immediately. No GPIO chip or serial port required.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use hvacd_core::DynResult;

use crate::{BusReadFuture, Level, LineDriver, SensorBus};

/// Registers served for slaves nobody scripted: status 0, 22.5 °C.
const DEFAULT_REGISTERS: [u16; 2] = [0, 225];

/// Line driver that records levels instead of touching hardware.
pub struct MemoryLineDriver {
    levels: Arc<Mutex<HashMap<u8, Level>>>,
    claimed: HashSet<u8>,
}

/// Inspection handle onto a [`MemoryLineDriver`]'s recorded levels.
///
/// Stays valid after the driver moves into a relay bank, which is how tests
/// observe line states from the outside.
#[derive(Clone)]
pub struct MemoryLevels(Arc<Mutex<HashMap<u8, Level>>>);

impl MemoryLevels {
    /// Level last driven on `line`, or None if the line is unclaimed.
    pub fn get(&self, line: u8) -> Option<Level> {
        self.0.lock().ok()?.get(&line).copied()
    }
}

impl MemoryLineDriver {
    pub fn new() -> Self {
        Self {
            levels: Arc::new(Mutex::new(HashMap::new())),
            claimed: HashSet::new(),
        }
    }

    pub fn levels(&self) -> MemoryLevels {
        MemoryLevels(Arc::clone(&self.levels))
    }
}

impl Default for MemoryLineDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDriver for MemoryLineDriver {
    fn claim(&mut self, line: u8) -> DynResult<()> {
        self.claimed.insert(line);
        Ok(())
    }

    fn drive(&mut self, line: u8, level: Level) -> DynResult<()> {
        if !self.claimed.contains(&line) {
            return Err(format!("line {} not claimed", line).into());
        }
        if let Ok(mut levels) = self.levels.lock() {
            levels.insert(line, level);
        }
        Ok(())
    }

    fn release_all(&mut self) {
        self.claimed.clear();
        if let Ok(mut levels) = self.levels.lock() {
            levels.clear();
        }
    }
}

/// Sensor bus serving scripted register values, with injectable failures.
pub struct MemorySensorBus {
    registers: HashMap<u8, Vec<u16>>,
    failing: HashSet<u8>,
}

impl MemorySensorBus {
    pub fn new() -> Self {
        Self {
            registers: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    /// Script the registers returned for `slave`.
    pub fn set_registers(&mut self, slave: u8, registers: Vec<u16>) {
        self.registers.insert(slave, registers);
    }

    /// Make every read of `slave` fail with a bus error.
    pub fn fail_slave(&mut self, slave: u8) {
        self.failing.insert(slave);
    }
}

impl Default for MemorySensorBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorBus for MemorySensorBus {
    fn read_registers(&mut self, slave: u8, _addr: u16, count: u16) -> BusReadFuture<'_> {
        let result = if self.failing.contains(&slave) {
            Err(format!("slave {}: injected bus failure", slave).into())
        } else {
            let mut registers = self
                .registers
                .get(&slave)
                .cloned()
                .unwrap_or_else(|| DEFAULT_REGISTERS.to_vec());
            registers.truncate(count as usize);
            Ok(registers)
        };
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_bus_serves_scripted_registers() {
        let mut bus = MemorySensorBus::new();
        bus.set_registers(1, vec![0, 245]);
        let registers = bus.read_registers(1, 0, 2).await.unwrap();
        assert_eq!(registers, vec![0, 245]);
    }

    #[tokio::test]
    async fn test_memory_bus_defaults_unscripted_slaves() {
        let mut bus = MemorySensorBus::new();
        let registers = bus.read_registers(9, 0, 2).await.unwrap();
        assert_eq!(registers, DEFAULT_REGISTERS.to_vec());
    }

    #[tokio::test]
    async fn test_memory_bus_injected_failure() {
        let mut bus = MemorySensorBus::new();
        bus.fail_slave(4);
        assert!(bus.read_registers(4, 0, 2).await.is_err());
    }

    #[test]
    fn test_memory_driver_rejects_unclaimed_line() {
        let mut driver = MemoryLineDriver::new();
        assert!(driver.drive(4, Level::Low).is_err());
        driver.claim(4).unwrap();
        assert!(driver.drive(4, Level::Low).is_ok());
    }
}
