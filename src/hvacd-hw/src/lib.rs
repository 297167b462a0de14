// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Hardware access layer: relay output lines and the field-bus.
//!
//! Both surfaces are traits so the daemon and its tests run against the
//! in-memory backends while production uses GPIO and Modbus RTU.

use std::future::Future;
use std::pin::Pin;

use hvacd_core::DynResult;

mod bank;
mod dummy;
#[cfg(feature = "rpi")]
mod gpio;
mod modbus;

pub use bank::{run_timed_on, RelayBank, SharedRelayBank};
pub use dummy::{MemoryLevels, MemoryLineDriver, MemorySensorBus};
#[cfg(feature = "rpi")]
pub use gpio::GpioLineDriver;
pub use modbus::ModbusSensorBus;

/// Logic level on a physical output line.
///
/// The relay boards are active-low: `Low` energizes a relay, `High` drops it
/// out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Access to physical output lines.
pub trait LineDriver: Send {
    /// Claim `line` as an output. Called once per line at configure time.
    fn claim(&mut self, line: u8) -> DynResult<()>;

    /// Drive a claimed line to `level`.
    fn drive(&mut self, line: u8, level: Level) -> DynResult<()>;

    /// Release every claimed line.
    fn release_all(&mut self);
}

pub type BusReadFuture<'a> = Pin<Box<dyn Future<Output = DynResult<Vec<u16>>> + Send + 'a>>;

/// A connection to the serial field-bus.
pub trait SensorBus: Send {
    /// Read `count` holding registers starting at `addr` from `slave`.
    fn read_registers(&mut self, slave: u8, addr: u16, count: u16) -> BusReadFuture<'_>;
}

/// Connection details for the field-bus.
#[derive(Debug, Clone)]
pub enum BusAccess {
    Modbus { path: String, baud: u32 },
    Memory,
}

/// Open a sensor bus for the selected access method.
pub fn open_sensor_bus(access: &BusAccess) -> DynResult<Box<dyn SensorBus>> {
    match access {
        BusAccess::Modbus { path, baud } => Ok(Box::new(ModbusSensorBus::open(path, *baud)?)),
        BusAccess::Memory => Ok(Box::new(MemorySensorBus::new())),
    }
}

/// Instantiate a line driver by its configured name.
pub fn build_line_driver(name: &str) -> DynResult<Box<dyn LineDriver>> {
    match name {
        "memory" => Ok(Box::new(MemoryLineDriver::new())),
        #[cfg(feature = "rpi")]
        "gpio" => Ok(Box::new(GpioLineDriver::open()?)),
        other => Err(format!("unknown line driver: {}", other).into()),
    }
}
