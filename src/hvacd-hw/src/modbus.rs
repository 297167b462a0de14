// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Modbus RTU sensor bus over the serial port.

use tokio_modbus::client::rtu;
use tokio_modbus::prelude::*;
use tokio_serial::SerialStream;
use tracing::info;

use hvacd_core::DynResult;

use crate::{BusReadFuture, SensorBus};

/// One RTU context shared across all slaves on the bus.
///
/// Opened once per poll session and reused for every read in that session.
/// Read failures leave the handle alone; the next session opens a fresh one.
pub struct ModbusSensorBus {
    ctx: client::Context,
}

impl ModbusSensorBus {
    pub fn open(path: &str, baud: u32) -> DynResult<Self> {
        let builder = tokio_serial::new(path, baud);
        let port = SerialStream::open(&builder)?;
        info!("Field bus open: {} @ {} baud", path, baud);
        Ok(Self {
            ctx: rtu::attach(port),
        })
    }
}

impl SensorBus for ModbusSensorBus {
    fn read_registers(&mut self, slave: u8, addr: u16, count: u16) -> BusReadFuture<'_> {
        Box::pin(async move {
            self.ctx.set_slave(Slave(slave));
            let registers = self
                .ctx
                .read_holding_registers(addr, count)
                .await
                .map_err(|e| format!("slave {}: {}", slave, e))?
                .map_err(|e| format!("slave {} reported exception: {}", slave, e))?;
            Ok(registers)
        })
    }
}
