// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::{Deserialize, Serialize};

use crate::climate::response::ControlError;

/// One sensor sample taken from a field-bus slave.
///
/// Produced every poll cycle and forwarded to the control task; never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Field-bus slave address the sample came from.
    pub slave: u8,
    /// Device status word (register 0).
    pub status: u16,
    /// Temperature in °C (register 1 carries tenths of a degree).
    pub temperature: f32,
}

impl SensorReading {
    /// Decode a reading from the two holding registers read at address 0.
    pub fn from_registers(slave: u8, registers: &[u16]) -> Result<Self, ControlError> {
        let [status, temp_x10] = registers else {
            return Err(ControlError::Bus(format!(
                "slave {} returned {} registers, expected 2",
                slave,
                registers.len()
            )));
        };
        Ok(Self {
            slave,
            status: *status,
            temperature: f32::from(*temp_x10) / 10.0,
        })
    }
}
