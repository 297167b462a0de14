// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Raspberry Pi GPIO line driver.

use std::collections::HashMap;

use rppal::gpio::{Gpio, OutputPin};
use tracing::info;

use hvacd_core::DynResult;

use crate::{Level, LineDriver};

/// Output lines driven through the Pi's GPIO controller.
///
/// `open` fails when no GPIO chip is present, which the daemon treats as an
/// unrecoverable startup error.
pub struct GpioLineDriver {
    gpio: Gpio,
    pins: HashMap<u8, OutputPin>,
}

impl GpioLineDriver {
    pub fn open() -> DynResult<Self> {
        let gpio = Gpio::new()?;
        info!("GPIO controller opened");
        Ok(Self {
            gpio,
            pins: HashMap::new(),
        })
    }
}

impl LineDriver for GpioLineDriver {
    fn claim(&mut self, line: u8) -> DynResult<()> {
        let pin = self.gpio.get(line)?.into_output();
        self.pins.insert(line, pin);
        Ok(())
    }

    fn drive(&mut self, line: u8, level: Level) -> DynResult<()> {
        let pin = self
            .pins
            .get_mut(&line)
            .ok_or_else(|| format!("line {} not claimed", line))?;
        match level {
            Level::Low => pin.set_low(),
            Level::High => pin.set_high(),
        }
        Ok(())
    }

    fn release_all(&mut self) {
        // OutputPin resets to input on drop, releasing the line.
        self.pins.clear();
    }
}
