// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The plaintext state message understood by the remote node firmware.
//!
//! A single ASCII line of the exact form `temperature:<int>,power_status:<0|1>`
//! with no framing, no checksum and no acknowledgment. The remote firmware
//! parses this shape byte for byte, so it must never change.

use std::fmt;

/// State message pushed to remote control nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateMessage {
    pub temperature: i32,
    pub power_status: u8,
}

impl fmt::Display for StateMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "temperature:{},power_status:{}",
            self.temperature, self.power_status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_is_exact() {
        let msg = StateMessage {
            temperature: 24,
            power_status: 1,
        };
        assert_eq!(msg.to_string(), "temperature:24,power_status:1");
    }

    #[test]
    fn test_format_power_off() {
        let msg = StateMessage {
            temperature: 19,
            power_status: 0,
        };
        assert_eq!(msg.to_string(), "temperature:19,power_status:0");
    }
}
