// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::climate::message::StateMessage;
use crate::climate::reading::SensorReading;

/// Lowest accepted target temperature in °C.
pub const TEMP_MIN: i32 = 19;
/// Highest accepted target temperature in °C.
pub const TEMP_MAX: i32 = 25;
/// Target temperature assumed at process start.
pub const TEMP_DEFAULT: i32 = 24;

/// Direction of a target-temperature adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustDirection {
    Up,
    Down,
}

/// Climate control state owned by the control task.
///
/// Mutated only inside the control task; everyone else observes it through
/// the state watch channel or a snapshot in a command response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlState {
    /// 1 while a poll session is running, 0 otherwise.
    pub power_status: u8,
    /// Desired temperature in °C, kept within [`TEMP_MIN`, `TEMP_MAX`].
    pub target_temperature: i32,
    /// Identifier of the active poll session, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    /// Most recent reading from the local-zone sensor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<SensorReading>,
    /// Most recent reading from the outside-reference sensor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outside: Option<SensorReading>,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            power_status: 0,
            target_temperature: TEMP_DEFAULT,
            session_id: None,
            local: None,
            outside: None,
        }
    }
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjust the target temperature one degree in `direction`, clamped to
    /// [`TEMP_MIN`, `TEMP_MAX`]. At a bound the call is a no-op rather than
    /// an error. Returns the resulting target.
    pub fn adjust(&mut self, direction: AdjustDirection) -> i32 {
        match direction {
            AdjustDirection::Up => {
                if self.target_temperature < TEMP_MAX {
                    self.target_temperature += 1;
                }
            }
            AdjustDirection::Down => {
                if self.target_temperature > TEMP_MIN {
                    self.target_temperature -= 1;
                }
            }
        }
        self.target_temperature
    }

    /// The wire message remote nodes expect for the current state.
    pub fn message(&self) -> StateMessage {
        StateMessage {
            temperature: self.target_temperature,
            power_status: self.power_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = ControlState::new();
        assert_eq!(state.power_status, 0);
        assert_eq!(state.target_temperature, TEMP_DEFAULT);
        assert!(state.session_id.is_none());
    }

    #[test]
    fn test_adjust_within_range() {
        let mut state = ControlState::new();
        assert_eq!(state.adjust(AdjustDirection::Down), 23);
        assert_eq!(state.adjust(AdjustDirection::Up), 24);
        assert_eq!(state.adjust(AdjustDirection::Up), 25);
    }

    #[test]
    fn test_adjust_is_noop_at_upper_bound() {
        let mut state = ControlState::new();
        state.target_temperature = TEMP_MAX;
        assert_eq!(state.adjust(AdjustDirection::Up), TEMP_MAX);
    }

    #[test]
    fn test_adjust_is_noop_at_lower_bound() {
        let mut state = ControlState::new();
        state.target_temperature = TEMP_MIN;
        assert_eq!(state.adjust(AdjustDirection::Down), TEMP_MIN);
    }

    #[test]
    fn test_message_reflects_state() {
        let mut state = ControlState::new();
        state.power_status = 1;
        state.target_temperature = 21;
        assert_eq!(state.message().to_string(), "temperature:21,power_status:1");
    }
}
