// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use crate::climate::state::AdjustDirection;

/// Command handled by the control task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Return the current control state without side effects.
    GetSnapshot,
    /// Begin a poll session and push the on-state to all actuators.
    Start,
    /// Cancel the poll session and push the off-state.
    Stop,
    /// Move the target temperature one degree, clamped to the valid range.
    AdjustTemperature(AdjustDirection),
    AcOn,
    AcOff,
    EFansOn,
    EFansOff,
    /// Timed blower run; the relay drops out again after the configured duration.
    BlowerOn,
    BlowerOff,
    /// Timed exhaust run.
    ExhaustOn,
    ExhaustOff,
}
