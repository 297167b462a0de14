// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use tokio::sync::oneshot;

use crate::climate::command::ControlCommand;
use crate::climate::response::ControlResult;
use crate::climate::state::ControlState;

/// Request sent to the control task.
#[derive(Debug)]
pub struct ControlRequest {
    pub cmd: ControlCommand,
    pub respond_to: oneshot::Sender<ControlResult<ControlState>>,
}
