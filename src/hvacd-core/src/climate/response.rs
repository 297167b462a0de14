// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use thiserror::Error;

/// Error type returned by control requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// A device name that is not bound to any output line.
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// A field-bus transport failure or device-reported exception.
    #[error("field bus error: {0}")]
    Bus(String),

    /// The hardware interface could not be opened at startup.
    #[error("hardware unavailable: {0}")]
    Startup(String),

    #[error("{0}")]
    Internal(String),
}

pub type ControlResult<T> = Result<T, ControlError>;
