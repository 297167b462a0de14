// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod client;
pub mod climate;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use client::{ClientCommand, ClientEnvelope, ClientResponse};
pub use climate::command::ControlCommand;
pub use climate::reading::SensorReading;
pub use climate::request::ControlRequest;
pub use climate::response::{ControlError, ControlResult};
pub use climate::state::{AdjustDirection, ControlState};
