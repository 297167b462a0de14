// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Wire protocol spoken by the command boundary.
//!
//! The web layer (and any other client) sends line-delimited JSON envelopes
//! over TCP and receives one JSON response line per command.

use serde::{Deserialize, Serialize};

use crate::climate::command::ControlCommand;
use crate::climate::state::{AdjustDirection, ControlState};

/// Command received from network clients (JSON).
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ClientCommand {
    GetState,
    Start,
    Stop,
    AdjustTemperature { direction: AdjustDirection },
    AcOn,
    AcOff,
    EFansOn,
    EFansOff,
    BlowerOn,
    BlowerOff,
    ExhaustOn,
    ExhaustOff,
}

/// Envelope for client commands with optional authentication token.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClientEnvelope {
    pub token: Option<String>,
    #[serde(flatten)]
    pub cmd: ClientCommand,
}

/// Response sent to network clients over TCP.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClientResponse {
    pub success: bool,
    pub state: Option<ControlState>,
    pub error: Option<String>,
}

/// Parse a JSON string into a ClientEnvelope.
///
/// First tries to parse as a full ClientEnvelope. If that fails, tries to
/// parse as a bare ClientCommand and wraps it with token: None.
pub fn parse_envelope(input: &str) -> Result<ClientEnvelope, serde_json::Error> {
    match serde_json::from_str::<ClientEnvelope>(input) {
        Ok(envelope) => Ok(envelope),
        Err(_) => {
            let cmd = serde_json::from_str::<ClientCommand>(input)?;
            Ok(ClientEnvelope { token: None, cmd })
        }
    }
}

/// Map a client command onto the control task's command set.
pub fn client_command_to_control(cmd: ClientCommand) -> ControlCommand {
    match cmd {
        ClientCommand::GetState => ControlCommand::GetSnapshot,
        ClientCommand::Start => ControlCommand::Start,
        ClientCommand::Stop => ControlCommand::Stop,
        ClientCommand::AdjustTemperature { direction } => {
            ControlCommand::AdjustTemperature(direction)
        }
        ClientCommand::AcOn => ControlCommand::AcOn,
        ClientCommand::AcOff => ControlCommand::AcOff,
        ClientCommand::EFansOn => ControlCommand::EFansOn,
        ClientCommand::EFansOff => ControlCommand::EFansOff,
        ClientCommand::BlowerOn => ControlCommand::BlowerOn,
        ClientCommand::BlowerOff => ControlCommand::BlowerOff,
        ClientCommand::ExhaustOn => ControlCommand::ExhaustOn,
        ClientCommand::ExhaustOff => ControlCommand::ExhaustOff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_command() {
        let envelope = parse_envelope(r#"{"cmd": "start"}"#).unwrap();
        assert!(envelope.token.is_none());
        assert!(matches!(envelope.cmd, ClientCommand::Start));
    }

    #[test]
    fn test_parse_envelope_with_token() {
        let envelope =
            parse_envelope(r#"{"token": "secret123", "cmd": "get_state"}"#).unwrap();
        assert_eq!(envelope.token.as_deref(), Some("secret123"));
        assert!(matches!(envelope.cmd, ClientCommand::GetState));
    }

    #[test]
    fn test_parse_adjust_with_direction() {
        let envelope =
            parse_envelope(r#"{"cmd": "adjust_temperature", "direction": "down"}"#).unwrap();
        match envelope.cmd {
            ClientCommand::AdjustTemperature { direction } => {
                assert_eq!(direction, AdjustDirection::Down);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_envelope("not json").is_err());
        assert!(parse_envelope(r#"{"cmd": "warp_drive_on"}"#).is_err());
    }

    #[test]
    fn test_mapping_covers_relay_commands() {
        assert_eq!(
            client_command_to_control(ClientCommand::BlowerOn),
            ControlCommand::BlowerOn
        );
        assert_eq!(
            client_command_to_control(ClientCommand::AcOff),
            ControlCommand::AcOff
        );
        assert_eq!(
            client_command_to_control(ClientCommand::AdjustTemperature {
                direction: AdjustDirection::Up
            }),
            ControlCommand::AdjustTemperature(AdjustDirection::Up)
        );
    }

    #[test]
    fn test_response_serializes_without_state() {
        let resp = ClientResponse {
            success: false,
            state: None,
            error: Some("unknown device: heater".to_string()),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("unknown device"));
    }
}
