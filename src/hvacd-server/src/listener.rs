// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! JSON-over-TCP command boundary for hvacd-server.
//!
//! The web layer connects here and speaks the `ClientEnvelope` /
//! `ClientResponse` protocol defined in `hvacd-core::client`, one JSON
//! document per line.

use std::collections::HashSet;
use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info};

use hvacd_core::client::{client_command_to_control, parse_envelope};
use hvacd_core::{ClientResponse, ControlCommand, ControlRequest, ControlState};

/// Run the JSON TCP listener, accepting client connections until shutdown.
pub async fn run_listener(
    addr: SocketAddr,
    control_tx: mpsc::Sender<ControlRequest>,
    auth_tokens: HashSet<String>,
    state_rx: watch::Receiver<ControlState>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer) = accepted?;
                info!("Client connected: {}", peer);

                let tx = control_tx.clone();
                let tokens = auth_tokens.clone();
                let srx = state_rx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(socket, peer, tx, tokens, srx).await {
                        error!("Client {} error: {:?}", peer, e);
                    }
                });
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn validate_token(tokens: &HashSet<String>, token: Option<&str>) -> Result<(), String> {
    if tokens.is_empty() {
        return Ok(());
    }
    match token {
        Some(t) if tokens.contains(t) => Ok(()),
        _ => Err("Invalid or missing token".to_string()),
    }
}

async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    tx: mpsc::Sender<ControlRequest>,
    auth_tokens: HashSet<String>,
    state_rx: watch::Receiver<ControlState>,
) -> std::io::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            info!("Client {} disconnected", addr);
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let envelope = match parse_envelope(trimmed) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!("Invalid JSON from {}: {} / {:?}", addr, trimmed, e);
                write_response(
                    &mut writer,
                    &ClientResponse {
                        success: false,
                        state: None,
                        error: Some(format!("Invalid JSON: {}", e)),
                    },
                )
                .await?;
                continue;
            }
        };

        if let Err(err) = validate_token(&auth_tokens, envelope.token.as_deref()) {
            write_response(
                &mut writer,
                &ClientResponse {
                    success: false,
                    state: None,
                    error: Some(err),
                },
            )
            .await?;
            continue;
        }

        let cmd = client_command_to_control(envelope.cmd);

        // Fast path: serve GetSnapshot directly from the watch channel so
        // clients get an answer without a round-trip to the control task.
        if matches!(cmd, ControlCommand::GetSnapshot) {
            let state = state_rx.borrow().clone();
            write_response(
                &mut writer,
                &ClientResponse {
                    success: true,
                    state: Some(state),
                    error: None,
                },
            )
            .await?;
            continue;
        }

        let (respond_to, resp_rx) = oneshot::channel();
        if tx.send(ControlRequest { cmd, respond_to }).await.is_err() {
            error!("Failed to send request to control task");
            write_response(
                &mut writer,
                &ClientResponse {
                    success: false,
                    state: None,
                    error: Some("Internal error: control task not available".into()),
                },
            )
            .await?;
            continue;
        }

        let response = match resp_rx.await {
            Ok(Ok(state)) => ClientResponse {
                success: true,
                state: Some(state),
                error: None,
            },
            Ok(Err(e)) => ClientResponse {
                success: false,
                state: None,
                error: Some(e.to_string()),
            },
            Err(_) => ClientResponse {
                success: false,
                state: None,
                error: Some("Internal error: control task dropped the request".into()),
            },
        };
        write_response(&mut writer, &response).await?;
    }

    Ok(())
}

async fn write_response(
    writer: &mut (impl AsyncWriteExt + Unpin),
    response: &ClientResponse,
) -> std::io::Result<()> {
    let mut resp_line = serde_json::to_string(response).unwrap_or_else(|_| {
        r#"{"success":false,"state":null,"error":"Internal serialization error"}"#.to_string()
    });
    resp_line.push('\n');
    writer.write_all(resp_line.as_bytes()).await?;
    writer.flush().await
}
