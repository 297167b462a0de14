// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Best-effort state push to the remote control nodes.
//!
//! Each push opens a fresh TCP connection, writes the state message bytes
//! and closes. Nothing is read back; failures are logged and never
//! propagated, because the nodes are best-effort actuators rather than
//! transactional dependents.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use hvacd_core::climate::message::StateMessage;

use crate::config::NodesConfig;

/// Messenger for the fixed set of remote control nodes.
#[derive(Debug, Clone)]
pub struct NodeMessenger {
    hosts: Vec<String>,
    port: u16,
    connect_timeout: Duration,
    start_gap: Duration,
    stop_gap: Duration,
}

impl NodeMessenger {
    pub fn new(cfg: &NodesConfig) -> Self {
        Self {
            hosts: cfg.hosts.clone(),
            port: cfg.port,
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            start_gap: Duration::from_secs(cfg.start_resend_gap_secs),
            stop_gap: Duration::from_secs(cfg.stop_resend_gap_secs),
        }
    }

    /// Push `msg` to every node once.
    pub async fn push(&self, msg: StateMessage) {
        for host in &self.hosts {
            self.send(host, msg).await;
        }
    }

    /// Double-send after `start`: the nodes may still be settling, so the
    /// state goes out again after the configured gap instead of waiting for
    /// an acknowledgment the firmware never sends.
    pub async fn push_on_start(&self, msg: StateMessage) {
        self.push_twice(msg, self.start_gap).await;
    }

    /// Double-send after `stop`, with the longer stop gap.
    pub async fn push_on_stop(&self, msg: StateMessage) {
        self.push_twice(msg, self.stop_gap).await;
    }

    async fn push_twice(&self, msg: StateMessage, gap: Duration) {
        self.push(msg).await;
        tokio::time::sleep(gap).await;
        self.push(msg).await;
    }

    async fn send(&self, host: &str, msg: StateMessage) {
        let addr = format!("{}:{}", host, self.port);
        match timeout(self.connect_timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(mut stream)) => {
                let payload = msg.to_string();
                match stream.write_all(payload.as_bytes()).await {
                    Ok(()) => {
                        debug!("Pushed '{}' to {}", payload, addr);
                        let _ = stream.shutdown().await;
                    }
                    Err(e) => warn!("Node {} write failed: {}", addr, e),
                }
            }
            Ok(Err(e)) => warn!("Node {} unreachable: {}", addr, e),
            Err(_) => warn!("Node {} connect timed out", addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Bind a capture node on an ephemeral port; every accepted connection's
    /// payload lands on the returned channel.
    async fn spawn_capture_node() -> (u16, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let tx = tx.clone();
                tokio::spawn(async move {
                    let mut payload = String::new();
                    if socket.read_to_string(&mut payload).await.is_ok() {
                        let _ = tx.send(payload);
                    }
                });
            }
        });
        (port, rx)
    }

    fn messenger(port: u16) -> NodeMessenger {
        NodeMessenger::new(&NodesConfig {
            hosts: vec!["127.0.0.1".to_string()],
            port,
            start_resend_gap_secs: 0,
            stop_resend_gap_secs: 0,
            connect_timeout_secs: 1,
        })
    }

    async fn recv_payload(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for node payload")
            .expect("capture node closed")
    }

    #[tokio::test]
    async fn test_push_sends_exact_message_bytes() {
        let (port, mut rx) = spawn_capture_node().await;
        let msg = StateMessage {
            temperature: 24,
            power_status: 1,
        };
        messenger(port).push(msg).await;
        assert_eq!(recv_payload(&mut rx).await, "temperature:24,power_status:1");
    }

    #[tokio::test]
    async fn test_start_push_sends_twice() {
        let (port, mut rx) = spawn_capture_node().await;
        let msg = StateMessage {
            temperature: 22,
            power_status: 1,
        };
        messenger(port).push_on_start(msg).await;
        assert_eq!(recv_payload(&mut rx).await, "temperature:22,power_status:1");
        assert_eq!(recv_payload(&mut rx).await, "temperature:22,power_status:1");
    }

    #[tokio::test]
    async fn test_unreachable_node_does_not_error() {
        // Port 9 on localhost is almost certainly closed; the push must
        // swallow the failure.
        let msg = StateMessage {
            temperature: 20,
            power_status: 0,
        };
        messenger(9).push(msg).await;
    }
}
