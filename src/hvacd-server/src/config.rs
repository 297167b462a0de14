// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for hvacd-server.
//!
//! Config is loaded from `hvacd.toml`. Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./hvacd.toml`
//! 3. `~/.config/hvacd/hvacd.toml`
//! 4. `/etc/hvacd/hvacd.toml`

use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),
}

/// Top-level server configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Field-bus sensor configuration
    pub bus: BusConfig,
    /// Relay bank configuration
    pub relays: RelaysConfig,
    /// Remote control node configuration
    pub nodes: NodesConfig,
    /// TCP listener configuration
    pub listen: ListenConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

/// Field-bus sensor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Bus driver: "modbus" or "memory"
    pub driver: String,
    /// Serial port path
    pub port: String,
    /// Baud rate
    pub baud: u32,
    /// Slave address of the local-zone sensor
    pub local_slave: u8,
    /// Slave address of the outside-reference sensor
    pub outside_slave: u8,
    /// Seconds between poll cycles
    pub poll_interval_secs: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            driver: "modbus".to_string(),
            port: "/dev/ttyUSB0".to_string(),
            baud: 9600,
            local_slave: 1,
            outside_slave: 4,
            poll_interval_secs: 10,
        }
    }
}

/// Relay bank configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaysConfig {
    /// Line driver: "gpio" or "memory"
    pub driver: String,
    /// Logical device name to BCM line number bindings
    pub lines: BTreeMap<String, u8>,
    /// Timed blower run duration in seconds
    pub blower_secs: u64,
    /// Timed exhaust run duration in seconds
    pub exhaust_secs: u64,
}

impl Default for RelaysConfig {
    fn default() -> Self {
        Self {
            driver: "gpio".to_string(),
            lines: BTreeMap::from([
                ("ac1".to_string(), 4),
                ("ac2".to_string(), 17),
                ("blower".to_string(), 18),
                ("e_fan".to_string(), 22),
                ("exhaust".to_string(), 27),
            ]),
            blower_secs: 300,
            exhaust_secs: 180,
        }
    }
}

/// Remote control node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodesConfig {
    /// Hostnames or addresses of the remote control nodes
    pub hosts: Vec<String>,
    /// TCP port the nodes listen on
    pub port: u16,
    /// Gap between the two state sends after start, in seconds
    pub start_resend_gap_secs: u64,
    /// Gap between the two state sends after stop, in seconds
    pub stop_resend_gap_secs: u64,
    /// Connect timeout per node, in seconds
    pub connect_timeout_secs: u64,
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["192.168.4.21".to_string(), "192.168.4.22".to_string()],
            port: 8888,
            start_resend_gap_secs: 3,
            stop_resend_gap_secs: 8,
            connect_timeout_secs: 5,
        }
    }
}

/// TCP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Whether the listener is enabled
    pub enabled: bool,
    /// IP address to listen on
    pub listen: IpAddr,
    /// TCP port to listen on
    pub port: u16,
    /// Authentication configuration
    pub auth: AuthConfig,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            port: 4560,
            auth: AuthConfig::default(),
        }
    }
}

/// Authentication configuration for the TCP listener.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Valid authentication tokens (empty = no auth required)
    pub tokens: Vec<String>,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        match self.bus.driver.as_str() {
            "modbus" => {
                if self.bus.port.trim().is_empty() {
                    return Err("[bus].port must be set for the modbus driver".to_string());
                }
                if self.bus.baud == 0 {
                    return Err("[bus].baud must be > 0".to_string());
                }
            }
            "memory" => {}
            other => {
                return Err(format!(
                    "[bus].driver '{}' is invalid (expected 'modbus' or 'memory')",
                    other
                ))
            }
        }
        if self.bus.poll_interval_secs == 0 {
            return Err("[bus].poll_interval_secs must be > 0".to_string());
        }
        if self.bus.local_slave == self.bus.outside_slave {
            return Err("[bus].local_slave and [bus].outside_slave must differ".to_string());
        }

        match self.relays.driver.as_str() {
            "gpio" | "memory" => {}
            other => {
                return Err(format!(
                    "[relays].driver '{}' is invalid (expected 'gpio' or 'memory')",
                    other
                ))
            }
        }
        if self.relays.lines.is_empty() {
            return Err("[relays].lines must bind at least one device".to_string());
        }
        let mut seen_lines: HashSet<u8> = HashSet::new();
        for (name, line) in &self.relays.lines {
            if name.trim().is_empty() {
                return Err("[relays].lines must not contain empty device names".to_string());
            }
            if !seen_lines.insert(*line) {
                return Err(format!("[relays].lines binds line {} more than once", line));
            }
        }
        if self.relays.blower_secs == 0 {
            return Err("[relays].blower_secs must be > 0".to_string());
        }
        if self.relays.exhaust_secs == 0 {
            return Err("[relays].exhaust_secs must be > 0".to_string());
        }

        if self.nodes.hosts.iter().any(|h| h.trim().is_empty()) {
            return Err("[nodes].hosts must not contain empty entries".to_string());
        }
        if !self.nodes.hosts.is_empty() && self.nodes.port == 0 {
            return Err("[nodes].port must be > 0 when hosts are configured".to_string());
        }
        if self.nodes.connect_timeout_secs == 0 {
            return Err("[nodes].connect_timeout_secs must be > 0".to_string());
        }

        if self.listen.enabled && self.listen.port == 0 {
            return Err("[listen].port must be > 0 when listener is enabled".to_string());
        }
        if self.listen.auth.tokens.iter().any(|t| t.trim().is_empty()) {
            return Err("[listen.auth].tokens must not contain empty tokens".to_string());
        }

        Ok(())
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Search default paths and load the first `hvacd.toml` found.
    /// Returns default config when no config file exists.
    pub fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in config_search_paths() {
            if path.exists() {
                return Ok((Self::load_from_file(&path)?, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }

    /// Generate an example configuration file.
    pub fn example_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("hvacd.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("hvacd").join("hvacd.toml"));
    }
    paths.push(PathBuf::from("/etc/hvacd/hvacd.toml"));
    paths
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}
