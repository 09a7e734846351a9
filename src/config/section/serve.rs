//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 35729                # WebSocket port
//! script_port = 35730         # HTTP port serving /livepatch.js
//! ```
//!
//! Use `interface = "0.0.0.0"` to reach the server from other devices on the LAN.
//! Taken ports are retried upward.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Default WebSocket port (the classic livereload port)
pub const DEFAULT_WS_PORT: u16 = 35729;

/// Notification server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// WebSocket port number.
    pub port: u16,

    /// HTTP port for the client script.
    pub script_port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: DEFAULT_WS_PORT,
            script_port: DEFAULT_WS_PORT + 1,
        }
    }
}
