//! Actor Message Definitions
//!
//! Message types for inter-actor communication.
//!
//! ```text
//! FsActor --Batch--> RelayActor --Broadcast--> WsActor
//! ```

use std::net::TcpStream;

use tungstenite::WebSocket;

use crate::reload::classify::RawEvent;
use crate::reload::message::HotReloadMessage;

// =============================================================================
// RelayActor Messages
// =============================================================================

/// Messages to Relay Actor
#[derive(Debug)]
pub enum RelayMsg {
    /// One debounced batch. Empty when a watch root was re-attached and the
    /// tree must be rescanned without any event to go on.
    Batch(Vec<RawEvent>),
    /// Shutdown
    Shutdown,
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to WebSocket Actor
#[derive(Debug)]
pub enum WsMsg {
    /// Send to every connected client, in order
    Broadcast(Vec<HotReloadMessage>),
    /// Backend restarted (inbound `server-reloaded`), reload everyone
    Reload { reason: String },
    /// Add a client; the handshake is already done and the socket is
    /// non-blocking
    AddClient(WebSocket<TcpStream>),
    /// Shutdown
    Shutdown,
}
