use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use crate::actor::messages::WsMsg;
use crate::reload::message::HotReloadMessage;

use super::{RegisteredClient, WsActor};

/// Poll interval of the reader thread
const READ_POLL_MS: u64 = 100;

impl WsActor {
    /// Register a client whose handshake already completed.
    pub(super) fn add_client(&self, ws: WebSocket<TcpStream>) {
        let mut clients = self.clients.lock();
        clients.push(RegisteredClient { ws });
        crate::debug!("ws"; "client connected (total: {})", clients.len());
    }

    /// Background thread to read client messages (non-blocking poll)
    ///
    /// Only `server-reloaded` is acted on; anything else a client sends is
    /// dropped. The lock is released before signalling the actor, which
    /// needs it to broadcast.
    pub(super) fn client_reader_loop(
        clients: Arc<Mutex<Vec<RegisteredClient>>>,
        tx: mpsc::Sender<WsMsg>,
    ) {
        while !crate::core::is_shutdown() {
            std::thread::sleep(Duration::from_millis(READ_POLL_MS));

            let mut reload_requested = false;
            {
                let mut clients_guard = clients.lock();
                clients_guard.retain_mut(|client| {
                    let (keep, reload) = poll_client(client);
                    reload_requested |= reload;
                    keep
                });
            }

            if reload_requested
                && tx
                    .blocking_send(WsMsg::Reload {
                        reason: "server reloaded".to_string(),
                    })
                    .is_err()
            {
                break;
            }
        }
    }
}

/// Drain everything readable from one client.
///
/// Returns `(keep, reload_requested)`.
fn poll_client(client: &mut RegisteredClient) -> (bool, bool) {
    let mut reload = false;
    loop {
        match client.ws.read() {
            Ok(Message::Text(text)) => {
                match HotReloadMessage::from_json(text.as_str()) {
                    Some(HotReloadMessage::ServerReloaded) => {
                        crate::debug!("ws"; "server-reloaded received");
                        reload = true;
                    }
                    _ => crate::debug!("ws"; "ignoring client message: {}", text.as_str()),
                }
            }
            Ok(Message::Close(_)) => {
                crate::debug!("ws"; "client closed");
                return (false, reload);
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                return (true, reload);
            }
            Err(e) => {
                crate::debug!("ws"; "client disconnected: {}", e);
                return (false, reload);
            }
        }
    }
}
