//! WebSocket Actor - Bidirectional Communication
//!
//! This actor is responsible for:
//! - Managing WebSocket client connections
//! - Broadcasting messages to all connected clients
//! - Relaying the inbound `server-reloaded` signal as a reload broadcast
//!
//! # Architecture
//!
//! ```text
//! RelayActor --[Broadcast]--> WsActor --[broadcast]--> Clients
//!                                ^                        |
//!                                +---[server-reloaded]----+
//! ```

mod client_io;
mod delivery;


use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use super::messages::WsMsg;
use crate::reload::message::HotReloadMessage;

/// A connected browser (or `livepatch tail`, or `livepatch notify`)
struct RegisteredClient {
    ws: WebSocket<TcpStream>,
}

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<WsMsg>,
    /// Sender handed to the reader thread for inbound signals
    tx: mpsc::Sender<WsMsg>,
    /// Connected clients (shared for broadcast + read threads)
    clients: Arc<Mutex<Vec<RegisteredClient>>>,
}

impl WsActor {
    /// Create a new WsActor
    pub fn new(rx: mpsc::Receiver<WsMsg>, tx: mpsc::Sender<WsMsg>) -> Self {
        Self {
            rx,
            tx,
            clients: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let clients_for_reader = Arc::clone(&self.clients);
        let tx_for_reader = self.tx.clone();
        std::thread::spawn(move || {
            Self::client_reader_loop(clients_for_reader, tx_for_reader);
        });

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Broadcast(messages) => {
                    for message in &messages {
                        crate::debug!("ws"; "sending {}", message.label());
                        self.broadcast(message);
                    }
                }

                WsMsg::Reload { reason } => {
                    crate::logger::status_reload(&reason);
                    self.broadcast(&HotReloadMessage::Reload);
                }

                WsMsg::AddClient(ws) => {
                    self.add_client(ws);
                }

                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    let mut clients = self.clients.lock();
                    for mut client in clients.drain(..) {
                        let _ = client.ws.close(None);
                        let _ = client.ws.flush();
                    }
                    break;
                }
            }
        }
    }
}
