use tungstenite::protocol::Message;

use crate::reload::message::HotReloadMessage;

use super::WsActor;

impl WsActor {
    /// Broadcast a message to all connected clients
    ///
    /// Sockets are non-blocking: a full send buffer (`WouldBlock`) keeps the
    /// frame queued in tungstenite and the client stays. Any other failure
    /// drops that client only.
    pub(super) fn broadcast(&self, message: &HotReloadMessage) {
        let msg = Message::Text(message.to_json().into());
        let mut clients = self.clients.lock();
        let count = clients.len();

        if count == 0 {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        clients.retain_mut(|client| match client.ws.send(msg.clone()) {
            Ok(()) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                crate::debug!("ws"; "client slow, frame queued");
                true
            }
            Err(e) => {
                crate::debug!("ws"; "client dropped: {}", e);
                false
            }
        });
        crate::debug!("ws"; "broadcast {} to {} clients", message.label(), count);
    }
}
