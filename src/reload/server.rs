//! WebSocket listener.
//!
//! Accepts TCP connections on a background thread. Each handshake runs on
//! its own short-lived thread with a timeout, so a peer that connects and
//! never upgrades holds up nobody. Finished sockets go to `WsActor`.

use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use crate::actor::messages::WsMsg;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Accept poll interval while the listener is idle
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// How long a peer may stay silent during the upgrade
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// Bind `interface:base_port` (or the next free port) and start accepting.
///
/// Returns the bound address. The acceptor exits on shutdown or when the
/// actor is gone.
pub fn start_ws_server(
    interface: IpAddr,
    base_port: u16,
    ws_tx: mpsc::Sender<WsMsg>,
) -> Result<SocketAddr> {
    let listener = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    let addr = listener.local_addr()?;
    listener.set_nonblocking(true)?;

    std::thread::Builder::new()
        .name("livepatch-ws-accept".into())
        .spawn(move || accept_loop(listener, ws_tx))
        .context("failed to spawn WebSocket acceptor")?;

    Ok(addr)
}

fn accept_loop(listener: TcpListener, ws_tx: mpsc::Sender<WsMsg>) {
    while !crate::core::is_shutdown() && !ws_tx.is_closed() {
        match listener.accept() {
            Ok((stream, addr)) => {
                crate::debug!("ws"; "connection from {}", addr);
                let ws_tx = ws_tx.clone();
                let spawned = std::thread::Builder::new()
                    .name("livepatch-ws-handshake".into())
                    .spawn(move || match handshake(stream, HANDSHAKE_TIMEOUT) {
                        Ok(ws) => {
                            let _ = ws_tx.blocking_send(WsMsg::AddClient(ws));
                        }
                        Err(e) => crate::debug!("ws"; "{}: {:#}", addr, e),
                    });
                if let Err(e) = spawned {
                    crate::log!("ws"; "failed to spawn handshake thread: {}", e);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                crate::log!("ws"; "accept error: {}", e);
                std::thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

/// Complete the WebSocket upgrade on `stream`.
///
/// Fails if the peer stays silent for `timeout`. The returned socket is
/// non-blocking, ready for the actor's poll loops.
pub fn handshake(stream: TcpStream, timeout: Duration) -> Result<WebSocket<TcpStream>> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let ws = tungstenite::accept(stream)
        .map_err(|e| anyhow::anyhow!("handshake failed: {e}"))?;

    let socket = ws.get_ref();
    socket.set_read_timeout(None)?;
    socket.set_write_timeout(None)?;
    socket.set_nonblocking(true)?;
    Ok(ws)
}

/// Try binding to port, retry with incremented port if in use
pub fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<TcpListener> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => return Ok(listener),
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind {}:{} after {} attempts: {}",
        interface,
        base_port,
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
