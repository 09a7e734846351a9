//! `livepatch notify`: tell a running server the app server restarted.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use anyhow::{Context, Result};
use tungstenite::Message;

use crate::config::LivepatchConfig;
use crate::reload::message::HotReloadMessage;

/// `ws://` URL of the server: `host` if given, else the configured
/// interface (a wildcard interface is reached over loopback).
pub fn server_url(config: &LivepatchConfig, host: Option<&str>) -> String {
    let port = config.serve.port;
    match host {
        Some(host) => format!("ws://{host}:{port}"),
        None => {
            let ip = match config.serve.interface {
                IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
                ip => ip,
            };
            format!("ws://{}", SocketAddr::new(ip, port))
        }
    }
}

/// Send `server-reloaded` and close.
pub fn send_server_reloaded(config: &LivepatchConfig, host: Option<&str>) -> Result<()> {
    let url = server_url(config, host);
    let (mut socket, _) =
        tungstenite::connect(url.as_str()).with_context(|| format!("cannot reach {url}"))?;

    socket
        .send(Message::Text(HotReloadMessage::ServerReloaded.to_json().into()))
        .context("failed to send server-reloaded")?;
    let _ = socket.close(None);
    let _ = socket.flush();

    crate::log!("client"; "sent server-reloaded to {}", url);
    Ok(())
}
