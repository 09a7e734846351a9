//! Server lifecycle management.

use crate::{actor::Coordinator, config::LivepatchConfig, log};
use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use std::{
    net::SocketAddr,
    sync::Arc,
    thread::{self, JoinHandle},
};
use tiny_http::Server;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(
    interface: std::net::IpAddr,
    base_port: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Spawn the actor system on its own runtime thread.
///
/// If the actors cannot start, `server` is unblocked so serve exits too.
pub fn spawn_actors(
    config: Arc<LivepatchConfig>,
    shutdown_rx: Receiver<()>,
    server: Arc<Server>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("livepatch-actors".into())
        .spawn(move || {
            if !run_actor_system(config, shutdown_rx) {
                server.unblock();
            }
        })
        .context("failed to spawn actor thread")
}

/// `false` if the system failed to start.
fn run_actor_system(config: Arc<LivepatchConfig>, shutdown_rx: Receiver<()>) -> bool {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log!("error"; "failed to create tokio runtime: {}", e);
            return false;
        }
    };

    rt.block_on(async {
        let coordinator = Coordinator::with_config(config).with_shutdown_signal(shutdown_rx);
        match coordinator.run().await {
            Ok(()) => true,
            Err(e) => {
                log!("error"; "{:#}", e);
                false
            }
        }
    })
}

/// Wait for actor system to shutdown gracefully (max 2 seconds).
pub fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(std::time::Duration::from_millis(50));
    }
}
