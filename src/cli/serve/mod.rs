//! Notification server: actors plus the script server for `/livepatch.js`.

mod lifecycle;
mod response;

use crate::{
    config::{DEFAULT_WS_PORT, LivepatchConfig},
    core::register_server,
    debug, log,
};
use anyhow::Result;
use crossbeam::channel;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tiny_http::{Request, Server};

/// Actual WebSocket port (may differ from the configured one if it was in use)
/// Updated by coordinator after WebSocket server binds successfully
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(DEFAULT_WS_PORT);

/// Update the actual WebSocket port (called by coordinator after binding)
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

/// Get the actual WebSocket port
fn get_actual_ws_port() -> u16 {
    ACTUAL_WS_PORT.load(Ordering::Relaxed)
}

/// Run `livepatch serve` until Ctrl+C.
pub fn serve(config: Arc<LivepatchConfig>) -> Result<()> {
    set_actual_ws_port(config.serve.port);

    let (server, addr) =
        lifecycle::bind_with_retry(config.serve.interface, config.serve.script_port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    register_server(Arc::clone(&server), shutdown_tx);

    let script = format!("http://{}{}", addr, crate::embed::serve::LIVEPATCH_JS_PATH);
    log!("serve"; "{}", script);
    log!("serve"; "add <script src=\"{}\"></script> to your pages", script);

    let actor_handle = lifecycle::spawn_actors(config, shutdown_rx, Arc::clone(&server))?;
    run_request_loop(&server);
    lifecycle::wait_for_shutdown(actor_handle);
    Ok(())
}

fn run_request_loop(server: &Server) {
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request) {
            log!("serve"; "request error: {e}");
        }
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let path = request.url().split(['?', '#']).next().unwrap_or_default();
    debug!("serve"; "{} {}", request.method(), path);

    if path == crate::embed::serve::LIVEPATCH_JS_PATH {
        return response::respond_livepatch_js(request, get_actual_ws_port());
    }

    response::respond_not_found(request)
}
