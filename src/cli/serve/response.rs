//! HTTP response handlers for the script server.

use anyhow::Result;
use tiny_http::{Header, Method, Request, Response, StatusCode};

const JAVASCRIPT: &str = "application/javascript; charset=utf-8";
const PLAIN: &str = "text/plain; charset=utf-8";

/// Respond with the rendered browser agent.
pub fn respond_livepatch_js(request: Request, ws_port: u16) -> Result<()> {
    use crate::config::cfg;
    use crate::embed::serve::{LIVEPATCH_JS, LivepatchVars};

    if is_head_request(&request) {
        return send_head(request, 200, JAVASCRIPT);
    }

    let vars = LivepatchVars::from_config(&cfg(), ws_port);
    let body = LIVEPATCH_JS.render(&vars);
    send_body(request, 200, JAVASCRIPT, body.into_bytes())
}

/// Anything but the agent.
pub fn respond_not_found(request: Request) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 404, PLAIN);
    }
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 during shutdown.
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"Server is shutting down".to_vec())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = Response::empty(StatusCode(status))
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", "no-store"));
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", "no-store"))
        .with_header(make_header("Access-Control-Allow-Origin", "*"));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).expect("static header is valid")
}
