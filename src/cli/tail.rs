//! `livepatch tail`: a headless client.
//!
//! Drives the same [`Agent`] the browser script mirrors, against a page
//! with no assets, and prints every message with the decision taken.

use std::collections::VecDeque;
use std::net::TcpStream;
use std::time::{Duration, Instant};

use anyhow::Result;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::client::backoff::TimerId;
use crate::client::patch::DomAction;
use crate::client::{Agent, ClientEvent, Effect, PageView};
use crate::config::LivepatchConfig;
use crate::reload::message::HotReloadMessage;

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Read timeout, also the shutdown poll interval.
const POLL: Duration = Duration::from_millis(100);

/// Host side of the agent: owns the socket and the one retry timer.
struct Tail {
    url: String,
    agent: Agent,
    page: PageView,
    socket: Option<Socket>,
    retry: Option<(TimerId, Instant)>,
    events: VecDeque<ClientEvent>,
}

pub fn tail(config: &LivepatchConfig, host: Option<&str>) -> Result<()> {
    let mut tail = Tail {
        url: super::notify::server_url(config, host),
        agent: Agent::new(
            config.client.reconnect_policy(),
            config.client.patch_planner(),
        ),
        page: PageView::default(),
        socket: None,
        retry: None,
        events: VecDeque::from([ClientEvent::Start]),
    };

    while !crate::core::is_shutdown() {
        tail.drain();

        if tail.socket.is_some() {
            tail.read();
            continue;
        }

        match tail.retry {
            Some((timer, at)) => {
                let now = Instant::now();
                if now >= at {
                    tail.retry = None;
                    tail.events.push_back(ClientEvent::RetryFired(timer));
                } else {
                    std::thread::sleep((at - now).min(POLL));
                }
            }
            None if tail.events.is_empty() => {
                crate::log!("client"; "giving up after {} retries", tail.agent.retry_count());
                break;
            }
            None => {}
        }
    }

    if let Some(mut socket) = tail.socket.take() {
        let _ = socket.close(None);
        let _ = socket.flush();
    }
    Ok(())
}

impl Tail {
    /// Feed queued events to the agent and carry out its effects.
    fn drain(&mut self) {
        while let Some(event) = self.events.pop_front() {
            let patch_message = matches!(
                event,
                ClientEvent::Message(HotReloadMessage::Css { .. } | HotReloadMessage::Js { .. })
            );
            let effects = self.agent.handle(event, &self.page);
            if patch_message && !touches_page(&effects) {
                crate::log!("client"; "  → nothing on this page to patch");
            }
            for effect in effects {
                self.perform(effect);
            }
        }
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::Connect => match connect(&self.url) {
                Ok(socket) => {
                    crate::log!("client"; "connected to {}", self.url);
                    self.socket = Some(socket);
                    self.events.push_back(ClientEvent::Opened);
                }
                Err(e) => {
                    crate::debug!("client"; "connect failed: {}", e);
                    self.events.push_back(ClientEvent::Error);
                }
            },
            Effect::CloseSocket => {
                if let Some(mut socket) = self.socket.take() {
                    let _ = socket.close(None);
                }
            }
            Effect::ScheduleRetry { timer, delay } => {
                crate::log!("client"; "reconnecting in {:?}", delay);
                self.retry = Some((timer, Instant::now() + delay));
            }
            Effect::CancelRetry(_) => self.retry = None,
            Effect::Reload => crate::log!("client"; "  → reload page"),
            Effect::Patch(actions) => {
                for action in &actions {
                    crate::log!("client"; "  → {}", describe(action));
                }
            }
        }
    }

    fn read(&mut self) {
        let Some(socket) = self.socket.as_mut() else {
            return;
        };

        match socket.read() {
            Ok(Message::Text(text)) => match HotReloadMessage::from_json(text.as_str()) {
                Some(message) => {
                    crate::log!("client"; "{}", text.as_str());
                    self.events.push_back(ClientEvent::Message(message));
                }
                None => crate::debug!("client"; "ignoring: {}", text.as_str()),
            },
            Ok(Message::Close(_)) => self.closed(),
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) => {}
            Err(e) => {
                crate::debug!("client"; "read error: {}", e);
                self.closed();
            }
        }
    }

    fn closed(&mut self) {
        self.socket = None;
        crate::log!("client"; "disconnected");
        self.events.push_back(ClientEvent::Closed);
    }
}

fn connect(url: &str) -> Result<Socket> {
    let (socket, _) = tungstenite::connect(url)?;
    if let MaybeTlsStream::Plain(stream) = socket.get_ref() {
        stream.set_read_timeout(Some(POLL))?;
    }
    Ok(socket)
}

/// The agent decided to change the page.
fn touches_page(effects: &[Effect]) -> bool {
    effects
        .iter()
        .any(|effect| matches!(effect, Effect::Patch(_) | Effect::Reload))
}

fn describe(action: &DomAction) -> String {
    match action {
        DomAction::InsertStylesheet { href, .. } => format!("insert stylesheet {href}"),
        DomAction::RemoveStylesheet { href, delay } => {
            format!("remove stylesheet {href} after {delay:?}")
        }
        DomAction::InsertPreload { href, .. } => format!("insert modulepreload {href}"),
        DomAction::RemovePreload { href, delay } => {
            format!("remove modulepreload {href} after {delay:?}")
        }
        DomAction::CallUnmountHook { name } => format!("call window.{name}()"),
        DomAction::InsertModuleScript { src, .. } => format!("insert module script {src}"),
        DomAction::RemoveModuleScript { src, delay } => {
            format!("remove module script {src} after {delay:?}")
        }
    }
}
