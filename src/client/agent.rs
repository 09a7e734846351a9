//! Notification client state machine.
//!
//! The agent is driven by [`ClientEvent`]s and answers with [`Effect`]s for
//! its host to carry out: the browser script, or `livepatch tail`. It owns
//! no socket and no timer, which keeps every transition testable.
//!
//! ```text
//!               Start / Online / RetryFired
//! Disconnected ─────────────────────────────▶ Connecting
//!      ▲                                          │ Opened
//!      │ Closed / Error / Offline                 ▼
//!      └──────────────────────────────────── Connected
//! ```

use std::time::Duration;

use super::backoff::{ReconnectPolicy, ReconnectState, TimerId};
use super::patch::{DomAction, PageView, PatchOutcome, PatchPlanner};
use crate::reload::message::HotReloadMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Start,
    Opened,
    Closed,
    Error,
    Online,
    Offline,
    RetryFired(TimerId),
    /// An inserted module script failed to load.
    ScriptFailed,
    Message(HotReloadMessage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Connect,
    CloseSocket,
    ScheduleRetry { timer: TimerId, delay: Duration },
    CancelRetry(TimerId),
    Reload,
    Patch(Vec<DomAction>),
}

pub struct Agent {
    state: ConnectionState,
    policy: ReconnectPolicy,
    reconnect: ReconnectState,
    planner: PatchPlanner,
}

impl Agent {
    pub fn new(policy: ReconnectPolicy, planner: PatchPlanner) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            policy,
            reconnect: ReconnectState::new(),
            planner,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.reconnect.retry_count()
    }

    pub fn pending_retry(&self) -> Option<TimerId> {
        self.reconnect.pending()
    }

    /// Advance on `event`. `page` is only consulted for messages.
    pub fn handle(&mut self, event: ClientEvent, page: &PageView) -> Vec<Effect> {
        match event {
            ClientEvent::Start => self.connect(),
            ClientEvent::Opened => {
                if self.state != ConnectionState::Connecting {
                    return vec![];
                }
                self.state = ConnectionState::Connected;
                self.reconnect.reset();
                vec![]
            }
            ClientEvent::Closed => self.lost(vec![]),
            ClientEvent::Error => self.lost(vec![Effect::CloseSocket]),
            ClientEvent::Offline => {
                self.reconnect.set_online(false);
                let mut effects = Vec::new();
                if let Some(timer) = self.reconnect.cancel() {
                    effects.push(Effect::CancelRetry(timer));
                }
                if self.state != ConnectionState::Disconnected {
                    effects.push(Effect::CloseSocket);
                }
                self.state = ConnectionState::Disconnected;
                effects
            }
            ClientEvent::Online => {
                self.reconnect.set_online(true);
                self.reconnect.reset();
                let mut effects = Vec::new();
                if let Some(timer) = self.reconnect.cancel() {
                    effects.push(Effect::CancelRetry(timer));
                }
                effects.extend(self.connect());
                effects
            }
            ClientEvent::RetryFired(timer) => {
                if !self.reconnect.fire(timer) {
                    return vec![];
                }
                self.connect()
            }
            ClientEvent::ScriptFailed => vec![Effect::Reload],
            ClientEvent::Message(message) => {
                if self.state != ConnectionState::Connected {
                    return vec![];
                }
                self.apply(&message, page)
            }
        }
    }

    fn connect(&mut self) -> Vec<Effect> {
        if self.state != ConnectionState::Disconnected || !self.reconnect.is_online() {
            return vec![];
        }
        self.state = ConnectionState::Connecting;
        vec![Effect::Connect]
    }

    /// Connection dropped: go Disconnected and book a retry if allowed.
    fn lost(&mut self, mut effects: Vec<Effect>) -> Vec<Effect> {
        if self.state == ConnectionState::Disconnected {
            return vec![];
        }
        self.state = ConnectionState::Disconnected;

        if let Some((timer, delay)) = self.reconnect.schedule(&self.policy) {
            effects.push(Effect::ScheduleRetry { timer, delay });
        }
        effects
    }

    fn apply(&self, message: &HotReloadMessage, page: &PageView) -> Vec<Effect> {
        match message {
            HotReloadMessage::Reload => vec![Effect::Reload],
            HotReloadMessage::Css { operations } => {
                let actions = self.planner.plan_css(operations, page);
                if actions.is_empty() {
                    vec![]
                } else {
                    vec![Effect::Patch(actions)]
                }
            }
            HotReloadMessage::Js { operations } => match self.planner.plan_js(operations, page) {
                PatchOutcome::Reload { .. } => vec![Effect::Reload],
                PatchOutcome::Apply(actions) if actions.is_empty() => vec![],
                PatchOutcome::Apply(actions) => vec![Effect::Patch(actions)],
            },
            // outbound only
            HotReloadMessage::ServerReloaded => vec![],
        }
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default(), PatchPlanner::default())
    }
}
