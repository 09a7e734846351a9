//! Notification client.
//!
//! The connection state machine and DOM patch planning shared by the
//! browser agent (`embed/serve/livepatch.js` mirrors it) and the headless
//! `livepatch tail` command.

pub mod agent;
pub mod backoff;
pub mod patch;

pub use agent::{Agent, ClientEvent, ConnectionState, Effect};
pub use backoff::ReconnectPolicy;
pub use patch::{PageView, PatchPlanner};
