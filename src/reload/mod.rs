//! Change detection and notification core.
//!
//! # Architecture
//!
//! ```text
//! raw batch ─▶ snapshot ─▶ classify ─▶ dispatch ─▶ message ─▶ server
//!              (files)     (records)   (policy)    (json)     (ws)
//! ```
//!
//! # Modules
//!
//! - `snapshot` - Comparable file sets of the output root
//! - `url` - Path to URL mapping and content-hash stripping
//! - `kind` - Asset category and chunk shape
//! - `classify` - Snapshot diff into Add/Remove/Replace records
//! - `dispatch` - Patch-or-reload decision per batch
//! - `message` - Wire messages
//! - `server` - WebSocket listener

pub mod classify;
pub mod dispatch;
pub mod kind;
pub mod message;
pub mod server;
pub mod snapshot;
pub mod url;
