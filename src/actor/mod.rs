//! Actor System for Change Notification
//!
//! Message-passing concurrency for serve mode:
//!
//! ```text
//! FsActor --> RelayActor --> WsActor
//! (watch)    (classify)    (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `relay` - Snapshot pair, classification and dispatch
//! - `ws` - WebSocket clients and broadcast
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod relay;
pub mod ws;

pub use coordinator::Coordinator;
