//! Configuration section definitions.
//!
//! Each module corresponds to a section in `livepatch.toml`:
//!
//! | Module   | TOML Section | Purpose                              |
//! |----------|--------------|--------------------------------------|
//! | `watch`  | `[watch]`    | Output root, URL prefix, hash regex  |
//! | `chunks` | `[chunks]`   | Page/shared chunk conventions        |
//! | `serve`  | `[serve]`    | WebSocket and script servers         |
//! | `client` | `[client]`   | Reconnect and patch timing           |

mod chunks;
mod client;
mod serve;
mod watch;

pub use chunks::ChunksConfig;
pub use client::ClientConfig;
pub use serve::{DEFAULT_WS_PORT, ServeConfig};
pub use watch::WatchConfig;
