//! Command-line interface module.

mod args;
pub mod notify;
pub mod serve;
pub mod snapshot;
pub mod tail;

pub use args::{Cli, Commands, WatchArgs};
