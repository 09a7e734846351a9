//! Process-wide state shared by the servers and actors.

mod state;

pub use state::{is_shutdown, register_server, setup_shutdown_handler};
