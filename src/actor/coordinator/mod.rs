//! Actor Coordinator - Wires up the Relay Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Attaches the watcher before the initial snapshot
//! - Runs the actors concurrently

mod runtime;

use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::FsActor;
use super::messages::{RelayMsg, WsMsg};
use super::relay::RelayActor;
use super::ws::WsActor;
use crate::config::LivepatchConfig;
use crate::reload::snapshot::take_snapshot;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<LivepatchConfig>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    /// Create from Arc<LivepatchConfig>.
    pub fn with_config(config: Arc<LivepatchConfig>) -> Self {
        Self {
            config,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system until shutdown.
    pub async fn run(mut self) -> Result<()> {
        let config = &self.config;
        let (relay_tx, relay_rx) = mpsc::channel::<RelayMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        let addr = crate::reload::server::start_ws_server(
            config.serve.interface,
            config.serve.port,
            ws_tx.clone(),
        )?;
        if addr.port() != config.serve.port {
            crate::log!("ws"; "port {} in use, using {} instead", config.serve.port, addr.port());
        }
        crate::cli::serve::set_actual_ws_port(addr.port());
        crate::log!("ws"; "ws://{}", addr);

        let mapper = config.url_mapper()?;
        let policy = config.snapshot_policy();
        let root = mapper.root().to_path_buf();

        // Watcher first: anything written from here on is seen
        let mut fs_actor = FsActor::new(root.clone(), config.debounce(), relay_tx.clone())
            .with_context(|| format!("failed to watch {}", root.display()))?;
        if let Some(pairing) = config.chunk_pairing()? {
            fs_actor = fs_actor.with_pairing(pairing);
        }

        let initial = take_snapshot(&root, &policy);
        crate::log!("watch"; "{} ({} files)", root.display(), initial.len());

        let relay_actor = RelayActor::new(
            relay_rx,
            ws_tx.clone(),
            initial,
            mapper,
            policy,
            config.chunk_shapes()?,
        );
        let ws_actor = WsActor::new(ws_rx, ws_tx.clone());

        crate::debug!("actor"; "start");
        runtime::run_actors(
            fs_actor,
            relay_actor,
            ws_actor,
            relay_tx,
            ws_tx,
            self.shutdown_rx.take(),
        )
        .await;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
